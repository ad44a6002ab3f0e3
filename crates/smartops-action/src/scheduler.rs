//! Deferred execution of confirmed operations.
//!
//! [`JobTable`] holds pending jobs keyed by identity behind one mutex, so
//! insert-or-replace, cancel-by-pattern and fire-and-remove never interleave.
//! [`Dispatcher`] is the background loop that removes due jobs from the table
//! and runs them through the [`ActionRegistry`]. Jobs live in memory only.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Notify;
use tokio::task::JoinSet;

use crate::error::SchedulerError;
use crate::handler::ActionRegistry;
use crate::types::ToolCall;

/// Identity for a job with no caller-supplied id:
/// `{tool}_{recipient, team or first attendee | fallback}`.
pub fn derive_job_id(target: &ToolCall, fallback: &str) -> String {
    format!("{}_{}", target.tool(), target.recipient_hint().unwrap_or(fallback))
}

/// A confirmed operation waiting for its due time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduledJob {
    pub id: String,
    pub target: ToolCall,
    pub due_at: DateTime<Utc>,
    pub replace_existing: bool,
    pub created_at: DateTime<Utc>,
}

impl ScheduledJob {
    pub fn new(id: String, target: ToolCall, due_at: DateTime<Utc>, replace_existing: bool) -> Self {
        Self {
            id,
            target,
            due_at,
            replace_existing,
            created_at: Utc::now(),
        }
    }
}

/// Pending jobs, shared by request handlers and the dispatcher.
#[derive(Default)]
pub struct JobTable {
    jobs: Mutex<HashMap<String, ScheduledJob>>,
    changed: Notify,
}

impl JobTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, ScheduledJob>> {
        self.jobs.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Add a job. An existing job with the same identity is replaced when the
    /// new job allows it, otherwise the insert fails with `Conflict`.
    /// Returns the job that was replaced, if any.
    pub fn insert(&self, job: ScheduledJob) -> Result<Option<ScheduledJob>, SchedulerError> {
        let replaced = {
            let mut jobs = self.lock();
            if !job.replace_existing && jobs.contains_key(&job.id) {
                return Err(SchedulerError::Conflict(job.id));
            }
            let id = job.id.clone();
            let due_at = job.due_at;
            let replaced = jobs.insert(id.clone(), job);
            if replaced.is_some() {
                tracing::info!(job_id = %id, due_at = %due_at, "Replaced scheduled job");
            } else {
                tracing::info!(job_id = %id, due_at = %due_at, "Scheduled job");
            }
            replaced
        };
        self.changed.notify_one();
        Ok(replaced)
    }

    /// Remove every job whose identity contains `pattern`.
    pub fn cancel_matching(&self, pattern: &str) -> Vec<ScheduledJob> {
        let mut jobs = self.lock();
        let ids: Vec<String> = jobs
            .keys()
            .filter(|id| id.contains(pattern))
            .cloned()
            .collect();
        let mut removed: Vec<ScheduledJob> = ids.iter().filter_map(|id| jobs.remove(id)).collect();
        removed.sort_by_key(|j| j.due_at);
        for job in &removed {
            tracing::info!(job_id = %job.id, "Cancelled scheduled job");
        }
        removed
    }

    /// Remove and return every job due at or before `now`, soonest first.
    pub fn take_due(&self, now: DateTime<Utc>) -> Vec<ScheduledJob> {
        let mut jobs = self.lock();
        let ids: Vec<String> = jobs
            .values()
            .filter(|j| j.due_at <= now)
            .map(|j| j.id.clone())
            .collect();
        let mut due: Vec<ScheduledJob> = ids.iter().filter_map(|id| jobs.remove(id)).collect();
        due.sort_by_key(|j| j.due_at);
        due
    }

    /// Earliest due time among pending jobs.
    pub fn next_due(&self) -> Option<DateTime<Utc>> {
        self.lock().values().map(|j| j.due_at).min()
    }

    /// Snapshot of pending jobs, soonest first.
    pub fn list(&self) -> Vec<ScheduledJob> {
        let mut jobs: Vec<_> = self.lock().values().cloned().collect();
        jobs.sort_by(|a, b| a.due_at.cmp(&b.due_at).then_with(|| a.id.cmp(&b.id)));
        jobs
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resolves after the next insert.
    pub async fn changed(&self) {
        self.changed.notified().await
    }
}

/// Background loop that fires due jobs.
pub struct Dispatcher {
    jobs: Arc<JobTable>,
    registry: Arc<ActionRegistry>,
    shutdown: Notify,
    executor_timeout: Duration,
    idle_poll: Duration,
}

impl Dispatcher {
    pub fn new(
        jobs: Arc<JobTable>,
        registry: Arc<ActionRegistry>,
        executor_timeout: Duration,
        idle_poll: Duration,
    ) -> Self {
        Self {
            jobs,
            registry,
            shutdown: Notify::new(),
            executor_timeout,
            idle_poll,
        }
    }

    /// Run until [`Dispatcher::shutdown`] is called.
    ///
    /// Fires whatever is due, then sleeps until the next due time, the next
    /// insert into the table, or `idle_poll`, whichever comes first.
    pub async fn run(&self) {
        tracing::info!("Dispatcher started");
        loop {
            self.fire_due(Utc::now()).await;

            let wait = match self.jobs.next_due() {
                Some(due) => (due - Utc::now())
                    .to_std()
                    .unwrap_or(Duration::ZERO)
                    .min(self.idle_poll),
                None => self.idle_poll,
            };

            tokio::select! {
                _ = tokio::time::sleep(wait) => {}
                _ = self.jobs.changed() => {}
                _ = self.shutdown.notified() => {
                    tracing::info!(pending = self.jobs.len(), "Dispatcher stopped");
                    return;
                }
            }
        }
    }

    /// Signal the loop to stop. Pending jobs are dropped with the process.
    pub fn shutdown(&self) {
        self.shutdown.notify_one();
    }

    /// Fire every job due at `now`. Jobs run concurrently, each on its own
    /// task; a failing job is logged and does not affect the others.
    /// Returns the number of jobs fired.
    pub async fn fire_due(&self, now: DateTime<Utc>) -> usize {
        let due = self.jobs.take_due(now);
        if due.is_empty() {
            return 0;
        }
        let fired = due.len();

        let mut set = JoinSet::new();
        for job in due {
            let registry = Arc::clone(&self.registry);
            let timeout = self.executor_timeout;
            set.spawn(async move {
                let result = registry.dispatch(&job.target, timeout).await;
                (job, result)
            });
        }

        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((job, Ok(result))) if result.is_success() => {
                    tracing::info!(job_id = %job.id, message = %result.message, "Scheduled job fired");
                }
                Ok((job, Ok(result))) => {
                    tracing::warn!(job_id = %job.id, message = %result.message, "Scheduled job reported an error");
                }
                Ok((job, Err(e))) => {
                    tracing::error!(job_id = %job.id, error = %e, "Scheduled job failed");
                }
                Err(e) => {
                    tracing::error!(error = %e, "Scheduled job task panicked");
                }
            }
        }
        fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ActionError;
    use crate::handler::ActionHandler;
    use crate::types::{ActionResult, EmailParams, NotifyParams, ToolName};
    use async_trait::async_trait;
    use chrono::Duration as ChronoDuration;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingHandler {
        fired: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl ActionHandler for CountingHandler {
        fn tool(&self) -> ToolName {
            ToolName::NotifyTeam
        }

        async fn execute(&self, _call: &ToolCall) -> Result<ActionResult, ActionError> {
            self.fired.fetch_add(1, Ordering::SeqCst);
            Ok(ActionResult::success("counted"))
        }

        fn describe(&self, _call: &ToolCall) -> String {
            "count".to_string()
        }
    }

    fn notify(team: &str) -> ToolCall {
        ToolCall::NotifyTeam(NotifyParams {
            team_name: team.into(),
            message: "ping".into(),
            ..Default::default()
        })
    }

    fn email(recipient: &str) -> ToolCall {
        ToolCall::SendEmail(EmailParams {
            recipient: recipient.into(),
            ..Default::default()
        })
    }

    fn job(target: ToolCall, due_at: DateTime<Utc>) -> ScheduledJob {
        ScheduledJob::new(derive_job_id(&target, "general"), target, due_at, true)
    }

    fn counting_dispatcher(jobs: Arc<JobTable>) -> (Dispatcher, Arc<AtomicUsize>) {
        let fired = Arc::new(AtomicUsize::new(0));
        let mut registry = ActionRegistry::new();
        registry.register(Arc::new(CountingHandler {
            fired: Arc::clone(&fired),
        }));
        let dispatcher = Dispatcher::new(
            jobs,
            Arc::new(registry),
            Duration::from_secs(1),
            Duration::from_secs(60),
        );
        (dispatcher, fired)
    }

    // ---- Job identity ----

    #[test]
    fn test_derive_job_id() {
        assert_eq!(derive_job_id(&email("ali@test.com"), "general"), "send_email_ali@test.com");
        assert_eq!(derive_job_id(&notify("DevOps"), "general"), "notify_team_DevOps");
        assert_eq!(derive_job_id(&email(""), "general"), "send_email_general");
    }

    // ---- JobTable ----

    #[test]
    fn test_insert_replaces_same_identity() {
        let table = JobTable::new();
        let now = Utc::now();
        assert!(table.insert(job(notify("Ops"), now)).unwrap().is_none());
        let replaced = table
            .insert(job(notify("Ops"), now + ChronoDuration::hours(1)))
            .unwrap();
        assert_eq!(replaced.unwrap().due_at, now);
        assert_eq!(table.len(), 1);
        assert_eq!(table.next_due(), Some(now + ChronoDuration::hours(1)));
    }

    #[test]
    fn test_insert_conflict_when_replace_disallowed() {
        let table = JobTable::new();
        let now = Utc::now();
        table.insert(job(notify("Ops"), now)).unwrap();
        let mut second = job(notify("Ops"), now);
        second.replace_existing = false;
        let err = table.insert(second).unwrap_err();
        assert!(matches!(err, SchedulerError::Conflict(ref id) if id == "notify_team_Ops"));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_cancel_matching_by_substring() {
        let table = JobTable::new();
        let later = Utc::now() + ChronoDuration::hours(1);
        table.insert(job(email("a@x.com"), later)).unwrap();
        table.insert(job(email("b@x.com"), later)).unwrap();
        table.insert(job(notify("Ops"), later)).unwrap();

        let removed = table.cancel_matching("send_email");
        assert_eq!(removed.len(), 2);
        assert_eq!(table.len(), 1);
        assert!(table.cancel_matching("send_email").is_empty());
    }

    #[test]
    fn test_take_due_removes_only_due_jobs() {
        let table = JobTable::new();
        let now = Utc::now();
        table.insert(job(notify("Past"), now - ChronoDuration::seconds(5))).unwrap();
        table.insert(job(notify("Future"), now + ChronoDuration::hours(1))).unwrap();

        let due = table.take_due(now);
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].id, "notify_team_Past");
        assert!(table.take_due(now).is_empty());
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_list_is_soonest_first() {
        let table = JobTable::new();
        let now = Utc::now();
        table.insert(job(notify("B"), now + ChronoDuration::hours(2))).unwrap();
        table.insert(job(notify("A"), now + ChronoDuration::hours(1))).unwrap();
        let ids: Vec<_> = table.list().into_iter().map(|j| j.id).collect();
        assert_eq!(ids, vec!["notify_team_A", "notify_team_B"]);
    }

    // ---- Dispatcher ----

    #[tokio::test]
    async fn test_dispatcher_shutdown() {
        let (dispatcher, _) = counting_dispatcher(Arc::new(JobTable::new()));
        dispatcher.shutdown();
        tokio::time::timeout(Duration::from_secs(2), dispatcher.run())
            .await
            .expect("Dispatcher should shut down within timeout");
    }

    #[tokio::test]
    async fn test_replaced_job_fires_once() {
        let jobs = Arc::new(JobTable::new());
        let (dispatcher, fired) = counting_dispatcher(Arc::clone(&jobs));
        let now = Utc::now();
        jobs.insert(job(notify("Ops"), now)).unwrap();
        jobs.insert(job(notify("Ops"), now)).unwrap();

        assert_eq!(dispatcher.fire_due(now).await, 1);
        assert_eq!(dispatcher.fire_due(now).await, 0);
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failing_job_does_not_block_others() {
        let jobs = Arc::new(JobTable::new());
        let (dispatcher, fired) = counting_dispatcher(Arc::clone(&jobs));
        let now = Utc::now();
        // No handler is registered for send_email in this dispatcher.
        jobs.insert(job(email("a@x.com"), now)).unwrap();
        jobs.insert(job(notify("Ops"), now)).unwrap();

        assert_eq!(dispatcher.fire_due(now).await, 2);
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(jobs.is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_job_never_fires() {
        let jobs = Arc::new(JobTable::new());
        let (dispatcher, fired) = counting_dispatcher(Arc::clone(&jobs));
        let now = Utc::now();
        jobs.insert(job(notify("Ops"), now)).unwrap();
        assert_eq!(jobs.cancel_matching("notify_team").len(), 1);

        assert_eq!(dispatcher.fire_due(now).await, 0);
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_run_fires_job_inserted_while_waiting() {
        let jobs = Arc::new(JobTable::new());
        let (dispatcher, fired) = counting_dispatcher(Arc::clone(&jobs));
        let dispatcher = Arc::new(dispatcher);

        let runner = {
            let dispatcher = Arc::clone(&dispatcher);
            tokio::spawn(async move { dispatcher.run().await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        jobs.insert(job(notify("Ops"), Utc::now() + ChronoDuration::milliseconds(100)))
            .unwrap();

        tokio::time::timeout(Duration::from_secs(3), async {
            while fired.load(Ordering::SeqCst) == 0 {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("job should fire");

        dispatcher.shutdown();
        tokio::time::timeout(Duration::from_secs(2), runner)
            .await
            .expect("dispatcher should stop")
            .unwrap();
        assert!(jobs.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_insert_cancel_fire_accounts_for_every_job() {
        const ROUNDS: usize = 500;
        let jobs = Arc::new(JobTable::new());
        let (dispatcher, fired) = counting_dispatcher(Arc::clone(&jobs));
        let dispatcher = Arc::new(dispatcher);
        let now = Utc::now();

        let inserter = {
            let jobs = Arc::clone(&jobs);
            tokio::spawn(async move {
                let (mut inserted, mut replaced) = (0, 0);
                for _ in 0..ROUNDS {
                    if jobs.insert(job(notify("Ops"), now)).unwrap().is_some() {
                        replaced += 1;
                    }
                    inserted += 1;
                    tokio::task::yield_now().await;
                }
                (inserted, replaced)
            })
        };
        let canceller = {
            let jobs = Arc::clone(&jobs);
            tokio::spawn(async move {
                let mut cancelled = 0;
                for _ in 0..ROUNDS {
                    cancelled += jobs.cancel_matching("notify_team_Ops").len();
                    tokio::task::yield_now().await;
                }
                cancelled
            })
        };
        let firer = {
            let dispatcher = Arc::clone(&dispatcher);
            tokio::spawn(async move {
                let mut reported = 0;
                for _ in 0..ROUNDS {
                    reported += dispatcher.fire_due(now).await;
                }
                reported
            })
        };

        let (inserted, replaced) = inserter.await.unwrap();
        let cancelled = canceller.await.unwrap();
        let reported = firer.await.unwrap();

        assert_eq!(inserted, ROUNDS);
        assert!(jobs.len() <= 1);
        assert_eq!(inserted, replaced + cancelled + reported + jobs.len());
        assert_eq!(fired.load(Ordering::SeqCst), reported);
    }
}
