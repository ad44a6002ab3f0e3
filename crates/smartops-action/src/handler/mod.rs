//! Executors and the registry that maps tool names to them.

pub mod notify_team;
pub mod schedule_meeting;
pub mod send_email;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::ActionError;
use crate::types::{ActionResult, ToolCall, ToolName};

/// Performs one side-effecting operation.
///
/// Expected failures (a malformed recipient, say) are returned as an
/// [`ActionResult`] with `status: error`. `Err` is reserved for faults.
#[async_trait]
pub trait ActionHandler: Send + Sync {
    /// The tool this handler executes.
    fn tool(&self) -> ToolName;

    async fn execute(&self, call: &ToolCall) -> Result<ActionResult, ActionError>;

    /// One-line human-readable summary of what `execute` would do.
    fn describe(&self, call: &ToolCall) -> String;
}

/// Maps tool names to handlers.
#[derive(Default)]
pub struct ActionRegistry {
    handlers: HashMap<ToolName, Arc<dyn ActionHandler>>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler, replacing any previous one for the same tool.
    pub fn register(&mut self, handler: Arc<dyn ActionHandler>) {
        self.handlers.insert(handler.tool(), handler);
    }

    /// Register the built-in executors.
    pub fn register_defaults(&mut self) {
        self.register(Arc::new(send_email::SendEmailHandler));
        self.register(Arc::new(schedule_meeting::ScheduleMeetingHandler));
        self.register(Arc::new(notify_team::NotifyTeamHandler));
    }

    pub fn get(&self, tool: ToolName) -> Option<Arc<dyn ActionHandler>> {
        self.handlers.get(&tool).cloned()
    }

    pub fn registered_tools(&self) -> Vec<ToolName> {
        let mut tools: Vec<_> = self.handlers.keys().copied().collect();
        tools.sort_by_key(|t| t.as_str());
        tools
    }

    /// Look up the handler for `call` and run it on its own task under
    /// `timeout`. A panicking handler surfaces as `ExecutorFailed`.
    pub async fn dispatch(
        &self,
        call: &ToolCall,
        timeout: Duration,
    ) -> Result<ActionResult, ActionError> {
        let tool = call.tool();
        let handler = self
            .get(tool)
            .ok_or_else(|| ActionError::UnknownTool(tool.to_string()))?;

        tracing::debug!(tool = %tool, action = %handler.describe(call), "Dispatching action");

        let owned = call.clone();
        let mut task = tokio::spawn(async move { handler.execute(&owned).await });
        match tokio::time::timeout(timeout, &mut task).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => Err(ActionError::ExecutorFailed(format!(
                "{} executor aborted: {}",
                tool, e
            ))),
            Err(_) => {
                task.abort();
                Err(ActionError::Timeout(timeout.as_secs()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EmailParams, NotifyParams};

    struct SlowHandler;

    #[async_trait]
    impl ActionHandler for SlowHandler {
        fn tool(&self) -> ToolName {
            ToolName::NotifyTeam
        }

        async fn execute(&self, _call: &ToolCall) -> Result<ActionResult, ActionError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(ActionResult::success("late"))
        }

        fn describe(&self, _call: &ToolCall) -> String {
            "slow".to_string()
        }
    }

    struct PanickingHandler;

    #[async_trait]
    impl ActionHandler for PanickingHandler {
        fn tool(&self) -> ToolName {
            ToolName::NotifyTeam
        }

        async fn execute(&self, _call: &ToolCall) -> Result<ActionResult, ActionError> {
            panic!("webhook client exploded");
        }

        fn describe(&self, _call: &ToolCall) -> String {
            "boom".to_string()
        }
    }

    #[test]
    fn test_register_defaults() {
        let mut registry = ActionRegistry::new();
        registry.register_defaults();
        assert_eq!(
            registry.registered_tools(),
            vec![ToolName::NotifyTeam, ToolName::ScheduleMeeting, ToolName::SendEmail]
        );
        assert!(registry.get(ToolName::ScheduleOperation).is_none());
    }

    #[tokio::test]
    async fn test_dispatch_runs_handler() {
        let mut registry = ActionRegistry::new();
        registry.register_defaults();
        let call = ToolCall::SendEmail(EmailParams {
            recipient: "ali@test.com".into(),
            subject: "Report".into(),
            content: "Here".into(),
        });
        let result = registry.dispatch(&call, Duration::from_secs(1)).await.unwrap();
        assert!(result.is_success());
    }

    #[tokio::test]
    async fn test_dispatch_unknown_tool() {
        let registry = ActionRegistry::new();
        let call = ToolCall::NotifyTeam(NotifyParams::default());
        let err = registry.dispatch(&call, Duration::from_secs(1)).await.unwrap_err();
        assert!(matches!(err, ActionError::UnknownTool(ref t) if t == "notify_team"));
    }

    #[tokio::test]
    async fn test_dispatch_times_out() {
        let mut registry = ActionRegistry::new();
        registry.register(Arc::new(SlowHandler));
        let call = ToolCall::NotifyTeam(NotifyParams::default());
        let err = registry
            .dispatch(&call, Duration::from_millis(20))
            .await
            .unwrap_err();
        assert!(matches!(err, ActionError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_dispatch_panicking_handler_is_executor_failure() {
        let mut registry = ActionRegistry::new();
        registry.register(Arc::new(PanickingHandler));
        let call = ToolCall::NotifyTeam(NotifyParams::default());
        let err = registry
            .dispatch(&call, Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, ActionError::ExecutorFailed(ref m) if m.starts_with("notify_team")));
        assert!(err.is_fault());
    }
}
