//! Command orchestrator.
//!
//! Entry point for both halves of the pipeline:
//! - `analyze`: classify a command, build and validate a plan, and hold it
//!   for approval (or record a plain-text reply).
//! - `execute_confirmed`: run an approved action now, register it with the
//!   job table, or cancel matching jobs.
//!
//! Infrastructure faults are logged here with full detail and returned as
//! errors whose detail callers must not expose.

use std::sync::Arc;
use std::time::Duration;

use regex::{Regex, RegexBuilder};
use serde::Serialize;
use serde_json::{json, Value};

use smartops_core::config::SmartOpsConfig;
use smartops_llm::{bounded_history, Classifier, ClassifierError, ConversationTurn};

use crate::approval::{ApprovalGate, OperationStatus};
use crate::error::{ActionError, SchedulerError};
use crate::handler::ActionRegistry;
use crate::plan::PlanBuilder;
use crate::scheduler::{derive_job_id, JobTable, ScheduledJob};
use crate::time::parse_schedule_time;
use crate::types::{
    ActionResult, AnalysisIntent, CancelOperationParams, ScheduleOperationParams, ToolCall,
    ToolName, ValidatedAction, ValidationStatus,
};
use crate::validation::RuleValidator;

pub const OUT_OF_SCOPE_MESSAGE: &str =
    "I am scoped to email, scheduling, and team notification operations only.";
pub const EMPTY_REPLY_MESSAGE: &str = "I couldn't process that request.";
pub const SECURITY_VIOLATION: &str = "SECURITY_VIOLATION";

/// A free-text instruction plus prior conversation.
#[derive(Debug, Clone, Default)]
pub struct Command {
    pub text: String,
    pub history: Vec<ConversationTurn>,
}

/// Result of analyzing one command.
#[derive(Debug, Clone, Serialize)]
pub struct AnalyzeResponse {
    pub intent: AnalysisIntent,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actions: Option<Vec<ValidatedAction>>,
    pub assistant_message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_status: Option<ValidationStatus>,
    /// Id of the log row written for this command.
    pub operation_id: i64,
}

/// An approved action as sent back by the client.
#[derive(Debug, Clone)]
pub struct ConfirmRequest {
    pub intent: String,
    pub data: Value,
}

/// Structured refusal for a time outside the operational window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GuardrailRejection {
    pub error_type: &'static str,
    pub message: String,
    pub suggestion: String,
}

/// What happened to a confirmed action.
#[derive(Debug, Clone)]
pub enum ConfirmOutcome {
    /// Ran immediately. The result may itself report an error.
    Executed(ActionResult),
    Scheduled { job: ScheduledJob, replaced: bool },
    Cancelled { removed: Vec<ScheduledJob> },
    Rejected(GuardrailRejection),
}

impl ConfirmOutcome {
    pub fn status(&self) -> OperationStatus {
        match self {
            ConfirmOutcome::Executed(_) => OperationStatus::Executed,
            ConfirmOutcome::Scheduled { .. } => OperationStatus::Scheduled,
            ConfirmOutcome::Cancelled { .. } => OperationStatus::Cancelled,
            ConfirmOutcome::Rejected(_) => OperationStatus::Rejected,
        }
    }

    /// Response body for the client.
    pub fn to_json(&self) -> Value {
        match self {
            ConfirmOutcome::Executed(result) => json!({
                "status": result.status,
                "execution_result": result,
            }),
            ConfirmOutcome::Scheduled { job, replaced } => json!({
                "status": "scheduled",
                "execution_result": {
                    "job_id": job.id,
                    "operation_type": job.target.tool(),
                    "due_at": job.due_at,
                    "replaced": replaced,
                    "message": format!("{} scheduled for {}", job.target.tool(), job.due_at.to_rfc3339()),
                },
            }),
            ConfirmOutcome::Cancelled { removed } => json!({
                "status": "success",
                "execution_result": {
                    "cancelled": removed.len(),
                    "job_ids": removed.iter().map(|j| j.id.as_str()).collect::<Vec<_>>(),
                    "message": format!("Cancelled {} scheduled operation(s).", removed.len()),
                },
            }),
            ConfirmOutcome::Rejected(rejection) => json!(rejection),
        }
    }
}

/// Glues classifier, plan builder, approval gate, registry and job table.
pub struct CommandOrchestrator {
    classifier: Arc<dyn Classifier>,
    plans: PlanBuilder,
    registry: Arc<ActionRegistry>,
    jobs: Arc<JobTable>,
    gate: ApprovalGate,
    out_of_scope: Option<Regex>,
    history_turns: usize,
    classifier_timeout: Duration,
    executor_timeout: Duration,
    max_command_length: usize,
    fallback_job_label: String,
}

impl CommandOrchestrator {
    pub fn new(
        config: &SmartOpsConfig,
        classifier: Arc<dyn Classifier>,
        registry: Arc<ActionRegistry>,
        jobs: Arc<JobTable>,
        gate: ApprovalGate,
    ) -> Self {
        Self {
            classifier,
            plans: PlanBuilder::new(RuleValidator::from_config(&config.guardrails)),
            registry,
            jobs,
            gate,
            out_of_scope: keyword_pattern(&config.guardrails.out_of_scope_keywords),
            history_turns: config.llm.history_turns,
            classifier_timeout: Duration::from_secs(config.llm.timeout_secs),
            executor_timeout: Duration::from_secs(config.execution.executor_timeout_secs),
            max_command_length: config.execution.max_command_length,
            fallback_job_label: config.execution.fallback_job_label.clone(),
        }
    }

    pub fn jobs(&self) -> &Arc<JobTable> {
        &self.jobs
    }

    pub fn gate(&self) -> &ApprovalGate {
        &self.gate
    }

    // =========================================================================
    // Analysis
    // =========================================================================

    /// Classify a command and record the result.
    pub async fn analyze(&self, command: Command) -> Result<AnalyzeResponse, ActionError> {
        let result = self.analyze_inner(command).await;
        if let Err(e) = &result {
            if e.is_fault() {
                tracing::error!(error = %e, "Command analysis failed");
            }
        }
        result
    }

    async fn analyze_inner(&self, command: Command) -> Result<AnalyzeResponse, ActionError> {
        let text = command.text.trim();
        if text.is_empty() {
            return Err(ActionError::EmptyCommand);
        }
        if text.chars().count() > self.max_command_length {
            return Err(ActionError::CommandTooLong(self.max_command_length));
        }

        let history = bounded_history(&command.history, self.history_turns);
        let reply = tokio::time::timeout(
            self.classifier_timeout,
            self.classifier.classify(text, &history),
        )
        .await
        .map_err(|_| ClassifierError::Timeout(self.classifier_timeout.as_secs()))??;

        let plan = self.plans.build(&reply.tool_calls);
        if !plan.is_empty() {
            let validation_status = plan.validation_status();
            let message = match validation_status {
                ValidationStatus::Clear => format!(
                    "I've prepared {} action(s) for your approval.",
                    plan.actions.len()
                ),
                ValidationStatus::Flagged => {
                    "Some actions failed validation. Review the flagged items before approving."
                        .to_string()
                }
            };
            let row = self.gate.record_plan(text, &plan, &message)?;
            tracing::info!(
                operation_id = row.id,
                actions = plan.actions.len(),
                status = %row.status,
                "Plan proposed"
            );
            return Ok(AnalyzeResponse {
                intent: AnalysisIntent::PlanProposed,
                actions: Some(plan.actions),
                assistant_message: message,
                validation_status: Some(validation_status),
                operation_id: row.id,
            });
        }

        let content = reply
            .content
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| EMPTY_REPLY_MESSAGE.to_string());
        let (intent, message) = if self.is_out_of_scope(text) || self.is_out_of_scope(&content) {
            (AnalysisIntent::OutOfScope, OUT_OF_SCOPE_MESSAGE.to_string())
        } else {
            (AnalysisIntent::TextResponse, content)
        };

        let row = self.gate.record_reply(text, intent, &message)?;
        tracing::info!(operation_id = row.id, intent = intent.as_str(), "Text reply");
        Ok(AnalyzeResponse {
            intent,
            actions: None,
            assistant_message: message,
            validation_status: None,
            operation_id: row.id,
        })
    }

    fn is_out_of_scope(&self, text: &str) -> bool {
        self.out_of_scope
            .as_ref()
            .is_some_and(|pattern| pattern.is_match(text))
    }

    // =========================================================================
    // Confirmation
    // =========================================================================

    /// Carry out an approved action. Every outcome, including client errors
    /// and faults, is appended to the operation log.
    pub async fn execute_confirmed(
        &self,
        request: ConfirmRequest,
    ) -> Result<ConfirmOutcome, ActionError> {
        let intent = request.intent.trim().to_string();
        let result = self.confirm_inner(&intent, request.data.clone()).await;

        let (status, payload) = match &result {
            Ok(outcome) => (outcome.status(), outcome.to_json()),
            Err(e) => {
                let status = match e {
                    ActionError::UnknownTool(_)
                    | ActionError::Scheduler(SchedulerError::NotFound(_)) => {
                        OperationStatus::NotFound
                    }
                    _ => OperationStatus::Failed,
                };
                if e.is_fault() {
                    tracing::error!(tool = %intent, error = %e, "Confirmed action failed");
                } else {
                    tracing::warn!(tool = %intent, error = %e, "Confirmed action refused");
                }
                (status, json!({ "request": request.data, "error": e.to_string() }))
            }
        };

        if let Err(e) = self.gate.record_outcome(&intent, status, &payload) {
            tracing::error!(tool = %intent, error = %e, "Failed to record confirmation outcome");
        }
        result
    }

    async fn confirm_inner(&self, intent: &str, data: Value) -> Result<ConfirmOutcome, ActionError> {
        let tool: ToolName = intent
            .parse()
            .map_err(|_| ActionError::UnknownTool(intent.to_string()))?;
        let call = ToolCall::from_parts(tool, data)
            .map_err(|e| ActionError::InvalidPayload(format!("{}: {}", tool, e)))?;

        match call {
            ToolCall::ScheduleOperation(params) => self.schedule(params),
            ToolCall::CancelOperation(params) => self.cancel(params),
            call => {
                let result = self.registry.dispatch(&call, self.executor_timeout).await?;
                tracing::info!(tool = %tool, status = ?result.status, "Action executed");
                Ok(ConfirmOutcome::Executed(result))
            }
        }
    }

    /// Register a deferred operation after re-checking the guardrail.
    fn schedule(&self, params: ScheduleOperationParams) -> Result<ConfirmOutcome, ActionError> {
        let raw = params
            .due_time()
            .ok_or(SchedulerError::MissingTime)?
            .to_string();
        let time = parse_schedule_time(&raw).ok_or_else(|| SchedulerError::InvalidTime(raw.clone()))?;
        let validator = self.plans.validator();
        let window = validator.window();
        if !window.contains(time.hour()) {
            let suggestion = time.format_in_zone(window.opening_on(time.local.date()));
            tracing::warn!(
                requested = %raw,
                suggestion = %suggestion,
                "Scheduling outside operational hours rejected"
            );
            return Ok(ConfirmOutcome::Rejected(GuardrailRejection {
                error_type: SECURITY_VIOLATION,
                message: validator.window_violation(time.hour()),
                suggestion,
            }));
        }

        let id = params
            .job_id
            .clone()
            .unwrap_or_else(|| derive_job_id(&params.target, &self.fallback_job_label));
        let job = ScheduledJob::new(id, *params.target, time.utc, params.replace_existing);
        let replaced = self.jobs.insert(job.clone())?;
        Ok(ConfirmOutcome::Scheduled {
            job,
            replaced: replaced.is_some(),
        })
    }

    /// Remove every job whose identity contains the requested operation type.
    fn cancel(&self, params: CancelOperationParams) -> Result<ConfirmOutcome, ActionError> {
        let pattern = params.operation_type.trim();
        if pattern.is_empty() {
            return Err(ActionError::InvalidPayload(
                "cancel_operation requires operation_type".to_string(),
            ));
        }
        let removed = self.jobs.cancel_matching(pattern);
        if removed.is_empty() {
            return Err(SchedulerError::NotFound(pattern.to_string()).into());
        }
        Ok(ConfirmOutcome::Cancelled { removed })
    }
}

/// Case-insensitive whole-word alternation over the keywords.
fn keyword_pattern(keywords: &[String]) -> Option<Regex> {
    let alternation = keywords
        .iter()
        .map(|k| k.trim())
        .filter(|k| !k.is_empty())
        .map(|k| regex::escape(k).replace(' ', r"\s+"))
        .collect::<Vec<_>>()
        .join("|");
    if alternation.is_empty() {
        return None;
    }
    match RegexBuilder::new(&format!(r"\b(?:{})\b", alternation))
        .case_insensitive(true)
        .build()
    {
        Ok(pattern) => Some(pattern),
        Err(e) => {
            tracing::warn!(error = %e, "Out-of-scope keyword pattern rejected; scope check disabled");
            None
        }
    }
}
