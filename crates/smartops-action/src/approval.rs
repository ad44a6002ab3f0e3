//! Approval gate over the operation log.
//!
//! Analyzed commands are recorded as `pending_approval` or
//! `validation_failed` plans awaiting a human decision; confirmation outcomes
//! are recorded as separate rows. Rows are never updated.

use std::fmt;

use serde_json::{json, Value};

use smartops_core::error::SmartOpsError;
use smartops_storage::{NewOperation, OperationLog, OperationRow};

use crate::types::{AnalysisIntent, Plan, PlanStatus};

/// Status tag stored with each log row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationStatus {
    PendingApproval,
    ValidationFailed,
    Info,
    Executed,
    Scheduled,
    Cancelled,
    Rejected,
    NotFound,
    Failed,
}

impl OperationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationStatus::PendingApproval => "pending_approval",
            OperationStatus::ValidationFailed => "validation_failed",
            OperationStatus::Info => "info",
            OperationStatus::Executed => "executed",
            OperationStatus::Scheduled => "scheduled",
            OperationStatus::Cancelled => "cancelled",
            OperationStatus::Rejected => "rejected",
            OperationStatus::NotFound => "not_found",
            OperationStatus::Failed => "failed",
        }
    }
}

impl From<PlanStatus> for OperationStatus {
    fn from(status: PlanStatus) -> Self {
        match status {
            PlanStatus::PendingApproval => OperationStatus::PendingApproval,
            PlanStatus::ValidationFailed => OperationStatus::ValidationFailed,
        }
    }
}

impl fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Records plans and outcomes, and exposes history.
#[derive(Clone)]
pub struct ApprovalGate {
    log: OperationLog,
}

impl ApprovalGate {
    pub fn new(log: OperationLog) -> Self {
        Self { log }
    }

    /// Hold a plan for approval.
    pub fn record_plan(
        &self,
        command: &str,
        plan: &Plan,
        assistant_message: &str,
    ) -> Result<OperationRow, SmartOpsError> {
        let payload = json!({
            "actions": plan.actions,
            "validation_status": plan.validation_status(),
            "assistant_message": assistant_message,
        });
        let status = OperationStatus::from(plan.status());
        self.log.append(&NewOperation {
            command,
            intent: AnalysisIntent::PlanProposed.as_str(),
            status: status.as_str(),
            response_data: &payload,
        })
    }

    /// Record a text-only reply.
    pub fn record_reply(
        &self,
        command: &str,
        intent: AnalysisIntent,
        assistant_message: &str,
    ) -> Result<OperationRow, SmartOpsError> {
        self.log.append(&NewOperation {
            command,
            intent: intent.as_str(),
            status: OperationStatus::Info.as_str(),
            response_data: &json!({ "assistant_message": assistant_message }),
        })
    }

    /// Record the outcome of a confirmed action. `tool` is the requested tool
    /// name as received, which may not be a known tool.
    pub fn record_outcome(
        &self,
        tool: &str,
        status: OperationStatus,
        payload: &Value,
    ) -> Result<OperationRow, SmartOpsError> {
        let command = format!("execute-confirmed {}", tool);
        self.log.append(&NewOperation {
            command: &command,
            intent: tool,
            status: status.as_str(),
            response_data: payload,
        })
    }

    /// The most recent `limit` rows, newest first.
    pub fn history(&self, limit: u64) -> Result<Vec<OperationRow>, SmartOpsError> {
        self.log.recent(limit)
    }

    /// Delete one row. Returns `false` if it did not exist.
    pub fn delete(&self, id: i64) -> Result<bool, SmartOpsError> {
        self.log.delete(id)
    }
}
