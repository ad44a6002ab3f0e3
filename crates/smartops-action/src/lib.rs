//! Command pipeline for SmartOps.
//!
//! Turns classifier output into validated plans held for approval, executes
//! approved actions through pluggable handlers, and defers time-bound
//! operations to a background dispatcher.

pub mod approval;
pub mod error;
pub mod handler;
pub mod orchestrator;
pub mod plan;
pub mod scheduler;
pub mod time;
pub mod types;
pub mod validation;

pub use approval::{ApprovalGate, OperationStatus};
pub use error::{ActionError, SchedulerError};
pub use handler::{ActionHandler, ActionRegistry};
pub use orchestrator::{
    AnalyzeResponse, Command, CommandOrchestrator, ConfirmOutcome, ConfirmRequest,
    GuardrailRejection,
};
pub use plan::PlanBuilder;
pub use scheduler::{derive_job_id, Dispatcher, JobTable, ScheduledJob};
pub use types::{
    ActionResult, ActionStatus, AnalysisIntent, Plan, PlanStatus, ToolCall, ToolName,
    ValidatedAction, Validation, ValidationStatus,
};
pub use validation::RuleValidator;
