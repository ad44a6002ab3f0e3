//! Error types for the command pipeline.
//!
//! Business-rule outcomes (invalid recipients, out-of-hours times) are data
//! on the plan and never appear here. These variants are either client
//! errors the API reports as such, or infrastructure faults.

use smartops_core::error::SmartOpsError;
use smartops_llm::ClassifierError;

/// Errors from analysis, confirmation, and executor dispatch.
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    #[error("Executor failed: {0}")]
    ExecutorFailed(String),
    #[error("No executor registered for tool: {0}")]
    UnknownTool(String),
    #[error("Payload validation failed: {0}")]
    InvalidPayload(String),
    #[error("Action execution timed out after {0} seconds")]
    Timeout(u64),
    #[error("Command must not be empty")]
    EmptyCommand,
    #[error("Command exceeds the maximum length of {0} characters")]
    CommandTooLong(usize),
    #[error("Classifier error: {0}")]
    Classifier(#[from] ClassifierError),
    #[error("Scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),
    #[error("Storage error: {0}")]
    Storage(#[from] SmartOpsError),
}

impl ActionError {
    /// Whether this is an infrastructure fault whose detail must stay in the
    /// logs.
    pub fn is_fault(&self) -> bool {
        match self {
            ActionError::ExecutorFailed(_)
            | ActionError::Timeout(_)
            | ActionError::Classifier(_)
            | ActionError::Storage(_) => true,
            ActionError::UnknownTool(_)
            | ActionError::InvalidPayload(_)
            | ActionError::EmptyCommand
            | ActionError::CommandTooLong(_)
            | ActionError::Scheduler(_) => false,
        }
    }
}

/// Errors from the job table and dispatcher.
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    #[error("A job with identity {0} is already scheduled")]
    Conflict(String),
    #[error("No scheduled job matches: {0}")]
    NotFound(String),
    #[error("Invalid execution time: {0}")]
    InvalidTime(String),
    #[error("Missing execution time")]
    MissingTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_error_display() {
        let err = ActionError::ExecutorFailed("connection reset".to_string());
        assert_eq!(err.to_string(), "Executor failed: connection reset");

        let err = ActionError::UnknownTool("send_fax".to_string());
        assert_eq!(err.to_string(), "No executor registered for tool: send_fax");

        let err = ActionError::Timeout(10);
        assert_eq!(err.to_string(), "Action execution timed out after 10 seconds");

        let err = ActionError::CommandTooLong(2000);
        assert_eq!(
            err.to_string(),
            "Command exceeds the maximum length of 2000 characters"
        );
    }

    #[test]
    fn test_action_error_from_storage() {
        let err: ActionError = SmartOpsError::Storage("disk full".to_string()).into();
        assert!(matches!(err, ActionError::Storage(_)));
        assert!(err.to_string().contains("disk full"));
        assert!(err.is_fault());
    }

    #[test]
    fn test_action_error_from_classifier() {
        let err: ActionError = ClassifierError::Timeout(30).into();
        assert!(matches!(err, ActionError::Classifier(_)));
        assert!(err.is_fault());
    }

    #[test]
    fn test_client_errors_are_not_faults() {
        assert!(!ActionError::UnknownTool("x".into()).is_fault());
        assert!(!ActionError::EmptyCommand.is_fault());
        assert!(!ActionError::Scheduler(SchedulerError::NotFound("send_email".into())).is_fault());
        assert!(!ActionError::Scheduler(SchedulerError::Conflict("id".into())).is_fault());
        assert!(!ActionError::Scheduler(SchedulerError::MissingTime).is_fault());
        assert!(ActionError::ExecutorFailed("panicked".into()).is_fault());
    }

    #[test]
    fn test_scheduler_error_display() {
        let err = SchedulerError::Conflict("send_email_ali@test.com".to_string());
        assert_eq!(
            err.to_string(),
            "A job with identity send_email_ali@test.com is already scheduled"
        );
        let err = SchedulerError::NotFound("send_email".to_string());
        assert_eq!(err.to_string(), "No scheduled job matches: send_email");
        assert_eq!(SchedulerError::MissingTime.to_string(), "Missing execution time");
    }
}
