//! Email executor.
//!
//! Delivery is simulated: the message is logged and reported as sent.

use async_trait::async_trait;
use serde_json::json;

use crate::error::ActionError;
use crate::handler::ActionHandler;
use crate::types::{ActionResult, ToolCall, ToolName};

pub struct SendEmailHandler;

#[async_trait]
impl ActionHandler for SendEmailHandler {
    fn tool(&self) -> ToolName {
        ToolName::SendEmail
    }

    async fn execute(&self, call: &ToolCall) -> Result<ActionResult, ActionError> {
        let ToolCall::SendEmail(params) = call else {
            return Err(ActionError::InvalidPayload(format!(
                "send_email handler received {}",
                call.tool()
            )));
        };

        let recipient = params.recipient.trim();
        if !recipient.contains('@') || !recipient.contains('.') {
            return Ok(ActionResult::error(format!(
                "Cannot send email: invalid recipient '{}'",
                recipient
            )));
        }

        tracing::info!(
            recipient = %recipient,
            subject = %params.subject,
            body_len = params.content.len(),
            "Email sent"
        );

        Ok(ActionResult::success(format!("Email successfully sent to {}", recipient))
            .with_output(json!({"recipient": recipient, "subject": params.subject})))
    }

    fn describe(&self, call: &ToolCall) -> String {
        match call {
            ToolCall::SendEmail(p) => format!("Send email to {}: {}", p.recipient, p.subject),
            other => format!("Send email ({} payload)", other.tool()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ActionStatus, EmailParams, NotifyParams};

    fn email(recipient: &str) -> ToolCall {
        ToolCall::SendEmail(EmailParams {
            recipient: recipient.into(),
            subject: "Weekly report".into(),
            content: "See attached.".into(),
        })
    }

    #[tokio::test]
    async fn test_send_email_success() {
        let result = SendEmailHandler.execute(&email("ali@test.com")).await.unwrap();
        assert_eq!(result.status, ActionStatus::Success);
        assert_eq!(result.message, "Email successfully sent to ali@test.com");
        assert_eq!(result.output.unwrap()["subject"], "Weekly report");
    }

    #[tokio::test]
    async fn test_send_email_bad_recipient_is_error_result() {
        let result = SendEmailHandler.execute(&email("nobody")).await.unwrap();
        assert_eq!(result.status, ActionStatus::Error);
        assert!(result.message.contains("nobody"));
    }

    #[tokio::test]
    async fn test_send_email_wrong_payload() {
        let err = SendEmailHandler
            .execute(&ToolCall::NotifyTeam(NotifyParams::default()))
            .await
            .unwrap_err();
        assert!(matches!(err, ActionError::InvalidPayload(_)));
    }

    #[test]
    fn test_describe() {
        assert_eq!(
            SendEmailHandler.describe(&email("ali@test.com")),
            "Send email to ali@test.com: Weekly report"
        );
    }
}
