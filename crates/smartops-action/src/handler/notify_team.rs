//! Team notification executor (simulated).

use async_trait::async_trait;

use crate::error::ActionError;
use crate::handler::ActionHandler;
use crate::types::{ActionResult, ToolCall, ToolName};

pub struct NotifyTeamHandler;

#[async_trait]
impl ActionHandler for NotifyTeamHandler {
    fn tool(&self) -> ToolName {
        ToolName::NotifyTeam
    }

    async fn execute(&self, call: &ToolCall) -> Result<ActionResult, ActionError> {
        let ToolCall::NotifyTeam(params) = call else {
            return Err(ActionError::InvalidPayload(format!(
                "notify_team handler received {}",
                call.tool()
            )));
        };

        let team = params.team_name.trim();
        if team.is_empty() {
            return Ok(ActionResult::error("Cannot notify: team name is empty"));
        }

        tracing::info!(
            team = %team,
            priority = %params.priority,
            message = %params.message,
            "Team notified"
        );

        Ok(ActionResult::success(format!(
            "Team {} has been notified with priority {}.",
            team, params.priority
        )))
    }

    fn describe(&self, call: &ToolCall) -> String {
        match call {
            ToolCall::NotifyTeam(p) => format!("Notify {} ({})", p.team_name, p.priority),
            other => format!("Notify team ({} payload)", other.tool()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ActionStatus, NotifyParams, Priority};

    #[tokio::test]
    async fn test_notify_team() {
        let call = ToolCall::NotifyTeam(NotifyParams {
            team_name: "DevOps".into(),
            message: "Deploy at noon".into(),
            priority: Priority::High,
        });
        let result = NotifyTeamHandler.execute(&call).await.unwrap();
        assert_eq!(result.status, ActionStatus::Success);
        assert_eq!(result.message, "Team DevOps has been notified with priority high.");
        assert_eq!(NotifyTeamHandler.describe(&call), "Notify DevOps (high)");
    }

    #[tokio::test]
    async fn test_notify_empty_team() {
        let result = NotifyTeamHandler
            .execute(&ToolCall::NotifyTeam(NotifyParams::default()))
            .await
            .unwrap();
        assert_eq!(result.status, ActionStatus::Error);
    }
}
