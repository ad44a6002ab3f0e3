//! Calendar executor. Booking is simulated and returns a meeting link.

use async_trait::async_trait;
use serde_json::json;
use uuid::Uuid;

use crate::error::ActionError;
use crate::handler::ActionHandler;
use crate::types::{ActionResult, ToolCall, ToolName};

const MEETING_LINK_BASE: &str = "https://meet.google.com";

pub struct ScheduleMeetingHandler;

/// A `xxx-xxxx-xxx` room code.
fn room_code() -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("{}-{}-{}", &hex[0..3], &hex[3..7], &hex[7..10])
}

#[async_trait]
impl ActionHandler for ScheduleMeetingHandler {
    fn tool(&self) -> ToolName {
        ToolName::ScheduleMeeting
    }

    async fn execute(&self, call: &ToolCall) -> Result<ActionResult, ActionError> {
        let ToolCall::ScheduleMeeting(params) = call else {
            return Err(ActionError::InvalidPayload(format!(
                "schedule_meeting handler received {}",
                call.tool()
            )));
        };

        let Some(start_time) = call.schedule_time() else {
            return Ok(ActionResult::error("Cannot schedule meeting: missing start_time"));
        };

        let title = if params.title.trim().is_empty() {
            "No Title"
        } else {
            params.title.as_str()
        };
        let link = format!("{}/{}", MEETING_LINK_BASE, room_code());

        tracing::info!(
            title = %title,
            start_time = %start_time,
            duration_min = params.duration,
            attendees = %params.attendees.join(", "),
            "Meeting scheduled"
        );

        Ok(
            ActionResult::success(format!("Meeting '{}' scheduled at {}", title, start_time))
                .with_output(json!({
                    "meeting_link": link,
                    "attendees": params.attendees,
                    "duration": params.duration,
                })),
        )
    }

    fn describe(&self, call: &ToolCall) -> String {
        match call {
            ToolCall::ScheduleMeeting(p) => format!(
                "Schedule '{}' with {} attendee(s)",
                p.title,
                p.attendees.len()
            ),
            other => format!("Schedule meeting ({} payload)", other.tool()),
        }
    }
}
