//! System prompt and tool schema sent with every classification request.

use serde_json::{json, Value};

pub const SYSTEM_PROMPT: &str = "\
You are the operations interface of SmartOps. You turn short natural-language \
instructions into tool calls.

Scope: you handle email, meeting scheduling, team notifications, and deferred or \
cancelled operations only. For anything else, reply briefly that it is outside \
your scope.

Input often comes from speech recognition. Correct obvious phonetic errors \
(\"sand a male\" means \"send an email\") and act on the evident intent without \
asking for confirmation unless the command is genuinely ambiguous.

Map commands strictly to the provided tools. Timestamps are ISO 8601 in UTC. \
If a required field is missing, ask only for that field, in one short sentence.

Replies are read aloud: no filler, no markup symbols, professional tone.";

/// The five tools the classifier may call, in OpenAI function-calling format.
pub fn tool_definitions() -> Value {
    json!([
        {
            "type": "function",
            "function": {
                "name": "send_email",
                "description": "Send a professional email to a specific recipient",
                "parameters": {
                    "type": "object",
                    "properties": {
                        "recipient": {"type": "string", "description": "Email address of the recipient"},
                        "subject": {"type": "string", "description": "Subject line of the email"},
                        "content": {"type": "string", "description": "The main body of the email"}
                    },
                    "required": ["recipient", "subject", "content"]
                }
            }
        },
        {
            "type": "function",
            "function": {
                "name": "schedule_meeting",
                "description": "Schedule a meeting in the calendar",
                "parameters": {
                    "type": "object",
                    "properties": {
                        "title": {"type": "string", "description": "The meeting title"},
                        "attendees": {"type": "array", "items": {"type": "string"}, "description": "Email addresses of the participants"},
                        "start_time": {"type": "string", "description": "ISO 8601 start time, e.g. 2026-02-01T10:00:00"},
                        "duration": {"type": "integer", "description": "Duration in minutes", "default": 30}
                    },
                    "required": ["title", "attendees", "start_time"]
                }
            }
        },
        {
            "type": "function",
            "function": {
                "name": "notify_team",
                "description": "Send an urgent notification or message to a specific team",
                "parameters": {
                    "type": "object",
                    "properties": {
                        "team_name": {"type": "string", "description": "The team name, e.g. DevOps or Marketing"},
                        "message": {"type": "string", "description": "The notification message"},
                        "priority": {"type": "string", "enum": ["low", "normal", "high", "urgent"]}
                    },
                    "required": ["team_name", "message"]
                }
            }
        },
        {
            "type": "function",
            "function": {
                "name": "schedule_operation",
                "description": "Run another operation (email, meeting, or notification) at a later time",
                "parameters": {
                    "type": "object",
                    "properties": {
                        "operation_type": {"type": "string", "enum": ["send_email", "schedule_meeting", "notify_team"]},
                        "parameters": {"type": "object", "description": "Arguments for the deferred operation"},
                        "execution_time": {"type": "string", "description": "ISO 8601 time at which to run it"}
                    },
                    "required": ["operation_type", "parameters", "execution_time"]
                }
            }
        },
        {
            "type": "function",
            "function": {
                "name": "cancel_operation",
                "description": "Cancel previously scheduled operations of a given type",
                "parameters": {
                    "type": "object",
                    "properties": {
                        "operation_type": {"type": "string", "description": "Operation type to cancel, e.g. send_email"}
                    },
                    "required": ["operation_type"]
                }
            }
        }
    ])
}
