//! Wire-neutral types exchanged with the classifier.

use serde::{Deserialize, Serialize};

/// Speaker of a prior conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Parse a role label as sent by clients. The legacy label `bot` is read
    /// as `assistant`; anything else is not a conversational role.
    pub fn parse(label: &str) -> Option<Role> {
        match label {
            "user" => Some(Role::User),
            "assistant" | "bot" => Some(Role::Assistant),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One prior turn of the conversation, as received from the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: String,
    #[serde(default)]
    pub content: String,
}

impl ConversationTurn {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role: role.as_str().to_string(),
            content: content.into(),
        }
    }
}

/// Keep only the trailing `max_turns` turns, then drop turns whose role is not
/// conversational or whose content is empty. Roles come back normalized.
///
/// The truncation happens before filtering, so a window full of unusable
/// turns yields fewer than `max_turns` results rather than reaching further
/// back.
pub fn bounded_history(history: &[ConversationTurn], max_turns: usize) -> Vec<ConversationTurn> {
    let start = history.len().saturating_sub(max_turns);
    history[start..]
        .iter()
        .filter_map(|turn| {
            let role = Role::parse(&turn.role)?;
            if turn.content.trim().is_empty() {
                return None;
            }
            Some(ConversationTurn::new(role, turn.content.clone()))
        })
        .collect()
}

/// A tool the model asked to invoke, with its arguments still JSON-encoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolInvocation {
    pub name: String,
    pub arguments: String,
}

/// What the classifier decided for one command.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifierReply {
    pub content: Option<String>,
    #[serde(default)]
    pub tool_calls: Vec<ToolInvocation>,
}

impl ClassifierReply {
    /// A plain-text reply with no tool calls.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            tool_calls: Vec::new(),
        }
    }

    /// A reply proposing a single tool call.
    pub fn tool(name: impl Into<String>, arguments: serde_json::Value) -> Self {
        Self::default().with_tool(name, arguments)
    }

    /// Append another tool call.
    pub fn with_tool(mut self, name: impl Into<String>, arguments: serde_json::Value) -> Self {
        self.tool_calls.push(ToolInvocation {
            name: name.into(),
            arguments: arguments.to_string(),
        });
        self
    }
}
