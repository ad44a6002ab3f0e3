//! HTTP classifier over an OpenAI-compatible chat completions API.
//!
//! Sends the system prompt, the bounded conversation history, the command,
//! and the tool schema; reads back either plain content or tool calls.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use smartops_core::config::LlmConfig;

use crate::classifier::Classifier;
use crate::error::ClassifierError;
use crate::prompts::{tool_definitions, SYSTEM_PROMPT};
use crate::types::{ClassifierReply, ConversationTurn, Role, ToolInvocation};

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    tools: serde_json::Value,
    tool_choice: &'static str,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<ResponseToolCall>>,
}

#[derive(Deserialize)]
struct ResponseToolCall {
    function: ResponseFunction,
}

#[derive(Deserialize)]
struct ResponseFunction {
    name: String,
    // Usually a JSON-encoded string, but some providers send an object.
    arguments: serde_json::Value,
}

/// Classifier backed by a remote chat completions endpoint.
pub struct HttpClassifier {
    client: Client,
    api_key: String,
    api_url: String,
    model: String,
    temperature: f32,
    timeout_secs: u64,
}

impl HttpClassifier {
    /// Create a classifier with explicit settings.
    pub fn new(
        api_key: String,
        api_url: String,
        model: String,
        temperature: f32,
        timeout_secs: u64,
    ) -> Result<Self, ClassifierError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ClassifierError::Request(e.to_string()))?;
        Ok(Self {
            client,
            api_key,
            api_url,
            model,
            temperature,
            timeout_secs,
        })
    }

    /// Create a classifier from configuration, reading the API key from the
    /// environment variable named in `api_key_env`.
    pub fn from_config(config: &LlmConfig) -> Result<Self, ClassifierError> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ClassifierError::MissingApiKey(config.api_key_env.clone()))?;
        Self::new(
            api_key,
            config.api_url.clone(),
            config.model.clone(),
            config.temperature,
            config.timeout_secs,
        )
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl Classifier for HttpClassifier {
    async fn classify(
        &self,
        text: &str,
        history: &[ConversationTurn],
    ) -> Result<ClassifierReply, ClassifierError> {
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(ChatMessage {
            role: "system",
            content: SYSTEM_PROMPT,
        });
        for turn in history {
            if let Some(role) = Role::parse(&turn.role) {
                messages.push(ChatMessage {
                    role: role.as_str(),
                    content: &turn.content,
                });
            }
        }
        messages.push(ChatMessage {
            role: "user",
            content: text,
        });

        let request = ChatRequest {
            model: &self.model,
            messages,
            tools: tool_definitions(),
            tool_choice: "auto",
            temperature: self.temperature,
        };

        tracing::debug!(
            model = %self.model,
            history_turns = history.len(),
            "Sending classification request"
        );

        let response = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ClassifierError::Timeout(self.timeout_secs)
                } else {
                    ClassifierError::from(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClassifierError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = response.json().await?;
        let message = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message)
            .ok_or_else(|| ClassifierError::MalformedResponse("no choices returned".to_string()))?;

        let tool_calls = message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|call| ToolInvocation {
                name: call.function.name,
                arguments: match call.function.arguments {
                    serde_json::Value::String(s) => s,
                    other => other.to_string(),
                },
            })
            .collect::<Vec<_>>();

        tracing::debug!(tool_calls = tool_calls.len(), "Classification received");

        Ok(ClassifierReply {
            content: message.content.filter(|c| !c.trim().is_empty()),
            tool_calls,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use std::sync::{Arc, Mutex};

    /// Start a local chat-completions stub returning `reply` and recording the
    /// last request body.
    async fn start_stub(status: u16, reply: Value) -> (String, Arc<Mutex<Option<Value>>>) {
        let seen = Arc::new(Mutex::new(None));
        let seen_clone = Arc::clone(&seen);
        let app = Router::new().route(
            "/v1/chat/completions",
            post(move |Json(body): Json<Value>| {
                let seen = Arc::clone(&seen_clone);
                let reply = reply.clone();
                async move {
                    *seen.lock().unwrap() = Some(body);
                    (
                        axum::http::StatusCode::from_u16(status).unwrap(),
                        Json(reply),
                    )
                }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{}/v1/chat/completions", addr), seen)
    }

    fn classifier(url: String) -> HttpClassifier {
        HttpClassifier::new("test-key".into(), url, "test-model".into(), 0.1, 5).unwrap()
    }

    #[tokio::test]
    async fn test_parses_tool_calls() {
        let (url, seen) = start_stub(
            200,
            json!({
                "choices": [{
                    "message": {
                        "content": null,
                        "tool_calls": [{
                            "id": "call_1",
                            "type": "function",
                            "function": {
                                "name": "send_email",
                                "arguments": "{\"recipient\":\"ali@test.com\",\"subject\":\"Report\",\"content\":\"Attached.\"}"
                            }
                        }]
                    }
                }]
            }),
        )
        .await;

        let history = vec![
            ConversationTurn::new(Role::User, "hi"),
            ConversationTurn::new(Role::Assistant, "Ready."),
        ];
        let reply = classifier(url)
            .classify("Email ali@test.com the report now", &history)
            .await
            .unwrap();

        assert!(reply.content.is_none());
        assert_eq!(reply.tool_calls.len(), 1);
        assert_eq!(reply.tool_calls[0].name, "send_email");
        assert!(reply.tool_calls[0].arguments.contains("ali@test.com"));

        let body = seen.lock().unwrap().clone().unwrap();
        assert_eq!(body["model"], "test-model");
        assert_eq!(body["tool_choice"], "auto");
        assert_eq!(body["tools"].as_array().unwrap().len(), 5);
        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0]["role"], "system");
        assert_eq!(messages[2]["role"], "assistant");
        assert_eq!(messages[3]["content"], "Email ali@test.com the report now");
    }

    #[tokio::test]
    async fn test_object_arguments_are_reencoded() {
        let (url, _) = start_stub(
            200,
            json!({
                "choices": [{
                    "message": {
                        "tool_calls": [{
                            "function": {"name": "notify_team", "arguments": {"team_name": "Ops"}}
                        }]
                    }
                }]
            }),
        )
        .await;

        let reply = classifier(url).classify("ping ops", &[]).await.unwrap();
        let args: Value = serde_json::from_str(&reply.tool_calls[0].arguments).unwrap();
        assert_eq!(args["team_name"], "Ops");
    }

    #[tokio::test]
    async fn test_plain_text_reply() {
        let (url, _) = start_stub(
            200,
            json!({"choices": [{"message": {"content": "Which recipient?"}}]}),
        )
        .await;

        let reply = classifier(url).classify("send an email", &[]).await.unwrap();
        assert_eq!(reply.content.as_deref(), Some("Which recipient?"));
        assert!(reply.tool_calls.is_empty());
    }

    #[tokio::test]
    async fn test_http_error_status() {
        let (url, _) = start_stub(500, json!({"error": "boom"})).await;
        let err = classifier(url).classify("x", &[]).await.unwrap_err();
        assert!(matches!(err, ClassifierError::Status { status: 500, .. }));
    }

    #[tokio::test]
    async fn test_empty_choices_is_malformed() {
        let (url, _) = start_stub(200, json!({"choices": []})).await;
        let err = classifier(url).classify("x", &[]).await.unwrap_err();
        assert!(matches!(err, ClassifierError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint() {
        let err = classifier("http://127.0.0.1:1/v1/chat/completions".to_string())
            .classify("x", &[])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ClassifierError::Request(_) | ClassifierError::Timeout(_)
        ));
    }

    #[test]
    fn test_from_config_missing_key() {
        let config = LlmConfig {
            api_key_env: "SMARTOPS_TEST_KEY_THAT_IS_NEVER_SET".to_string(),
            ..LlmConfig::default()
        };
        let err = HttpClassifier::from_config(&config).err().unwrap();
        assert!(matches!(err, ClassifierError::MissingApiKey(_)));
    }
}
