//! smartops-llm: command classification over a chat completions API.

pub mod classifier;
pub mod client;
pub mod error;
pub mod prompts;
pub mod types;

pub use classifier::{Classifier, ScriptedClassifier};
pub use client::HttpClassifier;
pub use error::ClassifierError;
pub use types::{bounded_history, ClassifierReply, ConversationTurn, Role, ToolInvocation};
