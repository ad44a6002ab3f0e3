//! The classifier seam and a scripted implementation for tests.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::ClassifierError;
use crate::types::{ClassifierReply, ConversationTurn};

/// Turns one command plus prior conversation into text or tool calls.
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(
        &self,
        text: &str,
        history: &[ConversationTurn],
    ) -> Result<ClassifierReply, ClassifierError>;
}

type Script =
    Box<dyn Fn(&str, &[ConversationTurn]) -> Result<ClassifierReply, ClassifierError> + Send + Sync>;

/// A classifier driven by a closure. Records every call it receives.
pub struct ScriptedClassifier {
    script: Script,
    calls: Mutex<Vec<(String, Vec<ConversationTurn>)>>,
}

impl ScriptedClassifier {
    pub fn new<F>(script: F) -> Self
    where
        F: Fn(&str, &[ConversationTurn]) -> Result<ClassifierReply, ClassifierError>
            + Send
            + Sync
            + 'static,
    {
        Self {
            script: Box::new(script),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Always answer with the same reply.
    pub fn always(reply: ClassifierReply) -> Self {
        Self::new(move |_, _| Ok(reply.clone()))
    }

    /// Always fail with a request error.
    pub fn failing(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::new(move |_, _| Err(ClassifierError::Request(message.clone())))
    }

    /// Commands and histories received so far, oldest first.
    pub fn calls(&self) -> Vec<(String, Vec<ConversationTurn>)> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Classifier for ScriptedClassifier {
    async fn classify(
        &self,
        text: &str,
        history: &[ConversationTurn],
    ) -> Result<ClassifierReply, ClassifierError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((text.to_string(), history.to_vec()));
        }
        (self.script)(text, history)
    }
}
