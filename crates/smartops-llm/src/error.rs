//! Error types for the classifier client.

/// Errors from a classifier call.
///
/// All of these are infrastructure faults from the caller's point of view:
/// the orchestrator never retries them and never shows their detail to users.
#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    #[error("API key not set: environment variable {0} is empty or missing")]
    MissingApiKey(String),
    #[error("Classifier request failed: {0}")]
    Request(String),
    #[error("Classifier returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Malformed classifier response: {0}")]
    MalformedResponse(String),
    #[error("Classifier call timed out after {0} seconds")]
    Timeout(u64),
}

impl From<reqwest::Error> for ClassifierError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ClassifierError::MalformedResponse(err.to_string())
        } else {
            ClassifierError::Request(err.to_string())
        }
    }
}
