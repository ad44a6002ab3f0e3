use thiserror::Error;

/// Top-level error type for the SmartOps system.
///
/// Subsystem crates define their own error types and wrap this one with
/// `#[from]` so that `?` works across crate boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SmartOpsError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for SmartOpsError {
    fn from(err: toml::de::Error) -> Self {
        SmartOpsError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for SmartOpsError {
    fn from(err: toml::ser::Error) -> Self {
        SmartOpsError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for SmartOpsError {
    fn from(err: serde_json::Error) -> Self {
        SmartOpsError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for SmartOps operations.
pub type Result<T> = std::result::Result<T, SmartOpsError>;
