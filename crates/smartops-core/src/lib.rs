//! Shared configuration, error, and value types for SmartOps.

pub mod config;
pub mod error;
pub mod types;

pub use config::SmartOpsConfig;
pub use error::{Result, SmartOpsError};
pub use types::*;
