//! SmartOps API crate: axum HTTP server and route handlers.
//!
//! Exposes command analysis, confirmed execution, operation history and the
//! pending job table under `/api/v1/operations`, plus a health check.

pub mod error;
pub mod handlers;
pub mod rate_limit;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::{create_router, start_server};
pub use state::AppState;
