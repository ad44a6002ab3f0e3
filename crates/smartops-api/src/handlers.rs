//! Route handler functions for all API endpoints.
//!
//! Each handler extracts its body, path or query via axum extractors, calls
//! into the orchestrator, and returns JSON. Extractor rejections are turned
//! into the same JSON error shape as every other failure.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use smartops_action::{AnalyzeResponse, Command, ConfirmOutcome, ConfirmRequest, ScheduledJob};
use smartops_llm::ConversationTurn;
use smartops_storage::OperationRow;

use crate::error::ApiError;
use crate::state::AppState;

const DEFAULT_HISTORY_LIMIT: u64 = 50;
const MAX_HISTORY_LIMIT: u64 = 500;

// =============================================================================
// Request types
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub command: String,
    #[serde(default)]
    pub history: Vec<ConversationTurn>,
}

#[derive(Debug, Deserialize)]
pub struct ConfirmRequestBody {
    /// Tool name of the approved action.
    pub intent: String,
    #[serde(default)]
    pub data: Value,
}

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    pub limit: Option<u64>,
}

impl HistoryParams {
    fn effective_limit(&self) -> u64 {
        self.limit
            .unwrap_or(DEFAULT_HISTORY_LIMIT)
            .clamp(1, MAX_HISTORY_LIMIT)
    }
}

// =============================================================================
// Response types
// =============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub pending_jobs: usize,
}

#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub deleted: i64,
}

// =============================================================================
// Handlers
// =============================================================================

/// GET /health - liveness check.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        pending_jobs: state.orchestrator.jobs().len(),
    })
}

/// POST /api/v1/operations/analyze - classify a command into a plan or reply.
pub async fn analyze(
    State(state): State<AppState>,
    body: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let Json(req) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let response = state
        .orchestrator
        .analyze(Command {
            text: req.command,
            history: req.history,
        })
        .await?;
    Ok(Json(response))
}

/// POST /api/v1/operations/execute-confirmed - run, schedule or cancel an
/// approved action.
///
/// A scheduling request outside operational hours answers 400 with the
/// structured rejection as the whole body.
pub async fn execute_confirmed(
    State(state): State<AppState>,
    body: Result<Json<ConfirmRequestBody>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(req) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let outcome = state
        .orchestrator
        .execute_confirmed(ConfirmRequest {
            intent: req.intent,
            data: req.data,
        })
        .await?;

    let status = match outcome {
        ConfirmOutcome::Rejected(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::OK,
    };
    Ok((status, Json(outcome.to_json())).into_response())
}

/// GET /api/v1/operations/history - most recent log rows, newest first.
pub async fn history(
    State(state): State<AppState>,
    params: Result<Query<HistoryParams>, QueryRejection>,
) -> Result<Json<Vec<OperationRow>>, ApiError> {
    let Query(params) = params.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let rows = state.orchestrator.gate().history(params.effective_limit())?;
    Ok(Json(rows))
}

/// GET /api/v1/operations/jobs - pending scheduled jobs, soonest first.
pub async fn list_jobs(State(state): State<AppState>) -> Json<Vec<ScheduledJob>> {
    Json(state.orchestrator.jobs().list())
}

/// DELETE /api/v1/operations/{id} - remove one log row.
pub async fn delete_operation(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<DeletedResponse>, ApiError> {
    let Path(id) = id.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    if !state.orchestrator.gate().delete(id)? {
        return Err(ApiError::NotFound(format!("Operation {} not found", id)));
    }
    tracing::info!(operation_id = id, "Operation deleted");
    Ok(Json(DeletedResponse { deleted: id }))
}
