//! Session Routes

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use read_session::{SessionId, SessionKind};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{ApiError, AppState};

/// Body of an open request
#[derive(Debug, Deserialize)]
pub struct OpenRequest {
    pub kind: SessionKind,
}

/// Response for a newly opened session
#[derive(Debug, Serialize, Deserialize)]
pub struct OpenResponse {
    pub id: SessionId,
    pub kind: SessionKind,
}

/// Query parameters for reads
#[derive(Debug, Deserialize)]
pub struct ReadQuery {
    /// Bytes the caller can accept
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,
}

fn default_max_bytes() -> usize {
    4096
}

/// Open a latest or full session
pub async fn open_session(
    State(state): State<Arc<AppState>>,
    Json(request): Json<OpenRequest>,
) -> impl IntoResponse {
    let id = state.sessions.open(request.kind);
    (
        StatusCode::CREATED,
        Json(OpenResponse {
            id,
            kind: request.kind,
        }),
    )
}

/// Read the next formatted sample; 204 when the session has nothing to give
pub async fn read_next(
    State(state): State<Arc<AppState>>,
    Path(id): Path<SessionId>,
    Query(params): Query<ReadQuery>,
) -> Result<Response, ApiError> {
    match state.sessions.read(&id, params.max_bytes)? {
        Some(bytes) => Ok((StatusCode::OK, bytes).into_response()),
        None => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}

/// Rewind a session as if it had just been opened
pub async fn reset_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<SessionId>,
) -> Result<StatusCode, ApiError> {
    state.sessions.reset(&id)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn close_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<SessionId>,
) -> Result<StatusCode, ApiError> {
    state.sessions.close(&id)?;
    Ok(StatusCode::NO_CONTENT)
}
