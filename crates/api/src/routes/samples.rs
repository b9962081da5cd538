//! Sample Routes

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use ring_buffer::{Channel, SampleRecord};
use std::sync::Arc;

use crate::{ApiError, AppState};

/// Most recent sample as JSON, 204 before the first sample
pub async fn get_latest(State(state): State<Arc<AppState>>) -> Response {
    match state.sessions.store().peek_active() {
        Some(record) => Json(record).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

/// Every surviving sample, oldest first
pub async fn get_history(State(state): State<Arc<AppState>>) -> Json<Vec<SampleRecord>> {
    Json(state.sessions.store().snapshot())
}

/// Single channel of the latest sample as `"<value>\n"`, empty before the
/// first sample
pub async fn get_attribute(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<String, ApiError> {
    let channel: Channel = name.parse()?;
    Ok(state
        .sessions
        .store()
        .peek_active()
        .map(|record| format!("{}\n", record.channel(channel)))
        .unwrap_or_default())
}
