//! Health check handler.

use axum::extract::State;
use axum::http::StatusCode;

use crate::state::AppState;

/// GET /health
pub async fn health(State(state): State<AppState>) -> StatusCode {
    match state.admission.health().await {
        Ok(()) => StatusCode::NO_CONTENT,
        Err(e) => {
            tracing::warn!(error = %e, "Health check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
