//! Liveness and readiness probes.

use axum::{extract::State, http::StatusCode, response::IntoResponse};

use crate::state::AppState;

/// Liveness: the process is serving requests.
pub async fn health() -> impl IntoResponse {
    "ok"
}

/// Readiness: the database answers a trivial query.
pub async fn ready(State(state): State<AppState>) -> impl IntoResponse {
    let Some(pool) = state.pool() else {
        return (StatusCode::OK, "ok");
    };

    match sqlx::query("SELECT 1").execute(pool).await {
        Ok(_) => (StatusCode::OK, "ok"),
        Err(e) => {
            tracing::error!(error = %e, "Readiness check failed: database unavailable");
            (StatusCode::SERVICE_UNAVAILABLE, "database unavailable")
        }
    }
}
