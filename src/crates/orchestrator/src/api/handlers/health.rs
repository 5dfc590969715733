//! Health check handler

use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use crate::api::AppState;

/// GET /api/v1/health
pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    let database = match state.db.health_check().await {
        Ok(()) => "healthy",
        Err(err) => {
            tracing::warn!(error = %err, "database health check failed");
            "unhealthy"
        }
    };

    let status = if database == "healthy" { "ok" } else { "degraded" };

    Json(json!({
        "status": status,
        "database": database,
        "event_channels": state.events.channel_count(),
    }))
}
