//! Execution admission and query handlers

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::AppState;
use crate::services::execution_service::ExecuteRequest;

fn default_limit() -> i64 {
    20
}

#[derive(Debug, Deserialize)]
pub struct ExecutionListQuery {
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub status: Option<String>,
}

/// POST /api/v1/workflows/:id/execute
///
/// 202 on admission; the response carries the WebSocket URL for live
/// progress. Rejections: 400 EMPTY_WORKFLOW / CIRCULAR_DEPENDENCY /
/// BUDGET_EXCEEDED_ESTIMATE, 404 NOT_FOUND, 409 CONFLICT.
pub async fn execute_workflow(
    State(state): State<AppState>,
    Path(workflow_id): Path<Uuid>,
    payload: Option<Json<ExecuteRequest>>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let request = payload.map(|Json(r)| r).unwrap_or_default();
    let response = state.executions.execute(workflow_id, request).await?;
    Ok((StatusCode::ACCEPTED, Json(json!({ "data": response }))))
}

/// GET /api/v1/executions/:id
pub async fn get_execution(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let detail = state.executions.get_execution(id).await?;
    Ok(Json(json!({ "data": detail })))
}

/// GET /api/v1/workflows/:id/executions
pub async fn list_executions(
    State(state): State<AppState>,
    Path(workflow_id): Path<Uuid>,
    Query(query): Query<ExecutionListQuery>,
) -> Result<Json<Value>, ApiError> {
    let skip = query.skip.max(0);
    let limit = query.limit.clamp(1, 100);
    let (items, total) = state
        .executions
        .list_executions(workflow_id, skip, limit, query.status.as_deref())
        .await?;
    Ok(Json(
        json!({ "data": items, "total": total, "skip": skip, "limit": limit }),
    ))
}
