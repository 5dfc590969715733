//! Workflow CRUD handlers

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::AppState;
use crate::services::workflow_service::{CreateWorkflowRequest, UpdateWorkflowRequest};

fn default_limit() -> i64 {
    20
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

impl ListQuery {
    pub fn clamped(&self) -> (i64, i64) {
        (self.skip.max(0), self.limit.clamp(1, 100))
    }
}

/// GET /api/v1/workflows
pub async fn list_workflows(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Value>, ApiError> {
    let (skip, limit) = query.clamped();
    let (items, total) = state.workflows.list(skip, limit).await?;
    Ok(Json(
        json!({ "data": items, "total": total, "skip": skip, "limit": limit }),
    ))
}

/// POST /api/v1/workflows
pub async fn create_workflow(
    State(state): State<AppState>,
    Json(payload): Json<CreateWorkflowRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let workflow = state.workflows.create(payload).await?;
    Ok((StatusCode::CREATED, Json(json!({ "data": workflow }))))
}

/// GET /api/v1/workflows/:id
pub async fn get_workflow(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let workflow = state.workflows.get(id).await?;
    Ok(Json(json!({ "data": workflow })))
}

/// PUT /api/v1/workflows/:id
pub async fn update_workflow(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateWorkflowRequest>,
) -> Result<Json<Value>, ApiError> {
    let workflow = state.workflows.update(id, payload).await?;
    Ok(Json(json!({ "data": workflow })))
}

/// DELETE /api/v1/workflows/:id
pub async fn delete_workflow(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    state.workflows.delete(id).await?;
    Ok(Json(json!({ "data": { "deleted": true, "id": id } })))
}
