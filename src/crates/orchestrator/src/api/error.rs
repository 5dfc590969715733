//! HTTP error mapping
//!
//! Service errors become `{ "error": { "code", "message", "details?" } }`
//! payloads with the status codes the admission contract promises.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::error::OrchestratorError;

/// Wrapper that renders an [`OrchestratorError`] as an HTTP response.
pub struct ApiError(pub OrchestratorError);

impl From<OrchestratorError> for ApiError {
    fn from(err: OrchestratorError) -> Self {
        Self(err)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            OrchestratorError::NotFound(_) => StatusCode::NOT_FOUND,
            OrchestratorError::Conflict => StatusCode::CONFLICT,
            OrchestratorError::EmptyWorkflow
            | OrchestratorError::CircularDependency { .. }
            | OrchestratorError::BudgetExceededEstimate { .. }
            | OrchestratorError::Validation(_) => StatusCode::BAD_REQUEST,
            OrchestratorError::Database(_) | OrchestratorError::Engine(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn code(&self) -> &'static str {
        match &self.0 {
            OrchestratorError::NotFound(_) => "NOT_FOUND",
            OrchestratorError::Conflict => "CONFLICT",
            OrchestratorError::EmptyWorkflow => "EMPTY_WORKFLOW",
            OrchestratorError::CircularDependency { .. } => "CIRCULAR_DEPENDENCY",
            OrchestratorError::BudgetExceededEstimate { .. } => "BUDGET_EXCEEDED_ESTIMATE",
            OrchestratorError::Validation(_) => "VALIDATION_ERROR",
            OrchestratorError::Database(_) | OrchestratorError::Engine(_) => "INTERNAL_ERROR",
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match &self.0 {
            OrchestratorError::CircularDependency { cycle_nodes } => {
                Some(json!({ "cycle_nodes": cycle_nodes }))
            }
            OrchestratorError::BudgetExceededEstimate {
                estimated_cost,
                max_cost,
                suggestions,
            } => Some(json!({
                "estimated_cost": estimated_cost,
                "max_cost": max_cost,
                "suggestions": suggestions,
            })),
            _ => None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        }

        let mut error = json!({
            "code": self.code(),
            "message": self.0.to_string(),
        });
        if let Some(details) = self.details() {
            error["details"] = details;
        }

        (status, Json(json!({ "error": error }))).into_response()
    }
}
