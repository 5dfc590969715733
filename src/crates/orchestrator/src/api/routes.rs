//! Route table

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::api::handlers::{executions, health, workflows};
use crate::api::{ws, AppState};

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/health", get(health::health_check))
        .route(
            "/api/v1/workflows",
            get(workflows::list_workflows).post(workflows::create_workflow),
        )
        .route(
            "/api/v1/workflows/:id",
            get(workflows::get_workflow)
                .put(workflows::update_workflow)
                .delete(workflows::delete_workflow),
        )
        .route(
            "/api/v1/workflows/:id/execute",
            post(executions::execute_workflow),
        )
        .route(
            "/api/v1/workflows/:id/executions",
            get(executions::list_executions),
        )
        .route("/api/v1/executions/:id", get(executions::get_execution))
        .route("/ws/executions/:id", get(ws::execution_ws))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
