//! HTTP API and WebSocket bridge

pub mod error;
pub mod handlers;
pub mod routes;
pub mod ws;

use std::sync::Arc;

use engine::events::EventBus;

use crate::db::Database;
use crate::services::{ExecutionService, WorkflowService};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub workflows: WorkflowService,
    pub executions: ExecutionService,
    pub events: Arc<EventBus>,
}
