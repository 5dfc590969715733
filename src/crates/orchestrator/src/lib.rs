//! # agentflow orchestrator
//!
//! Control surface around the workflow engine: SQLite persistence, the
//! admission services (conflict detection, planning, pre-flight budget
//! checks), an in-process job queue driving the executor, the HTTP API and
//! the WebSocket event bridge.
//!
//! ## Architecture
//!
//! ```text
//! POST /workflows/:id/execute
//!     -> ExecutionService (conflict, plan, estimate, persist pending)
//!     -> JobQueue -> Worker -> engine::WorkflowExecutor
//!                                  -> SqliteExecutionStore (rows)
//!                                  -> EventBus -> /ws/executions/:id
//! ```

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod queue;
pub mod repositories;
pub mod services;
pub mod store;

// Re-export key types for convenience
pub use api::AppState;
pub use config::AppConfig;
pub use db::Database;
pub use error::{OrchestratorError, Result};
pub use models::{StoredExecution, Workflow};
pub use queue::{ExecutionJob, JobQueue, Worker};
pub use repositories::{AgentRunRepository, ExecutionRepository, WorkflowRepository};
pub use services::{ExecutionService, WorkflowService};
pub use store::SqliteExecutionStore;
