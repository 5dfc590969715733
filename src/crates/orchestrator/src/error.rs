//! Error types for the orchestrator
//!
//! Service-level errors map one-to-one onto the API's error codes; the HTTP
//! layer attaches status codes in `api::error`.

use engine::budget::BudgetSuggestion;
use thiserror::Error;

/// Result type alias for orchestrator operations
pub type Result<T> = std::result::Result<T, OrchestratorError>;

/// Main error type for orchestrator operations
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// Requested entity does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// Workflow already has a pending or running execution
    #[error("workflow already has an active execution")]
    Conflict,

    /// Submitted graph has no nodes
    #[error("workflow has no nodes")]
    EmptyWorkflow,

    /// Submitted graph contains a cycle
    #[error("circular dependency detected involving: {}", cycle_nodes.join(", "))]
    CircularDependency { cycle_nodes: Vec<String> },

    /// Pre-flight estimate exceeds the requested cost cap
    #[error("estimated cost {estimated_cost} exceeds budget {max_cost}")]
    BudgetExceededEstimate {
        estimated_cost: f64,
        max_cost: f64,
        suggestions: Vec<BudgetSuggestion>,
    },

    /// Request payload failed validation
    #[error("validation error: {0}")]
    Validation(String),

    /// Database error
    #[error("database error: {0}")]
    Database(String),

    /// Engine error outside the categories above
    #[error("engine error: {0}")]
    Engine(String),
}

impl From<sqlx::Error> for OrchestratorError {
    fn from(err: sqlx::Error) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<engine::EngineError> for OrchestratorError {
    fn from(err: engine::EngineError) -> Self {
        match err {
            engine::EngineError::EmptyWorkflow => Self::EmptyWorkflow,
            engine::EngineError::CircularDependency { cycle_nodes } => {
                Self::CircularDependency { cycle_nodes }
            }
            engine::EngineError::Storage(msg) => Self::Database(msg),
            other => Self::Engine(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for OrchestratorError {
    fn from(err: serde_json::Error) -> Self {
        Self::Database(format!("serialization error: {}", err))
    }
}
