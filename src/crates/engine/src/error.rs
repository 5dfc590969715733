//! Error types for the workflow engine
//!
//! Provides a unified error type for planning, budgeting and execution.

use thiserror::Error;

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

/// Main error type for engine operations
#[derive(Debug, Error)]
pub enum EngineError {
    /// The submitted graph contains no nodes
    #[error("workflow has no nodes")]
    EmptyWorkflow,

    /// The submitted graph contains at least one cycle
    #[error("circular dependency detected involving: {}", cycle_nodes.join(", "))]
    CircularDependency {
        /// Nodes still holding positive in-degree after Kahn elimination
        cycle_nodes: Vec<String>,
    },

    /// Execution record missing from the store
    #[error("execution not found: {0}")]
    ExecutionNotFound(uuid::Uuid),

    /// Provider string not in the sealed provider set
    #[error("unknown provider: {0}")]
    UnknownProvider(String),

    /// LLM adapter failure (single attempt)
    #[error("LLM error: {0}")]
    Llm(String),

    /// Persistent store failure
    #[error("storage error: {0}")]
    Storage(String),

    /// Serialization/deserialization error
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}
