//! Database repositories

pub mod agent_run_repository;
pub mod execution_repository;
pub mod workflow_repository;

pub use agent_run_repository::AgentRunRepository;
pub use execution_repository::ExecutionRepository;
pub use workflow_repository::WorkflowRepository;
