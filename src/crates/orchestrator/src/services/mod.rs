//! Business logic services

pub mod execution_service;
pub mod workflow_service;

pub use execution_service::ExecutionService;
pub use workflow_service::WorkflowService;
