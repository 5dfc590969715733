//! # agentflow engine
//!
//! Core execution engine for directed-acyclic workflows of LLM-calling
//! agents. A submitted graph is planned into ordered parallel groups, then
//! executed with retry, per-node fallback agents, conditional edges,
//! dependency-failure propagation and token/cost budget enforcement. Every
//! transition is persisted through the [`store::ExecutionStore`] seam and
//! published to a per-execution event channel.
//!
//! The engine stays provider-agnostic: LLM access goes through the
//! [`adapter::CompletionModel`] trait, resolved per provider by a
//! [`adapter::ProviderRouter`]. Provider implementations live in the `llm`
//! crate; persistence lives in the `orchestrator` crate.
//!
//! ## Pipeline
//!
//! ```text
//! graph -> planner::plan -> ExecutionPlan
//!       -> budget::estimate_workflow_cost (admission gate)
//!       -> WorkflowExecutor::run (worker)
//!       -> store rows + event stream
//! ```

pub mod adapter;
pub mod budget;
pub mod error;
pub mod events;
pub mod executor;
pub mod graph;
pub mod planner;
pub mod pricing;
pub mod recall;
pub mod retry;
pub mod store;

// Re-export key types for convenience
pub use adapter::{CompletionModel, LlmResponse, ProviderRouter, TokenUsage};
pub use budget::{
    estimate_workflow_cost, generate_budget_suggestions, BudgetEnforcer, BudgetStatus,
    BudgetSuggestion, Confidence, CostEstimate,
};
pub use error::{EngineError, Result};
pub use events::{EventBus, ExecutionEvent};
pub use executor::{eval_condition, InputData, WorkflowExecutor};
pub use graph::{GraphData, GraphEdge, GraphNode, NodeConfig, NodeType, Provider};
pub use planner::{plan, AgentPlanEntry, ExecutionPlan, ParallelGroup};
pub use pricing::{ModelPricing, PricingTable};
pub use recall::{RecallHook, RecalledMemory};
pub use retry::{with_retry, RetryConfig, RetryResult};
pub use store::{
    memory::MemoryStore, AgentRunRecord, AgentRunStatus, ExecutionRecord, ExecutionStatus,
    ExecutionStore,
};
