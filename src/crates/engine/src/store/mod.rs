//! Persistence seam for the executor
//!
//! The executor owns every mutation of its execution record and agent runs,
//! but talks to storage only through [`ExecutionStore`]. The orchestrator
//! provides a SQLite-backed implementation; [`memory::MemoryStore`] backs
//! tests and embedded use.

pub mod memory;

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{EngineError, Result};
use crate::graph::Provider;

/// Lifecycle of one execution: `pending -> running -> {completed | failed}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl ExecutionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionStatus::Pending => "pending",
            ExecutionStatus::Running => "running",
            ExecutionStatus::Completed => "completed",
            ExecutionStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ExecutionStatus::Completed | ExecutionStatus::Failed)
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExecutionStatus {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(ExecutionStatus::Pending),
            "running" => Ok(ExecutionStatus::Running),
            "completed" => Ok(ExecutionStatus::Completed),
            "failed" => Ok(ExecutionStatus::Failed),
            other => Err(EngineError::Storage(format!(
                "unknown execution status: {}",
                other
            ))),
        }
    }
}

/// Lifecycle of one agent run:
/// `pending -> running -> {completed | failed | skipped}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentRunStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Skipped,
}

impl AgentRunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentRunStatus::Pending => "pending",
            AgentRunStatus::Running => "running",
            AgentRunStatus::Completed => "completed",
            AgentRunStatus::Failed => "failed",
            AgentRunStatus::Skipped => "skipped",
        }
    }
}

impl fmt::Display for AgentRunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgentRunStatus {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(AgentRunStatus::Pending),
            "running" => Ok(AgentRunStatus::Running),
            "completed" => Ok(AgentRunStatus::Completed),
            "failed" => Ok(AgentRunStatus::Failed),
            "skipped" => Ok(AgentRunStatus::Skipped),
            other => Err(EngineError::Storage(format!(
                "unknown agent run status: {}",
                other
            ))),
        }
    }
}

/// One execution record, as visible to the executor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionRecord {
    pub id: Uuid,
    pub workflow_id: Uuid,
    pub status: ExecutionStatus,
    pub budget_max_tokens: Option<i64>,
    pub budget_max_cost: Option<f64>,
    pub total_tokens_prompt: i64,
    pub total_tokens_completion: i64,
    pub total_cost: f64,
    pub estimated_cost: Option<f64>,
    pub error_message: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for a new agent run row.
#[derive(Debug, Clone)]
pub struct NewAgentRun {
    pub execution_id: Uuid,
    pub agent_node_id: String,
    pub agent_name: String,
    pub status: AgentRunStatus,
    pub provider: Provider,
    pub model: String,
    pub parallel_group: i64,
    pub execution_order: i64,
    pub is_fallback: bool,
    pub fallback_for: Option<String>,
    pub input_data: Option<serde_json::Value>,
    pub error_message: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
}

/// Terminal update applied to a running agent run.
#[derive(Debug, Clone)]
pub struct AgentRunUpdate {
    pub id: Uuid,
    pub status: AgentRunStatus,
    pub output_data: Option<serde_json::Value>,
    pub tokens_prompt: i64,
    pub tokens_completion: i64,
    pub cost: f64,
    pub latency_ms: Option<i64>,
    pub retries: i64,
    pub error_message: Option<String>,
    pub completed_at: DateTime<Utc>,
}

/// One stored agent run, uniquely keyed by `(execution_id, agent_node_id)`
/// for primary runs; fallback runs key under the fallback's node id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentRunRecord {
    pub id: Uuid,
    pub execution_id: Uuid,
    pub agent_node_id: String,
    pub agent_name: String,
    pub status: AgentRunStatus,
    pub provider: Provider,
    pub model: String,
    pub tokens_prompt: i64,
    pub tokens_completion: i64,
    pub cost: f64,
    pub latency_ms: Option<i64>,
    pub retries: i64,
    pub is_fallback: bool,
    pub fallback_for: Option<String>,
    pub execution_order: i64,
    pub parallel_group: i64,
    pub input_data: Option<serde_json::Value>,
    pub output_data: Option<serde_json::Value>,
    pub error_message: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Storage operations the executor depends on.
///
/// Writes must be visible to later reads within the same execution; the
/// implementation decides how to batch or flush.
#[async_trait]
pub trait ExecutionStore: Send + Sync {
    async fn load_execution(&self, id: Uuid) -> Result<Option<ExecutionRecord>>;

    /// Transition the execution to running and stamp `started_at`.
    async fn mark_running(&self, id: Uuid, started_at: DateTime<Utc>) -> Result<()>;

    /// Insert an agent run row, returning its generated id.
    async fn insert_agent_run(&self, run: NewAgentRun) -> Result<Uuid>;

    /// Apply a terminal update to an agent run.
    async fn update_agent_run(&self, update: AgentRunUpdate) -> Result<()>;

    /// Accumulate token and cost totals on the execution record.
    async fn add_execution_totals(
        &self,
        id: Uuid,
        prompt_tokens: i64,
        completion_tokens: i64,
        cost: f64,
    ) -> Result<()>;

    /// All agent runs of an execution, ordered by `execution_order`.
    async fn list_agent_runs(&self, execution_id: Uuid) -> Result<Vec<AgentRunRecord>>;

    /// Freeze the execution in a terminal status.
    async fn finalize_execution(
        &self,
        id: Uuid,
        status: ExecutionStatus,
        error_message: Option<String>,
        completed_at: DateTime<Utc>,
    ) -> Result<()>;
}
