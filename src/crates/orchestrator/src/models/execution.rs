//! Execution model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use engine::graph::GraphData;
use engine::planner::ExecutionPlan;
use engine::store::{ExecutionRecord, ExecutionStatus};

/// One stored execution: the immutable admission snapshot plus the running
/// totals the executor accumulates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredExecution {
    pub id: Uuid,
    pub workflow_id: Uuid,
    pub status: ExecutionStatus,
    pub graph_snapshot: GraphData,
    pub execution_plan: Option<ExecutionPlan>,
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

impl StoredExecution {
    /// Create a pending execution at admission.
    pub fn new_pending(
        workflow_id: Uuid,
        graph_snapshot: GraphData,
        execution_plan: ExecutionPlan,
        budget_max_tokens: Option<i64>,
        budget_max_cost: Option<f64>,
        estimated_cost: Option<f64>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            workflow_id,
            status: ExecutionStatus::Pending,
            graph_snapshot,
            execution_plan: Some(execution_plan),
            budget_max_tokens,
            budget_max_cost,
            total_tokens_prompt: 0,
            total_tokens_completion: 0,
            total_cost: 0.0,
            estimated_cost,
            error_message: None,
            started_at: None,
            completed_at: None,
            created_at: Utc::now(),
        }
    }

    /// Wall-clock duration, available once the execution ran.
    pub fn duration_ms(&self) -> Option<i64> {
        match (self.started_at, self.completed_at) {
            (Some(started), Some(completed)) => Some((completed - started).num_milliseconds()),
            _ => None,
        }
    }

    /// Project onto the engine's execution record.
    pub fn to_engine_record(&self) -> ExecutionRecord {
        ExecutionRecord {
            id: self.id,
            workflow_id: self.workflow_id,
            status: self.status,
            budget_max_tokens: self.budget_max_tokens,
            budget_max_cost: self.budget_max_cost,
            total_tokens_prompt: self.total_tokens_prompt,
            total_tokens_completion: self.total_tokens_completion,
            total_cost: self.total_cost,
            estimated_cost: self.estimated_cost,
            error_message: self.error_message.clone(),
            started_at: self.started_at,
            completed_at: self.completed_at,
            created_at: self.created_at,
        }
    }
}
