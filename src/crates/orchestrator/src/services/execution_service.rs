//! Execution admission and queries
//!
//! Admission is the gate in front of the executor: it enforces the
//! one-active-execution-per-workflow rule, plans the graph, projects cost
//! against the caller's cap (rejecting with downgrade suggestions), persists
//! the pending execution and dispatches the job.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use engine::budget::{estimate_workflow_cost, generate_budget_suggestions};
use engine::executor::InputData;
use engine::planner;
use engine::pricing::PricingTable;
use engine::store::{AgentRunRecord, ExecutionStatus};

use crate::db::Database;
use crate::error::{OrchestratorError, Result};
use crate::models::StoredExecution;
use crate::queue::{ExecutionJob, JobQueue};
use crate::repositories::{AgentRunRepository, ExecutionRepository, WorkflowRepository};

/// Optional caps supplied at execution time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BudgetConfig {
    #[serde(default)]
    pub max_tokens: Option<i64>,
    #[serde(default)]
    pub max_cost: Option<f64>,
}

/// Request payload for starting an execution.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExecuteRequest {
    #[serde(default)]
    pub input_data: Option<InputData>,
    #[serde(default)]
    pub budget: Option<BudgetConfig>,
}

/// Accepted-execution response.
#[derive(Debug, Clone, Serialize)]
pub struct ExecuteResponse {
    pub execution_id: Uuid,
    pub status: ExecutionStatus,
    pub estimated_cost: f64,
    pub websocket_url: String,
}

/// Aggregate totals on an execution detail.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionTotals {
    pub tokens_prompt: i64,
    pub tokens_completion: i64,
    pub tokens_total: i64,
    pub cost: f64,
    pub duration_ms: Option<i64>,
}

/// Full execution detail, agents in execution order.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionDetail {
    pub id: Uuid,
    pub workflow_id: Uuid,
    pub status: ExecutionStatus,
    pub budget: Option<BudgetConfig>,
    pub totals: ExecutionTotals,
    pub estimated_cost: Option<f64>,
    pub execution_plan: Option<engine::planner::ExecutionPlan>,
    pub error_message: Option<String>,
    pub agents: Vec<AgentRunRecord>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Listing row for an execution.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionListItem {
    pub id: Uuid,
    pub status: ExecutionStatus,
    pub total_cost: f64,
    pub total_tokens: i64,
    pub duration_ms: Option<i64>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Admission and execution queries.
#[derive(Clone)]
pub struct ExecutionService {
    workflows: WorkflowRepository,
    executions: ExecutionRepository,
    agent_runs: AgentRunRepository,
    pricing: Arc<PricingTable>,
    queue: JobQueue,
}

impl ExecutionService {
    pub fn new(db: Arc<Database>, pricing: Arc<PricingTable>, queue: JobQueue) -> Self {
        Self {
            workflows: WorkflowRepository::new(db.clone()),
            executions: ExecutionRepository::new(db.clone()),
            agent_runs: AgentRunRepository::new(db),
            pricing,
            queue,
        }
    }

    /// WebSocket path clients subscribe to for one execution.
    pub fn websocket_url(execution_id: Uuid) -> String {
        format!("/ws/executions/{}", execution_id)
    }

    /// Admit and dispatch one execution of a workflow.
    pub async fn execute(
        &self,
        workflow_id: Uuid,
        request: ExecuteRequest,
    ) -> Result<ExecuteResponse> {
        let workflow = self
            .workflows
            .find_by_id(workflow_id)
            .await?
            .ok_or_else(|| OrchestratorError::NotFound(format!("workflow {}", workflow_id)))?;

        if self.executions.has_active(workflow_id).await? {
            return Err(OrchestratorError::Conflict);
        }

        let plan = planner::plan(&workflow.graph_data)?;
        let estimate = estimate_workflow_cost(&plan, &workflow.graph_data, &self.pricing);

        let budget = request.budget.unwrap_or_default();
        if let Some(max_cost) = budget.max_cost {
            if estimate.total > max_cost {
                let suggestions =
                    generate_budget_suggestions(&estimate, &workflow.graph_data, &self.pricing);
                return Err(OrchestratorError::BudgetExceededEstimate {
                    estimated_cost: estimate.total,
                    max_cost,
                    suggestions,
                });
            }
        }

        let execution = StoredExecution::new_pending(
            workflow_id,
            workflow.graph_data.clone(),
            plan.clone(),
            budget.max_tokens,
            budget.max_cost,
            Some(estimate.total),
        );
        self.executions.insert(&execution).await?;

        self.queue
            .dispatch(ExecutionJob {
                execution_id: execution.id,
                plan,
                graph_data: workflow.graph_data,
                input_data: request.input_data,
            })
            .await?;

        info!(
            workflow_id = %workflow_id,
            execution_id = %execution.id,
            estimated_cost = estimate.total,
            "execution admitted"
        );

        Ok(ExecuteResponse {
            execution_id: execution.id,
            status: ExecutionStatus::Pending,
            estimated_cost: estimate.total,
            websocket_url: Self::websocket_url(execution.id),
        })
    }

    /// Full detail of one execution including its agent runs.
    pub async fn get_execution(&self, id: Uuid) -> Result<ExecutionDetail> {
        let execution = self
            .executions
            .find_by_id(id)
            .await?
            .ok_or_else(|| OrchestratorError::NotFound(format!("execution {}", id)))?;

        let agents = self.agent_runs.list_for_execution(id).await?;

        let budget = if execution.budget_max_tokens.is_some() || execution.budget_max_cost.is_some()
        {
            Some(BudgetConfig {
                max_tokens: execution.budget_max_tokens,
                max_cost: execution.budget_max_cost,
            })
        } else {
            None
        };

        Ok(ExecutionDetail {
            id: execution.id,
            workflow_id: execution.workflow_id,
            status: execution.status,
            budget,
            totals: ExecutionTotals {
                tokens_prompt: execution.total_tokens_prompt,
                tokens_completion: execution.total_tokens_completion,
                tokens_total: execution.total_tokens_prompt + execution.total_tokens_completion,
                cost: execution.total_cost,
                duration_ms: execution.duration_ms(),
            },
            estimated_cost: execution.estimated_cost,
            execution_plan: execution.execution_plan,
            error_message: execution.error_message,
            agents,
            started_at: execution.started_at,
            completed_at: execution.completed_at,
            created_at: execution.created_at,
        })
    }

    /// Page of executions for a workflow.
    pub async fn list_executions(
        &self,
        workflow_id: Uuid,
        skip: i64,
        limit: i64,
        status: Option<&str>,
    ) -> Result<(Vec<ExecutionListItem>, i64)> {
        // 404 for unknown workflows rather than an empty page.
        self.workflows
            .find_by_id(workflow_id)
            .await?
            .ok_or_else(|| OrchestratorError::NotFound(format!("workflow {}", workflow_id)))?;

        let (executions, total) = self
            .executions
            .list_for_workflow(workflow_id, skip, limit, status)
            .await?;

        let items = executions
            .into_iter()
            .map(|e| ExecutionListItem {
                id: e.id,
                status: e.status,
                total_cost: e.total_cost,
                total_tokens: e.total_tokens_prompt + e.total_tokens_completion,
                duration_ms: e.duration_ms(),
                started_at: e.started_at,
                completed_at: e.completed_at,
                created_at: e.created_at,
            })
            .collect();

        Ok((items, total))
    }

    /// Build the terminal event for an already-finished execution, as the
    /// WebSocket bridge sends on late connects.
    pub async fn synthesize_completion(
        &self,
        id: Uuid,
    ) -> Result<engine::events::ExecutionEvent> {
        let execution = self
            .executions
            .find_by_id(id)
            .await?
            .ok_or_else(|| OrchestratorError::NotFound(format!("execution {}", id)))?;

        let runs = self.agent_runs.list_for_execution(id).await?;
        let completed = runs
            .iter()
            .filter(|r| r.status == engine::store::AgentRunStatus::Completed)
            .count();
        let failed = runs
            .iter()
            .filter(|r| r.status == engine::store::AgentRunStatus::Failed)
            .count();
        let skipped = runs
            .iter()
            .filter(|r| r.status == engine::store::AgentRunStatus::Skipped)
            .count();

        Ok(engine::events::ExecutionEvent::execution_completed(
            execution.status.as_str(),
            engine::events::ExecutionTotals {
                tokens_prompt: execution.total_tokens_prompt.max(0) as u64,
                tokens_completion: execution.total_tokens_completion.max(0) as u64,
                cost: execution.total_cost,
                duration_ms: execution.duration_ms().unwrap_or(0).max(0) as u64,
                agents_completed: completed,
                agents_failed: failed,
                agents_skipped: skipped,
            },
        ))
    }
}
