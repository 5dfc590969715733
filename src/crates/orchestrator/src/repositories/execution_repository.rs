//! Execution repository for database operations

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sqlx::Row;
use uuid::Uuid;

use engine::store::ExecutionStatus;

use crate::db::Database;
use crate::error::{OrchestratorError, Result};
use crate::models::StoredExecution;

/// Repository for execution database operations
#[derive(Clone, Debug)]
pub struct ExecutionRepository {
    db: Arc<Database>,
}

fn row_to_execution(row: &sqlx::sqlite::SqliteRow) -> Result<StoredExecution> {
    let id: String = row.get("id");
    let workflow_id: String = row.get("workflow_id");
    let status: String = row.get("status");
    let snapshot: String = row.get("graph_snapshot");
    let plan: Option<String> = row.get("execution_plan");

    Ok(StoredExecution {
        id: Uuid::parse_str(&id)
            .map_err(|e| OrchestratorError::Database(format!("invalid execution id: {}", e)))?,
        workflow_id: Uuid::parse_str(&workflow_id)
            .map_err(|e| OrchestratorError::Database(format!("invalid workflow id: {}", e)))?,
        status: status.parse::<ExecutionStatus>()?,
        graph_snapshot: serde_json::from_str(&snapshot)?,
        execution_plan: plan.as_deref().map(serde_json::from_str).transpose()?,
        budget_max_tokens: row.get("budget_max_tokens"),
        budget_max_cost: row.get("budget_max_cost"),
        total_tokens_prompt: row.get("total_tokens_prompt"),
        total_tokens_completion: row.get("total_tokens_completion"),
        total_cost: row.get("total_cost"),
        estimated_cost: row.get("estimated_cost"),
        error_message: row.get("error_message"),
        started_at: row.get::<Option<DateTime<Utc>>, _>("started_at"),
        completed_at: row.get::<Option<DateTime<Utc>>, _>("completed_at"),
        created_at: row.get::<DateTime<Utc>, _>("created_at"),
    })
}

const EXECUTION_COLUMNS: &str = "id, workflow_id, status, graph_snapshot, execution_plan, \
     budget_max_tokens, budget_max_cost, total_tokens_prompt, total_tokens_completion, \
     total_cost, estimated_cost, error_message, started_at, completed_at, created_at";

impl ExecutionRepository {
    /// Create a new execution repository
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Insert a freshly admitted execution
    pub async fn insert(&self, execution: &StoredExecution) -> Result<()> {
        sqlx::query(
            "INSERT INTO workflow_executions (
                id, workflow_id, status, graph_snapshot, execution_plan,
                budget_max_tokens, budget_max_cost, total_tokens_prompt,
                total_tokens_completion, total_cost, estimated_cost,
                error_message, started_at, completed_at, created_at
             ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(execution.id.to_string())
        .bind(execution.workflow_id.to_string())
        .bind(execution.status.as_str())
        .bind(serde_json::to_string(&execution.graph_snapshot)?)
        .bind(
            execution
                .execution_plan
                .as_ref()
                .map(serde_json::to_string)
                .transpose()?,
        )
        .bind(execution.budget_max_tokens)
        .bind(execution.budget_max_cost)
        .bind(execution.total_tokens_prompt)
        .bind(execution.total_tokens_completion)
        .bind(execution.total_cost)
        .bind(execution.estimated_cost)
        .bind(&execution.error_message)
        .bind(execution.started_at)
        .bind(execution.completed_at)
        .bind(execution.created_at)
        .execute(self.db.pool())
        .await
        .map_err(|e| OrchestratorError::Database(format!("Failed to insert execution: {}", e)))?;

        Ok(())
    }

    /// Load an execution by id
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<StoredExecution>> {
        let query = format!(
            "SELECT {} FROM workflow_executions WHERE id = ?",
            EXECUTION_COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(id.to_string())
            .fetch_optional(self.db.pool())
            .await
            .map_err(|e| {
                OrchestratorError::Database(format!("Failed to load execution: {}", e))
            })?;

        row.as_ref().map(row_to_execution).transpose()
    }

    /// List executions of one workflow, newest first, optionally filtered by
    /// status. Returns the page plus the total matching count.
    pub async fn list_for_workflow(
        &self,
        workflow_id: Uuid,
        skip: i64,
        limit: i64,
        status: Option<&str>,
    ) -> Result<(Vec<StoredExecution>, i64)> {
        let (filter, total_query) = if status.is_some() {
            (
                "WHERE workflow_id = ? AND status = ?",
                "SELECT COUNT(*) as count FROM workflow_executions WHERE workflow_id = ? AND status = ?",
            )
        } else {
            (
                "WHERE workflow_id = ?",
                "SELECT COUNT(*) as count FROM workflow_executions WHERE workflow_id = ?",
            )
        };

        let mut count_query = sqlx::query(total_query).bind(workflow_id.to_string());
        if let Some(status) = status {
            count_query = count_query.bind(status);
        }
        let total: i64 = count_query
            .fetch_one(self.db.pool())
            .await
            .map_err(|e| {
                OrchestratorError::Database(format!("Failed to count executions: {}", e))
            })?
            .get("count");

        let page_query = format!(
            "SELECT {} FROM workflow_executions {} ORDER BY created_at DESC LIMIT ? OFFSET ?",
            EXECUTION_COLUMNS, filter
        );
        let mut query = sqlx::query(&page_query).bind(workflow_id.to_string());
        if let Some(status) = status {
            query = query.bind(status);
        }
        let rows = query
            .bind(limit)
            .bind(skip)
            .fetch_all(self.db.pool())
            .await
            .map_err(|e| {
                OrchestratorError::Database(format!("Failed to list executions: {}", e))
            })?;

        let executions: Result<Vec<_>> = rows.iter().map(row_to_execution).collect();
        Ok((executions?, total))
    }

    /// Latest execution of a workflow, if any
    pub async fn latest_for_workflow(&self, workflow_id: Uuid) -> Result<Option<StoredExecution>> {
        let query = format!(
            "SELECT {} FROM workflow_executions WHERE workflow_id = ?
             ORDER BY created_at DESC LIMIT 1",
            EXECUTION_COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(workflow_id.to_string())
            .fetch_optional(self.db.pool())
            .await
            .map_err(|e| {
                OrchestratorError::Database(format!("Failed to load latest execution: {}", e))
            })?;

        row.as_ref().map(row_to_execution).transpose()
    }

    /// Whether the workflow has a pending or running execution
    pub async fn has_active(&self, workflow_id: Uuid) -> Result<bool> {
        let row = sqlx::query(
            "SELECT COUNT(*) as count FROM workflow_executions
             WHERE workflow_id = ? AND status IN ('pending', 'running')",
        )
        .bind(workflow_id.to_string())
        .fetch_one(self.db.pool())
        .await
        .map_err(|e| {
            OrchestratorError::Database(format!("Failed to check active executions: {}", e))
        })?;

        let count: i64 = row.get("count");
        Ok(count > 0)
    }

    /// Transition to running and stamp the start time
    pub async fn mark_running(&self, id: Uuid, started_at: DateTime<Utc>) -> Result<()> {
        sqlx::query("UPDATE workflow_executions SET status = 'running', started_at = ? WHERE id = ?")
            .bind(started_at)
            .bind(id.to_string())
            .execute(self.db.pool())
            .await
            .map_err(|e| {
                OrchestratorError::Database(format!("Failed to mark execution running: {}", e))
            })?;

        Ok(())
    }

    /// Accumulate totals from one completed agent call
    pub async fn add_totals(
        &self,
        id: Uuid,
        prompt_tokens: i64,
        completion_tokens: i64,
        cost: f64,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE workflow_executions
             SET total_tokens_prompt = total_tokens_prompt + ?,
                 total_tokens_completion = total_tokens_completion + ?,
                 total_cost = total_cost + ?
             WHERE id = ?",
        )
        .bind(prompt_tokens)
        .bind(completion_tokens)
        .bind(cost)
        .bind(id.to_string())
        .execute(self.db.pool())
        .await
        .map_err(|e| {
            OrchestratorError::Database(format!("Failed to update execution totals: {}", e))
        })?;

        Ok(())
    }

    /// Freeze the execution in a terminal status
    pub async fn finalize(
        &self,
        id: Uuid,
        status: ExecutionStatus,
        error_message: Option<String>,
        completed_at: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE workflow_executions
             SET status = ?, error_message = ?, completed_at = ?
             WHERE id = ?",
        )
        .bind(status.as_str())
        .bind(error_message)
        .bind(completed_at)
        .bind(id.to_string())
        .execute(self.db.pool())
        .await
        .map_err(|e| {
            OrchestratorError::Database(format!("Failed to finalize execution: {}", e))
        })?;

        Ok(())
    }
}
