//! Agent run repository for database operations

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sqlx::Row;
use uuid::Uuid;

use engine::graph::Provider;
use engine::store::{AgentRunRecord, AgentRunStatus, AgentRunUpdate, NewAgentRun};

use crate::db::Database;
use crate::error::{OrchestratorError, Result};

/// Repository for agent run database operations
#[derive(Clone, Debug)]
pub struct AgentRunRepository {
    db: Arc<Database>,
}

fn row_to_run(row: &sqlx::sqlite::SqliteRow) -> Result<AgentRunRecord> {
    let id: String = row.get("id");
    let execution_id: String = row.get("execution_id");
    let status: String = row.get("status");
    let provider: String = row.get("provider");
    let input_data: Option<String> = row.get("input_data");
    let output_data: Option<String> = row.get("output_data");

    Ok(AgentRunRecord {
        id: Uuid::parse_str(&id)
            .map_err(|e| OrchestratorError::Database(format!("invalid run id: {}", e)))?,
        execution_id: Uuid::parse_str(&execution_id)
            .map_err(|e| OrchestratorError::Database(format!("invalid execution id: {}", e)))?,
        agent_node_id: row.get("agent_node_id"),
        agent_name: row.get("agent_name"),
        status: status.parse::<AgentRunStatus>()?,
        provider: provider.parse::<Provider>().map_err(|e| {
            OrchestratorError::Database(format!("invalid provider on run: {}", e))
        })?,
        model: row.get("model"),
        tokens_prompt: row.get("tokens_prompt"),
        tokens_completion: row.get("tokens_completion"),
        cost: row.get("cost"),
        latency_ms: row.get("latency_ms"),
        retries: row.get("retries"),
        is_fallback: row.get("is_fallback"),
        fallback_for: row.get("fallback_for"),
        execution_order: row.get("execution_order"),
        parallel_group: row.get("parallel_group"),
        input_data: input_data.as_deref().map(serde_json::from_str).transpose()?,
        output_data: output_data.as_deref().map(serde_json::from_str).transpose()?,
        error_message: row.get("error_message"),
        started_at: row.get::<Option<DateTime<Utc>>, _>("started_at"),
        completed_at: row.get::<Option<DateTime<Utc>>, _>("completed_at"),
    })
}

impl AgentRunRepository {
    /// Create a new agent run repository
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Insert a new agent run row, returning its generated id
    pub async fn insert(&self, run: &NewAgentRun) -> Result<Uuid> {
        let id = Uuid::new_v4();

        sqlx::query(
            "INSERT INTO agent_runs (
                id, execution_id, agent_node_id, agent_name, status, provider,
                model, is_fallback, fallback_for, execution_order, parallel_group,
                input_data, error_message, started_at
             ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(id.to_string())
        .bind(run.execution_id.to_string())
        .bind(&run.agent_node_id)
        .bind(&run.agent_name)
        .bind(run.status.as_str())
        .bind(run.provider.as_str())
        .bind(&run.model)
        .bind(run.is_fallback)
        .bind(&run.fallback_for)
        .bind(run.execution_order)
        .bind(run.parallel_group)
        .bind(
            run.input_data
                .as_ref()
                .map(serde_json::to_string)
                .transpose()?,
        )
        .bind(&run.error_message)
        .bind(run.started_at)
        .execute(self.db.pool())
        .await
        .map_err(|e| OrchestratorError::Database(format!("Failed to insert agent run: {}", e)))?;

        Ok(id)
    }

    /// Apply a terminal update to a run
    pub async fn update(&self, update: &AgentRunUpdate) -> Result<()> {
        sqlx::query(
            "UPDATE agent_runs
             SET status = ?, output_data = ?, tokens_prompt = ?, tokens_completion = ?,
                 cost = ?, latency_ms = ?, retries = ?, error_message = ?, completed_at = ?
             WHERE id = ?",
        )
        .bind(update.status.as_str())
        .bind(
            update
                .output_data
                .as_ref()
                .map(serde_json::to_string)
                .transpose()?,
        )
        .bind(update.tokens_prompt)
        .bind(update.tokens_completion)
        .bind(update.cost)
        .bind(update.latency_ms)
        .bind(update.retries)
        .bind(&update.error_message)
        .bind(update.completed_at)
        .bind(update.id.to_string())
        .execute(self.db.pool())
        .await
        .map_err(|e| OrchestratorError::Database(format!("Failed to update agent run: {}", e)))?;

        Ok(())
    }

    /// All runs of an execution ordered by execution order, originals before
    /// their fallback at equal order
    pub async fn list_for_execution(&self, execution_id: Uuid) -> Result<Vec<AgentRunRecord>> {
        let rows = sqlx::query(
            "SELECT id, execution_id, agent_node_id, agent_name, status, provider,
                    model, tokens_prompt, tokens_completion, cost, latency_ms, retries,
                    is_fallback, fallback_for, execution_order, parallel_group,
                    input_data, output_data, error_message, started_at, completed_at
             FROM agent_runs
             WHERE execution_id = ?
             ORDER BY execution_order ASC, is_fallback ASC",
        )
        .bind(execution_id.to_string())
        .fetch_all(self.db.pool())
        .await
        .map_err(|e| OrchestratorError::Database(format!("Failed to list agent runs: {}", e)))?;

        rows.iter().map(row_to_run).collect()
    }
}
