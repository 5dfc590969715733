//! SQLite-backed implementation of the engine's execution store

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use engine::error::EngineError;
use engine::store::{
    AgentRunRecord, AgentRunUpdate, ExecutionRecord, ExecutionStatus, ExecutionStore, NewAgentRun,
};

use crate::db::Database;
use crate::repositories::{AgentRunRepository, ExecutionRepository};

/// Bridges the executor's storage seam onto the SQLite repositories.
#[derive(Clone, Debug)]
pub struct SqliteExecutionStore {
    executions: ExecutionRepository,
    agent_runs: AgentRunRepository,
}

impl SqliteExecutionStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self {
            executions: ExecutionRepository::new(db.clone()),
            agent_runs: AgentRunRepository::new(db),
        }
    }
}

fn storage_err(err: crate::error::OrchestratorError) -> EngineError {
    EngineError::Storage(err.to_string())
}

#[async_trait]
impl ExecutionStore for SqliteExecutionStore {
    async fn load_execution(&self, id: Uuid) -> engine::Result<Option<ExecutionRecord>> {
        let execution = self.executions.find_by_id(id).await.map_err(storage_err)?;
        Ok(execution.map(|e| e.to_engine_record()))
    }

    async fn mark_running(&self, id: Uuid, started_at: DateTime<Utc>) -> engine::Result<()> {
        self.executions
            .mark_running(id, started_at)
            .await
            .map_err(storage_err)
    }

    async fn insert_agent_run(&self, run: NewAgentRun) -> engine::Result<Uuid> {
        self.agent_runs.insert(&run).await.map_err(storage_err)
    }

    async fn update_agent_run(&self, update: AgentRunUpdate) -> engine::Result<()> {
        self.agent_runs.update(&update).await.map_err(storage_err)
    }

    async fn add_execution_totals(
        &self,
        id: Uuid,
        prompt_tokens: i64,
        completion_tokens: i64,
        cost: f64,
    ) -> engine::Result<()> {
        self.executions
            .add_totals(id, prompt_tokens, completion_tokens, cost)
            .await
            .map_err(storage_err)
    }

    async fn list_agent_runs(&self, execution_id: Uuid) -> engine::Result<Vec<AgentRunRecord>> {
        self.agent_runs
            .list_for_execution(execution_id)
            .await
            .map_err(storage_err)
    }

    async fn finalize_execution(
        &self,
        id: Uuid,
        status: ExecutionStatus,
        error_message: Option<String>,
        completed_at: DateTime<Utc>,
    ) -> engine::Result<()> {
        self.executions
            .finalize(id, status, error_message, completed_at)
            .await
            .map_err(storage_err)
    }
}
