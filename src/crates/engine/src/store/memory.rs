//! In-memory execution store
//!
//! Backs executor tests and embedded single-process use. State lives behind
//! one mutex; the executor is the only writer for a given execution, so
//! contention is limited to concurrent agent-run updates within a group.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use uuid::Uuid;

use super::{
    AgentRunRecord, AgentRunUpdate, ExecutionRecord, ExecutionStatus, ExecutionStore, NewAgentRun,
};
use crate::error::{EngineError, Result};

#[derive(Debug, Default)]
struct Inner {
    executions: HashMap<Uuid, ExecutionRecord>,
    runs: Vec<AgentRunRecord>,
}

/// Mutex-guarded in-memory [`ExecutionStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an execution record, as admission would.
    pub fn insert_execution(&self, record: ExecutionRecord) {
        self.inner.lock().executions.insert(record.id, record);
    }

    /// Create and seed a pending execution with optional budget caps.
    pub fn seed_pending(
        &self,
        workflow_id: Uuid,
        budget_max_tokens: Option<i64>,
        budget_max_cost: Option<f64>,
    ) -> Uuid {
        let id = Uuid::new_v4();
        self.insert_execution(ExecutionRecord {
            id,
            workflow_id,
            status: ExecutionStatus::Pending,
            budget_max_tokens,
            budget_max_cost,
            total_tokens_prompt: 0,
            total_tokens_completion: 0,
            total_cost: 0.0,
            estimated_cost: None,
            error_message: None,
            started_at: None,
            completed_at: None,
            created_at: Utc::now(),
        });
        id
    }

    fn execution_mut<'a>(
        inner: &'a mut Inner,
        id: Uuid,
    ) -> Result<&'a mut ExecutionRecord> {
        inner
            .executions
            .get_mut(&id)
            .ok_or(EngineError::ExecutionNotFound(id))
    }
}

#[async_trait]
impl ExecutionStore for MemoryStore {
    async fn load_execution(&self, id: Uuid) -> Result<Option<ExecutionRecord>> {
        Ok(self.inner.lock().executions.get(&id).cloned())
    }

    async fn mark_running(&self, id: Uuid, started_at: DateTime<Utc>) -> Result<()> {
        let mut inner = self.inner.lock();
        let record = Self::execution_mut(&mut inner, id)?;
        record.status = ExecutionStatus::Running;
        record.started_at = Some(started_at);
        Ok(())
    }

    async fn insert_agent_run(&self, run: NewAgentRun) -> Result<Uuid> {
        let id = Uuid::new_v4();
        self.inner.lock().runs.push(AgentRunRecord {
            id,
            execution_id: run.execution_id,
            agent_node_id: run.agent_node_id,
            agent_name: run.agent_name,
            status: run.status,
            provider: run.provider,
            model: run.model,
            tokens_prompt: 0,
            tokens_completion: 0,
            cost: 0.0,
            latency_ms: None,
            retries: 0,
            is_fallback: run.is_fallback,
            fallback_for: run.fallback_for,
            execution_order: run.execution_order,
            parallel_group: run.parallel_group,
            input_data: run.input_data,
            output_data: None,
            error_message: run.error_message,
            started_at: run.started_at,
            completed_at: None,
        });
        Ok(id)
    }

    async fn update_agent_run(&self, update: AgentRunUpdate) -> Result<()> {
        let mut inner = self.inner.lock();
        let run = inner
            .runs
            .iter_mut()
            .find(|r| r.id == update.id)
            .ok_or_else(|| EngineError::Storage(format!("agent run not found: {}", update.id)))?;

        run.status = update.status;
        run.output_data = update.output_data;
        run.tokens_prompt = update.tokens_prompt;
        run.tokens_completion = update.tokens_completion;
        run.cost = update.cost;
        run.latency_ms = update.latency_ms;
        run.retries = update.retries;
        run.error_message = update.error_message;
        run.completed_at = Some(update.completed_at);
        Ok(())
    }

    async fn add_execution_totals(
        &self,
        id: Uuid,
        prompt_tokens: i64,
        completion_tokens: i64,
        cost: f64,
    ) -> Result<()> {
        let mut inner = self.inner.lock();
        let record = Self::execution_mut(&mut inner, id)?;
        record.total_tokens_prompt += prompt_tokens;
        record.total_tokens_completion += completion_tokens;
        record.total_cost += cost;
        Ok(())
    }

    async fn list_agent_runs(&self, execution_id: Uuid) -> Result<Vec<AgentRunRecord>> {
        let inner = self.inner.lock();
        let mut runs: Vec<AgentRunRecord> = inner
            .runs
            .iter()
            .filter(|r| r.execution_id == execution_id)
            .cloned()
            .collect();
        runs.sort_by_key(|r| (r.execution_order, r.is_fallback));
        Ok(runs)
    }

    async fn finalize_execution(
        &self,
        id: Uuid,
        status: ExecutionStatus,
        error_message: Option<String>,
        completed_at: DateTime<Utc>,
    ) -> Result<()> {
        let mut inner = self.inner.lock();
        let record = Self::execution_mut(&mut inner, id)?;
        record.status = status;
        record.error_message = error_message;
        record.completed_at = Some(completed_at);
        Ok(())
    }
}
