//! Workflow executor
//!
//! Runs an execution plan group by group. Within a group, agents run as
//! cooperatively concurrent tasks; the group barrier is strict. Per node the
//! executor applies retry with backoff, a single-attempt fallback agent,
//! conditional-edge gating, dependency-failure propagation and budget
//! enforcement, persisting one agent run row per node and publishing events
//! along the way. The workflow always runs to completion; per-node failures
//! never abort it.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::adapter::{ProviderRouter, TokenUsage};
use crate::budget::{BudgetEnforcer, BudgetStatus};
use crate::error::Result;
use crate::events::{
    BudgetCapsPayload, BudgetConsumed, EventBus, EventTokens, ExecutionEvent, ExecutionTotals,
};
use crate::graph::{GraphData, NodeConfig};
use crate::planner::ExecutionPlan;
use crate::recall::{RecallHook, RecalledMemory};
use crate::retry::{with_retry, RetryConfig};
use crate::store::{
    AgentRunStatus, AgentRunUpdate, ExecutionStatus, ExecutionStore, NewAgentRun,
};

/// Skip reasons persisted on agent runs and carried on `agent_skipped` events.
pub const SKIP_DEPENDENCY_FAILED: &str = "dependency failed";
pub const SKIP_CONDITION_NOT_MET: &str = "condition not met";
pub const SKIP_BUDGET_EXCEEDED: &str = "budget exceeded";

/// Workflow-level input forwarded to first-hop agents.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InputData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_query: Option<String>,

    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl InputData {
    fn user_query(&self) -> Option<&str> {
        self.user_query.as_deref().filter(|q| !q.is_empty())
    }
}

/// Evaluate an edge condition against the source agent's output text.
///
/// Matches when the condition is empty, the literal `"default"`
/// (case-insensitive), exactly equals the output, or is a substring of it.
pub fn eval_condition(condition: &str, output_text: &str) -> bool {
    if condition.is_empty() || condition.eq_ignore_ascii_case("default") {
        return true;
    }
    output_text == condition || output_text.contains(condition)
}

/// Output of a completed upstream agent, keyed by the original node id even
/// when produced by its fallback.
#[derive(Debug, Clone)]
struct CompletedOutput {
    text: String,
    agent_name: String,
}

/// One dependency handed to a downstream prompt, in edge order.
#[derive(Debug, Clone)]
struct DepOutput {
    node_id: String,
    agent_name: String,
    text: String,
}

/// Terminal outcome of one agent task, keyed by the original node id.
#[derive(Debug)]
enum TaskOutcome {
    Completed {
        node_id: String,
        text: String,
        agent_name: String,
        tokens: TokenUsage,
        cost: f64,
    },
    Failed {
        node_id: String,
    },
}

/// Runs execution plans against a store, a provider router and an event bus.
pub struct WorkflowExecutor {
    store: Arc<dyn ExecutionStore>,
    router: Arc<dyn ProviderRouter>,
    events: Arc<EventBus>,
    recall: Option<Arc<dyn RecallHook>>,
    retry_base_delay: Duration,
}

impl WorkflowExecutor {
    pub fn new(
        store: Arc<dyn ExecutionStore>,
        router: Arc<dyn ProviderRouter>,
        events: Arc<EventBus>,
    ) -> Self {
        Self {
            store,
            router,
            events,
            recall: None,
            retry_base_delay: Duration::from_secs(1),
        }
    }

    /// Attach a memory recall hook; recalled entries are prepended to prompts.
    pub fn with_recall(mut self, recall: Arc<dyn RecallHook>) -> Self {
        self.recall = Some(recall);
        self
    }

    /// Override the retry base delay (tests use zero).
    pub fn with_retry_base_delay(mut self, base_delay: Duration) -> Self {
        self.retry_base_delay = base_delay;
        self
    }

    /// Run a planned execution to completion.
    ///
    /// Side effects land in the store and on the event stream; per-node
    /// failures are absorbed. Storage failures propagate to the job layer.
    pub async fn run(
        &self,
        execution_id: Uuid,
        plan: &ExecutionPlan,
        graph: &GraphData,
        input: Option<&InputData>,
    ) -> Result<()> {
        let Some(record) = self.store.load_execution(execution_id).await? else {
            error!(execution_id = %execution_id, "execution not found, dropping job");
            return Ok(());
        };

        // Duplicate-delivery guard: only a pending execution may start.
        if record.status != ExecutionStatus::Pending {
            warn!(
                execution_id = %execution_id,
                status = %record.status,
                "execution is not pending, ignoring duplicate delivery"
            );
            return Ok(());
        }

        let started_at = Utc::now();
        self.store.mark_running(execution_id, started_at).await?;

        info!(
            execution_id = %execution_id,
            groups = plan.groups.len(),
            agents = plan.total_agents,
            "execution started"
        );

        let node_configs = graph.node_configs();
        let edges_out = graph.edges_out();

        let mut enforcer = BudgetEnforcer::new(
            record.budget_max_tokens.map(|t| t as u64),
            record.budget_max_cost,
        );

        let mut completed_outputs: HashMap<String, CompletedOutput> = HashMap::new();
        let mut skipped: HashSet<String> = HashSet::new();
        let mut order_counter: i64 = 0;

        let mut budget_exhausted = false;
        let mut total_prompt: u64 = 0;
        let mut total_completion: u64 = 0;
        let mut total_cost: f64 = 0.0;

        for group in &plan.groups {
            let mut tasks = Vec::new();

            for entry in &group.agents {
                let node_id = entry.node_id.as_str();
                let config = node_configs
                    .get(node_id)
                    .cloned()
                    .unwrap_or_else(|| entry.config.clone());

                if skipped.contains(node_id) {
                    self.record_skip(execution_id, node_id, &config, group.group, order_counter, SKIP_DEPENDENCY_FAILED)
                        .await?;
                    order_counter += 1;
                    continue;
                }

                if budget_exhausted {
                    self.record_skip(execution_id, node_id, &config, group.group, order_counter, SKIP_BUDGET_EXCEEDED)
                        .await?;
                    order_counter += 1;
                    continue;
                }

                // A condition-carrying edge whose source already completed
                // gates this node on the source's output text.
                let mut condition_blocked = false;
                for edge in &graph.edges {
                    if edge.target != node_id {
                        continue;
                    }
                    if let Some(condition) = edge.condition() {
                        if let Some(source) = completed_outputs.get(&edge.source) {
                            if !eval_condition(condition, &source.text) {
                                condition_blocked = true;
                            }
                        }
                    }
                }

                if condition_blocked {
                    self.record_skip(execution_id, node_id, &config, group.group, order_counter, SKIP_CONDITION_NOT_MET)
                        .await?;
                    skipped.insert(node_id.to_string());
                    order_counter += 1;
                    continue;
                }

                let mut dep_outputs: Vec<DepOutput> = Vec::new();
                for edge in &graph.edges {
                    if edge.target == node_id {
                        if let Some(output) = completed_outputs.get(&edge.source) {
                            dep_outputs.push(DepOutput {
                                node_id: edge.source.clone(),
                                agent_name: output.agent_name.clone(),
                                text: output.text.clone(),
                            });
                        }
                    }
                }

                // First-hop agents see the user input; later hops see
                // dependency outputs instead.
                let task_input = if dep_outputs.is_empty() {
                    input.cloned()
                } else {
                    None
                };

                let execution_order = order_counter;
                order_counter += 1;

                tasks.push(self.run_agent(
                    execution_id,
                    entry.node_id.clone(),
                    config,
                    dep_outputs,
                    task_input,
                    group.group,
                    execution_order,
                    &node_configs,
                ));
            }

            if tasks.is_empty() {
                continue;
            }

            // Strict group barrier: no task of group k+1 starts before every
            // task of group k reached a terminal per-agent state.
            let results = futures::future::join_all(tasks).await;

            for result in results {
                let outcome = match result {
                    Ok(outcome) => outcome,
                    Err(err) => {
                        error!(execution_id = %execution_id, error = %err, "agent task error");
                        continue;
                    }
                };

                match outcome {
                    TaskOutcome::Completed {
                        node_id,
                        text,
                        agent_name,
                        tokens,
                        cost,
                    } => {
                        total_prompt += tokens.prompt as u64;
                        total_completion += tokens.completion as u64;
                        total_cost += cost;

                        self.store
                            .add_execution_totals(
                                execution_id,
                                tokens.prompt as i64,
                                tokens.completion as i64,
                                cost,
                            )
                            .await?;

                        completed_outputs.insert(node_id, CompletedOutput { text, agent_name });

                        enforcer.record(tokens.total(), cost);
                        if !budget_exhausted {
                            match enforcer.check() {
                                BudgetStatus::Warning => {
                                    self.events.publish(
                                        execution_id,
                                        ExecutionEvent::budget_warning(
                                            self.consumed(&enforcer),
                                            self.caps(&enforcer),
                                            enforcer.utilization_percent(),
                                        ),
                                    );
                                }
                                BudgetStatus::Exceeded => {
                                    budget_exhausted = true;
                                    let agents_not_run = remaining_agents(plan, group.group, &skipped, &completed_outputs);
                                    warn!(
                                        execution_id = %execution_id,
                                        not_run = agents_not_run.len(),
                                        "budget exceeded, refusing to start further agents"
                                    );
                                    self.events.publish(
                                        execution_id,
                                        ExecutionEvent::budget_exceeded(
                                            self.consumed(&enforcer),
                                            self.caps(&enforcer),
                                            agents_not_run,
                                        ),
                                    );
                                }
                                BudgetStatus::Ok => {}
                            }
                        }
                    }
                    TaskOutcome::Failed { node_id } => {
                        propagate_failure(&node_id, &edges_out, &mut skipped);
                    }
                }
            }
        }

        // Finalize: any completed agent means the execution completed, even
        // when other nodes failed or were skipped. Only a fully failed run
        // is a failed execution.
        let runs = self.store.list_agent_runs(execution_id).await?;
        let agents_completed = runs.iter().filter(|r| r.status == AgentRunStatus::Completed).count();
        let agents_failed = runs.iter().filter(|r| r.status == AgentRunStatus::Failed).count();
        let agents_skipped = runs.iter().filter(|r| r.status == AgentRunStatus::Skipped).count();

        let (status, error_message) = if agents_completed == 0 && agents_failed > 0 {
            (ExecutionStatus::Failed, Some("All agents failed".to_string()))
        } else {
            (ExecutionStatus::Completed, None)
        };

        let completed_at = Utc::now();
        self.store
            .finalize_execution(execution_id, status, error_message, completed_at)
            .await?;

        let duration_ms = (completed_at - started_at).num_milliseconds().max(0) as u64;
        info!(
            execution_id = %execution_id,
            status = %status,
            agents_completed,
            agents_failed,
            agents_skipped,
            duration_ms,
            "execution finished"
        );

        self.events.publish(
            execution_id,
            ExecutionEvent::execution_completed(
                status.as_str(),
                ExecutionTotals {
                    tokens_prompt: total_prompt,
                    tokens_completion: total_completion,
                    cost: total_cost,
                    duration_ms,
                    agents_completed,
                    agents_failed,
                    agents_skipped,
                },
            ),
        );
        self.events.close(execution_id);

        Ok(())
    }

    fn consumed(&self, enforcer: &BudgetEnforcer) -> BudgetConsumed {
        BudgetConsumed {
            tokens: enforcer.used_tokens(),
            cost: enforcer.used_cost(),
        }
    }

    fn caps(&self, enforcer: &BudgetEnforcer) -> BudgetCapsPayload {
        BudgetCapsPayload {
            max_tokens: enforcer.max_tokens(),
            max_cost: enforcer.max_cost(),
        }
    }

    /// Persist a skipped run and announce it.
    async fn record_skip(
        &self,
        execution_id: Uuid,
        node_id: &str,
        config: &NodeConfig,
        parallel_group: usize,
        execution_order: i64,
        reason: &str,
    ) -> Result<()> {
        let agent_name = config.display_name(node_id);

        self.store
            .insert_agent_run(NewAgentRun {
                execution_id,
                agent_node_id: node_id.to_string(),
                agent_name: agent_name.clone(),
                status: AgentRunStatus::Skipped,
                provider: config.provider,
                model: config.model.clone(),
                parallel_group: parallel_group as i64,
                execution_order,
                is_fallback: false,
                fallback_for: None,
                input_data: None,
                error_message: Some(reason.to_string()),
                started_at: None,
            })
            .await?;

        debug!(execution_id = %execution_id, agent = %node_id, reason, "agent skipped");
        self.events
            .publish(execution_id, ExecutionEvent::agent_skipped(node_id, agent_name, reason));
        Ok(())
    }

    /// Run one agent with retry and fallback recovery.
    #[allow(clippy::too_many_arguments)]
    async fn run_agent(
        &self,
        execution_id: Uuid,
        node_id: String,
        config: NodeConfig,
        dep_outputs: Vec<DepOutput>,
        input: Option<InputData>,
        parallel_group: usize,
        execution_order: i64,
        node_configs: &HashMap<String, NodeConfig>,
    ) -> Result<TaskOutcome> {
        let agent_name = config.display_name(&node_id);
        let recalled = self.recall_for(execution_id, &node_id, &dep_outputs, input.as_ref()).await;
        let prompt = build_agent_prompt(&dep_outputs, input.as_ref(), &recalled);

        let run_id = self
            .store
            .insert_agent_run(NewAgentRun {
                execution_id,
                agent_node_id: node_id.clone(),
                agent_name: agent_name.clone(),
                status: AgentRunStatus::Running,
                provider: config.provider,
                model: config.model.clone(),
                parallel_group: parallel_group as i64,
                execution_order,
                is_fallback: false,
                fallback_for: None,
                input_data: Some(input_payload(&prompt, &config.system_prompt, &dep_outputs)),
                error_message: None,
                started_at: Some(Utc::now()),
            })
            .await?;

        self.events.publish(
            execution_id,
            ExecutionEvent::agent_started(&node_id, &agent_name, parallel_group),
        );

        let retry_config = RetryConfig::new(config.max_retries, self.retry_base_delay);
        let max_attempts = config.max_retries + 1;

        let result = with_retry(
            &retry_config,
            &node_id,
            || self.attempt_completion(&config, &prompt),
            |attempt, error, will_retry| {
                self.events.publish(
                    execution_id,
                    ExecutionEvent::agent_failed(
                        &node_id,
                        &agent_name,
                        error,
                        will_retry,
                        max_attempts - attempt,
                    ),
                );
                if will_retry {
                    self.events.publish(
                        execution_id,
                        ExecutionEvent::agent_retrying(&node_id, &agent_name, attempt),
                    );
                }
            },
        )
        .await;

        if let Some(response) = result.value {
            self.store
                .update_agent_run(AgentRunUpdate {
                    id: run_id,
                    status: AgentRunStatus::Completed,
                    output_data: Some(json!({ "text": response.text })),
                    tokens_prompt: response.tokens.prompt as i64,
                    tokens_completion: response.tokens.completion as i64,
                    cost: response.cost,
                    latency_ms: Some(response.latency_ms as i64),
                    retries: result.attempts as i64 - 1,
                    error_message: None,
                    completed_at: Utc::now(),
                })
                .await?;

            self.events.publish(
                execution_id,
                ExecutionEvent::agent_completed(
                    &node_id,
                    &agent_name,
                    EventTokens {
                        prompt: response.tokens.prompt,
                        completion: response.tokens.completion,
                    },
                    response.cost,
                    response.latency_ms,
                ),
            );

            return Ok(TaskOutcome::Completed {
                node_id,
                text: response.text,
                agent_name,
                tokens: response.tokens,
                cost: response.cost,
            });
        }

        let last_error = result.error.unwrap_or_else(|| "unknown error".to_string());
        error!(
            execution_id = %execution_id,
            agent = %node_id,
            attempts = result.attempts,
            error = %last_error,
            "agent failed, retries exhausted"
        );

        self.store
            .update_agent_run(AgentRunUpdate {
                id: run_id,
                status: AgentRunStatus::Failed,
                output_data: None,
                tokens_prompt: 0,
                tokens_completion: 0,
                cost: 0.0,
                latency_ms: None,
                retries: result.attempts as i64 - 1,
                error_message: Some(last_error.clone()),
                completed_at: Utc::now(),
            })
            .await?;

        if config.has_fallback() {
            let fallback_id = config.fallback_agent_id.clone().expect("checked by has_fallback");
            let fallback_config = node_configs.get(&fallback_id).cloned().unwrap_or_default();

            return self
                .run_fallback(
                    execution_id,
                    node_id,
                    fallback_id,
                    fallback_config,
                    dep_outputs,
                    input,
                    recalled,
                    parallel_group,
                    execution_order,
                    last_error,
                )
                .await;
        }

        Ok(TaskOutcome::Failed { node_id })
    }

    /// Single-attempt fallback on behalf of a failed original. The outcome
    /// governs the original node for downstream purposes.
    #[allow(clippy::too_many_arguments)]
    async fn run_fallback(
        &self,
        execution_id: Uuid,
        original_node_id: String,
        fallback_id: String,
        config: NodeConfig,
        dep_outputs: Vec<DepOutput>,
        input: Option<InputData>,
        recalled: Vec<RecalledMemory>,
        parallel_group: usize,
        execution_order: i64,
        reason: String,
    ) -> Result<TaskOutcome> {
        let fallback_name = config.display_name(&fallback_id);

        info!(
            execution_id = %execution_id,
            original = %original_node_id,
            fallback = %fallback_id,
            "launching fallback agent"
        );
        self.events.publish(
            execution_id,
            ExecutionEvent::agent_fallback(&original_node_id, &fallback_id, &fallback_name, reason),
        );

        let prompt = build_agent_prompt(&dep_outputs, input.as_ref(), &recalled);

        let run_id = self
            .store
            .insert_agent_run(NewAgentRun {
                execution_id,
                agent_node_id: fallback_id.clone(),
                agent_name: fallback_name.clone(),
                status: AgentRunStatus::Running,
                provider: config.provider,
                model: config.model.clone(),
                parallel_group: parallel_group as i64,
                execution_order,
                is_fallback: true,
                fallback_for: Some(original_node_id.clone()),
                input_data: Some(input_payload(&prompt, &config.system_prompt, &dep_outputs)),
                error_message: None,
                started_at: Some(Utc::now()),
            })
            .await?;

        match self.attempt_completion(&config, &prompt).await {
            Ok(response) => {
                self.store
                    .update_agent_run(AgentRunUpdate {
                        id: run_id,
                        status: AgentRunStatus::Completed,
                        output_data: Some(json!({ "text": response.text })),
                        tokens_prompt: response.tokens.prompt as i64,
                        tokens_completion: response.tokens.completion as i64,
                        cost: response.cost,
                        latency_ms: Some(response.latency_ms as i64),
                        retries: 0,
                        error_message: None,
                        completed_at: Utc::now(),
                    })
                    .await?;

                self.events.publish(
                    execution_id,
                    ExecutionEvent::agent_completed(
                        &fallback_id,
                        &fallback_name,
                        EventTokens {
                            prompt: response.tokens.prompt,
                            completion: response.tokens.completion,
                        },
                        response.cost,
                        response.latency_ms,
                    ),
                );

                // Downstream consumers see the fallback's text under the
                // original node id.
                Ok(TaskOutcome::Completed {
                    node_id: original_node_id,
                    text: response.text,
                    agent_name: fallback_name,
                    tokens: response.tokens,
                    cost: response.cost,
                })
            }
            Err(err) => {
                let message = err.to_string();
                error!(
                    execution_id = %execution_id,
                    original = %original_node_id,
                    fallback = %fallback_id,
                    error = %message,
                    "fallback agent also failed"
                );

                self.store
                    .update_agent_run(AgentRunUpdate {
                        id: run_id,
                        status: AgentRunStatus::Failed,
                        output_data: None,
                        tokens_prompt: 0,
                        tokens_completion: 0,
                        cost: 0.0,
                        latency_ms: None,
                        retries: 0,
                        error_message: Some(message.clone()),
                        completed_at: Utc::now(),
                    })
                    .await?;

                self.events.publish(
                    execution_id,
                    ExecutionEvent::agent_failed(&fallback_id, &fallback_name, message, false, 0),
                );

                Ok(TaskOutcome::Failed {
                    node_id: original_node_id,
                })
            }
        }
    }

    /// One LLM attempt, bounded by the node's timeout.
    async fn attempt_completion(
        &self,
        config: &NodeConfig,
        prompt: &str,
    ) -> std::result::Result<crate::adapter::LlmResponse, String> {
        let adapter = self.router.resolve(config.provider).map_err(|e| e.to_string())?;
        let call = adapter.complete(prompt, &config.system_prompt, config);

        if config.timeout_seconds > 0 {
            match tokio::time::timeout(Duration::from_secs(config.timeout_seconds), call).await {
                Ok(result) => result.map_err(|e| e.to_string()),
                Err(_) => Err(format!(
                    "attempt timed out after {}s",
                    config.timeout_seconds
                )),
            }
        } else {
            call.await.map_err(|e| e.to_string())
        }
    }

    /// Query the recall hook, swallowing failures: memory is enrichment, not
    /// a dependency.
    async fn recall_for(
        &self,
        execution_id: Uuid,
        node_id: &str,
        dep_outputs: &[DepOutput],
        input: Option<&InputData>,
    ) -> Vec<RecalledMemory> {
        let Some(recall) = &self.recall else {
            return Vec::new();
        };

        let query = input
            .and_then(|i| i.user_query())
            .map(|q| q.to_string())
            .unwrap_or_else(|| {
                dep_outputs
                    .iter()
                    .map(|d| d.text.as_str())
                    .collect::<Vec<_>>()
                    .join("\n")
            });

        if query.is_empty() {
            return Vec::new();
        }

        match recall.recall(execution_id, node_id, &query).await {
            Ok(entries) => entries,
            Err(err) => {
                warn!(agent = %node_id, error = %err, "memory recall failed");
                Vec::new()
            }
        }
    }
}

/// Reverse-DFS from a failed node over out-edges; the skipped set only grows.
fn propagate_failure(
    failed_node: &str,
    edges_out: &HashMap<String, Vec<(String, Option<String>)>>,
    skipped: &mut HashSet<String>,
) {
    let mut stack = vec![failed_node.to_string()];
    while let Some(current) = stack.pop() {
        if let Some(targets) = edges_out.get(&current) {
            for (target, _) in targets {
                if skipped.insert(target.clone()) {
                    stack.push(target.clone());
                }
            }
        }
    }
}

/// Planned agents that will no longer run once the budget trips: everything
/// in groups after the current one that has neither completed nor already
/// been skipped.
fn remaining_agents(
    plan: &ExecutionPlan,
    current_group: usize,
    skipped: &HashSet<String>,
    completed: &HashMap<String, CompletedOutput>,
) -> Vec<String> {
    plan.groups
        .iter()
        .filter(|g| g.group > current_group)
        .flat_map(|g| g.agents.iter())
        .map(|a| a.node_id.clone())
        .filter(|id| !skipped.contains(id) && !completed.contains_key(id))
        .collect()
}

/// Concatenate the user prompt from workflow input, recalled memories and
/// dependency outputs, separated by blank lines.
fn build_agent_prompt(
    dep_outputs: &[DepOutput],
    input: Option<&InputData>,
    recalled: &[RecalledMemory],
) -> String {
    let mut parts: Vec<String> = Vec::new();

    if let Some(query) = input.and_then(|i| i.user_query()) {
        parts.push(format!("User input:\n{}", query));
    }

    if !recalled.is_empty() {
        parts.push("Recalled from memory:".to_string());
        for entry in recalled {
            parts.push(format!("\n[{}]:\n{}", entry.key, entry.text));
        }
    }

    if !dep_outputs.is_empty() {
        parts.push("Context from previous agents:".to_string());
        for dep in dep_outputs {
            parts.push(format!("\n[{}]:\n{}", dep.agent_name, dep.text));
        }
    }

    if parts.is_empty() {
        parts.push("No input provided.".to_string());
    }

    parts.join("\n\n")
}

fn input_payload(prompt: &str, system_prompt: &str, dep_outputs: &[DepOutput]) -> serde_json::Value {
    let deps: serde_json::Map<String, serde_json::Value> = dep_outputs
        .iter()
        .map(|d| {
            (
                d.node_id.clone(),
                json!({ "text": d.text, "agent_name": d.agent_name }),
            )
        })
        .collect();

    json!({
        "prompt": prompt,
        "system_prompt": system_prompt,
        "dependency_outputs": deps,
    })
}
