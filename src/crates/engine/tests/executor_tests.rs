//! End-to-end executor tests against the in-memory store and a scripted
//! mock adapter. Each scenario drives a small graph through `plan` + `run`
//! and asserts on stored rows, execution totals and the event stream.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use uuid::Uuid;

use engine::adapter::{CompletionModel, LlmResponse, ProviderRouter, TokenUsage};
use engine::events::ExecutionEvent;
use engine::executor::{InputData, WorkflowExecutor};
use engine::graph::{EdgeData, GraphData, GraphEdge, GraphNode, NodeConfig, NodeType, Provider};
use engine::planner;
use engine::store::memory::MemoryStore;
use engine::store::{AgentRunStatus, ExecutionStatus, ExecutionStore};
use engine::{EngineError, EventBus};

/// Scripted adapter: per agent name, a queue of canned outcomes. Agents
/// without a script echo their configured name. Every received prompt is
/// recorded for assertions.
#[derive(Default, Debug)]
struct ScriptedModel {
    script: Mutex<HashMap<String, VecDeque<Result<LlmResponse, String>>>>,
    prompts: Mutex<Vec<(String, String)>>,
}

impl ScriptedModel {
    fn respond(text: &str, prompt_tokens: u32, completion_tokens: u32) -> LlmResponse {
        LlmResponse {
            text: text.to_string(),
            tokens: TokenUsage {
                prompt: prompt_tokens,
                completion: completion_tokens,
            },
            model: "gpt-4o".to_string(),
            latency_ms: 5,
            cost: 0.00025,
        }
    }

    fn push(&self, agent: &str, outcome: Result<LlmResponse, String>) {
        self.script
            .lock()
            .entry(agent.to_string())
            .or_default()
            .push_back(outcome);
    }

    fn fail_times(&self, agent: &str, times: usize) {
        for _ in 0..times {
            self.push(agent, Err(format!("{} unavailable", agent)));
        }
    }

    fn prompts_for(&self, agent: &str) -> Vec<String> {
        self.prompts
            .lock()
            .iter()
            .filter(|(name, _)| name == agent)
            .map(|(_, prompt)| prompt.clone())
            .collect()
    }
}

#[async_trait]
impl CompletionModel for ScriptedModel {
    async fn complete(
        &self,
        prompt: &str,
        _system_prompt: &str,
        config: &NodeConfig,
    ) -> engine::Result<LlmResponse> {
        self.prompts
            .lock()
            .push((config.name.clone(), prompt.to_string()));

        let next = self.script.lock().get_mut(&config.name).and_then(|q| q.pop_front());
        match next {
            Some(Ok(response)) => Ok(response),
            Some(Err(message)) => Err(EngineError::Llm(message)),
            None => Ok(Self::respond(&config.name, 10, 5)),
        }
    }
}

struct MockRouter(Arc<ScriptedModel>);

impl ProviderRouter for MockRouter {
    fn resolve(&self, _provider: Provider) -> engine::Result<Arc<dyn CompletionModel>> {
        Ok(self.0.clone())
    }
}

fn agent_node(id: &str) -> GraphNode {
    GraphNode {
        id: id.to_string(),
        node_type: NodeType::Agent,
        data: NodeConfig {
            name: id.to_string(),
            model: "gpt-4o".to_string(),
            ..NodeConfig::default()
        },
    }
}

fn edge(source: &str, target: &str) -> GraphEdge {
    GraphEdge {
        id: format!("{}-{}", source, target),
        source: source.to_string(),
        target: target.to_string(),
        data: None,
    }
}

fn conditional_edge(source: &str, target: &str, condition: &str) -> GraphEdge {
    GraphEdge {
        id: format!("{}-{}", source, target),
        source: source.to_string(),
        target: target.to_string(),
        data: Some(EdgeData {
            condition: Some(condition.to_string()),
            extra: HashMap::new(),
        }),
    }
}

fn graph(nodes: &[&str], edges: Vec<GraphEdge>) -> GraphData {
    GraphData {
        nodes: nodes.iter().map(|id| agent_node(id)).collect(),
        edges,
    }
}

struct Harness {
    store: Arc<MemoryStore>,
    model: Arc<ScriptedModel>,
    events: Arc<EventBus>,
    executor: WorkflowExecutor,
}

fn harness() -> Harness {
    let store = Arc::new(MemoryStore::new());
    let model = Arc::new(ScriptedModel::default());
    let events = Arc::new(EventBus::new());
    let executor = WorkflowExecutor::new(
        store.clone(),
        Arc::new(MockRouter(model.clone())),
        events.clone(),
    )
    .with_retry_base_delay(Duration::ZERO);

    Harness {
        store,
        model,
        events,
        executor,
    }
}

/// Drain everything buffered on an execution channel.
fn drain(rx: &mut tokio::sync::broadcast::Receiver<ExecutionEvent>) -> Vec<ExecutionEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

fn event_types(events: &[ExecutionEvent]) -> Vec<&'static str> {
    events
        .iter()
        .map(|e| match e {
            ExecutionEvent::AgentStarted { .. } => "agent_started",
            ExecutionEvent::AgentCompleted { .. } => "agent_completed",
            ExecutionEvent::AgentFailed { .. } => "agent_failed",
            ExecutionEvent::AgentRetrying { .. } => "agent_retrying",
            ExecutionEvent::AgentFallback { .. } => "agent_fallback",
            ExecutionEvent::AgentSkipped { .. } => "agent_skipped",
            ExecutionEvent::BudgetWarning { .. } => "budget_warning",
            ExecutionEvent::BudgetExceeded { .. } => "budget_exceeded",
            ExecutionEvent::ExecutionCompleted { .. } => "execution_completed",
        })
        .collect()
}

#[tokio::test]
async fn single_agent_success_updates_totals_and_events() {
    let h = harness();
    let g = graph(&["a"], vec![]);
    let plan = planner::plan(&g).unwrap();

    let execution_id = h.store.seed_pending(Uuid::new_v4(), None, None);
    h.model.push("a", Ok(ScriptedModel::respond("hello", 10, 5)));

    let mut rx = h.events.subscribe(execution_id);
    h.executor.run(execution_id, &plan, &g, None).await.unwrap();

    let record = h.store.load_execution(execution_id).await.unwrap().unwrap();
    assert_eq!(record.status, ExecutionStatus::Completed);
    assert_eq!(record.total_tokens_prompt, 10);
    assert_eq!(record.total_tokens_completion, 5);
    assert!(record.total_cost > 0.0);
    assert!(record.started_at.is_some());
    assert!(record.completed_at.is_some());

    let runs = h.store.list_agent_runs(execution_id).await.unwrap();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].status, AgentRunStatus::Completed);
    assert_eq!(runs[0].output_data.as_ref().unwrap()["text"], "hello");

    let events = drain(&mut rx);
    assert_eq!(
        event_types(&events),
        vec!["agent_started", "agent_completed", "execution_completed"]
    );
    if let ExecutionEvent::ExecutionCompleted { status, totals, .. } = events.last().unwrap() {
        assert_eq!(status, "completed");
        assert_eq!(totals.agents_completed, 1);
        assert_eq!(totals.agents_failed, 0);
        assert_eq!(totals.agents_skipped, 0);
        assert_eq!(totals.tokens_prompt, 10);
        assert_eq!(totals.tokens_completion, 5);
    } else {
        panic!("last event must be execution_completed");
    }
}

#[tokio::test]
async fn linear_chain_propagates_dependency_text() {
    let h = harness();
    let g = graph(&["a", "b", "c"], vec![edge("a", "b"), edge("b", "c")]);
    let plan = planner::plan(&g).unwrap();
    assert_eq!(plan.groups.len(), 3);

    let execution_id = h.store.seed_pending(Uuid::new_v4(), None, None);
    h.executor.run(execution_id, &plan, &g, None).await.unwrap();

    // Agents echo their own id, so each downstream prompt carries it.
    let b_prompts = h.model.prompts_for("b");
    assert_eq!(b_prompts.len(), 1);
    assert!(b_prompts[0].contains("Context from previous agents:"));
    assert!(b_prompts[0].contains("[a]:\na"));

    let c_prompts = h.model.prompts_for("c");
    assert!(c_prompts[0].contains("[b]:\nb"));

    let record = h.store.load_execution(execution_id).await.unwrap().unwrap();
    assert_eq!(record.status, ExecutionStatus::Completed);
    assert_eq!(record.total_tokens_prompt, 30);
    assert_eq!(record.total_tokens_completion, 15);

    // Sum of per-agent tokens equals execution totals.
    let runs = h.store.list_agent_runs(execution_id).await.unwrap();
    let prompt_sum: i64 = runs.iter().map(|r| r.tokens_prompt).sum();
    let completion_sum: i64 = runs.iter().map(|r| r.tokens_completion).sum();
    assert_eq!(prompt_sum, record.total_tokens_prompt);
    assert_eq!(completion_sum, record.total_tokens_completion);
    let cost_sum: f64 = runs.iter().map(|r| r.cost).sum();
    assert!((cost_sum - record.total_cost).abs() < 1e-6);
}

#[tokio::test]
async fn first_hop_sees_user_input_later_hops_do_not() {
    let h = harness();
    let g = graph(&["a", "b"], vec![edge("a", "b")]);
    let plan = planner::plan(&g).unwrap();

    let execution_id = h.store.seed_pending(Uuid::new_v4(), None, None);
    let input = InputData {
        user_query: Some("find the bug".to_string()),
        extra: HashMap::new(),
    };
    h.executor
        .run(execution_id, &plan, &g, Some(&input))
        .await
        .unwrap();

    let a_prompts = h.model.prompts_for("a");
    assert_eq!(a_prompts[0], "User input:\nfind the bug");

    let b_prompts = h.model.prompts_for("b");
    assert!(!b_prompts[0].contains("User input:"));
    assert!(b_prompts[0].contains("[a]:\na"));
}

#[tokio::test]
async fn retry_then_success_records_retry_count() {
    let h = harness();
    let g = graph(&["a"], vec![]);
    let plan = planner::plan(&g).unwrap();

    let execution_id = h.store.seed_pending(Uuid::new_v4(), None, None);
    h.model.fail_times("a", 2);
    h.model.push("a", Ok(ScriptedModel::respond("finally", 10, 5)));

    let mut rx = h.events.subscribe(execution_id);
    h.executor.run(execution_id, &plan, &g, None).await.unwrap();

    let runs = h.store.list_agent_runs(execution_id).await.unwrap();
    assert_eq!(runs[0].status, AgentRunStatus::Completed);
    assert_eq!(runs[0].retries, 2);

    let record = h.store.load_execution(execution_id).await.unwrap().unwrap();
    assert_eq!(record.status, ExecutionStatus::Completed);

    let events = drain(&mut rx);
    let types = event_types(&events);
    assert_eq!(types.iter().filter(|t| **t == "agent_failed").count(), 2);
    assert_eq!(types.iter().filter(|t| **t == "agent_retrying").count(), 2);
    assert_eq!(types.iter().filter(|t| **t == "agent_completed").count(), 1);

    // Every agent_failed on the way announced a retry.
    for event in &events {
        if let ExecutionEvent::AgentFailed { will_retry, .. } = event {
            assert!(*will_retry);
        }
    }
}

#[tokio::test]
async fn failure_skips_transitive_downstream() {
    let h = harness();
    let g = graph(
        &["a", "b", "c", "d"],
        vec![edge("a", "b"), edge("a", "c"), edge("b", "d")],
    );
    let plan = planner::plan(&g).unwrap();

    let execution_id = h.store.seed_pending(Uuid::new_v4(), None, None);
    // default max_retries 2 -> 3 attempts
    h.model.fail_times("a", 3);

    let mut rx = h.events.subscribe(execution_id);
    h.executor.run(execution_id, &plan, &g, None).await.unwrap();

    let runs = h.store.list_agent_runs(execution_id).await.unwrap();
    let by_id: HashMap<&str, &engine::AgentRunRecord> =
        runs.iter().map(|r| (r.agent_node_id.as_str(), r)).collect();

    assert_eq!(by_id["a"].status, AgentRunStatus::Failed);
    assert_eq!(by_id["a"].retries, 2);
    for id in ["b", "c", "d"] {
        assert_eq!(by_id[id].status, AgentRunStatus::Skipped);
        assert_eq!(by_id[id].error_message.as_deref(), Some("dependency failed"));
    }

    // Nothing completed, so the execution failed.
    let record = h.store.load_execution(execution_id).await.unwrap().unwrap();
    assert_eq!(record.status, ExecutionStatus::Failed);
    assert_eq!(record.error_message.as_deref(), Some("All agents failed"));

    let events = drain(&mut rx);
    let types = event_types(&events);
    assert_eq!(types.iter().filter(|t| **t == "agent_skipped").count(), 3);
    if let ExecutionEvent::ExecutionCompleted { status, totals, .. } = events.last().unwrap() {
        assert_eq!(status, "failed");
        assert_eq!(totals.agents_failed, 1);
        assert_eq!(totals.agents_skipped, 3);
    } else {
        panic!("missing execution_completed");
    }
}

#[tokio::test]
async fn partial_failure_still_completes_execution() {
    let h = harness();
    // Two independent roots: one fails, one succeeds.
    let g = graph(&["bad", "good"], vec![]);
    let plan = planner::plan(&g).unwrap();

    let execution_id = h.store.seed_pending(Uuid::new_v4(), None, None);
    h.model.fail_times("bad", 3);

    h.executor.run(execution_id, &plan, &g, None).await.unwrap();

    let record = h.store.load_execution(execution_id).await.unwrap().unwrap();
    assert_eq!(record.status, ExecutionStatus::Completed);
    assert!(record.error_message.is_none());
}

#[tokio::test]
async fn fallback_recovers_and_feeds_downstream() {
    let h = harness();

    // The plan covers a -> b; the graph snapshot additionally carries the
    // fallback template node a_fb, consulted only on failure.
    let mut planned = graph(&["a", "b"], vec![edge("a", "b")]);
    planned.nodes[0].data.fallback_agent_id = Some("a_fb".to_string());
    let plan = planner::plan(&planned).unwrap();

    let mut snapshot = planned.clone();
    snapshot.nodes.push(agent_node("a_fb"));

    let execution_id = h.store.seed_pending(Uuid::new_v4(), None, None);
    h.model.fail_times("a", 3);
    h.model
        .push("a_fb", Ok(ScriptedModel::respond("recovered", 7, 3)));

    let mut rx = h.events.subscribe(execution_id);
    h.executor
        .run(execution_id, &plan, &snapshot, None)
        .await
        .unwrap();

    let runs = h.store.list_agent_runs(execution_id).await.unwrap();
    assert_eq!(runs.len(), 3);

    let original = runs.iter().find(|r| r.agent_node_id == "a").unwrap();
    let fallback = runs.iter().find(|r| r.agent_node_id == "a_fb").unwrap();

    assert_eq!(original.status, AgentRunStatus::Failed);
    assert!(!original.is_fallback);

    assert_eq!(fallback.status, AgentRunStatus::Completed);
    assert!(fallback.is_fallback);
    assert_eq!(fallback.fallback_for.as_deref(), Some("a"));
    assert_eq!(fallback.execution_order, original.execution_order);
    assert_eq!(fallback.parallel_group, original.parallel_group);

    // Downstream of a receives the fallback's text under the key a.
    let b_prompts = h.model.prompts_for("b");
    assert!(b_prompts[0].contains("[a_fb]:\nrecovered"));

    let b_run = runs.iter().find(|r| r.agent_node_id == "b").unwrap();
    assert_eq!(b_run.status, AgentRunStatus::Completed);

    let record = h.store.load_execution(execution_id).await.unwrap().unwrap();
    assert_eq!(record.status, ExecutionStatus::Completed);
    // Fallback tokens count toward execution totals.
    assert_eq!(record.total_tokens_prompt, 7 + 10);
    assert_eq!(record.total_tokens_completion, 3 + 5);

    let events = drain(&mut rx);
    let types = event_types(&events);
    assert_eq!(types.iter().filter(|t| **t == "agent_fallback").count(), 1);
}

#[tokio::test]
async fn fallback_failure_fails_original_node() {
    let h = harness();
    let mut g = graph(&["a", "b"], vec![edge("a", "b")]);
    g.nodes[0].data.fallback_agent_id = Some("a_fb".to_string());
    let plan = planner::plan(&g).unwrap();

    let execution_id = h.store.seed_pending(Uuid::new_v4(), None, None);
    h.model.fail_times("a", 3);
    h.model.push("a_fb", Err("fallback down".to_string()));

    h.executor.run(execution_id, &plan, &g, None).await.unwrap();

    let runs = h.store.list_agent_runs(execution_id).await.unwrap();
    let fallback = runs.iter().find(|r| r.agent_node_id == "a_fb").unwrap();
    assert_eq!(fallback.status, AgentRunStatus::Failed);

    let b_run = runs.iter().find(|r| r.agent_node_id == "b").unwrap();
    assert_eq!(b_run.status, AgentRunStatus::Skipped);

    let record = h.store.load_execution(execution_id).await.unwrap().unwrap();
    assert_eq!(record.status, ExecutionStatus::Failed);
}

#[tokio::test]
async fn conditional_edge_blocks_target() {
    let h = harness();
    let g = GraphData {
        nodes: vec![agent_node("a"), agent_node("b")],
        edges: vec![conditional_edge("a", "b", "approve")],
    };
    let plan = planner::plan(&g).unwrap();

    let execution_id = h.store.seed_pending(Uuid::new_v4(), None, None);
    h.model.push("a", Ok(ScriptedModel::respond("reject", 10, 5)));

    h.executor.run(execution_id, &plan, &g, None).await.unwrap();

    let runs = h.store.list_agent_runs(execution_id).await.unwrap();
    let b_run = runs.iter().find(|r| r.agent_node_id == "b").unwrap();
    assert_eq!(b_run.status, AgentRunStatus::Skipped);
    assert_eq!(b_run.error_message.as_deref(), Some("condition not met"));

    let record = h.store.load_execution(execution_id).await.unwrap().unwrap();
    assert_eq!(record.status, ExecutionStatus::Completed);
}

#[tokio::test]
async fn conditional_edge_substring_match_runs_target() {
    let h = harness();
    let g = GraphData {
        nodes: vec![agent_node("a"), agent_node("b")],
        edges: vec![conditional_edge("a", "b", "approve")],
    };
    let plan = planner::plan(&g).unwrap();

    let execution_id = h.store.seed_pending(Uuid::new_v4(), None, None);
    h.model
        .push("a", Ok(ScriptedModel::respond("I approve this", 10, 5)));

    h.executor.run(execution_id, &plan, &g, None).await.unwrap();

    let runs = h.store.list_agent_runs(execution_id).await.unwrap();
    let b_run = runs.iter().find(|r| r.agent_node_id == "b").unwrap();
    assert_eq!(b_run.status, AgentRunStatus::Completed);
}

#[tokio::test]
async fn condition_block_propagates_to_downstream() {
    let h = harness();
    let g = GraphData {
        nodes: vec![agent_node("a"), agent_node("b"), agent_node("c")],
        edges: vec![conditional_edge("a", "b", "approve"), edge("b", "c")],
    };
    let plan = planner::plan(&g).unwrap();

    let execution_id = h.store.seed_pending(Uuid::new_v4(), None, None);
    h.model.push("a", Ok(ScriptedModel::respond("reject", 10, 5)));

    h.executor.run(execution_id, &plan, &g, None).await.unwrap();

    let runs = h.store.list_agent_runs(execution_id).await.unwrap();
    let b_run = runs.iter().find(|r| r.agent_node_id == "b").unwrap();
    assert_eq!(b_run.error_message.as_deref(), Some("condition not met"));
    let c_run = runs.iter().find(|r| r.agent_node_id == "c").unwrap();
    assert_eq!(c_run.error_message.as_deref(), Some("dependency failed"));
}

#[tokio::test]
async fn budget_exceeded_skips_remaining_groups() {
    let h = harness();
    let g = graph(&["a", "b", "c"], vec![edge("a", "b"), edge("b", "c")]);
    let plan = planner::plan(&g).unwrap();

    // a consumes 15 tokens, tripping the 12-token cap immediately.
    let execution_id = h.store.seed_pending(Uuid::new_v4(), Some(12), None);

    let mut rx = h.events.subscribe(execution_id);
    h.executor.run(execution_id, &plan, &g, None).await.unwrap();

    let runs = h.store.list_agent_runs(execution_id).await.unwrap();
    let by_id: HashMap<&str, &engine::AgentRunRecord> =
        runs.iter().map(|r| (r.agent_node_id.as_str(), r)).collect();

    assert_eq!(by_id["a"].status, AgentRunStatus::Completed);
    assert_eq!(by_id["b"].status, AgentRunStatus::Skipped);
    assert_eq!(by_id["b"].error_message.as_deref(), Some("budget exceeded"));
    assert_eq!(by_id["c"].status, AgentRunStatus::Skipped);

    // Only one LLM call was made.
    assert_eq!(h.model.prompts_for("b").len(), 0);
    assert_eq!(h.model.prompts_for("c").len(), 0);

    let events = drain(&mut rx);
    let exceeded: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            ExecutionEvent::BudgetExceeded { agents_not_run, .. } => Some(agents_not_run.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(exceeded.len(), 1);
    assert_eq!(exceeded[0], vec!["b".to_string(), "c".to_string()]);

    let record = h.store.load_execution(execution_id).await.unwrap().unwrap();
    assert_eq!(record.status, ExecutionStatus::Completed);
}

#[tokio::test]
async fn budget_warning_fires_once() {
    let h = harness();
    let g = graph(&["a", "b"], vec![edge("a", "b")]);
    let plan = planner::plan(&g).unwrap();

    // Each agent consumes 15 tokens. With a 35-token cap the second agent
    // lands at 30/35 = 86%: past the warning threshold, under the cap.
    let execution_id = h.store.seed_pending(Uuid::new_v4(), Some(35), None);

    let mut rx = h.events.subscribe(execution_id);
    h.executor.run(execution_id, &plan, &g, None).await.unwrap();

    let events = drain(&mut rx);
    let warnings = event_types(&events)
        .iter()
        .filter(|t| **t == "budget_warning")
        .count();
    assert_eq!(warnings, 1);

    let record = h.store.load_execution(execution_id).await.unwrap().unwrap();
    assert_eq!(record.status, ExecutionStatus::Completed);
}

#[tokio::test]
async fn timeout_counts_as_failed_attempt() {
    #[derive(Debug)]
    struct SlowModel;

    #[async_trait]
    impl CompletionModel for SlowModel {
        async fn complete(
            &self,
            _prompt: &str,
            _system_prompt: &str,
            _config: &NodeConfig,
        ) -> engine::Result<LlmResponse> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            unreachable!("sleep outlives every timeout in this test")
        }
    }

    struct SlowRouter;
    impl ProviderRouter for SlowRouter {
        fn resolve(&self, _provider: Provider) -> engine::Result<Arc<dyn CompletionModel>> {
            Ok(Arc::new(SlowModel))
        }
    }

    tokio::time::pause();

    let store = Arc::new(MemoryStore::new());
    let events = Arc::new(EventBus::new());
    let executor = WorkflowExecutor::new(store.clone(), Arc::new(SlowRouter), events)
        .with_retry_base_delay(Duration::ZERO);

    let mut g = graph(&["a"], vec![]);
    g.nodes[0].data.timeout_seconds = 1;
    g.nodes[0].data.max_retries = 0;
    let plan = planner::plan(&g).unwrap();

    let execution_id = store.seed_pending(Uuid::new_v4(), None, None);
    executor.run(execution_id, &plan, &g, None).await.unwrap();

    let runs = store.list_agent_runs(execution_id).await.unwrap();
    assert_eq!(runs[0].status, AgentRunStatus::Failed);
    assert!(runs[0]
        .error_message
        .as_deref()
        .unwrap()
        .contains("timed out"));
}

#[tokio::test]
async fn duplicate_delivery_is_ignored() {
    let h = harness();
    let g = graph(&["a"], vec![]);
    let plan = planner::plan(&g).unwrap();

    let execution_id = h.store.seed_pending(Uuid::new_v4(), None, None);
    h.executor.run(execution_id, &plan, &g, None).await.unwrap();
    h.executor.run(execution_id, &plan, &g, None).await.unwrap();

    // A redelivered job must not create duplicate rows or re-run agents.
    let runs = h.store.list_agent_runs(execution_id).await.unwrap();
    assert_eq!(runs.len(), 1);
    assert_eq!(h.model.prompts_for("a").len(), 1);
}

#[tokio::test]
async fn execution_order_is_group_major_and_strictly_increasing() {
    let h = harness();
    let g = graph(
        &["a", "b", "c", "d"],
        vec![edge("a", "b"), edge("a", "c"), edge("b", "d"), edge("c", "d")],
    );
    let plan = planner::plan(&g).unwrap();

    let execution_id = h.store.seed_pending(Uuid::new_v4(), None, None);
    h.executor.run(execution_id, &plan, &g, None).await.unwrap();

    let runs = h.store.list_agent_runs(execution_id).await.unwrap();
    let orders: Vec<i64> = runs.iter().map(|r| r.execution_order).collect();
    assert_eq!(orders, vec![0, 1, 2, 3]);

    let groups: Vec<i64> = runs.iter().map(|r| r.parallel_group).collect();
    assert_eq!(groups, vec![0, 1, 1, 2]);
}

#[tokio::test]
async fn agent_started_precedes_terminal_agent_event() {
    let h = harness();
    let g = graph(&["a", "b"], vec![edge("a", "b")]);
    let plan = planner::plan(&g).unwrap();

    let execution_id = h.store.seed_pending(Uuid::new_v4(), None, None);
    let mut rx = h.events.subscribe(execution_id);
    h.executor.run(execution_id, &plan, &g, None).await.unwrap();

    let events = drain(&mut rx);
    let mut started: HashMap<String, usize> = HashMap::new();
    for (index, event) in events.iter().enumerate() {
        match event {
            ExecutionEvent::AgentStarted { agent_id, .. } => {
                started.insert(agent_id.clone(), index);
            }
            ExecutionEvent::AgentCompleted { agent_id, .. }
            | ExecutionEvent::AgentFailed { agent_id, .. } => {
                assert!(started[agent_id] < index);
            }
            _ => {}
        }
    }

    // Exactly one terminal event, and it is last.
    let completed = event_types(&events)
        .iter()
        .filter(|t| **t == "execution_completed")
        .count();
    assert_eq!(completed, 1);
    assert!(events.last().unwrap().is_terminal());
}

#[tokio::test]
async fn recall_hook_enriches_prompt() {
    use engine::recall::{RecallHook, RecalledMemory};

    struct StubRecall;

    #[async_trait]
    impl RecallHook for StubRecall {
        async fn recall(
            &self,
            _execution_id: Uuid,
            _node_id: &str,
            _query: &str,
        ) -> engine::Result<Vec<RecalledMemory>> {
            Ok(vec![RecalledMemory {
                key: "prior-run".to_string(),
                text: "the answer was 42".to_string(),
                similarity: 0.92,
            }])
        }
    }

    let store = Arc::new(MemoryStore::new());
    let model = Arc::new(ScriptedModel::default());
    let events = Arc::new(EventBus::new());
    let executor = WorkflowExecutor::new(
        store.clone(),
        Arc::new(MockRouter(model.clone())),
        events,
    )
    .with_retry_base_delay(Duration::ZERO)
    .with_recall(Arc::new(StubRecall));

    let g = graph(&["a"], vec![]);
    let plan = planner::plan(&g).unwrap();
    let execution_id = store.seed_pending(Uuid::new_v4(), None, None);

    let input = InputData {
        user_query: Some("what was the answer?".to_string()),
        extra: HashMap::new(),
    };
    executor
        .run(execution_id, &plan, &g, Some(&input))
        .await
        .unwrap();

    let prompts = model.prompts_for("a");
    assert!(prompts[0].contains("Recalled from memory:"));
    assert!(prompts[0].contains("[prior-run]:\nthe answer was 42"));
    assert!(prompts[0].starts_with("User input:"));
}
