//! Full-stack test: admission service -> job queue -> worker -> executor ->
//! SQLite rows, with a mock provider standing in for the LLM APIs.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use engine::adapter::{CompletionModel, LlmResponse, ProviderRouter, TokenUsage};
use engine::events::EventBus;
use engine::executor::{InputData, WorkflowExecutor};
use engine::graph::{GraphData, GraphEdge, GraphNode, NodeConfig, NodeType, Provider};
use engine::store::{AgentRunStatus, ExecutionStatus};

use orchestrator::services::execution_service::ExecuteRequest;
use orchestrator::services::workflow_service::CreateWorkflowRequest;
use orchestrator::{
    Database, ExecutionService, JobQueue, SqliteExecutionStore, Worker, WorkflowService,
};

/// Echoes the agent's configured name; fails agents listed in `failing`.
#[derive(Debug)]
struct EchoModel {
    failing: Vec<String>,
}

#[async_trait]
impl CompletionModel for EchoModel {
    async fn complete(
        &self,
        _prompt: &str,
        _system_prompt: &str,
        config: &NodeConfig,
    ) -> engine::Result<LlmResponse> {
        if self.failing.contains(&config.name) {
            return Err(engine::EngineError::Llm(format!(
                "{} is down",
                config.name
            )));
        }
        Ok(LlmResponse {
            text: config.name.clone(),
            tokens: TokenUsage {
                prompt: 10,
                completion: 5,
            },
            model: config.model.clone(),
            latency_ms: 3,
            cost: 0.00025,
        })
    }
}

struct EchoRouter(Arc<EchoModel>);

impl ProviderRouter for EchoRouter {
    fn resolve(&self, _provider: Provider) -> engine::Result<Arc<dyn CompletionModel>> {
        Ok(self.0.clone())
    }
}

fn node(id: &str) -> GraphNode {
    GraphNode {
        id: id.to_string(),
        node_type: NodeType::Agent,
        data: NodeConfig {
            name: id.to_string(),
            model: "gpt-4o".to_string(),
            // keep failing-agent tests fast
            max_retries: 0,
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

struct Stack {
    workflows: WorkflowService,
    executions: ExecutionService,
}

async fn stack(failing: Vec<String>) -> Stack {
    let db = Arc::new(Database::test_in_memory().await.unwrap());
    let pricing = Arc::new(engine::pricing::PricingTable::default_table());
    let events = Arc::new(EventBus::new());
    let (queue, job_rx) = JobQueue::new();

    let store = Arc::new(SqliteExecutionStore::new(db.clone()));
    let router = Arc::new(EchoRouter(Arc::new(EchoModel { failing })));
    let executor = Arc::new(
        WorkflowExecutor::new(store, router, events.clone())
            .with_retry_base_delay(Duration::ZERO),
    );
    Worker::new(job_rx, executor).spawn();

    Stack {
        workflows: WorkflowService::new(db.clone()),
        executions: ExecutionService::new(db, pricing, queue),
    }
}

/// Poll until the execution reaches a terminal status.
async fn wait_terminal(
    executions: &ExecutionService,
    execution_id: Uuid,
) -> orchestrator::services::execution_service::ExecutionDetail {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let detail = executions.get_execution(execution_id).await.unwrap();
            if detail.status.is_terminal() {
                return detail;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("execution did not finish in time")
}

#[tokio::test]
async fn diamond_workflow_runs_to_completion() {
    let stack = stack(vec![]).await;

    let workflow = stack
        .workflows
        .create(CreateWorkflowRequest {
            name: "diamond".to_string(),
            description: None,
            graph_data: GraphData {
                nodes: vec![node("a"), node("b"), node("c"), node("d")],
                edges: vec![edge("a", "b"), edge("a", "c"), edge("b", "d"), edge("c", "d")],
            },
        })
        .await
        .unwrap();

    let response = stack
        .executions
        .execute(
            workflow.id,
            ExecuteRequest {
                input_data: Some(InputData {
                    user_query: Some("go".to_string()),
                    extra: HashMap::new(),
                }),
                budget: None,
            },
        )
        .await
        .unwrap();

    let detail = wait_terminal(&stack.executions, response.execution_id).await;
    assert_eq!(detail.status, ExecutionStatus::Completed);
    assert_eq!(detail.agents.len(), 4);
    assert!(detail
        .agents
        .iter()
        .all(|a| a.status == AgentRunStatus::Completed));

    // 4 agents at 10 prompt + 5 completion tokens each
    assert_eq!(detail.totals.tokens_prompt, 40);
    assert_eq!(detail.totals.tokens_completion, 20);
    assert_eq!(detail.totals.tokens_total, 60);
    assert!(detail.totals.cost > 0.0);
    assert!(detail.totals.duration_ms.is_some());

    // d ran after b and c, group-major ordering persisted
    let d = detail
        .agents
        .iter()
        .find(|a| a.agent_node_id == "d")
        .unwrap();
    assert_eq!(d.parallel_group, 2);
    assert_eq!(d.execution_order, 3);

    // d's stored input carries both dependency outputs
    let input = d.input_data.as_ref().unwrap();
    let deps = input["dependency_outputs"].as_object().unwrap();
    assert!(deps.contains_key("b"));
    assert!(deps.contains_key("c"));

    // Sum of per-agent usage equals the execution totals
    let prompt_sum: i64 = detail.agents.iter().map(|a| a.tokens_prompt).sum();
    assert_eq!(prompt_sum, detail.totals.tokens_prompt);
    let cost_sum: f64 = detail.agents.iter().map(|a| a.cost).sum();
    assert!((cost_sum - detail.totals.cost).abs() < 1e-6);
}

#[tokio::test]
async fn failing_root_fails_execution_and_skips_downstream() {
    let stack = stack(vec!["a".to_string()]).await;

    let workflow = stack
        .workflows
        .create(CreateWorkflowRequest {
            name: "doomed".to_string(),
            description: None,
            graph_data: GraphData {
                nodes: vec![node("a"), node("b")],
                edges: vec![edge("a", "b")],
            },
        })
        .await
        .unwrap();

    let response = stack
        .executions
        .execute(workflow.id, ExecuteRequest::default())
        .await
        .unwrap();

    let detail = wait_terminal(&stack.executions, response.execution_id).await;
    assert_eq!(detail.status, ExecutionStatus::Failed);
    assert_eq!(detail.error_message.as_deref(), Some("All agents failed"));

    let a = detail
        .agents
        .iter()
        .find(|r| r.agent_node_id == "a")
        .unwrap();
    assert_eq!(a.status, AgentRunStatus::Failed);
    assert!(a.error_message.as_deref().unwrap().contains("a is down"));

    let b = detail
        .agents
        .iter()
        .find(|r| r.agent_node_id == "b")
        .unwrap();
    assert_eq!(b.status, AgentRunStatus::Skipped);
    assert_eq!(b.error_message.as_deref(), Some("dependency failed"));

    // The workflow is no longer active, a new execution is admissible.
    assert!(stack
        .executions
        .execute(workflow.id, ExecuteRequest::default())
        .await
        .is_ok());
}

#[tokio::test]
async fn terminal_execution_synthesizes_completion_event() {
    let stack = stack(vec![]).await;

    let workflow = stack
        .workflows
        .create(CreateWorkflowRequest {
            name: "single".to_string(),
            description: None,
            graph_data: GraphData {
                nodes: vec![node("a")],
                edges: vec![],
            },
        })
        .await
        .unwrap();

    let response = stack
        .executions
        .execute(workflow.id, ExecuteRequest::default())
        .await
        .unwrap();
    wait_terminal(&stack.executions, response.execution_id).await;

    // What the WebSocket bridge sends to late subscribers.
    let event = stack
        .executions
        .synthesize_completion(response.execution_id)
        .await
        .unwrap();

    match event {
        engine::events::ExecutionEvent::ExecutionCompleted { status, totals, .. } => {
            assert_eq!(status, "completed");
            assert_eq!(totals.agents_completed, 1);
            assert_eq!(totals.tokens_prompt, 10);
            assert_eq!(totals.tokens_completion, 5);
        }
        other => panic!("expected execution_completed, got {:?}", other),
    }
}

#[tokio::test]
async fn per_workflow_executions_are_serialized_by_conflict_rule() {
    let stack = stack(vec![]).await;

    let workflow = stack
        .workflows
        .create(CreateWorkflowRequest {
            name: "serial".to_string(),
            description: None,
            graph_data: GraphData {
                nodes: vec![node("a")],
                edges: vec![],
            },
        })
        .await
        .unwrap();

    let first = stack
        .executions
        .execute(workflow.id, ExecuteRequest::default())
        .await
        .unwrap();

    // Immediately re-executing may conflict while the first is in flight;
    // if the worker already drained it, the second admission is legal.
    match stack
        .executions
        .execute(workflow.id, ExecuteRequest::default())
        .await
    {
        Ok(second) => {
            wait_terminal(&stack.executions, second.execution_id).await;
        }
        Err(err) => assert!(matches!(err, orchestrator::OrchestratorError::Conflict)),
    }

    wait_terminal(&stack.executions, first.execution_id).await;

    // After completion the workflow accepts a new execution.
    stack
        .executions
        .execute(workflow.id, ExecuteRequest::default())
        .await
        .unwrap();
}
