//! Workflow CRUD and graph validation
//!
//! The planner silently ignores dangling edges; admission does not. A graph
//! only enters the store if every edge references a declared node.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use engine::graph::GraphData;
use engine::store::ExecutionStatus;

use crate::db::Database;
use crate::error::{OrchestratorError, Result};
use crate::models::Workflow;
use crate::repositories::{ExecutionRepository, WorkflowRepository};

/// Request payload for creating a workflow.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateWorkflowRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub graph_data: GraphData,
}

/// Request payload for updating a workflow; absent fields keep their value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateWorkflowRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub graph_data: Option<GraphData>,
}

/// Most recent execution shown on workflow listings.
#[derive(Debug, Clone, Serialize)]
pub struct LastExecution {
    pub id: Uuid,
    pub status: ExecutionStatus,
    pub total_cost: f64,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Listing row with graph size and last-run summary.
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowSummary {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub node_count: usize,
    pub edge_count: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_execution: Option<LastExecution>,
}

/// Workflow CRUD operations.
#[derive(Clone, Debug)]
pub struct WorkflowService {
    workflows: WorkflowRepository,
    executions: ExecutionRepository,
}

/// Reject graphs whose edges reference undeclared nodes or whose node ids
/// collide.
pub fn validate_graph(graph: &GraphData) -> Result<()> {
    let mut node_ids: HashSet<&str> = HashSet::with_capacity(graph.nodes.len());
    for node in &graph.nodes {
        if !node_ids.insert(node.id.as_str()) {
            return Err(OrchestratorError::Validation(format!(
                "duplicate node id: {}",
                node.id
            )));
        }
    }

    for edge in &graph.edges {
        if !node_ids.contains(edge.source.as_str()) {
            return Err(OrchestratorError::Validation(format!(
                "edge references unknown source node: {}",
                edge.source
            )));
        }
        if !node_ids.contains(edge.target.as_str()) {
            return Err(OrchestratorError::Validation(format!(
                "edge references unknown target node: {}",
                edge.target
            )));
        }
    }

    Ok(())
}

impl WorkflowService {
    pub fn new(db: Arc<Database>) -> Self {
        Self {
            workflows: WorkflowRepository::new(db.clone()),
            executions: ExecutionRepository::new(db),
        }
    }

    pub async fn create(&self, request: CreateWorkflowRequest) -> Result<Workflow> {
        if request.name.trim().is_empty() {
            return Err(OrchestratorError::Validation(
                "workflow name must not be empty".to_string(),
            ));
        }
        validate_graph(&request.graph_data)?;

        let workflow = Workflow::new(request.name, request.description, request.graph_data);
        self.workflows.save(&workflow).await?;
        Ok(workflow)
    }

    pub async fn get(&self, id: Uuid) -> Result<Workflow> {
        self.workflows
            .find_by_id(id)
            .await?
            .ok_or_else(|| OrchestratorError::NotFound(format!("workflow {}", id)))
    }

    pub async fn update(&self, id: Uuid, request: UpdateWorkflowRequest) -> Result<Workflow> {
        let mut workflow = self.get(id).await?;

        if let Some(name) = request.name {
            if name.trim().is_empty() {
                return Err(OrchestratorError::Validation(
                    "workflow name must not be empty".to_string(),
                ));
            }
            workflow.name = name;
        }
        if let Some(description) = request.description {
            workflow.description = Some(description);
        }
        if let Some(graph_data) = request.graph_data {
            validate_graph(&graph_data)?;
            workflow.graph_data = graph_data;
        }

        self.workflows.update(&workflow).await?;
        self.get(id).await
    }

    pub async fn delete(&self, id: Uuid) -> Result<()> {
        if !self.workflows.delete(id).await? {
            return Err(OrchestratorError::NotFound(format!("workflow {}", id)));
        }
        Ok(())
    }

    pub async fn list(&self, skip: i64, limit: i64) -> Result<(Vec<WorkflowSummary>, i64)> {
        let total = self.workflows.count().await?;
        let workflows = self.workflows.list(skip, limit).await?;

        let mut summaries = Vec::with_capacity(workflows.len());
        for workflow in workflows {
            let last_execution = self
                .executions
                .latest_for_workflow(workflow.id)
                .await?
                .map(|e| LastExecution {
                    id: e.id,
                    status: e.status,
                    total_cost: e.total_cost,
                    completed_at: e.completed_at,
                });

            summaries.push(WorkflowSummary {
                id: workflow.id,
                name: workflow.name,
                description: workflow.description,
                node_count: workflow.graph_data.nodes.len(),
                edge_count: workflow.graph_data.edges.len(),
                created_at: workflow.created_at,
                updated_at: workflow.updated_at,
                last_execution,
            });
        }

        Ok((summaries, total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine::graph::{GraphEdge, GraphNode, NodeConfig, NodeType};

    fn node(id: &str) -> GraphNode {
        GraphNode {
            id: id.to_string(),
            node_type: NodeType::Agent,
            data: NodeConfig::default(),
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

    async fn service() -> WorkflowService {
        let db = Arc::new(Database::test_in_memory().await.unwrap());
        WorkflowService::new(db)
    }

    #[test]
    fn test_validate_graph_rejects_dangling_edges() {
        let graph = GraphData {
            nodes: vec![node("a")],
            edges: vec![edge("a", "ghost")],
        };
        let err = validate_graph(&graph).unwrap_err();
        assert!(err.to_string().contains("unknown target"));

        let graph = GraphData {
            nodes: vec![node("a")],
            edges: vec![edge("ghost", "a")],
        };
        assert!(validate_graph(&graph).is_err());
    }

    #[test]
    fn test_validate_graph_rejects_duplicate_node_ids() {
        let graph = GraphData {
            nodes: vec![node("a"), node("a")],
            edges: vec![],
        };
        let err = validate_graph(&graph).unwrap_err();
        assert!(err.to_string().contains("duplicate node id"));
    }

    #[tokio::test]
    async fn test_create_requires_name() {
        let service = service().await;
        let result = service
            .create(CreateWorkflowRequest {
                name: "  ".to_string(),
                description: None,
                graph_data: GraphData::default(),
            })
            .await;
        assert!(matches!(result, Err(OrchestratorError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_get_update_delete() {
        let service = service().await;
        let workflow = service
            .create(CreateWorkflowRequest {
                name: "review pipeline".to_string(),
                description: None,
                graph_data: GraphData {
                    nodes: vec![node("a"), node("b")],
                    edges: vec![edge("a", "b")],
                },
            })
            .await
            .unwrap();

        let loaded = service.get(workflow.id).await.unwrap();
        assert_eq!(loaded.name, "review pipeline");

        let updated = service
            .update(
                workflow.id,
                UpdateWorkflowRequest {
                    name: Some("renamed".to_string()),
                    ..UpdateWorkflowRequest::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "renamed");
        assert_eq!(updated.graph_data.nodes.len(), 2);

        service.delete(workflow.id).await.unwrap();
        assert!(matches!(
            service.get(workflow.id).await,
            Err(OrchestratorError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_list_includes_counts() {
        let service = service().await;
        service
            .create(CreateWorkflowRequest {
                name: "wf".to_string(),
                description: Some("two nodes".to_string()),
                graph_data: GraphData {
                    nodes: vec![node("a"), node("b")],
                    edges: vec![edge("a", "b")],
                },
            })
            .await
            .unwrap();

        let (summaries, total) = service.list(0, 20).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(summaries[0].node_count, 2);
        assert_eq!(summaries[0].edge_count, 1);
        assert!(summaries[0].last_execution.is_none());
    }
}
