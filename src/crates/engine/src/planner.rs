//! Workflow planner: graph to ordered parallel groups
//!
//! Turns a submitted graph into an `ExecutionPlan` — a sequence of parallel
//! groups where group k runs only after group k-1 is fully complete. Plans
//! are deterministic for identical graphs and serialize losslessly so they
//! survive the job-queue payload round trip.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::graph::{DagIndex, GraphData, NodeConfig};

/// One planned agent within a parallel group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentPlanEntry {
    pub node_id: String,
    pub config: NodeConfig,
}

/// A set of agents scheduled to run concurrently.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParallelGroup {
    pub group: usize,
    pub agents: Vec<AgentPlanEntry>,
}

/// Ordered schedule of parallel groups plus summary figures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionPlan {
    pub groups: Vec<ParallelGroup>,
    pub total_agents: usize,
    pub max_parallelism: usize,
    pub estimated_rounds: usize,
}

impl ExecutionPlan {
    /// Iterate over all planned node ids in schedule order.
    pub fn node_ids(&self) -> impl Iterator<Item = &str> {
        self.groups
            .iter()
            .flat_map(|g| g.agents.iter().map(|a| a.node_id.as_str()))
    }
}

/// Kahn's algorithm over the DAG; fails with the set of nodes still holding
/// positive in-degree when a cycle prevents full elimination.
fn detect_cycles(dag: &DagIndex) -> Result<()> {
    let mut in_degree: HashMap<&str, usize> = dag
        .nodes
        .iter()
        .map(|(id, node)| (id.as_str(), node.deps.len()))
        .collect();

    let mut queue: Vec<&str> = in_degree
        .iter()
        .filter(|(_, deg)| **deg == 0)
        .map(|(id, _)| *id)
        .collect();
    let mut visited = 0usize;

    while let Some(id) = queue.pop() {
        visited += 1;
        for dependent in &dag.nodes[id].dependents {
            let deg = in_degree
                .get_mut(dependent.as_str())
                .expect("dependent indexed");
            *deg -= 1;
            if *deg == 0 {
                queue.push(dependent.as_str());
            }
        }
    }

    if visited != dag.len() {
        let mut cycle_nodes: Vec<String> = in_degree
            .into_iter()
            .filter(|(_, deg)| *deg > 0)
            .map(|(id, _)| id.to_string())
            .collect();
        cycle_nodes.sort();
        return Err(EngineError::CircularDependency { cycle_nodes });
    }

    Ok(())
}

/// Kahn's algorithm with a deterministic tie-break: whenever several nodes
/// simultaneously have in-degree zero, the lexicographically smallest id is
/// emitted first. Identical graphs therefore always produce identical plans.
fn topological_sort(dag: &DagIndex) -> Vec<String> {
    let mut in_degree: HashMap<&str, usize> = dag
        .nodes
        .iter()
        .map(|(id, node)| (id.as_str(), node.deps.len()))
        .collect();

    let mut ready: BTreeSet<&str> = in_degree
        .iter()
        .filter(|(_, deg)| **deg == 0)
        .map(|(id, _)| *id)
        .collect();

    let mut result = Vec::with_capacity(dag.len());

    while let Some(id) = ready.pop_first() {
        result.push(id.to_string());
        for dependent in &dag.nodes[id].dependents {
            let deg = in_degree
                .get_mut(dependent.as_str())
                .expect("dependent indexed");
            *deg -= 1;
            if *deg == 0 {
                ready.insert(dependent.as_str());
            }
        }
    }

    result
}

/// Longest-path layering: each node lands in the earliest group after all of
/// its dependencies. A group boundary is also a synchronization barrier, since
/// every dependency is a data dependency.
fn extract_parallel_groups(dag: &DagIndex, sorted_nodes: &[String]) -> Vec<ParallelGroup> {
    let mut group_of: HashMap<&str, usize> = HashMap::with_capacity(sorted_nodes.len());

    for id in sorted_nodes {
        let node = &dag.nodes[id.as_str()];
        let group = if node.deps.is_empty() {
            0
        } else {
            1 + node
                .deps
                .iter()
                .map(|d| group_of[d.as_str()])
                .max()
                .expect("deps non-empty")
        };
        group_of.insert(id.as_str(), group);
    }

    let group_count = group_of.values().copied().max().map_or(0, |g| g + 1);
    let mut groups: Vec<ParallelGroup> = (0..group_count)
        .map(|g| ParallelGroup {
            group: g,
            agents: Vec::new(),
        })
        .collect();

    for id in sorted_nodes {
        let g = group_of[id.as_str()];
        groups[g].agents.push(AgentPlanEntry {
            node_id: id.clone(),
            config: dag.nodes[id.as_str()].config.clone(),
        });
    }

    groups
}

/// Plan an execution for the given graph.
///
/// # Errors
/// * `EmptyWorkflow` when the graph has no nodes
/// * `CircularDependency` carrying the cycle witness
pub fn plan(graph: &GraphData) -> Result<ExecutionPlan> {
    if graph.nodes.is_empty() {
        return Err(EngineError::EmptyWorkflow);
    }

    let dag = DagIndex::from_graph(graph);
    detect_cycles(&dag)?;

    let sorted_nodes = topological_sort(&dag);
    let groups = extract_parallel_groups(&dag, &sorted_nodes);

    let max_parallelism = groups.iter().map(|g| g.agents.len()).max().unwrap_or(0);
    let total_agents = groups.iter().map(|g| g.agents.len()).sum();
    let estimated_rounds = groups.len();

    Ok(ExecutionPlan {
        groups,
        total_agents,
        max_parallelism,
        estimated_rounds,
    })
}
