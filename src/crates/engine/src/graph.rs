//! Workflow graph data model
//!
//! A workflow is submitted as a flat list of nodes and edges. Nodes carry the
//! agent configuration used for LLM calls; edges carry data dependencies and
//! optional match conditions evaluated against the source agent's output.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Sealed set of supported LLM providers.
///
/// Pricing and adapter lookup are keyed by `(Provider, model)`. Adding a
/// provider means extending this enum and wiring an adapter for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    OpenAi,
    Anthropic,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::OpenAi => "openai",
            Provider::Anthropic => "anthropic",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "openai" => Ok(Provider::OpenAi),
            "anthropic" => Ok(Provider::Anthropic),
            other => Err(EngineError::UnknownProvider(other.to_string())),
        }
    }
}

/// Node kind within a workflow graph.
///
/// Only `agent` nodes are executed by the core engine; `tool` and
/// `conditional` are accepted at admission for forward compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    Agent,
    Tool,
    Conditional,
}

fn default_temperature() -> f64 {
    0.7
}

fn default_max_tokens() -> u32 {
    1000
}

fn default_max_retries() -> u32 {
    2
}

fn default_timeout_seconds() -> u64 {
    60
}

/// Agent configuration carried on a graph node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub provider: Provider,

    #[serde(default)]
    pub model: String,

    #[serde(default)]
    pub system_prompt: String,

    #[serde(default = "default_temperature")]
    pub temperature: f64,

    /// Bound on completion length; doubles as the per-node completion-token
    /// budget estimate.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Bounds a single LLM attempt; expiry counts as a retryable failure.
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Node id of a fallback agent consulted only after retries exhaust.
    /// The id may reference a node absent from the graph; it is a config
    /// template, not a scheduled node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_agent_id: Option<String>,

    /// Unrecognized configuration fields, preserved on round-trip.
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            provider: Provider::default(),
            model: String::new(),
            system_prompt: String::new(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            max_retries: default_max_retries(),
            timeout_seconds: default_timeout_seconds(),
            fallback_agent_id: None,
            extra: HashMap::new(),
        }
    }
}

impl NodeConfig {
    /// Display name for events and records; falls back to the node id.
    pub fn display_name(&self, node_id: &str) -> String {
        if self.name.is_empty() {
            node_id.to_string()
        } else {
            self.name.clone()
        }
    }

    /// Whether a fallback agent is configured.
    pub fn has_fallback(&self) -> bool {
        self.fallback_agent_id
            .as_deref()
            .map(|id| !id.is_empty())
            .unwrap_or(false)
    }
}

/// One node of a submitted workflow graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,

    #[serde(rename = "type")]
    pub node_type: NodeType,

    #[serde(default)]
    pub data: NodeConfig,
}

/// Optional payload on an edge.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EdgeData {
    /// Match predicate on the source agent's output text. An empty string or
    /// `"default"` (case-insensitive) always matches; otherwise the condition
    /// matches on exact equality or substring containment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,

    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// One directed edge of a submitted workflow graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphEdge {
    #[serde(default)]
    pub id: String,

    pub source: String,
    pub target: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<EdgeData>,
}

impl GraphEdge {
    /// Condition carried on this edge, if any.
    pub fn condition(&self) -> Option<&str> {
        self.data
            .as_ref()
            .and_then(|d| d.condition.as_deref())
            .filter(|c| !c.is_empty())
    }
}

/// A submitted workflow graph: ordered node and edge sequences.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphData {
    #[serde(default)]
    pub nodes: Vec<GraphNode>,

    #[serde(default)]
    pub edges: Vec<GraphEdge>,
}

impl GraphData {
    /// Node configuration lookup by id.
    pub fn node_configs(&self) -> HashMap<String, NodeConfig> {
        self.nodes
            .iter()
            .map(|n| (n.id.clone(), n.data.clone()))
            .collect()
    }

    /// Outgoing adjacency: source id -> [(target id, condition)].
    pub fn edges_out(&self) -> HashMap<String, Vec<(String, Option<String>)>> {
        let mut out: HashMap<String, Vec<(String, Option<String>)>> = HashMap::new();
        for edge in &self.edges {
            out.entry(edge.source.clone()).or_default().push((
                edge.target.clone(),
                edge.condition().map(|c| c.to_string()),
            ));
        }
        out
    }

    /// Incoming adjacency: target id -> [source ids], in edge order.
    pub fn deps_of(&self) -> HashMap<String, Vec<String>> {
        let mut deps: HashMap<String, Vec<String>> = HashMap::new();
        for edge in &self.edges {
            deps.entry(edge.target.clone())
                .or_default()
                .push(edge.source.clone());
        }
        deps
    }

    /// Whether any edge carries a condition.
    pub fn has_conditions(&self) -> bool {
        self.edges.iter().any(|e| e.condition().is_some())
    }
}

/// Adjacency-list view of a graph used by the planner.
///
/// Edges referencing unknown nodes are silently dropped here; admission-level
/// validation rejects them before a graph ever reaches the planner.
#[derive(Debug, Clone)]
pub struct DagIndex {
    /// Insertion order of node ids, as submitted.
    pub order: Vec<String>,
    pub nodes: HashMap<String, DagNode>,
}

/// One node of the adjacency view.
#[derive(Debug, Clone)]
pub struct DagNode {
    pub config: NodeConfig,
    pub deps: Vec<String>,
    pub dependents: Vec<String>,
}

impl DagIndex {
    /// Build the adjacency view from raw graph data.
    pub fn from_graph(graph: &GraphData) -> Self {
        let mut order = Vec::with_capacity(graph.nodes.len());
        let mut nodes: HashMap<String, DagNode> = HashMap::with_capacity(graph.nodes.len());

        for node in &graph.nodes {
            order.push(node.id.clone());
            nodes.insert(
                node.id.clone(),
                DagNode {
                    config: node.data.clone(),
                    deps: Vec::new(),
                    dependents: Vec::new(),
                },
            );
        }

        for edge in &graph.edges {
            if nodes.contains_key(&edge.source) && nodes.contains_key(&edge.target) {
                nodes
                    .get_mut(&edge.target)
                    .expect("target present")
                    .deps
                    .push(edge.source.clone());
                nodes
                    .get_mut(&edge.source)
                    .expect("source present")
                    .dependents
                    .push(edge.target.clone());
            }
        }

        Self { order, nodes }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
