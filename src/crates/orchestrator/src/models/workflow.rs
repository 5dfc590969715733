//! Workflow model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use engine::graph::GraphData;

/// A stored workflow definition. The graph is persisted as submitted; every
/// execution snapshots it at admission time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workflow {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub graph_data: GraphData,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Workflow {
    /// Create a new workflow with a fresh id.
    pub fn new(name: impl Into<String>, description: Option<String>, graph_data: GraphData) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            description,
            graph_data,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_workflow_has_fresh_id_and_timestamps() {
        let a = Workflow::new("one", None, GraphData::default());
        let b = Workflow::new("two", Some("desc".to_string()), GraphData::default());

        assert_ne!(a.id, b.id);
        assert_eq!(a.created_at, a.updated_at);
        assert_eq!(b.description.as_deref(), Some("desc"));
    }
}
