//! Memory recall hook
//!
//! Optional prompt-enrichment seam: when the executor is built with a hook,
//! entries recalled for the current node are prepended to the prompt as a
//! `Recalled from memory:` block. Semantic search itself lives outside the
//! engine, scoped to the execution id.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;

/// One recalled memory entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecalledMemory {
    pub key: String,
    pub text: String,
    pub similarity: f64,
}

/// Execution-scoped semantic recall.
#[async_trait]
pub trait RecallHook: Send + Sync {
    async fn recall(
        &self,
        execution_id: Uuid,
        node_id: &str,
        query: &str,
    ) -> Result<Vec<RecalledMemory>>;
}
