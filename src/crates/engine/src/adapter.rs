//! LLM adapter seam
//!
//! The engine orchestrates graphs; it does not speak provider protocols.
//! Provider crates implement [`CompletionModel`] and expose instances
//! through a [`ProviderRouter`]. Any error from an adapter counts as one
//! failed attempt under the retry handler.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::graph::{NodeConfig, Provider};

/// Token usage reported by one completion call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt: u32,
    pub completion: u32,
}

impl TokenUsage {
    pub fn total(&self) -> u64 {
        self.prompt as u64 + self.completion as u64
    }
}

/// Uniform completion response across providers. `cost` is computed by the
/// adapter from the pricing table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResponse {
    pub text: String,
    pub tokens: TokenUsage,
    pub model: String,
    pub latency_ms: u64,
    pub cost: f64,
}

/// One provider's completion capability.
#[async_trait]
pub trait CompletionModel: Send + Sync + std::fmt::Debug {
    /// Run a single completion. Model, temperature and max_tokens come from
    /// the node config.
    async fn complete(
        &self,
        prompt: &str,
        system_prompt: &str,
        config: &NodeConfig,
    ) -> Result<LlmResponse>;
}

/// Resolves the shared adapter instance for a provider. Implementations
/// create clients lazily on first use and reuse them; clients must be safe
/// for concurrent use.
pub trait ProviderRouter: Send + Sync {
    fn resolve(&self, provider: Provider) -> Result<Arc<dyn CompletionModel>>;
}
