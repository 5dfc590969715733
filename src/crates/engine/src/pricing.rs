//! Static per-model pricing table
//!
//! Loaded once at process start from JSON shaped as
//! `{ "<provider>": { "<model>": { "input_per_1k": f, "output_per_1k": f } } }`.
//! Unknown (provider, model) pairs cost zero. The table is read-only after
//! load and shared across the process.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::graph::Provider;

/// Per-1k-token prices for one model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelPricing {
    pub input_per_1k: f64,
    pub output_per_1k: f64,
}

/// Pricing for all known (provider, model) pairs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PricingTable {
    providers: HashMap<String, HashMap<String, ModelPricing>>,
}

/// Round a dollar amount to 6 decimals, the precision persisted on records.
pub fn round_cost(value: f64) -> f64 {
    (value * 1_000_000.0).round() / 1_000_000.0
}

impl PricingTable {
    /// Parse a pricing table from its JSON representation.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a pricing table from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            crate::error::EngineError::Storage(format!(
                "failed to read pricing table {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Self::from_json(&contents)
    }

    /// Built-in prices for the models the budget suggester knows about.
    pub fn default_table() -> Self {
        let mut providers: HashMap<String, HashMap<String, ModelPricing>> = HashMap::new();

        let openai = providers.entry("openai".to_string()).or_default();
        openai.insert(
            "gpt-4o".to_string(),
            ModelPricing {
                input_per_1k: 0.005,
                output_per_1k: 0.015,
            },
        );
        openai.insert(
            "gpt-4o-mini".to_string(),
            ModelPricing {
                input_per_1k: 0.00015,
                output_per_1k: 0.0006,
            },
        );
        openai.insert(
            "gpt-3.5-turbo".to_string(),
            ModelPricing {
                input_per_1k: 0.0005,
                output_per_1k: 0.0015,
            },
        );

        let anthropic = providers.entry("anthropic".to_string()).or_default();
        anthropic.insert(
            "claude-3.5-sonnet".to_string(),
            ModelPricing {
                input_per_1k: 0.003,
                output_per_1k: 0.015,
            },
        );
        anthropic.insert(
            "claude-3-haiku".to_string(),
            ModelPricing {
                input_per_1k: 0.00025,
                output_per_1k: 0.00125,
            },
        );

        Self { providers }
    }

    /// Prices for a (provider, model) pair; zero when unknown.
    pub fn get(&self, provider: Provider, model: &str) -> ModelPricing {
        self.providers
            .get(provider.as_str())
            .and_then(|models| models.get(model))
            .copied()
            .unwrap_or_default()
    }

    /// Dollar cost of one call, rounded to 6 decimals.
    pub fn cost(
        &self,
        provider: Provider,
        model: &str,
        prompt_tokens: u32,
        completion_tokens: u32,
    ) -> f64 {
        let pricing = self.get(provider, model);
        let input_cost = (prompt_tokens as f64 / 1000.0) * pricing.input_per_1k;
        let output_cost = (completion_tokens as f64 / 1000.0) * pricing.output_per_1k;
        round_cost(input_cost + output_cost)
    }
}
