//! Shared adapter registry.
//!
//! One adapter instance per provider per process, created lazily on first
//! use and reused. Adapters are safe for concurrent use; the registry is the
//! process-wide [`ProviderRouter`] handed to the executor.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use engine::adapter::{CompletionModel, ProviderRouter};
use engine::graph::Provider;
use engine::pricing::PricingTable;

use crate::config::LlmSettings;
use crate::remote::{AnthropicAdapter, OpenAiAdapter};

/// Lazily-built, process-wide set of provider adapters.
pub struct AdapterRegistry {
    settings: LlmSettings,
    pricing: Arc<PricingTable>,
    adapters: Mutex<HashMap<Provider, Arc<dyn CompletionModel>>>,
}

impl AdapterRegistry {
    pub fn new(settings: LlmSettings, pricing: Arc<PricingTable>) -> Self {
        Self {
            settings,
            pricing,
            adapters: Mutex::new(HashMap::new()),
        }
    }

    fn build(&self, provider: Provider) -> engine::Result<Arc<dyn CompletionModel>> {
        debug!(provider = %provider, "creating adapter");
        let adapter: Arc<dyn CompletionModel> = match provider {
            Provider::OpenAi => {
                Arc::new(OpenAiAdapter::new(&self.settings, self.pricing.clone())?)
            }
            Provider::Anthropic => {
                Arc::new(AnthropicAdapter::new(&self.settings, self.pricing.clone())?)
            }
        };
        Ok(adapter)
    }
}

impl ProviderRouter for AdapterRegistry {
    fn resolve(&self, provider: Provider) -> engine::Result<Arc<dyn CompletionModel>> {
        let mut adapters = self.adapters.lock();
        if let Some(adapter) = adapters.get(&provider) {
            return Ok(adapter.clone());
        }

        let adapter = self.build(provider)?;
        adapters.insert(provider, adapter.clone());
        Ok(adapter)
    }
}
