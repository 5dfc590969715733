//! Anthropic adapter.
//!
//! Calls the messages endpoint with the system prompt as a top-level field,
//! reporting input/output token usage and computing cost from the pricing
//! table.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use engine::adapter::{CompletionModel, LlmResponse, TokenUsage};
use engine::graph::{NodeConfig, Provider};
use engine::pricing::PricingTable;

use crate::config::LlmSettings;
use crate::error::LlmError;

const PROVIDER: &str = "anthropic";
const DEFAULT_MODEL: &str = "claude-3.5-sonnet";
const API_VERSION: &str = "2023-06-01";

/// Anthropic API client.
#[derive(Clone)]
#[derive(Debug)]
pub struct AnthropicAdapter {
    client: Client,
    api_key: String,
    base_url: String,
    pricing: Arc<PricingTable>,
}

#[derive(Debug, Serialize)]
struct MessageRequest {
    model: String,
    max_tokens: u32,
    temperature: f64,
    system: String,
    messages: Vec<UserMessage>,
}

#[derive(Debug, Serialize)]
struct UserMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct MessageResponse {
    content: Vec<ContentBlock>,
    usage: Usage,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct Usage {
    input_tokens: u32,
    output_tokens: u32,
}

impl AnthropicAdapter {
    /// Create a new adapter from shared settings.
    ///
    /// # Errors
    /// `MissingApiKey` when no Anthropic key is configured.
    pub fn new(settings: &LlmSettings, pricing: Arc<PricingTable>) -> Result<Self, LlmError> {
        let api_key = settings
            .anthropic_api_key
            .clone()
            .ok_or_else(|| LlmError::MissingApiKey(PROVIDER.to_string()))?;

        let client = Client::builder()
            .timeout(settings.timeout)
            .build()
            .expect("Failed to create HTTP client");

        Ok(Self {
            client,
            api_key,
            base_url: settings.anthropic_base_url.clone(),
            pricing,
        })
    }

    fn model_for(config: &NodeConfig) -> &str {
        if config.model.is_empty() {
            DEFAULT_MODEL
        } else {
            &config.model
        }
    }

    fn build_request(prompt: &str, system_prompt: &str, config: &NodeConfig) -> MessageRequest {
        MessageRequest {
            model: Self::model_for(config).to_string(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            system: system_prompt.to_string(),
            messages: vec![UserMessage {
                role: "user",
                content: prompt.to_string(),
            }],
        }
    }
}

#[async_trait]
impl CompletionModel for AnthropicAdapter {
    async fn complete(
        &self,
        prompt: &str,
        system_prompt: &str,
        config: &NodeConfig,
    ) -> engine::Result<LlmResponse> {
        let request = Self::build_request(prompt, system_prompt, config);
        let model = request.model.clone();
        let url = format!("{}/v1/messages", self.base_url);

        let start = Instant::now();
        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(LlmError::Http)?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                provider: PROVIDER.to_string(),
                status: status.as_u16(),
                message,
            }
            .into());
        }

        let body: MessageResponse = response.json().await.map_err(LlmError::Http)?;
        let latency_ms = start.elapsed().as_millis() as u64;

        let text = body
            .content
            .first()
            .map(|block| block.text.clone())
            .ok_or_else(|| LlmError::Parse {
                provider: PROVIDER.to_string(),
                message: "response contained no content blocks".to_string(),
            })?;

        let cost = self.pricing.cost(
            Provider::Anthropic,
            &model,
            body.usage.input_tokens,
            body.usage.output_tokens,
        );

        tracing::debug!(
            model = %model,
            prompt_tokens = body.usage.input_tokens,
            completion_tokens = body.usage.output_tokens,
            latency_ms,
            "anthropic completion finished"
        );

        Ok(LlmResponse {
            text,
            tokens: TokenUsage {
                prompt: body.usage.input_tokens,
                completion: body.usage.output_tokens,
            },
            model,
            latency_ms,
            cost,
        })
    }
}
