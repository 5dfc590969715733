//! OpenAI adapter.
//!
//! Calls the chat completions endpoint with a system + user message pair,
//! reporting token usage from the response and computing cost from the
//! pricing table.

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

const PROVIDER: &str = "openai";
const DEFAULT_MODEL: &str = "gpt-4o";

/// OpenAI API client.
#[derive(Clone)]
#[derive(Debug)]
pub struct OpenAiAdapter {
    client: Client,
    api_key: String,
    base_url: String,
    pricing: Arc<PricingTable>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f64,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

impl OpenAiAdapter {
    /// Create a new adapter from shared settings.
    ///
    /// # Errors
    /// `MissingApiKey` when no OpenAI key is configured.
    pub fn new(settings: &LlmSettings, pricing: Arc<PricingTable>) -> Result<Self, LlmError> {
        let api_key = settings
            .openai_api_key
            .clone()
            .ok_or_else(|| LlmError::MissingApiKey(PROVIDER.to_string()))?;

        let client = Client::builder()
            .timeout(settings.timeout)
            .build()
            .expect("Failed to create HTTP client");

        Ok(Self {
            client,
            api_key,
            base_url: settings.openai_base_url.clone(),
            pricing,
        })
    }

    /// Model to call: node config's model, or the provider default.
    fn model_for(config: &NodeConfig) -> &str {
        if config.model.is_empty() {
            DEFAULT_MODEL
        } else {
            &config.model
        }
    }

    fn build_request(prompt: &str, system_prompt: &str, config: &NodeConfig) -> ChatCompletionRequest {
        let mut messages = Vec::with_capacity(2);
        if !system_prompt.is_empty() {
            messages.push(ChatMessage {
                role: "system",
                content: system_prompt.to_string(),
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: prompt.to_string(),
        });

        ChatCompletionRequest {
            model: Self::model_for(config).to_string(),
            messages,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }
}

#[async_trait]
impl CompletionModel for OpenAiAdapter {
    async fn complete(
        &self,
        prompt: &str,
        system_prompt: &str,
        config: &NodeConfig,
    ) -> engine::Result<LlmResponse> {
        let request = Self::build_request(prompt, system_prompt, config);
        let model = request.model.clone();
        let url = format!("{}/chat/completions", self.base_url);

        let start = Instant::now();
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
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

        let body: ChatCompletionResponse = response.json().await.map_err(LlmError::Http)?;
        let latency_ms = start.elapsed().as_millis() as u64;

        let text = body
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .ok_or_else(|| LlmError::Parse {
                provider: PROVIDER.to_string(),
                message: "response contained no choices".to_string(),
            })?;

        let usage = body.usage.unwrap_or(ChatUsage {
            prompt_tokens: 0,
            completion_tokens: 0,
        });

        let cost = self.pricing.cost(
            Provider::OpenAi,
            &model,
            usage.prompt_tokens,
            usage.completion_tokens,
        );

        tracing::debug!(
            model = %model,
            prompt_tokens = usage.prompt_tokens,
            completion_tokens = usage.completion_tokens,
            latency_ms,
            "openai completion finished"
        );

        Ok(LlmResponse {
            text,
            tokens: TokenUsage {
                prompt: usage.prompt_tokens,
                completion: usage.completion_tokens,
            },
            model,
            latency_ms,
            cost,
        })
    }
}
