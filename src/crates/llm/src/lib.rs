//! LLM provider adapters for agentflow.
//!
//! This crate provides concrete implementations of the engine's
//! [`CompletionModel`](engine::adapter::CompletionModel) trait for remote
//! providers, plus the process-wide [`AdapterRegistry`] that resolves one
//! shared adapter per provider.
//!
//! # Providers
//!
//! - **OpenAI** — chat completions (GPT-4o family and friends)
//! - **Anthropic** — messages API (Claude family)
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use engine::adapter::ProviderRouter;
//! use engine::graph::Provider;
//! use engine::pricing::PricingTable;
//! use llm::{AdapterRegistry, LlmSettings};
//!
//! let registry = AdapterRegistry::new(
//!     LlmSettings::from_env(),
//!     Arc::new(PricingTable::default_table()),
//! );
//! let adapter = registry.resolve(Provider::OpenAi)?;
//! # Ok::<(), engine::EngineError>(())
//! ```

pub mod config;
pub mod error;
pub mod registry;
pub mod remote;

pub use config::LlmSettings;
pub use error::{LlmError, Result};
pub use registry::AdapterRegistry;
pub use remote::{AnthropicAdapter, OpenAiAdapter};
