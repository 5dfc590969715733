//! Server configuration
//!
//! TOML file with environment overrides. LLM API keys are read from the
//! environment only (`OPENAI_API_KEY`, `ANTHROPIC_API_KEY`), never from the
//! config file.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{OrchestratorError, Result};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("agentflow.db"),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PricingConfig {
    /// JSON pricing table; the built-in table is used when absent.
    pub path: Option<PathBuf>,
}

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub pricing: PricingConfig,
}

impl AppConfig {
    /// Load from a TOML file, then apply environment overrides
    /// (`AGENTFLOW_HOST`, `AGENTFLOW_PORT`, `AGENTFLOW_DATABASE_PATH`).
    /// A missing file yields defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) if path.exists() => {
                let contents = std::fs::read_to_string(path).map_err(|e| {
                    OrchestratorError::Validation(format!(
                        "failed to read config {}: {}",
                        path.display(),
                        e
                    ))
                })?;
                toml::from_str(&contents).map_err(|e| {
                    OrchestratorError::Validation(format!(
                        "invalid config {}: {}",
                        path.display(),
                        e
                    ))
                })?
            }
            _ => Self::default(),
        };

        if let Ok(host) = std::env::var("AGENTFLOW_HOST") {
            if !host.is_empty() {
                config.server.host = host;
            }
        }
        if let Ok(port) = std::env::var("AGENTFLOW_PORT") {
            if let Ok(port) = port.parse() {
                config.server.port = port;
            }
        }
        if let Ok(path) = std::env::var("AGENTFLOW_DATABASE_PATH") {
            if !path.is_empty() {
                config.database.path = PathBuf::from(path);
            }
        }

        Ok(config)
    }

    /// Socket address the server binds to.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
