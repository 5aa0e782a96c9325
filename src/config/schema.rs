//! Schema for the env-style provider configuration file.
//!
//! This module provides:
//! - `LlmConfig`, the normalized configuration record
//! - Validation of required keys per provider mode

use std::collections::BTreeMap;

use crate::{Error, Result};

/// Provider name that selects ChatGPT-account access.
pub const CHATGPT_PROVIDER: &str = "chatgpt";

const CHATGPT_EXAMPLE: &str = "  MODEL=<model_name>\n  PROVIDER=chatgpt";
const API_EXAMPLE: &str = "  MODEL=<model_name>\n  BASE_URL=<api_base_url>\n  ENV_KEY=<api_key_env_var_name>\n  PROVIDER=<provider_name>";

/// Which kind of provider the agent talks to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Provider {
    /// ChatGPT-account access; the agent handles authentication itself.
    ChatGpt,
    /// Any API-based provider, identified by name.
    Api(String),
}

impl Provider {
    /// Parse a provider name. `chatgpt` is matched case-sensitively, like the file.
    pub fn parse(name: &str) -> Self {
        if name == CHATGPT_PROVIDER {
            Provider::ChatGpt
        } else {
            Provider::Api(name.to_string())
        }
    }

    /// Convert to string representation.
    pub fn as_str(&self) -> &str {
        match self {
            Provider::ChatGpt => CHATGPT_PROVIDER,
            Provider::Api(name) => name,
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Normalized provider configuration, immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlmConfig {
    /// Provider identifier
    pub provider: Provider,
    /// Model identifier passed to the agent
    pub model: String,
    /// API base URL (API-based providers only)
    pub base_url: Option<String>,
    /// Name of the environment variable holding the credential (API-based providers only)
    pub env_key: Option<String>,
}

impl LlmConfig {
    /// Build a config from parsed `KEY=VALUE` pairs, validating required keys.
    pub fn from_entries(entries: &BTreeMap<String, String>) -> Result<Self> {
        let missing: Vec<&str> = ["MODEL", "PROVIDER"]
            .into_iter()
            .filter(|key| !entries.contains_key(*key))
            .collect();
        if !missing.is_empty() {
            return Err(Error::Config(format!(
                "Missing required variables in .env file: {}\nPlease ensure your .env file contains:\n  MODEL=<model_name>\n  PROVIDER=<provider_name>",
                missing.join(", ")
            )));
        }

        let model = entries["MODEL"].clone();
        let provider = Provider::parse(&entries["PROVIDER"]);

        if provider == Provider::ChatGpt {
            return Ok(Self {
                provider,
                model,
                base_url: None,
                env_key: None,
            });
        }

        let missing: Vec<&str> = ["BASE_URL", "ENV_KEY"]
            .into_iter()
            .filter(|key| !entries.contains_key(*key))
            .collect();
        if !missing.is_empty() {
            return Err(Error::Config(format!(
                "Missing required variables for API-based mode in .env file: {}\nFor API-based access, please ensure your .env file contains:\n{}\n\nOr use ChatGPT mode with:\n{}",
                missing.join(", "),
                API_EXAMPLE,
                CHATGPT_EXAMPLE
            )));
        }

        Ok(Self {
            provider,
            model,
            base_url: Some(entries["BASE_URL"].clone()),
            env_key: Some(entries["ENV_KEY"].clone()),
        })
    }

    /// Whether the model accepts a reasoning-effort override.
    pub fn is_reasoning_model(&self) -> bool {
        self.model.contains("gpt-5")
    }
}

/// Help text shown when the configuration file does not exist.
pub fn missing_file_help(path: &std::path::Path) -> String {
    format!(
        ".env file not found at {}.\nPlease create a .env file with one of the following configurations:\n\nFor API-based access:\n{}\n\nFor ChatGPT-based access:\n{}",
        path.display(),
        API_EXAMPLE,
        CHATGPT_EXAMPLE
    )
}
