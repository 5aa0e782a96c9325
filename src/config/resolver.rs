//! Loading and resolution of provider configuration.
//!
//! Resolution reads the env-style file, validates it, checks that the
//! credential variable is present and derives the agent's provider overrides.
//! Environment access goes through a lookup function so tests never have to
//! mutate the process environment.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::schema::{LlmConfig, Provider, missing_file_help};
use crate::{Error, Result};

/// Default configuration file, relative to the working directory.
pub const DEFAULT_ENV_FILE: &str = ".env";

/// Base URL used for auxiliary LLM calls when the provider is `chatgpt`.
pub const CHATGPT_FALLBACK_BASE_URL: &str = "https://api.openai.com/v1";

/// Credential variable used for auxiliary LLM calls when the provider is `chatgpt`.
pub const CHATGPT_FALLBACK_ENV_KEY: &str = "OPENAI_API_KEY";

/// Provider name injected into the agent's configuration overrides.
const OVERRIDE_PROVIDER: &str = "socratic_provider";

/// Fully resolved configuration for one process invocation.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// The validated configuration record
    pub llm: LlmConfig,
    /// Credential value, when the provider needs one
    pub api_key: Option<String>,
    /// File the configuration was read from
    pub source: PathBuf,
}

impl ResolvedConfig {
    /// Base URL and credential for auxiliary LLM calls.
    ///
    /// API providers use their own settings; `chatgpt` falls back to the
    /// OpenAI endpoint with `OPENAI_API_KEY`, looked up through `lookup`.
    pub fn completion_endpoint(
        &self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> (String, Option<String>) {
        match (&self.llm.provider, &self.llm.base_url) {
            (Provider::Api(_), Some(base_url)) => (base_url.clone(), self.api_key.clone()),
            _ => (
                CHATGPT_FALLBACK_BASE_URL.to_string(),
                lookup(CHATGPT_FALLBACK_ENV_KEY).filter(|v| !v.is_empty()),
            ),
        }
    }

    /// Provider overrides to pass to the agent for this configuration.
    pub fn agent_overrides(&self) -> Vec<String> {
        agent_config_overrides(&self.llm)
    }
}

/// Load the configuration file at `path` using the real process environment.
pub fn load_config(path: &Path) -> Result<ResolvedConfig> {
    resolve_config(path, |key| std::env::var(key).ok())
}

/// Load and validate the configuration file, resolving the credential with `lookup`.
pub fn resolve_config(
    path: &Path,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<ResolvedConfig> {
    if !path.exists() {
        return Err(Error::Config(missing_file_help(path)));
    }
    let llm = LlmConfig::from_entries(&read_env_file(path)?)?;

    let api_key = match &llm.env_key {
        Some(env_key) => match lookup(env_key).filter(|value| !value.is_empty()) {
            Some(value) => Some(value),
            None => return Err(Error::MissingCredential(env_key.clone())),
        },
        None => None,
    };

    debug!(
        path = %path.display(),
        provider = %llm.provider,
        model = %llm.model,
        "loaded provider configuration"
    );

    Ok(ResolvedConfig {
        llm,
        api_key,
        source: path.to_path_buf(),
    })
}

/// Read the `KEY=VALUE` entries of an env-style file.
///
/// The process environment is left untouched; later duplicates win.
pub fn read_env_file(path: &Path) -> Result<BTreeMap<String, String>> {
    let env_error = |e: dotenvy::Error| match e {
        dotenvy::Error::Io(source) => Error::tree(path, source),
        other => Error::Config(format!("Invalid .env file {}: {}", path.display(), other)),
    };
    let mut entries = BTreeMap::new();
    for item in dotenvy::from_path_iter(path).map_err(env_error)? {
        let (key, value) = item.map_err(env_error)?;
        entries.insert(key, value);
    }
    Ok(entries)
}

/// Build the `--config` overrides that point the agent at a custom provider.
///
/// Returns an empty list for `chatgpt`.
pub fn agent_config_overrides(config: &LlmConfig) -> Vec<String> {
    let (Some(base_url), Some(env_key)) = (&config.base_url, &config.env_key) else {
        return Vec::new();
    };
    if config.provider == Provider::ChatGpt {
        return Vec::new();
    }

    let mut options = vec![
        format!("model_provider=\"{}\"", OVERRIDE_PROVIDER),
        format!("model_providers.{0}.name=\"{0}\"", OVERRIDE_PROVIDER),
        format!("model_providers.{}.base_url=\"{}\"", OVERRIDE_PROVIDER, base_url),
        format!("model_providers.{}.env_key=\"{}\"", OVERRIDE_PROVIDER, env_key),
    ];

    if base_url == CHATGPT_FALLBACK_BASE_URL && env_key == CHATGPT_FALLBACK_ENV_KEY {
        options.push(format!(
            "model_providers.{}.wire_api=\"responses\"",
            OVERRIDE_PROVIDER
        ));
    }

    options
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_env(dir: &TempDir, content: &str) -> PathBuf {
        let path = dir.path().join(".env");
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let dir = TempDir::new().unwrap();
        let err = resolve_config(&dir.path().join(".env"), |_| None).unwrap_err();
        assert!(matches!(err, Error::Config(ref msg) if msg.contains("not found")));
    }

    #[test]
    fn test_read_env_file_handles_comments_and_quotes() {
        let dir = TempDir::new().unwrap();
        let path = write_env(
            &dir,
            "# provider\n\nMODEL=gpt-5\nPROVIDER=\"chatgpt\"\nBASE_URL=https://host/v1?a=b\n",
        );
        let entries = read_env_file(&path).unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries["PROVIDER"], "chatgpt");
        assert_eq!(entries["BASE_URL"], "https://host/v1?a=b");
    }

    #[test]
    fn test_malformed_line_is_config_error() {
        let dir = TempDir::new().unwrap();
        let path = write_env(&dir, "MODEL=gpt-5\nnot a pair\n");
        let err = resolve_config(&path, |_| None).unwrap_err();
        assert_eq!(err.category(), "config");
        assert!(err.to_string().contains("Invalid .env file"));
    }

    #[test]
    fn test_missing_credential_is_detected_at_load() {
        let dir = TempDir::new().unwrap();
        let path = write_env(&dir, "MODEL=m\nPROVIDER=p\nBASE_URL=https://x\nENV_KEY=SOME_KEY\n");
        let err = resolve_config(&path, |_| None).unwrap_err();
        assert!(matches!(err, Error::MissingCredential(ref key) if key == "SOME_KEY"));

        let err = resolve_config(&path, |_| Some(String::new())).unwrap_err();
        assert!(matches!(err, Error::MissingCredential(_)));
    }

    #[test]
    fn test_credential_is_resolved_through_lookup() {
        let dir = TempDir::new().unwrap();
        let path = write_env(&dir, "MODEL=m\nPROVIDER=p\nBASE_URL=https://x\nENV_KEY=SOME_KEY\n");
        let resolved = resolve_config(&path, |key| {
            (key == "SOME_KEY").then(|| "secret".to_string())
        })
        .unwrap();
        assert_eq!(resolved.api_key.as_deref(), Some("secret"));
        assert_eq!(resolved.source, path);
    }

    #[test]
    fn test_chatgpt_has_no_overrides() {
        let dir = TempDir::new().unwrap();
        let path = write_env(&dir, "MODEL=gpt-5\nPROVIDER=chatgpt\n");
        let resolved = resolve_config(&path, |_| None).unwrap();
        assert!(resolved.agent_overrides().is_empty());
        assert!(resolved.api_key.is_none());
    }

    #[test]
    fn test_api_overrides_without_wire_api() {
        let config = LlmConfig {
            provider: Provider::Api("local".to_string()),
            model: "qwen".to_string(),
            base_url: Some("http://localhost:8000/v1".to_string()),
            env_key: Some("LOCAL_KEY".to_string()),
        };
        let options = agent_config_overrides(&config);
        assert_eq!(options.len(), 4);
        assert_eq!(options[0], "model_provider=\"socratic_provider\"");
        assert_eq!(
            options[2],
            "model_providers.socratic_provider.base_url=\"http://localhost:8000/v1\""
        );
        assert_eq!(
            options[3],
            "model_providers.socratic_provider.env_key=\"LOCAL_KEY\""
        );
    }

    #[test]
    fn test_openai_overrides_select_responses_wire_api() {
        let config = LlmConfig {
            provider: Provider::Api("openai".to_string()),
            model: "gpt-5".to_string(),
            base_url: Some(CHATGPT_FALLBACK_BASE_URL.to_string()),
            env_key: Some(CHATGPT_FALLBACK_ENV_KEY.to_string()),
        };
        let options = agent_config_overrides(&config);
        assert_eq!(
            options.last().map(String::as_str),
            Some("model_providers.socratic_provider.wire_api=\"responses\"")
        );
    }

    #[test]
    fn test_completion_endpoint_falls_back_for_chatgpt() {
        let dir = TempDir::new().unwrap();
        let path = write_env(&dir, "MODEL=gpt-5\nPROVIDER=chatgpt\n");
        let resolved = resolve_config(&path, |_| None).unwrap();
        let (base, key) = resolved.completion_endpoint(|key| {
            (key == CHATGPT_FALLBACK_ENV_KEY).then(|| "sk-test".to_string())
        });
        assert_eq!(base, CHATGPT_FALLBACK_BASE_URL);
        assert_eq!(key.as_deref(), Some("sk-test"));
    }
}
