//! Provider configuration for Socratic.
//!
//! Configuration lives in an env-style file (`.env` by default) next to the
//! `projects/` directory:
//!
//! ```text
//! # API-based access (own key, including the OpenAI API)
//! MODEL=gpt-5
//! PROVIDER=openai
//! BASE_URL=https://api.openai.com/v1
//! ENV_KEY=OPENAI_API_KEY
//!
//! # ChatGPT-account access
//! MODEL=gpt-5
//! PROVIDER=chatgpt
//! ```
//!
//! The file is read with `dotenvy`, so quoting, `export` prefixes and `#`
//! comments follow the usual dotenv rules.
//!
//! ## Validation
//!
//! `MODEL` and `PROVIDER` are always required. Any provider other than
//! `chatgpt` also requires `BASE_URL` and `ENV_KEY`, and the variable named by
//! `ENV_KEY` must already be set when the file is loaded.
//!
//! ## Precedence
//!
//! For the file location: CLI flag > `SOCRATIC_ENV_FILE` > `./.env`.
//!
//! Use the [`resolver`] module to load and validate in one step.

pub mod resolver;
pub mod schema;

pub use resolver::{
    CHATGPT_FALLBACK_BASE_URL, CHATGPT_FALLBACK_ENV_KEY, DEFAULT_ENV_FILE, ResolvedConfig,
    agent_config_overrides, load_config, read_env_file, resolve_config,
};
pub use schema::{LlmConfig, Provider};
