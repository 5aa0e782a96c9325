//! Socratic - grow a markdown knowledge base through conversations with an
//! external coding agent.
//!
//! This library provides the core functionality for the `socratic` CLI tool:
//! the two-copy knowledge base mirror, the resumable agent session protocol,
//! and the turn loop that ties them together.

pub mod action_log;
pub mod agents;
pub mod cli;
pub mod commands;
pub mod config;
pub mod kb;
pub mod llm;
pub mod logging;
pub mod mirror;
pub mod project;
pub mod turn;
pub mod ui;

use std::path::PathBuf;


/// Library-level error type for Socratic operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    #[error("{0}")]
    Config(String),

    #[error("{0}")]
    ProjectNotFound(String),

    #[error("{0} is not set in the environment. Please set the API key: export {0}='your_api_key_here'")]
    MissingCredential(String),

    #[error("Failed to start agent `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Agent process failed with {}", exit_label(.code))]
    ProcessFailed { code: Option<i32>, output: String },

    #[error("Unexpected agent output: {message}")]
    Protocol { message: String, output: String },

    #[error("Filesystem error at {}: {source}", .path.display())]
    Tree {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("LLM request failed: {0}")]
    Llm(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("{0}")]
    Other(String),
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "no exit code (terminated by signal)".to_string(),
    }
}

impl Error {
    /// Wrap an IO error with the path it happened at.
    pub fn tree(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Tree {
            path: path.into(),
            source,
        }
    }

    /// Build a protocol error carrying the raw agent output.
    pub fn protocol(message: impl Into<String>, lines: &[String]) -> Self {
        Error::Protocol {
            message: message.into(),
            output: lines.join("\n"),
        }
    }

    /// The error taxonomy bucket, used as the prefix of user-facing messages.
    pub fn category(&self) -> &'static str {
        match self {
            Error::Config(_) | Error::ProjectNotFound(_) | Error::MissingCredential(_) => "config",
            Error::Yaml(_) => "config",
            Error::Protocol { .. } | Error::Json(_) => "protocol",
            Error::ProcessFailed { .. } | Error::Spawn { .. } => "process",
            Error::Io(_) | Error::Tree { .. } => "filesystem",
            Error::Llm(_) => "llm",
            Error::InvalidInput(_) => "input",
            Error::Other(_) => "error",
        }
    }

    /// Raw agent output attached to process and protocol failures.
    pub fn captured_output(&self) -> Option<&str> {
        match self {
            Error::ProcessFailed { output, .. } | Error::Protocol { output, .. } => {
                Some(output.as_str())
            }
            _ => None,
        }
    }
}

/// Result type alias for Socratic operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_failure_message_includes_exit_code() {
        let err = Error::ProcessFailed {
            code: Some(2),
            output: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "Agent process failed with exit code 2");
        assert_eq!(err.category(), "process");
        assert_eq!(err.captured_output(), Some("boom"));
    }

    #[test]
    fn test_protocol_error_keeps_raw_output() {
        let lines = vec!["not json".to_string(), "{}".to_string()];
        let err = Error::protocol("missing thread.started record", &lines);
        assert_eq!(err.category(), "protocol");
        assert_eq!(err.captured_output(), Some("not json\n{}"));
    }

    #[test]
    fn test_config_errors_have_no_captured_output() {
        let err = Error::MissingCredential("MY_KEY".to_string());
        assert_eq!(err.category(), "config");
        assert!(err.captured_output().is_none());
        assert!(err.to_string().starts_with("MY_KEY is not set"));
    }
}
