//! Command audit log.
//!
//! Every CLI invocation appends one JSON line to `<projects-root>/action.log`,
//! provided the projects root already exists.
//! Set `SOCRATIC_ACTION_LOG=0` (or `false`/`no`) to turn it off.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::Result;

/// File name of the audit log inside the projects root.
pub const ACTION_LOG_FILE: &str = "action.log";

/// Environment variable that disables the audit log.
pub const ACTION_LOG_ENV: &str = "SOCRATIC_ACTION_LOG";

/// Longest string value kept verbatim.
const MAX_STRING_LEN: usize = 200;

/// One audit log entry.
#[derive(Debug, Serialize, Deserialize)]
pub struct ActionLog {
    /// ISO 8601 timestamp when the command finished
    pub timestamp: DateTime<Utc>,

    /// Subcommand name (e.g. "synthesize", "promote")
    pub command: String,

    /// Project the command worked on, when it names one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,

    /// Sanitized command arguments
    pub args: serde_json::Value,

    /// Whether the command succeeded
    pub success: bool,

    /// Error message if the command failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Command execution duration in milliseconds
    pub duration_ms: u64,

    /// User who executed the command
    pub user: String,
}

/// Whether logging is enabled for the given `SOCRATIC_ACTION_LOG` value.
pub fn is_enabled(value: Option<&str>) -> bool {
    match value {
        Some(v) => !matches!(v.trim().to_lowercase().as_str(), "0" | "false" | "no" | "off"),
        None => true,
    }
}

/// Path of the audit log for a projects root.
pub fn log_path(projects_root: &Path) -> PathBuf {
    projects_root.join(ACTION_LOG_FILE)
}

/// Record one command. Failures are reported as warnings and never returned.
pub fn log_action(
    projects_root: &Path,
    command: &str,
    project: Option<&str>,
    args: serde_json::Value,
    error: Option<String>,
    duration_ms: u64,
) {
    if !is_enabled(std::env::var(ACTION_LOG_ENV).ok().as_deref()) {
        return;
    }
    if !projects_root.is_dir() {
        debug!(root = %projects_root.display(), "no projects root, skipping action log");
        return;
    }

    let entry = ActionLog {
        timestamp: Utc::now(),
        command: command.to_string(),
        project: project.map(str::to_string),
        args: sanitize_args(&args),
        success: error.is_none(),
        error,
        duration_ms,
        user: get_current_user(),
    };

    if let Err(e) = write_log_entry(&log_path(projects_root), &entry) {
        warn!(error = %e, "failed to write action log");
    }
}

fn write_log_entry(path: &Path, entry: &ActionLog) -> Result<()> {
    let json = serde_json::to_string(entry)?;
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{}", json)?;
    Ok(())
}

fn is_sensitive(key: &str) -> bool {
    let key = key.to_lowercase();
    ["password", "token", "key", "secret"]
        .iter()
        .any(|word| key.contains(word))
}

/// Redact sensitive keys and truncate long strings.
pub fn sanitize_args(args: &serde_json::Value) -> serde_json::Value {
    match args {
        serde_json::Value::Object(map) => serde_json::Value::Object(
            map.iter()
                .map(|(key, value)| {
                    let value = if is_sensitive(key) {
                        serde_json::Value::String("[REDACTED]".to_string())
                    } else {
                        sanitize_args(value)
                    };
                    (key.clone(), value)
                })
                .collect(),
        ),
        serde_json::Value::Array(items) => {
            serde_json::Value::Array(items.iter().map(sanitize_args).collect())
        }
        serde_json::Value::String(s) => {
            let len = s.chars().count();
            if len > MAX_STRING_LEN {
                let head: String = s.chars().take(MAX_STRING_LEN - 3).collect();
                serde_json::Value::String(format!("{}... ({} chars)", head, len))
            } else {
                args.clone()
            }
        }
        _ => args.clone(),
    }
}

fn get_current_user() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string())
}
