//! Parsing of the agent's newline-delimited JSON event stream.
//!
//! Two record shapes matter:
//! - `{"type": "thread.started", "thread_id": "..."}` must be the first record
//!   and carries the session handle.
//! - Any record with a string `item.text` is a candidate reply. The last one
//!   wins, since usage and bookkeeping records may trail the reply.

use serde_json::Value;

use crate::{Error, Result};

/// Record type that opens every session.
pub const THREAD_STARTED: &str = "thread.started";

/// Opaque identifier of a resumable agent conversation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionHandle(String);

impl SessionHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Extract the session handle from the first non-blank record.
pub fn session_handle(lines: &[String]) -> Result<SessionHandle> {
    let Some(first) = lines.iter().find(|line| !line.trim().is_empty()) else {
        return Err(Error::protocol("agent produced no output", lines));
    };

    let record: Value = serde_json::from_str(first).map_err(|e| {
        Error::protocol(format!("first record is not valid JSON: {}", e), lines)
    })?;

    if record.get("type").and_then(Value::as_str) != Some(THREAD_STARTED) {
        return Err(Error::protocol(
            format!("first record is not a {} record", THREAD_STARTED),
            lines,
        ));
    }

    match record.get("thread_id").and_then(Value::as_str) {
        Some(id) if !id.is_empty() => Ok(SessionHandle::new(id)),
        _ => Err(Error::protocol(
            format!("{} record has no thread_id", THREAD_STARTED),
            lines,
        )),
    }
}

/// Find the reply text, scanning from the last record backwards.
///
/// Lines that are not JSON (stderr noise shares the pipe) are skipped.
pub fn reply_text(lines: &[String]) -> Result<String> {
    lines
        .iter()
        .rev()
        .filter_map(|line| serde_json::from_str::<Value>(line).ok())
        .find_map(|record| {
            record
                .get("item")
                .and_then(|item| item.get("text"))
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .ok_or_else(|| Error::protocol("no record carries reply text", lines))
}
