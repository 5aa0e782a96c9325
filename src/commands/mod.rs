//! Command implementations for the Socratic CLI.
//!
//! Commands are organized by concern:
//! - `project` - init, diff and promote
//! - `session` - the conversational roles (synthesize, digest, triage, ask)
//! - `update` - planned updates applied through command scripts
//! - `export` - single-file export of the knowledge base
//! - `compose` - prompt snippets from selected units
//! - `research` - parallel single-turn research notes
//!
//! Every command takes its collaborators (agent runner, text transform,
//! turn I/O) as trait objects so the binary and the tests share one code path.

pub mod compose;
pub mod export;
pub mod project;
pub mod research;
pub mod session;
pub mod update;

pub use compose::{ComposeResult, UnitSelection, compose};
pub use export::{ExportResult, export, export_at};
pub use project::{DiffResult, InitResult, PromoteResult, diff, init, promote};
pub use research::{ResearchReport, read_topics, research};
pub use session::run_session;
pub use update::{UpdateOutcome, apply_update, run_update};

use crate::agents::RoleDefinition;
use crate::config::ResolvedConfig;

/// Command results that can be serialized to JSON or formatted for humans.
pub trait Output {
    /// Serialize to JSON string.
    fn to_json(&self) -> String;

    /// Format for human-readable output.
    fn to_human(&self) -> String;
}

/// Agent configuration overrides for `role` under `config`.
pub fn role_overrides(role: &RoleDefinition, config: &ResolvedConfig) -> Vec<String> {
    role.config_overrides(&config.agent_overrides(), config.llm.is_reasoning_model())
}

/// Timestamp format used in generated file names.
pub const FILE_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H-%M-%S";
