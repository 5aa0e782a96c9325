//! Role and session descriptor types.
//!
//! This module defines the small descriptors that configure one generic
//! session driver:
//! - `SandboxPolicy`: What the agent may do to its working directory
//! - `SessionMode`: Whether and when edits are promoted into the durable tree
//! - `ReasoningEffort`: Per-role effort hint for reasoning models
//! - `RoleDefinition`: Prompt template plus display and effort settings

use serde::{Deserialize, Serialize};

/// Role names (canonical subcommand names).
pub const ROLE_SYNTHESIZE: &str = "synthesize";
pub const ROLE_DIGEST: &str = "digest";
pub const ROLE_TRIAGE: &str = "triage";
pub const ROLE_ASK: &str = "ask";
pub const ROLE_UPDATE: &str = "update";
pub const ROLE_RESEARCH: &str = "research";

/// Sandbox policy granted to the agent process over its working directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SandboxPolicy {
    /// The agent may read but never mutate files.
    ReadOnly,
    /// The agent may create, modify and delete files under its working directory.
    ReadWrite,
}

impl SandboxPolicy {
    /// Policy name as used in logs and error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            SandboxPolicy::ReadOnly => "read-only",
            SandboxPolicy::ReadWrite => "read-write",
        }
    }

    /// Value passed to the agent's `--sandbox` flag.
    pub fn codex_flag(&self) -> &'static str {
        match self {
            SandboxPolicy::ReadOnly => "read-only",
            SandboxPolicy::ReadWrite => "workspace-write",
        }
    }
}

impl std::fmt::Display for SandboxPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for SandboxPolicy {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "read-only" => Ok(SandboxPolicy::ReadOnly),
            "read-write" | "workspace-write" => Ok(SandboxPolicy::ReadWrite),
            _ => Err(crate::Error::InvalidInput(format!(
                "Invalid sandbox policy: '{}'. Expected 'read-only' or 'read-write'.",
                s
            ))),
        }
    }
}

/// How a turn loop treats the knowledge base trees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionMode {
    /// Agent edits the ephemeral tree; every successful turn is promoted.
    AutoPromote,
    /// Agent edits the ephemeral tree; promotion is left to an external caller.
    DeferredPromotion,
    /// Agent reads the durable tree directly; nothing is mirrored or promoted.
    ReadOnly,
}

impl SessionMode {
    /// Sandbox policy implied by the mode.
    pub fn sandbox(&self) -> SandboxPolicy {
        match self {
            SessionMode::AutoPromote | SessionMode::DeferredPromotion => SandboxPolicy::ReadWrite,
            SessionMode::ReadOnly => SandboxPolicy::ReadOnly,
        }
    }

    /// Whether the mode works against the ephemeral mirror.
    pub fn uses_mirror(&self) -> bool {
        !matches!(self, SessionMode::ReadOnly)
    }

    /// Whether successful turns are promoted immediately.
    pub fn promotes(&self) -> bool {
        matches!(self, SessionMode::AutoPromote)
    }

    /// Pick the mirrored mode for a mutating role.
    ///
    /// Plain output means another program is reading the replies, so promotion is deferred to it.
    pub fn mirrored(plain: bool) -> Self {
        if plain {
            SessionMode::DeferredPromotion
        } else {
            SessionMode::AutoPromote
        }
    }
}

impl std::fmt::Display for SessionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionMode::AutoPromote => write!(f, "auto-promote"),
            SessionMode::DeferredPromotion => write!(f, "deferred-promotion"),
            SessionMode::ReadOnly => write!(f, "read-only"),
        }
    }
}

/// Reasoning effort requested from reasoning-capable models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReasoningEffort {
    Low,
    Medium,
    High,
}

impl ReasoningEffort {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReasoningEffort::Low => "low",
            ReasoningEffort::Medium => "medium",
            ReasoningEffort::High => "high",
        }
    }

    /// The agent configuration override selecting this effort.
    pub fn config_override(&self) -> String {
        format!("model_reasoning_effort='{}'", self.as_str())
    }
}

impl std::fmt::Display for ReasoningEffort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A role descriptor: everything that differs between the session subcommands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleDefinition {
    /// Canonical role name (matches the subcommand).
    pub name: &'static str,
    /// One-line description for help output.
    pub description: &'static str,
    /// Prompt template with `{source_dir}` and `{instruction}` placeholders.
    pub prompt_template: &'static str,
    /// Question asked before the first turn. `None` starts the session immediately.
    pub opening_question: Option<&'static str>,
    /// Effort hint for reasoning models.
    pub reasoning_effort: ReasoningEffort,
    /// Title of the box around the first reply.
    pub first_title: &'static str,
    /// Title of the box around every later reply.
    pub followup_title: &'static str,
}

impl RoleDefinition {
    /// Render the role prompt for a session start.
    pub fn render(&self, source_dir: &std::path::Path, instruction: &str) -> String {
        self.prompt_template
            .replace("{source_dir}", &source_dir.display().to_string())
            .replace("{instruction}", instruction)
    }

    /// Agent configuration overrides for this role under the given model.
    pub fn config_overrides(&self, base: &[String], reasoning_model: bool) -> Vec<String> {
        let mut options = base.to_vec();
        if reasoning_model {
            options.push(self.reasoning_effort.config_override());
        }
        options
    }
}
