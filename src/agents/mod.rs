//! Agent roles and the session protocol.
//!
//! Every conversational subcommand is the same session driver configured by
//! a small role descriptor:
//!
//! | Role       | Opening question                 | Mode                      | Effort |
//! |------------|----------------------------------|---------------------------|--------|
//! | synthesize | What should we work on?          | mirrored                  | medium |
//! | digest     | (none)                           | mirrored                  | high   |
//! | triage     | What should we triage?           | mirrored                  | medium |
//! | ask        | What would you like to know?     | read-only                 | low    |
//! | update     | What would you like to update?   | read-only, then applied   | medium |
//! | research   | (one topic per session)          | read-only, single turn    | medium |
//!
//! "Mirrored" roles run against the ephemeral tree and are promoted after
//! each turn, or left for an external caller when output is plain.
//!
//! ## Protocol
//!
//! Each turn spawns the agent once (see [`runner`]). The first output record
//! must be `thread.started` carrying the session handle; the reply is the last
//! record with `item.text` (see [`events`]). [`session`] enforces the order
//! and keeps the handle across resumes.

pub mod definitions;
pub mod embedded;
pub mod events;
pub mod runner;
pub mod session;

pub use definitions::{ReasoningEffort, RoleDefinition, SandboxPolicy, SessionMode};
pub use embedded::{all_roles, get_role};
pub use events::{SessionHandle, reply_text, session_handle};
pub use runner::{
    AgentInvocation, AgentRequest, AgentRunner, CodexRunner, DEFAULT_AGENT_BIN, RunOutput,
};
pub use session::{AgentReply, AgentSession, SessionSettings};
