//! Conversational role sessions.

use crate::Result;
use crate::agents::{AgentRunner, RoleDefinition, SessionMode};
use crate::commands::role_overrides;
use crate::config::ResolvedConfig;
use crate::project::Project;
use crate::turn::{TurnIo, TurnLoop, TurnSummary};

/// Run one interactive session for `role` on `project`.
pub fn run_session(
    project: &Project,
    config: &ResolvedConfig,
    runner: &dyn AgentRunner,
    role: &RoleDefinition,
    mode: SessionMode,
    io: &mut dyn TurnIo,
) -> Result<TurnSummary> {
    project.ensure_knowledge_base()?;
    TurnLoop::new(
        runner,
        role,
        mode,
        project.mirror(),
        &project.source_dir,
        config.llm.model.clone(),
        role_overrides(role, config),
    )
    .run(io)
}
