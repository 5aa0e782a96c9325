//! Planned knowledge base updates.
//!
//! The update role discusses a change read-only with the human. Its final
//! proposal is turned into a command script by the auxiliary LLM and applied
//! to the working copy, which is then promoted like any other turn.

use serde::Serialize;
use tracing::{info, warn};

use crate::Result;
use crate::agents::{AgentRunner, SessionMode, embedded};
use crate::commands::{Output, role_overrides};
use crate::config::ResolvedConfig;
use crate::kb::edit::AppliedEdits;
use crate::kb::{UnitCommand, apply_commands, find_unit, list_units, parse_commands, parse_id_list};
use crate::llm::TextTransform;
use crate::llm::prompts::{COMMANDS_SYSTEM, MODIFIED_IDS_SYSTEM, commands_request};
use crate::project::Project;
use crate::turn::{TurnIo, TurnLoop};

/// Word that ends the planning conversation.
pub const STOP_WORD: &str = "DONE";

/// What an update run did.
#[derive(Debug, Default, Serialize)]
pub struct UpdateOutcome {
    /// The agent's final proposal, if the conversation produced one
    pub proposal: Option<String>,
    pub commands: Vec<UnitCommand>,
    pub applied: AppliedEdits,
    pub promoted: bool,
}

impl Output for UpdateOutcome {
    fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }

    fn to_human(&self) -> String {
        if self.proposal.is_none() {
            return "No update proposed.".to_string();
        }
        if self.commands.is_empty() {
            return "The proposal contained no knowledge base changes.".to_string();
        }
        let mut out = format!(
            "Applied {} command(s): {} added, {} deleted, {} modified",
            self.commands.len(),
            self.applied.added.len(),
            self.applied.deleted.len(),
            self.applied.modified.len()
        );
        if !self.promoted {
            out.push_str("\nChanges are in the working copy; run `socratic promote` to keep them.");
        }
        out
    }
}

/// Plan an update with the agent, then apply its final proposal.
pub fn run_update(
    project: &Project,
    config: &ResolvedConfig,
    runner: &dyn AgentRunner,
    transform: &dyn TextTransform,
    io: &mut dyn TurnIo,
    promote: bool,
) -> Result<UpdateOutcome> {
    project.ensure_knowledge_base()?;
    let role = embedded::update();
    let summary = TurnLoop::new(
        runner,
        &role,
        SessionMode::ReadOnly,
        project.mirror(),
        &project.source_dir,
        config.llm.model.clone(),
        role_overrides(&role, config),
    )
    .with_stop_word(STOP_WORD)
    .run(io)?;

    if io.interrupted() {
        info!("update interrupted before a proposal was accepted");
        return Ok(UpdateOutcome::default());
    }
    match summary.last_reply {
        Some(proposal) => apply_update(project, transform, &proposal, io, promote),
        None => Ok(UpdateOutcome::default()),
    }
}

/// Turn `proposal` into edit commands and apply them to the working copy.
///
/// The working copy is reset from the durable tree first. With `promote`
/// set, the result replaces the durable tree.
pub fn apply_update(
    project: &Project,
    transform: &dyn TextTransform,
    proposal: &str,
    io: &mut dyn TurnIo,
    promote: bool,
) -> Result<UpdateOutcome> {
    let mirror = project.mirror();
    let units = list_units(&mirror.durable)?;

    io.status("Planning knowledge base edits...");
    let id_text = transform.coerce(proposal, MODIFIED_IDS_SYSTEM)?;
    let (ids, invalid) = parse_id_list(&id_text);
    if !invalid.is_empty() {
        warn!(entries = ?invalid, "ignoring unparseable unit ids");
    }

    let mut existing = Vec::new();
    for id in ids {
        match find_unit(&units, id) {
            Some(unit) => existing.push((id, unit.content.clone())),
            None => warn!(id, "proposal names a unit that does not exist"),
        }
    }

    let script = transform.complete(COMMANDS_SYSTEM, &commands_request(proposal, &existing))?;
    let commands = parse_commands(&script)?;
    let mut outcome = UpdateOutcome {
        proposal: Some(proposal.to_string()),
        commands,
        ..UpdateOutcome::default()
    };
    if outcome.commands.is_empty() {
        info!("update proposal produced no commands");
        return Ok(outcome);
    }

    mirror.reset()?;
    outcome.applied = apply_commands(&mirror.ephemeral, &outcome.commands, |text| {
        transform.title(text)
    })?;

    let report = mirror.pending_changes()?;
    io.changes(&report, &mirror.durable, &mirror.ephemeral)?;
    if promote {
        mirror.promote()?;
        outcome.promoted = true;
    }
    Ok(outcome)
}
