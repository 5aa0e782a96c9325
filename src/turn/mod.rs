//! The interactive turn loop.
//!
//! One generic driver serves every conversational role:
//!
//! 1. Mirrored modes rebuild the ephemeral tree from the durable tree.
//! 2. The opening question (if the role has one) provides the first instruction.
//! 3. The session starts; the reply is shown; auto-promote mode shows the
//!    pending changes and promotes them.
//! 4. Every further input line resumes the session the same way, until end of
//!    input (or the stop word, when one is configured).

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::agents::{
    AgentRunner, AgentSession, RoleDefinition, SessionHandle, SessionMode, SessionSettings,
};
use crate::mirror::{DiffReport, KnowledgeBaseMirror};
use crate::Result;

/// The loop's view of the human on the other side.
pub trait TurnIo {
    /// Ask for one line. `None` means end of input.
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>>;
    /// Report progress while the agent works.
    fn status(&mut self, message: &str);
    /// Show one agent reply.
    fn reply(&mut self, title: &str, text: &str);
    /// Show the changes a promotion is about to apply.
    fn changes(&mut self, report: &DiffReport, before: &Path, after: &Path) -> Result<()>;
    /// Whether input ended because the human interrupted rather than closing it.
    fn interrupted(&self) -> bool {
        false
    }
}

/// Outcome of a finished loop.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TurnSummary {
    /// Number of successful agent turns.
    pub turns: usize,
    /// Text of the last reply.
    pub last_reply: Option<String>,
    /// Handle of the session, when one was started.
    pub handle: Option<SessionHandle>,
}

/// A configured turn loop for one role and mode.
pub struct TurnLoop<'a> {
    runner: &'a dyn AgentRunner,
    role: &'a RoleDefinition,
    mode: SessionMode,
    mirror: KnowledgeBaseMirror,
    source_dir: PathBuf,
    model: String,
    config_overrides: Vec<String>,
    stop_word: Option<String>,
}

impl<'a> TurnLoop<'a> {
    pub fn new(
        runner: &'a dyn AgentRunner,
        role: &'a RoleDefinition,
        mode: SessionMode,
        mirror: KnowledgeBaseMirror,
        source_dir: impl Into<PathBuf>,
        model: impl Into<String>,
        config_overrides: Vec<String>,
    ) -> Self {
        Self {
            runner,
            role,
            mode,
            mirror,
            source_dir: source_dir.into(),
            model: model.into(),
            config_overrides,
            stop_word: None,
        }
    }

    /// End the loop when the human types `word` (case-insensitive).
    pub fn with_stop_word(mut self, word: impl Into<String>) -> Self {
        self.stop_word = Some(word.into());
        self
    }

    /// Directory the agent runs in for this mode.
    pub fn working_dir(&self) -> &Path {
        if self.mode.uses_mirror() {
            &self.mirror.ephemeral
        } else {
            &self.mirror.durable
        }
    }

    fn is_stop_word(&self, line: &str) -> bool {
        self.stop_word
            .as_deref()
            .is_some_and(|word| line.eq_ignore_ascii_case(word))
    }

    /// Read the next non-empty line. `None` ends the loop.
    fn next_input(&self, io: &mut dyn TurnIo, prompt: &str) -> Result<Option<String>> {
        loop {
            match io.read_line(prompt)? {
                None => return Ok(None),
                Some(line) if line.trim().is_empty() => continue,
                Some(line) if self.is_stop_word(line.trim()) => return Ok(None),
                Some(line) => return Ok(Some(line.trim().to_string())),
            }
        }
    }

    fn after_turn(&self, io: &mut dyn TurnIo) -> Result<()> {
        if !self.mode.promotes() {
            return Ok(());
        }
        let report = self.mirror.pending_changes()?;
        debug!(
            added = report.added.len(),
            deleted = report.deleted.len(),
            modified = report.modified.len(),
            "changes after turn"
        );
        io.changes(&report, &self.mirror.durable, &self.mirror.ephemeral)?;
        self.mirror.promote()
    }

    /// Run the loop until end of input.
    pub fn run(&self, io: &mut dyn TurnIo) -> Result<TurnSummary> {
        if self.mode.uses_mirror() {
            self.mirror.reset()?;
        }

        let instruction = match self.role.opening_question {
            Some(question) => match self.next_input(io, question)? {
                Some(line) => line,
                None => return Ok(TurnSummary::default()),
            },
            None => String::new(),
        };

        info!(role = self.role.name, mode = %self.mode, "starting session");
        let mut session = AgentSession::new(
            self.runner,
            SessionSettings {
                working_dir: self.working_dir().to_path_buf(),
                sandbox: self.mode.sandbox(),
                model: self.model.clone(),
                config_overrides: self.config_overrides.clone(),
            },
        );

        io.status("Agent in progress...");
        let reply = session.start(&self.role.render(&self.source_dir, &instruction))?;
        io.reply(self.role.first_title, &reply.text);
        self.after_turn(io)?;

        let mut summary = TurnSummary {
            turns: 1,
            last_reply: Some(reply.text),
            handle: Some(reply.handle),
        };

        while let Some(line) = self.next_input(io, "")? {
            io.status("Continuing agent with your input...");
            let reply = session.resume(&line)?;
            io.reply(self.role.followup_title, &reply.text);
            self.after_turn(io)?;
            summary.turns += 1;
            summary.last_reply = Some(reply.text);
        }

        info!(role = self.role.name, turns = summary.turns, "session ended");
        Ok(summary)
    }
}
