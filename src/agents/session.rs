//! Resumable agent conversations.
//!
//! An `AgentSession` drives one conversation across many agent processes.
//! The first turn yields a session handle; every later turn resumes it.
//!
//! ```text
//! NotStarted --start--> Active --resume--> Active ...
//!      |                  |
//!      +------------------+--(error)--> Failed
//! ```

use std::path::PathBuf;

use tracing::{debug, warn};

use crate::agents::definitions::SandboxPolicy;
use crate::agents::events::{SessionHandle, reply_text, session_handle};
use crate::agents::runner::{AgentInvocation, AgentRequest, AgentRunner, RunOutput};
use crate::{Error, Result};

/// Fixed parameters shared by every turn of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
    pub working_dir: PathBuf,
    pub sandbox: SandboxPolicy,
    pub model: String,
    pub config_overrides: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum SessionState {
    NotStarted,
    Active(SessionHandle),
    Failed,
}

/// The result of one successful turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentReply {
    pub text: String,
    pub handle: SessionHandle,
}

/// One conversation with the external agent.
pub struct AgentSession<'r> {
    runner: &'r dyn AgentRunner,
    settings: SessionSettings,
    state: SessionState,
}

impl<'r> AgentSession<'r> {
    pub fn new(runner: &'r dyn AgentRunner, settings: SessionSettings) -> Self {
        Self {
            runner,
            settings,
            state: SessionState::NotStarted,
        }
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    /// The handle of an active session.
    pub fn handle(&self) -> Option<&SessionHandle> {
        match &self.state {
            SessionState::Active(handle) => Some(handle),
            _ => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        self.state == SessionState::Failed
    }

    /// Open the conversation with a fully rendered instruction.
    pub fn start(&mut self, instruction: &str) -> Result<AgentReply> {
        if self.state != SessionState::NotStarted {
            return Err(Error::Other(
                "agent session has already been started".to_string(),
            ));
        }

        let output = self.invoke(AgentRequest::Start { instruction });
        match output.and_then(|output| parse_turn(&output)) {
            Ok((handle, text)) => {
                debug!(handle = %handle, "agent session started");
                self.state = SessionState::Active(handle.clone());
                Ok(AgentReply { text, handle })
            }
            Err(e) => {
                self.state = SessionState::Failed;
                Err(e)
            }
        }
    }

    /// Continue the conversation with follow-up text.
    ///
    /// The handle never changes; a different id reported by the agent is
    /// logged and ignored.
    pub fn resume(&mut self, text: &str) -> Result<AgentReply> {
        let handle = match &self.state {
            SessionState::Active(handle) => handle.clone(),
            SessionState::NotStarted => {
                return Err(Error::Other(
                    "agent session must be started before it can be resumed".to_string(),
                ));
            }
            SessionState::Failed => {
                return Err(Error::Other("agent session has failed".to_string()));
            }
        };

        let output = self.invoke(AgentRequest::Resume {
            handle: &handle,
            text,
        });
        match output.and_then(|output| parse_turn(&output)) {
            Ok((reported, text)) => {
                if reported != handle {
                    warn!(
                        handle = %handle,
                        reported = %reported,
                        "agent reported a different session id on resume; keeping the original"
                    );
                }
                Ok(AgentReply { text, handle })
            }
            Err(e) => {
                self.state = SessionState::Failed;
                Err(e)
            }
        }
    }

    fn invoke(&self, request: AgentRequest<'_>) -> Result<RunOutput> {
        self.runner.run(&AgentInvocation {
            working_dir: &self.settings.working_dir,
            sandbox: self.settings.sandbox,
            model: &self.settings.model,
            config_overrides: &self.settings.config_overrides,
            request,
        })
    }
}

/// Validate one turn's output: exit status first, then handle, then reply.
fn parse_turn(output: &RunOutput) -> Result<(SessionHandle, String)> {
    if output.exit_code != Some(0) {
        return Err(Error::ProcessFailed {
            code: output.exit_code,
            output: output.joined(),
        });
    }
    let handle = session_handle(&output.lines)?;
    let text = reply_text(&output.lines)?;
    Ok((handle, text))
}
