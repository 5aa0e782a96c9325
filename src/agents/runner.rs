//! Invocation of the external agent process.
//!
//! One process is spawned per turn. Its stdout and stderr share a single pipe
//! so records are read in emission order, and the whole output is buffered
//! before the caller parses it.

use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::{debug, info, trace, warn};

use crate::agents::definitions::SandboxPolicy;
use crate::agents::events::SessionHandle;
use crate::{Error, Result};

/// Default agent executable.
pub const DEFAULT_AGENT_BIN: &str = "codex";

/// What the agent is asked to do on this invocation.
#[derive(Debug, Clone, Copy)]
pub enum AgentRequest<'a> {
    /// Open a new conversation with the fully rendered instruction.
    Start { instruction: &'a str },
    /// Continue an existing conversation.
    Resume {
        handle: &'a SessionHandle,
        text: &'a str,
    },
}

/// Everything needed to run one agent turn.
#[derive(Debug, Clone, Copy)]
pub struct AgentInvocation<'a> {
    pub working_dir: &'a Path,
    pub sandbox: SandboxPolicy,
    pub model: &'a str,
    pub config_overrides: &'a [String],
    pub request: AgentRequest<'a>,
}

/// Materialized output of one agent process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOutput {
    /// Exit code, `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
    /// Combined stdout/stderr, one entry per line.
    pub lines: Vec<String>,
}

impl RunOutput {
    pub fn joined(&self) -> String {
        self.lines.join("\n")
    }
}

/// Runs agent turns. The production implementation spawns a subprocess.
pub trait AgentRunner: Send + Sync {
    fn run(&self, invocation: &AgentInvocation<'_>) -> Result<RunOutput>;
}

/// Runs turns through the `codex exec` command line.
#[derive(Debug, Clone)]
pub struct CodexRunner {
    program: PathBuf,
}

impl CodexRunner {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Command-line arguments for one invocation.
    pub fn build_args(invocation: &AgentInvocation<'_>) -> Vec<String> {
        let mut args = vec![
            "exec".to_string(),
            "--cd".to_string(),
            invocation.working_dir.display().to_string(),
            "--sandbox".to_string(),
            invocation.sandbox.codex_flag().to_string(),
            "--model".to_string(),
            invocation.model.to_string(),
        ];
        for option in invocation.config_overrides {
            args.push("--config".to_string());
            args.push(option.clone());
        }
        args.push("--json".to_string());
        match invocation.request {
            AgentRequest::Start { instruction } => args.push(instruction.to_string()),
            AgentRequest::Resume { handle, text } => {
                args.push("resume".to_string());
                args.push(handle.as_str().to_string());
                args.push(text.to_string());
            }
        }
        args
    }
}

impl Default for CodexRunner {
    fn default() -> Self {
        Self::new(DEFAULT_AGENT_BIN)
    }
}

impl AgentRunner for CodexRunner {
    fn run(&self, invocation: &AgentInvocation<'_>) -> Result<RunOutput> {
        let program = self.program.display().to_string();
        let spawn_error = |source: std::io::Error| Error::Spawn {
            program: program.clone(),
            source,
        };

        let args = Self::build_args(invocation);
        info!(
            program = %program,
            working_dir = %invocation.working_dir.display(),
            sandbox = %invocation.sandbox,
            model = invocation.model,
            resume = matches!(invocation.request, AgentRequest::Resume { .. }),
            "invoking agent"
        );
        trace!(?args, "agent arguments");

        let (reader, writer) = std::io::pipe().map_err(spawn_error)?;
        let stderr_writer = writer.try_clone().map_err(spawn_error)?;

        let mut command = Command::new(&self.program);
        command
            .args(&args)
            .stdin(Stdio::null())
            .stdout(writer)
            .stderr(stderr_writer);

        // Keep terminal interrupts away from the agent while a turn is in flight.
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }

        let mut child = command.spawn().map_err(spawn_error)?;
        // The command still owns the write ends; drop it so the pipe reaches EOF.
        drop(command);

        let lines = match read_lines(reader) {
            Ok(lines) => lines,
            Err(e) => {
                warn!(error = %e, "failed to read agent output, stopping agent");
                let _ = child.kill();
                let _ = child.wait();
                return Err(e.into());
            }
        };

        let status = child.wait()?;
        debug!(
            exit_code = ?status.code(),
            lines = lines.len(),
            "agent process exited"
        );

        Ok(RunOutput {
            exit_code: status.code(),
            lines,
        })
    }
}

/// Read `reader` to the end as lossily decoded lines without terminators.
fn read_lines(reader: impl Read) -> std::io::Result<Vec<String>> {
    let mut reader = BufReader::new(reader);
    let mut lines = Vec::new();
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        let line = String::from_utf8_lossy(&buf);
        lines.push(line.trim_end_matches(['\r', '\n']).to_string());
    }
    Ok(lines)
}
