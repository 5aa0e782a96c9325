//! Common test utilities for socratic integration tests.
//!
//! Provides `TestEnv` for isolated test environments: a throwaway projects
//! root, a source directory, a `.env` file and (on Unix) a fake agent script
//! that speaks the agent's JSONL protocol.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
pub use tempfile::TempDir;

/// Default configuration: the `chatgpt` provider needs no credential.
pub const CHATGPT_ENV: &str = "MODEL=gpt-5\nPROVIDER=chatgpt\n";

/// Shell script standing in for the agent executable.
///
/// A new session writes `001_start.md` and replies "Started."; a resumed one
/// writes `002_followup.md` and replies "Followed up.". Every invocation
/// appends `start|resume <handle>` and the sandbox to `$FAKE_AGENT_LOG`.
/// `FAKE_AGENT_MODE=fail` exits non-zero, `garbage` prints non-JSON output.
const FAKE_AGENT: &str = r#"#!/bin/sh
dir=""
sandbox=""
resume=""
last=""
while [ $# -gt 0 ]; do
  case "$1" in
    --cd) dir="$2"; shift 2 ;;
    --sandbox) sandbox="$2"; shift 2 ;;
    resume) resume="$2"; shift 2 ;;
    *) last="$1"; shift ;;
  esac
done

case "$FAKE_AGENT_MODE" in
  fail) echo "boom: model unavailable"; exit 3 ;;
  garbage) echo "this is not json"; exit 0 ;;
esac

cd "$dir" || exit 2
if [ -n "$FAKE_AGENT_LOG" ]; then
  if [ -n "$resume" ]; then
    echo "resume $resume $sandbox" >> "$FAKE_AGENT_LOG"
  else
    echo "start $sandbox" >> "$FAKE_AGENT_LOG"
  fi
fi

echo '{"type":"thread.started","thread_id":"th_fake"}'
echo "warning: stderr noise" 1>&2
if [ -n "$resume" ]; then
  if [ "$sandbox" = "workspace-write" ]; then
    printf '%s\n' "$last" > 002_followup.md
  fi
  echo '{"type":"item.completed","item":{"id":"item_2","type":"agent_message","text":"Followed up."}}'
else
  if [ "$sandbox" = "workspace-write" ]; then
    echo "Started." > 001_start.md
  fi
  echo '{"type":"item.completed","item":{"id":"item_1","type":"agent_message","text":"Started."}}'
fi
echo '{"type":"turn.completed","usage":{"input_tokens":10,"output_tokens":2}}'
"#;

/// A test environment with an isolated projects root.
pub struct TestEnv {
    pub dir: TempDir,
}

impl TestEnv {
    /// Create a new test environment with a `chatgpt` configuration.
    pub fn new() -> Self {
        let env = Self {
            dir: TempDir::new().unwrap(),
        };
        fs::create_dir_all(env.source_dir()).unwrap();
        env.write_env(CHATGPT_ENV);
        env
    }

    /// Create a new test environment with an initialized project `demo`.
    pub fn with_project() -> Self {
        let env = Self::new();
        env.socratic()
            .args(["init", "--project", "demo", "--source-dir"])
            .arg(env.source_dir())
            .assert()
            .success();
        env
    }

    pub fn projects_dir(&self) -> PathBuf {
        self.dir.path().join("projects")
    }

    pub fn source_dir(&self) -> PathBuf {
        self.dir.path().join("source")
    }

    pub fn env_file(&self) -> PathBuf {
        self.dir.path().join(".env")
    }

    pub fn project_dir(&self) -> PathBuf {
        self.projects_dir().join("demo")
    }

    /// The durable tree of project `demo`.
    pub fn durable_kb(&self) -> PathBuf {
        self.project_dir().join("knowledge_base")
    }

    /// The working copy exposed to the agent.
    pub fn ephemeral_kb(&self) -> PathBuf {
        self.source_dir().canonicalize().unwrap().join("knowledge_base")
    }

    pub fn agent_log(&self) -> PathBuf {
        self.dir.path().join("agent.log")
    }

    pub fn write_env(&self, content: &str) {
        fs::write(self.env_file(), content).unwrap();
    }

    /// Get a Command for the socratic binary, isolated to this environment.
    ///
    /// Paths are passed per-command through environment variables, making
    /// tests parallel-safe. The audit log stays off unless a test enables it.
    pub fn socratic(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_socratic"));
        cmd.current_dir(self.dir.path());
        cmd.env("SOCRATIC_PROJECTS_DIR", self.projects_dir());
        cmd.env("SOCRATIC_ENV_FILE", self.env_file());
        cmd.env("SOCRATIC_ACTION_LOG", "0");
        cmd.env("NO_COLOR", "1");
        cmd.env_remove("SOCRATIC_LOG");
        cmd
    }

    /// Install the fake agent and point `SOCRATIC_AGENT_BIN` at it.
    #[cfg(unix)]
    pub fn socratic_with_agent(&self) -> Command {
        let agent = self.install_fake_agent();
        let mut cmd = self.socratic();
        cmd.env("SOCRATIC_AGENT_BIN", agent);
        cmd.env("FAKE_AGENT_LOG", self.agent_log());
        cmd
    }

    #[cfg(unix)]
    pub fn install_fake_agent(&self) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = self.dir.path().join("fake-agent.sh");
        if !path.exists() {
            fs::write(&path, FAKE_AGENT).unwrap();
            fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        }
        path
    }

    /// Lines the fake agent logged, one per invocation.
    pub fn agent_calls(&self) -> Vec<String> {
        fs::read_to_string(self.agent_log())
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

/// Write `files` (relative path, content) under `root`.
pub fn write_tree(root: &Path, files: &[(&str, &str)]) {
    fs::create_dir_all(root).unwrap();
    for (name, content) in files {
        fs::write(root.join(name), content).unwrap();
    }
}
