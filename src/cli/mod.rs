//! CLI argument definitions for Socratic.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Version string with build metadata, e.g. `0.1.0 (a1b2c3d 2026-01-01T00:00:00Z)`.
pub const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("SOCRATIC_GIT_COMMIT"),
    " ",
    env!("SOCRATIC_BUILD_TIMESTAMP"),
    ")"
);

/// Socratic - grow a markdown knowledge base through conversations with a coding agent.
///
/// Create a project with `socratic init`, then build its knowledge base with
/// `socratic synthesize`.
#[derive(Parser, Debug)]
#[command(name = "socratic")]
#[command(author, version, long_version = LONG_VERSION, about, long_about = None)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Directory holding all projects
    #[arg(long, global = true, env = "SOCRATIC_PROJECTS_DIR", default_value = "projects")]
    pub projects_dir: PathBuf,

    /// Provider configuration file
    #[arg(long, global = true, env = "SOCRATIC_ENV_FILE", default_value = ".env")]
    pub env_file: PathBuf,

    /// Agent executable to run
    #[arg(long, global = true, env = "SOCRATIC_AGENT_BIN", default_value = "codex")]
    pub agent_bin: PathBuf,

    /// Print command results as JSON (non-interactive commands only)
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Arguments shared by every project command.
#[derive(Args, Debug, Clone)]
pub struct ProjectArgs {
    /// Project name; must match a directory under the projects root
    #[arg(short, long)]
    pub project: String,
}

/// Arguments shared by the conversational commands.
#[derive(Args, Debug, Clone)]
pub struct SessionArgs {
    #[command(flatten)]
    pub project: ProjectArgs,

    /// Plain output for programs driving the session; promotion is left to `socratic promote`
    #[arg(long)]
    pub plain: bool,
}

/// Export formats.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// All units concatenated into one markdown file
    Agentmd,
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a new project for a directory of source documents
    Init {
        #[command(flatten)]
        project: ProjectArgs,

        /// Directory with the source documents
        #[arg(short, long)]
        source_dir: PathBuf,
    },

    /// Build and extend the knowledge base from the source documents
    Synthesize(SessionArgs),

    /// Reorganize the knowledge base for readability
    Digest(SessionArgs),

    /// Investigate an issue against the knowledge base and record findings
    Triage(SessionArgs),

    /// Ask questions about the knowledge base (read-only)
    Ask(SessionArgs),

    /// Plan a change with the agent, then apply it (type DONE to finish)
    Update(SessionArgs),

    /// Compose selected units into a prompt snippet
    Compose {
        #[command(flatten)]
        project: ProjectArgs,

        /// Comma-separated unit ids (e.g. 1,3,7)
        #[arg(long, conflicts_with = "all")]
        units: Option<String>,

        /// Use every unit
        #[arg(long)]
        all: bool,
    },

    /// Write one research note per topic using parallel agent sessions
    Research {
        #[command(flatten)]
        project: ProjectArgs,

        /// File with one topic per line
        #[arg(long)]
        topics: PathBuf,

        /// Number of concurrent agent sessions
        #[arg(short = 'n', long, default_value_t = 4, value_parser = clap::value_parser!(u16).range(1..))]
        workers: u16,
    },

    /// Export the knowledge base as a single file
    Export {
        #[command(flatten)]
        project: ProjectArgs,

        /// Output format
        #[arg(long, value_enum, default_value = "agentmd")]
        format: ExportFormat,
    },

    /// Show what promoting the working copy would change
    Diff(ProjectArgs),

    /// Promote the agent's working copy into the project's knowledge base
    Promote(ProjectArgs),
}

impl Commands {
    /// Command name and arguments for the audit log.
    pub fn describe(&self) -> (&'static str, Option<&str>, serde_json::Value) {
        match self {
            Commands::Init {
                project,
                source_dir,
            } => (
                "init",
                Some(project.project.as_str()),
                serde_json::json!({ "project": project.project, "source_dir": source_dir }),
            ),
            Commands::Synthesize(args) => ("synthesize", Some(args.project.project.as_str()), session_json(args)),
            Commands::Digest(args) => ("digest", Some(args.project.project.as_str()), session_json(args)),
            Commands::Triage(args) => ("triage", Some(args.project.project.as_str()), session_json(args)),
            Commands::Ask(args) => ("ask", Some(args.project.project.as_str()), session_json(args)),
            Commands::Update(args) => ("update", Some(args.project.project.as_str()), session_json(args)),
            Commands::Compose {
                project,
                units,
                all,
            } => (
                "compose",
                Some(project.project.as_str()),
                serde_json::json!({ "project": project.project, "units": units, "all": all }),
            ),
            Commands::Research {
                project,
                topics,
                workers,
            } => (
                "research",
                Some(project.project.as_str()),
                serde_json::json!({ "project": project.project, "topics": topics, "workers": workers }),
            ),
            Commands::Export { project, format } => (
                "export",
                Some(project.project.as_str()),
                serde_json::json!({ "project": project.project, "format": format!("{:?}", format).to_lowercase() }),
            ),
            Commands::Diff(project) => (
                "diff",
                Some(project.project.as_str()),
                serde_json::json!({ "project": project.project }),
            ),
            Commands::Promote(project) => (
                "promote",
                Some(project.project.as_str()),
                serde_json::json!({ "project": project.project }),
            ),
        }
    }
}

fn session_json(args: &SessionArgs) -> serde_json::Value {
    serde_json::json!({ "project": args.project.project, "plain": args.plain })
}
