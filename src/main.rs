//! Socratic CLI - grow a markdown knowledge base through conversations with a coding agent.

use std::process;
use std::time::Instant;

use clap::Parser;
use socratic::agents::{CodexRunner, SessionMode, embedded};
use socratic::cli::{Cli, Commands, ExportFormat, SessionArgs};
use socratic::commands::{self, Output, UnitSelection};
use socratic::config::{ResolvedConfig, load_config};
use socratic::llm::ChatCompletionClient;
use socratic::project::Project;
use socratic::ui::{ConsoleIo, OutputStyle, use_color};
use socratic::{action_log, logging, ui};
use tracing::warn;

fn main() {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);
    if let Err(e) = ui::install_interrupt_handler() {
        warn!(error = %e, "continuing without interrupt handling");
    }

    let (cmd_name, project, args_json) = cli.command.describe();
    let project = project.map(str::to_string);

    let start = Instant::now();
    let result = run_command(&cli);
    let duration = start.elapsed().as_millis() as u64;

    action_log::log_action(
        &cli.projects_dir,
        cmd_name,
        project.as_deref(),
        args_json,
        result.as_ref().err().map(|e| e.to_string()),
        duration,
    );

    if let Err(e) = result {
        eprintln!("socratic: error: {}: {}", e.category(), e);
        if let Some(output) = e.captured_output().filter(|o| !o.trim().is_empty()) {
            eprintln!("--- agent output ---\n{}", output.trim_end());
        }
        process::exit(1);
    }
}

fn run_command(cli: &Cli) -> Result<(), socratic::Error> {
    let json = cli.json;
    let root = cli.projects_dir.as_path();

    match &cli.command {
        Commands::Init {
            project,
            source_dir,
        } => {
            let result = commands::init(root, &project.project, source_dir)?;
            output(&result, json);
        }

        Commands::Synthesize(args) => {
            session(cli, args, embedded::synthesize(), SessionMode::mirrored(args.plain))?
        }
        Commands::Digest(args) => {
            session(cli, args, embedded::digest(), SessionMode::mirrored(args.plain))?
        }
        Commands::Triage(args) => {
            session(cli, args, embedded::triage(), SessionMode::mirrored(args.plain))?
        }
        Commands::Ask(args) => session(cli, args, embedded::ask(), SessionMode::ReadOnly)?,

        Commands::Update(args) => {
            let (project, config) = open(cli, &args.project.project)?;
            let runner = CodexRunner::new(&cli.agent_bin);
            let transform = ChatCompletionClient::from_config(&config);
            let mut io = ConsoleIo::new(OutputStyle::from_plain_flag(args.plain));
            let outcome =
                commands::run_update(&project, &config, &runner, &transform, &mut io, !args.plain)?;
            output(&outcome, json);
        }

        Commands::Compose {
            project,
            units,
            all,
        } => {
            let (project, config) = open(cli, &project.project)?;
            let transform = ChatCompletionClient::from_config(&config);
            let selection = UnitSelection::from_args(units.as_deref(), *all);
            let mut io = ConsoleIo::new(OutputStyle::Fancy);
            let result = commands::compose(&project, &transform, &selection, &mut io)?;
            output(&result, json);
        }

        Commands::Research {
            project,
            topics,
            workers,
        } => {
            let (project, config) = open(cli, &project.project)?;
            let topics = commands::read_topics(topics)?;
            let runner = CodexRunner::new(&cli.agent_bin);
            let report =
                commands::research(&project, &config, &runner, &topics, usize::from(*workers))?;
            output(&report, json);
            report.ensure_complete()?;
        }

        Commands::Export { project, format } => {
            let project = Project::open(root, &project.project)?;
            let result = match format {
                ExportFormat::Agentmd => commands::export(&project)?,
            };
            output(&result, json);
        }

        Commands::Diff(args) => {
            let project = Project::open(root, &args.project)?;
            let result = commands::diff(&project, color(json))?;
            output(&result, json);
        }

        Commands::Promote(args) => {
            let project = Project::open(root, &args.project)?;
            let result = commands::promote(&project, color(json))?;
            output(&result, json);
        }
    }

    Ok(())
}

/// Open the named project and load the provider configuration.
fn open(cli: &Cli, name: &str) -> Result<(Project, ResolvedConfig), socratic::Error> {
    let project = Project::open(&cli.projects_dir, name)?;
    let config = load_config(&cli.env_file)?;
    Ok((project, config))
}

fn session(
    cli: &Cli,
    args: &SessionArgs,
    role: socratic::agents::RoleDefinition,
    mode: SessionMode,
) -> Result<(), socratic::Error> {
    let (project, config) = open(cli, &args.project.project)?;
    let runner = CodexRunner::new(&cli.agent_bin);
    let mut io = ConsoleIo::new(OutputStyle::from_plain_flag(args.plain));
    commands::run_session(&project, &config, &runner, &role, mode, &mut io)?;
    Ok(())
}

fn color(json: bool) -> bool {
    !json && use_color(OutputStyle::Fancy)
}

/// Print output in JSON or human-readable format.
fn output<T: Output>(result: &T, json: bool) {
    if json {
        println!("{}", result.to_json());
    } else {
        println!("{}", result.to_human());
    }
}
