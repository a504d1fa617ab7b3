use std::process::ExitCode;

use clap::{Parser, Subcommand};

use sisyphus::commands::config::ConfigArgs;
use sisyphus::commands::detect_mode::DetectModeArgs;
use sisyphus::commands::format_output::FormatOutputArgs;
use sisyphus::commands::prompt::PromptArgs;
use sisyphus::commands::replay::ReplayCommitsArgs;
use sisyphus::commands::substitute::SubstituteArgs;
use sisyphus::commands::threads::{FetchThreadsArgs, ResolveThreadArgs};
use sisyphus::commands::vars::VarsArgs;
use sisyphus::{error, telemetry};

#[derive(Debug, Parser)]
#[command(
    name = "sisyphus",
    version,
    about = "Workflow helpers for running an AI coding agent on GitHub"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Fill {{ var }} placeholders in a template read from stdin
    Substitute(SubstituteArgs),
    /// Print merged prompt variables as JSON
    Vars(VarsArgs),
    /// Print the prompt template for a mode
    Prompt(PromptArgs),
    /// Decide whether this run is a review or agent run
    DetectMode(DetectModeArgs),
    /// Write agent credentials and behavior config
    Config(ConfigArgs),
    /// List unresolved review threads on a pull request
    FetchThreads(FetchThreadsArgs),
    /// Resolve (or reopen) a review thread
    ResolveThread(ResolveThreadArgs),
    /// Run the agent and format its JSON event stream as log groups
    FormatOutput(FormatOutputArgs),
    /// Replay local commits as signed commits and open a pull request
    ReplayCommits(ReplayCommitsArgs),
}

impl Commands {
    const fn name(&self) -> &'static str {
        match self {
            Self::Substitute(_) => "substitute",
            Self::Vars(_) => "vars",
            Self::Prompt(_) => "prompt",
            Self::DetectMode(_) => "detect-mode",
            Self::Config(_) => "config",
            Self::FetchThreads(_) => "fetch-threads",
            Self::ResolveThread(_) => "resolve-thread",
            Self::FormatOutput(_) => "format-output",
            Self::ReplayCommits(_) => "replay-commits",
        }
    }
}

fn main() -> ExitCode {
    let _telemetry = telemetry::init();

    let cli = Cli::parse();

    let _span = tracing::info_span!("command", name = cli.command.name()).entered();

    let result = match cli.command {
        Commands::Substitute(args) => args.execute(),
        Commands::Vars(args) => args.execute(),
        Commands::Prompt(args) => args.execute(),
        Commands::DetectMode(args) => args.execute(),
        Commands::Config(args) => args.execute(),
        Commands::FetchThreads(args) => args.execute(),
        Commands::ResolveThread(args) => args.execute(),
        Commands::FormatOutput(args) => args.execute(),
        Commands::ReplayCommits(args) => args.execute(),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            e.downcast_ref::<error::ExitError>()
                .map_or(ExitCode::FAILURE, error::ExitError::exit_code)
        }
    }
}
