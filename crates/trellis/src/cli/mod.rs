//! CLI argument parsing and command dispatch.
//!
//! # Commands
//!
//! - `init`: Initialize a new trellis workspace
//! - `search`, `open`: Query the graph
//! - `overview`, `deps`, `team`, `milestones`, `timeline`, `resources`,
//!   `risks`, `related`, `decisions`, `health`: Analytics
//! - `sessions`, `session`: Inspect and drive update sessions
//!
//! Every command prints one JSON document: the success payload, or
//! `{"success": false, "error": ..., "kind": ...}` with a non-zero exit code.

mod args;
mod execute;
mod validators;

use anyhow::Result;
use clap::{Parser, Subcommand};
use serde_json::Value;
use std::path::Path;
use std::process::ExitCode;

pub use args::{
    DepsArgs, InitArgs, OpenArgs, ProjectArgs, RelatedArgs, SearchArgs, SessionAction,
    SessionArgs, TeamArgs,
};
pub use validators::{validate_depth, validate_name};

use crate::app::App;
use crate::output::{self, OutputMode};

/// Trellis - a project knowledge graph
///
/// Projects, tasks, milestones, people and the relations between them are
/// stored in `.trellis/graph.jsonl` for easy version control integration.
#[derive(Parser, Debug)]
#[command(name = "trellis")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Print JSON on a single line
    #[arg(long, global = true)]
    pub compact: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Initialize a new trellis workspace
    ///
    /// Creates the `.trellis/` directory with configuration, an empty graph
    /// and an empty sessions file.
    Init(InitArgs),

    /// Search entities by name, type or observation text
    Search(SearchArgs),

    /// Show named entities and the relations between them
    Open(OpenArgs),

    /// Show a project with its tasks, milestones, team and summary counts
    Overview(ProjectArgs),

    /// Show a task's dependency neighbourhood and critical path
    Deps(DepsArgs),

    /// Show a team member's task assignments
    Team(TeamArgs),

    /// Show milestone progress for a project
    Milestones(ProjectArgs),

    /// Show a project's dated events in order
    Timeline(ProjectArgs),

    /// Show resource usage for a project
    Resources(ProjectArgs),

    /// Show scored risks for a project
    Risks(ProjectArgs),

    /// Find projects connected through shared people, resources or dependencies
    Related(RelatedArgs),

    /// Show the decision log of a project
    Decisions(ProjectArgs),

    /// Score a project's health
    Health(ProjectArgs),

    /// List update sessions
    Sessions,

    /// Start, inspect or advance an update session
    Session(SessionArgs),
}

impl Cli {
    /// Parse CLI arguments from command line
    pub fn parse_args() -> Self {
        <Self as Parser>::parse()
    }

    /// Parse CLI arguments from an iterator (for testing)
    ///
    /// # Errors
    ///
    /// Returns the clap error for invalid arguments.
    pub fn try_parse_from<I, T>(iter: I) -> std::result::Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(iter)
    }

    /// Execute the CLI command and print its result.
    ///
    /// # Errors
    ///
    /// Returns an error only when the working directory cannot be read or
    /// stdout cannot be written. Command failures are printed and reported
    /// through the exit code.
    pub async fn execute(&self) -> Result<ExitCode> {
        let mode = if self.compact {
            OutputMode::Compact
        } else {
            OutputMode::Pretty
        };
        let Some(command) = &self.command else {
            println!("Trellis project knowledge graph");
            println!("Use --help for more information");
            return Ok(ExitCode::SUCCESS);
        };

        let current_dir = std::env::current_dir()?;
        match run(command, &current_dir).await {
            Ok(Some(value)) => {
                output::print_json(&value, mode)?;
                Ok(ExitCode::SUCCESS)
            }
            Ok(None) => Ok(ExitCode::SUCCESS),
            Err(e) => {
                tracing::debug!(error = %e, "Command failed");
                output::print_json(&e.to_failure(), mode)?;
                Ok(ExitCode::FAILURE)
            }
        }
    }
}

async fn run(command: &Commands, dir: &Path) -> crate::error::Result<Option<Value>> {
    let value = match command {
        Commands::Init(args) => return execute::execute_init(dir, args).await,
        Commands::Search(args) => execute::execute_search(&open(dir).await?, args).await?,
        Commands::Open(args) => execute::execute_open(&open(dir).await?, args).await?,
        Commands::Overview(args) => execute::execute_overview(&open(dir).await?, args).await?,
        Commands::Deps(args) => execute::execute_deps(&open(dir).await?, args).await?,
        Commands::Team(args) => execute::execute_team(&open(dir).await?, args).await?,
        Commands::Milestones(args) => execute::execute_milestones(&open(dir).await?, args).await?,
        Commands::Timeline(args) => execute::execute_timeline(&open(dir).await?, args).await?,
        Commands::Resources(args) => execute::execute_resources(&open(dir).await?, args).await?,
        Commands::Risks(args) => execute::execute_risks(&open(dir).await?, args).await?,
        Commands::Related(args) => execute::execute_related(&open(dir).await?, args).await?,
        Commands::Decisions(args) => execute::execute_decisions(&open(dir).await?, args).await?,
        Commands::Health(args) => execute::execute_health(&open(dir).await?, args).await?,
        Commands::Sessions => execute::execute_sessions(&open(dir).await?).await?,
        Commands::Session(args) => {
            execute::execute_session(&open(dir).await?, &args.action).await?
        }
    };
    Ok(Some(value))
}

async fn open(dir: &Path) -> crate::error::Result<App> {
    App::from_directory(dir).await
}
