//! CLI argument structs for all commands.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use super::validators::{validate_depth, validate_name};

/// Arguments for the `init` command
#[derive(Parser, Debug, Clone)]
pub struct InitArgs {
    /// Suppress output
    #[arg(short, long)]
    pub quiet: bool,
}

/// Arguments for the `search` command
#[derive(Parser, Debug, Clone)]
pub struct SearchArgs {
    /// Case-insensitive text matched against names, types and observations
    pub query: String,
}

/// Arguments for the `open` command
#[derive(Parser, Debug, Clone)]
pub struct OpenArgs {
    /// Entity names to open
    #[arg(required = true, value_parser = validate_name)]
    pub names: Vec<String>,
}

/// Arguments for commands that take a single project
#[derive(Parser, Debug, Clone)]
pub struct ProjectArgs {
    /// Project name
    #[arg(value_parser = validate_name)]
    pub project: String,
}

/// Arguments for the `deps` command
#[derive(Parser, Debug, Clone)]
pub struct DepsArgs {
    /// Task name
    #[arg(value_parser = validate_name)]
    pub task: String,

    /// How many dependency hops to follow (default from config)
    #[arg(short, long, value_parser = validate_depth)]
    pub depth: Option<usize>,
}

/// Arguments for the `team` command
#[derive(Parser, Debug, Clone)]
pub struct TeamArgs {
    /// Team member name
    #[arg(value_parser = validate_name)]
    pub member: String,
}

/// Arguments for the `related` command
#[derive(Parser, Debug, Clone)]
pub struct RelatedArgs {
    /// Project name
    #[arg(value_parser = validate_name)]
    pub project: String,

    /// How many project hops to explore (default from config)
    #[arg(short, long, value_parser = validate_depth)]
    pub depth: Option<usize>,
}

/// Arguments for the `session` command
#[derive(Parser, Debug, Clone)]
pub struct SessionArgs {
    /// Session action
    #[command(subcommand)]
    pub action: SessionAction,
}

/// Session actions
#[derive(Subcommand, Debug, Clone)]
pub enum SessionAction {
    /// Start a new session and print its id
    Start,

    /// Show the recorded stages of a session
    Show {
        /// Session id
        #[arg(value_parser = validate_name)]
        id: String,
    },

    /// Submit one stage, read as JSON from a file or stdin
    Submit {
        /// File containing the stage submission (stdin if omitted)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}
