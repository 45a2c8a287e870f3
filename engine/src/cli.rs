//! CLI interface for JobPlanner
//!
//! This module provides the command-line interface using clap's derive API.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// JobPlanner
///
/// Breaks a request into tool steps (web search, local job listings), runs
/// them, and writes up the result.
#[derive(Parser, Debug)]
#[command(name = "jobplanner")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log: Option<String>,

    /// Specify alternate configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Plan and answer a request
    Plan {
        /// The request, e.g. "Create a 7-day learning plan for a Data Scientist"
        task: String,
    },

    /// Parse a job posting from a file and store it
    SaveJob {
        /// Text file with the job posting ("-" for stdin)
        file: PathBuf,
    },

    /// Store a job posting, then plan around it
    PlanWithJob {
        /// Text file with the job posting ("-" for stdin)
        file: PathBuf,

        /// What to plan for the job
        #[arg(long, short)]
        input: Option<String>,
    },

    /// Inspect stored jobs
    Jobs {
        #[command(subcommand)]
        action: JobsAction,
    },
}

/// Job store actions
#[derive(Subcommand, Debug)]
pub enum JobsAction {
    /// List all stored jobs
    List,

    /// Show one job by filename (without .json)
    Show { filename: String },

    /// Keyword search over title, description, location and requirements
    Search { criteria: String },
}
