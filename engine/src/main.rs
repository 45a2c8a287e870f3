// JobPlanner
// Main entry point for the jobplanner binary

use clap::Parser;
use jobplanner_engine::cli::{Cli, Command, JobsAction};
use jobplanner_engine::config::Config;
use jobplanner_engine::handlers::{
    handle_jobs_list, handle_jobs_search, handle_jobs_show, handle_plan, handle_plan_with_job,
    handle_save_job, OutputFormat,
};
use jobplanner_engine::telemetry::{init_telemetry, init_telemetry_with_level};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // An explicit --log wins over the config file
    let config = match &cli.log {
        Some(level) => {
            init_telemetry_with_level(level);
            load_config(&cli)?
        }
        None => {
            let config = load_config(&cli);
            match &config {
                Ok(config) => init_telemetry_with_level(&config.core.log_level),
                Err(_) => init_telemetry(),
            }
            config?
        }
    };

    tracing::info!("JobPlanner v{}", env!("CARGO_PKG_VERSION"));

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };

    match cli.command {
        Command::Plan { task } => handle_plan(task, &config, format).await,
        Command::SaveJob { file } => handle_save_job(&file, &config, format).await,
        Command::PlanWithJob { file, input } => {
            handle_plan_with_job(&file, input, &config, format).await
        }
        Command::Jobs { action } => match action {
            JobsAction::List => handle_jobs_list(&config, format).await,
            JobsAction::Show { filename } => handle_jobs_show(&filename, &config, format).await,
            JobsAction::Search { criteria } => {
                handle_jobs_search(&criteria, &config, format).await
            }
        },
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let config = match &cli.config {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load_or_create()?,
    };
    Ok(config)
}
