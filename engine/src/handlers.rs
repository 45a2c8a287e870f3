//! Command handlers for CLI operations
//!
//! This module implements the handlers for all CLI commands:
//! - plan: Run the planner loop for a request
//! - save-job: Parse and store a job posting
//! - plan-with-job: Store a posting, then plan around it
//! - jobs list/show/search: Read the job store

use anyhow::{Context, Result};
use sdk::errors::EngineErrorExt;
use serde_json::json;
use std::io::Read;
use std::path::Path;

use crate::config::{Config, ExtractorKind};
use crate::conductor::{RunFailure, RunOutput};
use crate::jobs::{JobExtractor, JobStore};
use crate::llm::build_provider;
use crate::service::JobPlanner;

/// Output format for command results
#[derive(Debug, Clone, Copy)]
pub enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output for machine consumption
    Json,
}

/// Run the full plan → execute → synthesize loop and print the answer
pub async fn handle_plan(task: String, config: &Config, format: OutputFormat) -> Result<()> {
    let planner = JobPlanner::from_config(config)?;

    if let OutputFormat::Text = format {
        println!("Planning: {}", task);
        println!();
    }

    let run = planner.plan(&task).await.map_err(report_failure)?;
    print_run(&run, format)
}

/// Parse a job posting file and store it
pub async fn handle_save_job(file: &Path, config: &Config, format: OutputFormat) -> Result<()> {
    let text = read_input(file)?;
    let store = JobStore::new(config.core.jobs_dir.clone())?;

    let extractor = match config.jobs.extractor {
        ExtractorKind::Heuristic => JobExtractor::Heuristic,
        ExtractorKind::Llm => JobExtractor::Llm(build_provider(&config.llm)?),
    };

    let job = extractor.extract(&text).await?;
    let filename = store.save(&job).await?;

    match format {
        OutputFormat::Text => {
            println!("✓ Saved {} at {} as {}", job.title, job.company, filename);
            println!("  {}", store.dir().join(format!("{}.json", filename)).display());
        }
        OutputFormat::Json => {
            let output = json!({
                "success": true,
                "filename": filename,
                "job_data": job,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }
    Ok(())
}

/// Store a posting, then plan around it
pub async fn handle_plan_with_job(
    file: &Path,
    input: Option<String>,
    config: &Config,
    format: OutputFormat,
) -> Result<()> {
    let text = read_input(file)?;
    let planner = JobPlanner::from_config(config)?;

    let planned = planner
        .plan_with_job(&text, input.as_deref())
        .await
        .map_err(report_failure)?;

    match format {
        OutputFormat::Text => {
            println!("✓ Saved job as {}", planned.filename);
            println!();
            print_run(&planned.run, format)
        }
        OutputFormat::Json => {
            let output = json!({
                "success": true,
                "filename": planned.filename,
                "job_data": planned.job,
                "final_output": planned.run.final_output,
                "intermediate_messages": planned.run.intermediate_results,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(())
        }
    }
}

/// List every stored job
pub async fn handle_jobs_list(config: &Config, format: OutputFormat) -> Result<()> {
    let store = JobStore::new(config.core.jobs_dir.clone())?;
    print_text(&store.list_all().await?, format)
}

/// Show one stored job
pub async fn handle_jobs_show(filename: &str, config: &Config, format: OutputFormat) -> Result<()> {
    let store = JobStore::new(config.core.jobs_dir.clone())?;

    match format {
        OutputFormat::Text => {
            println!("{}", store.get_by_filename(filename).await?);
            Ok(())
        }
        OutputFormat::Json => {
            let record = store
                .load_record(filename)
                .await?
                .with_context(|| format!("Job file '{}.json' not found", filename))?;
            println!("{}", serde_json::to_string_pretty(&record)?);
            Ok(())
        }
    }
}

/// Keyword search over stored jobs
pub async fn handle_jobs_search(criteria: &str, config: &Config, format: OutputFormat) -> Result<()> {
    let store = JobStore::new(config.core.jobs_dir.clone())?;
    print_text(&store.search_by_criteria(criteria).await?, format)
}

fn print_run(run: &RunOutput, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            println!("Plan:");
            for (i, step) in run.plan.iter().enumerate() {
                println!("  {}. {}", i + 1, step);
            }
            println!();
            println!("{}", run.final_output);
            println!();
            println!("✓ {} steps executed", run.intermediate_results.len());
        }
        OutputFormat::Json => {
            let output = json!({
                "final_output": run.final_output,
                "intermediate_messages": run.intermediate_results,
                "plan": run.plan,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }
    Ok(())
}

fn print_text(text: &str, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => println!("{}", text),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&json!({ "result": text }))?),
    }
    Ok(())
}

/// Print the hint for an aborted run and turn it into an anyhow error
fn report_failure(failure: RunFailure) -> anyhow::Error {
    eprintln!("Hint: {}", failure.source.user_hint());
    if !failure.intermediate_results.is_empty() {
        eprintln!(
            "{} step(s) completed before the failure",
            failure.intermediate_results.len()
        );
    }
    anyhow::Error::new(failure)
}

/// Read a posting from `path`, or stdin when `path` is `-`
fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read job posting from stdin")?;
        return Ok(text);
    }
    std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read job posting from {}", path.display()))
}

