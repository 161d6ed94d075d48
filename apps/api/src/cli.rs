use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::{debug, info};

use crate::config::Config;
use crate::documents::read_document;
use crate::evaluation::report::build_report;
use crate::evaluation::survey::{group_by_job, load_model_results, load_survey};
use crate::llm_client::LlmClient;
use crate::matching::orchestrator::{CandidateInput, JobReport, JobWorkload, Orchestrator};
use crate::models::evaluation::ModelMatchingResult;

/// File stem of the job description inside each job directory.
const JOB_FILE_STEM: &str = "job";
const SUPPORTED_EXTENSIONS: [&str; 2] = ["pdf", "txt"];

#[derive(Parser, Debug)]
#[command(
    name = "screener",
    version,
    about = "CV screening: requirement matching, scoring and evaluation against human screeners"
)]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP API
    Serve(ServeArgs),
    /// Score every job directory under an input directory
    Score(ScoreArgs),
    /// Compare model results with a human survey export
    Evaluate(EvaluateArgs),
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Overrides PORT
    #[arg(long)]
    pub port: Option<u16>,
}

#[derive(Args, Debug)]
pub struct ScoreArgs {
    /// One subdirectory per job: a `job.pdf|txt` description plus one file per CV
    #[arg(short, long)]
    pub input_dir: PathBuf,

    #[arg(short, long, default_value = "model_results.json")]
    pub output: PathBuf,
}

#[derive(Args, Debug)]
pub struct EvaluateArgs {
    /// Survey export (`{"submissions": [...]}`)
    #[arg(long)]
    pub survey: PathBuf,

    /// Output of `screener score`
    #[arg(long)]
    pub model_results: PathBuf,

    /// Candidates per job every screener ranked; overrides PANEL_SIZE
    #[arg(long)]
    pub panel_size: Option<usize>,

    #[arg(short, long, default_value = "evaluation_report.json")]
    pub output: PathBuf,
}

/// Written by `score`, read back by `evaluate`.
#[derive(Debug, Serialize)]
pub struct ScoreOutput {
    pub jobs: Vec<JobReport>,
    pub model_results: Vec<ModelMatchingResult>,
}

pub async fn run_score(config: &Config, args: ScoreArgs) -> Result<()> {
    let ctx = Arc::new(config.run_context()?);
    let llm = LlmClient::new(config.require_api_key()?.to_string())?;
    let orchestrator = Orchestrator::new(Arc::new(llm), ctx);

    let jobs = discover_jobs(&args.input_dir).await?;
    info!("Scoring {} jobs from {}", jobs.len(), args.input_dir.display());

    let scorings = orchestrator.score_run(jobs).await;
    let output = ScoreOutput {
        jobs: scorings.iter().map(|s| s.report()).collect(),
        model_results: scorings.iter().filter_map(|s| s.model_result()).collect(),
    };
    write_json(&args.output, &output).await
}

pub async fn run_evaluate(config: &Config, args: EvaluateArgs) -> Result<()> {
    let panel_size = args.panel_size.unwrap_or(config.panel_size);
    let survey = load_survey(&args.survey).await?;
    let model_results = load_model_results(&args.model_results).await?;

    let report = build_report(&group_by_job(survey.submissions), &model_results, panel_size);
    write_json(&args.output, &report).await
}

/// Reads every job directory under `input_dir`, sorted by name.
pub async fn discover_jobs(input_dir: &Path) -> Result<Vec<JobWorkload>> {
    let mut job_dirs = Vec::new();
    let mut entries = tokio::fs::read_dir(input_dir)
        .await
        .with_context(|| format!("Failed to read input directory {}", input_dir.display()))?;
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await?.is_dir() {
            job_dirs.push(entry.path());
        }
    }
    job_dirs.sort();

    let mut jobs = Vec::with_capacity(job_dirs.len());
    for dir in job_dirs {
        jobs.push(read_job_dir(&dir).await?);
    }
    Ok(jobs)
}

async fn read_job_dir(dir: &Path) -> Result<JobWorkload> {
    let job_id = dir
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("Invalid job directory {}", dir.display()))?
        .to_string();

    let mut files = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let supported = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| SUPPORTED_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
            .unwrap_or(false);
        if entry.file_type().await?.is_file() && supported {
            files.push(path);
        } else {
            debug!("Skipping {}", path.display());
        }
    }
    files.sort();

    let mut job_text = None;
    let mut candidates = Vec::new();
    for path in files {
        let (name, text) = read_document(&path).await?;
        if name == JOB_FILE_STEM {
            if job_text.is_some() {
                bail!(
                    "Job directory {} has more than one {JOB_FILE_STEM}.* description",
                    dir.display()
                );
            }
            job_text = Some(text);
        } else {
            candidates.push(CandidateInput {
                name,
                cv_text: text,
            });
        }
    }

    let job_text = job_text.with_context(|| {
        format!("Job directory {} has no {JOB_FILE_STEM}.pdf or {JOB_FILE_STEM}.txt", dir.display())
    })?;
    let workload = JobWorkload {
        job_id,
        job_text,
        candidates,
    };
    if let Some(name) = workload.duplicate_candidate() {
        bail!(
            "Job directory {} has more than one CV named '{name}'",
            dir.display()
        );
    }
    Ok(workload)
}

async fn write_json(path: &Path, value: &impl Serialize) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    tokio::fs::write(path, json)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    info!("Wrote {}", path.display());
    Ok(())
}
