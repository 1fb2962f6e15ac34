//! Status and cancel command implementations.

use anyhow::{Context, Result};
use console::style;
use tracing::info;

use entangle_adapter_ibm::{IbmClient, IbmEstimator};
use entangle_hal::{Estimator, EstimatorOptions, JobId, JobStatus};

use super::common::{Account, JobLedger, resolve_credentials, state_dir};

/// Execute the status command.
pub async fn execute(job_id: Option<&str>, all: bool) -> Result<()> {
    let dir = state_dir()?;
    let ledger = JobLedger::load(&dir)?;

    if all {
        if ledger.jobs.is_empty() {
            println!("No jobs recorded.");
            return Ok(());
        }

        println!("{} {} job(s):\n", style("→").cyan().bold(), ledger.jobs.len());

        // Table header
        println!(
            "  {:<24}  {:<16}  {:<6}  {}",
            style("JOB ID").bold(),
            style("BACKEND").bold(),
            style("QUBITS").bold(),
            style("SUBMITTED").bold()
        );
        println!("  {}", "-".repeat(72));

        for entry in &ledger.jobs {
            println!(
                "  {:<24}  {:<16}  {:<6}  {}",
                style(&entry.job_id).dim(),
                entry.backend,
                entry.num_qubits,
                entry.submitted_at.format("%Y-%m-%d %H:%M"),
            );
        }

        return Ok(());
    }

    let (job_id, entry) = ledger.select(job_id)?;
    let job_id = JobId::new(job_id);
    let estimator = connect(&dir, entry.map(|e| e.backend)).await?;
    let status = estimator.status(&job_id).await?;

    println!(
        "{} Job {} on {}: {}",
        style("→").cyan().bold(),
        style(&job_id).dim(),
        style(estimator.name()).cyan(),
        styled_status(&status)
    );

    if let JobStatus::Failed(reason) = &status {
        println!("  Reason: {}", style(reason).red());
    }
    if status.is_terminal() {
        println!("  Terminal: {}", style("yes").dim());
    }

    Ok(())
}

/// Execute the cancel command.
pub async fn execute_cancel(job_id: Option<&str>) -> Result<()> {
    let dir = state_dir()?;
    let ledger = JobLedger::load(&dir)?;
    let (job_id, entry) = ledger.select(job_id)?;
    let job_id = JobId::new(job_id);

    let estimator = connect(&dir, entry.map(|e| e.backend)).await?;
    estimator.cancel(&job_id).await?;
    info!("cancellation requested for job {job_id}");

    println!(
        "{} Cancellation requested for job {}",
        style("✓").green().bold(),
        style(&job_id).dim()
    );
    Ok(())
}

async fn connect(dir: &std::path::Path, backend: Option<String>) -> Result<IbmEstimator> {
    let credentials = resolve_credentials(&Account::load(dir)?)?;
    let client = IbmClient::from_credentials(&credentials)
        .await
        .context("Failed to connect to IBM Quantum")?;
    Ok(IbmEstimator::with_client(
        client,
        backend.unwrap_or_else(|| "ibm".to_string()),
        EstimatorOptions::default(),
    ))
}

fn styled_status(status: &JobStatus) -> console::StyledObject<&'static str> {
    let name = status.label();
    match status {
        JobStatus::Completed => style(name).green().bold(),
        JobStatus::Failed(_) | JobStatus::Cancelled => style(name).red().bold(),
        JobStatus::Queued => style(name).yellow().bold(),
        JobStatus::Running => style(name).cyan().bold(),
    }
}
