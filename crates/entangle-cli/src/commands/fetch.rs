//! Fetch command implementation.
//!
//! Re-fetches a remote job by id, normalizes the correlators by the
//! nearest-neighbour value and renders them against qubit distance.

use anyhow::{Context, Result};
use console::style;
use tracing::debug;

use entangle_adapter_ibm::{IbmClient, IbmEstimator};
use entangle_hal::{Estimator, EstimatorOptions, JobId};

use super::common::{
    Account, JobLedger, OutputFormat, Report, resolve_credentials, spinner, state_dir, wait_config,
};

/// Execute the fetch command.
pub async fn execute(
    job_id: Option<&str>,
    wait: bool,
    timeout: Option<u64>,
    format: OutputFormat,
) -> Result<()> {
    let dir = state_dir()?;
    let ledger = JobLedger::load(&dir)?;
    let (job_id, entry) = ledger.select(job_id)?;
    let job_id = JobId::new(job_id);

    let credentials = resolve_credentials(&Account::load(&dir)?)?;
    let client = IbmClient::from_credentials(&credentials)
        .await
        .context("Failed to connect to IBM Quantum")?;

    let backend = match &entry {
        Some(entry) => entry.backend.clone(),
        None => client
            .get_job_status(job_id.as_str())
            .await?
            .backend
            .unwrap_or_else(|| "ibm".to_string()),
    };
    let estimator = IbmEstimator::with_client(client, backend, EstimatorOptions::default());
    if let Some(entry) = entry {
        estimator.remember_labels(&job_id, vec![entry.labels]).await;
    }

    let status = estimator.status(&job_id).await?;
    debug!("job {job_id}: {status}");
    if !status.is_terminal() && !wait {
        println!(
            "{} Job {} is {}; try again later or pass --wait",
            style("→").cyan().bold(),
            style(&job_id).dim(),
            style(&status).yellow()
        );
        return Ok(());
    }

    let result = if wait {
        let progress = spinner(format!("Waiting for job {job_id}..."));
        let result = estimator.wait(&job_id, wait_config(timeout)).await;
        progress.finish_and_clear();
        result?
    } else {
        estimator.result(&job_id).await?
    };

    Report::correlators(job_id.as_str(), estimator.name(), result.first()?)?.emit(format)
}
