//! GHZ command implementation.
//!
//! Local runs render at once. Remote runs record the job in the ledger and
//! return, unless `--wait` is given.

use anyhow::{Context, Result};
use chrono::Utc;
use console::style;
use tracing::{debug, info};

use entangle_adapter_ibm::IbmEstimator;
use entangle_adapter_sim::StatevectorEstimator;
use entangle_hal::{Estimator, EstimatorOptions, EstimatorPub};
use entangle_ir::library;

use super::common::{
    Account, JobLedger, LedgerEntry, OutputFormat, Report, RunSettings, Target,
    resolve_backend, resolve_credentials, spinner, state_dir,
};

/// Execute the ghz command.
pub async fn execute(
    qubits: u32,
    backend: Option<&str>,
    min_qubits: Option<usize>,
    settings: &RunSettings,
    format: OutputFormat,
) -> Result<()> {
    let n = qubits as usize;
    let circuit = library::ghz(qubits)?;
    let observables = library::ghz_correlators(n)?;
    let labels = observables.labels();
    let pub_ = EstimatorPub::new(circuit, observables)?;
    let options = settings.estimator_options()?;

    let dir = state_dir()?;
    let account = Account::load(&dir)?;
    let backend = resolve_backend(backend, &account);
    let target = Target::parse(&backend, min_qubits.unwrap_or(n));

    if format == OutputFormat::Table {
        println!(
            "{} GHZ state on {} qubits: {} correlators, depth {}",
            style("→").cyan().bold(),
            n,
            labels.len(),
            pub_.circuit().depth()
        );
    }

    match target {
        Target::Simulator => run_local(pub_, options, format).await,
        Target::Ibm(selector) => {
            let credentials = resolve_credentials(&account)?;
            let progress = spinner("Connecting to IBM Quantum...");
            let estimator = IbmEstimator::connect(&credentials, selector, options)
                .await
                .context("Failed to connect to IBM Quantum")?;
            debug!("connected to IBM Quantum, target {}", estimator.target());

            progress.set_message(format!("Submitting to {}...", estimator.target()));
            let job_id = estimator.run(vec![pub_]).await?;
            progress.finish_and_clear();
            info!("submitted job {job_id} ({n} qubits)");

            let mut ledger = JobLedger::load(&dir)?;
            ledger.record(LedgerEntry {
                job_id: job_id.to_string(),
                backend: estimator.target().to_string(),
                num_qubits: n,
                labels,
                submitted_at: Utc::now(),
            });
            ledger.save(&dir)?;

            if !settings.wait {
                println!(
                    "{} Submitted job {} to {}",
                    style("✓").green().bold(),
                    style(&job_id).yellow(),
                    style(estimator.target()).cyan()
                );
                println!(
                    "  Fetch the result later with: {}",
                    style(format!("entangle fetch {job_id}")).bold()
                );
                return Ok(());
            }

            let progress = spinner(format!("Waiting for job {job_id}..."));
            let result = estimator.wait(&job_id, settings.wait_config()).await;
            progress.finish_and_clear();
            let result = result?;

            Report::correlators(job_id.as_str(), estimator.target(), result.first()?)?.emit(format)
        }
    }
}

async fn run_local(pub_: EstimatorPub, options: EstimatorOptions, format: OutputFormat) -> Result<()> {
    let estimator = StatevectorEstimator::new().with_options(options);
    let job_id = estimator.run(vec![pub_]).await?;
    let result = estimator.result(&job_id).await?;
    Report::correlators(job_id.as_str(), estimator.name(), result.first()?)?.emit(format)
}
