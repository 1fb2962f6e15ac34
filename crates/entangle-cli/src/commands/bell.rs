//! Bell command implementation.

use anyhow::Result;
use console::style;

use entangle_adapter_sim::StatevectorEstimator;
use entangle_hal::{Estimator, EstimatorOptions, EstimatorPub, WaitConfig};
use entangle_ir::library;

use super::common::{OutputFormat, Report};

/// Execute the bell command.
pub async fn execute(precision: Option<f64>, seed: Option<u64>, format: OutputFormat) -> Result<()> {
    let options = EstimatorOptions {
        default_precision: precision,
        seed,
        ..EstimatorOptions::default()
    };
    options.validate()?;

    let circuit = library::bell()?;
    if format == OutputFormat::Table {
        println!(
            "{} Estimating {} observables on the Bell state ({} qubits, depth {})",
            style("→").cyan().bold(),
            library::BELL_OBSERVABLES.len(),
            circuit.num_qubits(),
            circuit.depth()
        );
    }

    let estimator = StatevectorEstimator::new().with_options(options);
    let pub_ = EstimatorPub::new(circuit, library::bell_observables()?)?;
    let job_id = estimator.run(vec![pub_]).await?;
    let result = estimator.wait(&job_id, WaitConfig::default()).await?;

    Report::observables(job_id.as_str(), estimator.name(), result.first()?).emit(format)
}
