//! Grover command implementation.

use anyhow::Result;
use console::style;
use tracing::info;

use entangle_adapter_sim::StatevectorSampler;
use entangle_ir::library;

use super::common::{CountsReport, OutputFormat};

/// Execute the grover command.
pub fn execute(
    qubits: u32,
    target: u64,
    iterations: Option<u64>,
    shots: u64,
    seed: Option<u64>,
    format: OutputFormat,
) -> Result<()> {
    let sampler = StatevectorSampler::new(seed);
    if qubits as usize > sampler.max_qubits() {
        anyhow::bail!(
            "{qubits} qubits exceed the simulator limit of {}",
            sampler.max_qubits()
        );
    }

    let iterations = iterations.unwrap_or_else(|| library::grover_iterations(qubits));
    let circuit = library::grover_with_iterations(qubits, target, iterations)?;
    let width = qubits as usize;

    if format == OutputFormat::Table {
        println!(
            "{} Grover search for |{}⟩ on {} qubits: {} iteration(s), depth {}",
            style("→").cyan().bold(),
            style(format!("{target:0width$b}")).yellow(),
            qubits,
            iterations,
            circuit.depth()
        );
    }

    let counts = sampler.run(&circuit, shots)?;
    if let Some((bits, count)) = counts.most_frequent() {
        info!("most frequent outcome {bits}: {count}/{shots}");
    }

    CountsReport {
        circuit: circuit.name().to_string(),
        backend: "statevector".to_string(),
        shots,
        counts,
    }
    .emit(format)
}
