//! Shot sampling from the final statevector.

use std::sync::{Mutex, PoisonError};

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, instrument};

use entangle_hal::{Counts, HalError, HalResult};
use entangle_ir::Circuit;

use crate::estimator::DEFAULT_MAX_QUBITS;
use crate::statevector::Statevector;

/// Measures every qubit at the end of a circuit, `shots` times.
///
/// The state is prepared once per run and then sampled, which matches
/// repeated execution for circuits without mid-circuit measurement.
pub struct StatevectorSampler {
    rng: Mutex<StdRng>,
    max_qubits: usize,
}

impl StatevectorSampler {
    /// A sampler seeded from `seed`, or from entropy when `None`.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            rng: Mutex::new(rng),
            max_qubits: DEFAULT_MAX_QUBITS,
        }
    }

    #[must_use]
    pub fn with_max_qubits(mut self, max_qubits: usize) -> Self {
        self.max_qubits = max_qubits;
        self
    }

    /// Widest circuit this sampler will run.
    pub fn max_qubits(&self) -> usize {
        self.max_qubits
    }

    #[instrument(skip(self, circuit), fields(circuit = circuit.name()))]
    pub fn run(&self, circuit: &Circuit, shots: u64) -> HalResult<Counts> {
        if shots == 0 {
            return Err(HalError::Configuration("shots must be at least 1".into()));
        }
        let width = circuit.num_qubits();
        if width > self.max_qubits {
            return Err(HalError::CircuitTooLarge(format!(
                "Circuit has {width} qubits but simulator only supports {}",
                self.max_qubits
            )));
        }

        let sv = Statevector::from_circuit(circuit);
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        let counts = sv.sample_counts(shots, &mut *rng);
        debug!("sampled {shots} shots into {} outcomes", counts.len());
        Ok(counts)
    }
}
