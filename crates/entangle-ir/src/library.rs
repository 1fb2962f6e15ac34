//! Pre-built circuits and observables for the entanglement walkthrough, plus
//! the Grover search circuit.

use crate::circuit::Circuit;
use crate::error::{IrError, IrResult};
use crate::pauli::ObservableSet;
use crate::qubit::QubitId;

/// Bell-state observables, in the order the walkthrough reports them.
pub const BELL_OBSERVABLES: [&str; 6] = ["IZ", "IX", "ZI", "XI", "ZZ", "XX"];

/// Two-qubit Bell state `(|00⟩ + |11⟩)/√2`: `H(0)` then `CX(0, 1)`.
pub fn bell() -> IrResult<Circuit> {
    let mut circuit = Circuit::new("bell", 2);
    circuit.h(QubitId(0))?.cx(QubitId(0), QubitId(1))?;
    Ok(circuit)
}

/// Observables measured on the Bell state.
pub fn bell_observables() -> IrResult<ObservableSet> {
    ObservableSet::from_labels(BELL_OBSERVABLES)
}

/// `n`-qubit GHZ state: `H` on qubit 0, then a linear chain of `CX(i, i+1)`.
///
/// The chain is the only linking pattern used, so the circuit contains exactly
/// one single-qubit gate and `n - 1` two-qubit gates.
pub fn ghz(n: u32) -> IrResult<Circuit> {
    if n == 0 {
        return Err(IrError::InvalidQubitCount {
            got: 0,
            reason: "a GHZ state needs at least one qubit",
        });
    }

    let mut circuit = Circuit::new(format!("ghz_{n}"), n);
    circuit.h(QubitId(0))?;
    for i in 0..n - 1 {
        circuit.cx(QubitId(i), QubitId(i + 1))?;
    }
    Ok(circuit)
}

/// Two-point Z correlator labels for an `n`-qubit GHZ state.
///
/// Entry `i` has `'Z'` at label positions `0` and `i + 1` and `'I'` elsewhere,
/// so the two Z factors sit `i + 1` qubits apart. Yields `n - 1` labels, or
/// none when `n < 2`.
pub fn ghz_correlator_labels(n: usize) -> Vec<String> {
    (0..n.saturating_sub(1))
        .map(|i| {
            (0..n)
                .map(|pos| if pos == 0 || pos == i + 1 { 'Z' } else { 'I' })
                .collect()
        })
        .collect()
}

/// [`ghz_correlator_labels`] as an observable set. Needs `n >= 2`.
pub fn ghz_correlators(n: usize) -> IrResult<ObservableSet> {
    if n < 2 {
        return Err(IrError::InvalidQubitCount {
            got: n as u32,
            reason: "correlators need at least two qubits",
        });
    }
    ObservableSet::from_labels(ghz_correlator_labels(n))
}

/// Grover iterations for an `n`-qubit search space: `floor(sqrt(2^n))`.
pub fn grover_iterations(n: u32) -> u64 {
    1u64.checked_shl(n).map_or(u64::MAX, u64::isqrt)
}

/// Flip the phase of basis state `target`.
///
/// Qubit `k` is compared against bit `k` of `target`. Zero bits are
/// conjugated with X so that a multi-controlled Z on the last qubit, built
/// as `H · MCX · H`, hits exactly `|target⟩`.
pub fn grover_oracle(circuit: &mut Circuit, target: u64) -> IrResult<()> {
    let n = check_search_width(circuit)?;
    if target >> n != 0 {
        return Err(IrError::TargetOutOfRange {
            target,
            num_qubits: n,
        });
    }

    let zeros: Vec<QubitId> = (0..n)
        .filter(|k| target >> k & 1 == 0)
        .map(QubitId)
        .collect();
    for &q in &zeros {
        circuit.x(q)?;
    }
    multi_controlled_z(circuit, n)?;
    for &q in &zeros {
        circuit.x(q)?;
    }
    Ok(())
}

/// Reflect about the uniform superposition.
pub fn grover_diffuser(circuit: &mut Circuit) -> IrResult<()> {
    let n = check_search_width(circuit)?;
    for q in (0..n).map(QubitId) {
        circuit.h(q)?.x(q)?;
    }
    multi_controlled_z(circuit, n)?;
    for q in (0..n).map(QubitId) {
        circuit.x(q)?.h(q)?;
    }
    Ok(())
}

/// Full Grover search for `target` on `n` qubits.
///
/// Starts from `H` on every qubit and applies oracle and diffuser
/// [`grover_iterations`]`(n)` times. Measurement is left to the sampler.
pub fn grover(n: u32, target: u64) -> IrResult<Circuit> {
    grover_with_iterations(n, target, grover_iterations(n))
}

/// [`grover`] with an explicit iteration count.
pub fn grover_with_iterations(n: u32, target: u64, iterations: u64) -> IrResult<Circuit> {
    let mut circuit = Circuit::new(format!("grover_{n}_{target}"), n);
    check_search_width(&circuit)?;
    for q in (0..n).map(QubitId) {
        circuit.h(q)?;
    }
    for _ in 0..iterations {
        grover_oracle(&mut circuit, target)?;
        grover_diffuser(&mut circuit)?;
    }
    Ok(circuit)
}

fn check_search_width(circuit: &Circuit) -> IrResult<u32> {
    let n = circuit.num_qubits() as u32;
    if n == 0 || n >= 64 {
        return Err(IrError::InvalidQubitCount {
            got: n,
            reason: "a search register needs between 1 and 63 qubits",
        });
    }
    Ok(n)
}

fn multi_controlled_z(circuit: &mut Circuit, n: u32) -> IrResult<()> {
    let last = QubitId(n - 1);
    let controls: Vec<QubitId> = (0..n - 1).map(QubitId).collect();
    circuit.h(last)?.mcx(&controls, last)?.h(last)?;
    Ok(())
}
