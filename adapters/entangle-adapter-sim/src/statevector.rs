//! Dense statevector simulation.
//!
//! Every gate reduces to a 2x2 unitary on one target qubit, optionally
//! conditioned on control qubits, except `swap`, which permutes amplitudes.

use std::f64::consts::{FRAC_1_SQRT_2, PI};

use num_complex::Complex64;
use rand::Rng;

use entangle_hal::Counts;
use entangle_ir::{Circuit, Instruction, Pauli, PauliString, StandardGate};

type Matrix2 = [[Complex64; 2]; 2];

const ZERO: Complex64 = Complex64::new(0.0, 0.0);
const ONE: Complex64 = Complex64::new(1.0, 0.0);
const IMAG: Complex64 = Complex64::new(0.0, 1.0);

/// How a gate acts on the amplitudes.
enum Action {
    /// Unitary on the only operand.
    Single(Matrix2),
    /// Unitary on the last operand when every other operand is `|1⟩`.
    Controlled(Matrix2),
    Swap,
}

fn diag(a: Complex64, b: Complex64) -> Matrix2 {
    [[a, ZERO], [ZERO, b]]
}

fn phase(theta: f64) -> Matrix2 {
    diag(ONE, Complex64::from_polar(1.0, theta))
}

const PAULI_X: Matrix2 = [[ZERO, ONE], [ONE, ZERO]];
const PAULI_Y: Matrix2 = [[ZERO, Complex64::new(0.0, -1.0)], [IMAG, ZERO]];
const PAULI_Z: Matrix2 = [[ONE, ZERO], [ZERO, Complex64::new(-1.0, 0.0)]];

fn action(gate: StandardGate) -> Action {
    let h = Complex64::new(FRAC_1_SQRT_2, 0.0);
    match gate {
        StandardGate::I => Action::Single(diag(ONE, ONE)),
        StandardGate::X => Action::Single(PAULI_X),
        StandardGate::Y => Action::Single(PAULI_Y),
        StandardGate::Z => Action::Single(PAULI_Z),
        StandardGate::H => Action::Single([[h, h], [h, -h]]),
        StandardGate::S => Action::Single(phase(PI / 2.0)),
        StandardGate::Sdg => Action::Single(phase(-PI / 2.0)),
        StandardGate::T => Action::Single(phase(PI / 4.0)),
        StandardGate::Tdg => Action::Single(phase(-PI / 4.0)),
        StandardGate::SX => {
            let p = Complex64::new(0.5, 0.5);
            let m = Complex64::new(0.5, -0.5);
            Action::Single([[p, m], [m, p]])
        }
        StandardGate::Rx(theta) => {
            let c = Complex64::new((theta / 2.0).cos(), 0.0);
            let s = Complex64::new(0.0, -(theta / 2.0).sin());
            Action::Single([[c, s], [s, c]])
        }
        StandardGate::Ry(theta) => {
            let (sin, cos) = (theta / 2.0).sin_cos();
            Action::Single([
                [Complex64::new(cos, 0.0), Complex64::new(-sin, 0.0)],
                [Complex64::new(sin, 0.0), Complex64::new(cos, 0.0)],
            ])
        }
        StandardGate::Rz(theta) => Action::Single(diag(
            Complex64::from_polar(1.0, -theta / 2.0),
            Complex64::from_polar(1.0, theta / 2.0),
        )),
        StandardGate::CX | StandardGate::Mcx(_) => Action::Controlled(PAULI_X),
        StandardGate::CY => Action::Controlled(PAULI_Y),
        StandardGate::CZ => Action::Controlled(PAULI_Z),
        StandardGate::Swap => Action::Swap,
    }
}

/// Amplitudes of an `n`-qubit pure state.
///
/// Basis index bit `k` is the state of qubit `k`.
pub struct Statevector {
    amplitudes: Vec<Complex64>,
    num_qubits: usize,
}

impl Statevector {
    /// `|0…0⟩` on `num_qubits` qubits.
    pub fn new(num_qubits: usize) -> Self {
        let mut amplitudes = vec![ZERO; 1 << num_qubits];
        amplitudes[0] = ONE;
        Self {
            amplitudes,
            num_qubits,
        }
    }

    /// Prepare the state produced by `circuit` acting on |0...0⟩.
    pub fn from_circuit(circuit: &Circuit) -> Self {
        let mut sv = Self::new(circuit.num_qubits());
        for inst in circuit.instructions() {
            sv.apply(inst);
        }
        sv
    }

    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// Apply one instruction. Barriers are no-ops.
    pub fn apply(&mut self, instruction: &Instruction) {
        let Instruction::Gate { gate, qubits } = instruction else {
            return;
        };
        match action(*gate) {
            Action::Single(m) => self.apply_matrix(&m, qubits[0].index(), 0),
            Action::Controlled(m) => {
                let Some((target, controls)) = qubits.split_last() else {
                    return;
                };
                let mask = controls.iter().fold(0, |mask, q| mask | 1usize << q.index());
                self.apply_matrix(&m, target.index(), mask);
            }
            Action::Swap => self.swap_qubits(qubits[0].index(), qubits[1].index()),
        }
    }

    /// Multiply each `(…0…, …1…)` amplitude pair on `target` by `m`,
    /// skipping pairs where any bit of `ctrl` is clear.
    fn apply_matrix(&mut self, m: &Matrix2, target: usize, ctrl: usize) {
        let bit = 1usize << target;
        for i0 in (0..self.amplitudes.len()).filter(|i| i & bit == 0 && i & ctrl == ctrl) {
            let i1 = i0 | bit;
            let (a, b) = (self.amplitudes[i0], self.amplitudes[i1]);
            self.amplitudes[i0] = m[0][0] * a + m[0][1] * b;
            self.amplitudes[i1] = m[1][0] * a + m[1][1] * b;
        }
    }

    fn swap_qubits(&mut self, a: usize, b: usize) {
        let (bit_a, bit_b) = (1usize << a, 1usize << b);
        for i in 0..self.amplitudes.len() {
            if i & bit_a != 0 && i & bit_b == 0 {
                self.amplitudes.swap(i, i ^ (bit_a | bit_b));
            }
        }
    }

    /// Probability of each basis state, indexed like the amplitudes.
    pub fn probabilities(&self) -> Vec<f64> {
        self.amplitudes.iter().map(|a| a.norm_sqr()).collect()
    }

    /// Draw one computational-basis outcome.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        let r: f64 = rng.r#gen();
        let mut cumulative = 0.0;
        for (i, amp) in self.amplitudes.iter().enumerate() {
            cumulative += amp.norm_sqr();
            if r < cumulative {
                return i;
            }
        }
        // Rounding can leave the cumulative sum just under 1.
        self.amplitudes.len() - 1
    }

    /// Measure every qubit `shots` times.
    pub fn sample_counts<R: Rng + ?Sized>(&self, shots: u64, rng: &mut R) -> Counts {
        let mut counts = Counts::new();
        for _ in 0..shots {
            let outcome = self.sample(rng);
            counts.insert(self.bitstring(outcome), 1);
        }
        counts
    }

    /// Basis index as a bitstring with qubit 0 rightmost.
    pub fn bitstring(&self, outcome: usize) -> String {
        format!("{outcome:0width$b}", width = self.num_qubits)
    }

    /// Exact expectation value `⟨ψ|P|ψ⟩` of a Pauli string.
    ///
    /// `P|i⟩ = c(i)|i ⊕ x⟩` where `x` flips every qubit carrying X or Y, and
    /// `c(i) = i^{#Y} · (-1)^{popcount(i & (y|z))}`.
    ///
    /// # Panics
    ///
    /// If the observable width differs from the state width.
    pub fn expectation(&self, observable: &PauliString) -> f64 {
        assert_eq!(
            observable.num_qubits(),
            self.num_qubits,
            "observable width must match the state"
        );

        let mut flip_mask = 0usize;
        let mut sign_mask = 0usize;
        let mut num_y = 0u32;
        for (qubit, pauli) in observable.support() {
            let bit = 1 << qubit.index();
            match pauli {
                Pauli::X => flip_mask |= bit,
                Pauli::Y => {
                    flip_mask |= bit;
                    sign_mask |= bit;
                    num_y += 1;
                }
                Pauli::Z => sign_mask |= bit,
                Pauli::I => {}
            }
        }

        let y_phase = match num_y % 4 {
            0 => ONE,
            1 => IMAG,
            2 => -ONE,
            _ => -IMAG,
        };

        let mut total = ZERO;
        for (i, amp) in self.amplitudes.iter().enumerate() {
            let partner = self.amplitudes[i ^ flip_mask];
            let term = partner.conj() * amp;
            if (i & sign_mask).count_ones() % 2 == 0 {
                total += term;
            } else {
                total -= term;
            }
        }
        (y_phase * total).re
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use entangle_ir::{QubitId, library};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn approx_eq(a: Complex64, b: Complex64) -> bool {
        (a - b).norm() < 1e-10
    }

    fn ev(sv: &Statevector, label: &str) -> f64 {
        sv.expectation(&label.parse().unwrap())
    }

    #[test]
    fn test_bell_amplitudes() {
        let sv = Statevector::from_circuit(&library::bell().unwrap());
        let expected = [FRAC_1_SQRT_2, 0.0, 0.0, FRAC_1_SQRT_2];
        for (amp, want) in sv.amplitudes.iter().zip(expected) {
            assert!(approx_eq(*amp, Complex64::new(want, 0.0)), "{amp}");
        }
    }

    #[test]
    fn test_gate_identities() {
        // SX·SX = X and S·S = Z, up to global phase.
        let mut c = Circuit::new("sx2", 1);
        c.sx(QubitId(0)).unwrap().sx(QubitId(0)).unwrap();
        assert!((ev(&Statevector::from_circuit(&c), "Z") + 1.0).abs() < 1e-10);

        let mut c = Circuit::new("ss", 1);
        c.h(QubitId(0)).unwrap().s(QubitId(0)).unwrap().s(QubitId(0)).unwrap();
        assert!((ev(&Statevector::from_circuit(&c), "X") + 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_rotations() {
        let mut c = Circuit::new("ry", 1);
        c.ry(PI / 2.0, QubitId(0)).unwrap();
        assert!((ev(&Statevector::from_circuit(&c), "X") - 1.0).abs() < 1e-10);

        // Rz(π/2)|+⟩ ∝ |+i⟩.
        let mut c = Circuit::new("rz", 1);
        c.h(QubitId(0)).unwrap().rz(PI / 2.0, QubitId(0)).unwrap();
        assert!((ev(&Statevector::from_circuit(&c), "Y") - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_controlled_y() {
        let mut c = Circuit::new("cy", 2);
        c.x(QubitId(0)).unwrap().cy(QubitId(0), QubitId(1)).unwrap();
        let sv = Statevector::from_circuit(&c);
        assert!((ev(&sv, "ZI") + 1.0).abs() < 1e-10);
        assert!((ev(&sv, "IZ") + 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_bell_expectations() {
        let sv = Statevector::from_circuit(&library::bell().unwrap());
        for label in ["IZ", "IX", "ZI", "XI"] {
            assert!(ev(&sv, label).abs() < 1e-10, "{label}");
        }
        assert!((ev(&sv, "ZZ") - 1.0).abs() < 1e-10);
        assert!((ev(&sv, "XX") - 1.0).abs() < 1e-10);
        assert!((ev(&sv, "YY") + 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_label_order_is_little_endian() {
        // X on qubit 0 only: ⟨Z⟩ on qubit 0 flips, qubit 1 stays.
        let mut c = Circuit::new("flip", 2);
        c.x(QubitId(0)).unwrap();
        let sv = Statevector::from_circuit(&c);
        assert!((ev(&sv, "IZ") + 1.0).abs() < 1e-10);
        assert!((ev(&sv, "ZI") - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_single_qubit_y_expectation() {
        // RX(-π/2)|0⟩ points along +Y.
        let mut c = Circuit::new("plus_y", 1);
        c.rx(-PI / 2.0, QubitId(0)).unwrap();
        let sv = Statevector::from_circuit(&c);
        assert!((ev(&sv, "Y") - 1.0).abs() < 1e-10);
        assert!(ev(&sv, "X").abs() < 1e-10);
        assert!(ev(&sv, "Z").abs() < 1e-10);
    }

    #[test]
    fn test_ghz_correlators_are_one() {
        let n = 6;
        let sv = Statevector::from_circuit(&library::ghz(n as u32).unwrap());
        for obs in &library::ghz_correlators(n).unwrap() {
            assert!((sv.expectation(obs) - 1.0).abs() < 1e-10, "{obs}");
        }
        // Odd-weight Z strings vanish on GHZ.
        assert!(ev(&sv, "IIIIIZ").abs() < 1e-10);
    }

    #[test]
    fn test_swap_and_cz() {
        let mut c = Circuit::new("sw", 2);
        c.x(QubitId(0)).unwrap().swap(QubitId(0), QubitId(1)).unwrap();
        let sv = Statevector::from_circuit(&c);
        assert!((ev(&sv, "ZI") + 1.0).abs() < 1e-10);

        let mut c = Circuit::new("cz", 2);
        c.h(QubitId(0)).unwrap().h(QubitId(1)).unwrap().cz(QubitId(0), QubitId(1)).unwrap();
        let sv = Statevector::from_circuit(&c);
        // Graph state stabilizers: X⊗Z and Z⊗X.
        assert!((ev(&sv, "ZX") - 1.0).abs() < 1e-10);
        assert!((ev(&sv, "XZ") - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_toffoli_needs_both_controls() {
        for (a, b, flipped) in [(false, false, false), (true, false, false), (true, true, true)] {
            let mut c = Circuit::new("ccx", 3);
            if a {
                c.x(QubitId(0)).unwrap();
            }
            if b {
                c.x(QubitId(1)).unwrap();
            }
            c.ccx(QubitId(0), QubitId(1), QubitId(2)).unwrap();
            let z = ev(&Statevector::from_circuit(&c), "ZII");
            assert!((z - if flipped { -1.0 } else { 1.0 }).abs() < 1e-10, "{a} {b}");
        }
    }

    #[test]
    fn test_bitstring_qubit_zero_rightmost() {
        let sv = Statevector::new(3);
        assert_eq!(sv.bitstring(1), "001");
        assert_eq!(sv.bitstring(6), "110");
    }

    #[test]
    fn test_sampling_follows_probabilities() {
        let mut c = Circuit::new("x1", 2);
        c.x(QubitId(1)).unwrap();
        let sv = Statevector::from_circuit(&c);
        let mut rng = StdRng::seed_from_u64(3);
        let counts = sv.sample_counts(50, &mut rng);
        assert_eq!(counts.get("10"), 50);

        let sv = Statevector::from_circuit(&library::bell().unwrap());
        let probs = sv.probabilities();
        assert!((probs[0] - 0.5).abs() < 1e-10 && (probs[3] - 0.5).abs() < 1e-10);
        let counts = sv.sample_counts(2000, &mut rng);
        assert_eq!(counts.get("00") + counts.get("11"), 2000);
        assert!(counts.get("00") > 850 && counts.get("11") > 850);
    }

    #[test]
    fn test_grover_amplifies_every_target() {
        for target in 0..8u64 {
            let sv = Statevector::from_circuit(&library::grover(3, target).unwrap());
            let probs = sv.probabilities();
            // Two iterations on eight states: sin²(5θ) with sin θ = 1/√8.
            assert!(probs[target as usize] > 0.9, "target {target}: {probs:?}");
        }
    }
}
