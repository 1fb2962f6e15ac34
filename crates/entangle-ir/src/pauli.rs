//! Pauli observables.
//!
//! A Pauli string is a tensor product of single-qubit Paulis written as a
//! label such as `"IZXZ"`. Labels follow the little-endian convention of
//! the estimator services this crate talks to: the **rightmost** character
//! acts on qubit 0. `"IZ"` is therefore Z on qubit 0 and identity on qubit 1.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{IrError, IrResult};
use crate::qubit::QubitId;

/// Single-qubit Pauli operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Pauli {
    /// Identity.
    I,
    /// Bit flip.
    X,
    /// Bit and phase flip.
    Y,
    /// Phase flip.
    Z,
}

impl Pauli {
    /// Parse from a label character, case-insensitively.
    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'I' => Some(Pauli::I),
            'X' => Some(Pauli::X),
            'Y' => Some(Pauli::Y),
            'Z' => Some(Pauli::Z),
            _ => None,
        }
    }

    /// Label character.
    pub fn to_char(self) -> char {
        match self {
            Pauli::I => 'I',
            Pauli::X => 'X',
            Pauli::Y => 'Y',
            Pauli::Z => 'Z',
        }
    }

    /// Diagonal in the computational basis (I or Z).
    pub fn is_diagonal(self) -> bool {
        matches!(self, Pauli::I | Pauli::Z)
    }
}

impl fmt::Display for Pauli {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_char())
    }
}

/// A validated Pauli label over `{I, X, Y, Z}`.
///
/// Stored in label order; use [`PauliString::pauli_on`] for qubit order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PauliString {
    paulis: Vec<Pauli>,
}

impl PauliString {
    /// All-identity string on `num_qubits` qubits.
    ///
    /// Returns `None` for zero qubits, since an empty label is not valid.
    pub fn identity(num_qubits: usize) -> Option<Self> {
        (num_qubits > 0).then(|| Self {
            paulis: vec![Pauli::I; num_qubits],
        })
    }

    /// Build from Paulis listed in label order (leftmost = highest qubit).
    pub fn from_paulis(paulis: Vec<Pauli>) -> IrResult<Self> {
        if paulis.is_empty() {
            return Err(IrError::EmptyPauliString);
        }
        Ok(Self { paulis })
    }

    /// Number of qubits the string acts on.
    pub fn num_qubits(&self) -> usize {
        self.paulis.len()
    }

    /// The canonical upper-case label.
    pub fn label(&self) -> String {
        self.paulis.iter().map(|p| p.to_char()).collect()
    }

    /// Paulis in label order.
    pub fn paulis(&self) -> &[Pauli] {
        &self.paulis
    }

    /// The Pauli acting on `qubit`, or `None` if the qubit is out of range.
    pub fn pauli_on(&self, qubit: QubitId) -> Option<Pauli> {
        let n = self.paulis.len();
        let q = qubit.index();
        (q < n).then(|| self.paulis[n - 1 - q])
    }

    /// Iterate `(qubit, pauli)` pairs for the non-identity factors.
    pub fn support(&self) -> impl Iterator<Item = (QubitId, Pauli)> + '_ {
        let n = self.paulis.len();
        self.paulis
            .iter()
            .enumerate()
            .filter(|(_, p)| **p != Pauli::I)
            .map(move |(pos, p)| (QubitId((n - 1 - pos) as u32), *p))
    }

    /// Number of non-identity factors.
    pub fn weight(&self) -> usize {
        self.paulis.iter().filter(|p| **p != Pauli::I).count()
    }

    /// Whether every factor is I or Z.
    pub fn is_diagonal(&self) -> bool {
        self.paulis.iter().all(|p| p.is_diagonal())
    }
}

impl FromStr for PauliString {
    type Err = IrError;

    fn from_str(label: &str) -> IrResult<Self> {
        if label.is_empty() {
            return Err(IrError::EmptyPauliString);
        }
        let paulis = label
            .chars()
            .enumerate()
            .map(|(position, character)| {
                Pauli::from_char(character).ok_or_else(|| IrError::InvalidPauli {
                    label: label.to_string(),
                    character,
                    position,
                })
            })
            .collect::<IrResult<Vec<_>>>()?;
        Ok(Self { paulis })
    }
}

impl TryFrom<String> for PauliString {
    type Error = IrError;

    fn try_from(label: String) -> IrResult<Self> {
        label.parse()
    }
}

impl From<PauliString> for String {
    fn from(p: PauliString) -> Self {
        p.label()
    }
}

impl fmt::Display for PauliString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for p in &self.paulis {
            write!(f, "{p}")?;
        }
        Ok(())
    }
}

/// An ordered list of Pauli observables of one width.
///
/// Order is significant: estimators return one value per observable in the
/// order they appear here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ObservableSetData")]
pub struct ObservableSet {
    observables: Vec<PauliString>,
}

#[derive(Deserialize)]
struct ObservableSetData {
    observables: Vec<PauliString>,
}

impl TryFrom<ObservableSetData> for ObservableSet {
    type Error = IrError;

    fn try_from(data: ObservableSetData) -> IrResult<Self> {
        Self::new(data.observables)
    }
}

impl ObservableSet {
    /// Build from already-parsed observables.
    pub fn new(observables: Vec<PauliString>) -> IrResult<Self> {
        let first = observables.first().ok_or(IrError::EmptyObservableSet)?;
        let expected = first.num_qubits();
        if let Some(bad) = observables.iter().find(|o| o.num_qubits() != expected) {
            return Err(IrError::ObservableWidthMismatch {
                label: bad.label(),
                expected,
                got: bad.num_qubits(),
            });
        }
        Ok(Self { observables })
    }

    /// Parse each label and build the set.
    pub fn from_labels<I, S>(labels: I) -> IrResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let observables = labels
            .into_iter()
            .map(|l| l.as_ref().parse())
            .collect::<IrResult<Vec<PauliString>>>()?;
        Self::new(observables)
    }

    /// Number of observables.
    pub fn len(&self) -> usize {
        self.observables.len()
    }

    /// Always false for a constructed set; kept for API symmetry.
    pub fn is_empty(&self) -> bool {
        self.observables.is_empty()
    }

    /// Width shared by every observable.
    pub fn num_qubits(&self) -> usize {
        self.observables.first().map_or(0, PauliString::num_qubits)
    }

    /// Iterate in submission order.
    pub fn iter(&self) -> std::slice::Iter<'_, PauliString> {
        self.observables.iter()
    }

    /// Labels in submission order.
    pub fn labels(&self) -> Vec<String> {
        self.observables.iter().map(PauliString::label).collect()
    }
}

impl<'a> IntoIterator for &'a ObservableSet {
    type Item = &'a PauliString;
    type IntoIter = std::slice::Iter<'a, PauliString>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
