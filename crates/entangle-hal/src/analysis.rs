//! Post-processing of estimated correlators.

use crate::error::{HalError, HalResult};

/// Divide every value by the first one.
///
/// The first entry of the result is always exactly `1.0`. Fails when the
/// series is empty or its first value is zero or not finite.
pub fn normalize(values: &[f64]) -> HalResult<Vec<f64>> {
    let Some(&reference) = values.first() else {
        return Err(HalError::DegenerateNormalization("missing".into()));
    };
    if reference == 0.0 || !reference.is_finite() {
        return Err(HalError::DegenerateNormalization(reference.to_string()));
    }
    Ok(values.iter().map(|v| v / reference).collect())
}

/// Qubit distances `1..=n-1` matching [`entangle_ir::library::ghz_correlator_labels`].
pub fn distance_series(n: usize) -> Vec<usize> {
    (1..n).collect()
}

/// Pair each distance with its normalized correlator.
pub fn decay_curve(values: &[f64]) -> HalResult<Vec<(usize, f64)>> {
    let normalized = normalize(values)?;
    Ok(distance_series(values.len() + 1)
        .into_iter()
        .zip(normalized)
        .collect())
}
