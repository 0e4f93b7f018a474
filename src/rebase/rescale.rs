use super::{round2, BASE_CAPITAL};

/// Scale a dense series so its first value is `BASE_CAPITAL`.
/// A zero or non-finite first value has no valid factor; the input is
/// returned unchanged.
pub fn rescale(values: &[f64]) -> Vec<f64> {
    let Some(&first) = values.first() else {
        return Vec::new();
    };
    let factor = BASE_CAPITAL / first;
    if !factor.is_finite() {
        return values.to_vec();
    }
    values.iter().map(|v| round2(v * factor)).collect()
}

/// Scale a sparse series so its first non-null, non-zero value is
/// `BASE_CAPITAL`. Nulls pass through. Without such an anchor the input is
/// returned unchanged.
pub fn rescale_sparse(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let Some(anchor) = values.iter().flatten().copied().find(|v| *v != 0.0) else {
        return values.to_vec();
    };
    let factor = BASE_CAPITAL / anchor;
    if !factor.is_finite() {
        return values.to_vec();
    }
    values.iter().map(|v| v.map(|x| round2(x * factor))).collect()
}
