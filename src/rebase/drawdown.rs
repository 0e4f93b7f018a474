use super::round2;

/// Percentage below the running peak for each point. The peak is seeded
/// with the first value, so the first point is always 0.
/// A non-positive peak cannot express a decline and yields 0.
pub fn drawdown(values: &[f64]) -> Vec<f64> {
    let Some(&first) = values.first() else {
        return Vec::new();
    };
    let mut running_max = first;
    values
        .iter()
        .map(|&v| {
            if v > running_max {
                running_max = v;
            }
            peak_relative(v, running_max).unwrap_or(0.0)
        })
        .collect()
}

/// Sparse variant. Nulls emit null and leave the running peak alone; the
/// peak is set by the first non-null value. A non-positive peak yields null.
pub fn drawdown_sparse(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let mut running_max: Option<f64> = None;
    values
        .iter()
        .map(|v| {
            let v = (*v)?;
            let peak = match running_max {
                Some(m) if m >= v => m,
                _ => v,
            };
            running_max = Some(peak);
            peak_relative(v, peak)
        })
        .collect()
}

#[inline]
fn peak_relative(value: f64, peak: f64) -> Option<f64> {
    if peak <= 0.0 {
        return None;
    }
    let pct = round2((value / peak - 1.0) * 100.0);
    pct.is_finite().then_some(pct)
}
