//! Annualized risk ratios from per-period fractional returns.
//!
//! Both ratios annualize with sqrt(365), calendar days rather than trading
//! days, matching the exported statistics.
//!
//! Neither ratio subtracts a risk-free rate.

use super::round2;
use statrs::statistics::Statistics;

const PERIODS_PER_YEAR: f64 = 365.0;

/// mean / sample stdev * sqrt(365). `None` with fewer than two returns or
/// zero dispersion.
pub fn sharpe_ratio(returns: &[f64]) -> Option<f64> {
    if returns.len() < 2 {
        return None;
    }
    let mean = returns.iter().mean();
    let std = returns.iter().std_dev();
    annualize(mean, std)
}

/// mean / downside deviation * sqrt(365).
///
/// Downside deviation is measured from a zero target over the negative
/// returns only: sqrt(sum(r^2) / (k - 1)) for k negative returns. `None`
/// when fewer than two returns are negative. A single losing period is
/// `None`, not 0: dividing by the infinite deviation it implies would report
/// a flat 0 ratio that is not a measurement.
pub fn sortino_ratio(returns: &[f64]) -> Option<f64> {
    if returns.len() < 2 {
        return None;
    }
    let mean = returns.iter().mean();

    let (count, sum_sq) = returns
        .iter()
        .filter(|r| **r < 0.0)
        .fold((0usize, 0.0), |(n, s), r| (n + 1, s + r * r));
    if count < 2 {
        return None;
    }
    let downside = (sum_sq / (count - 1) as f64).sqrt();
    annualize(mean, downside)
}

/// Per-period fractional returns v[i] / v[i-1] - 1. Pairs whose previous
/// value is zero are skipped.
pub fn period_returns(values: &[f64]) -> Vec<f64> {
    values
        .windows(2)
        .filter(|w| w[0] != 0.0)
        .map(|w| w[1] / w[0] - 1.0)
        .collect()
}

#[inline]
fn annualize(mean: f64, dispersion: f64) -> Option<f64> {
    if dispersion == 0.0 || !dispersion.is_finite() || !mean.is_finite() {
        return None;
    }
    let ratio = round2(mean / dispersion * PERIODS_PER_YEAR.sqrt());
    ratio.is_finite().then_some(ratio)
}
