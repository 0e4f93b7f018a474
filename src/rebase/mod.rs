//! Rebasing of a full-history dataset to a chosen start year.
//!
//! A rebase slices every date-aligned series at the first date on or after
//! January 1st of the start year, rescales capital so it starts at
//! [`BASE_CAPITAL`], and then recomputes every path-dependent field
//! (drawdowns, monthly returns, ratios, summary statistics) from the slice.
//! Truncating the precomputed fields would be wrong: peaks, compounding and
//! volatility all depend on where the path starts.
//!
//! Everything here is pure. No I/O, no shared state, no errors: anything
//! that cannot be computed comes back as `None`.

pub mod drawdown;
pub mod locate;
pub mod monthly;
pub mod ratios;
pub mod rescale;
pub mod stats;
pub mod trades;

use crate::dataset::types::{DashboardData, Drawdown, EquityCurve, RollingSharpe};
use chrono::NaiveDate;
use std::borrow::Cow;

/// Capital every rebased equity curve starts at.
pub const BASE_CAPITAL: f64 = 10_000.0;

/// Round half away from zero to 2 decimals. Never returns negative zero.
#[inline]
pub fn round2(value: f64) -> f64 {
    let rounded = (value * 100.0).round() / 100.0;
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

/// What a rebase request resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebasePlan {
    /// Serve the dataset as-is.
    Identity,
    /// Slice every series at `start_index` and recompute. `target` is
    /// January 1st of the requested year.
    Rebased { start_index: usize, target: NaiveDate },
}

/// Resolve a start year against the dataset. Identity when no year is given,
/// when the year starts at or before the first date, or when it lies past
/// the last date.
pub fn plan_rebase(data: &DashboardData, start_year: Option<i32>) -> RebasePlan {
    let Some(target) = start_year.and_then(|y| NaiveDate::from_ymd_opt(y, 1, 1)) else {
        return RebasePlan::Identity;
    };

    let dates = &data.equity_curve.dates;
    let start_index = locate::find_start_index(dates, target);
    if start_index == 0 || start_index >= dates.len() {
        return RebasePlan::Identity;
    }

    RebasePlan::Rebased { start_index, target }
}

/// Rebase the dataset as if capital had been deployed on January 1st of
/// `start_year`. Returns the input itself on the identity path.
pub fn rebase_dashboard(data: &DashboardData, start_year: Option<i32>) -> Cow<'_, DashboardData> {
    match plan_rebase(data, start_year) {
        RebasePlan::Identity => Cow::Borrowed(data),
        RebasePlan::Rebased { start_index, target } => {
            tracing::debug!(?start_year, start_index, "rebasing dataset");
            Cow::Owned(rebase_from(data, start_index, target))
        }
    }
}

fn rebase_from(data: &DashboardData, idx: usize, target: NaiveDate) -> DashboardData {
    let eq = &data.equity_curve;

    let dates = tail(&eq.dates, idx);
    let raw_portfolio = tail(&eq.portfolio_value, idx);
    let raw_btc = tail(&eq.btc_benchmark, idx);
    let raw_step = tail(&eq.step_chart, idx);

    let portfolio_value = rescale::rescale(&raw_portfolio);
    let btc_benchmark = rescale::rescale_sparse(&raw_btc);
    let step_chart = rescale::rescale_sparse(&raw_step);

    let drawdown = Drawdown {
        dates: dates.clone(),
        drawdown_pct: drawdown::drawdown(&portfolio_value),
        trade_only_drawdown_pct: drawdown::drawdown_sparse(&step_chart),
        btc_drawdown_pct: drawdown::drawdown_sparse(&btc_benchmark),
    };

    // The rolling window keeps the exporter's values; only its date range moves.
    // It may sit on its own calendar, so it is cut at the target date.
    let rs = &data.rolling_sharpe;
    let rs_idx = locate::find_start_index(&rs.dates, target);
    let rolling_sharpe = RollingSharpe {
        dates: tail(&rs.dates, rs_idx),
        sharpe_90d: tail(&rs.sharpe_90d, rs_idx),
    };

    let monthly_returns = monthly::monthly_returns(&dates, &portfolio_value);

    // Trades are matched against capital before rescaling.
    let boundary_value = raw_portfolio.first().copied().unwrap_or_default();
    let per_trade_returns = trades::filter_trades(&data.per_trade_returns, boundary_value);

    let equity_curve = EquityCurve {
        dates,
        portfolio_value,
        btc_benchmark,
        step_chart,
    };

    let statistics = stats::compute_statistics(
        &equity_curve,
        &drawdown,
        &monthly_returns,
        &per_trade_returns,
    );

    let mut metadata = data.metadata.clone();
    if let Some(first) = equity_curve.dates.first() {
        metadata.start_date = first.format("%Y-%m-%d").to_string();
    }

    DashboardData {
        metadata,
        equity_curve,
        drawdown,
        monthly_returns,
        rolling_sharpe,
        statistics,
        per_trade_returns,
        current_position: data.current_position.clone(),
        extra: data.extra.clone(),
    }
}

/// `values[idx..]`, or empty when the series is shorter than `idx`
/// (older exports leave optional series empty).
fn tail<T: Clone>(values: &[T], idx: usize) -> Vec<T> {
    values.get(idx..).map(<[T]>::to_vec).unwrap_or_default()
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn test_round2_half_away_from_zero() {
        assert_eq!(round2(1.005_000_1), 1.01);
        assert_eq!(round2(-2.345_000_1), -2.35);
        assert_eq!(round2(0.125), 0.13);
        assert_eq!(round2(-0.125), -0.13);
        assert!(round2(-0.001).is_sign_positive(), "negative zero must be normalized");
    }

    #[test]
    fn test_identity_without_start_year() {
        let data = sample_dashboard();
        let out = rebase_dashboard(&data, None);
        assert!(matches!(out, Cow::Borrowed(r) if std::ptr::eq(r, &data)));
    }

    #[test]
    fn test_identity_for_natural_start_year() {
        let data = sample_dashboard();
        assert_eq!(plan_rebase(&data, Some(2021)), RebasePlan::Identity);
        assert!(matches!(rebase_dashboard(&data, Some(2021)), Cow::Borrowed(_)));
        // Earlier than the data also resolves to the first index.
        assert_eq!(plan_rebase(&data, Some(2015)), RebasePlan::Identity);
    }

    #[test]
    fn test_identity_past_end_of_data() {
        let data = sample_dashboard();
        assert_eq!(plan_rebase(&data, Some(2024)), RebasePlan::Identity);
        assert_eq!(plan_rebase(&data, Some(i32::MAX)), RebasePlan::Identity);
    }

    #[test]
    fn test_identity_on_empty_dataset() {
        let data = DashboardData::default();
        assert_eq!(plan_rebase(&data, Some(2022)), RebasePlan::Identity);
    }

    #[test]
    fn test_rebase_anchors_at_base_capital() {
        let data = sample_dashboard();
        let out = rebase_dashboard(&data, Some(2022)).into_owned();

        assert_eq!(out.equity_curve.portfolio_value[0], BASE_CAPITAL);
        assert_eq!(out.equity_curve.btc_benchmark[0], Some(BASE_CAPITAL));
        assert_eq!(out.equity_curve.step_chart[0], Some(BASE_CAPITAL));
        assert_eq!(out.statistics.starting_capital, BASE_CAPITAL);
        // 27_000 / 24_800 * 10_000 = 10_887.10; 28_000 / 24_800 * 10_000 = 11_290.32
        assert_eq!(out.equity_curve.portfolio_value[4], 10_887.10);
        assert_eq!(out.statistics.final_capital, 11_290.32);
        assert_eq!(out.statistics.total_return_pct, 12.9);
    }

    #[test]
    fn test_rebased_dates_are_suffix_of_original() {
        let data = sample_dashboard();
        let out = rebase_dashboard(&data, Some(2023)).into_owned();
        let n = out.equity_curve.dates.len();

        assert_eq!(n, 3);
        assert_eq!(out.equity_curve.dates[..], data.equity_curve.dates[data.equity_curve.dates.len() - n..]);
        assert_eq!(out.drawdown.dates, out.equity_curve.dates);
        assert_eq!(out.equity_curve.portfolio_value.len(), n);
        assert_eq!(out.equity_curve.btc_benchmark.len(), n);
        assert_eq!(out.equity_curve.step_chart.len(), n);
        assert_eq!(out.drawdown.drawdown_pct.len(), n);
        assert_eq!(out.drawdown.trade_only_drawdown_pct.len(), n);
        assert_eq!(out.drawdown.btc_drawdown_pct.len(), n);
        assert_eq!(out.metadata.start_date, "2023-01-31");
    }

    #[test]
    fn test_rebase_recomputes_drawdowns() {
        let data = sample_dashboard();
        let out = rebase_dashboard(&data, Some(2022)).into_owned();

        assert!(out.drawdown.drawdown_pct.iter().all(|d| *d <= 0.0));
        assert!(out.drawdown.trade_only_drawdown_pct.iter().flatten().all(|d| *d <= 0.0));
        assert!(out.drawdown.btc_drawdown_pct.iter().flatten().all(|d| *d <= 0.0));
        // 23_200 after a 24_800 peak.
        assert_eq!(out.drawdown.drawdown_pct[1], -6.45);
        // 28_000 after the 30_000 peak.
        assert_eq!(out.statistics.max_drawdown_pct, -6.67);
        // BTC fell from 42_000 to 16_000.
        assert_eq!(out.drawdown.btc_drawdown_pct[4], Some(-61.9));
        // Null step chart points stay null.
        assert_eq!(out.drawdown.trade_only_drawdown_pct[1], None);
    }

    #[test]
    fn test_rebase_preserves_metadata_and_position() {
        let mut data = sample_dashboard();
        data.metadata.extra.insert("timeframe".into(), serde_json::json!("1d"));
        let out = rebase_dashboard(&data, Some(2022)).into_owned();

        assert_eq!(out.metadata.start_date, "2022-01-31");
        assert_eq!(out.metadata.end_date, data.metadata.end_date);
        assert_eq!(out.metadata.strategy_name, data.metadata.strategy_name);
        assert_eq!(out.metadata.extra.get("timeframe"), Some(&serde_json::json!("1d")));
        assert_eq!(out.current_position, data.current_position);
    }

    #[test]
    fn test_rebase_slices_rolling_sharpe() {
        let data = sample_dashboard();
        let out = rebase_dashboard(&data, Some(2022)).into_owned();
        assert_eq!(out.rolling_sharpe.dates.first(), Some(&date("2022-01-31")));
        assert_eq!(out.rolling_sharpe.sharpe_90d.first(), Some(&Some(1.2)));
        assert_eq!(out.rolling_sharpe.dates.len(), out.rolling_sharpe.sharpe_90d.len());
    }

    #[test]
    fn test_rolling_sharpe_cut_at_target_date() {
        let mut data = sample_dashboard();
        data.rolling_sharpe = RollingSharpe {
            dates: dates(&["2021-12-31", "2022-01-01", "2022-01-31"]),
            sharpe_90d: vec![Some(0.5), Some(0.6), Some(0.7)],
        };

        let out = rebase_dashboard(&data, Some(2022)).into_owned();
        assert_eq!(out.rolling_sharpe.dates, dates(&["2022-01-01", "2022-01-31"]));
        assert_eq!(out.rolling_sharpe.sharpe_90d, vec![Some(0.6), Some(0.7)]);
    }

    #[test]
    fn test_plan_carries_target_date() {
        let data = sample_dashboard();
        assert_eq!(
            plan_rebase(&data, Some(2022)),
            RebasePlan::Rebased { start_index: 3, target: date("2022-01-01") }
        );
    }

    #[test]
    fn test_rebase_keeps_unknown_top_level_blocks() {
        let mut data = sample_dashboard();
        data.extra.insert("benchmarks".into(), serde_json::json!({"eth": [1, 2]}));
        data.statistics.extra.insert("calmar_ratio".into(), serde_json::json!(2.5));

        let out = rebase_dashboard(&data, Some(2022)).into_owned();
        assert_eq!(out.extra, data.extra);
        // Statistics are rebuilt from the window; exporter-only figures do not apply to it.
        assert!(out.statistics.extra.is_empty());
    }

    #[test]
    fn test_rebase_reindexes_trades() {
        let data = sample_dashboard();
        let out = rebase_dashboard(&data, Some(2023)).into_owned();
        // Boundary 27_500, threshold 26_125: only the last trade qualifies.
        assert_eq!(out.per_trade_returns.len(), 1);
        assert_eq!(out.per_trade_returns[0].trade_id, 0);
        assert_eq!(out.per_trade_returns[0].cv_start, 27_000.0);
        assert_eq!(out.statistics.num_trades, 1);
        assert_eq!(out.statistics.best_trade_pct, Some(7.41));
    }

    #[test]
    fn test_rebase_without_optional_series() {
        let mut data = sample_dashboard();
        data.equity_curve.step_chart.clear();
        data.equity_curve.btc_benchmark.clear();
        data.per_trade_returns.clear();

        let out = rebase_dashboard(&data, Some(2022)).into_owned();
        assert!(out.equity_curve.step_chart.is_empty());
        assert!(out.drawdown.trade_only_drawdown_pct.is_empty());
        assert_eq!(out.statistics.max_realised_drawdown_pct, None);
        assert_eq!(out.statistics.strategy_vs_btc_pct, None);
        assert_eq!(out.statistics.best_trade_pct, None);
        assert_eq!(out.statistics.num_trades, 0);
    }

    #[test]
    fn test_single_remaining_day() {
        let mut data = sample_dashboard();
        data.equity_curve.dates.push(date("2024-01-01"));
        data.equity_curve.portfolio_value.push(28_500.0);
        data.equity_curve.btc_benchmark.push(Some(44_000.0));
        data.equity_curve.step_chart.push(None);

        let out = rebase_dashboard(&data, Some(2024)).into_owned();
        assert_eq!(out.equity_curve.dates.len(), 1);
        assert_eq!(out.equity_curve.portfolio_value, vec![BASE_CAPITAL]);
        assert_eq!(out.drawdown.drawdown_pct, vec![0.0]);
        assert!(out.monthly_returns.is_empty());
        assert_eq!(out.statistics.sharpe_ratio, None);
        assert_eq!(out.statistics.sortino_ratio, None);
        assert_eq!(out.statistics.annualized_return_pct, None);
        assert_eq!(out.statistics.total_return_pct, 0.0);
        assert_eq!(out.statistics.best_month_pct, None);
        // The step chart has no value left, so there is nothing realised.
        assert_eq!(out.statistics.max_realised_drawdown_pct, None);
    }

    #[test]
    fn test_monthly_compounding_matches_total_return() {
        let data = sample_dashboard();
        let out = rebase_dashboard(&data, Some(2023)).into_owned();

        // The 2023 window starts on Jan 31; the first day contributes no return.
        let year = &out.monthly_returns[&2023];
        let compounded = year
            .values()
            .flatten()
            .fold(1.0, |acc, m| acc * (1.0 + m / 100.0))
            - 1.0;
        assert!(
            (compounded * 100.0 - out.statistics.total_return_pct).abs() < 0.05,
            "compounded={} total={}",
            compounded * 100.0,
            out.statistics.total_return_pct
        );
    }

    #[test]
    fn test_rebase_is_deterministic() {
        let data = sample_dashboard();
        let a = rebase_dashboard(&data, Some(2022)).into_owned();
        let b = rebase_dashboard(&data, Some(2022)).into_owned();
        assert_eq!(a, b);
    }
}
