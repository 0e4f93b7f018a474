use super::{monthly, ratios, round2, BASE_CAPITAL};
use crate::dataset::types::{Drawdown, EquityCurve, MonthlyReturns, PerTradeReturn, Statistics};

/// Summary figures for a rebased window. Pure function of the rebased
/// series; nothing is carried over from the exported statistics.
pub fn compute_statistics(
    equity: &EquityCurve,
    drawdown: &Drawdown,
    monthly_returns: &MonthlyReturns,
    trades: &[PerTradeReturn],
) -> Statistics {
    let final_capital = equity.portfolio_value.last().copied().unwrap_or(BASE_CAPITAL);
    let total_return_pct = round2((final_capital / BASE_CAPITAL - 1.0) * 100.0);

    let max_drawdown_pct = round2(drawdown.drawdown_pct.iter().copied().fold(0.0, f64::min));
    let max_realised_drawdown_pct = drawdown
        .trade_only_drawdown_pct
        .iter()
        .flatten()
        .copied()
        .reduce(f64::min)
        .map(round2);

    let returns = ratios::period_returns(&equity.portfolio_value);

    let trade_returns = trades.iter().map(|t| t.return_pct);
    let best_trade_pct = trade_returns.clone().reduce(f64::max).map(round2);
    let max_trade_drawdown_pct = trade_returns.reduce(f64::min).map(round2);

    let strategy_vs_btc_pct =
        benchmark_return(&equity.btc_benchmark).map(|btc| round2(total_return_pct - btc));

    let months = monthly::flatten(monthly_returns);

    Statistics {
        total_return_pct,
        annualized_return_pct: annualized_return(equity, final_capital),
        sharpe_ratio: ratios::sharpe_ratio(&returns),
        sortino_ratio: ratios::sortino_ratio(&returns),
        max_drawdown_pct,
        max_realised_drawdown_pct,
        max_trade_drawdown_pct,
        best_trade_pct,
        num_trades: trades.len(),
        strategy_vs_btc_pct,
        best_month_pct: months.iter().copied().reduce(f64::max),
        worst_month_pct: months.iter().copied().reduce(f64::min),
        winning_months: months.iter().filter(|m| **m > 0.0).count(),
        losing_months: months.iter().filter(|m| **m < 0.0).count(),
        starting_capital: BASE_CAPITAL,
        final_capital: round2(final_capital),
        extra: serde_json::Map::new(),
    }
}

/// Benchmark return from its first non-null value to its last value, in
/// percent (unrounded). `None` if either end is missing.
fn benchmark_return(benchmark: &[Option<f64>]) -> Option<f64> {
    let start = benchmark.iter().flatten().copied().next()?;
    let end = (*benchmark.last()?)?;
    if start == 0.0 {
        return None;
    }
    Some((end / start - 1.0) * 100.0)
}

/// Compound annual growth over the calendar span of the window.
fn annualized_return(equity: &EquityCurve, final_capital: f64) -> Option<f64> {
    let (first, last) = (equity.dates.first()?, equity.dates.last()?);
    let days = (*last - *first).num_days();
    if days <= 0 || final_capital <= 0.0 {
        return None;
    }
    let growth = (final_capital / BASE_CAPITAL).powf(365.0 / days as f64);
    let pct = round2((growth - 1.0) * 100.0);
    pct.is_finite().then_some(pct)
}
