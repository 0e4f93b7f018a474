use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A series defined only at some dates. `None` marks "no value here",
/// never zero.
pub type SparseSeries = Vec<Option<f64>>;

/// year -> month (1-12) -> return percentage.
pub type MonthlyReturns = BTreeMap<i32, BTreeMap<u32, Option<f64>>>;

/// The full dashboard document, as exported by the backtesting pipeline.
/// Every block defaults when absent so older exports still load.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DashboardData {
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default)]
    pub equity_curve: EquityCurve,
    #[serde(default)]
    pub drawdown: Drawdown,
    #[serde(default, deserialize_with = "de_monthly_returns")]
    pub monthly_returns: MonthlyReturns,
    #[serde(default)]
    pub rolling_sharpe: RollingSharpe,
    #[serde(default)]
    pub statistics: Statistics,
    #[serde(default)]
    pub per_trade_returns: Vec<PerTradeReturn>,
    #[serde(default)]
    pub current_position: CurrentPosition,
    /// Top-level blocks this service does not interpret. Passed through untouched.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Year and month keys arrive as JSON strings. Flattened structs buffer their
/// input, which loses serde_json's string-to-integer key coercion, so the keys
/// are parsed here.
fn de_monthly_returns<'de, D>(deserializer: D) -> Result<MonthlyReturns, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;

    let raw = BTreeMap::<String, BTreeMap<String, Option<f64>>>::deserialize(deserializer)?;
    raw.into_iter()
        .map(|(year, months)| {
            let year = year
                .trim()
                .parse::<i32>()
                .map_err(|e| D::Error::custom(format!("monthly_returns year {year:?}: {e}")))?;
            let months = months
                .into_iter()
                .map(|(month, pct)| {
                    month
                        .trim()
                        .parse::<u32>()
                        .map(|m| (m, pct))
                        .map_err(|e| D::Error::custom(format!("monthly_returns month {month:?}: {e}")))
                })
                .collect::<Result<BTreeMap<_, _>, _>>()?;
            Ok((year, months))
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Metadata {
    pub strategy_name: String,
    pub asset: String,
    pub exchange: String,
    pub start_date: String,
    pub end_date: String,
    pub last_updated: String,
    pub starting_capital: f64,
    /// Descriptive keys this service does not interpret. Passed through untouched.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Date-aligned capital series. `step_chart` only has values at trade
/// boundaries and `btc_benchmark` may start after `dates[0]`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EquityCurve {
    #[serde(default)]
    pub dates: Vec<NaiveDate>,
    #[serde(default)]
    pub portfolio_value: Vec<f64>,
    #[serde(default)]
    pub btc_benchmark: SparseSeries,
    #[serde(default)]
    pub step_chart: SparseSeries,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Drawdown {
    #[serde(default)]
    pub dates: Vec<NaiveDate>,
    #[serde(default)]
    pub drawdown_pct: Vec<f64>,
    #[serde(default)]
    pub trade_only_drawdown_pct: SparseSeries,
    #[serde(default)]
    pub btc_drawdown_pct: SparseSeries,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RollingSharpe {
    #[serde(default)]
    pub dates: Vec<NaiveDate>,
    #[serde(default)]
    pub sharpe_90d: SparseSeries,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Statistics {
    pub total_return_pct: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annualized_return_pct: Option<f64>,
    pub sharpe_ratio: Option<f64>,
    pub sortino_ratio: Option<f64>,
    pub max_drawdown_pct: f64,
    pub max_realised_drawdown_pct: Option<f64>,
    /// Worst single trade.
    pub max_trade_drawdown_pct: Option<f64>,
    pub best_trade_pct: Option<f64>,
    pub num_trades: usize,
    pub strategy_vs_btc_pct: Option<f64>,
    pub best_month_pct: Option<f64>,
    pub worst_month_pct: Option<f64>,
    pub winning_months: usize,
    pub losing_months: usize,
    pub starting_capital: f64,
    pub final_capital: f64,
    /// Exporter figures this service does not recompute. Kept on the
    /// full-history view, empty after a rebase.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// One closed (or open) trade. Trades carry no date; `cv_start` and
/// `cv_exit` are the capital immediately before and after it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerTradeReturn {
    pub trade_id: usize,
    pub side: String,
    pub status: String,
    pub return_pct: f64,
    pub cv_start: f64,
    pub cv_exit: f64,
}

/// Snapshot of the live position. Independent of the history window.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CurrentPosition {
    pub is_open: bool,
    pub side: Option<String>,
    pub entry_capital: Option<f64>,
    pub current_capital: Option<f64>,
    pub unrealized_pnl_usdt: Option<f64>,
    pub unrealized_pnl_pct: Option<f64>,
}

impl DashboardData {
    pub fn first_date(&self) -> Option<NaiveDate> {
        self.equity_curve.dates.first().copied()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.equity_curve.dates.last().copied()
    }
}
