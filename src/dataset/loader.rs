use crate::dataset::types::DashboardData;
use crate::errors::{DashboardError, DashboardResult};
use base64::Engine as _;
use chrono::{DateTime, NaiveDate, Utc};
use sha2::{Digest, Sha256};
use std::path::Path;
use std::sync::Arc;

/// Identifies one loaded copy of the dataset. `generation` increases on every
/// successful load; `fingerprint` is the content hash of the raw file.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct DatasetVersion {
    pub generation: u64,
    pub fingerprint: String,
}

/// An immutable, validated dataset plus where it came from.
#[derive(Debug, Clone)]
pub struct LoadedDataset {
    pub data: Arc<DashboardData>,
    pub version: DatasetVersion,
    pub loaded_at: DateTime<Utc>,
}

/// SHA-256 of the raw bytes, base64url without padding.
pub fn fingerprint(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(digest)
}

/// Deserialize (with defaults for fields older exports lack) and validate.
pub fn parse_dataset(bytes: &[u8]) -> DashboardResult<DashboardData> {
    let data: DashboardData = serde_json::from_slice(bytes)?;
    validate(&data)?;
    Ok(data)
}

pub fn load_dataset(path: &Path, generation: u64) -> DashboardResult<LoadedDataset> {
    let bytes = std::fs::read(path)
        .map_err(|e| DashboardError::Io(format!("read {}: {e}", path.display())))?;
    from_bytes(&bytes, generation)
}

pub fn from_bytes(bytes: &[u8], generation: u64) -> DashboardResult<LoadedDataset> {
    let data = parse_dataset(bytes)?;
    let version = DatasetVersion {
        generation,
        fingerprint: fingerprint(bytes),
    };

    tracing::info!(
        generation,
        fingerprint = %version.fingerprint,
        points = data.equity_curve.dates.len(),
        trades = data.per_trade_returns.len(),
        "dataset loaded"
    );

    Ok(LoadedDataset {
        data: Arc::new(data),
        version,
        loaded_at: Utc::now(),
    })
}

/// Check the alignment invariants the rebase engine relies on.
pub fn validate(data: &DashboardData) -> DashboardResult<()> {
    let eq = &data.equity_curve;
    let n = eq.dates.len();

    strictly_ascending("equity_curve.dates", &eq.dates)?;
    aligned("equity_curve.portfolio_value", eq.portfolio_value.len(), n, false)?;
    aligned("equity_curve.btc_benchmark", eq.btc_benchmark.len(), n, true)?;
    aligned("equity_curve.step_chart", eq.step_chart.len(), n, true)?;

    let dd = &data.drawdown;
    let m = dd.dates.len();
    strictly_ascending("drawdown.dates", &dd.dates)?;
    aligned("drawdown.drawdown_pct", dd.drawdown_pct.len(), m, true)?;
    aligned("drawdown.trade_only_drawdown_pct", dd.trade_only_drawdown_pct.len(), m, true)?;
    aligned("drawdown.btc_drawdown_pct", dd.btc_drawdown_pct.len(), m, true)?;

    let rs = &data.rolling_sharpe;
    strictly_ascending("rolling_sharpe.dates", &rs.dates)?;
    aligned("rolling_sharpe.sharpe_90d", rs.sharpe_90d.len(), rs.dates.len(), false)?;

    Ok(())
}

fn aligned(field: &str, len: usize, expected: usize, may_be_empty: bool) -> DashboardResult<()> {
    if len == expected || (may_be_empty && len == 0) {
        return Ok(());
    }
    Err(DashboardError::InvalidData(format!(
        "{field} has {len} values for {expected} dates"
    )))
}

fn strictly_ascending(field: &str, dates: &[NaiveDate]) -> DashboardResult<()> {
    match dates.windows(2).position(|w| w[0] >= w[1]) {
        None => Ok(()),
        Some(i) => Err(DashboardError::InvalidData(format!(
            "{field} not strictly ascending at index {}: {} then {}",
            i + 1,
            dates[i],
            dates[i + 1]
        ))),
    }
}
