use crate::dataset::types::PerTradeReturn;

/// A trade belongs to the window when it opened with at least this share of
/// the capital held on the window's first date. Trades carry no timestamp,
/// so opening capital is the only proxy; the band absorbs trades that
/// opened slightly before the boundary value was marked.
pub const TRADE_WINDOW_TOLERANCE: f64 = 0.95;

/// Keep trades whose `cv_start` is at least `TRADE_WINDOW_TOLERANCE` of
/// `boundary_value` (unrescaled capital at the window start) and renumber
/// them 0..n in their original order.
pub fn filter_trades(trades: &[PerTradeReturn], boundary_value: f64) -> Vec<PerTradeReturn> {
    let threshold = boundary_value * TRADE_WINDOW_TOLERANCE;
    trades
        .iter()
        .filter(|t| t.cv_start >= threshold)
        .enumerate()
        .map(|(trade_id, t)| PerTradeReturn {
            trade_id,
            ..t.clone()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rebase::fixtures::trade;

    fn with_ids(mut trades: Vec<PerTradeReturn>, ids: &[usize]) -> Vec<PerTradeReturn> {
        for (t, id) in trades.iter_mut().zip(ids) {
            t.trade_id = *id;
        }
        trades
    }

    #[test]
    fn test_all_within_band_are_reindexed() {
        let trades = with_ids(
            vec![trade(9_500.0, 1.0), trade(10_200.0, -2.0), trade(15_000.0, 3.0)],
            &[17, 18, 19],
        );
        let out = filter_trades(&trades, 9_800.0);

        assert_eq!(out.len(), 3);
        assert_eq!(out.iter().map(|t| t.trade_id).collect::<Vec<_>>(), vec![0, 1, 2]);
        assert_eq!(out[1].cv_start, 10_200.0);
    }

    #[test]
    fn test_drops_trades_below_threshold() {
        let trades = with_ids(
            vec![trade(5_000.0, 1.0), trade(9_300.0, 2.0), trade(9_310.0, 3.0), trade(12_000.0, 4.0)],
            &[0, 1, 2, 3],
        );
        let out = filter_trades(&trades, 9_800.0);

        assert_eq!(out.len(), 2);
        assert_eq!(out[0].trade_id, 0);
        assert_eq!(out[0].return_pct, 3.0);
        assert_eq!(out[1].trade_id, 1);
        assert_eq!(out[1].return_pct, 4.0);
    }

    #[test]
    fn test_empty_input() {
        assert!(filter_trades(&[], 10_000.0).is_empty());
    }
}
