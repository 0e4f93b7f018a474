use super::round2;
use crate::dataset::types::MonthlyReturns;
use chrono::{Datelike, NaiveDate};
use std::collections::BTreeMap;

/// Compound daily returns into calendar-month percentages.
///
/// Each return v[i] / v[i-1] - 1 is attributed to the month of `dates[i]`.
/// Months with no contributing day are absent, not zero.
pub fn monthly_returns(dates: &[NaiveDate], values: &[f64]) -> MonthlyReturns {
    let mut growth: BTreeMap<(i32, u32), f64> = BTreeMap::new();

    for (date, pair) in dates.iter().skip(1).zip(values.windows(2)) {
        if pair[0] == 0.0 {
            continue;
        }
        let daily = pair[1] / pair[0] - 1.0;
        *growth.entry((date.year(), date.month())).or_insert(1.0) *= 1.0 + daily;
    }

    let mut out = MonthlyReturns::new();
    for ((year, month), product) in growth {
        let pct = round2((product - 1.0) * 100.0);
        out.entry(year)
            .or_default()
            .insert(month, pct.is_finite().then_some(pct));
    }
    out
}

/// Compound each year's months into an annual percentage. A year whose
/// months are all null maps to `None`.
pub fn annual_returns(monthly: &MonthlyReturns) -> BTreeMap<i32, Option<f64>> {
    monthly
        .iter()
        .map(|(year, months)| {
            let mut product = 1.0;
            let mut has_data = false;
            for pct in months.values().flatten() {
                product *= 1.0 + pct / 100.0;
                has_data = true;
            }
            (*year, has_data.then(|| round2((product - 1.0) * 100.0)))
        })
        .collect()
}

/// All non-null monthly percentages, year by year, in month order.
pub fn flatten(monthly: &MonthlyReturns) -> Vec<f64> {
    monthly
        .values()
        .flat_map(|months| months.values().flatten().copied())
        .collect()
}
