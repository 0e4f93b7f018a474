use chrono::{Datelike, NaiveDate};
use smallvec::SmallVec;

/// Index of the first date on or after `target`, or `dates.len()` when every
/// date is earlier. `dates` must be ascending.
pub fn find_start_index(dates: &[NaiveDate], target: NaiveDate) -> usize {
    dates
        .iter()
        .position(|d| *d >= target)
        .unwrap_or(dates.len())
}

/// Every calendar year from the first to the last date, inclusive.
pub fn available_years(dates: &[NaiveDate]) -> SmallVec<[i32; 16]> {
    match (dates.first(), dates.last()) {
        (Some(first), Some(last)) => (first.year()..=last.year()).collect(),
        _ => SmallVec::new(),
    }
}
