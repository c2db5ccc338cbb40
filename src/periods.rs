/// Quarter enumeration for period selectors.
///
/// SSB publishes quarterly figures roughly six weeks after the quarter ends,
/// so the newest quarter worth offering is the one *before* the current one.
///
/// # Clock injection
/// `recent_quarters_at` takes the anchor date explicitly; `recent_quarters`
/// is the wall-clock wrapper. Tests use the former.

use chrono::{Datelike, NaiveDate};

use crate::model::{Period, PopError};

/// The quarter containing `date`.
pub fn quarter_of(date: NaiveDate) -> Period {
    let quarter = ((date.month() - 1) / 3 + 1) as u8;
    Period { year: date.year(), quarter }
}

/// The `n` quarters ending at the quarter preceding `anchor`'s quarter,
/// oldest first.
///
/// ```
/// use chrono::NaiveDate;
/// use popstat_service::periods::recent_quarters_at;
///
/// let anchor = NaiveDate::from_ymd_opt(2024, 8, 15).unwrap();
/// let q: Vec<String> = recent_quarters_at(3, anchor).iter().map(|p| p.to_string()).collect();
/// assert_eq!(q, ["2023K4", "2024K1", "2024K2"]);
/// ```
pub fn recent_quarters_at(n: usize, anchor: NaiveDate) -> Vec<Period> {
    let mut quarters = Vec::with_capacity(n);
    let mut current = quarter_of(anchor).previous();
    for _ in 0..n {
        quarters.push(current);
        current = current.previous();
    }
    quarters.reverse();
    quarters
}

/// Convenience wrapper that uses today's date.
pub fn recent_quarters(n: usize) -> Vec<Period> {
    recent_quarters_at(n, chrono::Local::now().date_naive())
}

/// The newest quarter expected to have published figures.
pub fn latest_published_quarter() -> Period {
    quarter_of(chrono::Local::now().date_naive()).previous()
}

/// All quarters from `from` to `to`, inclusive.
pub fn period_range(from: Period, to: Period) -> Result<Vec<Period>, PopError> {
    if from > to {
        return Err(PopError::InvalidQuery(format!(
            "period range starts after it ends: {} > {}",
            from, to
        )));
    }

    let mut periods = vec![from];
    let mut current = from;
    while current < to {
        current = current.next();
        periods.push(current);
    }
    Ok(periods)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
