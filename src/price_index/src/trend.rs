//! Trailing trend over a tolerance window.
//!
//! For a window of `N` days the reference point is searched in
//! `[last - 2N, last - ceil(5N/7)]` (for N = 7: `[last - 14, last - 5]`),
//! taking the point closest to `last - N`. The window is wider than exactly N
//! days to ride over sampling gaps, but it stops short of the last point itself
//! and does not reach back far enough for an old release-day anchor to pass for
//! "a week ago". No point in the window means the trend is unknown, not 0.

use chrono::NaiveDate;
use serde::Serialize;

use crate::day::{days_before, days_between};
use crate::models::ItemSeries;

/// Last price and trailing percent change of one item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendResult {
    /// Price of the final series point.
    pub last_price: Option<f64>,
    /// Percent change versus the reference point, `None` when unknown.
    pub trend: Option<f64>,
}

/// Percent change from `from` to `to`; `None` if `from` is zero or the result
/// is not finite.
pub fn percent_change(from: f64, to: f64) -> Option<f64> {
    if from == 0.0 {
        return None;
    }
    let pct = (to - from) / from * 100.0;
    pct.is_finite().then_some(pct)
}

/// Inclusive tolerance window `[last - 2N, last - ceil(5N/7)]` for an `N`-day trend.
pub fn tolerance_window(last: NaiveDate, window_days: u32) -> Option<(NaiveDate, NaiveDate)> {
    let n = u64::from(window_days);
    let earliest = days_before(last, 2 * n)?;
    let latest = days_before(last, (5 * n).div_ceil(7))?;
    Some((earliest, latest))
}

/// Trailing `window_days` trend of `series`, measured at its final point.
pub fn trailing_trend(series: &ItemSeries, window_days: u32) -> TrendResult {
    let Some(last) = series.last() else {
        return TrendResult::default();
    };
    let mut result = TrendResult {
        last_price: Some(last.price),
        trend: None,
    };

    let (Some((earliest, latest)), Some(target)) = (
        tolerance_window(last.day, window_days),
        days_before(last.day, u64::from(window_days)),
    ) else {
        return result;
    };

    let mut best: Option<(i64, f64)> = None;
    for point in series.points().iter().rev() {
        if point.day < earliest {
            break;
        }
        if point.day > latest {
            continue;
        }
        let distance = days_between(point.day, target).abs();
        if best.is_none_or(|(d, _)| distance < d) {
            best = Some((distance, point.price));
        }
    }

    result.trend = best.and_then(|(_, price)| percent_change(price, last.price));
    result
}
