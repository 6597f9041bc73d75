//! Day-chained market index.
//!
//! Measures breadth of movement rather than a weighted price level. For each
//! pair of consecutive calendar days, every item priced on both days
//! contributes its own day-over-day return; the plain average of those returns
//! is the day's `daily_change`, and the index is chained forward:
//!
//! ```text
//! value[0] = 100
//! value[n] = value[n-1] * (1 + daily_change[n])
//! ```
//!
//! A day where no item is priced on both sides has `daily_change = 0` and
//! `item_count = 0`; the index carries flat.

use chrono::NaiveDate;
use serde::Serialize;

use crate::calendar::FilledPanel;
use crate::index::BASE_VALUE;

/// One day of the chained index.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainedIndexPoint {
    /// Calendar day.
    pub day: NaiveDate,
    /// Chained index value.
    pub value: f64,
    /// Average per-item return from the previous day, as a fraction.
    pub daily_change: f64,
    /// Items that contributed to `daily_change`. On the first day, the number
    /// of items priced that day (the base constituents).
    pub item_count: usize,
}

/// Chain a sequence of fractional changes onto a starting value of 100.
///
/// Returns one value per change plus the starting value.
pub fn chain_changes(changes: &[f64]) -> Vec<f64> {
    let mut out = Vec::with_capacity(changes.len() + 1);
    let mut value = BASE_VALUE;
    out.push(value);
    for change in changes {
        value *= 1.0 + change;
        out.push(value);
    }
    out
}

/// Average day-over-day return between calendar indices `idx - 1` and `idx`.
///
/// Only items priced on both days (with a non-zero previous price) count.
/// Returns `(average, contributors)`; `(0.0, 0)` when nobody contributes.
fn average_return(panel: &FilledPanel, idx: usize) -> (f64, usize) {
    let mut sum = 0.0;
    let mut count = 0usize;
    for col in panel.columns().values() {
        if let (Some(prev), Some(cur)) = (col.get(idx - 1), col.get(idx)) {
            if prev != 0.0 {
                sum += (cur - prev) / prev;
                count += 1;
            }
        }
    }
    if count == 0 {
        (0.0, 0)
    } else {
        (sum / count as f64, count)
    }
}

/// Build the chained index over the panel's calendar.
pub fn chained_index(panel: &FilledPanel) -> Vec<ChainedIndexPoint> {
    let days = panel.calendar().days();
    if days.is_empty() {
        return Vec::new();
    }

    let steps: Vec<(f64, usize)> = (1..days.len())
        .map(|idx| average_return(panel, idx))
        .collect();
    let changes: Vec<f64> = steps.iter().map(|(change, _)| *change).collect();
    let values = chain_changes(&changes);

    days.iter()
        .zip(values)
        .enumerate()
        .map(|(i, (day, value))| {
            let (daily_change, item_count) = match i {
                0 => (0.0, panel.priced_on(0).count()),
                _ => steps[i - 1],
            };
            ChainedIndexPoint {
                day: *day,
                value,
                daily_change,
                item_count,
            }
        })
        .collect()
}
