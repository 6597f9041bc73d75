//! Headline figures for the chained market index.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::day::days_before;
use crate::index::chained::ChainedIndexPoint;
use crate::trend::percent_change;

/// Qualitative direction of the recent chained-index change.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendLabel {
    /// Change of +5% or more.
    StrongUp,
    /// Change above +1%.
    Up,
    /// Change within +/-1%.
    Flat,
    /// Change below -1%.
    Down,
    /// Change of -5% or less.
    StrongDown,
    /// No reference point.
    #[default]
    Unknown,
}

impl TrendLabel {
    /// Label for a percent change.
    pub fn from_change(change: Option<f64>) -> Self {
        match change {
            None => TrendLabel::Unknown,
            Some(c) if c >= 5.0 => TrendLabel::StrongUp,
            Some(c) if c > 1.0 => TrendLabel::Up,
            Some(c) if c <= -5.0 => TrendLabel::StrongDown,
            Some(c) if c < -1.0 => TrendLabel::Down,
            Some(_) => TrendLabel::Flat,
        }
    }
}

/// Summary fields over a chained index. Changes are in percent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainedSummary {
    /// Latest chained value.
    pub current_value: Option<f64>,
    /// Window used for `change_window` and the label.
    pub window_days: u32,
    /// Change over the trailing `window_days`.
    pub change_window: Option<f64>,
    /// Change over 30 days.
    pub change_30d: Option<f64>,
    /// Change over 90 days.
    pub change_90d: Option<f64>,
    /// Change since the end of the previous calendar year.
    pub change_ytd: Option<f64>,
    /// Direction of `change_window`.
    pub trend: TrendLabel,
}

/// Value at the latest point on or before `day`.
fn value_as_of(points: &[ChainedIndexPoint], day: NaiveDate) -> Option<f64> {
    let idx = points.partition_point(|p| p.day <= day);
    idx.checked_sub(1).map(|i| points[i].value)
}

fn change_over(points: &[ChainedIndexPoint], last: &ChainedIndexPoint, days: u32) -> Option<f64> {
    let target = days_before(last.day, u64::from(days))?;
    percent_change(value_as_of(points, target)?, last.value)
}

fn change_ytd(points: &[ChainedIndexPoint], last: &ChainedIndexPoint) -> Option<f64> {
    let year_start = NaiveDate::from_ymd_opt(last.day.year(), 1, 1)?;
    let reference = match days_before(year_start, 1).and_then(|d| value_as_of(points, d)) {
        Some(v) => v,
        None => points.iter().find(|p| p.day >= year_start)?.value,
    };
    percent_change(reference, last.value)
}

/// Summarize a chained index. `points` must be ascending by day.
pub fn summarize(points: &[ChainedIndexPoint], window_days: u32) -> ChainedSummary {
    let Some(last) = points.last() else {
        return ChainedSummary {
            window_days,
            ..ChainedSummary::default()
        };
    };
    let change_window = change_over(points, last, window_days);
    ChainedSummary {
        current_value: Some(last.value),
        window_days,
        change_window,
        change_30d: change_over(points, last, 30),
        change_90d: change_over(points, last, 90),
        change_ytd: change_ytd(points, last),
        trend: TrendLabel::from_change(change_window),
    }
}
