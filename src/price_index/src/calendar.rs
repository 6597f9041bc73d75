//! Union calendar and forward fill.
//!
//! [`AlignedCalendar`] is the sorted union of every day that has at least one
//! point in any item's series. [`forward_fill`] projects a single series onto
//! that calendar, carrying the last known price forward and never looking ahead.
//! [`FilledPanel`] bundles the calendar with one filled column per item, keyed by
//! item name in sorted order so cross-item sums always run in the same order.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;

use crate::models::ItemSeries;

/// Sorted set of all distinct days present across all item series.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlignedCalendar {
    days: Vec<NaiveDate>,
}

impl AlignedCalendar {
    /// Build the union calendar of `series`. Empty input yields an empty calendar.
    pub fn align<'a, I>(series: I) -> Self
    where
        I: IntoIterator<Item = &'a ItemSeries>,
    {
        let days: BTreeSet<NaiveDate> = series
            .into_iter()
            .flat_map(|s| s.points().iter().map(|p| p.day))
            .collect();
        Self {
            days: days.into_iter().collect(),
        }
    }

    /// Days in ascending order.
    pub fn days(&self) -> &[NaiveDate] {
        &self.days
    }

    /// Number of calendar days.
    pub fn len(&self) -> usize {
        self.days.len()
    }

    /// True if no item had any valid observation.
    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// Index of `day` in the calendar.
    pub fn position(&self, day: NaiveDate) -> Option<usize> {
        self.days.binary_search(&day).ok()
    }
}

/// One item's series projected onto the calendar. `None` = unknown.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilledSeries {
    values: Vec<Option<f64>>,
}

impl FilledSeries {
    /// Filled values, one per calendar day.
    pub fn values(&self) -> &[Option<f64>] {
        &self.values
    }

    /// Filled value on calendar index `idx`.
    pub fn get(&self, idx: usize) -> Option<f64> {
        self.values.get(idx).copied().flatten()
    }
}

/// Project `series` onto `calendar`, carrying the last known price forward.
///
/// The value at day `d` is the most recent point at or before `d`, or `None`
/// if the item has no point yet. Nothing is ever taken from a later day.
pub fn forward_fill(calendar: &AlignedCalendar, series: &ItemSeries) -> FilledSeries {
    let points = series.points();
    let mut next = 0;
    let mut last_known: Option<f64> = None;

    let values = calendar
        .days()
        .iter()
        .map(|day| {
            while next < points.len() && points[next].day <= *day {
                last_known = Some(points[next].price);
                next += 1;
            }
            last_known
        })
        .collect();

    FilledSeries { values }
}

/// Calendar plus one forward-filled column per item, in item-name order.
#[derive(Debug, Clone, Default)]
pub struct FilledPanel {
    calendar: AlignedCalendar,
    columns: BTreeMap<String, FilledSeries>,
}

impl FilledPanel {
    /// Align and forward-fill every series in `series`.
    pub fn build(series: &BTreeMap<String, ItemSeries>) -> Self {
        let calendar = AlignedCalendar::align(series.values());
        let columns = series
            .iter()
            .map(|(name, s)| (name.clone(), forward_fill(&calendar, s)))
            .collect();
        Self { calendar, columns }
    }

    /// The shared calendar.
    pub fn calendar(&self) -> &AlignedCalendar {
        &self.calendar
    }

    /// Filled columns keyed by item name.
    pub fn columns(&self) -> &BTreeMap<String, FilledSeries> {
        &self.columns
    }

    /// `(name, price)` for every item with a known price on calendar index `idx`,
    /// in name order.
    pub fn priced_on(&self, idx: usize) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.columns
            .iter()
            .filter_map(move |(name, col)| col.get(idx).map(|p| (name.as_str(), p)))
    }
}
