//! Raw observations -> one aggregated point per calendar day.
//!
//! Steps, per item:
//! 1. Drop observations whose day does not parse or whose price is not a usable
//!    number (non-finite or not strictly positive). Dropping is silent for the
//!    caller; it only shows up in the [`BuildReport`] and at `trace` level.
//! 2. Group the rest by UTC calendar day and take the median of each day.
//! 3. Optionally add the release-day [`Anchor`]. If an observation already
//!    covers the release day, the observed median wins and the anchor is skipped.
//! 4. Points come out ascending by day.
//!
//! Chart timestamps are derived separately by [`nudge_collisions`], a pure fold
//! that never touches the logical day of a point.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use tracing::trace;

use crate::day::{day_start_utc, parse_day};
use crate::models::{ChartPoint, Item, ItemSeries, PointKind, PriceObservation, SeriesPoint};

/// Synthetic release-day point built from an item's reference price.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Anchor {
    /// Release day.
    pub day: NaiveDate,
    /// Reference ("retail") price.
    pub price: f64,
}

impl Anchor {
    /// Anchor for `item`, if it has both a parseable release day and a usable
    /// reference price.
    pub fn for_item(item: &Item) -> Option<Self> {
        let price = item.reference_price.filter(|p| usable_price(*p))?;
        let day = parse_day(item.release_day.as_deref()?).ok()?;
        Some(Self { day, price })
    }
}

/// Counters describing one series build. Informational only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildReport {
    /// Observations that made it into a daily median.
    pub kept: usize,
    /// Observations dropped for a bad day or a bad price.
    pub dropped: usize,
    /// Distinct observed days.
    pub days: usize,
    /// Whether the anchor point was inserted.
    pub anchored: bool,
}

fn usable_price(p: f64) -> bool {
    p.is_finite() && p > 0.0
}

/// Median of `prices`; average of the two middle values for even counts.
///
/// Sorts in place. Returns `None` for an empty slice.
pub fn median(prices: &mut [f64]) -> Option<f64> {
    if prices.is_empty() {
        return None;
    }
    prices.sort_by(|a, b| a.total_cmp(b));
    let mid = prices.len() / 2;
    if prices.len() % 2 == 0 {
        Some((prices[mid - 1] + prices[mid]) / 2.0)
    } else {
        Some(prices[mid])
    }
}

/// Build one item's daily series from its raw observations.
pub fn build_item_series(
    observations: &[PriceObservation],
    anchor: Option<Anchor>,
) -> (ItemSeries, BuildReport) {
    let mut report = BuildReport::default();
    let mut by_day: BTreeMap<NaiveDate, Vec<f64>> = BTreeMap::new();

    for obs in observations {
        let day = match parse_day(&obs.day) {
            Ok(day) => day,
            Err(err) => {
                trace!(error = %err, "dropping observation");
                report.dropped += 1;
                continue;
            }
        };
        let Some(price) = obs.price.filter(|p| usable_price(*p)) else {
            trace!(day = %day, price = ?obs.price, "dropping observation with unusable price");
            report.dropped += 1;
            continue;
        };
        by_day.entry(day).or_default().push(price);
        report.kept += 1;
    }
    report.days = by_day.len();

    let mut points: BTreeMap<NaiveDate, SeriesPoint> = by_day
        .into_iter()
        .filter_map(|(day, mut prices)| {
            median(&mut prices).map(|price| {
                (
                    day,
                    SeriesPoint {
                        day,
                        price,
                        kind: PointKind::Observed,
                    },
                )
            })
        })
        .collect();

    if let Some(anchor) = anchor {
        if !points.contains_key(&anchor.day) {
            points.insert(
                anchor.day,
                SeriesPoint {
                    day: anchor.day,
                    price: anchor.price,
                    kind: PointKind::Anchor,
                },
            );
            report.anchored = true;
        }
    }

    (ItemSeries::from_sorted(points.into_values().collect()), report)
}

/// Make a non-decreasing timestamp sequence strictly increasing.
///
/// Any timestamp that does not move past its predecessor is pushed to one
/// millisecond after it. Returns a new vector; the input is consumed, never
/// mutated in place.
pub fn nudge_collisions<I>(timestamps: I) -> Vec<DateTime<Utc>>
where
    I: IntoIterator<Item = DateTime<Utc>>,
{
    timestamps
        .into_iter()
        .fold(Vec::new(), |mut out: Vec<DateTime<Utc>>, ts| {
            let next = match out.last() {
                Some(prev) if ts <= *prev => *prev + Duration::milliseconds(1),
                _ => ts,
            };
            out.push(next);
            out
        })
}

impl ItemSeries {
    /// Points for charting, each with a strictly increasing UTC timestamp.
    pub fn chart_points(&self) -> Vec<ChartPoint> {
        let stamps = nudge_collisions(self.points().iter().map(|p| day_start_utc(p.day)));
        stamps
            .into_iter()
            .zip(self.points())
            .map(|(timestamp, p)| ChartPoint {
                timestamp,
                price: p.price,
            })
            .collect()
    }
}
