//! Canonical in-memory data model for the price-index engine.
//!
//! Inputs ([`Item`], [`PriceObservation`]) mirror what the catalog collaborator
//! hands over: loosely typed, possibly scraped, possibly garbage. Everything
//! downstream of [`crate::series`] works on the cleaned [`ItemSeries`].

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// A single raw price snapshot for one item.
///
/// Several observations on the same day are legal (one per marketplace).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceObservation {
    /// Day of the snapshot, `YYYY-MM-DD` or RFC-3339. Parsed leniently.
    pub day: String,

    /// Observed price. `None` when the source value was not a number.
    #[serde(default, deserialize_with = "lenient_price")]
    pub price: Option<f64>,

    /// Optional marketplace reference (listing URL, source code, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_ref: Option<String>,
}

impl PriceObservation {
    /// Convenience constructor for a numeric observation.
    pub fn new(day: impl Into<String>, price: f64) -> Self {
        Self {
            day: day.into(),
            price: Some(price),
            source_ref: None,
        }
    }
}

/// One tracked product as supplied by the catalog collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    /// Display name; items are keyed by name.
    pub name: String,
    /// Category code, looked up in the weight table.
    pub category: String,
    /// Release day, used to place the reference-price anchor.
    #[serde(default)]
    pub release_day: Option<String>,
    /// Reference ("retail") price at release.
    #[serde(default, deserialize_with = "lenient_price")]
    pub reference_price: Option<f64>,
    /// Raw observations, in any order.
    #[serde(default)]
    pub observations: Vec<PriceObservation>,
}

/// Accepts numbers and numeric strings; anything else becomes `None`.
fn lenient_price<'de, D>(de: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(f64),
        Text(String),
        Other(serde::de::IgnoredAny),
    }

    Ok(match Raw::deserialize(de)? {
        Raw::Num(v) => Some(v),
        Raw::Text(s) => s.trim().parse::<f64>().ok(),
        Raw::Other(_) => None,
    })
}

/// Where a series point came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointKind {
    /// Median of that day's marketplace observations.
    Observed,
    /// Synthetic release-day point carrying the reference price.
    Anchor,
}

/// One aggregated point of an [`ItemSeries`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    /// Calendar day (UTC).
    pub day: NaiveDate,
    /// Aggregated price for the day.
    pub price: f64,
    /// Observed or anchor.
    pub kind: PointKind,
}

/// Per-item daily series: at most one point per day, ascending by day.
///
/// Built by [`crate::series::build_item_series`]; the constructor is crate-private
/// so the ordering invariant cannot be broken from outside.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ItemSeries {
    points: Vec<SeriesPoint>,
}

impl ItemSeries {
    pub(crate) fn from_sorted(points: Vec<SeriesPoint>) -> Self {
        debug_assert!(points.windows(2).all(|w| w[0].day < w[1].day));
        Self { points }
    }

    /// All points, ascending by day.
    pub fn points(&self) -> &[SeriesPoint] {
        &self.points
    }

    /// Final (most recent) point.
    pub fn last(&self) -> Option<&SeriesPoint> {
        self.points.last()
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True when the item has no usable data at all.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Price recorded exactly on `day`, if any.
    pub fn price_on(&self, day: NaiveDate) -> Option<f64> {
        self.points
            .binary_search_by(|p| p.day.cmp(&day))
            .ok()
            .map(|i| self.points[i].price)
    }
}

/// Charting view of a series point with a strictly increasing timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChartPoint {
    /// UTC timestamp, unique within one series.
    pub timestamp: DateTime<Utc>,
    /// Price at that point.
    pub price: f64,
}
