//! Category-weighted composite level index, rebased to 100.
//!
//! Per calendar day: take the items with a known (forward-filled) price,
//! renormalize their weights among just those items, and average. The raw
//! composite is optionally smoothed (single exponential, `S_t = a*V_t + (1-a)*S_{t-1}`)
//! and finally divided by the base-day value and multiplied by 100.
//!
//! Days without any weighted price stay `None` all the way through. They are
//! not counted as zero and do not advance the smoothing state.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::warn;

use crate::calendar::FilledPanel;
use crate::index::BASE_VALUE;
use crate::weights::ItemWeights;

/// One day of a composite series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CompositeIndexPoint {
    /// Calendar day.
    pub day: NaiveDate,
    /// Value, `None` when unknown.
    pub value: Option<f64>,
}

/// Options for [`weighted_index`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WeightedIndexOptions {
    /// Exponential smoothing factor in `(0, 1]`; `None` disables smoothing.
    pub smoothing: Option<f64>,
    /// Explicit base day; defaults to the first day with a composite value.
    pub base_day: Option<NaiveDate>,
}

/// Output of [`weighted_index`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightedIndex {
    /// Day the index equals exactly 100, if resolvable.
    pub base_day: Option<NaiveDate>,
    /// Weighted average price per day, before smoothing and rebasing.
    pub raw: Vec<CompositeIndexPoint>,
    /// Base-100 index per day.
    pub points: Vec<CompositeIndexPoint>,
}

/// Weights of the items priced on calendar index `idx`, renormalized to sum to 1.
///
/// `None` when no priced item carries positive weight that day.
pub fn day_weights<'a>(
    panel: &'a FilledPanel,
    weights: &ItemWeights,
    idx: usize,
) -> Option<BTreeMap<&'a str, f64>> {
    let present: BTreeMap<&str, f64> = panel
        .priced_on(idx)
        .map(|(name, _)| (name, weights.get(name)))
        .filter(|(_, w)| *w > 0.0)
        .collect();
    let total: f64 = present.values().sum();
    if total <= 0.0 {
        return None;
    }
    Some(present.into_iter().map(|(k, w)| (k, w / total)).collect())
}

/// Weighted average price per calendar day, using the renormalized weights
/// from [`day_weights`].
pub fn raw_composite(panel: &FilledPanel, weights: &ItemWeights) -> Vec<Option<f64>> {
    (0..panel.calendar().len())
        .map(|idx| {
            let day = day_weights(panel, weights, idx)?;
            Some(
                panel
                    .priced_on(idx)
                    .filter_map(|(name, price)| day.get(name).map(|w| w * price))
                    .sum::<f64>(),
            )
        })
        .collect()
}

/// Single exponential smoothing over the known values of `values`.
///
/// Seeded with the first known value; `None` entries are passed through and
/// leave the running state untouched.
pub fn exponential_smoothing(values: &[Option<f64>], alpha: f64) -> Vec<Option<f64>> {
    let mut state: Option<f64> = None;
    values
        .iter()
        .map(|v| {
            let v = (*v)?;
            let next = match state {
                Some(prev) => alpha * v + (1.0 - alpha) * prev,
                None => v,
            };
            state = Some(next);
            Some(next)
        })
        .collect()
}

/// Rebase `values` so the value at the base day is exactly 100.
///
/// The base day is `base_day` if given, otherwise the first day with a value.
/// If the base value is missing or zero, every output is `None`.
pub fn rebase(
    days: &[NaiveDate],
    values: &[Option<f64>],
    base_day: Option<NaiveDate>,
) -> (Option<NaiveDate>, Vec<Option<f64>>) {
    let base_idx = match base_day {
        Some(day) => days.binary_search(&day).ok(),
        None => values.iter().position(Option::is_some),
    };
    let base = base_idx.and_then(|i| values[i].map(|v| (i, v)));

    match base {
        Some((base_idx, base_value)) if base_value != 0.0 => {
            let rebased = values
                .iter()
                .enumerate()
                .map(|(i, v)| {
                    if i == base_idx {
                        Some(BASE_VALUE)
                    } else {
                        v.map(|v| v / base_value * BASE_VALUE)
                    }
                })
                .collect();
            (Some(days[base_idx]), rebased)
        }
        _ => {
            if !values.is_empty() {
                warn!(?base_day, "composite base value is not resolvable, index is unknown");
            }
            (None, vec![None; values.len()])
        }
    }
}

/// Full category-weighted index: raw composite, optional smoothing, base-100 rebasing.
pub fn weighted_index(
    panel: &FilledPanel,
    weights: &ItemWeights,
    opts: WeightedIndexOptions,
) -> WeightedIndex {
    let days = panel.calendar().days();
    let raw = raw_composite(panel, weights);
    let level = match opts.smoothing {
        Some(alpha) => exponential_smoothing(&raw, alpha),
        None => raw.clone(),
    };
    let (base_day, rebased) = rebase(days, &level, opts.base_day);

    let zip = |values: Vec<Option<f64>>| {
        days.iter()
            .zip(values)
            .map(|(day, value)| CompositeIndexPoint { day: *day, value })
            .collect::<Vec<_>>()
    };

    WeightedIndex {
        base_day,
        raw: zip(raw),
        points: zip(rebased),
    }
}
