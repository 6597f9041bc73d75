//! End-to-end analysis: raw items in, item reports and both indices out.
//!
//! Shape is a plain fan-out/fan-in:
//! - fan-out (per item, in parallel): series construction and trailing trend;
//! - fan-in (across items): union calendar, forward fill, weights, indices.
//!
//! The whole thing is a pure function of its inputs. Items are keyed and
//! iterated by name, so floating-point sums always run in the same order and
//! repeated runs produce identical output.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::NaiveDate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calendar::FilledPanel;
use crate::error::{Error, Result};
use crate::index::{
    ChainedIndexPoint, ChainedSummary, WeightedIndex, WeightedIndexOptions, chained_index,
    summarize, weighted_index,
};
use crate::models::{ChartPoint, Item, ItemSeries};
use crate::series::{Anchor, build_item_series};
use crate::trend::{TrendResult, trailing_trend};
use crate::weights::{WeightTable, assign_weights};

fn default_trend_days() -> u32 {
    7
}

/// Knobs for one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AnalysisOptions {
    /// Trailing trend window per item, in days.
    #[serde(default = "default_trend_days")]
    pub trend_days: u32,
    /// Exponential smoothing factor for the weighted index, in `(0, 1]`.
    #[serde(default)]
    pub smoothing: Option<f64>,
    /// Explicit base day for the weighted index.
    #[serde(default)]
    pub base_day: Option<NaiveDate>,
    /// Window for the chained summary; defaults to `trend_days`.
    #[serde(default)]
    pub summary_days: Option<u32>,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            trend_days: default_trend_days(),
            smoothing: None,
            base_day: None,
            summary_days: None,
        }
    }
}

impl AnalysisOptions {
    /// Reject options that make the analysis meaningless.
    pub fn validate(&self) -> Result<()> {
        if self.trend_days == 0 {
            return Err(Error::ZeroWindow("trend"));
        }
        if self.summary_days == Some(0) {
            return Err(Error::ZeroWindow("summary"));
        }
        if let Some(alpha) = self.smoothing {
            if !(alpha.is_finite() && alpha > 0.0 && alpha <= 1.0) {
                return Err(Error::InvalidSmoothing(alpha));
            }
        }
        Ok(())
    }
}

/// Per-item output.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemReport {
    /// Unique item name (duplicates are suffixed `#2`, `#3`, ...).
    pub name: String,
    /// Category as supplied.
    pub category: String,
    /// Normalized composite weight.
    pub weight: f64,
    /// Daily series.
    pub series: ItemSeries,
    /// Series with strictly increasing chart timestamps.
    pub chart_points: Vec<ChartPoint>,
    /// Trailing trend.
    pub trend: TrendResult,
}

/// Full analysis output.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketAnalysis {
    /// Union calendar shared by both indices.
    pub calendar: Vec<NaiveDate>,
    /// One report per item, in name order.
    pub items: Vec<ItemReport>,
    /// Category-weighted level index.
    pub weighted_index: WeightedIndex,
    /// Day-chained market index.
    pub chained_index: Vec<ChainedIndexPoint>,
    /// Headline figures of the chained index.
    pub summary: ChainedSummary,
}

/// Give every item a unique name, suffixing later duplicates in input order.
///
/// A suffix is never one of the input names, so a generated `Tin#2` cannot
/// shadow a real item called `Tin#2`.
fn unique_names(items: &[Item]) -> Vec<String> {
    let originals: HashSet<&str> = items.iter().map(|item| item.name.as_str()).collect();
    let mut taken: HashSet<String> = HashSet::with_capacity(items.len());
    let mut next_suffix: HashMap<&str, usize> = HashMap::new();

    items
        .iter()
        .map(|item| {
            let name = item.name.as_str();
            if taken.insert(name.to_string()) {
                return name.to_string();
            }
            let n = next_suffix.entry(name).or_insert(1);
            loop {
                *n += 1;
                let candidate = format!("{name}#{n}");
                if !originals.contains(candidate.as_str()) && taken.insert(candidate.clone()) {
                    debug!(item = %name, renamed = %candidate, "duplicate item name");
                    return candidate;
                }
            }
        })
        .collect()
}

struct ItemWork<'a> {
    item: &'a Item,
    series: ItemSeries,
    trend: TrendResult,
}

/// Run the full engine over `items`.
///
/// Empty input is not an error: every output is simply empty.
pub fn analyze(items: &[Item], table: &WeightTable, opts: &AnalysisOptions) -> Result<MarketAnalysis> {
    opts.validate()?;

    let names = unique_names(items);

    // fan-out
    let built: Vec<(String, ItemWork<'_>)> = items
        .par_iter()
        .zip(names.into_par_iter())
        .map(|(item, name)| {
            let (series, report) = build_item_series(&item.observations, Anchor::for_item(item));
            debug!(item = %name, ?report, "series built");
            let trend = trailing_trend(&series, opts.trend_days);
            (name, ItemWork { item, series, trend })
        })
        .collect();
    let work: BTreeMap<String, ItemWork<'_>> = built.into_iter().collect();

    // fan-in
    let series: BTreeMap<String, ItemSeries> = work
        .iter()
        .map(|(name, w)| (name.clone(), w.series.clone()))
        .collect();
    let panel = FilledPanel::build(&series);
    let weights = assign_weights(
        work.iter().map(|(name, w)| (name.as_str(), w.item.category.as_str())),
        table,
    );

    let weighted = weighted_index(
        &panel,
        &weights,
        WeightedIndexOptions {
            smoothing: opts.smoothing,
            base_day: opts.base_day,
        },
    );
    let chained = chained_index(&panel);
    let summary = summarize(&chained, opts.summary_days.unwrap_or(opts.trend_days));

    debug!(
        items = work.len(),
        days = panel.calendar().len(),
        base_day = ?weighted.base_day,
        "analysis complete"
    );

    let items = work
        .into_iter()
        .map(|(name, w)| ItemReport {
            weight: weights.get(&name),
            category: w.item.category.clone(),
            chart_points: w.series.chart_points(),
            series: w.series,
            trend: w.trend,
            name,
        })
        .collect();

    Ok(MarketAnalysis {
        calendar: panel.calendar().days().to_vec(),
        items,
        weighted_index: weighted,
        chained_index: chained,
        summary,
    })
}
