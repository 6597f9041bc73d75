//! Category weight table: parsing, normalization, loading, and per-item assignment.
//!
//! The table is a TOML document mapping category codes to weight fractions:
//!
//! ```toml
//! [categories]
//! booster_box = 0.35
//! accessory = 0.05
//! ```
//!
//! Key behaviors:
//! - Normalization trims and lowercases category codes and rejects codes that are
//!   empty or collide after normalization.
//! - Negative or non-finite weights are dropped or treated as an error via
//!   [`InvalidWeightPolicy`].
//! - [`assign_weights`] splits each category's weight evenly across the items in
//!   that category and renormalizes the result to sum to 1.
//!
//! Entrypoints:
//! - Parse only (keys and weights as written): [`parse_weights_str`], [`parse_weights_path`]
//! - Parse + normalize from a TOML string: [`load_weights_str`]
//! - Parse + normalize from a file path: [`load_weights_path`]
//! - Bundled default table: [`WeightTable::builtin`]

use std::collections::BTreeMap;

use anyhow::{Context, bail};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Default table shipped with the crate.
const BUILTIN_WEIGHTS: &str = include_str!("../config/category_weights.toml");

/// Category code -> weight fraction.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WeightTable {
    /// Weight per category, in declaration order.
    ///
    /// Keys are normalized (trimmed, lowercase) by [`normalize_weights_with_policy`].
    pub categories: IndexMap<String, f64>,
}

impl WeightTable {
    /// The bundled default table, already normalized.
    pub fn builtin() -> anyhow::Result<Self> {
        load_weights_str(BUILTIN_WEIGHTS).context("bundled weight table")
    }

    /// Weight for `category` (normalized on lookup), `0.0` when absent.
    pub fn weight(&self, category: &str) -> f64 {
        self.categories
            .get(&normalize_code(category))
            .copied()
            .unwrap_or(0.0)
    }

    /// Sum of all table weights.
    pub fn total(&self) -> f64 {
        self.categories.values().sum()
    }
}

/// Summary of changes performed during normalization.
#[derive(Debug, Default, Serialize)]
pub struct NormalizationReport {
    /// Number of category keys that changed when lowercasing/trimming.
    pub categories_renamed: usize,
    /// Number of entries dropped for a negative or non-finite weight (Drop policy).
    pub invalid_weights_dropped: usize,
    /// Sum of the remaining weights.
    pub total_weight: f64,
}

/// Policy for weights that are negative, NaN or infinite.
#[derive(Copy, Clone, Debug)]
pub enum InvalidWeightPolicy {
    /// Drop the entry; its category then weighs 0.
    Drop,
    /// Treat as an error.
    Error,
}

fn normalize_code(code: &str) -> String {
    code.trim().to_lowercase()
}

/// Normalize a table in-place with an explicit policy for invalid weights.
///
/// Errors:
/// - Empty or duplicate category codes after normalization
/// - Invalid weights when policy is [`InvalidWeightPolicy::Error`]
pub fn normalize_weights_with_policy(
    table: &mut WeightTable,
    policy: InvalidWeightPolicy,
) -> anyhow::Result<NormalizationReport> {
    let mut report = NormalizationReport::default();
    let mut rebuilt: IndexMap<String, f64> = IndexMap::new();

    for (raw_code, weight) in std::mem::take(&mut table.categories) {
        let code = normalize_code(&raw_code);
        if code.is_empty() {
            bail!("category code cannot be empty after trimming");
        }
        if code != raw_code {
            report.categories_renamed += 1;
        }
        if rebuilt.contains_key(&code) {
            bail!("duplicate category code after normalization: {code}");
        }

        if !weight.is_finite() || weight < 0.0 {
            match policy {
                InvalidWeightPolicy::Drop => {
                    report.invalid_weights_dropped += 1;
                    continue;
                }
                InvalidWeightPolicy::Error => {
                    bail!("category '{code}' has invalid weight {weight}");
                }
            }
        }

        rebuilt.insert(code, weight);
    }

    table.categories = rebuilt;
    report.total_weight = table.total();
    Ok(report)
}

/// Calls [`normalize_weights_with_policy`] with [`InvalidWeightPolicy::Drop`].
pub fn normalize_weights(table: &mut WeightTable) -> anyhow::Result<NormalizationReport> {
    normalize_weights_with_policy(table, InvalidWeightPolicy::Drop)
}

/// Parse a weight table from a TOML string without normalizing it.
pub fn parse_weights_str(toml_str: &str) -> anyhow::Result<WeightTable> {
    toml::from_str(toml_str).context("failed to parse weight table TOML")
}

/// Read and parse a weight table TOML file without normalizing it.
pub fn parse_weights_path(path: impl AsRef<std::path::Path>) -> anyhow::Result<WeightTable> {
    let text = std::fs::read_to_string(path.as_ref())
        .with_context(|| format!("read weight table file {}", path.as_ref().display()))?;
    parse_weights_str(&text)
}

fn normalized(mut table: WeightTable) -> anyhow::Result<WeightTable> {
    let report = normalize_weights(&mut table).context("normalize_weights failed")?;
    debug!(?report, "weight table loaded");
    Ok(table)
}

/// Parse and normalize a weight table from a TOML string.
pub fn load_weights_str(toml_str: &str) -> anyhow::Result<WeightTable> {
    normalized(parse_weights_str(toml_str)?)
}

/// Read a weight table TOML file from disk, parse, and normalize it.
pub fn load_weights_path(path: impl AsRef<std::path::Path>) -> anyhow::Result<WeightTable> {
    normalized(parse_weights_path(path)?)
}

/// Normalized composite weight per item name. Sums to 1 over all items.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ItemWeights(BTreeMap<String, f64>);

impl ItemWeights {
    /// Weight of `name`, `0.0` for unknown names.
    pub fn get(&self, name: &str) -> f64 {
        self.0.get(name).copied().unwrap_or(0.0)
    }

    /// Iterate `(name, weight)` in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Number of weighted items.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if there are no items.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Sum of all weights (1 for a non-empty assignment).
    pub fn total(&self) -> f64 {
        self.0.values().sum()
    }
}

/// Assign a normalized composite weight to every `(name, category)` member.
///
/// Each category's table weight is split evenly across its members, so a
/// category's aggregate influence does not depend on how many items it has.
/// Items in categories missing from the table weigh 0. The result is
/// renormalized to sum to 1; if nothing carries weight, every item gets `1/n`.
pub fn assign_weights<'a, I>(members: I, table: &WeightTable) -> ItemWeights
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    // name-sorted so every sum below runs in a fixed order
    let members: BTreeMap<&str, String> = members
        .into_iter()
        .map(|(name, category)| (name, normalize_code(category)))
        .collect();
    if members.is_empty() {
        return ItemWeights::default();
    }

    let mut per_category: BTreeMap<&str, usize> = BTreeMap::new();
    for category in members.values() {
        *per_category.entry(category.as_str()).or_default() += 1;
    }

    let raw: BTreeMap<String, f64> = members
        .iter()
        .map(|(name, category)| {
            let share = table.weight(category) / per_category[category.as_str()] as f64;
            (name.to_string(), share)
        })
        .collect();

    let total: f64 = raw.values().sum();
    if total > 0.0 && total.is_finite() {
        ItemWeights(raw.into_iter().map(|(k, w)| (k, w / total)).collect())
    } else {
        warn!(
            items = members.len(),
            "weight table gives no item a positive weight, using equal weights"
        );
        let equal = 1.0 / members.len() as f64;
        ItemWeights(raw.into_keys().map(|k| (k, equal)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(entries: &[(&str, f64)]) -> WeightTable {
        WeightTable {
            categories: entries.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
        }
    }

    #[test]
    fn builtin_table_loads_and_sums_to_one() {
        let t = WeightTable::builtin().unwrap();
        assert!((t.total() - 1.0).abs() < 1e-12);
        assert!(t.weight("booster_box") > t.weight("accessory"));
    }

    #[test]
    fn normalizes_codes_and_drops_invalid() {
        let mut t = table(&[(" Booster_Box ", 0.5), ("tin", -1.0), ("blister", f64::NAN)]);
        let rep = normalize_weights(&mut t).unwrap();
        assert_eq!(rep.categories_renamed, 1);
        assert_eq!(rep.invalid_weights_dropped, 2);
        assert_eq!(t.categories.keys().collect::<Vec<_>>(), vec!["booster_box"]);
        assert_eq!(rep.total_weight, 0.5);
    }

    #[test]
    fn invalid_weight_as_error() {
        let mut t = table(&[("tin", -1.0)]);
        let err = normalize_weights_with_policy(&mut t, InvalidWeightPolicy::Error).unwrap_err();
        assert!(err.to_string().contains("invalid weight"));
    }

    #[test]
    fn duplicate_category_collision_errors() {
        let mut t = table(&[("tin", 0.1), ("TIN ", 0.2)]);
        let err = normalize_weights(&mut t).unwrap_err();
        assert!(err.to_string().contains("duplicate category code"));
    }

    #[test]
    fn parse_keeps_codes_as_written() {
        let t = parse_weights_str("[categories]\n\" Tin \" = 0.5\nblister = -1.0\n").unwrap();
        assert_eq!(t.categories.keys().collect::<Vec<_>>(), vec![" Tin ", "blister"]);

        let loaded = load_weights_str("[categories]\n\" Tin \" = 0.5\nblister = -1.0\n").unwrap();
        assert_eq!(loaded.categories.keys().collect::<Vec<_>>(), vec!["tin"]);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = load_weights_str("[categories]\ntin = 0.1\n[extra]\nx = 1\n").unwrap_err();
        assert!(format!("{err:#}").contains("parse"));
    }

    #[test]
    fn snapshot_normalized_table() {
        let t = load_weights_str(
            r#"
            [categories]
            " Booster_Box" = 0.5
            Tin = 0.25
            accessory = 0.25
            "#,
        )
        .unwrap();
        insta::assert_debug_snapshot!(t.categories, @r###"
        {
            "booster_box": 0.5,
            "tin": 0.25,
            "accessory": 0.25,
        }
        "###);
    }

    #[test]
    fn category_weight_is_split_across_members() {
        let t = table(&[("box", 0.6), ("accessory", 0.4)]);
        let w = assign_weights(
            [("a", "box"), ("b", "box"), ("c", "accessory")],
            &t,
        );
        assert!((w.get("a") - 0.3).abs() < 1e-12);
        assert!((w.get("b") - 0.3).abs() < 1e-12);
        assert!((w.get("c") - 0.4).abs() < 1e-12);
        assert!((w.total() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn incomplete_table_is_renormalized() {
        // only "box" is present among items: its members share everything
        let t = table(&[("box", 0.3), ("tin", 0.7)]);
        let w = assign_weights([("a", "box"), ("b", "Box"), ("c", "misc")], &t);
        assert!((w.get("a") - 0.5).abs() < 1e-12);
        assert!((w.get("b") - 0.5).abs() < 1e-12);
        assert_eq!(w.get("c"), 0.0);
    }

    #[test]
    fn empty_table_falls_back_to_equal_weights() {
        let w = assign_weights([("a", "box"), ("b", "tin"), ("c", "x"), ("d", "y")], &WeightTable::default());
        assert_eq!(w.len(), 4);
        assert!(w.iter().all(|(_, v)| v == 0.25));
    }

    #[test]
    fn no_items_no_weights() {
        let w = assign_weights(std::iter::empty::<(&str, &str)>(), &table(&[("box", 1.0)]));
        assert!(w.is_empty());
    }

    use proptest::prelude::*;

    proptest! {
        #[test]
        fn assigned_weights_sum_to_one(
            cats in proptest::collection::vec(0usize..4, 1..20),
            table_weights in proptest::collection::vec(0.0f64..1.0, 4),
        ) {
            let codes = ["box", "tin", "blister", "accessory"];
            let t = table(&codes.iter().zip(&table_weights).map(|(c, w)| (*c, *w)).collect::<Vec<_>>());
            let names: Vec<String> = (0..cats.len()).map(|i| format!("item-{i:02}")).collect();
            let w = assign_weights(names.iter().map(String::as_str).zip(cats.iter().map(|c| codes[*c])), &t);
            prop_assert_eq!(w.len(), cats.len());
            prop_assert!((w.total() - 1.0).abs() < 1e-9);
            prop_assert!(w.iter().all(|(_, v)| v >= 0.0));
        }
    }
}
