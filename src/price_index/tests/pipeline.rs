mod common;
use common::{approx, item, released, small_market, table};

use std::collections::BTreeMap;

use chrono::NaiveDate;
use price_index::calendar::FilledPanel;
use price_index::index::TrendLabel;
use price_index::index::weighted::day_weights;
use price_index::models::{ItemSeries, PointKind};
use price_index::weights::assign_weights;
use price_index::{AnalysisOptions, Item, WeightTable, analyze};
use proptest::prelude::*;

fn d(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn report<'a>(out: &'a price_index::MarketAnalysis, name: &str) -> &'a price_index::pipeline::ItemReport {
    out.items.iter().find(|r| r.name == name).expect("item report")
}

#[test]
fn empty_input_gives_empty_outputs() {
    let out = analyze(&[], &WeightTable::builtin().unwrap(), &AnalysisOptions::default()).unwrap();
    assert!(out.calendar.is_empty());
    assert!(out.items.is_empty());
    assert!(out.weighted_index.points.is_empty());
    assert_eq!(out.weighted_index.base_day, None);
    assert!(out.chained_index.is_empty());
    assert_eq!(out.summary.current_value, None);
    assert_eq!(out.summary.trend, TrendLabel::Unknown);
}

#[test]
fn calendar_is_union_of_item_days() {
    let out = analyze(
        &small_market(),
        &WeightTable::builtin().unwrap(),
        &AnalysisOptions::default(),
    )
    .unwrap();
    let expected: Vec<NaiveDate> = [
        "2024-02-20",
        "2024-03-01",
        "2024-03-02",
        "2024-03-03",
        "2024-03-04",
        "2024-03-05",
        "2024-03-06",
        "2024-03-08",
    ]
    .into_iter()
    .map(d)
    .collect();
    assert_eq!(out.calendar, expected);
    assert_eq!(out.weighted_index.points.len(), expected.len());
    assert_eq!(out.chained_index.len(), expected.len());
}

#[test]
fn daily_median_and_release_anchor() {
    let out = analyze(
        &small_market(),
        &WeightTable::builtin().unwrap(),
        &AnalysisOptions::default(),
    )
    .unwrap();
    let rift = report(&out, "Paradox Rift Booster Box");
    let points = rift.series.points();
    assert_eq!(points.len(), 4);
    assert_eq!(points[0].day, d("2024-02-20"));
    assert_eq!(points[0].kind, PointKind::Anchor);
    assert_eq!(points[0].price, 143.64);
    assert_eq!(points[1].price, 112.0);
    assert_eq!(points[1].kind, PointKind::Observed);

    assert_eq!(rift.chart_points.len(), 4);
    assert!(rift.chart_points.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
}

#[test]
fn observation_on_release_day_beats_anchor() {
    let items = vec![released(
        item("Box", "booster_box", &[("2024-03-01", 120.0), ("2024-03-02", 121.0)]),
        "2024-03-01",
        143.64,
    )];
    let out = analyze(&items, &WeightTable::builtin().unwrap(), &AnalysisOptions::default()).unwrap();
    let points = out.items[0].series.points();
    assert_eq!(points.len(), 2);
    assert_eq!(points[0].price, 120.0);
    assert_eq!(points[0].kind, PointKind::Observed);
}

#[test]
fn trailing_trends_use_tolerance_window() {
    let out = analyze(
        &small_market(),
        &WeightTable::builtin().unwrap(),
        &AnalysisOptions::default(),
    )
    .unwrap();

    // last 03-08 = 126, window [02-23, 03-03] holds only 03-01 = 112
    let rift = report(&out, "Paradox Rift Booster Box");
    assert_eq!(rift.trend.last_price, Some(126.0));
    assert!(approx(rift.trend.trend.unwrap(), 12.5));

    // window [02-21, 03-01] is empty: the first point, 03-02, is too recent
    let forces = report(&out, "Temporal Forces Booster Box");
    assert_eq!(forces.trend.last_price, Some(98.0));
    assert_eq!(forces.trend.trend, None);

    let sleeves = report(&out, "Card Sleeves");
    assert_eq!(sleeves.trend.last_price, Some(8.0));
    assert_eq!(sleeves.trend.trend, None);
}

#[test]
fn old_release_anchor_is_not_a_trend_reference() {
    let items = vec![released(
        item("Old Box", "booster_box", &[("2024-01-31", 90.0)]),
        "2024-01-01",
        100.0,
    )];
    let out = analyze(&items, &WeightTable::builtin().unwrap(), &AnalysisOptions::default()).unwrap();
    let points = out.items[0].series.points();
    assert_eq!(points[0].kind, PointKind::Anchor);
    assert_eq!(out.items[0].trend.last_price, Some(90.0));
    assert_eq!(out.items[0].trend.trend, None);
}

#[test]
fn present_item_weights_sum_to_one_every_day() {
    let table = WeightTable::builtin().unwrap();
    let out = analyze(&small_market(), &table, &AnalysisOptions::default()).unwrap();

    let series: BTreeMap<String, ItemSeries> = out
        .items
        .iter()
        .map(|r| (r.name.clone(), r.series.clone()))
        .collect();
    let panel = FilledPanel::build(&series);
    let weights = assign_weights(
        out.items.iter().map(|r| (r.name.as_str(), r.category.as_str())),
        &table,
    );
    assert_eq!(panel.calendar().days(), out.calendar.as_slice());

    for idx in 0..panel.calendar().len() {
        let day = day_weights(&panel, &weights, idx).expect("priced day");
        let total: f64 = day.values().sum();
        assert!(approx(total, 1.0), "day {idx}: {total}");

        let expected: f64 = panel
            .priced_on(idx)
            .map(|(name, price)| day.get(name).copied().unwrap_or(0.0) * price)
            .sum();
        assert_eq!(out.weighted_index.raw[idx].value, Some(expected));
    }
}

#[test]
fn item_weights_split_category_and_sum_to_one() {
    let out = analyze(
        &small_market(),
        &WeightTable::builtin().unwrap(),
        &AnalysisOptions::default(),
    )
    .unwrap();
    let total: f64 = out.items.iter().map(|r| r.weight).sum();
    assert!(approx(total, 1.0));

    let rift = report(&out, "Paradox Rift Booster Box").weight;
    let forces = report(&out, "Temporal Forces Booster Box").weight;
    assert!(approx(rift, forces));
    // 0.35 split over two boxes, 0.08 tin, 0.05 accessory
    assert!(approx(report(&out, "Card Sleeves").weight, 0.05 / 0.48));
}

#[test]
fn unknown_categories_fall_back_to_equal_weights() {
    let out = analyze(&small_market(), &WeightTable::default(), &AnalysisOptions::default()).unwrap();
    for r in &out.items {
        assert!(approx(r.weight, 0.25));
    }
}

#[test]
fn weighted_index_is_exactly_100_on_base_day() {
    let out = analyze(
        &small_market(),
        &WeightTable::builtin().unwrap(),
        &AnalysisOptions::default(),
    )
    .unwrap();
    let idx = &out.weighted_index;
    assert_eq!(idx.base_day, Some(d("2024-02-20")));
    assert_eq!(idx.points[0].value, Some(100.0));
    // only the anchored box is priced on day one
    assert_eq!(idx.raw[0].value, Some(143.64));
    assert!(idx.points.iter().all(|p| p.value.is_some()));

    let explicit = AnalysisOptions {
        base_day: Some(d("2024-03-04")),
        smoothing: Some(0.4),
        ..Default::default()
    };
    let out = analyze(&small_market(), &WeightTable::builtin().unwrap(), &explicit).unwrap();
    let base = out
        .weighted_index
        .points
        .iter()
        .find(|p| p.day == d("2024-03-04"))
        .unwrap();
    assert_eq!(base.value, Some(100.0));
}

#[test]
fn base_day_outside_calendar_makes_index_unknown() {
    let opts = AnalysisOptions {
        base_day: Some(d("2024-03-07")),
        ..Default::default()
    };
    let out = analyze(&small_market(), &WeightTable::builtin().unwrap(), &opts).unwrap();
    assert_eq!(out.weighted_index.base_day, None);
    assert!(out.weighted_index.points.iter().all(|p| p.value.is_none()));
    // raw composite and chained index are unaffected
    assert!(out.weighted_index.raw.iter().all(|p| p.value.is_some()));
    assert_eq!(out.chained_index[0].value, 100.0);
}

#[test]
fn day_with_only_zero_weight_items_is_unknown() {
    let items = vec![
        item("Mystery", "promo", &[("2024-03-01", 10.0), ("2024-03-02", 11.0)]),
        item("Box", "booster_box", &[("2024-03-02", 100.0)]),
    ];
    let t = table(&[("booster_box", 1.0)]);
    let out = analyze(&items, &t, &AnalysisOptions::default()).unwrap();

    assert_eq!(out.weighted_index.raw[0].value, None);
    assert_eq!(out.weighted_index.points[0].value, None);
    assert_eq!(out.weighted_index.base_day, Some(d("2024-03-02")));
    assert_eq!(out.weighted_index.points[1].value, Some(100.0));

    // the chained index does not look at weights
    assert_eq!(out.chained_index[0].item_count, 1);
    assert!(approx(out.chained_index[1].daily_change, 0.1));
}

#[test]
fn chained_index_counts_forward_filled_items() {
    let out = analyze(
        &small_market(),
        &WeightTable::builtin().unwrap(),
        &AnalysisOptions::default(),
    )
    .unwrap();
    let counts: Vec<usize> = out.chained_index.iter().map(|p| p.item_count).collect();
    assert_eq!(counts, vec![1, 1, 2, 3, 4, 4, 4, 4]);

    let first_move = out.chained_index[1].daily_change;
    assert!(approx(first_move, (112.0 - 143.64) / 143.64));
    for w in out.chained_index.windows(2) {
        assert!(approx(w[1].value, w[0].value * (1.0 + w[1].daily_change)));
    }

    let last = out.chained_index.last().unwrap();
    assert_eq!(out.summary.current_value, Some(last.value));
    assert_eq!(out.summary.window_days, 7);
}

#[test]
fn unusable_observations_are_dropped_not_fatal() {
    let json = r#"[
        {
            "name": "Scraped Tin",
            "category": "tin",
            "observations": [
                {"day": "2024-03-01", "price": "25.5"},
                {"day": "2024-03-01T23:30:00-05:00", "price": 30},
                {"day": "yesterday", "price": 12},
                {"day": "2024-03-03", "price": "n/a"},
                {"day": "2024-03-04", "price": null},
                {"day": "2024-03-05", "price": -3}
            ]
        },
        {"name": "No Data", "category": "tin"}
    ]"#;
    let items: Vec<Item> = serde_json::from_str(json).unwrap();
    let out = analyze(&items, &WeightTable::builtin().unwrap(), &AnalysisOptions::default()).unwrap();

    let tin = report(&out, "Scraped Tin");
    let days: Vec<NaiveDate> = tin.series.points().iter().map(|p| p.day).collect();
    assert_eq!(days, vec![d("2024-03-01"), d("2024-03-02")]);
    assert_eq!(tin.series.points()[0].price, 25.5);

    let empty = report(&out, "No Data");
    assert!(empty.series.is_empty());
    assert_eq!(empty.trend.last_price, None);
    assert!(empty.chart_points.is_empty());
}

#[test]
fn analysis_is_deterministic_and_order_independent() {
    let table = WeightTable::builtin().unwrap();
    let opts = AnalysisOptions {
        smoothing: Some(0.3),
        ..Default::default()
    };
    let items = small_market();
    let a = serde_json::to_string(&analyze(&items, &table, &opts).unwrap()).unwrap();
    let b = serde_json::to_string(&analyze(&items, &table, &opts).unwrap()).unwrap();
    assert_eq!(a, b);

    let mut reversed = items;
    reversed.reverse();
    let c = serde_json::to_string(&analyze(&reversed, &table, &opts).unwrap()).unwrap();
    assert_eq!(a, c);
}

#[test]
fn output_serializes_camel_case() {
    let out = analyze(
        &small_market(),
        &WeightTable::builtin().unwrap(),
        &AnalysisOptions::default(),
    )
    .unwrap();
    let json = serde_json::to_value(&out).unwrap();
    assert_eq!(json["weightedIndex"]["baseDay"], "2024-02-20");
    assert_eq!(json["chainedIndex"][0]["itemCount"], 1);
    assert_eq!(json["items"][0]["series"][0]["kind"], "observed");
    assert!(json["summary"]["change30d"].is_null());
}

fn arb_item() -> impl Strategy<Value = Item> {
    (
        "[a-d]{1,3}",
        prop::sample::select(vec!["booster_box", "tin", "accessory", "promo"]),
        prop::collection::vec((0u64..40, 1.0f64..500.0), 0..6),
    )
        .prop_map(|(name, category, obs)| {
            let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
            let obs: Vec<(String, f64)> = obs
                .into_iter()
                .map(|(off, p)| ((start + chrono::Days::new(off)).to_string(), p))
                .collect();
            let borrowed: Vec<(&str, f64)> = obs.iter().map(|(d, p)| (d.as_str(), *p)).collect();
            item(&name, category, &borrowed)
        })
}

proptest! {
    #[test]
    fn invariants_hold_for_arbitrary_markets(items in prop::collection::vec(arb_item(), 0..6)) {
        let out = analyze(&items, &WeightTable::builtin().unwrap(), &AnalysisOptions::default()).unwrap();

        prop_assert_eq!(out.items.len(), items.len());
        prop_assert!(out.calendar.windows(2).all(|w| w[0] < w[1]));

        if !out.items.is_empty() {
            let total: f64 = out.items.iter().map(|r| r.weight).sum();
            prop_assert!((total - 1.0).abs() < 1e-9);
        }

        match out.weighted_index.base_day {
            Some(base) => {
                let p = out.weighted_index.points.iter().find(|p| p.day == base).unwrap();
                prop_assert_eq!(p.value, Some(100.0));
            }
            None => prop_assert!(out.weighted_index.points.iter().all(|p| p.value.is_none())),
        }

        if let Some(first) = out.chained_index.first() {
            prop_assert_eq!(first.value, 100.0);
        }
        for w in out.chained_index.windows(2) {
            prop_assert!((w[1].value - w[0].value * (1.0 + w[1].daily_change)).abs() < 1e-6);
        }

        for r in &out.items {
            prop_assert!(r.series.points().windows(2).all(|w| w[0].day < w[1].day));
            prop_assert_eq!(r.chart_points.len(), r.series.len());
        }
    }
}
