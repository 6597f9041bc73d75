#![allow(dead_code)]

use std::path::PathBuf;

use price_index::{Item, PriceObservation, WeightTable};
use tempfile::TempDir;

pub fn item(name: &str, category: &str, obs: &[(&str, f64)]) -> Item {
    Item {
        name: name.into(),
        category: category.into(),
        release_day: None,
        reference_price: None,
        observations: obs
            .iter()
            .map(|(d, p)| PriceObservation::new(*d, *p))
            .collect(),
    }
}

pub fn released(mut item: Item, day: &str, reference_price: f64) -> Item {
    item.release_day = Some(day.into());
    item.reference_price = Some(reference_price);
    item
}

/// Two booster boxes, one tin, one accessory across a week of sparse data.
pub fn small_market() -> Vec<Item> {
    vec![
        released(
            item(
                "Paradox Rift Booster Box",
                "booster_box",
                &[
                    ("2024-03-01", 110.0),
                    ("2024-03-01", 114.0),
                    ("2024-03-04", 120.0),
                    ("2024-03-08", 126.0),
                ],
            ),
            "2024-02-20",
            143.64,
        ),
        item(
            "Temporal Forces Booster Box",
            "booster_box",
            &[("2024-03-02", 100.0), ("2024-03-06", 98.0)],
        ),
        item(
            "Charizard Tin",
            "tin",
            &[("2024-03-01", 25.0), ("2024-03-05", 27.5)],
        ),
        item("Card Sleeves", "accessory", &[("2024-03-03", 8.0)]),
    ]
}

pub fn table(entries: &[(&str, f64)]) -> WeightTable {
    WeightTable {
        categories: entries.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
    }
}

pub struct TempConfig {
    _dir: TempDir, // keep alive for the life of the test
    pub path: PathBuf,
}

pub fn write_config(contents: &str) -> TempConfig {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("weights.toml");
    std::fs::write(&path, contents).expect("write weights");
    TempConfig { _dir: dir, path }
}

pub fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}
