//! Composite price-index engine.
//!
//! Turns sparse, irregular per-item price observations into:
//! - a daily median series and trailing trend per item ([`series`], [`trend`]);
//! - a category-weighted composite index rebased to 100 ([`index::weighted`]);
//! - a day-chained market index with headline figures ([`index::chained`],
//!   [`index::summary`]).
//!
//! Data-quality problems (bad days, non-numeric prices, missing weights,
//! division by zero) surface as *unknown* values, never as errors. The engine
//! is a pure function of its input; see [`pipeline::analyze`].
//!
//! ```
//! use price_index::{AnalysisOptions, Item, PriceObservation, WeightTable, analyze};
//!
//! let items = vec![Item {
//!     name: "Paradox Rift Booster Box".into(),
//!     category: "booster_box".into(),
//!     release_day: Some("2023-11-03".into()),
//!     reference_price: Some(143.64),
//!     observations: vec![
//!         PriceObservation::new("2024-05-01", 110.0),
//!         PriceObservation::new("2024-05-01", 114.0),
//!     ],
//! }];
//! let table = WeightTable::builtin().unwrap();
//! let out = analyze(&items, &table, &AnalysisOptions::default()).unwrap();
//! assert_eq!(out.items[0].series.last().unwrap().price, 112.0);
//! assert_eq!(out.weighted_index.points[0].value, Some(100.0));
//! ```

#![deny(missing_docs)]

pub mod calendar;
pub mod day;
pub mod error;
pub mod index;
pub mod models;
pub mod pipeline;
pub mod series;
pub mod source;
pub mod trend;
pub mod weights;

pub use error::{Error, Result};
pub use models::{Item, ItemSeries, PriceObservation};
pub use pipeline::{AnalysisOptions, MarketAnalysis, analyze};
pub use weights::{WeightTable, load_weights_path, load_weights_str};
