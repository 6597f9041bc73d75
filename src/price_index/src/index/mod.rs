//! Composite indices over the forward-filled panel.
//!
//! Two methodologies live side by side:
//! - [`weighted`]: category-weighted price *level*, rebased to 100.
//! - [`chained`]: day-chained *breadth* of movement from average item returns.

pub mod chained;
pub mod summary;
pub mod weighted;

pub use chained::{ChainedIndexPoint, chain_changes, chained_index};
pub use summary::{ChainedSummary, TrendLabel, summarize};
pub use weighted::{CompositeIndexPoint, WeightedIndex, WeightedIndexOptions, weighted_index};

/// Value both indices take at their base day.
pub const BASE_VALUE: f64 = 100.0;
