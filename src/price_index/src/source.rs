//! Seams towards the data-acquisition side.
//!
//! The engine never fetches anything itself. Callers hand it a `Vec<Item>`,
//! usually obtained through an [`ItemSource`]. Caching belongs on this side of
//! the seam: [`CachedSource`] is an explicit, caller-owned TTL cache, so the
//! index computation stays free of hidden state.
//!
//! [`CardMatch`] is the typed result of matching locally tracked cards against
//! a remote price catalog. Callers can only read prices from a matched record.

use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwapOption;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::{Item, PriceObservation};

/// Something that can produce the current item collection.
pub trait ItemSource {
    /// Fetch all items with their raw observations.
    fn fetch_items(&self) -> anyhow::Result<Vec<Item>>;
}

struct CacheEntry {
    fetched_at: Instant,
    items: Arc<Vec<Item>>,
}

/// TTL cache in front of an [`ItemSource`].
///
/// Reads are lock-free (`arc-swap`); a stale or empty cache triggers a fetch
/// and swaps the new snapshot in. Concurrent misses may fetch more than once,
/// which is harmless for a read-only source.
pub struct CachedSource<S> {
    inner: S,
    ttl: Duration,
    entry: ArcSwapOption<CacheEntry>,
}

impl<S: ItemSource> CachedSource<S> {
    /// Wrap `inner`, keeping each snapshot for `ttl`.
    pub fn new(inner: S, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            entry: ArcSwapOption::empty(),
        }
    }

    /// Current snapshot, refetching if it is missing or older than the TTL.
    pub fn items(&self) -> anyhow::Result<Arc<Vec<Item>>> {
        if let Some(entry) = self.entry.load_full() {
            if entry.fetched_at.elapsed() < self.ttl {
                return Ok(Arc::clone(&entry.items));
            }
        }

        let items = Arc::new(self.inner.fetch_items()?);
        debug!(items = items.len(), "item cache refreshed");
        self.entry.store(Some(Arc::new(CacheEntry {
            fetched_at: Instant::now(),
            items: Arc::clone(&items),
        })));
        Ok(items)
    }

    /// Drop the snapshot; the next read fetches again.
    pub fn invalidate(&self) {
        self.entry.store(None);
    }
}

impl<S: ItemSource> ItemSource for CachedSource<S> {
    fn fetch_items(&self) -> anyhow::Result<Vec<Item>> {
        Ok(self.items()?.as_ref().clone())
    }
}

/// A card we want prices for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardQuery {
    /// Card name as tracked locally.
    pub name: String,
    /// Rarity as tracked locally.
    pub rarity: String,
}

/// One entry of a remote price catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogCard {
    /// Remote identifier.
    pub id: String,
    /// Card name on the remote side.
    pub name: String,
    /// Set / episode the card belongs to.
    pub episode: String,
    /// Price snapshots.
    #[serde(default)]
    pub prices: Vec<PriceObservation>,
}

/// Result of matching one [`CardQuery`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CardMatch {
    /// Found in the remote catalog.
    Matched {
        /// Remote identifier.
        id: String,
        /// Price snapshots from the catalog.
        prices: Vec<PriceObservation>,
        /// Set / episode.
        episode: String,
    },
    /// No catalog entry with that name.
    Unmatched {
        /// Local name.
        name: String,
        /// Local rarity.
        rarity: String,
    },
}

impl CardMatch {
    /// Price observations of a matched card; empty for unmatched ones.
    pub fn observations(&self) -> &[PriceObservation] {
        match self {
            CardMatch::Matched { prices, .. } => prices.as_slice(),
            CardMatch::Unmatched { .. } => &[],
        }
    }

    /// True for [`CardMatch::Matched`].
    pub fn is_matched(&self) -> bool {
        matches!(self, CardMatch::Matched { .. })
    }
}

/// Case- and whitespace-insensitive name key.
fn name_key(name: &str) -> String {
    name.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Match each query against `catalog` by normalized name.
///
/// The first catalog entry with a matching name wins. Output order follows
/// `queries`.
pub fn match_cards(queries: &[CardQuery], catalog: &[CatalogCard]) -> Vec<CardMatch> {
    let mut by_name: std::collections::HashMap<String, &CatalogCard> =
        std::collections::HashMap::new();
    for card in catalog {
        by_name.entry(name_key(&card.name)).or_insert(card);
    }

    queries
        .iter()
        .map(|q| match by_name.get(&name_key(&q.name)) {
            Some(card) => CardMatch::Matched {
                id: card.id.clone(),
                prices: card.prices.clone(),
                episode: card.episode.clone(),
            },
            None => CardMatch::Unmatched {
                name: q.name.clone(),
                rarity: q.rarity.clone(),
            },
        })
        .collect()
}
