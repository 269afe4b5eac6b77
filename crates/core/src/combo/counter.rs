//! Single-pass co-occurrence counting at item, subcategory and category level.
//!
//! Every transaction is reduced to a set of distinct entities per level before
//! anything is counted, so repeating a product inside one basket never changes
//! a frequency or a pair count.

use std::collections::{BTreeSet, HashMap};

use tracing::{debug, warn};

use crate::combo::hierarchy::HierarchyIndex;
use crate::domain::level::{Level, PairKey};
use crate::domain::product::Transaction;

pub const DEFAULT_MAX_BASKET_ENTITIES: usize = 512;

/// Bounds the quadratic pair enumeration of a single basket.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CountLimits {
    /// Baskets with more distinct entities than this at a level skip pair
    /// enumeration at that level. `0` disables the bound.
    pub max_basket_entities: usize,
}

impl CountLimits {
    pub fn unbounded() -> Self {
        Self { max_basket_entities: 0 }
    }

    fn exceeded_by(&self, distinct: usize) -> bool {
        self.max_basket_entities > 0 && distinct > self.max_basket_entities
    }
}

impl Default for CountLimits {
    fn default() -> Self {
        Self { max_basket_entities: DEFAULT_MAX_BASKET_ENTITIES }
    }
}

/// Frequencies and pair counts for one level.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LevelCounts {
    /// Entity → number of transactions containing it.
    pub frequencies: HashMap<String, u64>,
    /// Canonical pair → number of transactions containing both.
    pub pairs: HashMap<PairKey, u64>,
    /// Transactions whose pairs were skipped because of [`CountLimits`].
    pub oversized_transactions: u64,
}

impl LevelCounts {
    pub fn frequency(&self, entity: &str) -> u64 {
        self.frequencies.get(entity).copied().unwrap_or(0)
    }

    pub fn pair_count(&self, a: &str, b: &str) -> u64 {
        self.pairs.get(&PairKey::new(a, b)).copied().unwrap_or(0)
    }

    fn record(&mut self, entities: &BTreeSet<&str>, limits: CountLimits) {
        for entity in entities {
            match self.frequencies.get_mut(*entity) {
                Some(count) => *count += 1,
                None => {
                    self.frequencies.insert((*entity).to_owned(), 1);
                }
            }
        }

        if entities.len() < 2 {
            return;
        }
        if limits.exceeded_by(entities.len()) {
            self.oversized_transactions += 1;
            return;
        }

        // BTreeSet iteration is sorted, so (first, second) is already canonical.
        let ordered: Vec<&str> = entities.iter().copied().collect();
        for (position, first) in ordered.iter().enumerate() {
            for second in &ordered[position + 1..] {
                *self.pairs.entry(PairKey::new(*first, *second)).or_insert(0) += 1;
            }
        }
    }
}

/// Counts for all three levels, derived from one pass over the log.
#[derive(Clone, Debug)]
pub struct CooccurrenceCounts {
    total_transactions: u64,
    levels: [LevelCounts; 3],
}

impl CooccurrenceCounts {
    /// Includes empty transactions.
    pub fn total_transactions(&self) -> u64 {
        self.total_transactions
    }

    pub fn level(&self, level: Level) -> &LevelCounts {
        &self.levels[level.index()]
    }
}

pub fn count_cooccurrences(
    transactions: &[Transaction],
    hierarchy: &HierarchyIndex,
    limits: CountLimits,
) -> CooccurrenceCounts {
    let mut levels: [LevelCounts; 3] = Default::default();

    for transaction in transactions {
        let mut items = BTreeSet::new();
        let mut subcategories = BTreeSet::new();
        let mut categories = BTreeSet::new();

        for product_id in transaction {
            items.insert(product_id.as_str());
            if let Some(placement) = hierarchy.lookup(product_id) {
                subcategories.insert(placement.subcategory.as_str());
                categories.insert(placement.category.as_str());
            }
        }

        levels[Level::Item.index()].record(&items, limits);
        levels[Level::Subcategory.index()].record(&subcategories, limits);
        levels[Level::Category.index()].record(&categories, limits);
    }

    for level in Level::ALL {
        let counts = &levels[level.index()];
        if counts.oversized_transactions > 0 {
            warn!(
                event_name = "combo.counter.oversized_baskets",
                level = %level,
                skipped = counts.oversized_transactions,
                max_basket_entities = limits.max_basket_entities,
                "pair enumeration skipped for oversized baskets"
            );
        }
        debug!(
            event_name = "combo.counter.level_counted",
            level = %level,
            entities = counts.frequencies.len(),
            pairs = counts.pairs.len(),
            "co-occurrence counts collected"
        );
    }

    CooccurrenceCounts { total_transactions: transactions.len() as u64, levels }
}
