//! Support and lift derived from raw co-occurrence counts.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::combo::counter::LevelCounts;
use crate::domain::level::{Level, PairKey};
use crate::errors::DomainError;

/// Fraction of all transactions containing each entity at one level.
#[derive(Clone, Debug, PartialEq)]
pub struct SupportTable {
    level: Level,
    total_transactions: u64,
    supports: HashMap<String, f64>,
}

impl SupportTable {
    pub fn from_counts(
        level: Level,
        counts: &LevelCounts,
        total_transactions: u64,
    ) -> Result<Self, DomainError> {
        if total_transactions == 0 {
            return Err(DomainError::EmptyInput);
        }

        let divisor = total_transactions as f64;
        let supports = counts
            .frequencies
            .iter()
            .map(|(entity, count)| (entity.clone(), *count as f64 / divisor))
            .collect();

        Ok(Self { level, total_transactions, supports })
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn total_transactions(&self) -> u64 {
        self.total_transactions
    }

    /// Entities never seen have support 0.
    pub fn support(&self, entity: &str) -> f64 {
        self.supports.get(entity).copied().unwrap_or(0.0)
    }

    pub fn len(&self) -> usize {
        self.supports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.supports.is_empty()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PairMetrics {
    pub count: u64,
    pub support: f64,
    pub lift: f64,
}

/// Support and lift for every pair that co-occurred at least once.
#[derive(Clone, Debug, PartialEq)]
pub struct PairMetricsTable {
    level: Level,
    pairs: HashMap<PairKey, PairMetrics>,
}

impl PairMetricsTable {
    pub fn derive(
        supports: &SupportTable,
        pair_counts: &HashMap<PairKey, u64>,
    ) -> Result<Self, DomainError> {
        if supports.total_transactions == 0 {
            return Err(DomainError::EmptyInput);
        }

        let divisor = supports.total_transactions as f64;
        let pairs = pair_counts
            .iter()
            .map(|(pair, count)| {
                let support = *count as f64 / divisor;
                let support_x = supports.support(pair.first());
                let support_y = supports.support(pair.second());
                let metrics = PairMetrics {
                    count: *count,
                    support,
                    lift: lift(support, support_x, support_y),
                };
                (pair.clone(), metrics)
            })
            .collect();

        Ok(Self { level: supports.level, pairs })
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn get(&self, a: &str, b: &str) -> Option<&PairMetrics> {
        self.pairs.get(&PairKey::new(a, b))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Pairs in canonical key order.
    pub fn sorted(&self) -> Vec<(&PairKey, &PairMetrics)> {
        let mut entries: Vec<_> = self.pairs.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries
    }
}

/// Observed joint support over the support expected under independence.
/// A zero marginal yields exactly 0 rather than NaN or infinity.
pub fn lift(support_xy: f64, support_x: f64, support_y: f64) -> f64 {
    if support_x > 0.0 && support_y > 0.0 {
        support_xy / (support_x * support_y)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::{lift, PairMetricsTable, SupportTable};
    use crate::combo::counter::LevelCounts;
    use crate::domain::level::{Level, PairKey};
    use crate::errors::DomainError;

    fn counts(frequencies: &[(&str, u64)], pairs: &[(&str, &str, u64)]) -> LevelCounts {
        LevelCounts {
            frequencies: frequencies.iter().map(|(e, c)| ((*e).to_owned(), *c)).collect(),
            pairs: pairs.iter().map(|(a, b, c)| (PairKey::new(*a, *b), *c)).collect(),
            oversized_transactions: 0,
        }
    }

    #[test]
    fn support_is_fraction_of_all_transactions() {
        let level_counts = counts(&[("B", 2), ("A", 1)], &[]);
        let table = SupportTable::from_counts(Level::Item, &level_counts, 3)
            .expect("non-empty log should produce supports");

        assert!((table.support("B") - 2.0 / 3.0).abs() < 1e-12);
        assert!((table.support("A") - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(table.support("Z"), 0.0);
    }

    #[test]
    fn empty_log_is_rejected() {
        let level_counts = counts(&[], &[]);
        assert_eq!(
            SupportTable::from_counts(Level::Category, &level_counts, 0),
            Err(DomainError::EmptyInput)
        );
    }

    #[test]
    fn lift_compares_joint_support_with_independence() {
        let level_counts = counts(&[("A", 1), ("B", 2)], &[("B", "A", 1)]);
        let supports = SupportTable::from_counts(Level::Item, &level_counts, 3)
            .expect("supports should derive");
        let table = PairMetricsTable::derive(&supports, &level_counts.pairs)
            .expect("pair metrics should derive");

        let metrics = table.get("A", "B").expect("pair should exist");
        assert_eq!(metrics.count, 1);
        assert!((metrics.support - 1.0 / 3.0).abs() < 1e-12);
        // (1/3) / ((1/3) * (2/3)) = 1.5
        assert!((metrics.lift - 1.5).abs() < 1e-12);
        assert_eq!(table.get("B", "A"), table.get("A", "B"));
    }

    #[test]
    fn zero_marginal_yields_exact_zero_lift() {
        assert_eq!(lift(0.2, 0.0, 0.5), 0.0);
        assert_eq!(lift(0.2, 0.5, 0.0), 0.0);

        // A pair whose marginal is absent from the support table.
        let level_counts = counts(&[("A", 1)], &[("A", "ghost", 1)]);
        let supports = SupportTable::from_counts(Level::Item, &level_counts, 2)
            .expect("supports should derive");
        let table = PairMetricsTable::derive(&supports, &level_counts.pairs)
            .expect("pair metrics should derive");
        let metrics = table.get("ghost", "A").expect("pair should exist");
        assert_eq!(metrics.lift, 0.0);
        assert!(!metrics.lift.is_nan());
    }

    #[test]
    fn sorted_pairs_follow_canonical_key_order() {
        let pair_counts: HashMap<PairKey, u64> = [
            (PairKey::new("c", "d"), 1),
            (PairKey::new("b", "a"), 1),
            (PairKey::new("a", "c"), 1),
        ]
        .into_iter()
        .collect();
        let level_counts = counts(&[("a", 2), ("b", 1), ("c", 2), ("d", 1)], &[]);
        let supports = SupportTable::from_counts(Level::Item, &level_counts, 2)
            .expect("supports should derive");
        let table = PairMetricsTable::derive(&supports, &pair_counts).expect("derive");

        let order: Vec<String> = table.sorted().iter().map(|(pair, _)| pair.to_string()).collect();
        assert_eq!(order, vec!["a + b", "a + c", "c + d"]);
    }
}
