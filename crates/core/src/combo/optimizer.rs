use std::collections::BTreeMap;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::combo::counter::{count_cooccurrences, CooccurrenceCounts, CountLimits};
use crate::combo::hierarchy::HierarchyIndex;
use crate::combo::metrics::{PairMetricsTable, SupportTable};
use crate::combo::objectives::ObjectiveWeights;
use crate::combo::retention::{PreferenceSignal, RetentionSettings};
use crate::combo::scoring::{ComboRecord, ComboScorer, ScoringContext};
use crate::combo::side_tables::{InventoryTable, PriceTable};
use crate::domain::level::Level;
use crate::domain::product::Transaction;
use crate::errors::DomainError;

/// Pre-loaded inputs for one optimization run.
#[derive(Clone, Debug, Default)]
pub struct ComboInputs {
    pub transactions: Vec<Transaction>,
    pub hierarchy: HierarchyIndex,
    pub prices: PriceTable,
    pub inventory: InventoryTable,
    pub preferences: PreferenceSignal,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct OptimizerSettings {
    pub weights: ObjectiveWeights,
    pub retention: RetentionSettings,
    pub limits: CountLimits,
}

/// Ranked combo candidates for one level, best first.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RankedCombos {
    pub level: Level,
    pub total_transactions: u64,
    pub oversized_transactions: u64,
    pub combos: Vec<ComboRecord>,
}

impl RankedCombos {
    /// The best `n` combos; `0` returns all of them.
    pub fn top(&self, n: usize) -> &[ComboRecord] {
        if n == 0 {
            &self.combos
        } else {
            &self.combos[..n.min(self.combos.len())]
        }
    }

    pub fn truncate(&mut self, n: usize) {
        if n > 0 {
            self.combos.truncate(n);
        }
    }
}

/// Runs counting, association metrics and scoring for each level.
///
/// Every call recomputes all tables from the inputs; nothing is cached
/// between calls.
pub struct ComboOptimizer<'a> {
    inputs: &'a ComboInputs,
    settings: OptimizerSettings,
    scorer: ComboScorer,
}

impl<'a> ComboOptimizer<'a> {
    pub fn new(inputs: &'a ComboInputs, settings: OptimizerSettings) -> Self {
        Self { inputs, settings, scorer: ComboScorer::new(settings.weights) }
    }

    pub fn optimize(&self, level: Level) -> Result<RankedCombos, DomainError> {
        let counts = self.count()?;
        self.rank_level(&counts, level)
    }

    /// Counts once, then derives and scores each level independently.
    pub fn optimize_all(&self) -> Result<BTreeMap<Level, RankedCombos>, DomainError> {
        let counts = self.count()?;
        Level::ALL
            .into_iter()
            .map(|level| self.rank_level(&counts, level).map(|ranked| (level, ranked)))
            .collect()
    }

    fn count(&self) -> Result<CooccurrenceCounts, DomainError> {
        if self.inputs.transactions.is_empty() {
            return Err(DomainError::EmptyInput);
        }
        Ok(count_cooccurrences(
            &self.inputs.transactions,
            &self.inputs.hierarchy,
            self.settings.limits,
        ))
    }

    fn rank_level(
        &self,
        counts: &CooccurrenceCounts,
        level: Level,
    ) -> Result<RankedCombos, DomainError> {
        let started = Instant::now();
        info!(
            event_name = "combo.optimize.started",
            level = %level,
            total_transactions = counts.total_transactions(),
            retention_mode = %self.settings.retention.mode,
            "ranking combo candidates"
        );

        let level_counts = counts.level(level);
        let supports =
            SupportTable::from_counts(level, level_counts, counts.total_transactions())?;
        let metrics = PairMetricsTable::derive(&supports, &level_counts.pairs)?;
        let context = ScoringContext {
            supports: &supports,
            prices: &self.inputs.prices,
            inventory: &self.inputs.inventory,
        };
        let mut affinity = self.settings.retention.source_for(level, &self.inputs.preferences);
        let combos = self.scorer.score_pairs(&metrics, &context, affinity.as_mut());

        info!(
            event_name = "combo.optimize.completed",
            level = %level,
            pairs = combos.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "combo candidates ranked"
        );

        Ok(RankedCombos {
            level,
            total_transactions: counts.total_transactions(),
            oversized_transactions: level_counts.oversized_transactions,
            combos,
        })
    }
}
