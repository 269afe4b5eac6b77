//! Combo offer optimization
//!
//! Ranks pairs of items, subcategories and categories that are bought
//! together, using support and lift over a transaction log combined with a
//! weighted set of business objectives.

pub mod counter;
pub mod hierarchy;
pub mod metrics;
pub mod objectives;
pub mod optimizer;
pub mod retention;
pub mod scoring;
pub mod side_tables;

pub use counter::{count_cooccurrences, CooccurrenceCounts, CountLimits, LevelCounts};
pub use hierarchy::HierarchyIndex;
pub use metrics::{PairMetrics, PairMetricsTable, SupportTable};
pub use objectives::{Objective, ObjectiveWeights};
pub use optimizer::{ComboInputs, ComboOptimizer, OptimizerSettings, RankedCombos};
pub use retention::{AffinitySource, PreferenceSignal, RetentionMode, RetentionSettings};
pub use scoring::{ComboRecord, ComboScorer, LevelDetail, ScoreTerms, ScoringContext};
pub use side_tables::{InventoryTable, PriceTable};
