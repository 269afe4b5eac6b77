pub mod combo;
pub mod config;
pub mod domain;
pub mod errors;

pub use combo::{
    ComboInputs, ComboOptimizer, ComboRecord, HierarchyIndex, InventoryTable, LevelDetail,
    ObjectiveWeights, OptimizerSettings, PreferenceSignal, PriceTable, RankedCombos,
    RetentionMode, RetentionSettings,
};
pub use domain::level::{Level, PairKey};
pub use domain::product::{Placement, ProductId, Transaction};
pub use errors::{ApplicationError, DomainError};
