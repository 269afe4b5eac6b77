use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use combo_core::config::{AppConfig, ConfigOverrides, LoadOptions};
use combo_core::{
    ApplicationError, ComboOptimizer, Level, ObjectiveWeights, RankedCombos, RetentionMode,
};
use serde::Serialize;

use crate::commands::CommandResult;
use crate::loader::{self, DatasetPaths};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum LevelScope {
    #[default]
    All,
    Item,
    Subcategory,
    Category,
}

#[derive(Clone, Debug, Default)]
pub struct OptimizeArgs {
    pub dataset: DatasetPaths,
    pub level: LevelScope,
    pub top: Option<usize>,
    pub retention: Option<RetentionMode>,
    pub seed: Option<u64>,
    pub max_basket_entities: Option<usize>,
    pub config: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
pub struct OptimizeReport {
    pub command: &'static str,
    pub status: &'static str,
    pub generated_at: DateTime<Utc>,
    pub weights: ObjectiveWeights,
    pub retention_mode: RetentionMode,
    pub top_n: usize,
    pub levels: Vec<RankedCombos>,
}

pub fn run(args: OptimizeArgs) -> CommandResult {
    match execute(&args) {
        Ok(report) => CommandResult::report(&report),
        Err(error) => CommandResult::from_error("optimize", &error),
    }
}

pub fn execute(args: &OptimizeArgs) -> Result<OptimizeReport, ApplicationError> {
    let config = AppConfig::load(LoadOptions {
        config_path: args.config.clone(),
        require_file: args.config.is_some(),
        overrides: ConfigOverrides {
            retention_mode: args.retention,
            retention_seed: args.seed,
            max_basket_entities: args.max_basket_entities,
            top_n: args.top,
            log_level: None,
        },
    })
    .map_err(|error| ApplicationError::Configuration(error.to_string()))?;

    crate::init_logging(&config);

    let inputs = loader::load_inputs(&args.dataset)?;
    let optimizer = ComboOptimizer::new(&inputs, config.optimizer_settings());

    let mut levels = match args.level {
        LevelScope::All => optimizer.optimize_all()?.into_values().collect(),
        LevelScope::Item => vec![optimizer.optimize(Level::Item)?],
        LevelScope::Subcategory => vec![optimizer.optimize(Level::Subcategory)?],
        LevelScope::Category => vec![optimizer.optimize(Level::Category)?],
    };
    for ranked in &mut levels {
        ranked.truncate(config.output.top_n);
    }

    Ok(OptimizeReport {
        command: "optimize",
        status: "ok",
        generated_at: Utc::now(),
        weights: config.objectives,
        retention_mode: config.retention.mode,
        top_n: config.output.top_n,
        levels,
    })
}
