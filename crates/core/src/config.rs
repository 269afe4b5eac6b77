use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::combo::counter::CountLimits;
use crate::combo::objectives::{Objective, ObjectiveWeights};
use crate::combo::optimizer::OptimizerSettings;
use crate::combo::retention::{RetentionMode, RetentionSettings};

#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    pub objectives: ObjectiveWeights,
    pub retention: RetentionSettings,
    pub limits: CountLimits,
    pub output: OutputConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputConfig {
    /// Combos reported per level; `0` reports all of them.
    pub top_n: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub retention_mode: Option<RetentionMode>,
    pub retention_seed: Option<u64>,
    pub max_basket_entities: Option<usize>,
    pub top_n: Option<usize>,
    pub log_level: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            objectives: ObjectiveWeights::default(),
            retention: RetentionSettings::default(),
            limits: CountLimits::default(),
            output: OutputConfig { top_n: 10 },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

/// Environment key carrying the weight of one objective.
pub fn objective_env_key(objective: Objective) -> String {
    format!("COMBO_OBJECTIVE_{}", objective.as_str().to_ascii_uppercase())
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("combo.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    pub fn optimizer_settings(&self) -> OptimizerSettings {
        OptimizerSettings {
            weights: self.objectives,
            retention: self.retention,
            limits: self.limits,
        }
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(objectives) = patch.objectives {
            let entries = [
                (Objective::RevenueGrowth, objectives.revenue_growth),
                (Objective::InventoryClearance, objectives.inventory_clearance),
                (Objective::CategoryGrowth, objectives.category_growth),
                (Objective::CustomerRetention, objectives.customer_retention),
                (Objective::Lift, objectives.lift),
            ];
            for (objective, weight) in entries {
                if let Some(weight) = weight {
                    self.objectives.set(objective, weight);
                }
            }
        }

        if let Some(retention) = patch.retention {
            if let Some(mode) = retention.mode {
                self.retention.mode = mode;
            }
            if let Some(seed) = retention.seed {
                self.retention.seed = Some(seed);
            }
        }

        if let Some(limits) = patch.limits {
            if let Some(max_basket_entities) = limits.max_basket_entities {
                self.limits.max_basket_entities = max_basket_entities;
            }
        }

        if let Some(output) = patch.output {
            if let Some(top_n) = output.top_n {
                self.output.top_n = top_n;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        for objective in Objective::ALL {
            let key = objective_env_key(objective);
            if let Some(value) = read_env(&key) {
                self.objectives.set(objective, parse_f64(&key, &value)?);
            }
        }

        if let Some(value) = read_env("COMBO_RETENTION_MODE") {
            self.retention.mode = value.parse().map_err(|_| ConfigError::InvalidEnvOverride {
                key: "COMBO_RETENTION_MODE".to_string(),
                value: value.clone(),
            })?;
        }
        if let Some(value) = read_env("COMBO_RETENTION_SEED") {
            self.retention.seed = Some(parse_u64("COMBO_RETENTION_SEED", &value)?);
        }

        if let Some(value) = read_env("COMBO_MAX_BASKET_ENTITIES") {
            self.limits.max_basket_entities = parse_usize("COMBO_MAX_BASKET_ENTITIES", &value)?;
        }
        if let Some(value) = read_env("COMBO_OUTPUT_TOP_N") {
            self.output.top_n = parse_usize("COMBO_OUTPUT_TOP_N", &value)?;
        }

        let log_level = read_env("COMBO_LOGGING_LEVEL").or_else(|| read_env("COMBO_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format = read_env("COMBO_LOGGING_FORMAT").or_else(|| read_env("COMBO_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(mode) = overrides.retention_mode {
            self.retention.mode = mode;
        }
        if let Some(seed) = overrides.retention_seed {
            self.retention.seed = Some(seed);
        }
        if let Some(max_basket_entities) = overrides.max_basket_entities {
            self.limits.max_basket_entities = max_basket_entities;
        }
        if let Some(top_n) = overrides.top_n {
            self.output.top_n = top_n;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_objectives(&self.objectives)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("combo.toml"), PathBuf::from("config/combo.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_objectives(objectives: &ObjectiveWeights) -> Result<(), ConfigError> {
    if let Some((objective, weight)) = objectives.first_invalid() {
        return Err(ConfigError::Validation(format!(
            "objectives.{objective} must be a finite, non-negative weight (got {weight})"
        )));
    }
    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.trim().parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_usize(key: &str, value: &str) -> Result<usize, ConfigError> {
    value.trim().parse::<usize>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_f64(key: &str, value: &str) -> Result<f64, ConfigError> {
    value.trim().parse::<f64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    objectives: Option<ObjectivesPatch>,
    retention: Option<RetentionPatch>,
    limits: Option<LimitsPatch>,
    output: Option<OutputPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct ObjectivesPatch {
    revenue_growth: Option<f64>,
    inventory_clearance: Option<f64>,
    category_growth: Option<f64>,
    customer_retention: Option<f64>,
    lift: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct RetentionPatch {
    mode: Option<RetentionMode>,
    seed: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LimitsPatch {
    max_basket_entities: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct OutputPatch {
    top_n: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
