//! Customer-retention affinity for combo pairs.
//!
//! Two sources exist: a caller-supplied preference signal, and the uniform
//! random placeholder used when no real signal is available. Which one runs is
//! an explicit configuration choice ([`RetentionMode`]).

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::domain::level::{Level, PairKey};
use crate::errors::DomainError;

/// Largest value strictly below 1.0.
const MAX_AFFINITY: f64 = 1.0 - f64::EPSILON / 2.0;
const LEVEL_SALT: u64 = 0x9E37_79B9_7F4A_7C15;

/// Produces a per-pair affinity in `[0, 1)`.
pub trait AffinitySource {
    fn affinity(&mut self, level: Level, pair: &PairKey) -> f64;
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetentionMode {
    /// Caller-supplied preference signal; pairs without a value score 0.
    #[default]
    Preference,
    /// Uniform random draw per pair.
    Random,
}

impl RetentionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Preference => "preference",
            Self::Random => "random",
        }
    }
}

impl fmt::Display for RetentionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RetentionMode {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "preference" => Ok(Self::Preference),
            "random" => Ok(Self::Random),
            other => Err(DomainError::InvariantViolation(format!(
                "unsupported retention mode `{other}` (expected preference|random)"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionSettings {
    pub mode: RetentionMode,
    /// Only used by [`RetentionMode::Random`]. Unset means entropy-seeded.
    pub seed: Option<u64>,
}

impl RetentionSettings {
    pub fn source_for<'a>(
        &self,
        level: Level,
        signal: &'a PreferenceSignal,
    ) -> Box<dyn AffinitySource + 'a> {
        match (self.mode, self.seed) {
            (RetentionMode::Preference, _) => Box::new(PreferenceLookup { signal }),
            (RetentionMode::Random, Some(seed)) => Box::new(RandomAffinity::seeded(seed, level)),
            (RetentionMode::Random, None) => Box::new(RandomAffinity::from_entropy()),
        }
    }
}

/// Externally supplied affinity per `(level, pair)`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PreferenceSignal {
    values: HashMap<(Level, PairKey), f64>,
}

impl PreferenceSignal {
    pub fn new(entries: impl IntoIterator<Item = (Level, PairKey, f64)>) -> Self {
        let mut signal = Self::default();
        for (level, pair, affinity) in entries {
            signal.insert(level, pair, affinity);
        }
        signal
    }

    /// Values are clamped into `[0, 1)`; NaN becomes 0.
    pub fn insert(&mut self, level: Level, pair: PairKey, affinity: f64) {
        self.values.insert((level, pair), clamp_affinity(affinity));
    }

    pub fn get(&self, level: Level, pair: &PairKey) -> Option<f64> {
        self.values.get(&(level, pair.clone())).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

struct PreferenceLookup<'a> {
    signal: &'a PreferenceSignal,
}

impl AffinitySource for PreferenceLookup<'_> {
    fn affinity(&mut self, level: Level, pair: &PairKey) -> f64 {
        self.signal.get(level, pair).unwrap_or(0.0)
    }
}

pub struct RandomAffinity {
    rng: StdRng,
}

impl RandomAffinity {
    /// Each level gets its own stream so single-level and all-level runs agree.
    pub fn seeded(seed: u64, level: Level) -> Self {
        let salt = LEVEL_SALT.wrapping_mul(level.index() as u64 + 1);
        Self { rng: StdRng::seed_from_u64(seed ^ salt) }
    }

    pub fn from_entropy() -> Self {
        Self { rng: StdRng::from_entropy() }
    }
}

impl AffinitySource for RandomAffinity {
    fn affinity(&mut self, _level: Level, _pair: &PairKey) -> f64 {
        self.rng.gen::<f64>()
    }
}

fn clamp_affinity(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, MAX_AFFINITY)
    }
}
