use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// Granularity of a co-occurrence analysis. Each level is an independent universe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    Item,
    Subcategory,
    Category,
}

impl Level {
    pub const ALL: [Level; 3] = [Level::Item, Level::Subcategory, Level::Category];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Item => "item",
            Self::Subcategory => "subcategory",
            Self::Category => "category",
        }
    }

    /// Taxonomy levels aggregate items through the hierarchy index.
    pub fn is_grouping(&self) -> bool {
        !matches!(self, Self::Item)
    }

    pub(crate) fn index(&self) -> usize {
        match self {
            Self::Item => 0,
            Self::Subcategory => 1,
            Self::Category => 2,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "item" | "product" => Ok(Self::Item),
            "subcategory" => Ok(Self::Subcategory),
            "category" => Ok(Self::Category),
            other => Err(DomainError::InvariantViolation(format!(
                "unsupported level `{other}` (expected item|subcategory|category)"
            ))),
        }
    }
}

/// Unordered pair of entity names, stored with `first <= second`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PairKey {
    first: String,
    second: String,
}

impl PairKey {
    pub fn new(a: impl Into<String>, b: impl Into<String>) -> Self {
        let (a, b) = (a.into(), b.into());
        if a <= b {
            Self { first: a, second: b }
        } else {
            Self { first: b, second: a }
        }
    }

    pub fn first(&self) -> &str {
        &self.first
    }

    pub fn second(&self) -> &str {
        &self.second
    }
}

impl fmt::Display for PairKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} + {}", self.first, self.second)
    }
}
