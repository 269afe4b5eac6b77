use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::DomainError;

/// Business goals that can steer the combo ranking.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Objective {
    RevenueGrowth,
    InventoryClearance,
    CategoryGrowth,
    CustomerRetention,
    Lift,
}

impl Objective {
    pub const ALL: [Objective; 5] = [
        Objective::RevenueGrowth,
        Objective::InventoryClearance,
        Objective::CategoryGrowth,
        Objective::CustomerRetention,
        Objective::Lift,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RevenueGrowth => "revenue_growth",
            Self::InventoryClearance => "inventory_clearance",
            Self::CategoryGrowth => "category_growth",
            Self::CustomerRetention => "customer_retention",
            Self::Lift => "lift",
        }
    }
}

impl fmt::Display for Objective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Objective {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|objective| objective.as_str() == normalized).ok_or_else(|| {
            DomainError::InvariantViolation(format!("unrecognized objective `{normalized}`"))
        })
    }
}

/// Non-negative weight per objective. Unset objectives weigh 0.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectiveWeights {
    pub revenue_growth: f64,
    pub inventory_clearance: f64,
    pub category_growth: f64,
    pub customer_retention: f64,
    pub lift: f64,
}

impl ObjectiveWeights {
    /// Builds weights from `(name, weight)` pairs; unrecognized names are ignored.
    pub fn from_named<'a>(entries: impl IntoIterator<Item = (&'a str, f64)>) -> Self {
        let mut weights = Self::default();
        for (name, weight) in entries {
            match name.parse::<Objective>() {
                Ok(objective) => weights.set(objective, weight),
                Err(_) => debug!(
                    event_name = "combo.objectives.unrecognized",
                    objective = name,
                    "ignoring unrecognized objective weight"
                ),
            }
        }
        weights
    }

    pub fn get(&self, objective: Objective) -> f64 {
        match objective {
            Objective::RevenueGrowth => self.revenue_growth,
            Objective::InventoryClearance => self.inventory_clearance,
            Objective::CategoryGrowth => self.category_growth,
            Objective::CustomerRetention => self.customer_retention,
            Objective::Lift => self.lift,
        }
    }

    pub fn set(&mut self, objective: Objective, weight: f64) {
        match objective {
            Objective::RevenueGrowth => self.revenue_growth = weight,
            Objective::InventoryClearance => self.inventory_clearance = weight,
            Objective::CategoryGrowth => self.category_growth = weight,
            Objective::CustomerRetention => self.customer_retention = weight,
            Objective::Lift => self.lift = weight,
        }
    }

    /// First objective whose weight is negative or not finite.
    pub fn first_invalid(&self) -> Option<(Objective, f64)> {
        Objective::ALL
            .into_iter()
            .map(|objective| (objective, self.get(objective)))
            .find(|(_, weight)| !weight.is_finite() || *weight < 0.0)
    }
}
