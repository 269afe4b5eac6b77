use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProductId(pub String);

impl ProductId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProductId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

/// Where a product sits in the taxonomy.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub category: String,
    pub subcategory: String,
}

impl Placement {
    pub fn new(category: impl Into<String>, subcategory: impl Into<String>) -> Self {
        Self { category: category.into(), subcategory: subcategory.into() }
    }

    /// Blank names carry no grouping information and are treated as unknown.
    pub fn is_blank(&self) -> bool {
        self.category.trim().is_empty() || self.subcategory.trim().is_empty()
    }
}

/// One basket. Repeated products are legal; counting treats the basket as a set.
pub type Transaction = Vec<ProductId>;
