use std::collections::HashMap;

use rust_decimal::Decimal;

use crate::domain::product::ProductId;

/// Unit prices by product. Sparse: a missing price scores as zero.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PriceTable {
    prices: HashMap<String, Decimal>,
}

impl PriceTable {
    pub fn new(entries: impl IntoIterator<Item = (ProductId, Decimal)>) -> Self {
        Self { prices: entries.into_iter().map(|(id, price)| (id.0, price)).collect() }
    }

    pub fn get(&self, product: &str) -> Option<Decimal> {
        self.prices.get(product).copied()
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}

/// Units on hand by product. Sparse: missing stock scores as zero.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InventoryTable {
    levels: HashMap<String, u64>,
}

impl InventoryTable {
    pub fn new(entries: impl IntoIterator<Item = (ProductId, u64)>) -> Self {
        Self { levels: entries.into_iter().map(|(id, stock)| (id.0, stock)).collect() }
    }

    pub fn get(&self, product: &str) -> Option<u64> {
        self.levels.get(product).copied()
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{InventoryTable, PriceTable};
    use crate::domain::product::ProductId;

    #[test]
    fn missing_entries_are_reported_as_absent() {
        let prices = PriceTable::new([(ProductId::from("laptop"), Decimal::new(99_999, 2))]);
        let inventory = InventoryTable::new([(ProductId::from("mouse"), 200)]);

        assert_eq!(prices.get("laptop"), Some(Decimal::new(99_999, 2)));
        assert_eq!(prices.get("mouse"), None);
        assert_eq!(inventory.get("mouse"), Some(200));
        assert_eq!(inventory.get("laptop"), None);
    }
}
