use std::collections::HashMap;

use tracing::warn;

use crate::domain::product::{Placement, ProductId};

/// Product → (category, subcategory) lookup.
#[derive(Clone, Debug, Default)]
pub struct HierarchyIndex {
    placements: HashMap<ProductId, Placement>,
}

impl HierarchyIndex {
    pub fn new(entries: impl IntoIterator<Item = (ProductId, Placement)>) -> Self {
        let mut placements = HashMap::new();
        for (product_id, placement) in entries {
            // A blank entry still overrides earlier ones: the product becomes unknown.
            let previous = if placement.is_blank() {
                placements.remove(&product_id)
            } else {
                placements.insert(product_id.clone(), placement)
            };
            if let Some(previous) = previous {
                warn_duplicate(&product_id, &previous);
            }
        }
        Self { placements }
    }

    /// `None` is the unknown sentinel: the product still counts at item level.
    pub fn lookup(&self, product_id: &ProductId) -> Option<&Placement> {
        self.placements.get(product_id)
    }

    pub fn len(&self) -> usize {
        self.placements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }
}

fn warn_duplicate(product_id: &ProductId, previous: &Placement) {
    warn!(
        event_name = "combo.hierarchy.duplicate_entry",
        product_id = %product_id,
        replaced_category = %previous.category,
        replaced_subcategory = %previous.subcategory,
        "duplicate hierarchy entry; keeping the last one"
    );
}

#[cfg(test)]
mod tests {
    use super::HierarchyIndex;
    use crate::domain::product::{Placement, ProductId};

    #[test]
    fn lookup_returns_unknown_for_missing_products() {
        let index = HierarchyIndex::new([(
            ProductId::from("laptop"),
            Placement::new("Electronics", "Computers"),
        )]);

        assert_eq!(
            index.lookup(&ProductId::from("laptop")),
            Some(&Placement::new("Electronics", "Computers"))
        );
        assert_eq!(index.lookup(&ProductId::from("toaster")), None);
    }

    #[test]
    fn last_duplicate_entry_wins() {
        let index = HierarchyIndex::new([
            (ProductId::from("mouse"), Placement::new("Electronics", "Computers")),
            (ProductId::from("mouse"), Placement::new("Accessories", "Input Devices")),
        ]);

        assert_eq!(index.len(), 1);
        assert_eq!(
            index.lookup(&ProductId::from("mouse")).map(|p| p.category.as_str()),
            Some("Accessories")
        );
    }

    #[test]
    fn trailing_blank_entry_makes_product_unknown() {
        let index = HierarchyIndex::new([
            (ProductId::from("mouse"), Placement::new("Accessories", "Input Devices")),
            (ProductId::from("mouse"), Placement::new("", "")),
            (ProductId::from("laptop"), Placement::new("Electronics", "Computers")),
        ]);

        assert_eq!(index.lookup(&ProductId::from("mouse")), None);
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn blank_placements_are_treated_as_unknown() {
        let index =
            HierarchyIndex::new([(ProductId::from("gift-card"), Placement::new("", "Cards"))]);

        assert!(index.is_empty());
        assert_eq!(index.lookup(&ProductId::from("gift-card")), None);
    }
}
