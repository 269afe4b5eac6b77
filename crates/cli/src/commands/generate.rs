//! Synthetic retail dataset in the CSV layout the loaders read.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use combo_core::config::{AppConfig, LoadOptions};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use tracing::info;

use crate::commands::CommandResult;
use crate::loader::{HierarchyRecord, InventoryRecord, PriceRecord, TransactionRecord};

pub const PRODUCTS: [&str; 10] = [
    "Laptop",
    "Mouse",
    "Keyboard",
    "Smartphone",
    "Earphones",
    "Tablet",
    "Camera",
    "Speaker",
    "Charger",
    "Smartwatch",
];

pub const CATEGORIES: [(&str, &[&str]); 4] = [
    ("Electronics", &["Computers", "Mobile", "Audio", "Tablets", "Cameras"]),
    ("Accessories", &["Input Devices", "Chargers", "Wearables"]),
    ("Furniture", &["Living Room", "Bedroom", "Office"]),
    ("Clothing", &["Men", "Women", "Kids"]),
];

const MAX_BASKET_SIZE: usize = 5;

pub const TRANSACTIONS_FILE: &str = "transactions.csv";
pub const HIERARCHY_FILE: &str = "hierarchy.csv";
pub const PRICES_FILE: &str = "prices.csv";
pub const INVENTORY_FILE: &str = "inventory.csv";

#[derive(Clone, Debug)]
pub struct GenerateArgs {
    pub out_dir: PathBuf,
    pub transactions: usize,
    pub seed: u64,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SyntheticDataset {
    pub hierarchy: Vec<HierarchyRecord>,
    pub transactions: Vec<TransactionRecord>,
    pub prices: Vec<PriceRecord>,
    pub inventory: Vec<InventoryRecord>,
}

pub fn run(args: GenerateArgs) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "generate",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };
    crate::init_logging(&config);

    match write_dataset(&args) {
        Ok(rows) => CommandResult::success(
            "generate",
            format!(
                "wrote {} transactions ({rows} rows) to {}",
                args.transactions,
                args.out_dir.display()
            ),
        ),
        Err(error) => CommandResult::failure("generate", "io", format!("{error:#}"), 3),
    }
}

/// Builds the dataset and writes the four CSV files; returns the transaction row count.
pub fn write_dataset(args: &GenerateArgs) -> Result<usize> {
    let dataset = synthesize(args.transactions, args.seed);

    fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("failed to create `{}`", args.out_dir.display()))?;
    write_csv(&args.out_dir.join(HIERARCHY_FILE), &dataset.hierarchy)?;
    write_csv(&args.out_dir.join(TRANSACTIONS_FILE), &dataset.transactions)?;
    write_csv(&args.out_dir.join(PRICES_FILE), &dataset.prices)?;
    write_csv(&args.out_dir.join(INVENTORY_FILE), &dataset.inventory)?;

    info!(
        event_name = "combo.generate.completed",
        out_dir = %args.out_dir.display(),
        transactions = args.transactions,
        rows = dataset.transactions.len(),
        seed = args.seed,
        "synthetic dataset written"
    );

    Ok(dataset.transactions.len())
}

pub fn synthesize(transaction_count: usize, seed: u64) -> SyntheticDataset {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut dataset = SyntheticDataset::default();

    for product in PRODUCTS {
        let (category, subcategories) = CATEGORIES[rng.gen_range(0..CATEGORIES.len())];
        let subcategory = subcategories[rng.gen_range(0..subcategories.len())];
        dataset.hierarchy.push(HierarchyRecord {
            product_id: product.to_string(),
            category: category.to_string(),
            subcategory: subcategory.to_string(),
        });

        let cents: i64 = rng.gen_range(500..=150_000);
        dataset.prices.push(PriceRecord {
            product_id: product.to_string(),
            price: Decimal::new(cents, 2).to_string(),
        });
        dataset.inventory.push(InventoryRecord {
            product_id: product.to_string(),
            stock: rng.gen_range(0..=250),
        });
    }

    for index in 1..=transaction_count {
        let basket_size = rng.gen_range(1..=MAX_BASKET_SIZE);
        for product in PRODUCTS.choose_multiple(&mut rng, basket_size) {
            dataset.transactions.push(TransactionRecord {
                transaction_id: index.to_string(),
                product_id: Some((*product).to_string()),
            });
        }
    }

    dataset
}

fn write_csv<T: serde::Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to open `{}` for writing", path.display()))?;
    for row in rows {
        writer.serialize(row).with_context(|| format!("failed to write `{}`", path.display()))?;
    }
    writer.flush().with_context(|| format!("failed to flush `{}`", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, BTreeSet};

    use super::{synthesize, CATEGORIES, MAX_BASKET_SIZE, PRODUCTS};

    #[test]
    fn same_seed_yields_same_dataset() {
        assert_eq!(synthesize(50, 9), synthesize(50, 9));
        assert_ne!(synthesize(50, 9).transactions, synthesize(50, 10).transactions);
    }

    #[test]
    fn baskets_hold_one_to_five_distinct_known_products() {
        let dataset = synthesize(200, 1);
        let mut baskets: BTreeMap<usize, BTreeSet<String>> = BTreeMap::new();
        let mut rows = 0;
        for row in &dataset.transactions {
            let id = row.transaction_id.parse::<usize>().unwrap();
            let product = row.product_id.clone().unwrap();
            assert!(PRODUCTS.contains(&product.as_str()));
            baskets.entry(id).or_default().insert(product);
            rows += 1;
        }

        assert_eq!(baskets.len(), 200);
        let distinct: usize = baskets.values().map(BTreeSet::len).sum();
        assert_eq!(distinct, rows, "a basket never repeats a product");
        assert!(baskets.values().all(|basket| (1..=MAX_BASKET_SIZE).contains(&basket.len())));
    }

    #[test]
    fn every_product_gets_a_consistent_placement_and_side_data() {
        let dataset = synthesize(0, 3);

        assert!(dataset.transactions.is_empty());
        assert_eq!(dataset.hierarchy.len(), PRODUCTS.len());
        assert_eq!(dataset.prices.len(), PRODUCTS.len());
        assert_eq!(dataset.inventory.len(), PRODUCTS.len());
        for entry in &dataset.hierarchy {
            let (_, subcategories) = CATEGORIES
                .iter()
                .find(|(category, _)| *category == entry.category)
                .expect("known category");
            assert!(subcategories.contains(&entry.subcategory.as_str()));
        }
    }
}
