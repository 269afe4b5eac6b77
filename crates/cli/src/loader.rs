//! CSV loaders for the optimizer inputs.
//!
//! Expected files (headers required, fields trimmed):
//!   hierarchy:    product_id, category, subcategory
//!   transactions: transaction_id, product_id   (empty product_id = empty basket)
//!   prices:       product_id, price
//!   inventory:    product_id, stock
//!   preferences:  level, x, y, affinity

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use combo_core::{
    ApplicationError, ComboInputs, HierarchyIndex, InventoryTable, Level, PairKey, Placement,
    PreferenceSignal, PriceTable, ProductId, Transaction,
};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HierarchyRecord {
    pub product_id: String,
    pub category: String,
    pub subcategory: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub transaction_id: String,
    pub product_id: Option<String>,
}

/// Prices stay textual until parsed as a `Decimal` so no float rounding sneaks in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRecord {
    pub product_id: String,
    pub price: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryRecord {
    pub product_id: String,
    pub stock: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreferenceRecord {
    pub level: String,
    pub x: String,
    pub y: String,
    pub affinity: f64,
}

/// File locations for one optimization run. Side tables are optional.
#[derive(Debug, Clone, Default)]
pub struct DatasetPaths {
    pub transactions: PathBuf,
    pub hierarchy: PathBuf,
    pub prices: Option<PathBuf>,
    pub inventory: Option<PathBuf>,
    pub preferences: Option<PathBuf>,
}

pub fn load_inputs(paths: &DatasetPaths) -> Result<ComboInputs, ApplicationError> {
    let transactions =
        load_transactions(open(&paths.transactions)?, &display(&paths.transactions))?;
    let hierarchy = load_hierarchy(open(&paths.hierarchy)?, &display(&paths.hierarchy))?;
    let prices = match &paths.prices {
        Some(path) => load_prices(open(path)?, &display(path))?,
        None => PriceTable::default(),
    };
    let inventory = match &paths.inventory {
        Some(path) => load_inventory(open(path)?, &display(path))?,
        None => InventoryTable::default(),
    };
    let preferences = match &paths.preferences {
        Some(path) => load_preferences(open(path)?, &display(path))?,
        None => PreferenceSignal::default(),
    };

    info!(
        event_name = "combo.loader.inputs_loaded",
        transactions = transactions.len(),
        hierarchy_entries = hierarchy.len(),
        prices = prices.len(),
        inventory = inventory.len(),
        preferences = preferences.len(),
        "optimizer inputs loaded"
    );

    Ok(ComboInputs { transactions, hierarchy, prices, inventory, preferences })
}

pub fn load_hierarchy<R: Read>(
    reader: R,
    source: &str,
) -> Result<HierarchyIndex, ApplicationError> {
    let records: Vec<(usize, HierarchyRecord)> = read_records(reader, source)?;
    Ok(HierarchyIndex::new(records.into_iter().map(|(_, record)| {
        (ProductId(record.product_id), Placement::new(record.category, record.subcategory))
    })))
}

/// Rows are grouped by `transaction_id` in first-seen order.
pub fn load_transactions<R: Read>(
    reader: R,
    source: &str,
) -> Result<Vec<Transaction>, ApplicationError> {
    let records: Vec<(usize, TransactionRecord)> = read_records(reader, source)?;
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut transactions: Vec<Transaction> = Vec::new();

    for (_, record) in records {
        let position = *positions.entry(record.transaction_id).or_insert_with(|| {
            transactions.push(Vec::new());
            transactions.len() - 1
        });
        if let Some(product_id) = record.product_id.filter(|id| !id.is_empty()) {
            transactions[position].push(ProductId(product_id));
        }
    }

    Ok(transactions)
}

pub fn load_prices<R: Read>(reader: R, source: &str) -> Result<PriceTable, ApplicationError> {
    let records: Vec<(usize, PriceRecord)> = read_records(reader, source)?;
    let mut prices = Vec::with_capacity(records.len());

    for (line, record) in records {
        let price = Decimal::from_str(record.price.trim()).map_err(|error| {
            ApplicationError::Input(format!(
                "{source}:{line}: invalid price `{}`: {error}",
                record.price
            ))
        })?;
        if price.is_sign_negative() && !price.is_zero() {
            return Err(ApplicationError::Input(format!(
                "{source}:{line}: price for `{}` must not be negative",
                record.product_id
            )));
        }
        prices.push((ProductId(record.product_id), price));
    }

    Ok(PriceTable::new(prices))
}

pub fn load_inventory<R: Read>(
    reader: R,
    source: &str,
) -> Result<InventoryTable, ApplicationError> {
    let records: Vec<(usize, InventoryRecord)> = read_records(reader, source)?;
    Ok(InventoryTable::new(
        records.into_iter().map(|(_, record)| (ProductId(record.product_id), record.stock)),
    ))
}

pub fn load_preferences<R: Read>(
    reader: R,
    source: &str,
) -> Result<PreferenceSignal, ApplicationError> {
    let records: Vec<(usize, PreferenceRecord)> = read_records(reader, source)?;
    let mut signal = PreferenceSignal::default();

    for (line, record) in records {
        let level = Level::from_str(&record.level)
            .map_err(|error| ApplicationError::Input(format!("{source}:{line}: {error}")))?;
        signal.insert(level, PairKey::new(record.x, record.y), record.affinity);
    }

    Ok(signal)
}

fn read_records<T, R>(reader: R, source: &str) -> Result<Vec<(usize, T)>, ApplicationError>
where
    T: DeserializeOwned,
    R: Read,
{
    let mut csv_reader =
        csv::ReaderBuilder::new().has_headers(true).trim(csv::Trim::All).from_reader(reader);

    let mut records = Vec::new();
    for (line_num, result) in csv_reader.deserialize().enumerate() {
        let line = line_num + 2;
        let record: T = result.map_err(|error| {
            ApplicationError::Input(format!("{source}:{line}: CSV parse error: {error}"))
        })?;
        records.push((line, record));
    }

    Ok(records)
}

fn open(path: &Path) -> Result<File, ApplicationError> {
    File::open(path).map_err(|error| {
        ApplicationError::Input(format!("failed to open `{}`: {error}", path.display()))
    })
}

fn display(path: &Path) -> String {
    path.display().to_string()
}
