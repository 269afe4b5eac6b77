pub mod commands;
pub mod loader;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use combo_core::config::{AppConfig, LogFormat};
use combo_core::RetentionMode;

use crate::commands::generate::GenerateArgs;
use crate::commands::optimize::{LevelScope, OptimizeArgs};
use crate::loader::DatasetPaths;

#[derive(Debug, Parser)]
#[command(
    name = "combo",
    about = "Combo offer optimizer CLI",
    long_about = "Rank item, subcategory and category combos from a transaction log using support, lift and weighted business objectives.",
    after_help = "Examples:\n  combo generate --out-dir data\n  combo optimize --transactions data/transactions.csv --hierarchy data/hierarchy.csv --prices data/prices.csv --inventory data/inventory.csv\n  combo config"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Score and rank combos, emitting a JSON report")]
    Optimize {
        #[arg(long, help = "Long-form transactions CSV (transaction_id,product_id)")]
        transactions: PathBuf,
        #[arg(long, help = "Product hierarchy CSV (product_id,category,subcategory)")]
        hierarchy: PathBuf,
        #[arg(long, help = "Unit prices CSV (product_id,price)")]
        prices: Option<PathBuf>,
        #[arg(long, help = "Inventory CSV (product_id,stock)")]
        inventory: Option<PathBuf>,
        #[arg(long, help = "Retention preference CSV (level,x,y,affinity)")]
        preferences: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = LevelScope::All)]
        level: LevelScope,
        #[arg(long, help = "Combos reported per level (0 = all)")]
        top: Option<usize>,
        #[arg(long, help = "Retention affinity source: preference|random")]
        retention: Option<RetentionMode>,
        #[arg(long, help = "Seed for random retention affinity")]
        seed: Option<u64>,
        #[arg(
            long,
            help = "Skip pair enumeration for baskets above this many entities (0 = unbounded)"
        )]
        max_basket_entities: Option<usize>,
        #[arg(long, help = "Explicit config file (must exist)")]
        config: Option<PathBuf>,
    },
    #[command(about = "Write a seeded synthetic dataset as CSV files")]
    Generate {
        #[arg(long)]
        out_dir: PathBuf,
        #[arg(long, default_value_t = 1000)]
        transactions: usize,
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Optimize {
            transactions,
            hierarchy,
            prices,
            inventory,
            preferences,
            level,
            top,
            retention,
            seed,
            max_basket_entities,
            config,
        } => commands::optimize::run(OptimizeArgs {
            dataset: DatasetPaths { transactions, hierarchy, prices, inventory, preferences },
            level,
            top,
            retention,
            seed,
            max_basket_entities,
            config,
        }),
        Command::Generate { out_dir, transactions, seed } => {
            commands::generate::run(GenerateArgs { out_dir, transactions, seed })
        }
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

/// Installs the global subscriber on stderr; later calls are no-ops.
pub fn init_logging(config: &AppConfig) {
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(log_level)
        .with_writer(std::io::stderr);

    let _ = match config.logging.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}
