use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

use basket_report::{
    run, Config, DEFAULT_CUSTOMERS_LOCATION, DEFAULT_OUTPUT_LOCATION, DEFAULT_PRODUCTS_LOCATION,
    DEFAULT_TRANSACTIONS_LOCATION,
};

/// Count purchases per customer and product, from nested transaction files and reference tables
#[derive(Debug, Parser)]
#[command(name = "basket-report", version, long_about = None)]
struct Cli {
    /// Customer reference CSV file
    #[arg(long, alias = "customers_location", default_value = DEFAULT_CUSTOMERS_LOCATION)]
    customers_location: PathBuf,

    /// Product reference CSV file
    #[arg(long, alias = "products_location", default_value = DEFAULT_PRODUCTS_LOCATION)]
    products_location: PathBuf,

    /// Folder holding one sub-folder of transactions per customer batch
    #[arg(long, alias = "transactions_location", default_value = DEFAULT_TRANSACTIONS_LOCATION)]
    transactions_location: PathBuf,

    /// Folder where output_df.csv and output_df.json are written
    #[arg(long, alias = "output_location", default_value = DEFAULT_OUTPUT_LOCATION)]
    output_location: PathBuf,

    /// Enable verbose output (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl From<Cli> for Config {
    fn from(cli: Cli) -> Self {
        Self {
            customers_location: cli.customers_location,
            products_location: cli.products_location,
            transactions_location: cli.transactions_location,
            output_location: cli.output_location,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level)),
        )
        .with_target(cli.verbose >= 2)
        .init();

    let config = Config::from(cli);
    debug!(?config, "starting run");

    match run(&config).context("cannot build purchase report") {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}
