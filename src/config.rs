//! Locations of the inputs and outputs of a run.
use std::path::PathBuf;

pub const DEFAULT_CUSTOMERS_LOCATION: &str = "./input_data/starter/customers.csv";
pub const DEFAULT_PRODUCTS_LOCATION: &str = "./input_data/starter/products.csv";
pub const DEFAULT_TRANSACTIONS_LOCATION: &str = "./input_data/starter/transactions/";
pub const DEFAULT_OUTPUT_LOCATION: &str = "./output_data/outputs/";

/// Name of the aggregated CSV table written to the output location.
pub const OUTPUT_CSV: &str = "output_df.csv";
/// Name of the per-customer JSON document written to the output location.
pub const OUTPUT_JSON: &str = "output_df.json";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// The customer reference CSV file.
    pub customers_location: PathBuf,
    /// The product reference CSV file.
    pub products_location: PathBuf,
    /// A folder holding one sub-folder per customer batch, each with a `transactions.json` file.
    pub transactions_location: PathBuf,
    /// The folder where the report is written.
    pub output_location: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            customers_location: DEFAULT_CUSTOMERS_LOCATION.into(),
            products_location: DEFAULT_PRODUCTS_LOCATION.into(),
            transactions_location: DEFAULT_TRANSACTIONS_LOCATION.into(),
            output_location: DEFAULT_OUTPUT_LOCATION.into(),
        }
    }
}

impl Config {
    pub fn output_csv_path(&self) -> PathBuf {
        self.output_location.join(OUTPUT_CSV)
    }

    pub fn output_json_path(&self) -> PathBuf {
        self.output_location.join(OUTPUT_JSON)
    }
}
