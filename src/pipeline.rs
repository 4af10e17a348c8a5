//! Run every stage, from the input files to the written report.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{debug, error, info};

use crate::{
    aggregate, flatten_files, load_reference, master_table, nest, transaction_files,
    AggregateTable, Config, CustomerDocuments, Error, Result,
};

/// The result of a run: the aggregated table, and its per-customer nesting.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Report {
    pub aggregates: AggregateTable,
    pub documents: CustomerDocuments,
}

/// Where [Report::write] put its files.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReportPaths {
    pub csv: PathBuf,
    pub json: PathBuf,
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> Error {
    let path = path.to_owned();
    move |source| Error::Io { path, source }
}

// Log a failed stage before handing the error to the caller.
fn stage<T>(name: &'static str, result: Result<T>) -> Result<T> {
    result.inspect_err(|err| error!(stage = name, error = %err, "stage failed"))
}

/// Read every input named by `config` and compute the report, without writing anything.
pub fn build_report(config: &Config) -> Result<Report> {
    let files = stage("discover", transaction_files(&config.transactions_location))?;
    let transactions = stage("flatten", flatten_files(&files))?;
    debug!(rows = transactions.len(), "flattened transactions");

    let customers = stage(
        "customers",
        load_reference(&config.customers_location, "customers"),
    )?;
    let products = stage(
        "products",
        load_reference(&config.products_location, "products"),
    )?;

    let master = stage("master", master_table(&transactions, &customers, &products))?;
    debug!(rows = master.len(), "joined master table");

    let aggregates = stage("aggregate", aggregate(&master))?;
    debug!(rows = aggregates.len(), "aggregated purchases");

    let documents = nest(&aggregates);
    debug!(customers = documents.len(), "nested customer documents");

    Ok(Report {
        aggregates,
        documents,
    })
}

impl Report {
    /// Write both artifacts to the output location of `config`, creating it if needed.
    pub fn write(&self, config: &Config) -> Result<ReportPaths> {
        std::fs::create_dir_all(&config.output_location)
            .map_err(io_error(&config.output_location))?;

        let csv_path = config.output_csv_path();
        let csv_error = |source| Error::Csv {
            path: csv_path.clone(),
            source,
        };
        let mut writer = csv::Writer::from_path(&csv_path).map_err(csv_error)?;
        self.aggregates.dump_csv(&mut writer).map_err(csv_error)?;
        writer.flush().map_err(io_error(&csv_path))?;

        let json_path = config.output_json_path();
        let file = std::fs::File::create(&json_path).map_err(io_error(&json_path))?;
        let mut writer = std::io::BufWriter::new(file);
        self.documents
            .write_json(&mut writer)
            .map_err(|source| io_error(&json_path)(source.into()))?;
        writer.flush().map_err(io_error(&json_path))?;

        Ok(ReportPaths {
            csv: csv_path,
            json: json_path,
        })
    }
}

/// Build the report described by `config`, and write it to disk.
pub fn run(config: &Config) -> Result<(Report, ReportPaths)> {
    let begin = Instant::now();
    let report = build_report(config)?;
    let paths = stage("write", report.write(config))?;
    info!(
        csv = %paths.csv.display(),
        json = %paths.json.display(),
        elapsed = ?begin.elapsed(),
        "report written"
    );
    Ok((report, paths))
}
