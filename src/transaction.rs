//! Discover transaction files, and flatten their nested purchase events into a [Table].
use std::io::BufRead;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::core::{CUSTOMER_ID, DATE_OF_PURCHASE, PRODUCT_ID};
use crate::{Cell, Error, Result, Table};

/// Name of the file expected in every customer batch folder.
pub const TRANSACTIONS_FILE: &str = "transactions.json";

/// A single purchase, as found on one line of a transactions file.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct PurchaseEvent {
    pub customer_id: Value,
    pub date_of_purchase: Value,
    /// Items are schema-less: every field becomes a column of the flattened table.
    pub basket: Vec<Map<String, Value>>,
}

impl PurchaseEvent {
    /// One record per basket item: the item's fields, followed by the purchase metadata. An empty
    /// basket yields no record at all.
    pub fn flatten(&self) -> Result<Vec<Vec<(String, Cell)>>> {
        self.basket
            .iter()
            .map(|item| {
                let mut record = Vec::new();
                flatten_object(item, None, &mut record);
                if let Some((field, _)) = record
                    .iter()
                    .find(|(field, _)| field == CUSTOMER_ID || field == DATE_OF_PURCHASE)
                {
                    return Err(Error::ConflictingField {
                        field: field.clone(),
                    });
                }
                for (field, value) in record.iter_mut() {
                    if field.as_str() == PRODUCT_ID {
                        *value = std::mem::take(value).into_text();
                    }
                }
                record.push((
                    CUSTOMER_ID.to_owned(),
                    Cell::from_json(&self.customer_id).into_text(),
                ));
                record.push((
                    DATE_OF_PURCHASE.to_owned(),
                    Cell::from_json(&self.date_of_purchase),
                ));
                Ok(record)
            })
            .collect()
    }
}

// Nested objects are spread over `parent.child` columns, empty ones vanish.
fn flatten_object(
    object: &Map<String, Value>,
    prefix: Option<&str>,
    out: &mut Vec<(String, Cell)>,
) {
    for (key, value) in object {
        let column = match prefix {
            Some(prefix) => format!("{}.{}", prefix, key),
            None => key.clone(),
        };
        match value {
            Value::Object(inner) => flatten_object(inner, Some(&column), out),
            _ => out.push((column, Cell::from_json(value))),
        }
    }
}

/// List the transactions file of every customer batch folder directly under `root`, sorted by
/// folder name. Whether those files exist is only checked when reading them.
pub fn transaction_files(root: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|source| Error::Discovery {
            path: root.to_owned(),
            source,
        })?;
        if entry.file_type().is_dir() {
            files.push(entry.path().join(TRANSACTIONS_FILE));
        }
    }
    debug!(root = %root.display(), folders = files.len(), "discovered transaction folders");
    Ok(files)
}

/// Flatten every purchase event of the given files into a single table, in the order the files
/// are given. Missing files are skipped with a warning.
///
/// The table always holds the columns later joined on, even when no purchase was read.
pub fn flatten_files<P: AsRef<Path>>(paths: &[P]) -> Result<Table> {
    let columns = [PRODUCT_ID, CUSTOMER_ID, DATE_OF_PURCHASE];
    let mut table = Table::new("transactions", columns.map(str::to_owned).to_vec());
    for path in paths.iter().map(AsRef::as_ref) {
        if !path.exists() {
            warn!(path = %path.display(), "transaction file is not present, skipping");
            continue;
        }
        let file = std::fs::File::open(path).map_err(|source| Error::Io {
            path: path.to_owned(),
            source,
        })?;
        flatten_reader(std::io::BufReader::new(file), path, &mut table)?;
    }
    Ok(table)
}

/// Flatten the newline-delimited purchase events read from `input` into `table`. `source` is only
/// used to report errors.
pub fn flatten_reader<R: BufRead>(input: R, source: &Path, table: &mut Table) -> Result<()> {
    let before = table.len();
    for (line, index) in input.lines().zip(1..) {
        let line = line.map_err(|error| Error::Io {
            path: source.to_owned(),
            source: error,
        })?;
        if line.trim().is_empty() {
            continue;
        }
        let event: PurchaseEvent = serde_json::from_str(&line).map_err(|error| Error::Json {
            file: source.to_owned(),
            line: index,
            error,
        })?;
        for record in event.flatten()? {
            table.push_record(record);
        }
    }
    debug!(
        path = %source.display(),
        rows = table.len() - before,
        "flattened transaction file"
    );
    Ok(())
}
