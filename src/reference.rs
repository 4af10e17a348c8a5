//! Load the customer and product reference tables from CSV.

use std::path::Path;

use tracing::debug;

use crate::core::{CUSTOMER_ID, PRODUCT_ID};
use crate::{Cell, Error, Result, Table};

/// Values which denote a missing cell in a reference CSV file.
const NULL_MARKERS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Identifier columns are always read as text, so that `007` stays `007` and matches the string
/// ids of the transactions files.
const ID_COLUMNS: &[&str] = &[CUSTOMER_ID, PRODUCT_ID];

/// The [csv::ReaderBuilder] used for every reference file.
pub fn configured_csv_reader_builder() -> csv::ReaderBuilder {
    let mut builder = csv::ReaderBuilder::new();
    builder.has_headers(true).flexible(false);
    builder
}

/// Read the reference file at `path` into a [Table] called `name`.
pub fn load_reference(path: &Path, name: &str) -> Result<Table> {
    let reader = configured_csv_reader_builder()
        .from_path(path)
        .map_err(|source| Error::Csv {
            path: path.to_owned(),
            source,
        })?;
    let table = read_table(reader, name).map_err(|source| Error::Csv {
        path: path.to_owned(),
        source,
    })?;
    debug!(
        table = name,
        path = %path.display(),
        rows = table.len(),
        "loaded reference table"
    );
    Ok(table)
}

/// Same as [load_reference], but from an arbitrary reader.
pub fn read_reference<R: std::io::Read>(input: R, name: &str) -> Result<Table> {
    let reader = configured_csv_reader_builder().from_reader(input);
    read_table(reader, name).map_err(|source| Error::Csv {
        path: name.into(),
        source,
    })
}

fn read_table<R: std::io::Read>(mut reader: csv::Reader<R>, name: &str) -> csv::Result<Table> {
    let columns: Vec<String> = reader.headers()?.iter().map(str::to_owned).collect();
    let records = reader
        .into_records()
        .collect::<csv::Result<Vec<csv::StringRecord>>>()?;

    let kinds: Vec<_> = columns
        .iter()
        .enumerate()
        .map(|(index, column)| {
            if ID_COLUMNS.contains(&column.as_str()) {
                ColumnKind::Text
            } else {
                infer_kind(records.iter().map(|record| &record[index]))
            }
        })
        .collect();

    let mut table = Table::new(name, columns);
    for record in records.iter() {
        table.push_row(
            record
                .iter()
                .zip(kinds.iter())
                .map(|(raw, kind)| kind.parse(raw))
                .collect(),
        );
    }
    Ok(table)
}

/// The type shared by every non-null value of a column.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum ColumnKind {
    Int,
    Float,
    Text,
}

impl ColumnKind {
    fn parse(self, raw: &str) -> Cell {
        if is_null(raw) {
            return Cell::Null;
        }
        match self {
            // Inference guarantees these parse
            ColumnKind::Int => raw.parse().map_or(Cell::Null, Cell::Int),
            ColumnKind::Float => raw.parse().map_or(Cell::Null, Cell::Float),
            ColumnKind::Text => Cell::Text(raw.to_owned()),
        }
    }
}

fn is_null(raw: &str) -> bool {
    NULL_MARKERS.contains(&raw)
}

fn infer_kind<'a>(values: impl Iterator<Item = &'a str>) -> ColumnKind {
    let mut kind = ColumnKind::Int;
    for raw in values.filter(|raw| !is_null(raw)) {
        if kind == ColumnKind::Int && raw.parse::<i64>().is_err() {
            kind = ColumnKind::Float;
        }
        if kind == ColumnKind::Float && !raw.parse::<f64>().map_or(false, f64::is_finite) {
            return ColumnKind::Text;
        }
    }
    kind
}
