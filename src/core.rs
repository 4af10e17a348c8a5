//! Core types used in the reshaping of purchase records.

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

use chrono::NaiveDate;
use serde::{Serialize, Serializer};

use crate::{Error, Result};

pub const CUSTOMER_ID: &str = "customer_id";
pub const DATE_OF_PURCHASE: &str = "date_of_purchase";
pub const LOYALTY_SCORE: &str = "loyalty_score";
pub const PRODUCT_ID: &str = "product_id";
pub const PRODUCT_CATEGORY: &str = "product_category";
pub const PRODUCT_DESCRIPTION: &str = "product_description";
pub const PRICE: &str = "price";
pub const PURCHASE_COUNT: &str = "purchase_count";

/// A single dynamically typed value of a [Table]. Floats are always finite, missing values are
/// represented by [Cell::Null].
#[derive(Clone, Debug, Default)]
pub enum Cell {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Date(NaiveDate),
}

impl Cell {
    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }

    /// Convert a scalar JSON value. Composite values are kept as their compact JSON rendering.
    pub fn from_json(value: &serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => Cell::Null,
            Value::Bool(b) => Cell::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Cell::Int(i),
                None => n.as_f64().map_or(Cell::Null, Cell::Float),
            },
            Value::String(s) => Cell::Text(s.clone()),
            Value::Array(_) | Value::Object(_) => Cell::Text(value.to_string()),
        }
    }

    /// The text form of a non-null value, as used for identifiers.
    pub fn into_text(self) -> Self {
        match self {
            Cell::Null | Cell::Text(_) => self,
            other => Cell::Text(other.to_string()),
        }
    }

    // Ordering rank across variants, nulls sort last.
    fn rank(&self) -> u8 {
        match self {
            Cell::Bool(_) => 0,
            Cell::Int(_) => 1,
            Cell::Float(_) => 2,
            Cell::Text(_) => 3,
            Cell::Date(_) => 4,
            Cell::Null => 5,
        }
    }
}

impl PartialEq for Cell {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Cell {}

impl PartialOrd for Cell {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Cell {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Cell::Bool(a), Cell::Bool(b)) => a.cmp(b),
            (Cell::Int(a), Cell::Int(b)) => a.cmp(b),
            (Cell::Float(a), Cell::Float(b)) => a.total_cmp(b),
            (Cell::Text(a), Cell::Text(b)) => a.cmp(b),
            (Cell::Date(a), Cell::Date(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl Hash for Cell {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rank().hash(state);
        match self {
            Cell::Null => {}
            Cell::Bool(b) => b.hash(state),
            Cell::Int(i) => i.hash(state),
            Cell::Float(f) => f.to_bits().hash(state),
            Cell::Text(s) => s.hash(state),
            Cell::Date(d) => d.hash(state),
        }
    }
}

impl std::fmt::Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Cell::Null => Ok(()),
            Cell::Bool(b) => write!(f, "{}", b),
            Cell::Int(i) => write!(f, "{}", i),
            // Debug keeps the fractional part of whole numbers, e.g: `2.0`
            Cell::Float(x) => write!(f, "{:?}", x),
            Cell::Text(s) => f.write_str(s),
            Cell::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
        }
    }
}

impl Serialize for Cell {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Cell::Null => serializer.serialize_none(),
            Cell::Bool(b) => serializer.serialize_bool(*b),
            Cell::Int(i) => serializer.serialize_i64(*i),
            Cell::Float(x) => serializer.serialize_f64(*x),
            Cell::Text(s) => serializer.serialize_str(s),
            Cell::Date(_) => serializer.collect_str(self),
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_owned())
    }
}

/// An in-memory table: named columns, and rows holding one [Cell] per column.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Table {
    name: String,
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new(name: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            name: name.into(),
            columns,
            rows: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// The name used to refer to this table in error messages.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    /// Same as [Table::column_index], but a missing column is an error.
    pub fn require_column(&self, column: &str) -> Result<usize> {
        self.column_index(column).ok_or_else(|| Error::MissingColumn {
            table: self.name.clone(),
            column: column.to_owned(),
        })
    }

    /// Iterate over the values of a single column.
    pub fn column(&self, index: usize) -> impl Iterator<Item = &Cell> + '_ {
        self.rows.iter().map(move |row| &row[index])
    }

    /// Append a row, which must have exactly one cell per column.
    pub fn push_row(&mut self, row: Vec<Cell>) {
        debug_assert_eq!(row.len(), self.columns.len());
        self.rows.push(row);
    }

    /// Append a row given as `(column, value)` pairs. Columns never seen before are added at the
    /// end, and existing rows are padded with [Cell::Null]. Columns absent from the record are
    /// [Cell::Null] as well.
    pub fn push_record<I>(&mut self, record: I)
    where
        I: IntoIterator<Item = (String, Cell)>,
    {
        let mut row = vec![Cell::Null; self.columns.len()];
        for (column, value) in record {
            match self.column_index(&column) {
                Some(index) => row[index] = value,
                None => {
                    self.columns.push(column);
                    for existing in self.rows.iter_mut() {
                        existing.push(Cell::Null);
                    }
                    row.push(value);
                }
            }
        }
        self.rows.push(row);
    }

    pub(crate) fn rows_mut(&mut self) -> &mut Vec<Vec<Cell>> {
        &mut self.rows
    }
}
