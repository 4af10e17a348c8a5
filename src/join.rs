//! Join the flattened transactions against the reference tables.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::core::{CUSTOMER_ID, DATE_OF_PURCHASE, PRODUCT_ID};
use crate::{Cell, Error, Result, Table};

/// Date-time layouts accepted for `date_of_purchase`, tried in order after RFC 3339.
const DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Date-only layouts accepted for `date_of_purchase`.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

/// Left join `right` onto `left` using the `on` column of both tables.
///
/// Every row of `left` is kept, in order: it is repeated once per matching row of `right`, or
/// padded with [Cell::Null] when nothing matches. The result holds every column of `left`, then
/// every column of `right` but `on`. Columns found on both sides are suffixed with `_x` (left)
/// and `_y` (right).
pub fn left_join(left: &Table, right: &Table, on: &str) -> Result<Table> {
    let left_key = left.require_column(on)?;
    let right_key = right.require_column(on)?;

    let right_columns: Vec<usize> = (0..right.columns().len())
        .filter(|&index| index != right_key)
        .collect();
    let overlaps = |name: &str| {
        name != on
            && left.columns().iter().any(|c| c == name)
            && right.columns().iter().any(|c| c == name)
    };

    let columns = left
        .columns()
        .iter()
        .map(|name| suffixed(name, overlaps(name.as_str()), "_x"))
        .chain(right_columns.iter().map(|&index| {
            let name = right.columns()[index].as_str();
            suffixed(name, overlaps(name), "_y")
        }))
        .collect();

    let mut index: HashMap<&Cell, Vec<usize>> = HashMap::new();
    for (position, key) in right.column(right_key).enumerate() {
        index.entry(key).or_default().push(position);
    }

    let mut joined = Table::new(left.name(), columns);
    for row in left.rows() {
        match index.get(&row[left_key]) {
            Some(matches) => {
                for &position in matches {
                    let other = &right.rows()[position];
                    joined.push_row(
                        row.iter()
                            .cloned()
                            .chain(right_columns.iter().map(|&i| other[i].clone()))
                            .collect(),
                    );
                }
            }
            None => joined.push_row(
                row.iter()
                    .cloned()
                    .chain(right_columns.iter().map(|_| Cell::Null))
                    .collect(),
            ),
        }
    }
    Ok(joined)
}

fn suffixed(name: &str, overlapping: bool, suffix: &str) -> String {
    if overlapping {
        format!("{}{}", name, suffix)
    } else {
        name.to_owned()
    }
}

/// Interpret a purchase date, dropping any time of day.
pub fn parse_purchase_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if let Ok(date_time) = DateTime::parse_from_rfc3339(value) {
        return Some(date_time.date_naive());
    }
    DATE_TIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|date_time| date_time.date())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
        })
}

/// Replace every `date_of_purchase` by a [Cell::Date]. Nulls are left untouched.
pub fn normalize_dates(table: &mut Table) -> Result<()> {
    let column = table.require_column(DATE_OF_PURCHASE)?;
    for row in table.rows_mut().iter_mut() {
        let date = match &row[column] {
            Cell::Null | Cell::Date(_) => continue,
            Cell::Text(text) => parse_purchase_date(text),
            _ => None,
        };
        match date {
            Some(date) => row[column] = Cell::Date(date),
            None => {
                return Err(Error::InvalidDate {
                    value: row[column].to_string(),
                })
            }
        }
    }
    Ok(())
}

/// Stable sort of the rows by `date_of_purchase`, nulls last.
pub fn sort_by_date(table: &mut Table) -> Result<()> {
    let column = table.require_column(DATE_OF_PURCHASE)?;
    table.rows_mut().sort_by(|a, b| a[column].cmp(&b[column]));
    Ok(())
}

/// Build the master table: transactions joined with their customer, then with their product,
/// with purchase dates reduced to calendar dates and rows ordered by date.
pub fn master_table(transactions: &Table, customers: &Table, products: &Table) -> Result<Table> {
    let with_customers = left_join(transactions, customers, CUSTOMER_ID)?;
    let mut master = left_join(&with_customers, products, PRODUCT_ID)?.with_name("master");
    normalize_dates(&mut master)?;
    sort_by_date(&mut master)?;
    Ok(master)
}
