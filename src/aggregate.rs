//! Count purchases per customer and product.

use std::collections::BTreeMap;

use crate::core::{
    CUSTOMER_ID, LOYALTY_SCORE, PRICE, PRODUCT_CATEGORY, PRODUCT_DESCRIPTION, PRODUCT_ID,
    PURCHASE_COUNT,
};
use crate::{Cell, Result, Table};

/// The columns a master table is grouped on, in sort order.
pub const GROUP_KEYS: [&str; 5] = [
    CUSTOMER_ID,
    LOYALTY_SCORE,
    PRODUCT_ID,
    PRODUCT_CATEGORY,
    PRODUCT_DESCRIPTION,
];

/// The number of purchases of a product by a customer.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct AggregateRow {
    pub customer_id: Cell,
    pub loyalty_score: Cell,
    pub product_id: Cell,
    pub product_category: Cell,
    pub product_description: Cell,
    pub purchase_count: u64,
}

/// All [AggregateRow] values of a run, ordered by their grouping keys.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AggregateTable {
    rows: Vec<AggregateRow>,
}

impl AggregateTable {
    /// Build a table from rows in any order.
    pub fn from_rows(mut rows: Vec<AggregateRow>) -> Self {
        rows.sort();
        Self { rows }
    }

    pub fn rows(&self) -> &[AggregateRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Serialize an [AggregateTable] to CSV, each row prefixed by its position.
    pub fn dump_csv<W: std::io::Write>(&self, writer: &mut csv::Writer<W>) -> csv::Result<()> {
        writer.write_record(
            std::iter::once("")
                .chain(GROUP_KEYS)
                .chain(std::iter::once(PURCHASE_COUNT)),
        )?;
        for (index, row) in self.rows.iter().enumerate() {
            writer.write_record(&[
                index.to_string(),
                row.customer_id.to_string(),
                row.loyalty_score.to_string(),
                row.product_id.to_string(),
                row.product_category.to_string(),
                row.product_description.to_string(),
                row.purchase_count.to_string(),
            ])?
        }
        Ok(())
    }
}

/// Group the master table on [GROUP_KEYS] and count the purchases of each group.
///
/// Only rows with a known `price` are counted, so a group can end up with a count of zero. When
/// the table has no `price` column at all, every row is counted.
pub fn aggregate(master: &Table) -> Result<AggregateTable> {
    let mut keys = [0; 5];
    for (index, column) in keys.iter_mut().zip(GROUP_KEYS) {
        *index = master.require_column(column)?;
    }
    let price = master.column_index(PRICE);

    let mut groups: BTreeMap<[Cell; 5], u64> = BTreeMap::new();
    for row in master.rows() {
        let count = groups
            .entry(keys.map(|index| row[index].clone()))
            .or_default();
        if price.map_or(true, |index| !row[index].is_null()) {
            *count += 1;
        }
    }

    let rows = groups
        .into_iter()
        .map(|(key, purchase_count)| {
            let [customer_id, loyalty_score, product_id, product_category, product_description] =
                key;
            AggregateRow {
                customer_id,
                loyalty_score,
                product_id,
                product_category,
                product_description,
                purchase_count,
            }
        })
        .collect();
    Ok(AggregateTable { rows })
}
