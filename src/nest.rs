//! Re-nest the aggregated purchase counts into one document per customer.

use std::collections::{BTreeMap, HashMap};

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use tracing::warn;

use crate::{AggregateRow, AggregateTable, Cell};

/// The purchase count of a single product, as listed in a [CustomerDocument].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ProductData {
    pub product_id: Cell,
    pub product_category: Cell,
    pub product_description: Cell,
    pub purchase_count: u64,
}

impl From<&AggregateRow> for ProductData {
    fn from(row: &AggregateRow) -> Self {
        Self {
            product_id: row.product_id.clone(),
            product_category: row.product_category.clone(),
            product_description: row.product_description.clone(),
            purchase_count: row.purchase_count,
        }
    }
}

/// Everything known about the purchases of one customer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CustomerDocument {
    pub loyalty_score: Cell,
    pub product_data: Vec<ProductData>,
}

/// [CustomerDocument] values keyed by customer id, in insertion order.
///
/// A customer is identified by the text of its id alone: inserting a second document for the same
/// customer replaces the first one in place.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CustomerDocuments {
    entries: Vec<(String, CustomerDocument)>,
    positions: HashMap<String, usize>,
}

impl CustomerDocuments {
    pub fn new() -> Self {
        Default::default()
    }

    /// Insert a document, returning the one it replaced, if any.
    pub fn insert(
        &mut self,
        customer_id: String,
        document: CustomerDocument,
    ) -> Option<CustomerDocument> {
        match self.positions.get(&customer_id) {
            Some(&position) => Some(std::mem::replace(&mut self.entries[position].1, document)),
            None => {
                self.positions.insert(customer_id.clone(), self.entries.len());
                self.entries.push((customer_id, document));
                None
            }
        }
    }

    pub fn get(&self, customer_id: &str) -> Option<&CustomerDocument> {
        self.positions
            .get(customer_id)
            .map(|&position| &self.entries[position].1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CustomerDocument)> + '_ {
        self.entries
            .iter()
            .map(|(customer_id, document)| (customer_id.as_str(), document))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serialize as pretty-printed JSON, indented by two spaces.
    pub fn write_json<W: std::io::Write>(&self, writer: W) -> serde_json::Result<()> {
        serde_json::to_writer_pretty(writer, self)
    }
}

impl Serialize for CustomerDocuments {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (customer_id, document) in self.entries.iter() {
            map.serialize_entry(customer_id, document)?;
        }
        map.end()
    }
}

fn document_key(customer_id: &Cell) -> String {
    match customer_id {
        Cell::Null => "null".to_owned(),
        id => id.to_string(),
    }
}

/// Group aggregates by customer and loyalty score, in ascending order. Products keep the order
/// they have in `aggregates`.
pub fn nest(aggregates: &AggregateTable) -> CustomerDocuments {
    let mut groups: BTreeMap<(&Cell, &Cell), Vec<ProductData>> = BTreeMap::new();
    for row in aggregates.rows() {
        groups
            .entry((&row.customer_id, &row.loyalty_score))
            .or_default()
            .push(row.into());
    }

    let mut documents = CustomerDocuments::new();
    for ((customer_id, loyalty_score), product_data) in groups {
        let key = document_key(customer_id);
        let document = CustomerDocument {
            loyalty_score: loyalty_score.clone(),
            product_data,
        };
        if let Some(previous) = documents.insert(key.clone(), document) {
            warn!(
                customer_id = %key,
                dropped_loyalty_score = %previous.loyalty_score,
                loyalty_score = %loyalty_score,
                "customer has several loyalty scores, keeping the last one"
            );
        }
    }
    documents
}
