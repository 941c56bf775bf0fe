//! Order model
//!
//! Orders are carried as opaque JSON objects. Only the identifier is
//! typed; every other field is kept verbatim and written back unchanged.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Exact length of an order identifier
pub const ORDER_UID_LEN: usize = 19;

/// Checks that `uid` is exactly 19 lowercase ASCII letters or digits.
pub fn is_valid_order_uid(uid: &str) -> bool {
    uid.len() == ORDER_UID_LEN
        && uid
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit())
}

/// An order record as delivered by the feed and stored in the database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Identifier the order is looked up by
    pub order_uid: String,
    /// Remaining fields of the record, untouched
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Order {
    /// Creates an order with no fields besides its identifier.
    pub fn new(order_uid: impl Into<String>) -> Self {
        Self {
            order_uid: order_uid.into(),
            fields: Map::new(),
        }
    }

    /// Adds a field, builder style.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Checks the invariants an order must satisfy before being stored.
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if !is_valid_order_uid(&self.order_uid) {
            return Some(format!(
                "order_uid must be {} lowercase alphanumeric characters",
                ORDER_UID_LEN
            ));
        }
        None
    }
}
