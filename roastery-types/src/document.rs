//! The persisted store document.
//!
//! The whole mock backend persists as one JSON document: four record
//! collections plus bookkeeping stamps. Decoding is deliberately lenient —
//! a collection that is present but not an array, or a stamp that does not
//! parse, is treated as absent rather than as corruption. Only unparsable
//! JSON or a non-object top level is corruption, and that is the store
//! layer's concern, not this type's.

use crate::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Document format version written into fresh documents.
pub const STORE_VERSION: &str = "1.0.0";

/// The entire persisted state of the mock store.
///
/// Records inside the collections are raw JSON objects whose layout belongs
/// to the HTTP layer. Unknown top-level fields found in an existing file are
/// carried in `extra` and survive read/write cycles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// User records, insertion order = creation order.
    #[serde(default, deserialize_with = "lenient_records")]
    pub users: Vec<Value>,

    /// Product records (schema owned by the catalog routes).
    #[serde(default, deserialize_with = "lenient_records")]
    pub products: Vec<Value>,

    /// Order records.
    #[serde(default, deserialize_with = "lenient_records")]
    pub orders: Vec<Value>,

    /// Customer records.
    #[serde(default, deserialize_with = "lenient_records")]
    pub customers: Vec<Value>,

    /// Set once when the document is first created.
    #[serde(
        default,
        deserialize_with = "lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,

    /// Rewritten by the store on every successful write.
    #[serde(
        default,
        deserialize_with = "lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_updated: Option<DateTime<Utc>>,

    /// Document format version, defaulted to [`STORE_VERSION`] on write.
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub version: Option<String>,

    /// Unknown top-level fields, preserved verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Document {
    /// Creates a fresh empty document stamped with the current time.
    #[must_use]
    pub fn new() -> Self {
        Self {
            users: Vec::new(),
            products: Vec::new(),
            orders: Vec::new(),
            customers: Vec::new(),
            created_at: Some(Utc::now()),
            last_updated: None,
            version: Some(STORE_VERSION.to_string()),
            extra: Map::new(),
        }
    }

    /// Decodes a document from a parsed JSON value.
    ///
    /// Returns `None` for null or any non-object value. An object always
    /// decodes: present fields override the defaults, absent fields fall
    /// back to them (shallow top-level merge).
    #[must_use]
    pub fn from_value(value: Value) -> Option<Self> {
        if !value.is_object() {
            return None;
        }
        serde_json::from_value(value).ok()
    }

    /// Computes the next user id: one more than the largest existing
    /// numeric id, with 0 as the floor for an empty collection. Malformed
    /// ids count as 0, so the assignment stays monotonic over well-formed
    /// records. Saturates at `u64::MAX` — the file is caller-visible JSON,
    /// so an id at the ceiling must not panic the store.
    #[must_use]
    pub fn next_user_id(&self) -> UserId {
        let max = self
            .users
            .iter()
            .map(record_user_id)
            .max()
            .unwrap_or(0);
        UserId::new(max.saturating_add(1))
    }

    /// Finds the first user whose `email` field equals the argument exactly.
    #[must_use]
    pub fn find_user_by_email(&self, email: &str) -> Option<&Value> {
        self.users
            .iter()
            .find(|record| record_email(record) == Some(email))
    }

    /// Finds the position of the user with the given id, matching a JSON
    /// number or a numeric string.
    #[must_use]
    pub fn find_user_index(&self, id: UserId) -> Option<usize> {
        self.users
            .iter()
            .position(|record| record.get("id").is_some_and(|v| id.matches(v)))
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

/// Extracts a record's numeric id, treating a missing or malformed id as 0.
#[must_use]
pub fn record_user_id(record: &Value) -> u64 {
    match record.get("id") {
        Some(Value::Number(n)) => n.as_u64().unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

/// Extracts a record's `email` field if it is a string.
#[must_use]
pub fn record_email(record: &Value) -> Option<&str> {
    record.get("email").and_then(Value::as_str)
}

fn lenient_records<'de, D>(deserializer: D) -> Result<Vec<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Array(records) => Ok(records),
        _ => Ok(Vec::new()),
    }
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value
        .as_str()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc)))
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(Some(s)),
        _ => Ok(None),
    }
}
