//! Document storage layer for admin credentials, students, and attendance logs.
//!
//! The gateway only needs four primitives from a document store: point reads,
//! field-level merges, full collection listing, and a bounded ordered query.
//! Backends implement [`DocumentStore`]; handlers hold an `Arc<dyn DocumentStore>`.

pub mod admin;
pub mod memory;
pub mod redis;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::cmp::Ordering;

pub use memory::MemoryStore;
pub use self::redis::RedisStore;

/// Errors raised by a storage backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Redis error: {0}")]
    Redis(#[from] ::redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Backend error: {0}")]
    Backend(String),
}

/// A stored document: its identifier plus an arbitrary field set.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Map<String, Value>,
}

impl Document {
    pub fn new(id: impl Into<String>, fields: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    /// String value of a field, if present and a string.
    pub fn str_field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(Value::as_str)
    }

    /// Flatten into a single JSON object with the document id merged in.
    ///
    /// A field literally named `id` wins over the document identifier.
    pub fn into_json(self) -> Value {
        let mut object = self.fields;
        object.entry("id").or_insert(Value::String(self.id));
        Value::Object(object)
    }
}

/// Sort direction for [`DocumentStore::query_ordered`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// Minimal document-store interface the gateway depends on.
#[async_trait]
pub trait DocumentStore: Send + Sync + 'static {
    /// Fetch a single document. `None` if it does not exist.
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError>;

    /// Upsert fields into a document, leaving unnamed fields untouched.
    ///
    /// A `null` value removes that field.
    async fn merge(
        &self,
        collection: &str,
        id: &str,
        fields: Map<String, Value>,
    ) -> Result<(), StoreError>;

    /// Every document in a collection, in no particular order.
    async fn list(&self, collection: &str) -> Result<Vec<Document>, StoreError>;

    /// Documents ordered by `field`, at most `limit` of them.
    ///
    /// Documents lacking the field are not returned.
    async fn query_ordered(
        &self,
        collection: &str,
        field: &str,
        direction: Direction,
        limit: usize,
    ) -> Result<Vec<Document>, StoreError>;
}

/// Comparable projection of a field value.
///
/// Variant order is the cross-type order: numbers, then timestamps, then strings.
#[derive(Debug, Clone, PartialEq)]
enum SortKey {
    Number(f64),
    Timestamp(DateTime<Utc>),
    Text(String),
}

impl SortKey {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_f64().map(SortKey::Number),
            Value::String(s) => Some(
                DateTime::parse_from_rfc3339(s)
                    .map(|dt| SortKey::Timestamp(dt.with_timezone(&Utc)))
                    .unwrap_or_else(|_| SortKey::Text(s.clone())),
            ),
            Value::Object(map) => {
                let seconds = map
                    .get("_seconds")
                    .or_else(|| map.get("seconds"))
                    .and_then(Value::as_i64)?;
                let nanos = map
                    .get("_nanoseconds")
                    .or_else(|| map.get("nanos"))
                    .and_then(Value::as_u64)
                    .unwrap_or(0);
                DateTime::from_timestamp(seconds, nanos as u32).map(SortKey::Timestamp)
            }
            _ => None,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            SortKey::Number(_) => 0,
            SortKey::Timestamp(_) => 1,
            SortKey::Text(_) => 2,
        }
    }

    fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (SortKey::Number(a), SortKey::Number(b)) => a.total_cmp(b),
            (SortKey::Timestamp(a), SortKey::Timestamp(b)) => a.cmp(b),
            (SortKey::Text(a), SortKey::Text(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

/// Order, filter, and truncate documents by a field.
///
/// Shared by backends that cannot sort server-side. Ties fall back to the
/// document id in the same direction.
pub fn order_documents(
    documents: Vec<Document>,
    field: &str,
    direction: Direction,
    limit: usize,
) -> Vec<Document> {
    let mut keyed: Vec<(SortKey, Document)> = documents
        .into_iter()
        .filter_map(|doc| {
            let key = doc.fields.get(field).and_then(SortKey::from_value)?;
            Some((key, doc))
        })
        .collect();

    keyed.sort_by(|(ka, da), (kb, db)| {
        let ordering = ka.compare(kb).then_with(|| da.id.cmp(&db.id));
        match direction {
            Direction::Ascending => ordering,
            Direction::Descending => ordering.reverse(),
        }
    });

    keyed.into_iter().take(limit).map(|(_, doc)| doc).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(id: &str, value: Value) -> Document {
        match value {
            Value::Object(map) => Document::new(id, map),
            _ => panic!("test documents must be objects"),
        }
    }

    fn ids(docs: &[Document]) -> Vec<&str> {
        docs.iter().map(|d| d.id.as_str()).collect()
    }

    #[test]
    fn test_into_json_merges_id() {
        let value = doc("s1", json!({"name": "Mona"})).into_json();
        assert_eq!(value, json!({"id": "s1", "name": "Mona"}));
    }

    #[test]
    fn test_into_json_field_id_wins() {
        let value = doc("s1", json!({"id": "custom"})).into_json();
        assert_eq!(value["id"], "custom");
    }

    #[test]
    fn test_order_numbers_descending() {
        let docs = vec![
            doc("a", json!({"timestamp": 10})),
            doc("b", json!({"timestamp": 30})),
            doc("c", json!({"timestamp": 20})),
        ];
        let ordered = order_documents(docs, "timestamp", Direction::Descending, 10);
        assert_eq!(ids(&ordered), vec!["b", "c", "a"]);
    }

    #[test]
    fn test_order_rfc3339_respects_offsets() {
        // 10:00+03:00 is 07:00Z, earlier than 08:00Z
        let docs = vec![
            doc("early", json!({"timestamp": "2024-05-01T10:00:00+03:00"})),
            doc("late", json!({"timestamp": "2024-05-01T08:00:00Z"})),
        ];
        let ordered = order_documents(docs, "timestamp", Direction::Descending, 10);
        assert_eq!(ids(&ordered), vec!["late", "early"]);
    }

    #[test]
    fn test_order_exported_timestamp_objects() {
        let docs = vec![
            doc("x", json!({"timestamp": {"_seconds": 100, "_nanoseconds": 0}})),
            doc("y", json!({"timestamp": {"_seconds": 100, "_nanoseconds": 500}})),
            doc("z", json!({"timestamp": {"seconds": 50}})),
        ];
        let ordered = order_documents(docs, "timestamp", Direction::Descending, 10);
        assert_eq!(ids(&ordered), vec!["y", "x", "z"]);
    }

    #[test]
    fn test_order_excludes_missing_and_null() {
        let docs = vec![
            doc("a", json!({"timestamp": 1})),
            doc("b", json!({"other": 2})),
            doc("c", json!({"timestamp": null})),
        ];
        let ordered = order_documents(docs, "timestamp", Direction::Ascending, 10);
        assert_eq!(ids(&ordered), vec!["a"]);
    }

    #[test]
    fn test_order_cross_type_and_limit() {
        let docs = vec![
            doc("num", json!({"timestamp": 5})),
            doc("ts", json!({"timestamp": "2024-01-01T00:00:00Z"})),
            doc("text", json!({"timestamp": "yesterday"})),
        ];
        let ordered = order_documents(docs.clone(), "timestamp", Direction::Ascending, 10);
        assert_eq!(ids(&ordered), vec!["num", "ts", "text"]);

        let limited = order_documents(docs, "timestamp", Direction::Descending, 2);
        assert_eq!(ids(&limited), vec!["text", "ts"]);
    }

    #[test]
    fn test_order_ties_break_on_id() {
        let docs = vec![
            doc("a", json!({"timestamp": 1})),
            doc("c", json!({"timestamp": 1})),
            doc("b", json!({"timestamp": 1})),
        ];
        let ordered = order_documents(docs, "timestamp", Direction::Descending, 10);
        assert_eq!(ids(&ordered), vec!["c", "b", "a"]);
    }
}
