//! Redis-backed document store.
//!
//! Redis key patterns:
//! - `doc:{collection}:{id}` - one HASH per document
//!
//! Values written by this store are `json:` followed by the JSON encoding of
//! the field, so numbers and booleans keep their type. Values written by other
//! producers carry no tag; they are read as JSON only when they are an object,
//! an array, or a quoted string, and as plain strings otherwise.

use super::{order_documents, Direction, Document, DocumentStore, StoreError};
use async_trait::async_trait;
use redis::AsyncCommands;
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};

/// Prefix marking a hash value as JSON written by this store.
const TYPED_VALUE_TAG: &str = "json:";

/// COUNT hint per SCAN call; also the HGETALL pipeline size.
const SCAN_BATCH: usize = 500;

#[derive(Debug, Clone)]
pub struct RedisStore {
    client: redis::Client,
}

impl RedisStore {
    pub fn new(client: redis::Client) -> Self {
        Self { client }
    }

    /// Open a client for `url` and confirm the server answers.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let client = redis::Client::open(url)?;
        let mut con = client.get_multiplexed_async_connection().await?;
        let reply: String = redis::cmd("PING").query_async(&mut con).await?;
        if reply != "PONG" {
            return Err(StoreError::Backend(format!(
                "Unexpected PING reply: {}",
                reply
            )));
        }
        Ok(Self::new(client))
    }

    async fn connection(&self) -> Result<redis::aio::MultiplexedConnection, StoreError> {
        Ok(self.client.get_multiplexed_async_connection().await?)
    }

    /// Walk every document of a collection, one SCAN page at a time.
    ///
    /// Keys SCAN reports twice are only visited once.
    async fn scan_collection<F>(&self, collection: &str, mut visit: F) -> Result<(), StoreError>
    where
        F: FnMut(Vec<Document>) + Send,
    {
        let mut con = self.connection().await?;
        let prefix = format!("doc:{}:", collection);
        let pattern = format!("{}*", prefix);

        let mut seen = HashSet::new();
        let mut cursor: u64 = 0;
        loop {
            let (next_cursor, mut keys) = scan_page(&mut con, &pattern, cursor).await?;
            keys.retain(|key| seen.insert(key.clone()));
            if !keys.is_empty() {
                visit(fetch_documents(&mut con, &prefix, keys).await?);
            }
            cursor = next_cursor;
            if cursor == 0 {
                break;
            }
        }
        Ok(())
    }
}

fn document_key(collection: &str, id: &str) -> String {
    format!("doc:{}:{}", collection, id)
}

fn encode_value(value: &Value) -> Result<String, StoreError> {
    Ok(format!("{}{}", TYPED_VALUE_TAG, serde_json::to_string(value)?))
}

fn decode_value(encoded: String) -> Value {
    if let Some(json) = encoded.strip_prefix(TYPED_VALUE_TAG) {
        if let Ok(value) = serde_json::from_str(json) {
            return value;
        }
    } else if encoded.starts_with(['{', '[', '"']) {
        if let Ok(value) = serde_json::from_str(&encoded) {
            return value;
        }
    }
    Value::String(encoded)
}

fn decode_fields(raw: HashMap<String, String>) -> Map<String, Value> {
    raw.into_iter()
        .map(|(name, encoded)| (name, decode_value(encoded)))
        .collect()
}

/// One SCAN step (non-blocking) over keys matching `pattern`.
async fn scan_page<C>(
    con: &mut C,
    pattern: &str,
    cursor: u64,
) -> Result<(u64, Vec<String>), redis::RedisError>
where
    C: AsyncCommands,
{
    redis::cmd("SCAN")
        .arg(cursor)
        .arg("MATCH")
        .arg(pattern)
        .arg("COUNT")
        .arg(SCAN_BATCH)
        .query_async(con)
        .await
}

/// Load the hashes behind `keys` in pipelined batches.
async fn fetch_documents<C>(
    con: &mut C,
    prefix: &str,
    keys: Vec<String>,
) -> Result<Vec<Document>, StoreError>
where
    C: AsyncCommands,
{
    let mut documents = Vec::with_capacity(keys.len());
    for chunk in keys.chunks(SCAN_BATCH) {
        let mut pipe = redis::pipe();
        for key in chunk {
            pipe.hgetall(key);
        }
        let hashes: Vec<HashMap<String, String>> = pipe.query_async(con).await?;

        for (key, raw) in chunk.iter().zip(hashes) {
            let Some(id) = key.strip_prefix(prefix) else {
                continue;
            };
            // Key may have expired or been deleted between SCAN and HGETALL
            if raw.is_empty() {
                continue;
            }
            documents.push(Document::new(id, decode_fields(raw)));
        }
    }
    Ok(documents)
}

/// Fold a batch into the running first `limit` documents by `field`.
fn keep_top(
    top: &mut Vec<Document>,
    batch: Vec<Document>,
    field: &str,
    direction: Direction,
    limit: usize,
) {
    top.extend(batch);
    *top = order_documents(std::mem::take(top), field, direction, limit);
}

#[async_trait]
impl DocumentStore for RedisStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let mut con = self.connection().await?;
        let raw: HashMap<String, String> = con.hgetall(document_key(collection, id)).await?;

        if raw.is_empty() {
            return Ok(None);
        }
        Ok(Some(Document::new(id, decode_fields(raw))))
    }

    async fn merge(
        &self,
        collection: &str,
        id: &str,
        fields: Map<String, Value>,
    ) -> Result<(), StoreError> {
        let key = document_key(collection, id);

        let mut sets: Vec<(String, String)> = Vec::new();
        let mut deletes: Vec<String> = Vec::new();
        for (name, value) in fields {
            if value.is_null() {
                deletes.push(name);
            } else {
                let encoded = encode_value(&value)?;
                sets.push((name, encoded));
            }
        }

        if sets.is_empty() && deletes.is_empty() {
            return Ok(());
        }

        // HSET + HDEL in one MULTI so readers never see a half-applied merge
        let mut pipe = redis::pipe();
        pipe.atomic();
        if !sets.is_empty() {
            pipe.hset_multiple(&key, &sets[..]).ignore();
        }
        if !deletes.is_empty() {
            pipe.hdel(&key, &deletes).ignore();
        }

        let mut con = self.connection().await?;
        let (): () = pipe.query_async(&mut con).await?;
        Ok(())
    }

    async fn list(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        let mut documents = Vec::new();
        self.scan_collection(collection, |batch| documents.extend(batch))
            .await?;
        Ok(documents)
    }

    async fn query_ordered(
        &self,
        collection: &str,
        field: &str,
        direction: Direction,
        limit: usize,
    ) -> Result<Vec<Document>, StoreError> {
        let mut top = Vec::new();
        self.scan_collection(collection, |batch| {
            keep_top(&mut top, batch, field, direction, limit)
        })
        .await?;
        Ok(top)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::credentials::{resolve_admin_credential, verify_credentials};
    use crate::config::Config;
    use crate::storage::admin::{ADMIN_COLLECTION, ADMIN_DOCUMENT};
    use crate::storage::MemoryStore;
    use serde_json::json;

    fn raw(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_document_key() {
        assert_eq!(document_key("admin", "creds"), "doc:admin:creds");
    }

    #[test]
    fn test_tagged_values_keep_their_type() {
        for value in [json!(7), json!(true), json!("7"), json!({"_seconds": 1})] {
            let encoded = encode_value(&value).unwrap();
            assert!(encoded.starts_with(TYPED_VALUE_TAG));
            assert_eq!(decode_value(encoded), value);
        }
    }

    #[test]
    fn test_untagged_scalars_stay_strings() {
        let fields = decode_fields(raw(&[
            ("name", "\"Mona\""),
            ("phone", "5551234"),
            ("active", "true"),
            ("note", "not json"),
            ("broken", "json:{oops"),
            ("joined", r#"{"_seconds": 1714550400, "_nanoseconds": 0}"#),
        ]));

        assert_eq!(fields["name"], json!("Mona"));
        assert_eq!(fields["phone"], json!("5551234"));
        assert_eq!(fields["active"], json!("true"));
        assert_eq!(fields["note"], json!("not json"));
        assert_eq!(fields["broken"], json!("json:{oops"));
        assert_eq!(fields["joined"]["_seconds"], json!(1714550400));
    }

    #[tokio::test]
    async fn test_numeric_looking_admin_password_is_honoured() {
        let config = Config {
            jwt_secret: "test-secret".to_string(),
            token_ttl_secs: 7_200,
            admin_username: "admin".to_string(),
            admin_password: "123456".to_string(),
            redis_url: "redis://127.0.0.1:6379".to_string(),
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            cors_allowed_origins: Vec::new(),
            max_body_bytes: 16_384,
            attendance_page_size: 2_000,
        };

        // As left by `HSET doc:admin:creds username head password 999999`
        let fields = decode_fields(raw(&[("username", "head"), ("password", "999999")]));
        let store = MemoryStore::new();
        store.insert(ADMIN_COLLECTION, ADMIN_DOCUMENT, fields).await;

        let cred = resolve_admin_credential(&store, &config).await;
        assert!(verify_credentials(&cred, "head", "999999").unwrap());
        assert!(!verify_credentials(&cred, "head", "123456").unwrap());
    }

    #[test]
    fn test_keep_top_across_batches_matches_full_ordering() {
        let docs: Vec<Document> = (0..1_000)
            .map(|i| {
                // Interleave so the newest entries land in early and late batches
                let ts = (i * 7_919) % 1_000;
                let fields = json!({"timestamp": ts}).as_object().unwrap().clone();
                Document::new(format!("log-{}", i), fields)
            })
            .collect();

        let expected: Vec<String> =
            order_documents(docs.clone(), "timestamp", Direction::Descending, 25)
                .into_iter()
                .map(|d| d.id)
                .collect();

        let mut top = Vec::new();
        for batch in docs.chunks(97) {
            keep_top(
                &mut top,
                batch.to_vec(),
                "timestamp",
                Direction::Descending,
                25,
            );
            assert!(top.len() <= 25);
        }
        let ids: Vec<String> = top.into_iter().map(|d| d.id).collect();
        assert_eq!(ids, expected);
    }

    async fn test_store() -> Option<RedisStore> {
        // Note: these tests require a running Redis instance
        // Skip if Redis is not reachable
        let redis_url =
            std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());
        match RedisStore::connect(&redis_url).await {
            Ok(s) => Some(s),
            Err(_) => {
                eprintln!("Skipping test: Redis not available");
                None
            }
        }
    }

    #[tokio::test]
    async fn test_redis_store_merge_and_query() {
        let Some(store) = test_store().await else {
            return;
        };

        let collection = "test_gateway_unit";
        let mut con = store.connection().await.unwrap();
        for id in ["one", "two", "three"] {
            let _: Result<(), _> = con.del(document_key(collection, id)).await;
        }

        let first = json!({"username": "a", "password": "b"});
        store
            .merge(collection, "one", first.as_object().unwrap().clone())
            .await
            .unwrap();
        let update = json!({"username": "c", "password": null, "timestamp": 10});
        store
            .merge(collection, "one", update.as_object().unwrap().clone())
            .await
            .unwrap();

        let doc = store.get(collection, "one").await.unwrap().unwrap();
        assert_eq!(doc.str_field("username"), Some("c"));
        assert_eq!(doc.fields["timestamp"], json!(10));
        assert!(!doc.fields.contains_key("password"));

        let later = json!({"timestamp": 20});
        store
            .merge(collection, "two", later.as_object().unwrap().clone())
            .await
            .unwrap();
        let untimed = json!({"name": "x"});
        store
            .merge(collection, "three", untimed.as_object().unwrap().clone())
            .await
            .unwrap();

        let ordered = store
            .query_ordered(collection, "timestamp", Direction::Descending, 10)
            .await
            .unwrap();
        let ids: Vec<_> = ordered.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["two", "one"]);

        for id in ["one", "two", "three"] {
            let _: Result<(), _> = con.del(document_key(collection, id)).await;
        }
    }

    #[tokio::test]
    async fn test_redis_large_collection_lists_and_orders_everything() {
        let Some(store) = test_store().await else {
            return;
        };

        let collection = "test_gateway_scan";
        const TOTAL: u64 = 12_000;
        let mut con = store.connection().await.unwrap();

        let keys: Vec<String> = (0..TOTAL)
            .map(|i| document_key(collection, &format!("log-{:05}", i)))
            .collect();
        for (chunk_index, chunk) in keys.chunks(1_000).enumerate() {
            let mut pipe = redis::pipe();
            for (offset, key) in chunk.iter().enumerate() {
                let ts = (chunk_index * 1_000 + offset) as u64;
                pipe.hset(key, "timestamp", encode_value(&json!(ts)).unwrap())
                    .ignore();
            }
            let (): () = pipe.query_async(&mut con).await.unwrap();
        }

        let listed = store.list(collection).await.unwrap();
        assert_eq!(listed.len() as u64, TOTAL);

        let newest = store
            .query_ordered(collection, "timestamp", Direction::Descending, 3)
            .await
            .unwrap();
        let ids: Vec<_> = newest.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["log-11999", "log-11998", "log-11997"]);

        for chunk in keys.chunks(1_000) {
            let _: Result<(), _> = con.del(chunk).await;
        }
    }
}
