//! In-process document store.
//!
//! Backs the demo server and the test suites. Counts reads the way the hosted
//! store bills them, and can simulate latency and outages.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::{Map, Value};
use tracing::trace;
use uuid::Uuid;

use super::{Document, DocumentStore, Query, StoreError};

type Collection = BTreeMap<String, Map<String, Value>>;

#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    collections: RwLock<HashMap<String, Collection>>,
    reads: AtomicU64,
    writes: AtomicU64,
    latency: Option<Duration>,
    offline: AtomicBool,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an artificial delay before every call completes.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Number of `query` and `get` calls served so far.
    pub fn reads(&self) -> u64 {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }

    /// While offline every call fails with [`StoreError::Unavailable`].
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Inserts a document under a caller-chosen id, replacing any existing one.
    pub fn insert(&self, collection: &str, id: &str, body: Map<String, Value>) {
        self.collections
            .write()
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), body);
    }

    async fn round_trip(&self) -> Result<(), StoreError> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("document store is offline".to_string()));
        }
        Ok(())
    }

    fn record_read(&self) {
        self.reads.fetch_add(1, Ordering::SeqCst);
    }

    fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn query(&self, collection: &str, query: &Query) -> Result<Vec<Document>, StoreError> {
        self.record_read();
        self.round_trip().await?;

        let collections = self.collections.read();
        let Some(records) = collections.get(collection) else {
            return Ok(Vec::new());
        };
        let documents: Vec<Document> = records
            .iter()
            .map(|(id, body)| Document::new(id.clone(), body.clone()))
            .collect();
        let matched = query.apply(&documents);
        trace!(collection, matched = matched.len(), "Query served");
        Ok(matched)
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        self.record_read();
        self.round_trip().await?;

        Ok(self
            .collections
            .read()
            .get(collection)
            .and_then(|records| records.get(id))
            .map(|body| Document::new(id, body.clone())))
    }

    async fn create(
        &self,
        collection: &str,
        body: Map<String, Value>,
    ) -> Result<Document, StoreError> {
        self.record_write();
        self.round_trip().await?;

        let id = Uuid::new_v4().simple().to_string();
        self.insert(collection, &id, body.clone());
        Ok(Document::new(id, body))
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        patch: Map<String, Value>,
    ) -> Result<Document, StoreError> {
        self.record_write();
        self.round_trip().await?;

        let mut collections = self.collections.write();
        let body = collections
            .get_mut(collection)
            .and_then(|records| records.get_mut(id))
            .ok_or_else(|| StoreError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            })?;
        body.extend(patch);
        Ok(Document::new(id, body.clone()))
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<bool, StoreError> {
        self.record_write();
        self.round_trip().await?;

        Ok(self
            .collections
            .write()
            .get_mut(collection)
            .and_then(|records| records.remove(id))
            .is_some())
    }
}
