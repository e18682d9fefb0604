//! In-memory storage implementation for mapped document stores.
//!
//! This module provides a simple but complete in-memory backend that keeps
//! documents in per-collection vectors behind an async-safe read-write lock.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use bson::oid::ObjectId;
use bson::{Bson, Document};
use mea::rwlock::RwLock;

use docmap_core::backend::{BackendBuilder, DocumentBackend};
use docmap_core::error::{StoreError, StoreResult};

use crate::filter::{matches, sort_documents};

type CollectionRecords = Vec<Document>;
type StoreMap = HashMap<String, CollectionRecords>;

/// Thread-safe in-memory document storage backend.
///
/// `MemoryBackend` is cloneable and uses an `Arc`-wrapped internal state,
/// allowing it to be safely shared across async tasks. Multiple clones of
/// the same instance share the same underlying data.
///
/// Queries scan every document in a collection (no indexing), which is fine
/// for the development and test workloads this backend is meant for.
///
/// # Example
///
/// ```ignore
/// use docmap_memory::MemoryBackend;
/// use docmap::backend::DocumentBackend;
/// use docmap::bson::doc;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let backend = MemoryBackend::new();
///
///     let id = backend.insert("users", doc! { "name": "ann" }).await?;
///     let found = backend.query("users", doc! { "name": "ann" }, None).await?;
///     assert_eq!(found.len(), 1);
///
///     Ok(())
/// }
/// ```
#[derive(Default, Clone, Debug)]
pub struct MemoryBackend {
    /// The main storage map: collection name -> stored documents.
    collections: Arc<RwLock<StoreMap>>,
}

impl MemoryBackend {
    /// Creates a new empty in-memory backend with no collections.
    pub fn new() -> Self {
        Self {
            collections: Arc::new(RwLock::new(StoreMap::new())),
        }
    }

    /// Creates a builder for constructing a `MemoryBackend`.
    pub fn builder() -> MemoryBackendBuilder {
        MemoryBackendBuilder
    }
}

#[async_trait]
impl DocumentBackend for MemoryBackend {
    async fn insert(&self, collection: &str, mut document: Document) -> StoreResult<ObjectId> {
        // An incoming document normally carries no identity; one is assigned
        // here. A caller-supplied identity is honored but must be unique.
        let id = match document.get("_id") {
            None => ObjectId::new(),
            Some(Bson::ObjectId(id)) => *id,
            Some(other) => {
                return Err(StoreError::Backend(format!(
                    "unsupported _id value in insert: {other}"
                )));
            }
        };
        document.insert("_id", id);

        let mut collections = self.collections.write().await;
        let records = collections.entry(collection.to_string()).or_default();

        if records
            .iter()
            .any(|record| record.get("_id") == Some(&Bson::ObjectId(id)))
        {
            return Err(StoreError::DuplicateKey {
                collection: collection.to_string(),
                detail: id.to_hex(),
            });
        }

        records.push(document);
        Ok(id)
    }

    async fn update(
        &self,
        collection: &str,
        predicate: Document,
        document: Document,
    ) -> StoreResult<u64> {
        let mut collections = self.collections.write().await;
        let Some(records) = collections.get_mut(collection) else {
            return Ok(0);
        };
        let Some(record) = records.iter_mut().find(|record| matches(record, &predicate)) else {
            return Ok(0);
        };

        // Replace wholesale, keeping the stored identity.
        let mut replacement = Document::new();
        if let Some(id) = record.get("_id") {
            replacement.insert("_id", id.clone());
        }
        for (key, value) in document {
            replacement.insert(key, value);
        }
        *record = replacement;
        Ok(1)
    }

    async fn remove(&self, collection: &str, predicate: Document) -> StoreResult<u64> {
        let mut collections = self.collections.write().await;
        let Some(records) = collections.get_mut(collection) else {
            return Ok(0);
        };

        let before = records.len();
        records.retain(|record| !matches(record, &predicate));
        Ok((before - records.len()) as u64)
    }

    async fn query(
        &self,
        collection: &str,
        predicate: Document,
        order_by: Option<Document>,
    ) -> StoreResult<Vec<Document>> {
        let collections = self.collections.read().await;
        let Some(records) = collections.get(collection) else {
            return Ok(Vec::new());
        };

        let mut results: Vec<Document> = records
            .iter()
            .filter(|record| matches(record, &predicate))
            .cloned()
            .collect();

        if let Some(order_by) = order_by {
            sort_documents(&mut results, &order_by);
        }

        Ok(results)
    }
}

/// Builder for constructing [`MemoryBackend`] instances.
///
/// Currently a no-op builder; it exists so that backend construction is
/// uniform across backend implementations.
#[derive(Default)]
pub struct MemoryBackendBuilder;

#[async_trait]
impl BackendBuilder for MemoryBackendBuilder {
    type Backend = MemoryBackend;

    /// Builds and returns a new [`MemoryBackend`] instance.
    ///
    /// This always succeeds and returns a freshly initialized backend.
    async fn build(self) -> StoreResult<Self::Backend> {
        Ok(MemoryBackend::new())
    }
}
