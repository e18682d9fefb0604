//! Storage backend abstraction consumed by the mapped store.
//!
//! The mapping core never talks to a database directly; it issues the five
//! collection-oriented operations below against a [`DocumentBackend`] and
//! works purely with opaque [`Document`] values. Predicates and sort orders
//! are passed through untouched: a predicate is a document of field/value
//! pairs the backend matches by equality (for example `{ "_id": <id> }`),
//! and a sort order maps field names to a positive (ascending) or negative
//! (descending) direction.
//!
//! Implementations must be thread-safe and may be driven from any async
//! runtime. Connection management, write concerns and retries belong to the
//! implementation; the core propagates a [`StoreError`] without retrying.

use async_trait::async_trait;
use bson::Document;
use bson::oid::ObjectId;
use std::fmt::Debug;

use crate::error::StoreResult;

/// Abstract interface for collection-oriented document storage.
#[async_trait]
pub trait DocumentBackend: Send + Sync + Debug {
    /// Inserts one document into a collection, creating the collection if
    /// needed, and returns the store-assigned identity.
    async fn insert(&self, collection: &str, document: Document) -> StoreResult<ObjectId>;

    /// Replaces the first document matching `predicate` with `document`,
    /// preserving the stored identity. Returns the number of records
    /// affected (zero or one).
    async fn update(
        &self,
        collection: &str,
        predicate: Document,
        document: Document,
    ) -> StoreResult<u64>;

    /// Removes every document matching `predicate` and returns the number
    /// of records removed. Zero is a valid outcome.
    async fn remove(&self, collection: &str, predicate: Document) -> StoreResult<u64>;

    /// Returns every document matching `predicate`, fully materialized, in
    /// the order given by `order_by` when present.
    async fn query(
        &self,
        collection: &str,
        predicate: Document,
        order_by: Option<Document>,
    ) -> StoreResult<Vec<Document>>;

    /// Releases backend resources. The default implementation is a no-op;
    /// backends holding connections should override it.
    async fn shutdown(self) -> StoreResult<()>
    where
        Self: Sized,
    {
        Ok(())
    }
}

/// Factory trait for constructing backend instances.
#[async_trait]
pub trait BackendBuilder {
    type Backend: DocumentBackend;

    async fn build(self) -> StoreResult<Self::Backend>;
}
