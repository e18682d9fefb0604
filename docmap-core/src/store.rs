//! The mapped store: typed CRUD over an abstract document backend.
//!
//! [`MappedStore`] composes the layout registry with a [`DocumentBackend`]:
//! writes materialize a document through the type's layout, reads decode
//! every returned document through the layout's row mapper. Identities
//! travel as 24-character hex strings on the caller side and as the store's
//! native token on the wire.
//!
//! Configuration happens before construction and is immutable afterwards:
//! custom converter pairs are registered on the [`MappedStoreBuilder`],
//! which is consumed by [`build`](MappedStoreBuilder::build).
//!
//! # Example
//!
//! ```ignore
//! use docmap::store::MappedStore;
//!
//! let store = MappedStore::new(backend);
//!
//! let id = store.insert(&Profile { id: None, name: "bob".into(), age: Some(36) }).await?;
//! let found: Profile = store.find_by_id(&id).await?;
//! ```

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use bson::{Bson, Document};
use bson::oid::ObjectId;

use crate::backend::DocumentBackend;
use crate::convert::{ConverterPair, default_converters};
use crate::descriptor::RAW_ID;
use crate::error::{MappingError, MappingResult};
use crate::layout::TypeLayout;
use crate::mappable::Mappable;
use crate::registry::LayoutRegistry;

/// Builds an identity predicate (`{ "_id": <id> }`) from a hex identity.
pub fn with_id(id: &str) -> MappingResult<Document> {
    let parsed = ObjectId::parse_str(id).map_err(|err| MappingError::InvalidId {
        value: id.to_string(),
        detail: err.to_string(),
    })?;
    let mut predicate = Document::new();
    predicate.insert(RAW_ID, parsed);
    Ok(predicate)
}

fn field_predicate(field: &str, value: impl Into<Bson>) -> Document {
    let mut predicate = Document::new();
    predicate.insert(field, value.into());
    predicate
}

/// Configuration surface for a [`MappedStore`].
///
/// The builder starts with the default converter pairs (`uuid::Uuid` and
/// `chrono::DateTime<Utc>`) already registered; registering a pair for a
/// type that already has one replaces it.
pub struct MappedStoreBuilder {
    converters: HashMap<TypeId, ConverterPair>,
}

impl MappedStoreBuilder {
    pub fn new() -> Self {
        MappedStoreBuilder {
            converters: default_converters(),
        }
    }

    /// Registers a custom converter pair for fields of type `V`.
    pub fn converter<V: Any + Send + Sync>(
        mut self,
        name: &'static str,
        to: fn(&V) -> MappingResult<Bson>,
        from: fn(Bson) -> MappingResult<V>,
    ) -> Self {
        self.converters
            .insert(TypeId::of::<V>(), ConverterPair::custom(name, to, from));
        self
    }

    /// Consumes the builder, sealing the configuration.
    pub fn build<B: DocumentBackend>(self, backend: B) -> MappedStore<B> {
        MappedStore {
            backend,
            registry: LayoutRegistry::with_converters(self.converters),
        }
    }
}

impl Default for MappedStoreBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Typed CRUD facade over a document backend.
#[derive(Debug)]
pub struct MappedStore<B: DocumentBackend> {
    backend: B,
    registry: LayoutRegistry,
}

impl<B: DocumentBackend> MappedStore<B> {
    /// Creates a store with the default configuration.
    pub fn new(backend: B) -> Self {
        Self::builder().build(backend)
    }

    /// Creates a builder for registering converters before construction.
    pub fn builder() -> MappedStoreBuilder {
        MappedStoreBuilder::new()
    }

    /// The resolved layout for `T`, built and cached on first use.
    pub fn layout<T: Mappable>(&self) -> MappingResult<Arc<TypeLayout<T>>> {
        self.registry.layout::<T>()
    }

    /// Inserts `object` and returns the store-assigned identity as a
    /// 24-character hex string. The object's own identity field, if any, is
    /// not written; reread the record to observe the assigned identity.
    pub async fn insert<T: Mappable>(&self, object: &T) -> MappingResult<String> {
        let layout = self.layout::<T>()?;
        let document = layout.to_document(object)?;
        let id = self.backend.insert(layout.collection(), document).await?;
        Ok(id.to_hex())
    }

    /// Replaces the stored record carrying `object`'s identity.
    ///
    /// Fails with [`MappingError::NoIdentity`] for types without an identity
    /// field, [`MappingError::MissingIdentityValue`] when the identity is
    /// unset, and [`MappingError::NothingUpdated`] when no stored record
    /// matches the identity. Exactly one record is affected on success.
    pub async fn update<T: Mappable>(&self, object: &T) -> MappingResult<()> {
        let layout = self.layout::<T>()?;
        let identity = layout.identity_bson(object)?;

        let mut predicate = Document::new();
        predicate.insert(RAW_ID, identity);

        let document = layout.to_document(object)?;
        let affected = self
            .backend
            .update(layout.collection(), predicate, document)
            .await?;
        if affected == 0 {
            return Err(MappingError::NothingUpdated(
                layout.collection().to_string(),
            ));
        }
        Ok(())
    }

    /// Removes the record with the given identity. Returns the number of
    /// records removed; zero means the identity matched nothing.
    pub async fn remove_by_id<T: Mappable>(&self, id: &str) -> MappingResult<u64> {
        self.remove::<T>(with_id(id)?).await
    }

    /// Removes every record whose `field` equals `value`.
    pub async fn remove_field<T: Mappable>(
        &self,
        field: &str,
        value: impl Into<Bson>,
    ) -> MappingResult<u64> {
        self.remove::<T>(field_predicate(field, value)).await
    }

    /// Removes every record matching the predicate. Zero removed is a
    /// normal outcome, not an error.
    pub async fn remove<T: Mappable>(&self, predicate: Document) -> MappingResult<u64> {
        let layout = self.layout::<T>()?;
        Ok(self.backend.remove(layout.collection(), predicate).await?)
    }

    /// Returns the record with the given identity.
    ///
    /// Fails with [`MappingError::NotFound`] when the identity matches
    /// nothing.
    pub async fn find_by_id<T: Mappable>(&self, id: &str) -> MappingResult<T> {
        self.find_one(with_id(id)?).await
    }

    /// Returns every record matching the predicate, decoded through the
    /// type's row mapper. An empty predicate matches the whole collection.
    pub async fn find<T: Mappable>(&self, predicate: Document) -> MappingResult<Vec<T>> {
        self.run_query(predicate, None).await
    }

    /// Like [`find`](Self::find), ordered by the given sort document
    /// (`{ "field": 1 }` ascending, `{ "field": -1 }` descending).
    pub async fn find_sorted<T: Mappable>(
        &self,
        predicate: Document,
        order_by: Document,
    ) -> MappingResult<Vec<T>> {
        self.run_query(predicate, Some(order_by)).await
    }

    /// Returns every record whose `field` equals `value`.
    pub async fn find_field<T: Mappable>(
        &self,
        field: &str,
        value: impl Into<Bson>,
    ) -> MappingResult<Vec<T>> {
        self.find(field_predicate(field, value)).await
    }

    /// Returns the single record matching the predicate.
    ///
    /// Zero matches fail with [`MappingError::NotFound`], several with
    /// [`MappingError::Ambiguous`]; callers can match on either to recover.
    pub async fn find_one<T: Mappable>(&self, predicate: Document) -> MappingResult<T> {
        let layout = self.layout::<T>()?;
        let mut documents = self
            .backend
            .query(layout.collection(), predicate, None)
            .await?;
        match documents.len() {
            0 => Err(MappingError::NotFound(layout.collection().to_string())),
            1 => layout.row_mapper().map_row(&documents.remove(0), 0),
            matches => Err(MappingError::Ambiguous {
                collection: layout.collection().to_string(),
                matches,
            }),
        }
    }

    /// Returns the single record whose `field` equals `value`.
    pub async fn find_one_field<T: Mappable>(
        &self,
        field: &str,
        value: impl Into<Bson>,
    ) -> MappingResult<T> {
        self.find_one(field_predicate(field, value)).await
    }

    /// Shuts down the store, releasing backend resources.
    pub async fn shutdown(self) -> MappingResult<()> {
        Ok(self.backend.shutdown().await?)
    }

    async fn run_query<T: Mappable>(
        &self,
        predicate: Document,
        order_by: Option<Document>,
    ) -> MappingResult<Vec<T>> {
        let layout = self.layout::<T>()?;
        let documents = self
            .backend
            .query(layout.collection(), predicate, order_by)
            .await?;
        let mapper = layout.row_mapper();
        documents
            .iter()
            .enumerate()
            .map(|(row, document)| mapper.map_row(document, row))
            .collect()
    }
}
