//! Main docmap crate providing typed object/document mapping.
//!
//! This crate is the primary entry point for users of the docmap framework.
//! It re-exports the core types and functionality from various sub-crates
//! and provides convenient access to storage backends.
//!
//! # Features
//!
//! - **Declared field layouts** - Describe each type's mapped shape once,
//!   by hand or with `#[derive(Mappable)]`, and the layout is built and
//!   cached on first use
//! - **Nested mapping** - Embedded mappable values, lists of them, and
//!   flattened parent types all round-trip through plain documents
//! - **Identity handling** - A conventional `id` field travels as a
//!   24-character hex string and is stored as the backend's native token
//! - **Pluggable backends** - An abstract async store contract with an
//!   in-memory implementation for development and tests
//!
//! # Quick Start
//!
//! ```ignore
//! use docmap::prelude::*;
//! use docmap::memory::MemoryBackend;
//!
//! #[derive(Debug, Clone, PartialEq, Default, Mappable)]
//! pub struct Profile {
//!     pub id: Option<String>,
//!     pub name: String,
//!     pub age: Option<i32>,
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = MappedStore::new(MemoryBackend::new());
//!
//!     // Insert a profile; the identity is assigned by the store.
//!     let id = store
//!         .insert(&Profile { id: None, name: "bob".into(), age: Some(36) })
//!         .await
//!         .unwrap();
//!
//!     // Read it back by identity.
//!     let profile: Profile = store.find_by_id(&id).await.unwrap();
//!     assert_eq!(profile.name, "bob");
//!
//!     // Replace the stored record.
//!     let profile = Profile { id: Some(id.clone()), name: "dave".into(), age: Some(47) };
//!     store.update(&profile).await.unwrap();
//!
//!     // Query by an arbitrary equality predicate.
//!     let daves: Vec<Profile> = store.find(docmap::bson::doc! { "name": "dave" }).await.unwrap();
//!     assert_eq!(daves.len(), 1);
//!
//!     store.shutdown().await.unwrap();
//! }
//! ```
//!
//! # Custom converters
//!
//! Fields of types the mapper does not handle natively are marked
//! `#[mapped(custom)]` and translated through a converter pair registered
//! before the store is built. Pairs for `uuid::Uuid` and
//! `chrono::DateTime<Utc>` are registered out of the box.
//!
//! ```ignore
//! use docmap::prelude::*;
//! use docmap::memory::MemoryBackend;
//! use docmap::bson::Bson;
//!
//! #[derive(Debug, Clone, PartialEq, Default)]
//! pub struct Endpoint(pub String);
//!
//! #[derive(Debug, Clone, PartialEq, Default, Mappable)]
//! pub struct Service {
//!     pub id: Option<String>,
//!     #[mapped(custom)]
//!     pub endpoint: Option<Endpoint>,
//! }
//!
//! let store = MappedStore::builder()
//!     .converter::<Endpoint>(
//!         "endpoint",
//!         |endpoint| Ok(Bson::String(endpoint.0.clone())),
//!         |raw| match raw {
//!             Bson::String(text) => Ok(Endpoint(text)),
//!             other => Err(MappingError::Decode(format!("expected endpoint, found {other}"))),
//!         },
//!     )
//!     .build(MemoryBackend::new());
//! ```
//!
//! # Backends
//!
//! - [`memory`] - Fast in-memory storage for development and testing
//!
//! Additional backends implement [`backend::DocumentBackend`]: five
//! collection-oriented operations over opaque BSON documents.

#[allow(unused_extern_crates)]
extern crate self as docmap;

pub mod prelude;

pub use docmap_core::{backend, convert, descriptor, error, layout, mappable, registry, store, value};

pub use docmap_macros::Mappable;

// Re-export BSON types for convenience
pub use bson;

/// In-memory storage backend implementations.
pub mod memory {
    pub use docmap_memory::{MemoryBackend, MemoryBackendBuilder};
}
