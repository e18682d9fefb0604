//! In-memory document backend for docmap.
//!
//! This crate provides a thread-safe, in-memory implementation of the
//! `DocumentBackend` trait. It uses async-aware read-write locks for
//! concurrent access and is ideal for development and testing.
//!
//! # Features
//!
//! - **Thread-safe access** - Concurrent reads and writes using async-aware RwLock
//! - **Opaque predicates** - Equality matching of predicate documents with
//!   numeric normalization
//! - **Sorting** - `{ "field": 1 | -1 }` order documents
//!
//! # Quick Start
//!
//! ```ignore
//! use docmap::prelude::*;
//! use docmap::memory::MemoryBackend;
//!
//! #[derive(Default, Clone, Mappable)]
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
//!     let id = store
//!         .insert(&Profile { id: None, name: "bob".into(), age: Some(36) })
//!         .await
//!         .unwrap();
//!
//!     let found: Profile = store.find_by_id(&id).await.unwrap();
//!     assert_eq!(found.name, "bob");
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as docmap_memory;

mod filter;
pub mod store;

pub use store::{MemoryBackend, MemoryBackendBuilder};
