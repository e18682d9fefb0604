//! Convenient re-exports of commonly used types from docmap.
//!
//! Import this prelude module to quickly access the most frequently used
//! types and traits without needing to import from multiple sub-modules:
//!
//! ```ignore
//! use docmap::prelude::*;
//! ```
//!
//! This provides access to:
//! - The `Mappable` trait, its derive macro and the declaration builder
//! - The mapped store facade and its builder
//! - Field descriptors, kinds and converter pairs
//! - Backend traits and error types

pub use docmap_core::{
    backend::{BackendBuilder, DocumentBackend},
    convert::ConverterPair,
    descriptor::{ElementKind, FieldDescriptor, FieldKind},
    error::{MappingError, MappingResult, StoreError, StoreResult},
    layout::{RowMapper, TypeLayout},
    mappable::{FieldSet, Mappable, ParentHandle},
    registry::LayoutRegistry,
    store::{with_id, MappedStore, MappedStoreBuilder},
    value::{FromValue, IntoValue, Value},
};

pub use docmap_macros::Mappable;
