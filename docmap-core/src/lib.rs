//! A typed object/document mapping layer for document stores.
//!
//! This crate is the core of the docmap project and provides:
//!
//! - **Mappable declarations** ([`mappable`]) - The trait and field builder a
//!   type uses to describe its mapped shape, once per type
//! - **Field descriptors** ([`descriptor`]) - Per-field storage names,
//!   identity handling and converter resolution
//! - **Type layouts** ([`layout`]) - The cached field/converter metadata of
//!   one type, its document builder and its row mapper
//! - **Layout registry** ([`registry`]) - The thread-safe build-once cache
//!   mapping each type to its layout
//! - **Converter pairs** ([`convert`]) - Named bidirectional conversions
//!   between host values and stored BSON
//! - **Backend abstraction** ([`backend`]) - The async collection-oriented
//!   store contract the facade delegates to
//! - **Mapped store** ([`store`]) - The typed CRUD facade
//! - **Error handling** ([`error`]) - Mapping and store error taxonomies
//!
//! # Example
//!
//! ```ignore
//! use docmap::mappable::{FieldSet, Mappable};
//! use docmap::descriptor::FieldKind;
//! use docmap::value::{FromValue, IntoValue};
//!
//! #[derive(Default, Clone)]
//! pub struct Profile {
//!     pub id: Option<String>,
//!     pub name: String,
//! }
//!
//! impl Mappable for Profile {
//!     fn type_name() -> &'static str {
//!         "Profile"
//!     }
//!
//!     fn declare(fields: &mut FieldSet<Self>) {
//!         fields
//!             .field(
//!                 "id",
//!                 FieldKind::Text,
//!                 |p: &Self| p.id.clone().into_value(),
//!                 |p, v| {
//!                     p.id = FromValue::from_value(v)?;
//!                     Ok(())
//!                 },
//!             )
//!             .field(
//!                 "name",
//!                 FieldKind::Text,
//!                 |p: &Self| p.name.clone().into_value(),
//!                 |p, v| {
//!                     p.name = FromValue::from_value(v)?;
//!                     Ok(())
//!                 },
//!             );
//!     }
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as docmap_core;

pub mod backend;
pub mod convert;
pub mod descriptor;
pub mod error;
pub mod layout;
pub mod mappable;
pub mod registry;
pub mod store;
pub mod value;
