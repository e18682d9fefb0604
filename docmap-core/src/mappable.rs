//! The declaration surface for mappable types.
//!
//! A type takes part in mapping by implementing [`Mappable`]: it names its
//! storage collection, optionally designates an embedded parent whose fields
//! are mapped ahead of its own, and lists its own fields in declaration
//! order through a [`FieldSet`]. The `#[derive(Mappable)]` macro in
//! `docmap-macros` generates all of this from a plain struct definition;
//! the builder here is the underlying mechanism and can be written by hand.
//!
//! Declarations are inspected exactly once per process: the first use of a
//! type builds its [`TypeLayout`](crate::layout::TypeLayout), which is then
//! cached by the [`LayoutRegistry`](crate::registry::LayoutRegistry) for the
//! registry's lifetime.

use crate::descriptor::{FieldDecl, FieldDescriptor, FieldKind};
use crate::error::MappingResult;
use crate::registry::LayoutRegistry;
use crate::value::Value;

/// A type whose values can be mapped to and from stored documents.
///
/// # Example
///
/// ```ignore
/// use docmap::mappable::{FieldSet, Mappable};
/// use docmap::descriptor::FieldKind;
/// use docmap::value::{FromValue, IntoValue};
///
/// #[derive(Default)]
/// struct Profile {
///     id: Option<String>,
///     name: String,
///     age: Option<i32>,
/// }
///
/// impl Mappable for Profile {
///     fn type_name() -> &'static str {
///         "Profile"
///     }
///
///     fn declare(fields: &mut FieldSet<Self>) {
///         fields
///             .field(
///                 "id",
///                 FieldKind::Text,
///                 |p: &Self| p.id.clone().into_value(),
///                 |p, v| {
///                     p.id = FromValue::from_value(v)?;
///                     Ok(())
///                 },
///             )
///             .field(
///                 "name",
///                 FieldKind::Text,
///                 |p: &Self| p.name.clone().into_value(),
///                 |p, v| {
///                     p.name = FromValue::from_value(v)?;
///                     Ok(())
///                 },
///             );
///     }
/// }
/// ```
pub trait Mappable: Default + Send + Sync + Sized + 'static {
    /// Bare name of the type; doubles as the storage collection name.
    fn type_name() -> &'static str;

    /// The embedded parent whose mapped fields precede this type's own.
    fn parent() -> Option<ParentHandle<Self>> {
        None
    }

    /// Lists the type's own fields, in declaration order.
    fn declare(fields: &mut FieldSet<Self>);
}

/// Ordered collection of field declarations for one type.
pub struct FieldSet<T> {
    decls: Vec<FieldDecl<T>>,
}

impl<T: Mappable> FieldSet<T> {
    pub(crate) fn new() -> Self {
        FieldSet { decls: Vec::new() }
    }

    /// Declares one field: its name, its kind, and the accessors that move
    /// a [`Value`] in and out of the owning object.
    pub fn field(
        &mut self,
        name: &'static str,
        kind: FieldKind,
        get: impl Fn(&T) -> Value + Send + Sync + 'static,
        set: impl Fn(&mut T, Value) -> MappingResult<()> + Send + Sync + 'static,
    ) -> &mut Self {
        self.decls.push(FieldDecl::new(name, kind, get, set));
        self
    }

    pub(crate) fn into_decls(self) -> Vec<FieldDecl<T>> {
        self.decls
    }
}

/// Resolves a parent type's layout and lifts its field descriptors into a
/// subtype through a pair of projections.
///
/// This is the flattened-inheritance mechanism: the subtype embeds its
/// parent as a regular struct field, and the parent's mapped fields are
/// stored alongside the subtype's own, parent fields first.
pub struct ParentHandle<T> {
    resolve: Box<dyn Fn(&LayoutRegistry) -> MappingResult<Vec<FieldDescriptor<T>>> + Send + Sync>,
}

impl<T: Mappable> ParentHandle<T> {
    /// Designates `P` as the parent, reachable through the given projections.
    pub fn of<P: Mappable>(get: fn(&T) -> &P, get_mut: fn(&mut T) -> &mut P) -> Self {
        ParentHandle {
            resolve: Box::new(move |registry| {
                let parent = registry.layout::<P>()?;
                Ok(parent
                    .fields()
                    .iter()
                    .map(|field| field.lift(get, get_mut))
                    .collect())
            }),
        }
    }

    pub(crate) fn resolve(
        &self,
        registry: &LayoutRegistry,
    ) -> MappingResult<Vec<FieldDescriptor<T>>> {
        (self.resolve)(registry)
    }
}
