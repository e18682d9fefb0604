//! Per-field metadata: declarations, kinds, and resolved descriptors.
//!
//! A [`FieldDecl`] is what a type states about one of its fields; a
//! [`FieldDescriptor`] is the resolved form computed once at layout-build
//! time, holding the storage name, the identity flag and the converter pair
//! that carries values across the storage boundary.
//!
//! Descriptor construction follows a fixed priority: the identity
//! convention first (a field named `id`, stored under `_id`, must be text),
//! then collections (scalar elements pass through, mappable elements bind
//! the element type's layout, anything else is rejected), then embedded
//! mappable fields, then registered custom conversions, and finally the
//! scalar pass-through.

use std::any::{Any, TypeId, type_name};
use std::sync::Arc;

use bson::Bson;

use crate::convert::ConverterPair;
use crate::error::{MappingError, MappingResult};
use crate::mappable::Mappable;
use crate::registry::LayoutRegistry;
use crate::value::Value;

/// Conventional name of the identity field on the host side.
pub const ID_FIELD: &str = "id";

/// Storage name of the identity field.
pub const RAW_ID: &str = "_id";

/// Reads one field of `T` as a [`Value`].
pub type Getter<T> = Arc<dyn Fn(&T) -> Value + Send + Sync>;

/// Writes one field of `T` from a [`Value`].
pub type Setter<T> = Arc<dyn Fn(&mut T, Value) -> MappingResult<()> + Send + Sync>;

/// The declared shape of a field, as stated by the owning type.
#[derive(Debug, Clone, Copy)]
pub enum FieldKind {
    /// A string value.
    Text,
    /// A numeric or boolean value, stored as-is.
    Scalar,
    /// A homogeneous list with the given element kind.
    List(ElementKind),
    /// A nested mappable value, stored as an embedded document.
    Embedded(NestedHandle),
    /// A value translated by a converter pair registered for its exact type.
    Custom {
        id: TypeId,
        type_name: &'static str,
    },
}

/// Element kind of a declared collection field.
#[derive(Debug, Clone, Copy)]
pub enum ElementKind {
    Text,
    Scalar,
    Embedded(NestedHandle),
    /// An element type the mapper cannot store; rejected at layout build.
    Other(&'static str),
}

impl FieldKind {
    /// Kind for a field embedding one `M`.
    pub fn embedded<M: Mappable>() -> Self {
        FieldKind::Embedded(NestedHandle::of::<M>())
    }

    /// Kind for a field embedding a list of `M`.
    pub fn embedded_list<M: Mappable>() -> Self {
        FieldKind::List(ElementKind::Embedded(NestedHandle::of::<M>()))
    }

    /// Kind for a list of strings.
    pub fn text_list() -> Self {
        FieldKind::List(ElementKind::Text)
    }

    /// Kind for a list of numeric values.
    pub fn scalar_list() -> Self {
        FieldKind::List(ElementKind::Scalar)
    }

    /// Kind for a field translated by a registered converter pair for `V`.
    pub fn custom<V: Any>() -> Self {
        FieldKind::Custom {
            id: TypeId::of::<V>(),
            type_name: type_name::<V>(),
        }
    }

    fn declared_name(&self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::Scalar => "scalar",
            FieldKind::List(_) => "list",
            FieldKind::Embedded(handle) => handle.type_name,
            FieldKind::Custom { type_name, .. } => type_name,
        }
    }
}

/// Late-bound reference to a nested mappable type.
///
/// The handle defers layout resolution until the enclosing layout is built,
/// at which point the nested type's own layout is fetched from (or built
/// into) the registry and wrapped into an embedded converter pair.
#[derive(Debug, Clone, Copy)]
pub struct NestedHandle {
    type_name: &'static str,
    bind_one: fn(&LayoutRegistry) -> MappingResult<ConverterPair>,
    bind_many: fn(&LayoutRegistry) -> MappingResult<ConverterPair>,
}

impl NestedHandle {
    /// Handle for nested values of type `M`.
    pub fn of<M: Mappable>() -> Self {
        NestedHandle {
            type_name: M::type_name(),
            bind_one: bind_embedded::<M>,
            bind_many: bind_embedded_list::<M>,
        }
    }

    /// Name of the nested type, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

fn bind_embedded<M: Mappable>(registry: &LayoutRegistry) -> MappingResult<ConverterPair> {
    Ok(ConverterPair::embedded(registry.layout::<M>()?))
}

fn bind_embedded_list<M: Mappable>(registry: &LayoutRegistry) -> MappingResult<ConverterPair> {
    Ok(ConverterPair::embedded_list(registry.layout::<M>()?))
}

/// One declared field: name, kind, and the accessors bridging the owning
/// object and the value model.
pub struct FieldDecl<T> {
    name: &'static str,
    kind: FieldKind,
    get: Getter<T>,
    set: Setter<T>,
}

impl<T> FieldDecl<T> {
    pub fn new(
        name: &'static str,
        kind: FieldKind,
        get: impl Fn(&T) -> Value + Send + Sync + 'static,
        set: impl Fn(&mut T, Value) -> MappingResult<()> + Send + Sync + 'static,
    ) -> Self {
        FieldDecl {
            name,
            kind,
            get: Arc::new(get),
            set: Arc::new(set),
        }
    }
}

/// Resolved per-field metadata, computed once at layout-build time and
/// immutable afterwards.
pub struct FieldDescriptor<T> {
    storage_name: &'static str,
    is_identity: bool,
    converter: ConverterPair,
    get: Getter<T>,
    set: Setter<T>,
}

impl<T: Mappable> FieldDescriptor<T> {
    /// Resolves a declaration against the registry.
    pub(crate) fn build(decl: FieldDecl<T>, registry: &LayoutRegistry) -> MappingResult<Self> {
        let FieldDecl { name, kind, get, set } = decl;

        if name == ID_FIELD {
            // The identity convention takes precedence over everything else.
            let FieldKind::Text = kind else {
                return Err(MappingError::IdentityNotText {
                    type_name: T::type_name(),
                    declared: kind.declared_name(),
                });
            };
            return Ok(FieldDescriptor {
                storage_name: RAW_ID,
                is_identity: true,
                converter: ConverterPair::object_id(),
                get,
                set,
            });
        }

        let converter = match kind {
            FieldKind::List(ElementKind::Text) | FieldKind::List(ElementKind::Scalar) => {
                ConverterPair::as_is()
            }
            FieldKind::List(ElementKind::Embedded(handle)) => (handle.bind_many)(registry)?,
            FieldKind::List(ElementKind::Other(element)) => {
                return Err(MappingError::UnrecognizedElement {
                    type_name: T::type_name(),
                    field: name,
                    element,
                });
            }
            FieldKind::Embedded(handle) => (handle.bind_one)(registry)?,
            FieldKind::Custom { id, type_name } => {
                registry
                    .converter(id)
                    .ok_or(MappingError::MissingConverter {
                        type_name: T::type_name(),
                        field: name,
                        value_type: type_name,
                    })?
            }
            FieldKind::Text | FieldKind::Scalar => ConverterPair::as_is(),
        };

        Ok(FieldDescriptor {
            storage_name: name,
            is_identity: false,
            converter,
            get,
            set,
        })
    }

    /// Name the field is stored under.
    pub fn storage_name(&self) -> &'static str {
        self.storage_name
    }

    /// Whether this is the identity field.
    pub fn is_identity(&self) -> bool {
        self.is_identity
    }

    /// The converter pair applied when crossing the storage boundary.
    pub fn converter(&self) -> &ConverterPair {
        &self.converter
    }

    /// Reads the field from `object` and encodes it for storage.
    pub(crate) fn read(&self, object: &T) -> MappingResult<Bson> {
        self.converter.to_storage((self.get)(object))
    }

    /// The field's raw host-side value, unconverted.
    pub(crate) fn value_of(&self, object: &T) -> Value {
        (self.get)(object)
    }

    /// Decodes a stored value and assigns it to the field on `object`.
    pub(crate) fn write(&self, object: &mut T, raw: Bson) -> MappingResult<()> {
        let value = self.converter.from_storage(raw)?;
        (self.set)(object, value)
    }

    /// Re-targets a parent descriptor at a subtype through projections onto
    /// the embedded parent value. Converter and storage metadata are shared.
    pub(crate) fn lift<S: Mappable>(
        &self,
        get: fn(&S) -> &T,
        get_mut: fn(&mut S) -> &mut T,
    ) -> FieldDescriptor<S> {
        let inner_get = self.get.clone();
        let inner_set = self.set.clone();
        FieldDescriptor {
            storage_name: self.storage_name,
            is_identity: self.is_identity,
            converter: self.converter.clone(),
            get: Arc::new(move |object: &S| inner_get(get(object))),
            set: Arc::new(move |object: &mut S, value| inner_set(get_mut(object), value)),
        }
    }
}
