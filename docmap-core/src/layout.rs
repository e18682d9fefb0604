//! The resolved layout of one mappable type.
//!
//! A [`TypeLayout`] is built once per type, on first use, and never mutated
//! afterwards: the collection name, the ordered field descriptors (lifted
//! parent fields first, own fields appended in declaration order) and the
//! identity slot are fixed at construction. The row mapper is materialized
//! lazily on first read and cached.

use std::sync::{Arc, OnceLock};

use bson::{Bson, Document};

use crate::descriptor::FieldDescriptor;
use crate::error::{MappingError, MappingResult};
use crate::mappable::{FieldSet, Mappable};
use crate::registry::LayoutRegistry;

/// The cached field/converter metadata for one mappable type.
pub struct TypeLayout<T> {
    collection: &'static str,
    fields: Arc<[FieldDescriptor<T>]>,
    identity: Option<usize>,
    mapper: OnceLock<RowMapper<T>>,
}

impl<T: Mappable> TypeLayout<T> {
    /// Resolves the layout for `T`, recursing into parent and nested
    /// mappable types through the registry.
    pub(crate) fn build(registry: &LayoutRegistry) -> MappingResult<Self> {
        let mut fields: Vec<FieldDescriptor<T>> = Vec::new();

        if let Some(parent) = T::parent() {
            fields.extend(parent.resolve(registry)?);
        }

        let mut declared = FieldSet::new();
        T::declare(&mut declared);
        for decl in declared.into_decls() {
            fields.push(FieldDescriptor::build(decl, registry)?);
        }

        let mut identity = None;
        for (index, field) in fields.iter().enumerate() {
            if field.is_identity() {
                if identity.is_some() {
                    return Err(MappingError::DuplicateIdentity(T::type_name()));
                }
                identity = Some(index);
            }
        }

        Ok(TypeLayout {
            collection: T::type_name(),
            fields: fields.into(),
            identity,
            mapper: OnceLock::new(),
        })
    }

    /// Name of the collection this type's records live in.
    pub fn collection(&self) -> &'static str {
        self.collection
    }

    /// The ordered field descriptors, parent fields first.
    pub fn fields(&self) -> &[FieldDescriptor<T>] {
        &self.fields
    }

    /// Whether the type declares an identity field.
    pub fn has_identity(&self) -> bool {
        self.identity.is_some()
    }

    /// Builds the storage document for `object`.
    ///
    /// Every non-identity field is encoded through its converter and
    /// appended under its storage name in layout order. The identity field
    /// is always omitted; inserts receive a store-assigned identity and
    /// updates address the record through a predicate instead.
    pub fn to_document(&self, object: &T) -> MappingResult<Document> {
        let mut document = Document::new();
        for field in self.fields.iter() {
            if field.is_identity() {
                continue;
            }
            let raw = field
                .read(object)
                .map_err(|err| err.in_field(|| format!("{}.{}", self.collection, field.storage_name())))?;
            document.insert(field.storage_name(), raw);
        }
        Ok(document)
    }

    /// The identity field's value in its storage encoding.
    ///
    /// Fails with [`MappingError::NoIdentity`] when the type has no identity
    /// field and with [`MappingError::MissingIdentityValue`] when the field
    /// holds no value; check [`has_identity`](Self::has_identity) first when
    /// absence is expected.
    pub fn identity_bson(&self, object: &T) -> MappingResult<Bson> {
        let index = self
            .identity
            .ok_or(MappingError::NoIdentity(self.collection))?;
        let field = &self.fields[index];
        field.converter().to_storage(field.value_of(object))
    }

    /// The document-to-object mapper, built on first use and cached.
    pub fn row_mapper(&self) -> &RowMapper<T> {
        self.mapper.get_or_init(|| RowMapper {
            collection: self.collection,
            fields: self.fields.clone(),
        })
    }
}

/// Maps stored documents back into instances of `T`, one row at a time.
pub struct RowMapper<T> {
    collection: &'static str,
    fields: Arc<[FieldDescriptor<T>]>,
}

impl<T: Mappable> RowMapper<T> {
    /// Decodes one document into a fresh instance of `T`.
    ///
    /// Every field, the identity included, is read from the document by its
    /// storage name; a missing key decodes as null and is passed to the
    /// field's converter unchanged.
    pub fn map_row(&self, document: &Document, row: usize) -> MappingResult<T> {
        let mut object = T::default();
        for field in self.fields.iter() {
            let raw = document
                .get(field.storage_name())
                .cloned()
                .unwrap_or(Bson::Null);
            field.write(&mut object, raw).map_err(|err| {
                err.in_field(|| format!("{}[{row}].{}", self.collection, field.storage_name()))
            })?;
        }
        Ok(object)
    }
}
