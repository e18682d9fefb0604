//! Named converter pairs translating field values between host and storage
//! representations.
//!
//! Every [`FieldDescriptor`](crate::descriptor::FieldDescriptor) carries one
//! [`ConverterPair`]: `to_storage` turns a [`Value`] into BSON on the way
//! into a document, `from_storage` turns stored BSON back into a [`Value`]
//! for the row mapper. The built-in pairs are:
//!
//! - `as-is` — pass-through for scalars and scalar lists
//! - `object-id` — the identity encoding between a 24-character hex string
//!   and the store's native [`ObjectId`] token
//! - `embedded` / `embedded-list` — recurse into a nested mappable type's
//!   layout, one document (or one array of documents) per value
//! - `uuid` / `datetime` — default custom pairs registered by the facade
//!
//! User-defined pairs for additional field types are built with
//! [`ConverterPair::custom`] and registered before the store is constructed.

use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use bson::Bson;
use bson::oid::ObjectId;
use chrono::Utc;

use crate::error::{MappingError, MappingResult};
use crate::layout::TypeLayout;
use crate::mappable::Mappable;
use crate::value::Value;

type ToStorage = Arc<dyn Fn(Value) -> MappingResult<Bson> + Send + Sync>;
type FromStorage = Arc<dyn Fn(Bson) -> MappingResult<Value> + Send + Sync>;

/// A named, bidirectional conversion between host and storage values.
#[derive(Clone)]
pub struct ConverterPair {
    name: &'static str,
    to_storage: ToStorage,
    from_storage: FromStorage,
}

impl ConverterPair {
    /// Name of the conversion, for diagnostics.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Applies the host-to-storage direction.
    pub fn to_storage(&self, value: Value) -> MappingResult<Bson> {
        (self.to_storage)(value)
    }

    /// Applies the storage-to-host direction.
    pub fn from_storage(&self, raw: Bson) -> MappingResult<Value> {
        (self.from_storage)(raw)
    }

    /// Pass-through conversion for scalar values and scalar lists.
    pub fn as_is() -> Self {
        ConverterPair {
            name: "as-is",
            to_storage: Arc::new(value_to_bson),
            from_storage: Arc::new(bson_to_value),
        }
    }

    /// The identity encoding: a 24-character hex string on the host side,
    /// the store's native [`ObjectId`] token on the storage side.
    pub fn object_id() -> Self {
        ConverterPair {
            name: "object-id",
            to_storage: Arc::new(|value| match value {
                Value::String(id) => {
                    let parsed = ObjectId::parse_str(&id).map_err(|err| {
                        MappingError::InvalidId {
                            value: id,
                            detail: err.to_string(),
                        }
                    })?;
                    Ok(Bson::ObjectId(parsed))
                }
                Value::Null => Err(MappingError::MissingIdentityValue),
                other => Err(MappingError::Decode(format!(
                    "expected identity string, found {}",
                    other.kind_name()
                ))),
            }),
            from_storage: Arc::new(|raw| match raw {
                Bson::ObjectId(id) => Ok(Value::String(id.to_hex())),
                Bson::Null => Ok(Value::Null),
                other => Err(MappingError::Decode(format!(
                    "expected stored identity, found {}",
                    bson_kind(&other)
                ))),
            }),
        }
    }

    /// Builds a custom pair for a field type `V` from two plain functions.
    ///
    /// `Value::Null` is forwarded in both directions without calling the
    /// given functions, so they only ever see present values.
    pub fn custom<V: Any + Send + Sync>(
        name: &'static str,
        to: fn(&V) -> MappingResult<Bson>,
        from: fn(Bson) -> MappingResult<V>,
    ) -> Self {
        ConverterPair {
            name,
            to_storage: Arc::new(move |value| match value {
                Value::Null => Ok(Bson::Null),
                Value::Object(boxed) => {
                    let concrete = boxed
                        .downcast::<V>()
                        .map_err(|_| MappingError::TypeMismatch(type_name::<V>()))?;
                    to(&concrete)
                }
                other => Err(MappingError::Decode(format!(
                    "expected {}, found {}",
                    type_name::<V>(),
                    other.kind_name()
                ))),
            }),
            from_storage: Arc::new(move |raw| match raw {
                Bson::Null => Ok(Value::Null),
                other => Ok(Value::object(from(other)?)),
            }),
        }
    }

    /// Conversion for a field holding one nested mappable value: the nested
    /// type's document builder one way, its row mapper on row 0 the other.
    pub(crate) fn embedded<M: Mappable>(layout: Arc<TypeLayout<M>>) -> Self {
        let write_layout = layout.clone();
        ConverterPair {
            name: "embedded",
            to_storage: Arc::new(move |value| match value {
                Value::Null => Ok(Bson::Null),
                Value::Object(boxed) => {
                    let nested = boxed
                        .downcast::<M>()
                        .map_err(|_| MappingError::TypeMismatch(M::type_name()))?;
                    Ok(Bson::Document(write_layout.to_document(&nested)?))
                }
                other => Err(MappingError::Decode(format!(
                    "expected embedded {}, found {}",
                    M::type_name(),
                    other.kind_name()
                ))),
            }),
            from_storage: Arc::new(move |raw| match raw {
                Bson::Null => Ok(Value::Null),
                Bson::Document(document) => {
                    Ok(Value::object(layout.row_mapper().map_row(&document, 0)?))
                }
                other => Err(MappingError::Decode(format!(
                    "expected embedded document, found {}",
                    bson_kind(&other)
                ))),
            }),
        }
    }

    /// Conversion for a field holding a list of nested mappable values,
    /// applied element-wise over a stored array.
    pub(crate) fn embedded_list<M: Mappable>(layout: Arc<TypeLayout<M>>) -> Self {
        let write_layout = layout.clone();
        ConverterPair {
            name: "embedded-list",
            to_storage: Arc::new(move |value| match value {
                Value::Null => Ok(Bson::Null),
                Value::List(items) => {
                    let mut array = Vec::with_capacity(items.len());
                    for item in items {
                        match item {
                            Value::Object(boxed) => {
                                let nested = boxed
                                    .downcast::<M>()
                                    .map_err(|_| MappingError::TypeMismatch(M::type_name()))?;
                                array.push(Bson::Document(write_layout.to_document(&nested)?));
                            }
                            other => {
                                return Err(MappingError::Decode(format!(
                                    "expected embedded {}, found {}",
                                    M::type_name(),
                                    other.kind_name()
                                )));
                            }
                        }
                    }
                    Ok(Bson::Array(array))
                }
                other => Err(MappingError::Decode(format!(
                    "expected list of embedded {}, found {}",
                    M::type_name(),
                    other.kind_name()
                ))),
            }),
            from_storage: Arc::new(move |raw| match raw {
                Bson::Null => Ok(Value::Null),
                Bson::Array(items) => {
                    let mapper = layout.row_mapper();
                    let mut values = Vec::with_capacity(items.len());
                    for (row, item) in items.into_iter().enumerate() {
                        match item {
                            Bson::Document(document) => {
                                values.push(Value::object(mapper.map_row(&document, row)?));
                            }
                            other => {
                                return Err(MappingError::Decode(format!(
                                    "expected embedded document, found {}",
                                    bson_kind(&other)
                                )));
                            }
                        }
                    }
                    Ok(Value::List(values))
                }
                other => Err(MappingError::Decode(format!(
                    "expected stored array, found {}",
                    bson_kind(&other)
                ))),
            }),
        }
    }
}

impl fmt::Debug for ConverterPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ConverterPair").field(&self.name).finish()
    }
}

/// The converter pairs registered out of the box: `uuid::Uuid` stored as its
/// hyphenated string and `chrono::DateTime<Utc>` stored as a BSON datetime.
pub(crate) fn default_converters() -> HashMap<TypeId, ConverterPair> {
    let mut converters = HashMap::new();
    converters.insert(
        TypeId::of::<uuid::Uuid>(),
        ConverterPair::custom::<uuid::Uuid>(
            "uuid",
            |id| Ok(Bson::String(id.to_string())),
            |raw| match raw {
                Bson::String(text) => uuid::Uuid::parse_str(&text)
                    .map_err(|err| MappingError::Decode(format!("invalid uuid `{text}`: {err}"))),
                other => Err(MappingError::Decode(format!(
                    "expected uuid string, found {}",
                    bson_kind(&other)
                ))),
            },
        ),
    );
    converters.insert(
        TypeId::of::<chrono::DateTime<Utc>>(),
        ConverterPair::custom::<chrono::DateTime<Utc>>(
            "datetime",
            |at| Ok(Bson::DateTime(bson::DateTime::from_chrono(*at))),
            |raw| match raw {
                Bson::DateTime(at) => Ok(at.to_chrono()),
                other => Err(MappingError::Decode(format!(
                    "expected stored datetime, found {}",
                    bson_kind(&other)
                ))),
            },
        ),
    );
    converters
}

fn value_to_bson(value: Value) -> MappingResult<Bson> {
    Ok(match value {
        Value::Null => Bson::Null,
        Value::Bool(flag) => Bson::Boolean(flag),
        Value::Int32(number) => Bson::Int32(number),
        Value::Int64(number) => Bson::Int64(number),
        Value::Double(number) => Bson::Double(number),
        Value::String(text) => Bson::String(text),
        Value::List(items) => Bson::Array(
            items
                .into_iter()
                .map(value_to_bson)
                .collect::<MappingResult<Vec<_>>>()?,
        ),
        Value::Object(_) => {
            return Err(MappingError::Decode(
                "object value in a pass-through field".to_string(),
            ));
        }
    })
}

fn bson_to_value(raw: Bson) -> MappingResult<Value> {
    Ok(match raw {
        Bson::Null => Value::Null,
        Bson::Boolean(flag) => Value::Bool(flag),
        Bson::Int32(number) => Value::Int32(number),
        Bson::Int64(number) => Value::Int64(number),
        Bson::Double(number) => Value::Double(number),
        Bson::String(text) => Value::String(text),
        Bson::Array(items) => Value::List(
            items
                .into_iter()
                .map(bson_to_value)
                .collect::<MappingResult<Vec<_>>>()?,
        ),
        other => {
            return Err(MappingError::Decode(format!(
                "unsupported stored value of type {}",
                bson_kind(&other)
            )));
        }
    })
}

pub(crate) fn bson_kind(raw: &Bson) -> &'static str {
    match raw {
        Bson::Null => "null",
        Bson::Boolean(_) => "bool",
        Bson::Int32(_) => "int32",
        Bson::Int64(_) => "int64",
        Bson::Double(_) => "double",
        Bson::String(_) => "string",
        Bson::Array(_) => "array",
        Bson::Document(_) => "document",
        Bson::ObjectId(_) => "object-id",
        Bson::DateTime(_) => "datetime",
        Bson::Binary(_) => "binary",
        _ => "other",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_id_round_trips_hex_strings() {
        let pair = ConverterPair::object_id();
        let hex = "507f1f77bcf86cd799439011";
        let stored = pair.to_storage(Value::String(hex.to_string())).unwrap();
        assert!(matches!(stored, Bson::ObjectId(_)));
        match pair.from_storage(stored).unwrap() {
            Value::String(decoded) => assert_eq!(decoded, hex),
            other => panic!("unexpected value {other:?}"),
        }
    }

    #[test]
    fn object_id_rejects_invalid_hex() {
        let pair = ConverterPair::object_id();
        assert!(matches!(
            pair.to_storage(Value::String("not-hex".to_string())),
            Err(MappingError::InvalidId { .. })
        ));
    }

    #[test]
    fn object_id_requires_a_value() {
        let pair = ConverterPair::object_id();
        assert!(matches!(
            pair.to_storage(Value::Null),
            Err(MappingError::MissingIdentityValue)
        ));
    }

    #[test]
    fn as_is_passes_scalar_lists_through() {
        let pair = ConverterPair::as_is();
        let stored = pair
            .to_storage(Value::List(vec![
                Value::String("a".to_string()),
                Value::String("b".to_string()),
            ]))
            .unwrap();
        assert_eq!(
            stored,
            Bson::Array(vec![Bson::String("a".into()), Bson::String("b".into())])
        );
    }

    #[test]
    fn uuid_default_pair_stores_strings() {
        let converters = default_converters();
        let pair = converters
            .get(&TypeId::of::<uuid::Uuid>())
            .expect("uuid converter registered");
        let id = uuid::Uuid::new_v4();
        let stored = pair.to_storage(Value::object(id)).unwrap();
        assert_eq!(stored, Bson::String(id.to_string()));
        match pair.from_storage(stored).unwrap() {
            Value::Object(boxed) => {
                assert_eq!(*boxed.downcast::<uuid::Uuid>().unwrap(), id);
            }
            other => panic!("unexpected value {other:?}"),
        }
    }
}
