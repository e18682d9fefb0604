//! The host-side value model crossing the mapping boundary.
//!
//! Every field of a mappable type is read and written through [`Value`], a
//! small type-erased representation that converter pairs translate to and
//! from BSON. Scalars map directly; nested mappable objects and
//! custom-converted values travel as [`Value::Object`], a boxed `Any` that
//! the converter built for the field downcasts back to the concrete type.
//!
//! The [`IntoValue`] and [`FromValue`] traits cover the scalar field types a
//! declaration may use directly; the `from_object*` helpers unbox erased
//! values on the way back out of storage.

use std::any::{Any, type_name};
use std::fmt;

use crate::error::{MappingError, MappingResult};

/// A single field value in its host representation.
pub enum Value {
    /// An absent or null value. Missing storage keys decode to this.
    Null,
    Bool(bool),
    Int32(i32),
    Int64(i64),
    Double(f64),
    String(String),
    /// A homogeneous list of values.
    List(Vec<Value>),
    /// A type-erased nested object, downcast by the field's converter.
    Object(Box<dyn Any + Send + Sync>),
}

impl Value {
    /// Boxes a nested mappable or custom-typed value.
    pub fn object<V: Any + Send + Sync>(value: V) -> Self {
        Value::Object(Box::new(value))
    }

    /// Short name of the variant, used in decode diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int32(_) => "int32",
            Value::Int64(_) => "int64",
            Value::Double(_) => "double",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Object(_) => "object",
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "Null"),
            Value::Bool(v) => write!(f, "Bool({v})"),
            Value::Int32(v) => write!(f, "Int32({v})"),
            Value::Int64(v) => write!(f, "Int64({v})"),
            Value::Double(v) => write!(f, "Double({v})"),
            Value::String(v) => write!(f, "String({v:?})"),
            Value::List(v) => f.debug_tuple("List").field(v).finish(),
            Value::Object(_) => write!(f, "Object(..)"),
        }
    }
}

/// Conversion of a field's host type into a [`Value`].
pub trait IntoValue {
    fn into_value(self) -> Value;
}

/// Conversion of a [`Value`] back into a field's host type.
///
/// Implementations for non-optional types reject [`Value::Null`]; absent
/// storage keys are passed through as null, never defaulted. The exception
/// is `Vec`, which reads null as the empty list.
pub trait FromValue: Sized {
    fn from_value(value: Value) -> MappingResult<Self>;
}

impl IntoValue for String {
    fn into_value(self) -> Value {
        Value::String(self)
    }
}

impl IntoValue for i32 {
    fn into_value(self) -> Value {
        Value::Int32(self)
    }
}

impl IntoValue for i64 {
    fn into_value(self) -> Value {
        Value::Int64(self)
    }
}

impl IntoValue for f64 {
    fn into_value(self) -> Value {
        Value::Double(self)
    }
}

impl IntoValue for bool {
    fn into_value(self) -> Value {
        Value::Bool(self)
    }
}

impl<T: IntoValue> IntoValue for Option<T> {
    fn into_value(self) -> Value {
        match self {
            Some(value) => value.into_value(),
            None => Value::Null,
        }
    }
}

impl<T: IntoValue> IntoValue for Vec<T> {
    fn into_value(self) -> Value {
        Value::List(self.into_iter().map(IntoValue::into_value).collect())
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> MappingResult<Self> {
        match value {
            Value::String(text) => Ok(text),
            other => Err(decode_expected("string", &other)),
        }
    }
}

impl FromValue for i32 {
    fn from_value(value: Value) -> MappingResult<Self> {
        match value {
            Value::Int32(number) => Ok(number),
            Value::Int64(number) => i32::try_from(number)
                .map_err(|_| MappingError::Decode(format!("int64 {number} overflows int32"))),
            other => Err(decode_expected("int32", &other)),
        }
    }
}

impl FromValue for i64 {
    fn from_value(value: Value) -> MappingResult<Self> {
        match value {
            Value::Int64(number) => Ok(number),
            Value::Int32(number) => Ok(i64::from(number)),
            other => Err(decode_expected("int64", &other)),
        }
    }
}

impl FromValue for f64 {
    fn from_value(value: Value) -> MappingResult<Self> {
        match value {
            Value::Double(number) => Ok(number),
            Value::Int32(number) => Ok(f64::from(number)),
            Value::Int64(number) => Ok(number as f64),
            other => Err(decode_expected("double", &other)),
        }
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> MappingResult<Self> {
        match value {
            Value::Bool(flag) => Ok(flag),
            other => Err(decode_expected("bool", &other)),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> MappingResult<Self> {
        match value {
            Value::Null => Ok(None),
            other => Ok(Some(T::from_value(other)?)),
        }
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: Value) -> MappingResult<Self> {
        match value {
            Value::Null => Ok(Vec::new()),
            Value::List(items) => items.into_iter().map(T::from_value).collect(),
            other => Err(decode_expected("list", &other)),
        }
    }
}

/// Unboxes an erased object value into its concrete type.
pub fn from_object<V: Any>(value: Value) -> MappingResult<V> {
    match value {
        Value::Object(boxed) => boxed
            .downcast::<V>()
            .map(|concrete| *concrete)
            .map_err(|_| MappingError::TypeMismatch(type_name::<V>())),
        Value::Null => Err(MappingError::Decode(format!(
            "missing value for non-optional {}",
            type_name::<V>()
        ))),
        other => Err(decode_expected(type_name::<V>(), &other)),
    }
}

/// Unboxes an optional erased object value; null reads as `None`.
pub fn from_object_opt<V: Any>(value: Value) -> MappingResult<Option<V>> {
    match value {
        Value::Null => Ok(None),
        other => Ok(Some(from_object(other)?)),
    }
}

/// Unboxes a list of erased object values; null reads as the empty list.
pub fn from_object_vec<V: Any>(value: Value) -> MappingResult<Vec<V>> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::List(items) => items.into_iter().map(from_object).collect(),
        other => Err(decode_expected("list", &other)),
    }
}

fn decode_expected(expected: &str, found: &Value) -> MappingError {
    MappingError::Decode(format!("expected {expected}, found {}", found.kind_name()))
}
