//! Predicate matching and ordering for the in-memory backend.
//!
//! Predicates reaching a backend are plain documents of field/value pairs
//! matched by equality. BSON's own `PartialEq` is too strict for that (an
//! `Int32` never equals an `Int64`), so values are normalized into
//! [`Comparable`] before comparing, with all numeric types widened to f64.

use std::cmp::Ordering;
use std::collections::HashMap;

use bson::oid::ObjectId;
use bson::{Bson, DateTime, Document};

/// Type-erased, comparable representation of BSON values.
///
/// Numeric types are normalized to f64 so that cross-width comparisons
/// behave the way callers expect from a document store.
#[derive(Debug)]
pub(crate) enum Comparable<'a> {
    Null,
    Bool(bool),
    Number(f64),
    ObjectId(ObjectId),
    DateTime(DateTime),
    String(&'a str),
    Array(Vec<Comparable<'a>>),
    Map(HashMap<&'a str, Comparable<'a>>),
}

impl<'a> From<&'a Bson> for Comparable<'a> {
    fn from(bson: &'a Bson) -> Self {
        match bson {
            Bson::Null => Comparable::Null,
            Bson::Boolean(value) => Comparable::Bool(*value),
            Bson::Int32(value) => Comparable::Number(*value as f64),
            Bson::Int64(value) => Comparable::Number(*value as f64),
            Bson::Double(value) => Comparable::Number(*value),
            Bson::ObjectId(value) => Comparable::ObjectId(*value),
            Bson::DateTime(value) => Comparable::DateTime(*value),
            Bson::String(value) => Comparable::String(value),
            Bson::Array(items) => Comparable::Array(
                items
                    .iter()
                    .map(Comparable::from)
                    .collect::<Vec<_>>(),
            ),
            Bson::Document(doc) => Comparable::Map(
                doc.iter()
                    .map(|(key, value)| (key.as_str(), Comparable::from(value)))
                    .collect::<HashMap<_, _>>(),
            ),
            _ => Comparable::Null, // Other types are not comparable
        }
    }
}

impl<'a> PartialEq for Comparable<'a> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Comparable::Null, Comparable::Null) => true,
            (Comparable::Bool(a), Comparable::Bool(b)) => a == b,
            (Comparable::Number(a), Comparable::Number(b)) => a == b,
            (Comparable::ObjectId(a), Comparable::ObjectId(b)) => a == b,
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a == b,
            (Comparable::String(a), Comparable::String(b)) => a == b,
            (Comparable::Array(a), Comparable::Array(b)) => a == b,
            (Comparable::Map(a), Comparable::Map(b)) => a == b,
            _ => false,
        }
    }
}

impl<'a> PartialOrd for Comparable<'a> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Comparable::Bool(a), Comparable::Bool(b)) => a.partial_cmp(b),
            (Comparable::Number(a), Comparable::Number(b)) => a.partial_cmp(b),
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a.partial_cmp(b),
            (Comparable::String(a), Comparable::String(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

/// Whether `record` satisfies every field/value pair of `predicate`.
///
/// An empty predicate matches every record. A predicate value of null
/// matches both a stored null and an absent field.
pub(crate) fn matches(record: &Document, predicate: &Document) -> bool {
    predicate.iter().all(|(field, expected)| {
        match record.get(field) {
            Some(actual) => Comparable::from(actual) == Comparable::from(expected),
            None => matches!(expected, Bson::Null),
        }
    })
}

/// Sorts documents by the fields of a `{ "field": 1 | -1 }` order document,
/// earlier fields taking precedence.
pub(crate) fn sort_documents(documents: &mut [Document], order_by: &Document) {
    documents.sort_by(|a, b| {
        for (field, direction) in order_by.iter() {
            let left = a.get(field).map(Comparable::from).unwrap_or(Comparable::Null);
            let right = b.get(field).map(Comparable::from).unwrap_or(Comparable::Null);

            let mut ordering = left.partial_cmp(&right).unwrap_or(Ordering::Equal);
            if descending(direction) {
                ordering = ordering.reverse();
            }
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    });
}

fn descending(direction: &Bson) -> bool {
    match direction {
        Bson::Int32(value) => *value < 0,
        Bson::Int64(value) => *value < 0,
        Bson::Double(value) => *value < 0.0,
        _ => false,
    }
}
