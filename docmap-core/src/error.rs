//! Error and result types for the mapping layer.
//!
//! Two enums cover the whole surface: [`MappingError`] for everything the
//! mapping core itself can produce (layout construction, value conversion,
//! and the semantic outcomes of facade operations), and [`StoreError`] for
//! failures reported by a storage backend. Backend failures are propagated
//! through [`MappingError::Store`] without being retried or reworded.

use thiserror::Error;

/// Represents all errors produced by the mapping layer.
///
/// Layout-construction variants (`DuplicateIdentity`, `IdentityNotText`,
/// `UnrecognizedElement`, `MissingConverter`) indicate a misdeclared type and
/// are not recoverable. `NothingUpdated`, `NotFound` and `Ambiguous` describe
/// the data, not the program, and callers may match on them to recover.
#[derive(Error, Debug)]
pub enum MappingError {
    /// More than one identity field, own or inherited, in a single type.
    #[error("duplicate identity field in type {0}")]
    DuplicateIdentity(&'static str),
    /// The field named `id` was declared with a non-text kind.
    #[error("identity field of {type_name} must be a text field, declared as {declared}")]
    IdentityNotText {
        type_name: &'static str,
        declared: &'static str,
    },
    /// A collection field whose element kind the mapper cannot store.
    #[error("unrecognized element type {element} in collection field `{field}` of {type_name}")]
    UnrecognizedElement {
        type_name: &'static str,
        field: &'static str,
        element: &'static str,
    },
    /// A custom-kind field without a registered converter pair for its type.
    #[error("no converter registered for field `{field}` of {type_name} (value type {value_type})")]
    MissingConverter {
        type_name: &'static str,
        field: &'static str,
        value_type: &'static str,
    },
    /// A type-erased value did not hold the type the layout was built for.
    #[error("value is not an instance of {0}")]
    TypeMismatch(&'static str),
    /// An identity-dependent operation on a type with no identity field.
    #[error("type {0} has no identity field")]
    NoIdentity(&'static str),
    /// The identity field exists but holds no value.
    #[error("identity value is not set")]
    MissingIdentityValue,
    /// An identity string that is not a 24-character hex value.
    #[error("invalid identity `{value}`: {detail}")]
    InvalidId { value: String, detail: String },
    /// A stored value could not be decoded into the declared field type.
    #[error("decode error: {0}")]
    Decode(String),
    /// An update predicate matched no stored record.
    #[error("update matched no record in {0}")]
    NothingUpdated(String),
    /// A query that requires exactly one record matched none.
    #[error("no matching record in {0}")]
    NotFound(String),
    /// A query that requires exactly one record matched several.
    #[error("expected one matching record in {collection}, found {matches}")]
    Ambiguous { collection: String, matches: usize },
    /// A failure reported by the storage backend, propagated as-is.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl MappingError {
    /// Prefixes decode errors with the location they occurred at; other
    /// variants already carry their own context.
    pub(crate) fn in_field(self, location: impl FnOnce() -> String) -> Self {
        match self {
            MappingError::Decode(detail) => {
                MappingError::Decode(format!("{}: {detail}", location()))
            }
            other => other,
        }
    }
}

/// A specialized `Result` type for mapping operations.
pub type MappingResult<T> = Result<T, MappingError>;

/// Represents failures reported by a storage backend.
///
/// The mapping core only classifies and propagates these; it never retries.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The backend could not be reached or the connection was lost.
    #[error("connection error: {0}")]
    Connection(String),
    /// A write violated a unique-key constraint.
    #[error("duplicate key in collection {collection}: {detail}")]
    DuplicateKey { collection: String, detail: String },
    /// Any other backend failure.
    #[error("backend error: {0}")]
    Backend(String),
}

/// A specialized `Result` type for backend operations.
pub type StoreResult<T> = Result<T, StoreError>;
