//! Error types for the search engine.
//!
//! The hierarchy separates caller mistakes (validation, parsing), lookup
//! failures on the registry, and failures reported by a storage backend.
//! Operators that do not apply to a field type are not errors: the compiler
//! drops those filters and records them (see
//! [`DroppedFilter`](crate::search::DroppedFilter)).

// Error enum variant fields are self-documenting via their #[error(...)] messages
#![allow(missing_docs)]

use thiserror::Error;

use crate::types::{FieldType, FilterOperator};

/// The primary error type for all engine operations.
#[derive(Error, Debug)]
pub enum EngineError {
    /// `search` was called for an entity type that has no registration.
    #[error("entity not registered: {entity}")]
    NotRegistered { entity: String },

    /// A strict field lookup did not find the requested key.
    #[error("field not found: {entity}.{field}")]
    FieldNotFound { entity: String, field: String },

    /// Malformed descriptors or criteria.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A textual value could not be converted to its field type.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// The storage engine rejected or failed the compiled query.
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Errors raised while constructing descriptors or validating criteria.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Descriptor key is empty or whitespace.
    #[error("filter key must not be blank")]
    BlankKey,

    /// Descriptor was built without a field type.
    #[error("field type is required for filter '{key}'")]
    MissingFieldType { key: String },

    /// Descriptor was built with an empty operator set.
    #[error("filter '{key}' must declare at least one operator")]
    NoOperators { key: String },

    /// A filter operator needs a value that was not supplied.
    #[error("filter '{key}' with operator {operator} requires a value")]
    MissingValue {
        key: String,
        operator: FilterOperator,
    },

    /// BETWEEN was issued without an upper bound.
    #[error("filter '{key}' with operator BETWEEN requires value_to")]
    MissingUpperBound { key: String },

    /// Page size must be positive.
    #[error("page size must be positive, got {size}")]
    InvalidPageSize { size: u32 },

    /// An unknown name was supplied for an enumerated value.
    #[error("unknown {kind}: '{value}'")]
    UnknownName { kind: &'static str, value: String },
}

/// Errors raised by the field type parser.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// No supported date format matched.
    #[error("cannot parse '{value}' as a date")]
    InvalidDate { value: String },

    /// The numeric cascade was exhausted.
    #[error("cannot parse '{value}' as a number")]
    InvalidNumber { value: String },

    /// The value cannot be represented as the requested field type.
    #[error("value '{value}' is not valid for field type {field_type}")]
    Unsupported { value: String, field_type: FieldType },
}

/// Errors reported by a storage backend.
#[derive(Error, Debug)]
pub enum BackendError {
    /// Connection to the backend failed.
    #[error("connection failed to {backend_name}: {message}")]
    ConnectionFailed {
        backend_name: String,
        message: String,
    },

    /// The backend rejected the query.
    #[error("query error in {backend_name}: {message}")]
    QueryError {
        backend_name: String,
        message: String,
    },

    /// Native rows could not be mapped to the entity type.
    #[error("result mapping failed in {backend_name}: {message}")]
    Mapping {
        backend_name: String,
        message: String,
    },

    /// Internal backend error.
    #[error("internal error in {backend_name}: {message}")]
    Internal {
        backend_name: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl BackendError {
    /// Creates a query error for the named backend.
    pub fn query(backend_name: &str, message: impl Into<String>) -> Self {
        BackendError::QueryError {
            backend_name: backend_name.to_string(),
            message: message.into(),
        }
    }

    /// Creates a mapping error for the named backend.
    pub fn mapping(backend_name: &str, message: impl Into<String>) -> Self {
        BackendError::Mapping {
            backend_name: backend_name.to_string(),
            message: message.into(),
        }
    }

    /// Creates an internal error for the named backend.
    pub fn internal(backend_name: &str, message: impl Into<String>) -> Self {
        BackendError::Internal {
            backend_name: backend_name.to_string(),
            message: message.into(),
            source: None,
        }
    }
}

/// Result type alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
