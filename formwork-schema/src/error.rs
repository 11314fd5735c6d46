//! Error types for the schema model.

use thiserror::Error;

/// Result type for schema operations.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Errors that can occur while building, merging or loading schemas.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// `merge` was called on a form that carries no validation schema.
    #[error("form {form:?} has no validation schema to merge into")]
    MissingValidationSchema { form: Option<String> },

    /// A type key was requested that the form does not declare.
    #[error("unknown form type {type_key:?}")]
    UnknownType { type_key: String },

    /// The metadata loader failed.
    #[error("metadata loading failed for {resource_key:?}: {message}")]
    Loader {
        resource_key: String,
        message: String,
    },

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Types(#[from] formwork_types::Error),
}
