//! Error types for the store layer.

use formwork_schema::ValidationError;
use thiserror::Error;

use crate::api::ApiError;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The resource is still loading; reads and writes are gated.
    #[error("resource {resource_key:?} is loading")]
    Loading { resource_key: String },

    /// The store was destroyed (the editing session was closed).
    #[error("resource store {resource_key:?} was destroyed")]
    Destroyed { resource_key: String },

    /// The backend rejected a request.
    #[error("api error: {0}")]
    Api(#[from] ApiError),

    /// Local validation blocked the submit.
    #[error("{} validation error(s)", .0.len())]
    Validation(Vec<ValidationError>),

    /// One or more save handlers rejected the submit.
    #[error("save handlers failed: {}", .0.join("; "))]
    SaveHandlers(Vec<String>),

    /// A write addressed a path through a scalar.
    #[error(transparent)]
    Path(#[from] formwork_types::Error),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
