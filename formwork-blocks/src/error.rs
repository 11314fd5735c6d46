//! Error types for block collections.

use formwork_schema::ValidationError;
use thiserror::Error;

use crate::key::BlockKey;

/// Result type for block collection operations.
pub type BlockResult<T> = Result<T, BlockError>;

#[derive(Debug, Error)]
pub enum BlockError {
    /// No item with this key is in the collection.
    #[error("block {0} not found")]
    NotFound(BlockKey),

    /// The item is not being edited.
    #[error("block {0} is not being edited")]
    NotEditing(BlockKey),

    /// The type is not declared for this collection.
    #[error("unknown block type: {type_key}")]
    UnknownType { type_key: String },

    /// No teaser provider is registered under this key.
    #[error("unknown teaser provider: {provider}")]
    UnknownProvider { provider: String },

    /// A key string was not of the form `type;id`.
    #[error("invalid block key: {0:?}")]
    InvalidKey(String),

    /// The collection value is neither a list nor null.
    #[error("block collection value is not a list")]
    NotAList,

    /// An item has no `type` and the collection has no default type.
    #[error("block item {index} has no type")]
    MissingType { index: usize },

    /// An item of the collection value is not an object.
    #[error("block item {index} is not an object")]
    InvalidItem { index: usize },

    #[error("index {index} out of range for {len} block(s)")]
    IndexOutOfRange { index: usize, len: usize },

    /// The draft failed local validation and stays in editing.
    #[error("{} validation error(s)", .0.len())]
    Validation(Vec<ValidationError>),

    /// The teaser lookup failed.
    #[error("teaser lookup failed: {0}")]
    Lookup(String),

    #[error(transparent)]
    Path(#[from] formwork_types::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
