//! Error types for rendering and the form container.

use formwork_blocks::BlockError;
use formwork_condition::ConditionError;
use formwork_store::StoreError;
use formwork_types::DataPath;
use thiserror::Error;

/// Result type for render and container operations.
pub type RenderResult<T> = Result<T, RenderError>;

#[derive(Debug, Error)]
pub enum RenderError {
    /// The schema names a field type nobody registered.
    #[error("unknown field type {type_key:?}")]
    UnknownFieldType { type_key: String },

    /// A block item names a type its field does not declare.
    #[error("unknown block type {type_key:?} at {path}")]
    UnknownBlockType { type_key: String, path: DataPath },

    /// A field type needs an option the schema entry does not carry.
    #[error("field type {field_type:?} requires option {option:?}")]
    MissingOption { field_type: String, option: String },

    /// The path does not address a block or teaser collection field.
    #[error("{path} is not a collection field")]
    NotACollection { path: DataPath },

    #[error(transparent)]
    Condition(#[from] ConditionError),

    #[error(transparent)]
    Block(#[from] BlockError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Schema(#[from] formwork_schema::SchemaError),

    #[error(transparent)]
    Path(#[from] formwork_types::Error),

    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),
}
