//! Core type definitions for Formwork.
//!
//! This crate defines the small, UI-agnostic types shared by every other
//! crate in the workspace:
//! - Generated block ids (UUID v7)
//! - Locales
//! - Slash-delimited data paths into resource data (`/excerpt/title`)
//!
//! Schema types live in `formwork-schema`; stores in `formwork-store`.

mod ids;
mod locale;
mod path;

pub use ids::new_block_id;
pub use locale::Locale;
pub use path::DataPath;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid locale: {0:?}")]
    InvalidLocale(String),

    /// A write tried to descend through a scalar value or past the end of
    /// an array.
    #[error("cannot write {path}: no slot for segment {segment:?}")]
    PathConflict { path: String, segment: String },
}
