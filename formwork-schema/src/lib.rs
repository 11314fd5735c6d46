//! Schema model for Formwork.
//!
//! Two shapes of the same information live here:
//! - [`Form`] — the backend metadata unit: an ordered tree of [`Item`]s
//!   ([`Field`] or [`Section`]) plus a [`ValidationSchema`]. Forms of a base
//!   type and a type variant are combined with [`Form::merge`].
//! - [`Schema`] — the render schema: an ordered mapping from field name to
//!   [`SchemaEntry`], produced by [`Form::to_schema`] and consumed by the
//!   stores and the renderer.
//!
//! [`MetadataStore`] caches forms per resource key and locale.

mod error;
mod form;
mod metadata;
mod schema;
mod validation;

pub use error::{SchemaError, SchemaResult};
pub use form::{Field, FieldOption, Form, Item, OptionType, Section, Tag, TypedForm, ValidationSchema};
pub use metadata::{MetadataLoader, MetadataStore};
pub use schema::{Schema, SchemaEntry, SchemaType, TaggedField, SECTION_TYPE};
pub use validation::{ValidationError, ValidationErrorKind};
