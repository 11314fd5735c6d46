//! Headless rendering for Formwork.
//!
//! # Architecture
//!
//! - [`FieldTypeRegistry`] maps schema type names (`text_line`, `block`,
//!   `teaser_selection`, ...) to [`FieldType`] implementations.
//! - [`Renderer`] walks a [`Schema`](formwork_schema::Schema) in declared
//!   order, evaluates visibility and disabled conditions, and produces a
//!   tree of [`View`]s. Sections are transparent in data paths; block fields
//!   render one `block_item` per entry.
//! - [`Form`] is the editing session: it owns the
//!   [`FormStore`](formwork_store::FormStore), renders it, routes edits by
//!   data path and keeps block and teaser drafts.
//! - [`EngineConfig`] holds the engine's tunables, loaded from TOML.

pub mod collections;
pub mod config;
pub mod error;
pub mod field;
pub mod fields;
pub mod form;
pub mod registry;
pub mod renderer;
pub mod view;

pub use collections::BlockCollections;
pub use config::{EngineConfig, HiddenValues};
pub use error::{RenderError, RenderResult};
pub use field::{FieldProps, FieldType};
pub use fields::{BlockField, CheckboxField, InputField, SchedulesField, SelectField, TeaserSelectionField};
pub use form::Form;
pub use registry::FieldTypeRegistry;
pub use renderer::{BLOCK_ITEM, RenderContext, Rendered, Renderer};
pub use view::View;
