use formwork_schema::{SchemaEntry, SchemaType, ValidationError};
use formwork_store::FormInspector;
use formwork_types::{DataPath, Locale};
use indexmap::IndexMap;
use serde_json::Value;

use crate::error::RenderResult;
use crate::view::View;

/// What a field type gets to render one field.
#[derive(Clone, Copy)]
pub struct FieldProps<'a> {
    /// The field's schema name (may contain slashes).
    pub name: &'a str,
    /// Absolute data path of the field's value.
    pub path: &'a DataPath,
    pub entry: &'a SchemaEntry,
    pub value: Option<&'a Value>,
    pub locale: Option<&'a Locale>,
    pub disabled: bool,
    pub error: Option<&'a ValidationError>,
    pub inspector: FormInspector<'a>,
}

/// A field widget implementation, looked up by schema type name.
///
/// Only [`render`](FieldType::render) is required. The renderer fills in
/// the common view properties (`name`, `path`, `label`, `required`,
/// `disabled`, `error`) after `render` returns.
pub trait FieldType {
    /// Describes the field's widget.
    fn render(&self, props: &FieldProps<'_>) -> RenderResult<View>;

    /// Block variants this field type edits as a collection, for field
    /// types that bring their own (schedules). Block fields declared with
    /// `types` in the schema do not need this.
    fn block_types(&self) -> Option<IndexMap<String, SchemaType>> {
        None
    }

    /// Checks a collection item on apply, after its variant form passed.
    /// Paths in the returned errors are relative to the item.
    fn validate_item(&self, item: &Value) -> Vec<ValidationError> {
        let _ = item;
        Vec::new()
    }
}

impl<F> FieldType for F
where
    F: Fn(&FieldProps<'_>) -> RenderResult<View>,
{
    fn render(&self, props: &FieldProps<'_>) -> RenderResult<View> {
        self(props)
    }
}
