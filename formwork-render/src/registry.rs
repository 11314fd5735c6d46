use formwork_blocks::TeaserProviderRegistry;
use indexmap::IndexMap;
use std::rc::Rc;
use tracing::debug;

use crate::error::{RenderError, RenderResult};
use crate::field::FieldType;
use crate::fields::{
    BlockField, CheckboxField, InputField, SchedulesField, SelectField, TeaserSelectionField,
};

/// Field types that edit their value verbatim.
const INPUT_TYPES: &[&str] = &[
    "text_line",
    "text_area",
    "text_editor",
    "number",
    "email",
    "url",
    "phone",
    "color",
    "date",
    "time",
    "datetime",
    "resource_locator",
    "single_media_selection",
    "media_selection",
];

/// Maps schema type names to [`FieldType`] implementations.
///
/// Built once at startup from an explicit list. Registering a name again
/// replaces the earlier implementation.
#[derive(Default)]
pub struct FieldTypeRegistry {
    types: IndexMap<String, Rc<dyn FieldType>>,
}

impl FieldTypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in field types, with a teaser selection offering no
    /// providers.
    pub fn with_defaults() -> Self {
        Self::with_teaser_providers(Rc::new(TeaserProviderRegistry::new()))
    }

    /// The built-in field types, with a teaser selection offering
    /// `providers`.
    pub fn with_teaser_providers(providers: Rc<TeaserProviderRegistry>) -> Self {
        let mut registry = Self::new();
        for name in INPUT_TYPES {
            registry.register(*name, InputField::new(name));
        }
        registry.register("checkbox", CheckboxField::new("checkbox"));
        registry.register("toggler", CheckboxField::new("toggler"));
        registry.register("single_select", SelectField::single());
        registry.register("select", SelectField::multiple());
        registry.register("block", BlockField);
        registry.register("schedules", SchedulesField);
        registry.register("teaser_selection", TeaserSelectionField::new(providers));
        registry
    }

    pub fn register(&mut self, name: impl Into<String>, field_type: impl FieldType + 'static) {
        let name = name.into();
        debug!(field_type = %name, "Registered field type");
        self.types.insert(name, Rc::new(field_type));
    }

    pub fn get(&self, name: &str) -> RenderResult<&dyn FieldType> {
        self.types
            .get(name)
            .map(|field_type| field_type.as_ref())
            .ok_or_else(|| RenderError::UnknownFieldType {
                type_key: name.to_string(),
            })
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Registered names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
