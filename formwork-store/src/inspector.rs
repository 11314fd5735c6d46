use formwork_schema::{SchemaEntry, ValidationError};
use formwork_types::{DataPath, Locale};
use serde_json::{Map, Value};
use std::rc::Rc;

use crate::api::SaveOptions;
use crate::form::FormStore;
use crate::hooks::{FinishFieldHandler, HandlerId, SaveHandler};

/// Read-only facade over a [`FormStore`] handed to field renderers.
///
/// Fields query schema, options, locale and values through it, and hook into
/// the submit lifecycle by registering save and finish-field handlers. It
/// offers no way to write data.
#[derive(Clone, Copy)]
pub struct FormInspector<'a> {
    store: &'a FormStore,
}

impl<'a> FormInspector<'a> {
    pub(crate) fn new(store: &'a FormStore) -> Self {
        Self { store }
    }

    #[must_use]
    pub fn resource_key(&self) -> &'a str {
        self.store.resource_key()
    }

    #[must_use]
    pub fn id(&self) -> Option<&'a str> {
        self.store.id()
    }

    #[must_use]
    pub fn locale(&self) -> Option<&'a Locale> {
        self.store.locale()
    }

    #[must_use]
    pub fn options(&self) -> &'a Map<String, Value> {
        self.store.options()
    }

    #[must_use]
    pub fn metadata_options(&self) -> &'a Map<String, Value> {
        self.store.metadata_options()
    }

    #[must_use]
    pub fn errors(&self) -> &'a [ValidationError] {
        self.store.errors()
    }

    /// The first validation error recorded for exactly `path`.
    #[must_use]
    pub fn error_for(&self, path: &DataPath) -> Option<&'a ValidationError> {
        self.store.errors().iter().find(|error| &error.path == path)
    }

    #[must_use]
    pub fn save_error(&self) -> Option<&'a str> {
        self.store.save_error()
    }

    #[must_use]
    pub fn loading(&self) -> bool {
        self.store.loading()
    }

    #[must_use]
    pub fn data(&self) -> &'a Value {
        self.store.data()
    }

    #[must_use]
    pub fn get_value_by_path(&self, path: &str) -> Option<&'a Value> {
        self.store.get_value_by_path(path)
    }

    #[must_use]
    pub fn get_values_by_tag(&self, tag: &str) -> Vec<Option<&'a Value>> {
        self.store.get_values_by_tag(tag)
    }

    #[must_use]
    pub fn get_paths_by_tag(&self, tag: &str) -> Vec<DataPath> {
        self.store.get_paths_by_tag(tag)
    }

    #[must_use]
    pub fn get_schema_entry_by_path(&self, path: &str) -> Option<&'a SchemaEntry> {
        self.store.schema_entry_by_path(path)
    }

    #[must_use]
    pub fn is_field_modified(&self, path: &str) -> bool {
        self.store.is_field_modified(path)
    }

    /// Registers a closure to run on every submit.
    pub fn add_save_handler(
        &self,
        handler: impl Fn(&SaveOptions) -> Result<(), String> + 'static,
    ) -> HandlerId {
        self.store.hooks.add_save(Rc::new(handler))
    }

    /// Registers a shared save handler object.
    pub fn register_save_handler(&self, handler: Rc<dyn SaveHandler>) -> HandlerId {
        self.store.hooks.add_save(handler)
    }

    pub fn remove_save_handler(&self, id: HandlerId) -> bool {
        self.store.hooks.remove_save(id)
    }

    /// Registers a closure to run whenever a field finishes.
    pub fn add_finish_field_handler(&self, handler: impl Fn(&DataPath) + 'static) -> HandlerId {
        self.store.hooks.add_finish(Rc::new(handler))
    }

    pub fn register_finish_field_handler(&self, handler: Rc<dyn FinishFieldHandler>) -> HandlerId {
        self.store.hooks.add_finish(handler)
    }

    pub fn remove_finish_field_handler(&self, id: HandlerId) -> bool {
        self.store.hooks.remove_finish(id)
    }

    /// Calls every save handler in registration order with the same
    /// `options`, even after a failure. Returns the failures.
    pub fn trigger_save_handler(&self, options: &SaveOptions) -> Vec<String> {
        self.store.trigger_save_handlers(options)
    }
}
