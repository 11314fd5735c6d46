//! The form store: a resource store bound to a schema.

use formwork_schema::{Schema, SchemaEntry, ValidationError};
use formwork_types::{DataPath, Locale};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::api::{ResourceApi, SaveOptions};
use crate::error::{StoreError, StoreResult};
use crate::hooks::Hooks;
use crate::inspector::FormInspector;
use crate::observer::{StoreEvent, SubscriptionId};
use crate::resource::ResourceStore;

/// Binds one [`ResourceStore`] to a [`Schema`] and exposes path-oriented
/// access, dirty tracking, validation and the submit lifecycle.
///
/// The form store is the single writer of its resource store. Readers go
/// through [`FormStore::inspector`].
pub struct FormStore {
    resource: ResourceStore,
    schema: Schema,
    metadata_options: Map<String, Value>,
    /// Data as of the last load/save; the reference for `is_field_modified`.
    snapshot: Value,
    modified_fields: Vec<DataPath>,
    errors: Vec<ValidationError>,
    save_error: Option<String>,
    pub(crate) hooks: Hooks,
}

impl FormStore {
    /// Wraps `resource`. For a resource without an id, declared schema
    /// defaults fill any value the data does not have yet.
    pub fn new(resource: ResourceStore, schema: Schema) -> Self {
        let mut store = Self {
            snapshot: resource.data().clone(),
            resource,
            schema,
            metadata_options: Map::new(),
            modified_fields: Vec::new(),
            errors: Vec::new(),
            save_error: None,
            hooks: Hooks::default(),
        };
        if store.resource.id().is_none() {
            store.apply_defaults();
        }
        store
    }

    /// Options forwarded to the metadata endpoint (e.g. `webspace`).
    #[must_use]
    pub fn with_metadata_options(mut self, options: Map<String, Value>) -> Self {
        self.metadata_options = options;
        self
    }

    fn apply_defaults(&mut self) {
        let Value::Object(defaults) = self.schema.default_values() else {
            return;
        };
        let mut data = self.resource.data().clone();
        let mut changed = false;
        for (path, value) in flatten_defaults(defaults) {
            if path.get(&data).is_none() && path.set(&mut data, value).is_ok() {
                changed = true;
            }
        }
        if changed && self.resource.set("", data).is_ok() {
            self.snapshot = self.resource.data().clone();
        }
    }

    #[must_use]
    pub fn inspector(&self) -> FormInspector<'_> {
        FormInspector::new(self)
    }

    #[must_use]
    pub fn resource_key(&self) -> &str {
        self.resource.resource_key()
    }

    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.resource.id()
    }

    #[must_use]
    pub fn locale(&self) -> Option<&Locale> {
        self.resource.locale()
    }

    pub fn set_locale(&mut self, locale: Option<Locale>) {
        self.resource.set_locale(locale);
    }

    #[must_use]
    pub fn options(&self) -> &Map<String, Value> {
        self.resource.options()
    }

    #[must_use]
    pub fn metadata_options(&self) -> &Map<String, Value> {
        &self.metadata_options
    }

    #[must_use]
    pub fn loading(&self) -> bool {
        self.resource.loading()
    }

    #[must_use]
    pub fn saving(&self) -> bool {
        self.resource.saving()
    }

    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.resource.dirty()
    }

    #[must_use]
    pub fn destroyed(&self) -> bool {
        self.resource.destroyed()
    }

    #[must_use]
    pub fn data(&self) -> &Value {
        self.resource.data()
    }

    /// Returns the schema, unless the resource is still loading.
    pub fn schema(&self) -> StoreResult<&Schema> {
        if self.resource.loading() {
            return Err(StoreError::Loading {
                resource_key: self.resource.resource_key().to_string(),
            });
        }
        Ok(&self.schema)
    }

    /// Replaces the active schema. Unsaved edits are kept; confirming data
    /// loss is the caller's job.
    pub fn change_schema(&mut self, schema: Schema) {
        if self.is_dirty() {
            warn!(resource_key = %self.resource_key(), "Schema changed with unsaved edits");
        }
        self.schema = schema;
        self.errors.clear();
    }

    pub fn subscribe(&mut self, callback: impl FnMut(&StoreEvent) + 'static) -> SubscriptionId {
        self.resource.subscribe(callback)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.resource.unsubscribe(id)
    }

    /// Resolves a slash path into the data. Missing segments give `None`.
    #[must_use]
    pub fn get_value_by_path(&self, path: &str) -> Option<&Value> {
        DataPath::parse(path).get(self.resource.data())
    }

    /// Writes a user edit at `path` and marks the store dirty.
    pub fn set(&mut self, path: &str, value: Value) -> StoreResult<()> {
        if self.resource.loading() {
            return Err(StoreError::Loading {
                resource_key: self.resource.resource_key().to_string(),
            });
        }
        self.resource.change(path, value)
    }

    /// Writes engine-generated data such as block ids. The store does not
    /// become dirty and the value does not count as a modification.
    pub fn set_untracked(&mut self, path: &str, value: Value) -> StoreResult<()> {
        if self.resource.loading() {
            return Err(StoreError::Loading {
                resource_key: self.resource.resource_key().to_string(),
            });
        }
        self.resource.set(path, value.clone())?;
        // Items added since the last save have no counterpart in the snapshot.
        let path = DataPath::parse(path);
        if let Err(e) = path.set(&mut self.snapshot, value) {
            debug!(%path, "Generated data not mirrored into snapshot: {}", e);
        }
        Ok(())
    }

    /// Writes several top-level values.
    pub fn set_multiple(&mut self, values: Map<String, Value>) -> StoreResult<()> {
        for (key, value) in values {
            self.set(&key, value)?;
        }
        Ok(())
    }

    /// Signals that the field at `path` committed its value. All
    /// finish-field handlers run, in registration order, on every call; the
    /// path is recorded as modified only on its first transition.
    pub fn finish_field(&mut self, path: &str) {
        let path = DataPath::parse(path);
        self.hooks.trigger_finish(&path);
        if self.is_path_modified(&path) && !self.modified_fields.contains(&path) {
            debug!(resource_key = %self.resource_key(), %path, "Field modified");
            self.modified_fields.push(path);
        }
    }

    /// Paths that were finished while differing from the snapshot, in the
    /// order they first transitioned.
    #[must_use]
    pub fn modified_fields(&self) -> &[DataPath] {
        &self.modified_fields
    }

    /// Whether the value at `path` differs from the last loaded/saved data.
    #[must_use]
    pub fn is_field_modified(&self, path: &str) -> bool {
        self.is_path_modified(&DataPath::parse(path))
    }

    fn is_path_modified(&self, path: &DataPath) -> bool {
        path.get(self.resource.data()) != path.get(&self.snapshot)
    }

    /// Values of every field tagged `tag`, aligned with
    /// [`get_paths_by_tag`](Self::get_paths_by_tag).
    #[must_use]
    pub fn get_values_by_tag(&self, tag: &str) -> Vec<Option<&Value>> {
        self.get_paths_by_tag(tag)
            .iter()
            .map(|path| path.get(self.resource.data()))
            .collect()
    }

    /// Paths of every field tagged `tag`, in schema declaration order.
    #[must_use]
    pub fn get_paths_by_tag(&self, tag: &str) -> Vec<DataPath> {
        self.schema
            .fields_by_tag(tag)
            .into_iter()
            .map(|field| field.path)
            .collect()
    }

    /// Like [`get_paths_by_tag`](Self::get_paths_by_tag) but ordered by tag
    /// priority, highest first. Equal priorities keep declaration order;
    /// a missing priority sorts last.
    #[must_use]
    pub fn get_paths_by_tag_sorted(&self, tag: &str) -> Vec<DataPath> {
        let mut fields = self.schema.fields_by_tag(tag);
        fields.sort_by_key(|field| std::cmp::Reverse(field.priority.unwrap_or(i32::MIN)));
        fields.into_iter().map(|field| field.path).collect()
    }

    /// Resolves a data path to its schema entry (through sections and block
    /// items).
    #[must_use]
    pub fn schema_entry_by_path(&self, path: &str) -> Option<&SchemaEntry> {
        if self.resource.loading() {
            return None;
        }
        self.schema
            .entry_by_path(&DataPath::parse(path), self.resource.data())
    }

    /// Validates the data against the schema and stores the errors.
    pub fn validate(&mut self) -> bool {
        self.errors = self.schema.validate(self.resource.data());
        self.errors.is_empty()
    }

    /// Replaces the stored validation errors (used by containers that apply
    /// their own filtering, e.g. for hidden sections).
    pub fn set_errors(&mut self, errors: Vec<ValidationError>) {
        self.errors = errors;
    }

    #[must_use]
    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    /// The message of the last failed save, cleared by a successful one.
    #[must_use]
    pub fn save_error(&self) -> Option<&str> {
        self.save_error.as_deref()
    }

    /// Records a collection-level failure in the error channel.
    pub fn report_save_error(&mut self, message: impl Into<String>) {
        self.save_error = Some(message.into());
    }

    /// Runs every save handler with `options`; returns their failures.
    pub fn trigger_save_handlers(&self, options: &SaveOptions) -> Vec<String> {
        self.hooks.trigger_save(options)
    }

    /// Loads the resource and makes the loaded data the new snapshot.
    pub async fn load(&mut self, api: &dyn ResourceApi) -> StoreResult<()> {
        self.resource.load(api).await?;
        self.snapshot = self.resource.data().clone();
        self.modified_fields.clear();
        Ok(())
    }

    /// Validates, runs the save handlers, then saves.
    ///
    /// Validation failures and handler failures block the save. A failed
    /// save keeps every edit and is recorded in [`save_error`](Self::save_error).
    pub async fn submit(&mut self, api: &dyn ResourceApi, options: &SaveOptions) -> StoreResult<Value> {
        if !self.validate() {
            debug!(resource_key = %self.resource_key(), errors = self.errors.len(), "Submit blocked by validation");
            return Err(StoreError::Validation(self.errors.clone()));
        }
        self.submit_validated(api, options).await
    }

    /// Submit without running schema validation (the caller already did).
    pub async fn submit_validated(&mut self, api: &dyn ResourceApi, options: &SaveOptions) -> StoreResult<Value> {
        self.submit_excluding(api, options, &[]).await
    }

    /// Submit without validation, leaving the values at `excluded` out of
    /// the payload. They stay in the local data until the saved
    /// representation replaces it.
    pub async fn submit_excluding(
        &mut self,
        api: &dyn ResourceApi,
        options: &SaveOptions,
        excluded: &[DataPath],
    ) -> StoreResult<Value> {
        let failures = self.hooks.trigger_save(options);
        if !failures.is_empty() {
            warn!(resource_key = %self.resource_key(), "Save handlers rejected submit");
            self.save_error = Some(failures.join("; "));
            return Err(StoreError::SaveHandlers(failures));
        }

        let mut payload = self.resource.data().clone();
        for path in excluded {
            path.remove(&mut payload);
        }
        if !excluded.is_empty() {
            debug!(resource_key = %self.resource_key(), excluded = excluded.len(), "Excluding values from submit");
        }

        match self.resource.save_payload(api, options, &payload).await {
            Ok(saved) => {
                self.snapshot = self.resource.data().clone();
                self.modified_fields.clear();
                self.errors.clear();
                self.save_error = None;
                info!(resource_key = %self.resource_key(), "Form submitted");
                Ok(saved)
            }
            Err(e) => {
                self.save_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Closes the session without saving.
    pub fn destroy(&mut self) {
        self.hooks.clear();
        self.resource.destroy();
    }
}

/// Flattens a defaults object into leaf paths so nested defaults do not
/// overwrite sibling data that is already present.
fn flatten_defaults(defaults: Map<String, Value>) -> Vec<(DataPath, Value)> {
    fn walk(prefix: DataPath, value: Value, out: &mut Vec<(DataPath, Value)>) {
        match value {
            Value::Object(map) if !map.is_empty() => {
                for (key, child) in map {
                    walk(prefix.join(key), child, out);
                }
            }
            other => out.push((prefix, other)),
        }
    }

    let mut out = Vec::new();
    walk(DataPath::root(), Value::Object(defaults), &mut out);
    out
}
