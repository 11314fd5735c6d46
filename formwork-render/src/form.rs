//! The form container: a form store plus everything needed to render and
//! edit it.

use formwork_blocks::{BlockError, BlockKey, TeaserLookup, TeaserProviderRegistry, TeaserSelection, TeaserStore};
use formwork_schema::{SchemaType, ValidationError, ValidationErrorKind};
use formwork_store::{FormInspector, FormStore, ResourceApi, SaveOptions, StoreError};
use formwork_types::{DataPath, Locale};
use indexmap::IndexMap;
use serde_json::Value;
use std::collections::HashMap;
use std::rc::Rc;
use tracing::{debug, warn};

use crate::collections::BlockCollections;
use crate::config::{EngineConfig, HiddenValues};
use crate::error::{RenderError, RenderResult};
use crate::fields::TeaserSelectionField;
use crate::renderer::{RenderContext, Rendered, Renderer};

const TEASER_SELECTION: &str = "teaser_selection";

/// A form editing session.
///
/// Every edit goes through the container by data path and lands in the
/// [`FormStore`]; the next [`render`](Form::render) reflects it. Block and
/// teaser fields keep their drafts here, keyed by the field's path.
pub struct Form {
    store: FormStore,
    renderer: Renderer,
    config: EngineConfig,
    collections: BlockCollections,
    teasers: HashMap<DataPath, TeaserSelection>,
    teaser_providers: Rc<TeaserProviderRegistry>,
    hidden: Vec<DataPath>,
}

impl Form {
    pub fn new(store: FormStore, renderer: Renderer) -> Self {
        Self::with_config(store, renderer, EngineConfig::default())
    }

    pub fn with_config(store: FormStore, renderer: Renderer, config: EngineConfig) -> Self {
        Self {
            store,
            renderer,
            collections: BlockCollections::new(config.assign_block_ids),
            config,
            teasers: HashMap::new(),
            teaser_providers: Rc::new(TeaserProviderRegistry::new()),
            hidden: Vec::new(),
        }
    }

    /// Offers `providers` to every teaser selection of the form.
    #[must_use]
    pub fn with_teaser_providers(mut self, providers: Rc<TeaserProviderRegistry>) -> Self {
        self.renderer
            .fields_mut()
            .register(TEASER_SELECTION, TeaserSelectionField::new(Rc::clone(&providers)));
        self.teaser_providers = providers;
        self
    }

    #[must_use]
    pub fn store(&self) -> &FormStore {
        &self.store
    }

    #[must_use]
    pub fn inspector(&self) -> FormInspector<'_> {
        self.store.inspector()
    }

    #[must_use]
    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The resource locale, or the configured default.
    #[must_use]
    pub fn locale(&self) -> Option<&Locale> {
        self.store
            .locale()
            .or(self.config.default_locale.as_ref())
    }

    /// Paths hidden by the last render.
    #[must_use]
    pub fn hidden(&self) -> &[DataPath] {
        &self.hidden
    }

    #[must_use]
    pub fn collections(&self) -> &BlockCollections {
        &self.collections
    }

    #[must_use]
    pub fn teaser(&self, field: &str) -> Option<&TeaserSelection> {
        self.teasers.get(&DataPath::parse(field))
    }

    /// Renders the current schema over the current data.
    pub fn render(&mut self) -> RenderResult<Rendered> {
        let schema = self.store.schema()?;
        let locale = self.locale().cloned();
        let mut ctx = RenderContext {
            inspector: self.store.inspector(),
            locale: locale.as_ref(),
            collections: &mut self.collections,
        };
        let rendered = self.renderer.render(schema, self.store.data(), &mut ctx)?;
        self.hidden.clone_from(&rendered.hidden);
        self.flush_generated_ids()?;
        Ok(rendered)
    }

    /// Writes a user edit.
    pub fn change(&mut self, path: &str, value: Value) -> RenderResult<()> {
        self.store.set(path, value)?;
        self.resync(&DataPath::parse(path))
    }

    /// Signals that the field at `path` committed its value.
    pub fn finish(&mut self, path: &str) {
        self.store.finish_field(path);
    }

    /// Loads the resource and re-reads every collection from the new data.
    pub async fn load(&mut self, api: &dyn ResourceApi) -> RenderResult<()> {
        self.store.load(api).await?;
        self.resync(&DataPath::root())
    }

    /// Validates and saves.
    ///
    /// Errors on fields hidden by a visibility condition are dropped, since
    /// nobody can fix them. With [`HiddenValues::Exclude`] the values of
    /// hidden fields are left out of the payload.
    pub async fn submit(&mut self, api: &dyn ResourceApi, options: &SaveOptions) -> RenderResult<Value> {
        self.render()?;
        self.store.validate();
        let errors: Vec<ValidationError> = self
            .store
            .errors()
            .iter()
            .filter(|error| !self.is_hidden(&error.path))
            .cloned()
            .collect();
        self.store.set_errors(errors.clone());
        if !errors.is_empty() {
            debug!(resource_key = %self.store.resource_key(), errors = errors.len(), "Submit blocked by validation");
            return Err(StoreError::Validation(errors).into());
        }

        let excluded = match self.config.hidden_values {
            HiddenValues::Submit => Vec::new(),
            HiddenValues::Exclude => self.hidden.clone(),
        };
        let saved = self.store.submit_excluding(api, options, &excluded).await?;
        self.resync(&DataPath::root())?;
        Ok(saved)
    }

    /// Ends the session without saving.
    pub fn destroy(&mut self) {
        self.store.destroy();
        self.collections.clear();
        self.teasers.clear();
    }

    fn is_hidden(&self, path: &DataPath) -> bool {
        self.hidden.iter().any(|hidden| path.starts_with(hidden))
    }

    /// Re-reads collections and drops teaser selections touched by a write
    /// at `changed`.
    fn resync(&mut self, changed: &DataPath) -> RenderResult<()> {
        self.sync_collections(changed)?;
        self.teasers
            .retain(|path, _| !(changed.starts_with(path) || path.starts_with(changed)));
        self.flush_generated_ids()
    }

    fn sync_collections(&mut self, changed: &DataPath) -> RenderResult<()> {
        for path in self.collections.affected_by(changed) {
            match path.get(self.store.data()) {
                Some(value) => {
                    let value = value.clone();
                    self.collections.sync(&path, &value)?;
                }
                None => self.collections.forget(&path),
            }
        }
        Ok(())
    }

    fn flush_generated_ids(&mut self) -> RenderResult<()> {
        for (path, value) in self.collections.take_pending() {
            debug!(%path, "Writing generated block ids");
            self.store.set_untracked(&path.to_string(), value)?;
        }
        Ok(())
    }

    // ── Block fields ─────────────────────────────────────────────

    /// Default type and variants of the collection field at `path`.
    fn block_field(&self, path: &DataPath) -> RenderResult<(Option<String>, IndexMap<String, SchemaType>)> {
        let entry = self
            .store
            .schema_entry_by_path(&path.to_string())
            .ok_or_else(|| RenderError::NotACollection { path: path.clone() })?;
        let types = self
            .renderer
            .block_types(entry)?
            .ok_or_else(|| RenderError::NotACollection { path: path.clone() })?;
        Ok((entry.default_type.clone(), types.into_owned()))
    }

    fn value_at(&self, path: &DataPath) -> Value {
        path.get(self.store.data()).cloned().unwrap_or(Value::Null)
    }

    /// Writes the committed list of the collection at `path` to the store.
    /// A failed write is reported on the form's error channel; the
    /// collection keeps the applied change.
    fn commit(&mut self, path: &DataPath) -> RenderResult<()> {
        let Some(value) = self.collections.get(path).map(|collection| collection.value()) else {
            return Ok(());
        };
        self.collections.forget_below(path);
        // Teaser selections below are keyed by item index too.
        self.teasers.retain(|teaser, _| !teaser.starts_with(path));
        if let Err(e) = self.store.set(&path.to_string(), value) {
            warn!(%path, "Failed to write block collection: {}", e);
            self.store.report_save_error(e.to_string());
            return Err(e.into());
        }
        self.flush_generated_ids()
    }

    /// Appends a new item of `type_key`, filled with its form's defaults.
    /// The item starts in editing.
    pub fn block_add(&mut self, field: &str, type_key: &str) -> RenderResult<BlockKey> {
        let path = DataPath::parse(field);
        let (default_type, types) = self.block_field(&path)?;
        let value = self.value_at(&path);
        let key = self
            .collections
            .ensure(&path, default_type.as_deref(), &value)?
            .add(type_key, &types)?;
        self.commit(&path)?;
        Ok(key)
    }

    pub fn block_edit(&mut self, field: &str, key: &BlockKey) -> RenderResult<()> {
        let path = DataPath::parse(field);
        let (default_type, _) = self.block_field(&path)?;
        let value = self.value_at(&path);
        self.collections
            .ensure(&path, default_type.as_deref(), &value)?
            .edit(key)?;
        Ok(())
    }

    /// Writes `value` at `item_path` (relative to the item) in the draft.
    pub fn block_update(&mut self, field: &str, key: &BlockKey, item_path: &str, value: Value) -> RenderResult<()> {
        let path = DataPath::parse(field);
        self.collections
            .get_mut(&path)
            .ok_or_else(|| RenderError::NotACollection { path: path.clone() })?
            .update_draft(key, item_path, value)?;
        Ok(())
    }

    /// Validates the draft against its type's form (plus any checks of the
    /// field type) and merges it back.
    ///
    /// Validation errors are recorded on the form under the item's path
    /// and the item stays in editing. Returns the item's key, which changes
    /// when the draft switched the type.
    pub fn block_apply(&mut self, field: &str, key: &BlockKey) -> RenderResult<BlockKey> {
        let path = DataPath::parse(field);
        let (default_type, types) = self.block_field(&path)?;
        let field_type = match self.store.schema_entry_by_path(field) {
            Some(entry) => self.renderer.fields().get(&entry.field_type)?,
            None => return Err(RenderError::NotACollection { path }),
        };

        let collection = self
            .collections
            .get_mut(&path)
            .ok_or_else(|| RenderError::NotACollection { path: path.clone() })?;
        let item_path = collection.position(key).map(|index| path.join_index(index));
        let result = collection.apply(key, |draft| {
            let type_key = draft
                .get("type")
                .and_then(Value::as_str)
                .or(default_type.as_deref())
                .unwrap_or(&key.type_key);
            match types.get(type_key) {
                Some(variant) => {
                    let errors = variant.form.validate(draft);
                    if errors.is_empty() {
                        field_type.validate_item(draft)
                    } else {
                        errors
                    }
                }
                None => vec![ValidationError {
                    path: DataPath::parse("type"),
                    kind: ValidationErrorKind::UnknownBlockType {
                        type_key: type_key.to_string(),
                    },
                }],
            }
        });

        match result {
            Ok(new_key) => {
                if let Some(item_path) = &item_path {
                    self.replace_errors_below(item_path, Vec::new());
                }
                self.commit(&path)?;
                Ok(new_key)
            }
            Err(BlockError::Validation(errors)) => {
                if let Some(item_path) = &item_path {
                    let located = errors
                        .iter()
                        .map(|error| ValidationError {
                            path: item_path.concat(&error.path),
                            kind: error.kind.clone(),
                        })
                        .collect();
                    self.replace_errors_below(item_path, located);
                }
                Err(BlockError::Validation(errors).into())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn replace_errors_below(&mut self, prefix: &DataPath, replacement: Vec<ValidationError>) {
        let mut errors: Vec<ValidationError> = self
            .store
            .errors()
            .iter()
            .filter(|error| !error.path.starts_with(prefix))
            .cloned()
            .collect();
        errors.extend(replacement);
        self.store.set_errors(errors);
    }

    /// Discards the draft. Returns whether there was one.
    pub fn block_cancel(&mut self, field: &str, key: &BlockKey) -> bool {
        let path = DataPath::parse(field);
        let cancelled = self
            .collections
            .get_mut(&path)
            .is_some_and(|collection| collection.cancel(key));
        if cancelled {
            self.teasers.retain(|teaser, _| !teaser.starts_with(&path));
        }
        cancelled
    }

    /// Removes an item in any state.
    pub fn block_remove(&mut self, field: &str, key: &BlockKey) -> RenderResult<Value> {
        let path = DataPath::parse(field);
        let (default_type, _) = self.block_field(&path)?;
        let value = self.value_at(&path);
        let removed = self
            .collections
            .ensure(&path, default_type.as_deref(), &value)?
            .remove(key)?;
        self.commit(&path)?;
        Ok(removed)
    }

    /// Moves the item at `old_index` to `new_index`.
    pub fn block_sort(&mut self, field: &str, old_index: usize, new_index: usize) -> RenderResult<()> {
        let path = DataPath::parse(field);
        let (default_type, _) = self.block_field(&path)?;
        let value = self.value_at(&path);
        self.collections
            .ensure(&path, default_type.as_deref(), &value)?
            .sort(old_index, new_index)?;
        self.commit(&path)
    }

    // ── Teaser selections ────────────────────────────────────────

    fn teaser_mut(&mut self, path: &DataPath) -> RenderResult<&mut TeaserSelection> {
        let is_teaser = self
            .store
            .schema_entry_by_path(&path.to_string())
            .is_some_and(|entry| entry.field_type == TEASER_SELECTION);
        if !is_teaser {
            return Err(RenderError::NotACollection { path: path.clone() });
        }
        if !self.teasers.contains_key(path) {
            let selection = TeaserSelection::from_value(&self.current_value(path))?;
            self.teasers.insert(path.clone(), selection);
        }
        self.teasers
            .get_mut(path)
            .ok_or_else(|| RenderError::NotACollection { path: path.clone() })
    }

    /// The value at `path`, read from the draft when `path` lies inside an
    /// item being edited.
    fn current_value(&self, path: &DataPath) -> Value {
        match self.collections.editing_item(path) {
            Some((collection, key, inner)) => self
                .collections
                .get(&collection)
                .and_then(|collection| collection.draft(&key))
                .and_then(|draft| inner.get(draft))
                .cloned()
                .unwrap_or(Value::Null),
            None => self.value_at(path),
        }
    }

    /// Writes the selection at `path` back: into the enclosing draft when
    /// its item is being edited, into the store otherwise.
    fn commit_teaser(&mut self, path: &DataPath) -> RenderResult<()> {
        let Some(value) = self.teasers.get(path).map(TeaserSelection::value) else {
            return Ok(());
        };
        if let Some((collection, key, inner)) = self.collections.editing_item(path) {
            if let Some(collection) = self.collections.get_mut(&collection) {
                collection.update_draft(&key, &inner.to_string(), value)?;
            }
            return Ok(());
        }
        if let Err(e) = self.store.set(&path.to_string(), value) {
            warn!(%path, "Failed to write teaser selection: {}", e);
            self.store.report_save_error(e.to_string());
            return Err(e.into());
        }
        self.sync_collections(path)?;
        self.flush_generated_ids()
    }

    /// Merges a selection made in `provider`'s overlay.
    pub fn teaser_select(&mut self, field: &str, provider: &str, ids: &[Value]) -> RenderResult<()> {
        let path = DataPath::parse(field);
        let providers = Rc::clone(&self.teaser_providers);
        self.teaser_mut(&path)?.select(&providers, provider, ids)?;
        self.commit_teaser(&path)
    }

    pub fn teaser_sort(&mut self, field: &str, old_index: usize, new_index: usize) -> RenderResult<()> {
        let path = DataPath::parse(field);
        self.teaser_mut(&path)?.handle_sorted(old_index, new_index)?;
        self.commit_teaser(&path)
    }

    /// Removes the item identified by `type;id`.
    pub fn teaser_remove(&mut self, field: &str, key: &str) -> RenderResult<()> {
        let path = DataPath::parse(field);
        self.teaser_mut(&path)?.handle_remove(key)?;
        self.commit_teaser(&path)
    }

    pub fn teaser_present_as(&mut self, field: &str, present_as: Option<String>) -> RenderResult<()> {
        let path = DataPath::parse(field);
        self.teaser_mut(&path)?.set_present_as(present_as);
        self.commit_teaser(&path)
    }

    /// Starts editing the overrides of the item identified by `type;id`.
    pub fn teaser_edit(&mut self, field: &str, key: &str) -> RenderResult<BlockKey> {
        let path = DataPath::parse(field);
        Ok(self.teaser_mut(&path)?.handle_edit(key)?)
    }

    pub fn teaser_update(&mut self, field: &str, key: &BlockKey, name: &str, value: Value) -> RenderResult<()> {
        let path = DataPath::parse(field);
        self.teaser_mut(&path)?.update_edit(key, name, value)?;
        Ok(())
    }

    pub fn teaser_apply(&mut self, field: &str, key: &BlockKey) -> RenderResult<()> {
        let path = DataPath::parse(field);
        self.teaser_mut(&path)?.apply_edit(key)?;
        self.commit_teaser(&path)
    }

    pub fn teaser_cancel(&mut self, field: &str, key: &BlockKey) -> bool {
        self.teasers
            .get_mut(&DataPath::parse(field))
            .is_some_and(|selection| selection.cancel_edit(key))
    }

    /// Hydrates the items of the teaser field at `field` into `teasers`.
    /// A lookup failure is reported on the form's error channel.
    pub async fn load_teasers(
        &mut self,
        field: &str,
        lookup: &dyn TeaserLookup,
        teasers: &mut TeaserStore,
    ) -> RenderResult<usize> {
        let path = DataPath::parse(field);
        let items = self.teaser_mut(&path)?.items()?;
        match teasers.load(lookup, &items).await {
            Ok(fetched) => Ok(fetched),
            Err(e) => {
                self.store.report_save_error(e.to_string());
                Err(e.into())
            }
        }
    }
}
