//! The resource store: one backend resource's editable state.

use formwork_types::{DataPath, Locale};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::api::{ResourceApi, ResourceRequest, SaveOptions};
use crate::error::{StoreError, StoreResult};
use crate::observer::{StoreEvent, SubscriptionId, Subscribers};

/// Holds `{id, locale, data, loading}` for one resource instance and
/// notifies observers on every change.
///
/// A store is created per editing session and destroyed when the session
/// closes. After [`destroy`](Self::destroy) writes are ignored and saves are
/// refused, so results of requests that complete late cannot leak into a
/// closed session.
pub struct ResourceStore {
    resource_key: String,
    id: Option<String>,
    locale: Option<Locale>,
    options: Map<String, Value>,
    data: Value,
    loading: bool,
    saving: bool,
    dirty: bool,
    destroyed: bool,
    subscribers: Subscribers,
}

impl ResourceStore {
    /// Creates a store. `id = None` denotes a resource that does not exist on
    /// the backend yet.
    pub fn new(
        resource_key: impl Into<String>,
        id: Option<String>,
        locale: Option<Locale>,
        options: Map<String, Value>,
    ) -> Self {
        Self {
            resource_key: resource_key.into(),
            id,
            locale,
            options,
            data: Value::Object(Map::new()),
            loading: false,
            saving: false,
            dirty: false,
            destroyed: false,
            subscribers: Subscribers::default(),
        }
    }

    /// Creates a store pre-filled with `data` (no backend round trip).
    pub fn with_data(resource_key: impl Into<String>, id: Option<String>, locale: Option<Locale>, data: Value) -> Self {
        let mut store = Self::new(resource_key, id, locale, Map::new());
        store.data = data;
        store
    }

    #[must_use]
    pub fn resource_key(&self) -> &str {
        &self.resource_key
    }

    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    #[must_use]
    pub fn locale(&self) -> Option<&Locale> {
        self.locale.as_ref()
    }

    #[must_use]
    pub fn options(&self) -> &Map<String, Value> {
        &self.options
    }

    #[must_use]
    pub fn data(&self) -> &Value {
        &self.data
    }

    #[must_use]
    pub fn loading(&self) -> bool {
        self.loading
    }

    #[must_use]
    pub fn saving(&self) -> bool {
        self.saving
    }

    #[must_use]
    pub fn dirty(&self) -> bool {
        self.dirty
    }

    #[must_use]
    pub fn destroyed(&self) -> bool {
        self.destroyed
    }

    /// Registers an observer. Observers run synchronously in subscription
    /// order after each change.
    pub fn subscribe(&mut self, callback: impl FnMut(&StoreEvent) + 'static) -> SubscriptionId {
        self.subscribers.subscribe(Box::new(callback))
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscribers.unsubscribe(id)
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Writes `value` at `path` without marking the store dirty.
    pub fn set(&mut self, path: &str, value: Value) -> StoreResult<()> {
        if self.destroyed {
            debug!(resource_key = %self.resource_key, path, "Ignoring write to destroyed store");
            return Ok(());
        }
        let path = DataPath::parse(path);
        path.set(&mut self.data, value)?;
        self.subscribers.notify(&StoreEvent::DataChanged { path });
        Ok(())
    }

    /// Writes every top-level entry of `values`.
    pub fn set_multiple(&mut self, values: Map<String, Value>) -> StoreResult<()> {
        for (key, value) in values {
            self.set(&key, value)?;
        }
        Ok(())
    }

    /// Writes `value` at `path` and marks the store dirty (a user edit).
    pub fn change(&mut self, path: &str, value: Value) -> StoreResult<()> {
        self.set(path, value)?;
        if !self.destroyed {
            self.dirty = true;
        }
        Ok(())
    }

    pub fn set_locale(&mut self, locale: Option<Locale>) {
        if self.locale == locale {
            return;
        }
        self.locale = locale.clone();
        self.subscribers.notify(&StoreEvent::LocaleChanged { locale });
    }

    /// Flags the store as loading. Embedding containers that fetch data
    /// themselves use this to gate dependent reads.
    pub fn set_loading(&mut self, loading: bool) {
        if self.loading == loading {
            return;
        }
        self.loading = loading;
        self.subscribers.notify(&StoreEvent::LoadingChanged { loading });
    }

    fn request(&self, extra: &SaveOptions) -> ResourceRequest {
        let mut options = self.options.clone();
        options.extend(extra.iter().map(|(k, v)| (k.clone(), v.clone())));
        ResourceRequest {
            resource_key: self.resource_key.clone(),
            id: self.id.clone(),
            locale: self.locale.clone(),
            options,
        }
    }

    /// Loads the resource data. A store without an id has nothing to load.
    pub async fn load(&mut self, api: &dyn ResourceApi) -> StoreResult<()> {
        if self.destroyed {
            return Err(StoreError::Destroyed {
                resource_key: self.resource_key.clone(),
            });
        }
        if self.id.is_none() {
            return Ok(());
        }

        self.set_loading(true);
        let result = api.load(&self.request(&SaveOptions::new())).await;
        self.set_loading(false);

        let data = result.map_err(|e| {
            warn!(resource_key = %self.resource_key, id = ?self.id, "Load failed: {}", e);
            StoreError::from(e)
        })?;
        if self.destroyed {
            return Ok(());
        }

        debug!(resource_key = %self.resource_key, id = ?self.id, "Loaded resource");
        self.data = data;
        self.dirty = false;
        self.subscribers.notify(&StoreEvent::DataChanged {
            path: DataPath::root(),
        });
        Ok(())
    }

    /// Saves the full data map and adopts the returned representation as the
    /// new data. On failure data and the dirty flag are kept so the user can
    /// retry without re-entering anything.
    pub async fn save(&mut self, api: &dyn ResourceApi, options: &SaveOptions) -> StoreResult<Value> {
        let payload = self.data.clone();
        self.save_payload(api, options, &payload).await
    }

    /// Like [`save`](Self::save) but sends `payload` instead of the full
    /// data. The returned representation is still adopted as the new data.
    pub async fn save_payload(
        &mut self,
        api: &dyn ResourceApi,
        options: &SaveOptions,
        payload: &Value,
    ) -> StoreResult<Value> {
        if self.destroyed {
            return Err(StoreError::Destroyed {
                resource_key: self.resource_key.clone(),
            });
        }
        if self.loading {
            return Err(StoreError::Loading {
                resource_key: self.resource_key.clone(),
            });
        }

        self.saving = true;
        let result = api.save(&self.request(options), payload).await;
        self.saving = false;

        let saved = result.map_err(|e| {
            warn!(resource_key = %self.resource_key, id = ?self.id, "Save failed: {}", e);
            StoreError::from(e)
        })?;
        if self.destroyed {
            debug!(resource_key = %self.resource_key, "Discarding save result of destroyed store");
            return Ok(saved);
        }

        if self.id.is_none() {
            self.id = saved.get("id").and_then(id_to_string);
        }
        self.data = saved.clone();
        self.dirty = false;
        info!(resource_key = %self.resource_key, id = ?self.id, "Saved resource");
        self.subscribers.notify(&StoreEvent::Saved);
        self.subscribers.notify(&StoreEvent::DataChanged {
            path: DataPath::root(),
        });
        Ok(saved)
    }

    /// Deletes the resource on the backend.
    pub async fn delete(&mut self, api: &dyn ResourceApi) -> StoreResult<()> {
        if self.id.is_none() {
            return Ok(());
        }
        api.delete(&self.request(&SaveOptions::new())).await?;
        info!(resource_key = %self.resource_key, id = ?self.id, "Deleted resource");
        self.id = None;
        Ok(())
    }

    /// Ends the session: notifies observers one last time and drops them.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.subscribers.notify(&StoreEvent::Destroyed);
        self.subscribers.clear();
        self.destroyed = true;
    }
}

fn id_to_string(id: &Value) -> Option<String> {
    match id {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
