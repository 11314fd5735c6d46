//! Metadata cache.
//!
//! Form metadata is fetched once per resource key and locale and then kept
//! for the lifetime of the session. The backend may invalidate out of band;
//! callers drop cached entries with [`MetadataStore::invalidate`].

use async_trait::async_trait;
use formwork_types::Locale;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::error::SchemaResult;
use crate::form::Form;
use crate::schema::Schema;

/// Source of form metadata (usually the backend's metadata endpoint).
#[async_trait]
pub trait MetadataLoader: Send + Sync {
    /// Fetches the form for `resource_key` in `locale`. Must be idempotent.
    async fn load(&self, resource_key: &str, locale: Option<&Locale>) -> SchemaResult<Form>;
}

type CacheKey = (String, Option<Locale>);

/// Caches loaded forms per `(resource_key, locale)`.
pub struct MetadataStore<L> {
    loader: L,
    forms: HashMap<CacheKey, Arc<Form>>,
}

impl<L: MetadataLoader> MetadataStore<L> {
    pub fn new(loader: L) -> Self {
        Self {
            loader,
            forms: HashMap::new(),
        }
    }

    /// Returns the cached form, loading it on first access.
    pub async fn form(&mut self, resource_key: &str, locale: Option<&Locale>) -> SchemaResult<Arc<Form>> {
        let key = (resource_key.to_string(), locale.cloned());
        if let Some(form) = self.forms.get(&key) {
            return Ok(Arc::clone(form));
        }

        debug!(resource_key, ?locale, "Loading form metadata");
        let form = Arc::new(self.loader.load(resource_key, locale).await?);
        self.forms.insert(key, Arc::clone(&form));
        Ok(form)
    }

    /// Returns the render schema of the (cached) form.
    pub async fn schema(&mut self, resource_key: &str, locale: Option<&Locale>) -> SchemaResult<Schema> {
        Ok(self.form(resource_key, locale).await?.to_schema())
    }

    /// Drops every cached locale of `resource_key`.
    pub fn invalidate(&mut self, resource_key: &str) {
        self.forms.retain(|(key, _), _| key != resource_key);
        debug!(resource_key, "Invalidated form metadata");
    }

    /// Drops the whole cache.
    pub fn clear(&mut self) {
        self.forms.clear();
    }

    #[must_use]
    pub fn is_cached(&self, resource_key: &str, locale: Option<&Locale>) -> bool {
        self.forms
            .contains_key(&(resource_key.to_string(), locale.cloned()))
    }
}
