//! Teaser selection: references to records of pluggable providers
//! (pages, articles, ...), shown with data hydrated from a lookup.

use async_trait::async_trait;
use formwork_schema::ValidationError;
use formwork_types::{DataPath, Locale};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::collection::BlockCollection;
use crate::error::{BlockError, BlockResult};
use crate::key::{BlockKey, id_string};

/// One selected reference plus its local overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeaserItem {
    pub id: Value,
    #[serde(rename = "type")]
    pub teaser_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_id: Option<u64>,
}

impl TeaserItem {
    /// A bare reference without overrides.
    pub fn new(teaser_type: impl Into<String>, id: impl Into<Value>) -> Self {
        Self {
            id: id.into(),
            teaser_type: teaser_type.into(),
            title: None,
            description: None,
            media_id: None,
        }
    }

    #[must_use]
    pub fn key(&self) -> BlockKey {
        BlockKey::new(self.teaser_type.clone(), id_string(&self.id).unwrap_or_default())
    }
}

/// The display data of a referenced record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Teaser {
    pub id: String,
    #[serde(rename = "type")]
    pub teaser_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Teaser {
    #[must_use]
    pub fn key(&self) -> BlockKey {
        BlockKey::new(self.teaser_type.clone(), self.id.clone())
    }
}

/// Configuration of a teaser provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeaserProviderConfig {
    pub title: String,
    pub list_adapter: String,
    pub overlay_title: String,
    pub resource_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view: Option<String>,
}

/// The providers a teaser selection can pick from, in registration order.
#[derive(Debug, Clone, Default)]
pub struct TeaserProviderRegistry {
    providers: IndexMap<String, TeaserProviderConfig>,
}

impl TeaserProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) a provider.
    pub fn register(&mut self, key: impl Into<String>, config: TeaserProviderConfig) {
        let key = key.into();
        debug!(provider = %key, "Registered teaser provider");
        self.providers.insert(key, config);
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&TeaserProviderConfig> {
        self.providers.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &TeaserProviderConfig)> {
        self.providers.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

/// Fetches teaser display data from the backend.
#[async_trait]
pub trait TeaserLookup: Send + Sync {
    async fn find(
        &self,
        provider: &str,
        locale: Option<&Locale>,
        ids: &[String],
    ) -> Result<Vec<Teaser>, String>;
}

/// Cache of hydrated teasers, keyed by provider and id.
#[derive(Debug, Default)]
pub struct TeaserStore {
    locale: Option<Locale>,
    teasers: HashMap<BlockKey, Teaser>,
}

impl TeaserStore {
    pub fn new(locale: Option<Locale>) -> Self {
        Self {
            locale,
            teasers: HashMap::new(),
        }
    }

    #[must_use]
    pub fn get(&self, key: &BlockKey) -> Option<&Teaser> {
        self.teasers.get(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.teasers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.teasers.is_empty()
    }

    /// Keys of `items` not hydrated yet, in item order.
    #[must_use]
    pub fn missing(&self, items: &[TeaserItem]) -> Vec<BlockKey> {
        let mut missing: Vec<BlockKey> = Vec::new();
        for key in items.iter().map(TeaserItem::key) {
            if !self.teasers.contains_key(&key) && !missing.contains(&key) {
                missing.push(key);
            }
        }
        missing
    }

    /// Hydrates every missing item with one lookup per provider. Returns how
    /// many teasers were fetched.
    pub async fn load(&mut self, lookup: &dyn TeaserLookup, items: &[TeaserItem]) -> BlockResult<usize> {
        let mut by_provider: IndexMap<String, Vec<String>> = IndexMap::new();
        for key in self.missing(items) {
            by_provider.entry(key.type_key).or_default().push(key.id);
        }

        let mut fetched = 0;
        for (provider, ids) in by_provider {
            let teasers = lookup
                .find(&provider, self.locale.as_ref(), &ids)
                .await
                .map_err(|e| {
                    warn!(provider = %provider, "Teaser lookup failed: {}", e);
                    BlockError::Lookup(e)
                })?;
            debug!(provider = %provider, requested = ids.len(), found = teasers.len(), "Hydrated teasers");
            fetched += teasers.len();
            for teaser in teasers {
                self.teasers.insert(teaser.key(), teaser);
            }
        }
        Ok(fetched)
    }
}

/// A teaser selection field value: `{presentAs, items}`.
#[derive(Debug, Clone, Default)]
pub struct TeaserSelection {
    present_as: Option<String>,
    collection: BlockCollection,
}

impl TeaserSelection {
    /// Reads a field value. A bare array is taken as the item list.
    pub fn from_value(value: &Value) -> BlockResult<Self> {
        let (present_as, items) = match value {
            Value::Object(map) => (
                map.get("presentAs").and_then(Value::as_str).map(str::to_string),
                map.get("items").unwrap_or(&Value::Null),
            ),
            other => (None, other),
        };
        Ok(Self {
            present_as,
            collection: BlockCollection::from_value(None, items)?,
        })
    }

    #[must_use]
    pub fn value(&self) -> Value {
        let mut map = Map::new();
        if let Some(present_as) = &self.present_as {
            map.insert("presentAs".to_string(), json!(present_as));
        }
        map.insert("items".to_string(), self.collection.value());
        Value::Object(map)
    }

    #[must_use]
    pub fn present_as(&self) -> Option<&str> {
        self.present_as.as_deref()
    }

    pub fn set_present_as(&mut self, present_as: Option<String>) {
        self.present_as = present_as;
    }

    #[must_use]
    pub fn collection(&self) -> &BlockCollection {
        &self.collection
    }

    /// The committed items.
    pub fn items(&self) -> BlockResult<Vec<TeaserItem>> {
        self.collection
            .items()
            .map(|(_, item)| serde_json::from_value(item.clone()).map_err(BlockError::from))
            .collect()
    }

    pub fn handle_sorted(&mut self, old_index: usize, new_index: usize) -> BlockResult<()> {
        self.collection.sort(old_index, new_index)
    }

    /// Removes the item identified by `type;id`.
    pub fn handle_remove(&mut self, key: &str) -> BlockResult<()> {
        let key: BlockKey = key.parse()?;
        self.collection.remove(&key)?;
        Ok(())
    }

    /// Starts editing the overrides of the item identified by `type;id`.
    pub fn handle_edit(&mut self, key: &str) -> BlockResult<BlockKey> {
        let key: BlockKey = key.parse()?;
        self.collection.edit(&key)?;
        Ok(key)
    }

    /// Sets an override (`title`, `description`, `mediaId`) in the draft.
    pub fn update_edit(&mut self, key: &BlockKey, name: &str, value: Value) -> BlockResult<()> {
        self.collection.update_draft(key, name, value)
    }

    /// Applies the draft. A draft whose overrides do not read as a teaser
    /// item stays in editing.
    pub fn apply_edit(&mut self, key: &BlockKey) -> BlockResult<()> {
        self.collection.apply(key, |draft| {
            match serde_json::from_value::<TeaserItem>(draft.clone()) {
                Ok(_) => Vec::new(),
                Err(e) => vec![ValidationError::invalid(DataPath::root(), e.to_string())],
            }
        })?;
        Ok(())
    }

    pub fn cancel_edit(&mut self, key: &BlockKey) -> bool {
        self.collection.cancel(key)
    }

    /// Merges a selection made in the overlay of `provider`.
    ///
    /// Items of that provider still selected are kept with their overrides,
    /// newly selected ids are appended as bare references in `ids` order,
    /// and deselected ones are dropped. Other providers' items are untouched.
    pub fn select(&mut self, registry: &TeaserProviderRegistry, provider: &str, ids: &[Value]) -> BlockResult<()> {
        if registry.get(provider).is_none() {
            return Err(BlockError::UnknownProvider {
                provider: provider.to_string(),
            });
        }

        let selected: Vec<String> = ids.iter().filter_map(id_string).collect();
        let deselected: Vec<BlockKey> = self
            .collection
            .keys()
            .filter(|key| key.type_key == provider && !selected.contains(&key.id))
            .cloned()
            .collect();
        for key in &deselected {
            self.collection.remove(key)?;
        }

        let mut added = 0;
        for id in ids {
            let Some(id_key) = id_string(id) else {
                continue;
            };
            if self.collection.get(&BlockKey::new(provider, id_key)).is_none() {
                self.collection.push(json!({"id": id, "type": provider}))?;
                added += 1;
            }
        }
        debug!(provider, added, removed = deselected.len(), "Merged teaser selection");
        Ok(())
    }

    /// Items ready for display: hydrated data with local overrides on top.
    /// Items not hydrated yet show their overrides only.
    pub fn display_items(&self, store: &TeaserStore) -> BlockResult<Vec<Teaser>> {
        Ok(self
            .items()?
            .into_iter()
            .map(|item| {
                let key = item.key();
                let mut teaser = store.get(&key).cloned().unwrap_or_else(|| Teaser {
                    id: key.id.clone(),
                    teaser_type: key.type_key.clone(),
                    ..Teaser::default()
                });
                teaser.title = item.title.or(teaser.title);
                teaser.description = item.description.or(teaser.description);
                teaser.media_id = item.media_id.or(teaser.media_id);
                teaser
            })
            .collect())
    }
}
