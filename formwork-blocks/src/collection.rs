//! The generic block collection state machine.

use formwork_schema::{SchemaType, ValidationError};
use formwork_types::{DataPath, new_block_id};
use indexmap::IndexMap;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{BlockError, BlockResult};
use crate::key::{BlockKey, item_type};

/// Whether an item is shown as a summary or edited through a draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockState {
    Idle,
    Editing,
}

#[derive(Debug, Clone)]
struct Entry {
    key: BlockKey,
    value: Value,
    /// The key's id was generated and is not stored in `value`.
    generated: bool,
}

/// An ordered list of typed items plus the drafts of the items being edited.
///
/// Drafts are keyed by [`BlockKey`], so reordering or removing other items
/// while one is being edited cannot redirect its apply to the wrong item.
#[derive(Debug, Clone)]
pub struct BlockCollection {
    default_type: Option<String>,
    assign_ids: bool,
    entries: Vec<Entry>,
    drafts: IndexMap<BlockKey, Value>,
}

impl Default for BlockCollection {
    fn default() -> Self {
        Self::new(None)
    }
}

impl BlockCollection {
    /// Creates an empty collection. Items without a `type` are read as
    /// `default_type`.
    pub fn new(default_type: Option<String>) -> Self {
        Self {
            default_type,
            assign_ids: true,
            entries: Vec::new(),
            drafts: IndexMap::new(),
        }
    }

    /// Whether generated ids are written into item data (the default).
    /// When off, generated ids only live in the collection.
    #[must_use]
    pub fn with_assign_ids(mut self, assign_ids: bool) -> Self {
        self.assign_ids = assign_ids;
        self
    }

    /// Creates a collection holding `value`.
    pub fn from_value(default_type: Option<String>, value: &Value) -> BlockResult<Self> {
        let mut collection = Self::new(default_type);
        collection.sync(value)?;
        Ok(collection)
    }

    /// Re-adopts `value` as the committed list, e.g. after the form data was
    /// reloaded. Drafts whose key is still present survive.
    ///
    /// Returns `true` when ids were generated into the item data, in which
    /// case the caller should write [`value`](Self::value) back.
    pub fn sync(&mut self, value: &Value) -> BlockResult<bool> {
        let items = match value {
            Value::Null => &[][..],
            Value::Array(items) => items.as_slice(),
            _ => return Err(BlockError::NotAList),
        };

        let mut changed = false;
        let mut entries = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            if !item.is_object() {
                return Err(BlockError::InvalidItem { index });
            }
            if let Some(key) = BlockKey::of(item, self.default_type.as_deref()) {
                entries.push(Entry {
                    key,
                    value: item.clone(),
                    generated: false,
                });
                continue;
            }

            let type_key = item_type(item, self.default_type.as_deref())
                .ok_or(BlockError::MissingType { index })?
                .to_string();
            let reused = self
                .entries
                .get(index)
                .filter(|old| old.generated && old.key.type_key == type_key && &old.value == item)
                .map(|old| old.key.id.clone());
            let id = reused.unwrap_or_else(|| new_block_id());

            let mut value = item.clone();
            if self.assign_ids {
                insert(&mut value, "id", Value::String(id.clone()));
                changed = true;
            }
            entries.push(Entry {
                key: BlockKey::new(type_key, id),
                value,
                generated: !self.assign_ids,
            });
        }

        self.entries = entries;
        let entries = &self.entries;
        self.drafts
            .retain(|key, _| entries.iter().any(|entry| &entry.key == key));
        Ok(changed)
    }

    /// The committed list.
    #[must_use]
    pub fn value(&self) -> Value {
        Value::Array(self.entries.iter().map(|entry| entry.value.clone()).collect())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn default_type(&self) -> Option<&str> {
        self.default_type.as_deref()
    }

    /// Committed items in order.
    pub fn items(&self) -> impl Iterator<Item = (&BlockKey, &Value)> {
        self.entries.iter().map(|entry| (&entry.key, &entry.value))
    }

    pub fn keys(&self) -> impl Iterator<Item = &BlockKey> {
        self.entries.iter().map(|entry| &entry.key)
    }

    #[must_use]
    pub fn position(&self, key: &BlockKey) -> Option<usize> {
        self.entries.iter().position(|entry| &entry.key == key)
    }

    #[must_use]
    pub fn get(&self, key: &BlockKey) -> Option<&Value> {
        self.position(key).map(|index| &self.entries[index].value)
    }

    /// The key of the item at `index`.
    #[must_use]
    pub fn key_at(&self, index: usize) -> Option<&BlockKey> {
        self.entries.get(index).map(|entry| &entry.key)
    }

    #[must_use]
    pub fn state(&self, key: &BlockKey) -> Option<BlockState> {
        self.position(key)?;
        Some(if self.drafts.contains_key(key) {
            BlockState::Editing
        } else {
            BlockState::Idle
        })
    }

    #[must_use]
    pub fn is_editing(&self, key: &BlockKey) -> bool {
        self.drafts.contains_key(key)
    }

    /// Keys of the items being edited, in the order editing started.
    pub fn editing(&self) -> impl Iterator<Item = &BlockKey> {
        self.drafts.keys()
    }

    #[must_use]
    pub fn draft(&self, key: &BlockKey) -> Option<&Value> {
        self.drafts.get(key)
    }

    /// The draft while editing, the committed item otherwise.
    #[must_use]
    pub fn current(&self, key: &BlockKey) -> Option<&Value> {
        self.drafts.get(key).or_else(|| self.get(key))
    }

    /// Starts editing: the draft begins as a copy of the item. Editing an
    /// item that already has a draft keeps the draft.
    pub fn edit(&mut self, key: &BlockKey) -> BlockResult<()> {
        let value = self
            .get(key)
            .cloned()
            .ok_or_else(|| BlockError::NotFound(key.clone()))?;
        self.drafts.entry(key.clone()).or_insert(value);
        debug!(block = %key, "Editing block");
        Ok(())
    }

    /// Writes into the draft of an item being edited.
    pub fn update_draft(&mut self, key: &BlockKey, path: &str, value: Value) -> BlockResult<()> {
        let draft = self
            .drafts
            .get_mut(key)
            .ok_or_else(|| BlockError::NotEditing(key.clone()))?;
        DataPath::parse(path).set(draft, value)?;
        Ok(())
    }

    /// Merges the draft back into the item wherever it currently sits.
    ///
    /// `validate` sees the draft; any error keeps the item in editing and is
    /// returned as [`BlockError::Validation`]. Returns the item's key, which
    /// differs from `key` when the draft switched the item's type.
    pub fn apply(
        &mut self,
        key: &BlockKey,
        validate: impl FnOnce(&Value) -> Vec<ValidationError>,
    ) -> BlockResult<BlockKey> {
        let draft = self
            .drafts
            .get(key)
            .ok_or_else(|| BlockError::NotEditing(key.clone()))?;
        let errors = validate(draft);
        if !errors.is_empty() {
            debug!(block = %key, errors = errors.len(), "Block draft rejected");
            return Err(BlockError::Validation(errors));
        }
        let index = self
            .position(key)
            .ok_or_else(|| BlockError::NotFound(key.clone()))?;
        let Some(draft) = self.drafts.shift_remove(key) else {
            return Err(BlockError::NotEditing(key.clone()));
        };

        let entry = &mut self.entries[index];
        let new_key = BlockKey::of(&draft, self.default_type.as_deref()).unwrap_or_else(|| {
            let type_key = item_type(&draft, self.default_type.as_deref()).unwrap_or(&key.type_key);
            BlockKey::new(type_key, key.id.clone())
        });
        entry.key = new_key.clone();
        entry.value = draft;
        debug!(block = %new_key, index, "Applied block draft");
        Ok(new_key)
    }

    /// [`apply`](Self::apply) validating the draft against the form of its
    /// type in `types`.
    pub fn apply_with(&mut self, key: &BlockKey, types: &IndexMap<String, SchemaType>) -> BlockResult<BlockKey> {
        let draft = self
            .drafts
            .get(key)
            .ok_or_else(|| BlockError::NotEditing(key.clone()))?;
        let type_key = item_type(draft, self.default_type.as_deref()).unwrap_or(&key.type_key);
        let variant = types.get(type_key).ok_or_else(|| BlockError::UnknownType {
            type_key: type_key.to_string(),
        })?;
        let errors = variant.form.validate(draft);
        self.apply(key, |_| errors)
    }

    /// Discards the draft. Returns whether there was one.
    pub fn cancel(&mut self, key: &BlockKey) -> bool {
        self.drafts.shift_remove(key).is_some()
    }

    /// Appends a new item of `type_key` filled with the defaults of its form.
    /// The item starts in editing.
    pub fn add(&mut self, type_key: &str, types: &IndexMap<String, SchemaType>) -> BlockResult<BlockKey> {
        let variant = types.get(type_key).ok_or_else(|| BlockError::UnknownType {
            type_key: type_key.to_string(),
        })?;
        let mut item = variant.form.default_values();
        insert(&mut item, "type", Value::String(type_key.to_string()));

        let id = new_block_id();
        if self.assign_ids {
            insert(&mut item, "id", Value::String(id.clone()));
        }
        let key = BlockKey::new(type_key, id);
        self.entries.push(Entry {
            key: key.clone(),
            value: item.clone(),
            generated: !self.assign_ids,
        });
        self.drafts.insert(key.clone(), item);
        debug!(block = %key, "Added block");
        Ok(key)
    }

    /// Appends an existing item as committed and idle.
    pub fn push(&mut self, item: Value) -> BlockResult<BlockKey> {
        let index = self.entries.len();
        if !item.is_object() {
            return Err(BlockError::InvalidItem { index });
        }
        let (key, value, generated) = match BlockKey::of(&item, self.default_type.as_deref()) {
            Some(key) => (key, item, false),
            None => {
                let type_key = item_type(&item, self.default_type.as_deref())
                    .ok_or(BlockError::MissingType { index })?
                    .to_string();
                let id = new_block_id();
                let mut value = item;
                if self.assign_ids {
                    insert(&mut value, "id", Value::String(id.clone()));
                }
                (BlockKey::new(type_key, id), value, !self.assign_ids)
            }
        };
        self.entries.push(Entry {
            key: key.clone(),
            value,
            generated,
        });
        Ok(key)
    }

    /// Removes an item in any state, dropping its draft.
    pub fn remove(&mut self, key: &BlockKey) -> BlockResult<Value> {
        let index = self
            .position(key)
            .ok_or_else(|| BlockError::NotFound(key.clone()))?;
        self.drafts.shift_remove(key);
        debug!(block = %key, index, "Removed block");
        Ok(self.entries.remove(index).value)
    }

    /// Moves the committed item at `old_index` to `new_index`. Drafts are
    /// not touched.
    pub fn sort(&mut self, old_index: usize, new_index: usize) -> BlockResult<()> {
        let len = self.entries.len();
        for index in [old_index, new_index] {
            if index >= len {
                return Err(BlockError::IndexOutOfRange { index, len });
            }
        }
        let entry = self.entries.remove(old_index);
        self.entries.insert(new_index, entry);
        Ok(())
    }
}

fn insert(item: &mut Value, key: &str, value: Value) {
    if !item.is_object() {
        *item = Value::Object(Map::new());
    }
    if let Value::Object(map) = item {
        map.insert(key.to_string(), value);
    }
}
