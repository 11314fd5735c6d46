//! Block collection state of a form, keyed by the field's data path.

use formwork_blocks::{BlockCollection, BlockKey};
use formwork_types::DataPath;
use serde_json::Value;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use tracing::debug;

use crate::error::RenderResult;

/// The [`BlockCollection`] of every block field seen so far.
///
/// Collections are created on first render or first operation and then
/// kept, so keys generated for items without an id stay stable across
/// renders.
#[derive(Debug, Default)]
pub struct BlockCollections {
    assign_ids: bool,
    collections: HashMap<DataPath, BlockCollection>,
    /// Collections whose generated ids are not in the form data yet.
    pending: Vec<DataPath>,
}

impl BlockCollections {
    pub fn new(assign_ids: bool) -> Self {
        Self {
            assign_ids,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn get(&self, path: &DataPath) -> Option<&BlockCollection> {
        self.collections.get(path)
    }

    pub fn get_mut(&mut self, path: &DataPath) -> Option<&mut BlockCollection> {
        self.collections.get_mut(path)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.collections.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.collections.is_empty()
    }

    /// Returns the collection at `path`, creating it from `value` first if
    /// it is not tracked yet.
    pub fn ensure(
        &mut self,
        path: &DataPath,
        default_type: Option<&str>,
        value: &Value,
    ) -> RenderResult<&mut BlockCollection> {
        match self.collections.entry(path.clone()) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let mut collection =
                    BlockCollection::new(default_type.map(str::to_string)).with_assign_ids(self.assign_ids);
                if collection.sync(value)? {
                    self.pending.push(path.clone());
                }
                debug!(%path, items = collection.len(), "Tracking block collection");
                Ok(entry.insert(collection))
            }
        }
    }

    /// Re-adopts `value` for the collection at `path`, if tracked.
    pub fn sync(&mut self, path: &DataPath, value: &Value) -> RenderResult<()> {
        let Some(collection) = self.collections.get_mut(path) else {
            return Ok(());
        };
        if collection.sync(value)? && !self.pending.contains(path) {
            self.pending.push(path.clone());
        }
        Ok(())
    }

    /// Paths of tracked collections a write at `changed` may have touched:
    /// the collection itself, anything inside it, or anything containing it.
    #[must_use]
    pub fn affected_by(&self, changed: &DataPath) -> Vec<DataPath> {
        let mut paths: Vec<DataPath> = self
            .collections
            .keys()
            .filter(|path| changed.starts_with(path) || path.starts_with(changed))
            .cloned()
            .collect();
        paths.sort();
        paths
    }

    /// Locates `path` inside an item that is being edited. Returns the
    /// collection's path, the item's key and the rest of `path` inside the
    /// item. The outermost editing item wins.
    #[must_use]
    pub fn editing_item(&self, path: &DataPath) -> Option<(DataPath, BlockKey, DataPath)> {
        let mut enclosing: Vec<&DataPath> = self
            .collections
            .keys()
            .filter(|tracked| path.len() > tracked.len() + 1 && path.starts_with(tracked))
            .collect();
        enclosing.sort_by_key(|tracked| tracked.len());
        enclosing.into_iter().find_map(|tracked| {
            let rest = path.strip_prefix(tracked)?;
            let (index, inner) = rest.segments().split_first()?;
            let collection = self.collections.get(tracked)?;
            let key = collection.key_at(index.parse().ok()?)?;
            collection
                .is_editing(key)
                .then(|| (tracked.clone(), key.clone(), DataPath::from_segments(inner.iter().cloned())))
        })
    }

    /// Forgets the collection at `path` and everything nested in it.
    pub fn forget(&mut self, path: &DataPath) {
        self.collections.retain(|tracked, _| !tracked.starts_with(path));
        self.pending.retain(|tracked| !tracked.starts_with(path));
    }

    /// Forgets collections nested below `path` (not `path` itself). Their
    /// index-based paths are stale once the items of `path` move.
    pub fn forget_below(&mut self, path: &DataPath) {
        self.collections
            .retain(|tracked, _| tracked == path || !tracked.starts_with(path));
        self.pending
            .retain(|tracked| tracked == path || !tracked.starts_with(path));
    }

    pub fn clear(&mut self) {
        self.collections.clear();
        self.pending.clear();
    }

    /// Values that carry ids generated since the last call, to be written
    /// back into the form data.
    pub fn take_pending(&mut self) -> Vec<(DataPath, Value)> {
        let pending = std::mem::take(&mut self.pending);
        pending
            .into_iter()
            .filter_map(|path| {
                let value = self.collections.get(&path)?.value();
                Some((path, value))
            })
            .collect()
    }
}
