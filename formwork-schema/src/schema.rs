use formwork_types::DataPath;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::form::{FieldOption, Tag};

/// Type name marking a schema entry as a section.
pub const SECTION_TYPE: &str = "section";

/// The render schema: an ordered mapping from field name to [`SchemaEntry`].
///
/// Iteration order is declaration order and is meaningful to end users.
/// Field names may contain slashes (`ext/excerpt/title`); the name is then
/// also the data path of the field's value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schema {
    entries: IndexMap<String, SchemaEntry>,
}

/// A single field or section in a [`Schema`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaEntry {
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub space_after: Option<u8>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,
    /// Child entries of a section.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Schema>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub options: IndexMap<String, FieldOption>,
    /// Block variants keyed by type. Non-empty means this is a block field.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub types: IndexMap<String, SchemaType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_type: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible_condition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disabled_condition: Option<String>,
}

/// One variant of a block field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaType {
    pub title: String,
    pub form: Schema,
}

/// A field found by tag, with the data path of its value.
#[derive(Debug, Clone, PartialEq)]
pub struct TaggedField<'a> {
    pub path: DataPath,
    pub entry: &'a SchemaEntry,
    pub priority: Option<i32>,
}

impl Schema {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) an entry, keeping the position of a replaced key.
    pub fn insert(&mut self, name: impl Into<String>, entry: SchemaEntry) {
        self.entries.insert(name.into(), entry);
    }

    /// Builder form of [`Schema::insert`].
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, entry: SchemaEntry) -> Self {
        self.insert(name, entry);
        self
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&SchemaEntry> {
        self.entries.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &SchemaEntry)> {
        self.entries.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Finds a field by name, looking through sections transparently.
    #[must_use]
    pub fn find_field(&self, name: &str) -> Option<&SchemaEntry> {
        self.entries.iter().find_map(|(key, entry)| {
            if entry.is_section() {
                entry.items.as_ref().and_then(|items| items.find_field(name))
            } else if key == name {
                Some(entry)
            } else {
                None
            }
        })
    }

    /// Resolves a data path to the schema entry describing its value.
    ///
    /// Sections do not contribute path segments. Field names containing
    /// slashes are matched against the longest possible path prefix. Inside a
    /// block field the segment after the field is the item index, and the
    /// item's `type` (read from `data`) selects the variant form the rest of
    /// the path is resolved against.
    #[must_use]
    pub fn entry_by_path(&self, path: &DataPath, data: &Value) -> Option<&SchemaEntry> {
        let segments = path.segments();
        let (entry, consumed) = (1..=segments.len()).rev().find_map(|count| {
            let name = segments[..count].join("/");
            self.find_field(&name).map(|entry| (entry, count))
        })?;

        let rest = &segments[consumed..];
        if rest.is_empty() {
            return Some(entry);
        }
        if !entry.is_block() {
            return None;
        }

        let (index, inner) = rest.split_first()?;
        if inner.is_empty() {
            return None;
        }
        let field_path = DataPath::from_segments(segments[..consumed].iter().cloned());
        let item = field_path.join(index.clone()).get(data)?;
        let form = entry.type_schema(item)?;
        form.entry_by_path(&DataPath::from_segments(inner.iter().cloned()), item)
    }

    /// Returns every field carrying `tag`, in declaration order.
    #[must_use]
    pub fn fields_by_tag(&self, tag: &str) -> Vec<TaggedField<'_>> {
        let mut found = Vec::new();
        self.collect_tagged(tag, &mut found);
        found
    }

    fn collect_tagged<'a>(&'a self, tag: &str, found: &mut Vec<TaggedField<'a>>) {
        for (name, entry) in &self.entries {
            if entry.is_section() {
                if let Some(items) = &entry.items {
                    items.collect_tagged(tag, found);
                }
                continue;
            }
            if let Some(matched) = entry.tags.iter().find(|t| t.name == tag) {
                found.push(TaggedField {
                    path: DataPath::parse(name),
                    entry,
                    priority: matched.priority,
                });
            }
        }
    }

    /// Builds an object holding every declared `defaultValue`.
    ///
    /// Block fields without a default start as empty arrays.
    #[must_use]
    pub fn default_values(&self) -> Value {
        let mut data = Value::Object(Map::new());
        self.collect_defaults(&mut data);
        data
    }

    fn collect_defaults(&self, data: &mut Value) {
        for (name, entry) in &self.entries {
            if entry.is_section() {
                if let Some(items) = &entry.items {
                    items.collect_defaults(data);
                }
                continue;
            }
            let default = match (&entry.default_value, entry.is_block()) {
                (Some(value), _) => value.clone(),
                (None, true) => Value::Array(Vec::new()),
                (None, false) => continue,
            };
            // Field names never address through scalars in a well-formed
            // schema; a conflicting default is skipped.
            let _ = DataPath::parse(name).set(data, default);
        }
    }
}

impl<'a> IntoIterator for &'a Schema {
    type Item = (&'a String, &'a SchemaEntry);
    type IntoIter = indexmap::map::Iter<'a, String, SchemaEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl FromIterator<(String, SchemaEntry)> for Schema {
    fn from_iter<I: IntoIterator<Item = (String, SchemaEntry)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl SchemaEntry {
    /// Creates an entry of the given field type.
    pub fn new(field_type: impl Into<String>) -> Self {
        Self {
            field_type: field_type.into(),
            ..Self::default()
        }
    }

    /// Creates a section entry holding `items`.
    #[must_use]
    pub fn section(items: Schema) -> Self {
        Self {
            field_type: SECTION_TYPE.to_string(),
            items: Some(items),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    #[must_use]
    pub fn tag(mut self, name: impl Into<String>, priority: Option<i32>) -> Self {
        self.tags.push(Tag {
            name: name.into(),
            priority,
        });
        self
    }

    #[must_use]
    pub fn option(mut self, option: FieldOption) -> Self {
        self.options.insert(option.name.clone(), option);
        self
    }

    #[must_use]
    pub fn block_type(mut self, key: impl Into<String>, title: impl Into<String>, form: Schema) -> Self {
        let key = key.into();
        if self.default_type.is_none() {
            self.default_type = Some(key.clone());
        }
        self.types.insert(
            key,
            SchemaType {
                title: title.into(),
                form,
            },
        );
        self
    }

    #[must_use]
    pub fn default_value(mut self, value: Value) -> Self {
        self.default_value = Some(value);
        self
    }

    #[must_use]
    pub fn visible_when(mut self, condition: impl Into<String>) -> Self {
        self.visible_condition = Some(condition.into());
        self
    }

    #[must_use]
    pub fn disabled_when(mut self, condition: impl Into<String>) -> Self {
        self.disabled_condition = Some(condition.into());
        self
    }

    #[must_use]
    pub fn is_section(&self) -> bool {
        self.field_type == SECTION_TYPE
    }

    #[must_use]
    pub fn is_block(&self) -> bool {
        !self.types.is_empty()
    }

    /// Returns the option value stored under `name`.
    #[must_use]
    pub fn option_value(&self, name: &str) -> Option<&Value> {
        self.options.get(name).map(|option| &option.value)
    }

    /// Returns the variant form for a block item, falling back to
    /// `defaultType` when the item carries no `type`.
    #[must_use]
    pub fn type_schema(&self, item: &Value) -> Option<&Schema> {
        let type_key = item
            .get("type")
            .and_then(Value::as_str)
            .or(self.default_type.as_deref())?;
        self.types.get(type_key).map(|variant| &variant.form)
    }
}
