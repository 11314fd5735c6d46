use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{SchemaError, SchemaResult};
use crate::schema::{Schema, SchemaEntry, SchemaType, SECTION_TYPE};

/// A backend metadata unit describing one form.
///
/// `items` is the ordered layout tree; `schema` is the validation schema
/// the backend applies to submitted data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Form {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub items: IndexMap<String, Item>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<ValidationSchema>,
}

/// A node of the form layout tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Item {
    Field(Field),
    Section(Section),
}

/// A form field. A field with non-empty `types` is a block field: an
/// ordered collection of sub-records, each rendered with one variant form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub space_after: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u8>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub options: IndexMap<String, FieldOption>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub types: IndexMap<String, Form>,
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

/// A layout grouping of items. Sections nest arbitrarily and never
/// contribute a segment to data paths.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub items: IndexMap<String, Item>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disabled_condition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible_condition: Option<String>,
}

/// A tag attached to a field, e.g. `sulu.rlp` with priority 10.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i32>,
}

/// How an option value is interpreted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionType {
    #[default]
    String,
    Collection,
    Expression,
}

/// A named parameter on a field.
///
/// Collection options hold an array of nested options in `value`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldOption {
    pub name: String,
    #[serde(rename = "type", default)]
    pub option_type: OptionType,
    #[serde(default)]
    pub value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl FieldOption {
    /// Shorthand for a plain value option.
    pub fn value(name: impl Into<String>, value: Value) -> Self {
        Self {
            name: name.into(),
            option_type: OptionType::String,
            value,
            title: None,
        }
    }

    /// Shorthand for a collection option.
    pub fn collection(name: impl Into<String>, children: Vec<FieldOption>) -> Self {
        let value = children
            .into_iter()
            .map(|child| serde_json::to_value(child).unwrap_or(Value::Null))
            .collect();
        Self {
            name: name.into(),
            option_type: OptionType::Collection,
            value: Value::Array(value),
            title: None,
        }
    }

    /// Parses the nested options of a collection option.
    pub fn children(&self) -> SchemaResult<Vec<FieldOption>> {
        match &self.value {
            Value::Array(_) => Ok(serde_json::from_value(self.value.clone())?),
            _ => Ok(Vec::new()),
        }
    }
}

/// JSON-schema subset used to validate submitted data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationSchema {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub properties: IndexMap<String, ValidationSchema>,
    #[serde(rename = "anyOf", default, skip_serializing_if = "Vec::is_empty")]
    pub any_of: Vec<ValidationSchema>,
    #[serde(rename = "allOf", default, skip_serializing_if = "Vec::is_empty")]
    pub all_of: Vec<ValidationSchema>,
}

impl ValidationSchema {
    /// Structural merge. `required` is an ordered union, properties merge
    /// recursively key by key, `anyOf`/`allOf` concatenate.
    #[must_use]
    pub fn merge(&self, other: &ValidationSchema) -> ValidationSchema {
        let mut required = self.required.clone();
        for name in &other.required {
            if !required.contains(name) {
                required.push(name.clone());
            }
        }

        let mut properties = self.properties.clone();
        for (name, property) in &other.properties {
            let merged = match properties.get(name) {
                Some(existing) => existing.merge(property),
                None => property.clone(),
            };
            properties.insert(name.clone(), merged);
        }

        ValidationSchema {
            schema_type: self.schema_type.clone().or_else(|| other.schema_type.clone()),
            required,
            properties,
            any_of: self.any_of.iter().chain(&other.any_of).cloned().collect(),
            all_of: self.all_of.iter().chain(&other.all_of).cloned().collect(),
        }
    }
}

impl Form {
    /// Creates an empty form with an empty validation schema.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            title: None,
            items: IndexMap::new(),
            schema: Some(ValidationSchema::default()),
        }
    }

    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn field(mut self, field: Field) -> Self {
        self.items.insert(field.name.clone(), Item::Field(field));
        self
    }

    #[must_use]
    pub fn section(mut self, section: Section) -> Self {
        self.items.insert(section.name.clone(), Item::Section(section));
        self
    }

    /// Combines this form (the base type) with `overlay` (a type variant).
    ///
    /// Name and title come from `self` only. Items present in both take the
    /// overlay's item at the base's position; overlay-only items follow the
    /// base items. Validation schemas merge recursively. A base without a
    /// validation schema is rejected.
    pub fn merge(&self, overlay: &Form) -> SchemaResult<Form> {
        let base_schema = self
            .schema
            .as_ref()
            .ok_or_else(|| SchemaError::MissingValidationSchema {
                form: self.name.clone(),
            })?;
        let schema = match &overlay.schema {
            Some(overlay_schema) => base_schema.merge(overlay_schema),
            None => base_schema.clone(),
        };

        let mut items = self.items.clone();
        for (key, item) in &overlay.items {
            items.insert(key.clone(), item.clone());
        }

        Ok(Form {
            name: self.name.clone(),
            title: self.title.clone(),
            items,
            schema: Some(schema),
        })
    }

    /// Converts the metadata tree into the render schema.
    ///
    /// Fields listed in the validation schema's `required` are marked
    /// required even when the field itself is not.
    #[must_use]
    pub fn to_schema(&self) -> Schema {
        let required: &[String] = self
            .schema
            .as_ref()
            .map(|schema| schema.required.as_slice())
            .unwrap_or_default();
        items_to_schema(&self.items, required)
    }
}

fn items_to_schema(items: &IndexMap<String, Item>, required: &[String]) -> Schema {
    items
        .iter()
        .map(|(key, item)| {
            let entry = match item {
                Item::Field(field) => {
                    let mut entry = field.to_entry();
                    entry.required |= required.contains(key);
                    entry
                }
                Item::Section(section) => SchemaEntry {
                    field_type: SECTION_TYPE.to_string(),
                    label: section.label.clone(),
                    size: section.size,
                    items: Some(items_to_schema(&section.items, required)),
                    visible_condition: section.visible_condition.clone(),
                    disabled_condition: section.disabled_condition.clone(),
                    ..SchemaEntry::default()
                },
            };
            (key.clone(), entry)
        })
        .collect()
}

impl Field {
    pub fn new(name: impl Into<String>, field_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field_type: field_type.into(),
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

    /// Adds a block variant. The first variant added becomes the default.
    #[must_use]
    pub fn with_type(mut self, key: impl Into<String>, form: Form) -> Self {
        let key = key.into();
        if self.default_type.is_none() {
            self.default_type = Some(key.clone());
        }
        self.types.insert(key, form);
        self
    }

    #[must_use]
    pub fn is_block(&self) -> bool {
        !self.types.is_empty()
    }

    fn to_entry(&self) -> SchemaEntry {
        let types = self
            .types
            .iter()
            .map(|(key, form)| {
                let variant = SchemaType {
                    title: form.title.clone().unwrap_or_else(|| key.clone()),
                    form: form.to_schema(),
                };
                (key.clone(), variant)
            })
            .collect();

        SchemaEntry {
            field_type: self.field_type.clone(),
            label: self.label.clone(),
            description: self.description.clone(),
            size: self.size,
            space_after: self.space_after,
            required: self.required,
            items: None,
            options: self.options.clone(),
            types,
            default_type: self.default_type.clone(),
            tags: self.tags.clone(),
            default_value: self.default_value.clone(),
            visible_condition: self.visible_condition.clone(),
            disabled_condition: self.disabled_condition.clone(),
        }
    }
}

impl Section {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    #[must_use]
    pub fn item(mut self, item: Item) -> Self {
        let key = match &item {
            Item::Field(field) => field.name.clone(),
            Item::Section(section) => section.name.clone(),
        };
        self.items.insert(key, item);
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
}

/// A base form plus named type variants (page templates, block types of a
/// top-level resource). Resolving a type merges the variant over the base.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypedForm {
    pub base: Form,
    #[serde(default)]
    pub types: IndexMap<String, Form>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_type: Option<String>,
}

impl TypedForm {
    /// Returns the base form merged with the variant `type_key`
    /// (or the default type when `None`).
    pub fn resolve(&self, type_key: Option<&str>) -> SchemaResult<Form> {
        let Some(type_key) = type_key.or(self.default_type.as_deref()) else {
            return Ok(self.base.clone());
        };
        let variant = self
            .types
            .get(type_key)
            .ok_or_else(|| SchemaError::UnknownType {
                type_key: type_key.to_string(),
            })?;
        self.base.merge(variant)
    }
}
