//! The schema walk: sections, fields and block items.

use formwork_blocks::{BlockCollection, BlockKey};
use formwork_condition::{ConditionDataProviderRegistry, ConditionEvaluator, ConditionScope};
use formwork_schema::{SECTION_TYPE, Schema, SchemaEntry, SchemaType};
use formwork_store::FormInspector;
use formwork_types::{DataPath, Locale};
use indexmap::IndexMap;
use serde_json::{Value, json};
use std::borrow::Cow;
use tracing::debug;

use crate::collections::BlockCollections;
use crate::error::{RenderError, RenderResult};
use crate::field::FieldProps;
use crate::registry::FieldTypeRegistry;
use crate::view::View;

/// Component name of a rendered block item.
pub const BLOCK_ITEM: &str = "block_item";

/// Per-render inputs besides schema and data.
pub struct RenderContext<'a> {
    pub inspector: FormInspector<'a>,
    pub locale: Option<&'a Locale>,
    pub collections: &'a mut BlockCollections,
}

/// The result of one render pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Rendered {
    /// Top-level views in schema order.
    pub views: Vec<View>,
    /// Data paths of fields hidden by a visibility condition, including
    /// every field inside a hidden section.
    pub hidden: Vec<DataPath>,
}

impl Rendered {
    /// Depth-first over every rendered view.
    pub fn iter(&self) -> impl Iterator<Item = &View> {
        self.views.iter().flat_map(View::iter)
    }

    #[must_use]
    pub fn find(&self, path: &DataPath) -> Option<&View> {
        self.views.iter().find_map(|view| view.find(path))
    }

    #[must_use]
    pub fn is_hidden(&self, path: &DataPath) -> bool {
        self.hidden.iter().any(|hidden| path.starts_with(hidden))
    }
}

/// Turns a schema plus data into a [`View`] tree.
///
/// Visibility and disabled state are re-evaluated on every pass; nothing
/// is cached between renders except compiled condition expressions.
pub struct Renderer {
    fields: FieldTypeRegistry,
    conditions: ConditionEvaluator,
    providers: ConditionDataProviderRegistry,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new(FieldTypeRegistry::with_defaults())
    }
}

impl Renderer {
    /// A renderer with the built-in condition data providers.
    pub fn new(fields: FieldTypeRegistry) -> Self {
        Self::with_providers(fields, ConditionDataProviderRegistry::with_defaults())
    }

    pub fn with_providers(fields: FieldTypeRegistry, providers: ConditionDataProviderRegistry) -> Self {
        Self {
            fields,
            conditions: ConditionEvaluator::new(),
            providers,
        }
    }

    #[must_use]
    pub fn fields(&self) -> &FieldTypeRegistry {
        &self.fields
    }

    pub fn fields_mut(&mut self) -> &mut FieldTypeRegistry {
        &mut self.fields
    }

    pub fn providers_mut(&mut self) -> &mut ConditionDataProviderRegistry {
        &mut self.providers
    }

    #[must_use]
    pub fn conditions(&self) -> &ConditionEvaluator {
        &self.conditions
    }

    /// Renders `schema` over `data`.
    pub fn render(&self, schema: &Schema, data: &Value, ctx: &mut RenderContext<'_>) -> RenderResult<Rendered> {
        let mut hidden = Vec::new();
        let views = self.render_schema(schema, &DataPath::root(), data, false, false, ctx, &mut hidden)?;
        if !hidden.is_empty() {
            debug!(resource_key = ctx.inspector.resource_key(), hidden = hidden.len(), "Rendered with hidden fields");
        }
        Ok(Rendered { views, hidden })
    }

    /// The block variants edited by the field `entry`, from the schema or,
    /// for field types that bring their own, from the field type.
    pub fn block_types<'e>(&self, entry: &'e SchemaEntry) -> RenderResult<Option<Cow<'e, IndexMap<String, SchemaType>>>> {
        if entry.is_block() {
            return Ok(Some(Cow::Borrowed(&entry.types)));
        }
        Ok(self.fields.get(&entry.field_type)?.block_types().map(Cow::Owned))
    }

    /// Walks one schema level. `scope` is the data path of the object the
    /// level's field names resolve against. `in_draft` is set below a block
    /// item that renders from its draft.
    #[allow(clippy::too_many_arguments)]
    fn render_schema(
        &self,
        schema: &Schema,
        scope: &DataPath,
        root: &Value,
        disabled: bool,
        in_draft: bool,
        ctx: &mut RenderContext<'_>,
        hidden: &mut Vec<DataPath>,
    ) -> RenderResult<Vec<View>> {
        let has_conditions = schema
            .iter()
            .any(|(_, entry)| entry.visible_condition.is_some() || entry.disabled_condition.is_some());
        let context = if has_conditions {
            let scope = ConditionScope::new(root, scope, ctx.locale)
                .with_options(ctx.inspector.options(), ctx.inspector.metadata_options());
            self.providers.build_context(&scope)
        } else {
            Value::Null
        };

        let mut views = Vec::with_capacity(schema.len());
        for (name, entry) in schema {
            if !self
                .conditions
                .is_visible(entry.visible_condition.as_deref(), &context)?
            {
                collect_paths(name, entry, scope, hidden);
                continue;
            }
            let disabled = disabled
                || self
                    .conditions
                    .is_disabled(entry.disabled_condition.as_deref(), &context)?;

            if entry.is_section() {
                let children = match &entry.items {
                    Some(items) => self.render_schema(items, scope, root, disabled, in_draft, ctx, hidden)?,
                    None => Vec::new(),
                };
                let mut view = View::new(SECTION_TYPE).with_children(children);
                view.name = Some(name.clone());
                view.label = entry.label.clone();
                view.disabled = disabled;
                views.push(view);
            } else {
                views.push(self.render_field(name, entry, scope, root, disabled, in_draft, ctx, hidden)?);
            }
        }
        Ok(views)
    }

    #[allow(clippy::too_many_arguments)]
    fn render_field(
        &self,
        name: &str,
        entry: &SchemaEntry,
        scope: &DataPath,
        root: &Value,
        disabled: bool,
        in_draft: bool,
        ctx: &mut RenderContext<'_>,
        hidden: &mut Vec<DataPath>,
    ) -> RenderResult<View> {
        let path = scope.concat(&DataPath::parse(name));
        let field_type = self.fields.get(&entry.field_type)?;
        let error = ctx.inspector.error_for(&path);
        let props = FieldProps {
            name,
            path: &path,
            entry,
            value: path.get(root),
            locale: ctx.locale,
            disabled,
            error,
            inspector: ctx.inspector,
        };

        let mut view = field_type.render(&props)?;
        view.name = Some(name.to_string());
        view.label = entry.label.clone();
        view.required = entry.required;
        view.disabled = disabled;
        view.error = error.map(ToString::to_string);

        if let Some(types) = self.block_types(entry)? {
            let items = self.render_items(&path, entry, &types, root, disabled, in_draft, ctx, hidden)?;
            view.children.extend(items);
        }
        view.path = Some(path);
        Ok(view)
    }

    #[allow(clippy::too_many_arguments)]
    fn render_items(
        &self,
        path: &DataPath,
        entry: &SchemaEntry,
        types: &IndexMap<String, SchemaType>,
        root: &Value,
        disabled: bool,
        in_draft: bool,
        ctx: &mut RenderContext<'_>,
        hidden: &mut Vec<DataPath>,
    ) -> RenderResult<Vec<View>> {
        let value = path.get(root).unwrap_or(&Value::Null);
        let default_type = entry.default_type.as_deref();

        // Collections inside a draft are not tracked: their data is not in
        // the form yet.
        let items = if in_draft {
            let mut transient = BlockCollection::new(default_type.map(str::to_string)).with_assign_ids(false);
            transient.sync(value)?;
            snapshot(&transient)
        } else {
            snapshot(ctx.collections.ensure(path, default_type, value)?)
        };

        let mut views = Vec::with_capacity(items.len());
        for (index, (key, item, editing)) in items.into_iter().enumerate() {
            let item_path = path.join_index(index);
            let variant = types
                .get(&key.type_key)
                .ok_or_else(|| RenderError::UnknownBlockType {
                    type_key: key.type_key.clone(),
                    path: item_path.clone(),
                })?;

            let children = if editing && !in_draft {
                let mut patched = root.clone();
                item_path.set(&mut patched, item)?;
                self.render_schema(&variant.form, &item_path, &patched, disabled, true, ctx, hidden)?
            } else {
                self.render_schema(&variant.form, &item_path, root, disabled, in_draft, ctx, hidden)?
            };

            let mut view = View::new(BLOCK_ITEM)
                .with_prop("type", json!(key.type_key))
                .with_prop("title", json!(variant.title))
                .with_children(children);
            view.path = Some(item_path);
            view.block_key = Some(key.to_string());
            view.editing = editing;
            view.disabled = disabled;
            views.push(view);
        }
        Ok(views)
    }
}

/// `(key, current value, editing)` of every item, in order.
fn snapshot(collection: &BlockCollection) -> Vec<(BlockKey, Value, bool)> {
    collection
        .keys()
        .map(|key| {
            let item = collection.current(key).cloned().unwrap_or(Value::Null);
            (key.clone(), item, collection.is_editing(key))
        })
        .collect()
}

/// Collects the data paths of `entry`: itself, or every field inside it
/// when it is a section.
fn collect_paths(name: &str, entry: &SchemaEntry, scope: &DataPath, out: &mut Vec<DataPath>) {
    if !entry.is_section() {
        out.push(scope.concat(&DataPath::parse(name)));
        return;
    }
    if let Some(items) = &entry.items {
        for (child_name, child) in items {
            collect_paths(child_name, child, scope, out);
        }
    }
}
