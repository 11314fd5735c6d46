//! Built-in field types.

use formwork_blocks::{BlockKey, Schedule, TeaserProviderRegistry, TeaserSelection, schedule_types};
use formwork_schema::{FieldOption, OptionType, SchemaType, ValidationError};
use indexmap::IndexMap;
use serde_json::{Map, Value, json};
use std::rc::Rc;

use crate::error::{RenderError, RenderResult};
use crate::field::{FieldProps, FieldType};
use crate::view::View;

/// Copies plain (non-collection) options into view props.
fn plain_options(props: &FieldProps<'_>) -> Map<String, Value> {
    props
        .entry
        .options
        .values()
        .filter(|option| option.option_type != OptionType::Collection)
        .map(|option| (option.name.clone(), option.value.clone()))
        .collect()
}

/// A widget that edits its value as is (text, dates, numbers, ...).
#[derive(Debug, Clone, Copy)]
pub struct InputField {
    component: &'static str,
}

impl InputField {
    pub const fn new(component: &'static str) -> Self {
        Self { component }
    }
}

impl FieldType for InputField {
    fn render(&self, props: &FieldProps<'_>) -> RenderResult<View> {
        let mut view = View::new(self.component).with_value(props.value.cloned());
        view.props = plain_options(props);
        Ok(view)
    }
}

/// Checkbox and toggler. A missing value renders as `false`.
#[derive(Debug, Clone, Copy)]
pub struct CheckboxField {
    component: &'static str,
}

impl CheckboxField {
    pub const fn new(component: &'static str) -> Self {
        Self { component }
    }
}

impl FieldType for CheckboxField {
    fn render(&self, props: &FieldProps<'_>) -> RenderResult<View> {
        let checked = props.value.and_then(Value::as_bool).unwrap_or(false);
        let mut view = View::new(self.component).with_value(Some(json!(checked)));
        view.props = plain_options(props);
        Ok(view)
    }
}

/// Single and multi select over the `values` collection option.
#[derive(Debug, Clone, Copy)]
pub struct SelectField {
    multiple: bool,
}

impl SelectField {
    pub const fn single() -> Self {
        Self { multiple: false }
    }

    pub const fn multiple() -> Self {
        Self { multiple: true }
    }

    fn component(self) -> &'static str {
        if self.multiple { "select" } else { "single_select" }
    }
}

impl FieldType for SelectField {
    fn render(&self, props: &FieldProps<'_>) -> RenderResult<View> {
        let values = props
            .entry
            .options
            .get("values")
            .ok_or_else(|| RenderError::MissingOption {
                field_type: props.entry.field_type.clone(),
                option: "values".to_string(),
            })?
            .children()?;
        let choices: Vec<Value> = values.iter().map(choice).collect();

        let value = match (props.value, self.multiple) {
            (Some(value), _) => Some(value.clone()),
            (None, true) => Some(json!([])),
            (None, false) => props.entry.option_value("default_value").cloned(),
        };
        Ok(View::new(self.component())
            .with_value(value)
            .with_prop("values", Value::Array(choices)))
    }
}

fn choice(option: &FieldOption) -> Value {
    json!({
        "value": option.value,
        "title": option.title.as_deref().unwrap_or(&option.name),
    })
}

/// A block field. The renderer appends one `block_item` child per item.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockField;

impl FieldType for BlockField {
    fn render(&self, props: &FieldProps<'_>) -> RenderResult<View> {
        let types: Vec<Value> = props
            .entry
            .types
            .iter()
            .map(|(key, variant)| json!({ "key": key, "title": variant.title }))
            .collect();
        Ok(View::new("block")
            .with_prop("types", Value::Array(types))
            .with_prop("defaultType", json!(props.entry.default_type)))
    }
}

/// Fixed and weekly schedules, edited as a block collection.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchedulesField;

impl FieldType for SchedulesField {
    fn render(&self, _props: &FieldProps<'_>) -> RenderResult<View> {
        Ok(View::new("schedules"))
    }

    fn block_types(&self) -> Option<IndexMap<String, SchemaType>> {
        Some(schedule_types())
    }

    fn validate_item(&self, item: &Value) -> Vec<ValidationError> {
        Schedule::validate(item)
    }
}

/// References to records of the registered teaser providers.
///
/// Renders one `teaser_item` child per selected reference. Hydrated titles
/// are not part of the value; front ends resolve them through a
/// [`TeaserStore`](formwork_blocks::TeaserStore).
#[derive(Clone, Default)]
pub struct TeaserSelectionField {
    providers: Rc<TeaserProviderRegistry>,
}

impl TeaserSelectionField {
    pub fn new(providers: Rc<TeaserProviderRegistry>) -> Self {
        Self { providers }
    }
}

impl FieldType for TeaserSelectionField {
    fn render(&self, props: &FieldProps<'_>) -> RenderResult<View> {
        let selection = TeaserSelection::from_value(props.value.unwrap_or(&Value::Null))?;
        let children = selection
            .items()?
            .into_iter()
            .map(|item| {
                let key: BlockKey = item.key();
                let mut view = View::new("teaser_item").with_prop("type", json!(item.teaser_type));
                if let Some(title) = &item.title {
                    view = view.with_prop("title", json!(title));
                }
                if let Some(description) = &item.description {
                    view = view.with_prop("description", json!(description));
                }
                view.block_key = Some(key.to_string());
                view
            })
            .collect();

        let providers: Vec<Value> = self
            .providers
            .iter()
            .map(|(key, config)| json!({ "key": key, "title": config.title }))
            .collect();
        let present_as = props
            .entry
            .options
            .get("present_as")
            .map(FieldOption::children)
            .transpose()?
            .unwrap_or_default();

        let mut view = View::new("teaser_selection")
            .with_value(Some(selection.value()))
            .with_prop("providers", Value::Array(providers))
            .with_children(children);
        if !present_as.is_empty() {
            view = view.with_prop("presentAs", Value::Array(present_as.iter().map(choice).collect()));
        }
        Ok(view)
    }
}
