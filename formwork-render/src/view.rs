//! The render output: a tree of component descriptions.

use formwork_types::DataPath;
use serde::Serialize;
use serde_json::{Map, Value};

/// One rendered node. A front end maps `component` to a widget and feeds
/// it the remaining properties.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct View {
    pub component: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<DataPath>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub disabled: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// `type;id` of the block item this view renders.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_key: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub editing: bool,
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub props: Map<String, Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<View>,
}

impl View {
    pub fn new(component: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_value(mut self, value: Option<Value>) -> Self {
        self.value = value;
        self
    }

    #[must_use]
    pub fn with_prop(mut self, name: impl Into<String>, value: Value) -> Self {
        self.props.insert(name.into(), value);
        self
    }

    #[must_use]
    pub fn with_children(mut self, children: Vec<View>) -> Self {
        self.children = children;
        self
    }

    /// This view and all its descendants, depth first.
    pub fn iter(&self) -> impl Iterator<Item = &View> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let view = stack.pop()?;
            stack.extend(view.children.iter().rev());
            Some(view)
        })
    }

    /// The first view (depth first) rendering the value at `path`.
    #[must_use]
    pub fn find(&self, path: &DataPath) -> Option<&View> {
        self.iter().find(|view| view.path.as_ref() == Some(path))
    }
}
