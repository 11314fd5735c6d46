//! Condition data context and its providers.

use formwork_types::{DataPath, Locale};
use serde_json::{Map, Value};

/// Context key holding the form locale.
pub const LOCALE_KEY: &str = "__locale";
/// Context key holding the enclosing context of a block item.
pub const PARENT_KEY: &str = "__parent";

/// Where a condition is evaluated.
///
/// `path` is the data path of the object the condition's field lives in:
/// the root for top-level fields and fields in sections, `/blocks/0` for a
/// field inside the first item of `blocks`.
#[derive(Debug, Clone, Copy)]
pub struct ConditionScope<'a> {
    pub root: &'a Value,
    pub path: &'a DataPath,
    pub locale: Option<&'a Locale>,
    /// Options of the form's resource.
    pub options: Option<&'a Map<String, Value>>,
    /// Options the form's metadata was requested with.
    pub metadata_options: Option<&'a Map<String, Value>>,
}

impl<'a> ConditionScope<'a> {
    pub fn new(root: &'a Value, path: &'a DataPath, locale: Option<&'a Locale>) -> Self {
        Self {
            root,
            path,
            locale,
            options: None,
            metadata_options: None,
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: &'a Map<String, Value>, metadata_options: &'a Map<String, Value>) -> Self {
        self.options = Some(options);
        self.metadata_options = Some(metadata_options);
        self
    }

    /// The sibling values of the condition's field.
    #[must_use]
    pub fn data(&self) -> Option<&'a Map<String, Value>> {
        self.path.get(self.root).and_then(Value::as_object)
    }

    /// The path of the nearest enclosing block item, or the root when the
    /// scope is a top-level block item. `None` outside of block items.
    #[must_use]
    pub fn parent_path(&self) -> Option<DataPath> {
        if !is_item_path(self.path) {
            return None;
        }
        let segments = self.path.segments();
        let enclosing = segments[..segments.len() - 1]
            .iter()
            .rposition(|segment| is_index(segment))
            .map_or(0, |index| index + 1);
        Some(DataPath::from_segments(segments[..enclosing].iter().cloned()))
    }
}

fn is_index(segment: &str) -> bool {
    !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit())
}

fn is_item_path(path: &DataPath) -> bool {
    path.last().is_some_and(is_index)
}

/// Contributes values to the condition context. Returned keys override
/// keys of the same name from earlier providers.
pub trait ConditionDataProvider {
    fn provide(&self, scope: &ConditionScope<'_>) -> Map<String, Value>;
}

impl<F> ConditionDataProvider for F
where
    F: Fn(&ConditionScope<'_>) -> Map<String, Value>,
{
    fn provide(&self, scope: &ConditionScope<'_>) -> Map<String, Value> {
        self(scope)
    }
}

/// Gives block items access to the data around them as `__parent`,
/// recursively for nested blocks.
#[derive(Debug, Default, Clone, Copy)]
pub struct ParentProvider;

impl ConditionDataProvider for ParentProvider {
    fn provide(&self, scope: &ConditionScope<'_>) -> Map<String, Value> {
        let mut provided = Map::new();
        if let Some(parent) = parent_context(scope) {
            provided.insert(PARENT_KEY.to_string(), parent);
        }
        provided
    }
}

fn parent_context(scope: &ConditionScope<'_>) -> Option<Value> {
    let path = scope.parent_path()?;
    let parent_scope = ConditionScope { path: &path, ..*scope };
    let mut data = parent_scope.data().cloned().unwrap_or_default();
    if let Some(grandparent) = parent_context(&parent_scope) {
        data.insert(PARENT_KEY.to_string(), grandparent);
    }
    Some(Value::Object(data))
}

/// Ordered set of condition data providers.
#[derive(Default)]
pub struct ConditionDataProviderRegistry {
    providers: Vec<Box<dyn ConditionDataProvider>>,
}

impl ConditionDataProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the built-in [`ParentProvider`].
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(ParentProvider);
        registry
    }

    pub fn register(&mut self, provider: impl ConditionDataProvider + 'static) {
        self.providers.push(Box::new(provider));
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Builds the context object: sibling data, then `__locale`, then every
    /// provider's contribution in registration order.
    #[must_use]
    pub fn build_context(&self, scope: &ConditionScope<'_>) -> Value {
        let mut context = scope.data().cloned().unwrap_or_default();
        context.insert(
            LOCALE_KEY.to_string(),
            scope
                .locale
                .map_or(Value::Null, |locale| Value::String(locale.as_str().to_string())),
        );
        for provider in &self.providers {
            context.extend(provider.provide(scope));
        }
        Value::Object(context)
    }
}
