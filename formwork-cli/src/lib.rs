//! Command implementations for the `formwork` binary.
//!
//! Every command reads JSON files, runs the engine headless and returns a
//! JSON value for the binary to print.

use anyhow::{Context, Result};
use async_trait::async_trait;
use formwork_condition::{ConditionDataProviderRegistry, ConditionEvaluator, ConditionScope};
use formwork_render::{EngineConfig, Form as FormContainer, Renderer};
use formwork_schema::{Form, Schema, TypedForm, ValidationError};
use formwork_store::{ApiError, FormStore, ResourceApi, ResourceRequest, ResourceStore, SaveOptions};
use formwork_types::{DataPath, Locale};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Resource key used for data read from files.
pub const FILE_RESOURCE: &str = "file";

pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let contents = std::fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
    serde_json::from_str(&contents).with_context(|| format!("Failed to parse {:?}", path))
}

/// Reads a render schema. With `metadata` the file holds a metadata form
/// (`{name, items, schema}`) that is converted first; with a `type_key`
/// it holds a typed form whose variant is merged into the base.
pub fn load_schema(path: &Path, metadata: bool, type_key: Option<&str>) -> Result<Schema> {
    if let Some(type_key) = type_key {
        let typed: TypedForm = read_json(path)?;
        let form = typed
            .resolve(Some(type_key))
            .with_context(|| format!("Failed to resolve type {type_key:?}"))?;
        return Ok(form.to_schema());
    }
    if metadata {
        let form: Form = read_json(path)?;
        return Ok(form.to_schema());
    }
    read_json(path)
}

/// Reads the data file, or starts from an empty object.
pub fn load_data(path: Option<&Path>) -> Result<Value> {
    match path {
        Some(path) => read_json(path),
        None => Ok(json!({})),
    }
}

fn open_form(schema: Schema, data: Value, locale: Option<Locale>, config: &EngineConfig) -> FormContainer {
    let locale = locale.or_else(|| config.default_locale.clone());
    let resource = ResourceStore::with_data(FILE_RESOURCE, None, locale, data);
    FormContainer::with_config(FormStore::new(resource, schema), Renderer::default(), config.clone())
}

/// Renders `schema` over `data`: `{views, hidden}`.
pub fn render(schema: Schema, data: Value, locale: Option<Locale>, config: &EngineConfig) -> Result<Value> {
    let mut form = open_form(schema, data, locale, config);
    let rendered = form.render().context("Render failed")?;
    debug!(views = rendered.views.len(), hidden = rendered.hidden.len(), "Rendered");
    Ok(json!({
        "views": rendered.views,
        "hidden": rendered.hidden,
    }))
}

/// Evaluates a condition against `data`, as seen from the object at
/// `scope` (the root unless given).
pub fn eval(expression: &str, data: &Value, scope: Option<&str>, locale: Option<&Locale>) -> Result<bool> {
    let scope = scope.map(DataPath::parse).unwrap_or_default();
    let context = ConditionDataProviderRegistry::with_defaults()
        .build_context(&ConditionScope::new(data, &scope, locale));
    ConditionEvaluator::new()
        .evaluate(expression, &context)
        .with_context(|| format!("Failed to evaluate {expression:?}"))
}

/// Merges a type variant into a base form.
pub fn merge(base: &Form, overlay: &Form) -> Result<Form> {
    base.merge(overlay).context("Merge failed")
}

#[must_use]
pub fn validate(schema: &Schema, data: &Value) -> Vec<ValidationError> {
    schema.validate(data)
}

/// Validates and submits through `api`, honouring the configured hidden
/// value policy. Returns the saved representation.
pub async fn submit(
    schema: Schema,
    data: Value,
    locale: Option<Locale>,
    config: &EngineConfig,
    api: &dyn ResourceApi,
) -> Result<Value> {
    let mut form = open_form(schema, data, locale, config);
    let saved = form
        .submit(api, &SaveOptions::new())
        .await
        .context("Submit failed")?;
    info!("Submitted {} form", FILE_RESOURCE);
    Ok(saved)
}

/// A [`ResourceApi`] backed by one JSON file.
#[derive(Debug, Clone)]
pub struct FileApi {
    path: PathBuf,
}

impl FileApi {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ResourceApi for FileApi {
    async fn load(&self, _request: &ResourceRequest) -> Result<Value, ApiError> {
        let contents = std::fs::read_to_string(&self.path)
            .map_err(|e| ApiError::new(format!("{}: {e}", self.path.display())).with_status(404))?;
        serde_json::from_str(&contents).map_err(|e| ApiError::new(e.to_string()).with_status(500))
    }

    async fn save(&self, _request: &ResourceRequest, data: &Value) -> Result<Value, ApiError> {
        let contents = serde_json::to_string_pretty(data).map_err(|e| ApiError::new(e.to_string()))?;
        std::fs::write(&self.path, contents)
            .map_err(|e| ApiError::new(format!("{}: {e}", self.path.display())).with_status(500))?;
        Ok(data.clone())
    }

    async fn delete(&self, _request: &ResourceRequest) -> Result<(), ApiError> {
        std::fs::remove_file(&self.path)
            .map_err(|e| ApiError::new(format!("{}: {e}", self.path.display())))
    }
}
