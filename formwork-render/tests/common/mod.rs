#![allow(dead_code)]

use async_trait::async_trait;
use formwork_render::{Form, Renderer};
use formwork_schema::Schema;
use formwork_store::{ApiError, FormStore, ResourceApi, ResourceRequest, ResourceStore};
use formwork_types::Locale;
use serde_json::{Value, json};
use std::sync::Mutex;

/// Backend that echoes saved payloads with an id and records them.
#[derive(Default)]
pub struct MockApi {
    pub saved: Mutex<Vec<Value>>,
}

impl MockApi {
    pub fn last_payload(&self) -> Option<Value> {
        self.saved.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl ResourceApi for MockApi {
    async fn load(&self, _request: &ResourceRequest) -> Result<Value, ApiError> {
        Err(ApiError::new("not found").with_status(404))
    }

    async fn save(&self, request: &ResourceRequest, data: &Value) -> Result<Value, ApiError> {
        self.saved.lock().unwrap().push(data.clone());
        let mut saved = data.clone();
        saved["id"] = request.id.clone().map(Value::from).unwrap_or(json!(7));
        Ok(saved)
    }

    async fn delete(&self, _request: &ResourceRequest) -> Result<(), ApiError> {
        Ok(())
    }
}

pub fn locale(code: &str) -> Locale {
    Locale::new(code).unwrap()
}

/// A form over an existing resource holding `data`.
pub fn form(schema: Schema, data: Value) -> Form {
    form_with(schema, data, Renderer::default())
}

pub fn form_with(schema: Schema, data: Value, renderer: Renderer) -> Form {
    let resource = ResourceStore::with_data("pages", Some("1".into()), Some(locale("en")), data);
    Form::new(FormStore::new(resource, schema), renderer)
}
