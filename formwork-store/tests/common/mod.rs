#![allow(dead_code)]

use async_trait::async_trait;
use formwork_store::{ApiError, ResourceApi, ResourceRequest};
use serde_json::{Value, json};
use std::sync::Mutex;

/// In-memory backend recording every request.
#[derive(Default)]
pub struct MockApi {
    pub stored: Mutex<Option<Value>>,
    pub fail_save: Mutex<Option<ApiError>>,
    pub requests: Mutex<Vec<(String, ResourceRequest)>>,
}

impl MockApi {
    pub fn with_stored(data: Value) -> Self {
        Self {
            stored: Mutex::new(Some(data)),
            ..Self::default()
        }
    }

    pub fn failing(error: ApiError) -> Self {
        Self {
            fail_save: Mutex::new(Some(error)),
            ..Self::default()
        }
    }

    pub fn calls(&self, kind: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|(k, _)| k == kind)
            .count()
    }

    pub fn last_request(&self) -> Option<ResourceRequest> {
        self.requests.lock().unwrap().last().map(|(_, r)| r.clone())
    }
}

#[async_trait]
impl ResourceApi for MockApi {
    async fn load(&self, request: &ResourceRequest) -> Result<Value, ApiError> {
        self.requests.lock().unwrap().push(("load".into(), request.clone()));
        self.stored
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| ApiError::new("not found").with_status(404))
    }

    async fn save(&self, request: &ResourceRequest, data: &Value) -> Result<Value, ApiError> {
        self.requests.lock().unwrap().push(("save".into(), request.clone()));
        if let Some(error) = self.fail_save.lock().unwrap().clone() {
            return Err(error);
        }
        // Server-computed fields: an id and a change timestamp.
        let mut saved = data.clone();
        saved["id"] = request.id.clone().map(Value::from).unwrap_or(json!(42));
        saved["changed"] = json!("2024-01-01T00:00:00");
        *self.stored.lock().unwrap() = Some(saved.clone());
        Ok(saved)
    }

    async fn delete(&self, request: &ResourceRequest) -> Result<(), ApiError> {
        self.requests.lock().unwrap().push(("delete".into(), request.clone()));
        *self.stored.lock().unwrap() = None;
        Ok(())
    }
}
