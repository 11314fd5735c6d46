//! The resource API collaborator.
//!
//! The HTTP layer lives outside this crate; it implements [`ResourceApi`].

use async_trait::async_trait;
use formwork_types::Locale;
use serde_json::{Map, Value};
use thiserror::Error;

/// Options passed along with a save (e.g. `action`, `webspace`).
pub type SaveOptions = Map<String, Value>;

/// Addresses one resource on the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceRequest {
    pub resource_key: String,
    pub id: Option<String>,
    pub locale: Option<Locale>,
    /// Resource options merged with per-call options.
    pub options: Map<String, Value>,
}

/// A failed backend request.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct ApiError {
    pub status: Option<u16>,
    pub message: String,
    /// Error payload returned by the server, if any.
    pub body: Option<Value>,
}

impl ApiError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
            body: None,
        }
    }

    #[must_use]
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }
}

/// CRUD access to backend resources.
#[async_trait]
pub trait ResourceApi: Send + Sync {
    /// Loads the data of an existing resource.
    async fn load(&self, request: &ResourceRequest) -> Result<Value, ApiError>;

    /// Persists the full data map and returns the stored representation,
    /// which may contain server-computed fields.
    async fn save(&self, request: &ResourceRequest, data: &Value) -> Result<Value, ApiError>;

    /// Deletes the resource.
    async fn delete(&self, request: &ResourceRequest) -> Result<(), ApiError>;
}
