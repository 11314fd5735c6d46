//! Local validation of data against a render [`Schema`].

use formwork_types::DataPath;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::schema::{Schema, SchemaEntry};

/// What went wrong with a value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationErrorKind {
    /// A required value is missing or empty.
    Required,
    /// A block item names a type its field does not declare.
    UnknownBlockType { type_key: String },
    /// Field-type specific rejection.
    Invalid { message: String },
}

/// A validation failure located by data path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    pub path: DataPath,
    #[serde(flatten)]
    pub kind: ValidationErrorKind,
}

impl ValidationError {
    pub fn required(path: DataPath) -> Self {
        Self {
            path,
            kind: ValidationErrorKind::Required,
        }
    }

    pub fn invalid(path: DataPath, message: impl Into<String>) -> Self {
        Self {
            path,
            kind: ValidationErrorKind::Invalid {
                message: message.into(),
            },
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ValidationErrorKind::Required => write!(f, "{}: value is required", self.path),
            ValidationErrorKind::UnknownBlockType { type_key } => {
                write!(f, "{}: unknown block type {type_key:?}", self.path)
            }
            ValidationErrorKind::Invalid { message } => write!(f, "{}: {message}", self.path),
        }
    }
}

impl Schema {
    /// Checks `data` against the schema's `required` flags, descending into
    /// sections and into every block item through its variant form.
    #[must_use]
    pub fn validate(&self, data: &Value) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        self.validate_into(&DataPath::root(), data, &mut errors);
        errors
    }

    fn validate_into(&self, prefix: &DataPath, data: &Value, errors: &mut Vec<ValidationError>) {
        for (name, entry) in self {
            if entry.is_section() {
                if let Some(items) = &entry.items {
                    items.validate_into(prefix, data, errors);
                }
                continue;
            }

            let relative = DataPath::parse(name);
            let path = prefix.concat(&relative);
            let value = relative.get(data);
            if entry.required && is_empty(value) {
                errors.push(ValidationError::required(path.clone()));
            }
            if entry.is_block() {
                validate_blocks(entry, &path, value, errors);
            }
        }
    }
}

fn validate_blocks(
    entry: &SchemaEntry,
    path: &DataPath,
    value: Option<&Value>,
    errors: &mut Vec<ValidationError>,
) {
    let Some(Value::Array(items)) = value else {
        return;
    };
    for (index, item) in items.iter().enumerate() {
        let item_path = path.join_index(index);
        match entry.type_schema(item) {
            Some(form) => form.validate_into(&item_path, item, errors),
            None => errors.push(ValidationError {
                path: item_path,
                kind: ValidationErrorKind::UnknownBlockType {
                    type_key: item
                        .get("type")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string(),
                },
            }),
        }
    }
}

/// `null`, missing, blank strings and empty arrays/objects count as empty.
/// `false` and `0` are values.
fn is_empty(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        Some(Value::Object(map)) => map.is_empty(),
        Some(_) => false,
    }
}
