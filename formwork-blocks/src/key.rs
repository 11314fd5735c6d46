use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::error::BlockError;

/// Identity of a block item: its `type` plus its `id`.
///
/// The string form is `type;id` (e.g. `pages;1`). Numeric ids compare equal
/// to their decimal string, so `{"id": 1}` and `{"id": "1"}` share a key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockKey {
    pub type_key: String,
    pub id: String,
}

impl BlockKey {
    pub fn new(type_key: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            type_key: type_key.into(),
            id: id.into(),
        }
    }

    /// Reads the key of `item`. `default_type` stands in for a missing
    /// `type`. Returns `None` when the item has no usable id.
    #[must_use]
    pub fn of(item: &Value, default_type: Option<&str>) -> Option<Self> {
        let type_key = item_type(item, default_type)?;
        let id = id_string(item.get("id")?)?;
        Some(Self::new(type_key, id))
    }
}

pub(crate) fn item_type<'a>(item: &'a Value, default_type: Option<&'a str>) -> Option<&'a str> {
    item.get("type").and_then(Value::as_str).or(default_type)
}

pub(crate) fn id_string(id: &Value) -> Option<String> {
    match id {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

impl fmt::Display for BlockKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{};{}", self.type_key, self.id)
    }
}

impl FromStr for BlockKey {
    type Err = BlockError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(';') {
            Some((type_key, id)) if !type_key.is_empty() && !id.is_empty() => {
                Ok(Self::new(type_key, id))
            }
            _ => Err(BlockError::InvalidKey(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_and_display() {
        let key: BlockKey = "pages;1".parse().unwrap();
        assert_eq!(key, BlockKey::new("pages", "1"));
        assert_eq!(key.to_string(), "pages;1");
    }

    #[test]
    fn test_invalid_keys() {
        for s in ["pages", ";1", "pages;", ""] {
            assert!(s.parse::<BlockKey>().is_err(), "{s:?} should not parse");
        }
    }

    #[test]
    fn test_numeric_and_string_ids_match() {
        let a = BlockKey::of(&json!({"type": "pages", "id": 1}), None);
        let b = BlockKey::of(&json!({"type": "pages", "id": "1"}), None);
        assert_eq!(a, b);
    }

    #[test]
    fn test_default_type() {
        let key = BlockKey::of(&json!({"id": "x"}), Some("text")).unwrap();
        assert_eq!(key.type_key, "text");
        assert!(BlockKey::of(&json!({"id": "x"}), None).is_none());
        assert!(BlockKey::of(&json!({"type": "text"}), None).is_none());
    }
}
