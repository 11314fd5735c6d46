//! Slash-delimited paths into resource data.
//!
//! A path such as `/excerpt/title` or `/blocks/0/title` addresses a value
//! inside a tree of JSON objects and arrays. Segments are escaped the same
//! way JSON pointers are (`~1` for `/`, `~0` for `~`). Numeric segments index
//! arrays.
//!
//! Reads never fail: a missing segment resolves to `None`. Writes create
//! intermediate containers as needed and only fail when they would have to
//! descend through a scalar.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// A parsed data path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DataPath {
    segments: Vec<String>,
}

impl DataPath {
    /// The empty path, addressing the whole data tree.
    #[must_use]
    pub fn root() -> Self {
        Self::default()
    }

    /// Parses a path. Empty segments are ignored, so `"title"`, `"/title"`
    /// and `"/title/"` are the same path.
    #[must_use]
    pub fn parse(path: &str) -> Self {
        let segments = path
            .split('/')
            .filter(|segment| !segment.is_empty())
            .map(unescape)
            .collect();
        Self { segments }
    }

    /// Builds a path from unescaped segments.
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    #[must_use]
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Returns a new path with `segment` appended.
    #[must_use]
    pub fn join(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment.into());
        Self { segments }
    }

    /// Returns a new path with an array index appended.
    #[must_use]
    pub fn join_index(&self, index: usize) -> Self {
        self.join(index.to_string())
    }

    /// Returns `self` followed by every segment of `other`.
    #[must_use]
    pub fn concat(&self, other: &DataPath) -> Self {
        let mut segments = self.segments.clone();
        segments.extend(other.segments.iter().cloned());
        Self { segments }
    }

    /// Returns the parent path, or `None` for the root.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        let (_, parents) = self.segments.split_last()?;
        Some(Self {
            segments: parents.to_vec(),
        })
    }

    /// Returns the final segment.
    #[must_use]
    pub fn last(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    #[must_use]
    pub fn starts_with(&self, prefix: &DataPath) -> bool {
        self.segments.starts_with(&prefix.segments)
    }

    /// Returns the remainder of `self` after `prefix`, if `prefix` matches.
    #[must_use]
    pub fn strip_prefix(&self, prefix: &DataPath) -> Option<Self> {
        self.segments
            .strip_prefix(prefix.segments.as_slice())
            .map(|rest| Self {
                segments: rest.to_vec(),
            })
    }

    /// Resolves the path inside `value`.
    pub fn get<'a>(&self, value: &'a Value) -> Option<&'a Value> {
        self.segments
            .iter()
            .try_fold(value, |current, segment| child(current, segment))
    }

    /// Resolves the path inside `value` for mutation.
    pub fn get_mut<'a>(&self, value: &'a mut Value) -> Option<&'a mut Value> {
        let mut current = value;
        for segment in &self.segments {
            current = match current {
                Value::Object(map) => map.get_mut(segment)?,
                Value::Array(items) => items.get_mut(parse_index(segment)?)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Writes `value` at this path, creating intermediate containers.
    ///
    /// A `null` (or missing) intermediate becomes an array when the segment
    /// addressing it is numeric, an object otherwise. An array index may be
    /// at most the array's length; writing at the length appends.
    pub fn set(&self, target: &mut Value, value: Value) -> crate::Result<()> {
        let Some((last, parents)) = self.segments.split_last() else {
            *target = value;
            return Ok(());
        };

        let mut current = target;
        for segment in parents {
            current = child_or_create(current, segment).ok_or_else(|| self.conflict(segment))?;
        }

        prepare_container(current, last);
        match current {
            Value::Object(map) => {
                map.insert(last.clone(), value);
                Ok(())
            }
            Value::Array(items) => {
                let index = parse_index(last).ok_or_else(|| self.conflict(last))?;
                let len = items.len();
                match items.get_mut(index) {
                    Some(slot) => *slot = value,
                    None if index == len => items.push(value),
                    None => return Err(self.conflict(last)),
                }
                Ok(())
            }
            _ => Err(self.conflict(last)),
        }
    }

    /// Removes and returns the value at this path. Array elements after the
    /// removed one shift down.
    pub fn remove(&self, target: &mut Value) -> Option<Value> {
        let (last, _) = self.segments.split_last()?;
        let parent = self.parent()?.get_mut(target)?;
        match parent {
            Value::Object(map) => map.remove(last),
            Value::Array(items) => {
                let index = parse_index(last)?;
                (index < items.len()).then(|| items.remove(index))
            }
            _ => None,
        }
    }

    fn conflict(&self, segment: &str) -> Error {
        Error::PathConflict {
            path: self.to_string(),
            segment: segment.to_string(),
        }
    }
}

fn child<'a>(value: &'a Value, segment: &str) -> Option<&'a Value> {
    match value {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => items.get(parse_index(segment)?),
        _ => None,
    }
}

fn child_or_create<'a>(value: &'a mut Value, segment: &str) -> Option<&'a mut Value> {
    prepare_container(value, segment);
    match value {
        Value::Object(map) => Some(map.entry(segment.to_string()).or_insert(Value::Null)),
        Value::Array(items) => {
            let index = parse_index(segment)?;
            if index == items.len() {
                items.push(Value::Null);
            }
            items.get_mut(index)
        }
        _ => None,
    }
}

/// Turns a `null` slot into the container kind `segment` needs.
fn prepare_container(value: &mut Value, segment: &str) {
    if value.is_null() {
        *value = if parse_index(segment).is_some() {
            Value::Array(Vec::new())
        } else {
            Value::Object(Map::new())
        };
    }
}

fn parse_index(segment: &str) -> Option<usize> {
    if segment.is_empty() || (segment.len() > 1 && segment.starts_with('0')) {
        return None;
    }
    segment.parse().ok()
}

fn unescape(segment: &str) -> String {
    segment.replace("~1", "/").replace("~0", "~")
}

fn escape(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

impl fmt::Display for DataPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            write!(f, "/{}", escape(segment))?;
        }
        Ok(())
    }
}

impl FromStr for DataPath {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl From<&str> for DataPath {
    fn from(path: &str) -> Self {
        Self::parse(path)
    }
}

impl Serialize for DataPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DataPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}
