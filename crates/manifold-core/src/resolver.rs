//! Property config resolution
//!
//! Every resolvable configuration type declares an explicit table of
//! [`PropertyField`]s. Each entry maps a property key (relative to the
//! type's prefix) onto a dotted path inside the serialized configuration
//! and says how a matching property combines with the value already there:
//!
//! - scalars are replaced when a property is present, kept otherwise
//! - lists use the indexed convention `<key>.1`, `<key>.2`, ... and the
//!   field's [`CombinePolicy`], overridable per resolution with
//!   `<key>._combine=replace|merge`
//! - maps use the suffix convention `<key>.<entry>`; entries are only
//!   ever added or overwritten, never removed
//!
//! Resolution works on a serialized copy and deserializes a fresh value,
//! so the input configuration is never mutated.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value as JsonValue};

use crate::combine::CombinePolicy;
use crate::error::{CoreError, Result};
use crate::properties::Properties;

/// Suffix used to override a list field's combine policy
pub const COMBINE_SUFFIX: &str = "_combine";

/// Scalar value types understood by the resolver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    String,
    Integer,
    Boolean,
}

/// Field kind plus its merge behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Scalar(ValueType),
    List(CombinePolicy),
    Map,
}

/// One row of a configuration type's property table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyField {
    /// Property key relative to the prefix
    pub key: &'static str,
    /// Dotted path inside the serialized configuration
    pub path: &'static str,
    pub kind: FieldKind,
}

impl PropertyField {
    pub const fn scalar(key: &'static str, path: &'static str) -> Self {
        Self {
            key,
            path,
            kind: FieldKind::Scalar(ValueType::String),
        }
    }

    pub const fn integer(key: &'static str, path: &'static str) -> Self {
        Self {
            key,
            path,
            kind: FieldKind::Scalar(ValueType::Integer),
        }
    }

    pub const fn boolean(key: &'static str, path: &'static str) -> Self {
        Self {
            key,
            path,
            kind: FieldKind::Scalar(ValueType::Boolean),
        }
    }

    pub const fn list(key: &'static str, path: &'static str, policy: CombinePolicy) -> Self {
        Self {
            key,
            path,
            kind: FieldKind::List(policy),
        }
    }

    pub const fn map(key: &'static str, path: &'static str) -> Self {
        Self {
            key,
            path,
            kind: FieldKind::Map,
        }
    }

    /// Declared default policy for list fields
    pub fn policy(&self) -> Option<CombinePolicy> {
        match self.kind {
            FieldKind::List(policy) => Some(policy),
            _ => None,
        }
    }
}

/// A configuration type that can be resolved from a [`Properties`] namespace
pub trait PropertyResolvable: Serialize + DeserializeOwned {
    /// Prefix used when the instance does not carry its own
    const DEFAULT_PREFIX: &'static str;

    /// The explicit field table for this type
    fn property_fields() -> &'static [PropertyField];

    /// Per-instance prefix override
    fn property_prefix(&self) -> Option<&str> {
        None
    }

    /// Find a field row by property key
    fn property_field(key: &str) -> Option<&'static PropertyField> {
        Self::property_fields().iter().find(|f| f.key == key)
    }
}

/// Resolve a configuration against a property namespace, returning a new value.
///
/// When the configuration carries a prefix override, only that prefix is
/// consulted.
pub fn resolve<T: PropertyResolvable>(config: &T, properties: &Properties) -> Result<T> {
    let prefix = config
        .property_prefix()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .unwrap_or(T::DEFAULT_PREFIX)
        .to_string();

    let mut value = serde_json::to_value(config)?;

    for field in T::property_fields() {
        let key = format!("{}.{}", prefix, field.key);
        match field.kind {
            FieldKind::Scalar(value_type) => {
                if let Some(raw) = properties.get(&key) {
                    let typed = convert_scalar(&key, raw, value_type)?;
                    set_path(&mut value, field.path, typed);
                }
            }
            FieldKind::List(default_policy) => {
                let resolved = indexed_entries(properties, &key);
                if resolved.is_empty() {
                    continue;
                }
                let policy = match properties.get(&format!("{}.{}", key, COMBINE_SUFFIX)) {
                    Some(token) => CombinePolicy::parse(token)?,
                    None => default_policy,
                };
                let existing: Vec<String> = get_path(&value, field.path)
                    .and_then(JsonValue::as_array)
                    .map(|items| items.iter().filter_map(scalar_to_string).collect())
                    .unwrap_or_default();
                let combined = policy.combine_list(&existing, resolved);
                set_path(
                    &mut value,
                    field.path,
                    JsonValue::Array(combined.into_iter().map(JsonValue::String).collect()),
                );
            }
            FieldKind::Map => {
                let entries: Vec<(String, String)> = properties
                    .with_prefix(&key)
                    .filter(|(k, _)| !k.is_empty() && *k != COMBINE_SUFFIX)
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect();
                if entries.is_empty() {
                    continue;
                }
                let mut map = match get_path(&value, field.path) {
                    Some(JsonValue::Object(existing)) => existing.clone(),
                    _ => Map::new(),
                };
                for (k, v) in entries {
                    map.insert(k, JsonValue::String(v));
                }
                set_path(&mut value, field.path, JsonValue::Object(map));
            }
        }
    }

    Ok(serde_json::from_value(value)?)
}

/// Collect `<key>.N` entries ordered by index; non-numeric suffixes are ignored
fn indexed_entries(properties: &Properties, key: &str) -> Vec<String> {
    let mut entries: Vec<(u32, String)> = properties
        .with_prefix(key)
        .filter_map(|(suffix, v)| suffix.parse::<u32>().ok().map(|idx| (idx, v.to_string())))
        .collect();
    entries.sort_by_key(|(idx, _)| *idx);
    entries.into_iter().map(|(_, v)| v).collect()
}

fn convert_scalar(key: &str, raw: &str, value_type: ValueType) -> Result<JsonValue> {
    let invalid = |expected: &str| CoreError::InvalidProperty {
        key: key.to_string(),
        value: raw.to_string(),
        expected: expected.to_string(),
    };
    match value_type {
        ValueType::String => Ok(JsonValue::String(raw.to_string())),
        ValueType::Integer => raw
            .trim()
            .parse::<i64>()
            .map(|n| JsonValue::Number(n.into()))
            .map_err(|_| invalid("an integer")),
        ValueType::Boolean => match raw.trim().to_ascii_lowercase().as_str() {
            "true" => Ok(JsonValue::Bool(true)),
            "false" => Ok(JsonValue::Bool(false)),
            _ => Err(invalid("true or false")),
        },
    }
}

fn scalar_to_string(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Null => None,
        other => Some(other.to_string()),
    }
}

/// Get a nested value by dotted path
pub(crate) fn get_path<'a>(value: &'a JsonValue, path: &str) -> Option<&'a JsonValue> {
    path.split('.')
        .try_fold(value, |current, key| current.as_object()?.get(key))
}

/// Set a nested value by dotted path, creating intermediate objects
pub(crate) fn set_path(value: &mut JsonValue, path: &str, new_value: JsonValue) {
    let mut current = value;
    let mut parts = path.split('.').peekable();
    while let Some(key) = parts.next() {
        if !current.is_object() {
            *current = JsonValue::Object(Map::new());
        }
        let JsonValue::Object(map) = current else {
            return;
        };
        if parts.peek().is_none() {
            map.insert(key.to_string(), new_value);
            return;
        }
        current = map
            .entry(key.to_string())
            .or_insert_with(|| JsonValue::Object(Map::new()));
    }
}
