//! Flat property namespace supplied by the host build
//!
//! Keys are dotted strings (`manifold.image.ports.1`), values are plain
//! strings. Nested YAML is flattened on load so that
//!
//! ```yaml
//! manifold:
//!   image:
//!     ports: [8080, 9090]
//! ```
//!
//! yields `manifold.image.ports.1=8080` and `manifold.image.ports.2=9090`.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;

use crate::error::{CoreError, Result};

/// Flat string-to-string property map
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Properties(BTreeMap<String, String>);

impl Properties {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Load properties from a file.
    ///
    /// `.yaml`/`.yml`/`.json` files are flattened; anything else is read as
    /// `key=value` lines.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "yaml" | "yml" | "json" => Self::from_yaml(&content),
            _ => Ok(Self::from_properties_str(&content)),
        }
    }

    /// Parse and flatten a YAML (or JSON) document
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let value: JsonValue = serde_yaml::from_str(yaml)?;
        Ok(Self::from_json(&value))
    }

    /// Flatten a structured value into dotted keys
    pub fn from_json(value: &JsonValue) -> Self {
        let mut map = BTreeMap::new();
        flatten_into(&mut map, None, value);
        Self(map)
    }

    /// Parse `key=value` lines. Blank lines and `#`/`!` comments are skipped.
    pub fn from_properties_str(content: &str) -> Self {
        let mut map = BTreeMap::new();
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
                continue;
            }
            let (key, value) = match line.split_once('=').or_else(|| line.split_once(':')) {
                Some((k, v)) => (k.trim(), v.trim()),
                None => (line, ""),
            };
            map.insert(key.to_string(), value.to_string());
        }
        Self(map)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// Overlay another namespace on top of this one; `other` wins
    pub fn merge(&mut self, other: &Properties) {
        for (k, v) in &other.0 {
            self.0.insert(k.clone(), v.clone());
        }
    }

    /// All entries whose key starts with `<prefix>.`, with the prefix stripped
    pub fn with_prefix<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
        self.0.iter().filter_map(move |(k, v)| {
            k.strip_prefix(prefix)
                .and_then(|rest| rest.strip_prefix('.'))
                .map(|rest| (rest, v.as_str()))
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'de> Deserialize<'de> for Properties {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = JsonValue::deserialize(deserializer)?;
        Ok(Self::from_json(&value))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Properties {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

fn flatten_into(map: &mut BTreeMap<String, String>, prefix: Option<&str>, value: &JsonValue) {
    let join = |key: &str| match prefix {
        Some(p) => format!("{}.{}", p, key),
        None => key.to_string(),
    };
    match value {
        JsonValue::Object(obj) => {
            for (k, v) in obj {
                flatten_into(map, Some(&join(k)), v);
            }
        }
        JsonValue::Array(items) => {
            for (idx, v) in items.iter().enumerate() {
                flatten_into(map, Some(&join(&(idx + 1).to_string())), v);
            }
        }
        JsonValue::Null => {}
        JsonValue::String(s) => {
            if let Some(p) = prefix {
                map.insert(p.to_string(), s.clone());
            }
        }
        other => {
            if let Some(p) = prefix {
                map.insert(p.to_string(), other.to_string());
            }
        }
    }
}

/// Parse `-D key=value` arguments
pub fn parse_define_args(args: &[String]) -> Result<Properties> {
    let mut props = Properties::new();
    for arg in args {
        let (key, value) = arg.split_once('=').ok_or_else(|| CoreError::InvalidProperty {
            key: arg.clone(),
            value: String::new(),
            expected: "key=value".to_string(),
        })?;
        props.insert(key.trim(), value);
    }
    Ok(props)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flatten_nested_yaml() {
        let props = Properties::from_yaml(
            r#"
manifold:
  image:
    name: demo
    ports: [8080, 9090]
    healthCheck:
      retries: 3
"#,
        )
        .unwrap();

        assert_eq!(props.get("manifold.image.name"), Some("demo"));
        assert_eq!(props.get("manifold.image.ports.1"), Some("8080"));
        assert_eq!(props.get("manifold.image.ports.2"), Some("9090"));
        assert_eq!(props.get("manifold.image.healthCheck.retries"), Some("3"));
    }

    #[test]
    fn test_properties_format() {
        let props = Properties::from_properties_str(
            "# comment\nmanifold.image.name = demo\n\nserver.port=9000\n",
        );
        assert_eq!(props.get("manifold.image.name"), Some("demo"));
        assert_eq!(props.get("server.port"), Some("9000"));
        assert_eq!(props.len(), 2);
    }

    #[test]
    fn test_with_prefix_strips_separator() {
        let props: Properties = [
            ("manifold.image.name", "a"),
            ("manifold.imagex.name", "b"),
            ("other", "c"),
        ]
        .into_iter()
        .collect();

        let found: Vec<_> = props.with_prefix("manifold.image").collect();
        assert_eq!(found, vec![("name", "a")]);
    }

    #[test]
    fn test_merge_overrides() {
        let mut base: Properties = [("a", "1"), ("b", "2")].into_iter().collect();
        let overlay: Properties = [("b", "3")].into_iter().collect();
        base.merge(&overlay);
        assert_eq!(base.get("a"), Some("1"));
        assert_eq!(base.get("b"), Some("3"));
    }

    #[test]
    fn test_parse_define_args() {
        let props = parse_define_args(&["a.b=c".to_string(), "empty=".to_string()]).unwrap();
        assert_eq!(props.get("a.b"), Some("c"));
        assert_eq!(props.get("empty"), Some(""));
        assert!(parse_define_args(&["novalue".to_string()]).is_err());
    }
}
