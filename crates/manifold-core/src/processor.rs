//! Processor configuration: which generators/enrichers run, in which order,
//! and with which settings

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Include/exclude/order rules plus per-processor settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProcessorConfig {
    /// When present, only these processors run, in this order
    #[serde(skip_serializing_if = "Option::is_none")]
    pub includes: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub excludes: Vec<String>,

    /// Free-form settings keyed by processor name
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub config: BTreeMap<String, BTreeMap<String, JsonValue>>,
}

impl ProcessorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Config that only runs the given processors, in order
    pub fn including<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            includes: Some(names.into_iter().map(Into::into).collect()),
            ..Default::default()
        }
    }

    pub fn with_excludes<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excludes = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_setting(
        mut self,
        processor: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<JsonValue>,
    ) -> Self {
        self.config
            .entry(processor.into())
            .or_default()
            .insert(key.into(), value.into());
        self
    }

    pub fn is_excluded(&self, name: &str) -> bool {
        self.excludes.iter().any(|e| e == name)
    }

    pub fn is_included(&self, name: &str) -> bool {
        let listed = match &self.includes {
            Some(includes) => includes.iter().any(|i| i == name),
            None => true,
        };
        listed && !self.is_excluded(name)
    }

    /// Select and order processors.
    ///
    /// With `includes`, the result follows the include order and silently
    /// drops names with no matching processor. Without, every processor runs
    /// in its given order. Excludes always apply.
    pub fn prepare<'a, T, F>(&self, processors: &'a [T], name_of: F) -> Vec<&'a T>
    where
        F: Fn(&T) -> &str,
    {
        match &self.includes {
            Some(includes) => includes
                .iter()
                .filter(|name| !self.is_excluded(name))
                .filter_map(|name| {
                    let found = processors.iter().find(|p| name_of(p) == name.as_str());
                    if found.is_none() {
                        tracing::debug!(processor = %name, "included processor is not registered, skipping");
                    }
                    found
                })
                .collect(),
            None => processors
                .iter()
                .filter(|p| !self.is_excluded(name_of(p)))
                .collect(),
        }
    }

    /// Raw setting for a processor
    pub fn get(&self, processor: &str, key: &str) -> Option<&JsonValue> {
        self.config.get(processor).and_then(|c| c.get(key))
    }

    /// Setting rendered as a string; scalars only
    pub fn get_string(&self, processor: &str, key: &str) -> Option<String> {
        match self.get(processor, key)? {
            JsonValue::String(s) => Some(s.clone()),
            JsonValue::Number(n) => Some(n.to_string()),
            JsonValue::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// Blend a profile's config with explicit settings; explicit wins.
    ///
    /// Per-processor settings are replaced as a whole, not deep-merged.
    /// Include/exclude lists come from `explicit` when non-empty.
    pub fn blend(profile: &ProcessorConfig, explicit: &ProcessorConfig) -> ProcessorConfig {
        let includes = match &explicit.includes {
            Some(list) if !list.is_empty() => Some(list.clone()),
            _ => profile.includes.clone(),
        };
        let excludes = if explicit.excludes.is_empty() {
            profile.excludes.clone()
        } else {
            explicit.excludes.clone()
        };
        let mut config = profile.config.clone();
        for (name, settings) in &explicit.config {
            config.insert(name.clone(), settings.clone());
        }
        ProcessorConfig {
            includes,
            excludes,
            config,
        }
    }
}
