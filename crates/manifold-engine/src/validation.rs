//! JSON schema validation of generated resources

use std::collections::HashMap;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value as JsonValue;

use crate::error::{EngineError, Result, ValidationReport};
use crate::resource::Resource;

const RESOURCE_SCHEMA: &str = include_str!("schemas/resource.json");
const DEFAULT_KIND_SCHEMAS: &[(&str, &str)] = &[
    ("deployment", include_str!("schemas/deployment.json")),
    ("service", include_str!("schemas/service.json")),
];

/// Type mismatches on port fields: clusters accept both names and numbers
static PORT_FIELD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/(port|targetPort|containerPort)$").expect("valid regex"));

/// Memory quantities may be written as numbers or strings
static MEMORY_FIELD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/resources/(limits|requests)/memory$").expect("valid regex"));

fn is_ignored(path: &str, message: &str) -> bool {
    (PORT_FIELD.is_match(path) && message.contains("is not of type"))
        || MEMORY_FIELD.is_match(path)
}

fn compile(kind: &str, schema: &JsonValue) -> Result<jsonschema::Validator> {
    jsonschema::validator_for(schema).map_err(|e| EngineError::InvalidSchema {
        kind: kind.to_string(),
        message: e.to_string(),
    })
}

fn format_validation_error(error: &jsonschema::ValidationError) -> String {
    error.to_string().replace('"', "'")
}

/// Validates resources against the common schema plus a per-kind schema
pub struct SchemaValidator {
    common: jsonschema::Validator,
    /// Keyed by lowercase kind
    kinds: HashMap<String, jsonschema::Validator>,
}

impl SchemaValidator {
    /// Validator with the built-in schemas only
    pub fn builtin() -> Result<Self> {
        let common = compile("resource", &serde_json::from_str(RESOURCE_SCHEMA)?)?;
        let mut kinds = HashMap::new();
        for (kind, schema) in DEFAULT_KIND_SCHEMAS {
            kinds.insert(kind.to_string(), compile(kind, &serde_json::from_str(schema)?)?);
        }
        Ok(Self { common, kinds })
    }

    /// Add `<kind>.json` schemas from `dir`; they replace built-ins of the same kind
    pub fn with_schema_dir(mut self, dir: &Path) -> Result<Self> {
        if !dir.is_dir() {
            tracing::debug!(dir = %dir.display(), "schema directory not found");
            return Ok(self);
        }
        for entry in walkdir::WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if !path.is_file() || path.extension().is_none_or(|ext| ext != "json") {
                continue;
            }
            let Some(kind) = path.file_stem().map(|s| s.to_string_lossy().to_lowercase()) else {
                continue;
            };
            let schema: JsonValue = serde_json::from_str(&std::fs::read_to_string(path)?)?;
            let validator = compile(&kind, &schema)?;
            tracing::debug!(kind = %kind, path = %path.display(), "loaded schema");
            self.kinds.insert(kind, validator);
        }
        Ok(self)
    }

    /// Violation messages for one resource, quirks removed
    pub fn violations(&self, resource: &Resource) -> Vec<String> {
        let value = resource.value();
        let kind_validator = self.kinds.get(&resource.kind().to_lowercase());

        let mut messages = Vec::new();
        for validator in std::iter::once(&self.common).chain(kind_validator) {
            if validator.is_valid(value) {
                continue;
            }
            for error in validator.iter_errors(value) {
                let path = error.instance_path.to_string();
                let message = format_validation_error(&error);
                if is_ignored(&path, &message) {
                    continue;
                }
                let path = if path.is_empty() { "(root)".to_string() } else { path };
                messages.push(format!("{}: {}", path, message));
            }
        }
        messages
    }

    /// Validate resources paired with the files they will be written to
    pub fn validate<'a, I>(&self, items: I) -> ValidationReport
    where
        I: IntoIterator<Item = (&'a Resource, &'a str)>,
    {
        let mut report = ValidationReport::new();
        for (resource, file) in items {
            for message in self.violations(resource) {
                report.add(file, message);
            }
        }
        report
    }
}
