//! Manifest output
//!
//! One composite `kind: List` file named after the classifier, plus one
//! file per item named `<name>-<kind suffix>`. A list holding a single
//! `Template` is written per item from the template's objects.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use manifold_core::ResourceFileType;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::error::Result;
use crate::resource::{Resource, ResourceList, file_suffix};

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("valid regex"));

/// Serialize in the requested format
pub fn serialize<T: Serialize>(value: &T, file_type: ResourceFileType) -> Result<String> {
    Ok(match file_type {
        ResourceFileType::Yaml => serde_yaml::to_string(value)?,
        ResourceFileType::Json => {
            let mut text = serde_json::to_string_pretty(value)?;
            text.push('\n');
            text
        }
    })
}

/// Items as written to individual files
pub fn output_items(resources: &ResourceList) -> Vec<Resource> {
    match resources.singleton_template() {
        Some(template) => match template.get("/objects") {
            Some(JsonValue::Array(objects)) => objects.iter().cloned().map(Resource::new).collect(),
            _ => Vec::new(),
        },
        None => resources.items().to_vec(),
    }
}

/// File names for `items`, unique within the call.
///
/// Collisions get `-1`, `-2`, ... appended before the extension.
pub fn item_file_names(items: &[Resource], file_type: ResourceFileType) -> Vec<String> {
    let mut taken = HashSet::new();
    items
        .iter()
        .map(|item| {
            let suffix = file_suffix(item.kind());
            let base = match item.name() {
                "" => suffix.to_string(),
                name => format!("{}-{}", name, suffix),
            };
            let mut stem = base.clone();
            let mut n = 1;
            while !taken.insert(stem.to_lowercase()) {
                stem = format!("{}-{}", base, n);
                n += 1;
            }
            format!("{}.{}", stem, file_type.extension())
        })
        .collect()
}

/// Template parameters with a non-blank value, as `(name, value)`
fn template_parameters(template: &Resource) -> Vec<(String, String)> {
    let Some(JsonValue::Array(parameters)) = template.get("/parameters") else {
        return Vec::new();
    };
    parameters
        .iter()
        .filter_map(|p| {
            let name = p.get("name")?.as_str()?;
            let value = match p.get("value")? {
                JsonValue::String(s) => s.clone(),
                JsonValue::Null => return None,
                other => other.to_string(),
            };
            (!value.trim().is_empty()).then(|| (name.to_string(), value))
        })
        .collect()
}

/// Replace `${NAME}` for each template parameter with a value; unknown
/// placeholders are kept
pub fn interpolate_template_parameters(text: &str, template: &Resource) -> String {
    let parameters = template_parameters(template);
    if parameters.is_empty() {
        return text.to_string();
    }
    PLACEHOLDER
        .replace_all(text, |caps: &Captures<'_>| {
            parameters
                .iter()
                .find(|(name, _)| name == &caps[1])
                .map(|(_, value)| value.clone())
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Writes resource lists below a target directory
#[derive(Debug, Clone)]
pub struct ResourceWriter {
    target_dir: PathBuf,
    file_type: ResourceFileType,
    interpolate: bool,
}

impl ResourceWriter {
    pub fn new(target_dir: impl Into<PathBuf>, file_type: ResourceFileType) -> Self {
        Self {
            target_dir: target_dir.into(),
            file_type,
            interpolate: true,
        }
    }

    pub fn with_interpolation(mut self, interpolate: bool) -> Self {
        self.interpolate = interpolate;
        self
    }

    pub fn target_dir(&self) -> &Path {
        &self.target_dir
    }

    /// The composite manifest as text, with template parameters interpolated
    pub fn render(&self, resources: &ResourceList) -> Result<String> {
        let mut composite = serialize(&resources.to_list_value(), self.file_type)?;
        if self.interpolate {
            if let Some(template) = resources.singleton_template() {
                composite = interpolate_template_parameters(&composite, template);
            }
        }
        Ok(composite)
    }

    /// Write the composite and individual files; returns the composite path
    pub fn write(&self, resources: &ResourceList, classifier: &str) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.target_dir)?;

        let items = output_items(resources);
        for (item, file_name) in items.iter().zip(item_file_names(&items, self.file_type)) {
            let path = self.target_dir.join(file_name);
            std::fs::write(&path, serialize(item, self.file_type)?)?;
            tracing::debug!(path = %path.display(), "wrote resource");
        }

        let composite = self.render(resources)?;
        let path = self
            .target_dir
            .join(format!("{}.{}", classifier, self.file_type.extension()));
        std::fs::write(&path, composite)?;
        tracing::debug!(path = %path.display(), count = items.len(), "wrote composite manifest");
        Ok(path)
    }
}
