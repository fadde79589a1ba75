//! Resource fragment discovery and loading
//!
//! A fragment is a partial manifest on disk. Anything the file leaves out
//! that its name can tell us is filled in: `app-deployment.yml` yields a
//! Deployment named `app`, `service.yml` a Service named after the
//! controller. `apiVersion` defaults from the kind table.

use std::path::{Path, PathBuf};

use manifold_core::profile::PROFILE_FILES;
use serde::Deserialize;
use serde_json::Value as JsonValue;

use crate::error::{EngineError, Result};
use crate::resource::{KindInfo, Resource, default_api_version, kind_for_alias};

/// Extensions recognised as manifest files
pub const SUPPORTED_EXTENSIONS: &[&str] = &["yml", "yaml", "json"];

fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
}

pub fn is_supported(path: &Path) -> bool {
    extension_of(path).is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext.as_str()))
}

fn is_profile_file(path: &Path) -> bool {
    path.file_name()
        .is_some_and(|name| PROFILE_FILES.iter().any(|f| name == *f))
}

/// Fragment files directly inside `dir`, sorted by path.
///
/// Profile definition files are skipped and a missing directory yields no
/// fragments.
pub fn list_fragments(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        tracing::debug!(dir = %dir.display(), "resource directory not found, skipping");
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in walkdir::WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if path.is_file() && is_supported(path) && !is_profile_file(path) {
            files.push(path.to_path_buf());
        }
    }

    files.sort();
    Ok(files)
}

/// Subdirectories of `dir` holding per-profile fragments, as
/// `(profile name, path)` sorted by name
pub fn list_profile_dirs(dir: &Path) -> Result<Vec<(String, PathBuf)>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut dirs: Vec<(String, PathBuf)> = walkdir::WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_dir())
        .map(|e| {
            (
                e.file_name().to_string_lossy().to_string(),
                e.path().to_path_buf(),
            )
        })
        .collect();

    dirs.sort();
    Ok(dirs)
}

/// What a fragment's file name says about its content
#[derive(Debug, Clone, Copy)]
struct FileNameHints<'a> {
    name: Option<&'a str>,
    kind: Option<&'static KindInfo>,
}

fn file_name_hints(stem: &str) -> FileNameHints<'_> {
    if let Some(kind) = kind_for_alias(stem) {
        return FileNameHints {
            name: None,
            kind: Some(kind),
        };
    }
    if let Some((name, alias)) = stem.rsplit_once('-') {
        if let Some(kind) = kind_for_alias(alias) {
            return FileNameHints {
                name: Some(name).filter(|n| !n.is_empty()),
                kind: Some(kind),
            };
        }
    }
    FileNameHints {
        name: Some(stem).filter(|n| !n.is_empty()),
        kind: None,
    }
}

fn parse_documents(path: &Path, content: &str, extension: &str) -> Result<Vec<JsonValue>> {
    if extension == "json" {
        return Ok(vec![serde_json::from_str(content)?]);
    }

    let mut documents = Vec::new();
    for document in serde_yaml::Deserializer::from_str(content) {
        let value = JsonValue::deserialize(document).map_err(|e| EngineError::InvalidFragment {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        if !value.is_null() {
            documents.push(value);
        }
    }
    Ok(documents)
}

/// Fill in kind, name and apiVersion
fn complete(
    path: &Path,
    mut value: JsonValue,
    hints: FileNameHints<'_>,
    default_name: &str,
) -> Result<Resource> {
    if !value.is_object() {
        return Err(EngineError::InvalidFragment {
            path: path.display().to_string(),
            message: "expected a mapping at the top level".to_string(),
        });
    }

    let mut resource = Resource::new(value.take());
    if resource.kind().is_empty() {
        let kind = hints.kind.ok_or_else(|| EngineError::UnresolvableKind {
            path: path.display().to_string(),
        })?;
        resource.set_kind(kind.kind);
    }
    if resource.name().is_empty() {
        resource.set_name(hints.name.unwrap_or(default_name));
    }
    if resource.api_version().is_empty() {
        let api_version =
            default_api_version(resource.kind()).ok_or_else(|| EngineError::InvalidFragment {
                path: path.display().to_string(),
                message: format!("no apiVersion given for kind '{}'", resource.kind()),
            })?;
        resource.set_api_version(api_version);
    }
    Ok(resource)
}

/// Read one fragment file into one or more resources.
///
/// Multi-document YAML and `kind: List` wrappers are flattened. Items of a
/// list take their name from the file only when they carry none.
pub fn read_fragment(path: &Path, default_name: &str) -> Result<Vec<Resource>> {
    let extension = extension_of(path).unwrap_or_default();
    if !SUPPORTED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(EngineError::UnsupportedExtension {
            path: path.display().to_string(),
            extension,
            supported: SUPPORTED_EXTENSIONS.join(", "),
        });
    }

    let content = std::fs::read_to_string(path)?;
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let hints = file_name_hints(&stem);

    let mut resources = Vec::new();
    for document in parse_documents(path, &content, &extension)? {
        if document.get("kind").and_then(JsonValue::as_str) == Some("List") {
            let items = match document.get("items") {
                Some(JsonValue::Array(items)) => items.clone(),
                None | Some(JsonValue::Null) => Vec::new(),
                Some(_) => {
                    return Err(EngineError::InvalidFragment {
                        path: path.display().to_string(),
                        message: "'items' of a List must be a sequence".to_string(),
                    });
                }
            };
            let item_hints = FileNameHints {
                name: hints.name,
                kind: None,
            };
            for item in items {
                resources.push(complete(path, item, item_hints, default_name)?);
            }
        } else {
            resources.push(complete(path, document, hints, default_name)?);
        }
    }

    tracing::debug!(path = %path.display(), count = resources.len(), "read resource fragment");
    Ok(resources)
}

/// Turns a fragment location into a readable local file
pub trait FragmentResolver {
    fn resolve(&self, location: &str) -> Result<PathBuf>;
}

/// Resolves plain paths (relative to `base_dir`) and `file://` URLs
#[derive(Debug, Clone)]
pub struct LocalFragmentResolver {
    base_dir: PathBuf,
}

impl LocalFragmentResolver {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    fn failure(location: &str, source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> EngineError {
        EngineError::FragmentResolution {
            location: location.to_string(),
            source: source.into(),
        }
    }
}

impl FragmentResolver for LocalFragmentResolver {
    fn resolve(&self, location: &str) -> Result<PathBuf> {
        let path = if location.contains("://") {
            let url = url::Url::parse(location).map_err(|e| Self::failure(location, e))?;
            if url.scheme() != "file" {
                return Err(Self::failure(
                    location,
                    format!("unsupported scheme '{}', only local files can be read", url.scheme()),
                ));
            }
            url.to_file_path()
                .map_err(|_| Self::failure(location, "not a valid local file URL"))?
        } else {
            self.base_dir.join(location)
        };

        if !path.is_file() {
            return Err(Self::failure(
                location,
                std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("{} does not exist", path.display()),
                ),
            ));
        }
        Ok(path)
    }
}
