//! Project descriptor (`manifold.yaml`) and the project context handed to
//! generators and enrichers

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::image::{ImageConfiguration, ImageNameFormatter};
use crate::platform::{BuildStrategy, ResourceFileType};
use crate::processor::ProcessorConfig;
use crate::properties::Properties;
use crate::resource_config::ResourceConfig;

pub const API_VERSION: &str = "manifold/v1";
pub const DESCRIPTOR_FILE: &str = "manifold.yaml";
pub const DEFAULT_RESOURCE_DIR: &str = "manifold";
pub const DEFAULT_TARGET_DIR: &str = "target/manifold";

/// A declared project dependency
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Dependency {
    pub group_id: String,
    pub artifact_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// Project coordinates and metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProjectInfo {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
    pub packaging: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<Dependency>,
}

impl Default for ProjectInfo {
    fn default() -> Self {
        Self {
            group_id: "example".to_string(),
            artifact_id: "app".to_string(),
            version: "0.0.1-SNAPSHOT".to_string(),
            packaging: "jar".to_string(),
            name: None,
            description: None,
            url: None,
            dependencies: Vec::new(),
        }
    }
}

/// Contents of `manifold.yaml`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProjectDescriptor {
    pub api_version: String,
    pub project: ProjectInfo,
    pub images: Vec<ImageConfiguration>,
    pub resources: ResourceConfig,
    pub generator: ProcessorConfig,
    pub enricher: ProcessorConfig,
    pub profile: Option<String>,
    pub resource_dirs: Vec<PathBuf>,
    pub remote_fragments: Vec<String>,
    pub properties: Properties,
    pub image_filter: Vec<String>,
    pub build_strategy: BuildStrategy,
    pub resource_file_type: ResourceFileType,
    pub interpolate_template_parameters: bool,
    pub validate: bool,
    pub schema_dir: Option<PathBuf>,
    pub target_dir: Option<PathBuf>,
}

impl Default for ProjectDescriptor {
    fn default() -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            project: ProjectInfo::default(),
            images: Vec::new(),
            resources: ResourceConfig::default(),
            generator: ProcessorConfig::default(),
            enricher: ProcessorConfig::default(),
            profile: None,
            resource_dirs: vec![PathBuf::from(DEFAULT_RESOURCE_DIR)],
            remote_fragments: Vec::new(),
            properties: Properties::new(),
            image_filter: Vec::new(),
            build_strategy: BuildStrategy::default(),
            resource_file_type: ResourceFileType::default(),
            interpolate_template_parameters: true,
            validate: false,
            schema_dir: None,
            target_dir: None,
        }
    }
}

/// Everything generators and enrichers may know about the project
#[derive(Debug, Clone)]
pub struct ProjectContext {
    pub info: ProjectInfo,
    pub base_dir: PathBuf,
    pub build_dir: PathBuf,
    pub properties: Properties,
    /// Fixed per invocation so snapshot tags are reproducible
    pub build_timestamp: DateTime<Utc>,
}

impl ProjectContext {
    pub fn new(info: ProjectInfo, base_dir: impl Into<PathBuf>) -> Self {
        let base_dir = base_dir.into();
        Self {
            info,
            build_dir: base_dir.join("target"),
            base_dir,
            properties: Properties::new(),
            build_timestamp: Utc::now(),
        }
    }

    pub fn with_properties(mut self, properties: Properties) -> Self {
        self.properties = properties;
        self
    }

    pub fn with_build_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.build_timestamp = timestamp;
        self
    }

    pub fn artifact_id(&self) -> &str {
        &self.info.artifact_id
    }

    pub fn is_snapshot(&self) -> bool {
        self.info.version.ends_with("-SNAPSHOT")
    }

    /// Whether the project depends on something from `group_id`
    /// (optionally a specific artifact)
    pub fn has_dependency(&self, group_id: &str, artifact_id: Option<&str>) -> bool {
        self.info.dependencies.iter().any(|d| {
            d.group_id == group_id && artifact_id.is_none_or(|a| d.artifact_id == a)
        })
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key)
    }

    pub fn name_formatter(&self) -> PlaceholderFormatter {
        PlaceholderFormatter::new(self)
    }
}

/// Expands `%g`, `%a`, `%v`, `%l` and `%t` in image names
#[derive(Debug, Clone)]
pub struct PlaceholderFormatter {
    group: String,
    artifact: String,
    version: String,
    latest_or_version: String,
    snapshot_or_version: String,
}

impl PlaceholderFormatter {
    pub fn new(project: &ProjectContext) -> Self {
        let group = project
            .info
            .group_id
            .rsplit('.')
            .next()
            .unwrap_or_default()
            .to_lowercase();
        let version = project.info.version.clone();
        let (latest_or_version, snapshot_or_version) = if project.is_snapshot() {
            (
                "latest".to_string(),
                format!(
                    "snapshot-{}",
                    project.build_timestamp.format("%y%m%d-%H%M%S-%3f")
                ),
            )
        } else {
            (version.clone(), version.clone())
        };
        Self {
            group,
            artifact: project.info.artifact_id.to_lowercase(),
            version,
            latest_or_version,
            snapshot_or_version,
        }
    }
}

impl ImageNameFormatter for PlaceholderFormatter {
    fn format(&self, name: &str) -> String {
        let mut out = String::with_capacity(name.len());
        let mut chars = name.chars();
        while let Some(c) = chars.next() {
            if c != '%' {
                out.push(c);
                continue;
            }
            match chars.next() {
                Some('g') => out.push_str(&self.group),
                Some('a') => out.push_str(&self.artifact),
                Some('v') => out.push_str(&self.version),
                Some('l') => out.push_str(&self.latest_or_version),
                Some('t') => out.push_str(&self.snapshot_or_version),
                Some(other) => {
                    out.push('%');
                    out.push(other);
                }
                None => out.push('%'),
            }
        }
        out
    }
}

/// A descriptor loaded from disk with its paths resolved
#[derive(Debug, Clone)]
pub struct LoadedProject {
    pub descriptor: ProjectDescriptor,
    /// Directory holding the descriptor
    pub root: PathBuf,
}

impl LoadedProject {
    /// Load from a descriptor file or a directory containing `manifold.yaml`
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let (root, file) = if path.is_dir() {
            (path.to_path_buf(), path.join(DESCRIPTOR_FILE))
        } else {
            let root = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("."));
            (root, path.to_path_buf())
        };

        if !file.exists() {
            return Err(CoreError::ProjectNotFound {
                path: file.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(&file)?;
        let descriptor = Self::parse(&content)?;
        Ok(Self { descriptor, root })
    }

    /// Parse and check a descriptor
    pub fn parse(content: &str) -> Result<ProjectDescriptor> {
        let descriptor: ProjectDescriptor = serde_yaml::from_str(content)?;
        if descriptor.api_version != API_VERSION {
            return Err(CoreError::InvalidProject {
                message: format!(
                    "Unsupported API version: {}. Expected: {}",
                    descriptor.api_version, API_VERSION
                ),
            });
        }
        if descriptor.project.artifact_id.trim().is_empty() {
            return Err(CoreError::InvalidProject {
                message: "project.artifactId must not be blank".to_string(),
            });
        }
        Ok(descriptor)
    }

    /// Project context with descriptor properties overlaid by `extra`
    pub fn context(&self, extra: &Properties) -> ProjectContext {
        let mut properties = self.descriptor.properties.clone();
        properties.merge(extra);
        ProjectContext::new(self.descriptor.project.clone(), &self.root).with_properties(properties)
    }

    /// Resource directories resolved against the project root
    pub fn resource_dirs(&self) -> Vec<PathBuf> {
        self.descriptor
            .resource_dirs
            .iter()
            .map(|d| self.root.join(d))
            .collect()
    }

    pub fn target_dir(&self) -> PathBuf {
        self.root.join(
            self.descriptor
                .target_dir
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_TARGET_DIR)),
        )
    }

    pub fn schema_dir(&self) -> Option<PathBuf> {
        self.descriptor.schema_dir.as_ref().map(|d| self.root.join(d))
    }
}
