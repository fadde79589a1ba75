//! Image build configuration

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::combine::CombinePolicy;
use crate::error::{CoreError, Result};
use crate::resolver::{PropertyField, PropertyResolvable};

/// Default prefix for image properties
pub const IMAGE_PROPERTY_PREFIX: &str = "manifold.image";

/// A container image to build: its (possibly templated) name plus the build spec
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ImageConfiguration {
    /// Image name, may contain `%g`/`%a`/`%v`/`%l`/`%t` placeholders
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub registry: Option<String>,

    /// Replaces `manifold.image` when resolving this image from properties
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property_resolver_prefix: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub build: Option<BuildConfiguration>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BuildConfiguration {
    /// Base image
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,

    /// `docker` (plain reference) or `istag` (OpenShift ImageStreamTag)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_mode: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub docker_file: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub workdir: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub maintainer: Option<String>,

    #[serde(skip_serializing_if = "Vec::is_empty", deserialize_with = "lenient::scalar_list")]
    pub ports: Vec<String>,

    #[serde(skip_serializing_if = "Vec::is_empty", deserialize_with = "lenient::scalar_list")]
    pub tags: Vec<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub platforms: Vec<String>,

    #[serde(skip_serializing_if = "Vec::is_empty", deserialize_with = "lenient::scalar_list")]
    pub volumes: Vec<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub cache_from: Vec<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub run_cmds: Vec<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub cmd: Vec<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub entrypoint: Vec<String>,

    #[serde(skip_serializing_if = "BTreeMap::is_empty", deserialize_with = "lenient::scalar_map")]
    pub env: BTreeMap<String, String>,

    #[serde(skip_serializing_if = "BTreeMap::is_empty", deserialize_with = "lenient::scalar_map")]
    pub labels: BTreeMap<String, String>,

    #[serde(skip_serializing_if = "BTreeMap::is_empty", deserialize_with = "lenient::scalar_map")]
    pub args: BTreeMap<String, String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub health_check: Option<HealthCheckConfiguration>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub assembly: Option<AssemblyConfiguration>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HealthCheckConfiguration {
    /// `cmd`, `shell` or `none`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cmd: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_period: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retries: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AssemblyConfiguration {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_dir: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude_final_output_artifact: Option<bool>,
}

/// Deserializers accepting numbers and booleans where strings are expected,
/// so `ports: [8080]` works as written
pub(crate) mod lenient {
    use std::collections::BTreeMap;

    use serde::{Deserialize, Deserializer};
    use serde_json::Value as JsonValue;

    fn to_string(value: JsonValue) -> Option<String> {
        match value {
            JsonValue::String(s) => Some(s),
            JsonValue::Null => None,
            other => Some(other.to_string()),
        }
    }

    pub fn scalar_list<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
        let items = Vec::<JsonValue>::deserialize(d)?;
        Ok(items.into_iter().filter_map(to_string).collect())
    }

    pub fn scalar_map<'de, D: Deserializer<'de>>(
        d: D,
    ) -> Result<BTreeMap<String, String>, D::Error> {
        let entries = BTreeMap::<String, JsonValue>::deserialize(d)?;
        Ok(entries
            .into_iter()
            .filter_map(|(k, v)| to_string(v).map(|v| (k, v)))
            .collect())
    }
}

const IMAGE_FIELDS: &[PropertyField] = &[
    PropertyField::scalar("name", "name"),
    PropertyField::scalar("alias", "alias"),
    PropertyField::scalar("registry", "registry"),
    PropertyField::scalar("from", "build.from"),
    PropertyField::scalar("fromMode", "build.fromMode"),
    PropertyField::scalar("dockerFile", "build.dockerFile"),
    PropertyField::scalar("workdir", "build.workdir"),
    PropertyField::scalar("user", "build.user"),
    PropertyField::scalar("maintainer", "build.maintainer"),
    PropertyField::list("ports", "build.ports", CombinePolicy::Merge),
    PropertyField::list("tags", "build.tags", CombinePolicy::Merge),
    PropertyField::list("platforms", "build.platforms", CombinePolicy::Merge),
    PropertyField::list("volumes", "build.volumes", CombinePolicy::Merge),
    PropertyField::list("cacheFrom", "build.cacheFrom", CombinePolicy::Replace),
    PropertyField::list("runCmds", "build.runCmds", CombinePolicy::Replace),
    PropertyField::list("cmd", "build.cmd", CombinePolicy::Replace),
    PropertyField::list("entrypoint", "build.entrypoint", CombinePolicy::Replace),
    PropertyField::map("env", "build.env"),
    PropertyField::map("labels", "build.labels"),
    PropertyField::map("args", "build.args"),
    PropertyField::scalar("healthCheck.mode", "build.healthCheck.mode"),
    PropertyField::scalar("healthCheck.cmd", "build.healthCheck.cmd"),
    PropertyField::scalar("healthCheck.interval", "build.healthCheck.interval"),
    PropertyField::scalar("healthCheck.timeout", "build.healthCheck.timeout"),
    PropertyField::scalar("healthCheck.startPeriod", "build.healthCheck.startPeriod"),
    PropertyField::integer("healthCheck.retries", "build.healthCheck.retries"),
    PropertyField::scalar("assembly.name", "build.assembly.name"),
    PropertyField::scalar("assembly.targetDir", "build.assembly.targetDir"),
    PropertyField::scalar("assembly.user", "build.assembly.user"),
    PropertyField::scalar("assembly.mode", "build.assembly.mode"),
    PropertyField::boolean(
        "assembly.excludeFinalOutputArtifact",
        "build.assembly.excludeFinalOutputArtifact",
    ),
];

impl PropertyResolvable for ImageConfiguration {
    const DEFAULT_PREFIX: &'static str = IMAGE_PROPERTY_PREFIX;

    fn property_fields() -> &'static [PropertyField] {
        IMAGE_FIELDS
    }

    fn property_prefix(&self) -> Option<&str> {
        self.property_resolver_prefix.as_deref()
    }
}

impl ImageConfiguration {
    /// Create an image with just a name
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    /// Human-readable identity for log and error messages
    pub fn description(&self) -> String {
        match (&self.name, &self.alias) {
            (Some(name), Some(alias)) => format!("'{}' (alias '{}')", name, alias),
            (Some(name), None) => format!("'{}'", name),
            (None, Some(alias)) => format!("with alias '{}'", alias),
            (None, None) => "<unnamed>".to_string(),
        }
    }

    pub fn has_build(&self) -> bool {
        self.build.is_some()
    }

    /// Exposed ports of the build, empty when there is no build
    pub fn ports(&self) -> &[String] {
        self.build.as_ref().map(|b| b.ports.as_slice()).unwrap_or(&[])
    }

    /// Full image reference including the registry, if any
    pub fn full_name(&self) -> Option<String> {
        let name = self.name.as_deref()?;
        Some(match self.registry.as_deref().filter(|r| !r.is_empty()) {
            Some(registry) if !name.starts_with(&format!("{}/", registry)) => {
                format!("{}/{}", registry, name)
            }
            _ => name.to_string(),
        })
    }

    /// Whether this image matches a filter by name or alias
    pub fn matches(&self, filter: &str) -> bool {
        self.name.as_deref() == Some(filter) || self.alias.as_deref() == Some(filter)
    }
}

/// Turns templated image names into concrete ones
pub trait ImageNameFormatter {
    fn format(&self, name: &str) -> String;
}

/// Formatter that leaves names untouched
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityFormatter;

impl ImageNameFormatter for IdentityFormatter {
    fn format(&self, name: &str) -> String {
        name.to_string()
    }
}

/// Check that every image has a name and normalize it through `formatter`
pub fn validate_images(
    images: Vec<ImageConfiguration>,
    formatter: &dyn ImageNameFormatter,
) -> Result<Vec<ImageConfiguration>> {
    images
        .into_iter()
        .enumerate()
        .map(|(idx, mut image)| {
            let name = image
                .name
                .as_deref()
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .ok_or_else(|| CoreError::MissingField {
                    field: "name".to_string(),
                    image: match &image.alias {
                        Some(alias) => format!("with alias '{}'", alias),
                        None => format!("#{}", idx + 1),
                    },
                })?;
            image.name = Some(formatter.format(name));
            Ok(image)
        })
        .collect()
}

/// Keep images matching any of the filters (name or alias).
///
/// Filters may be comma-separated. When filters are given but nothing
/// matches, a warning naming the resolved images and the filters is
/// returned alongside the (empty) match set.
pub fn filter_images(
    images: &[ImageConfiguration],
    filters: &[String],
) -> (Vec<ImageConfiguration>, Option<String>) {
    let filters: Vec<&str> = filters
        .iter()
        .flat_map(|f| f.split(','))
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .collect();
    if filters.is_empty() {
        return (images.to_vec(), None);
    }

    let matched: Vec<ImageConfiguration> = images
        .iter()
        .filter(|image| filters.iter().any(|f| image.matches(f)))
        .cloned()
        .collect();

    let warning = matched.is_empty().then(|| {
        let names: Vec<&str> = images.iter().filter_map(|i| i.name.as_deref()).collect();
        format!(
            "None of the resolved images [{}] match the configured filter '{}'",
            names.join(", "),
            filters.join(",")
        )
    });

    (matched, warning)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::properties::Properties;
    use crate::resolver::{FieldKind, resolve};

    fn props(entries: &[(&str, &str)]) -> Properties {
        entries.iter().copied().collect()
    }

    #[test]
    fn test_resolve_empty_config_from_properties() {
        let resolved = resolve(
            &ImageConfiguration::default(),
            &props(&[
                ("manifold.image.name", "image-name"),
                ("manifold.image.ports.1", "8080"),
            ]),
        )
        .unwrap();

        assert_eq!(resolved.name.as_deref(), Some("image-name"));
        assert_eq!(resolved.build.unwrap().ports, vec!["8080"]);
    }

    #[test]
    fn test_resolve_tags_merge() {
        let existing = ImageConfiguration {
            name: Some("app".into()),
            build: Some(BuildConfiguration {
                tags: vec!["v1".into()],
                ..Default::default()
            }),
            ..Default::default()
        };
        let resolved = resolve(&existing, &props(&[("manifold.image.tags.1", "v2")])).unwrap();
        assert_eq!(resolved.build.unwrap().tags, vec!["v1", "v2"]);
    }

    #[test]
    fn test_resolve_cache_from_replaces() {
        let existing = ImageConfiguration {
            build: Some(BuildConfiguration {
                cache_from: vec!["old:1".into()],
                ..Default::default()
            }),
            ..Default::default()
        };
        let resolved =
            resolve(&existing, &props(&[("manifold.image.cacheFrom.1", "new:2")])).unwrap();
        assert_eq!(resolved.build.unwrap().cache_from, vec!["new:2"]);
    }

    #[test]
    fn test_list_policy_table_is_pinned() {
        let expected = [
            ("ports", CombinePolicy::Merge),
            ("tags", CombinePolicy::Merge),
            ("platforms", CombinePolicy::Merge),
            ("volumes", CombinePolicy::Merge),
            ("cacheFrom", CombinePolicy::Replace),
            ("runCmds", CombinePolicy::Replace),
            ("cmd", CombinePolicy::Replace),
            ("entrypoint", CombinePolicy::Replace),
        ];
        for (key, policy) in expected {
            let field = ImageConfiguration::property_field(key).unwrap();
            assert_eq!(field.policy(), Some(policy), "policy of {}", key);
        }
        let lists = IMAGE_FIELDS
            .iter()
            .filter(|f| matches!(f.kind, FieldKind::List(_)))
            .count();
        assert_eq!(lists, expected.len());
    }

    #[test]
    fn test_resolve_with_prefix_override() {
        let existing = ImageConfiguration {
            property_resolver_prefix: Some("backend".into()),
            ..Default::default()
        };
        let resolved = resolve(
            &existing,
            &props(&[
                ("manifold.image.name", "ignored"),
                ("backend.name", "backend-image"),
                ("backend.healthCheck.retries", "3"),
            ]),
        )
        .unwrap();
        assert_eq!(resolved.name.as_deref(), Some("backend-image"));
        assert_eq!(resolved.property_resolver_prefix.as_deref(), Some("backend"));
        assert_eq!(
            resolved.build.unwrap().health_check.unwrap().retries,
            Some(3)
        );
    }

    #[test]
    fn test_validate_rejects_blank_name() {
        let images = vec![
            ImageConfiguration::named("ok"),
            ImageConfiguration {
                name: Some("  ".into()),
                alias: Some("broken".into()),
                ..Default::default()
            },
        ];
        let err = validate_images(images, &IdentityFormatter).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("'name'"));
        assert!(msg.contains("broken"));
    }

    #[test]
    fn test_filter_images_by_name_or_alias() {
        let images = vec![
            ImageConfiguration {
                name: Some("acme/api:1".into()),
                alias: Some("api".into()),
                ..Default::default()
            },
            ImageConfiguration::named("acme/worker:1"),
        ];

        let (matched, warning) = filter_images(&images, &["api".to_string()]);
        assert_eq!(matched.len(), 1);
        assert!(warning.is_none());

        let (matched, warning) = filter_images(&images, &["acme/worker:1,nope".to_string()]);
        assert_eq!(matched.len(), 1);
        assert!(warning.is_none());
    }

    #[test]
    fn test_filter_images_unmatched_warns_once() {
        let images = vec![ImageConfiguration::named("acme/api:1")];
        let (matched, warning) = filter_images(&images, &["frontend".to_string()]);
        assert!(matched.is_empty());
        let warning = warning.unwrap();
        assert!(warning.contains("acme/api:1"));
        assert!(warning.contains("frontend"));
    }

    #[test]
    fn test_full_name_with_registry() {
        let image = ImageConfiguration {
            name: Some("acme/api:1".into()),
            registry: Some("quay.io".into()),
            ..Default::default()
        };
        assert_eq!(image.full_name().unwrap(), "quay.io/acme/api:1");
    }
}
