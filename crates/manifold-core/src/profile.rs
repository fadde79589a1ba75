//! Named, reusable bundles of processor configuration
//!
//! Profiles are read from `profiles.yaml` / `profiles.yml` in each search
//! directory, on top of the built-in set. Each file holds a list:
//!
//! ```yaml
//! - name: production
//!   order: 10
//!   extends: default
//!   enricher:
//!     excludes: [health-check]
//!     config:
//!       controller:
//!         replicas: 3
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::processor::ProcessorConfig;

/// Name of the profile used when none is requested
pub const DEFAULT_PROFILE: &str = "default";

const BUILTIN_PROFILES: &str = include_str!("profiles/profiles-default.yaml");
/// File names holding profile definitions in a search directory
pub const PROFILE_FILES: &[&str] = &["profiles.yaml", "profiles.yml"];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Profile {
    pub name: String,

    /// Profile this one blends over
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extends: Option<String>,

    /// Same-name profiles are combined in ascending order
    pub order: i32,

    pub generator: ProcessorConfig,

    pub enricher: ProcessorConfig,
}

/// Which half of a profile to use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessorKind {
    Generator,
    Enricher,
}

impl Profile {
    pub fn processor_config(&self, kind: ProcessorKind) -> &ProcessorConfig {
        match kind {
            ProcessorKind::Generator => &self.generator,
            ProcessorKind::Enricher => &self.enricher,
        }
    }

    /// Blend `overlay` over `self`, overlay wins
    fn blended_with(&self, overlay: &Profile) -> Profile {
        Profile {
            name: overlay.name.clone(),
            extends: overlay.extends.clone().or_else(|| self.extends.clone()),
            order: overlay.order.max(self.order),
            generator: ProcessorConfig::blend(&self.generator, &overlay.generator),
            enricher: ProcessorConfig::blend(&self.enricher, &overlay.enricher),
        }
    }
}

/// All known profile definitions
#[derive(Debug, Clone, Default)]
pub struct ProfileRepository {
    profiles: Vec<Profile>,
    sources: Vec<String>,
}

impl ProfileRepository {
    /// Repository holding only the built-in profiles
    pub fn builtin() -> Result<Self> {
        let profiles = parse_profiles(BUILTIN_PROFILES, "<builtin>")?;
        Ok(Self {
            profiles,
            sources: vec!["<builtin>".to_string()],
        })
    }

    /// Built-in profiles plus the profile files found in `search_dirs`.
    /// Directories without a profile file are skipped.
    pub fn load<P: AsRef<Path>>(search_dirs: &[P]) -> Result<Self> {
        let mut repo = Self::builtin()?;
        for dir in search_dirs {
            for file in PROFILE_FILES {
                let path = dir.as_ref().join(file);
                if path.is_file() {
                    repo.add_file(&path)?;
                }
            }
        }
        Ok(repo)
    }

    /// Add the profiles defined in a file
    pub fn add_file(&mut self, path: &Path) -> Result<()> {
        let content = std::fs::read_to_string(path)?;
        let source = path.display().to_string();
        let profiles = parse_profiles(&content, &source)?;
        tracing::debug!(file = %source, count = profiles.len(), "loaded profiles");
        self.profiles.extend(profiles);
        self.sources.push(source);
        Ok(())
    }

    /// Distinct profile names in definition order
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for profile in &self.profiles {
            if !names.contains(&profile.name.as_str()) {
                names.push(&profile.name);
            }
        }
        names
    }

    pub fn contains(&self, name: &str) -> bool {
        self.profiles.iter().any(|p| p.name == name)
    }

    /// Resolve a profile by name: same-name definitions combined by order,
    /// then `extends` chains applied parent-first
    pub fn lookup(&self, name: &str) -> Result<Profile> {
        self.lookup_chain(name, &mut Vec::new())
    }

    fn lookup_chain(&self, name: &str, visiting: &mut Vec<String>) -> Result<Profile> {
        if visiting.iter().any(|v| v == name) {
            visiting.push(name.to_string());
            return Err(CoreError::InvalidProfile {
                path: name.to_string(),
                message: format!("circular 'extends' chain: {}", visiting.join(" -> ")),
            });
        }
        visiting.push(name.to_string());

        let mut matching: Vec<&Profile> = self.profiles.iter().filter(|p| p.name == name).collect();
        if matching.is_empty() {
            return Err(CoreError::ProfileNotFound {
                name: name.to_string(),
                searched: self.sources.join(", "),
            });
        }
        matching.sort_by_key(|p| p.order);

        let mut combined = matching[0].clone();
        for profile in &matching[1..] {
            combined = combined.blended_with(profile);
        }

        match combined.extends.clone() {
            Some(parent) => {
                let parent = self.lookup_chain(&parent, visiting)?;
                Ok(parent.blended_with(&combined))
            }
            None => Ok(combined),
        }
    }
}

fn parse_profiles(content: &str, source: &str) -> Result<Vec<Profile>> {
    let profiles: Vec<Profile> =
        serde_yaml::from_str(content).map_err(|e| CoreError::InvalidProfile {
            path: source.to_string(),
            message: e.to_string(),
        })?;
    if let Some(unnamed) = profiles.iter().position(|p| p.name.trim().is_empty()) {
        return Err(CoreError::InvalidProfile {
            path: source.to_string(),
            message: format!("profile #{} has no name", unnamed + 1),
        });
    }
    Ok(profiles)
}

/// Resolve a named profile from the built-ins plus `search_dirs`
pub fn resolve_profile<P: AsRef<Path>>(name: &str, search_dirs: &[P]) -> Result<Profile> {
    ProfileRepository::load(search_dirs)?.lookup(name)
}

/// Blend the requested profile's processor config with explicit settings.
///
/// Without a profile name the `default` profile is used when defined.
pub fn blend_profile_with_configuration(
    kind: ProcessorKind,
    profile: Option<&str>,
    search_dirs: &[PathBuf],
    explicit: &ProcessorConfig,
) -> Result<ProcessorConfig> {
    let repo = ProfileRepository::load(search_dirs)?;
    let profile = match profile {
        Some(name) => repo.lookup(name)?,
        None if repo.contains(DEFAULT_PROFILE) => repo.lookup(DEFAULT_PROFILE)?,
        None => return Ok(explicit.clone()),
    };
    Ok(ProcessorConfig::blend(profile.processor_config(kind), explicit))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_profiles(dir: &Path, content: &str) {
        std::fs::write(dir.join("profiles.yaml"), content).unwrap();
    }

    #[test]
    fn test_builtin_profiles() {
        let repo = ProfileRepository::builtin().unwrap();
        assert_eq!(repo.names(), vec!["default", "minimal", "raw"]);

        let default = repo.lookup("default").unwrap();
        let includes = default.enricher.includes.unwrap();
        assert_eq!(includes.first().map(String::as_str), Some("name"));
        assert!(includes.contains(&"openshift-route".to_string()));

        let raw = repo.lookup("raw").unwrap();
        assert_eq!(raw.enricher.includes, Some(vec![]));
    }

    #[test]
    fn test_missing_profile_is_an_error() {
        let err = resolve_profile::<PathBuf>("nope", &[]).unwrap_err();
        assert!(matches!(err, CoreError::ProfileNotFound { ref name, .. } if name == "nope"));
    }

    #[test]
    fn test_project_profile_file() {
        let dir = TempDir::new().unwrap();
        write_profiles(
            dir.path(),
            r#"
- name: production
  enricher:
    includes: [controller]
    config:
      controller:
        replicas: 3
"#,
        );

        let profile = resolve_profile("production", &[dir.path()]).unwrap();
        assert_eq!(profile.enricher.includes, Some(vec!["controller".to_string()]));
        assert_eq!(profile.enricher.get_string("controller", "replicas").unwrap(), "3");
    }

    #[test]
    fn test_same_name_profiles_combined_by_order() {
        let dir = TempDir::new().unwrap();
        write_profiles(
            dir.path(),
            r#"
- name: default
  order: 10
  enricher:
    config:
      service:
        type: NodePort
"#,
        );

        let profile = resolve_profile("default", &[dir.path()]).unwrap();
        // includes kept from the builtin, config from the higher order profile
        assert!(profile.enricher.includes.as_ref().unwrap().contains(&"service".to_string()));
        assert_eq!(profile.enricher.get_string("service", "type").unwrap(), "NodePort");
    }

    #[test]
    fn test_extends_blends_child_over_parent() {
        let dir = TempDir::new().unwrap();
        write_profiles(
            dir.path(),
            r#"
- name: base
  enricher:
    includes: [controller, service]
    config:
      service:
        type: ClusterIP
- name: child
  extends: base
  enricher:
    excludes: [service]
"#,
        );

        let profile = resolve_profile("child", &[dir.path()]).unwrap();
        assert_eq!(
            profile.enricher.includes,
            Some(vec!["controller".to_string(), "service".to_string()])
        );
        assert_eq!(profile.enricher.excludes, vec!["service".to_string()]);
        assert_eq!(profile.enricher.get_string("service", "type").unwrap(), "ClusterIP");
    }

    #[test]
    fn test_extends_cycle_detected() {
        let dir = TempDir::new().unwrap();
        write_profiles(
            dir.path(),
            "- name: a\n  extends: b\n- name: b\n  extends: a\n",
        );
        let err = resolve_profile("a", &[dir.path()]).unwrap_err();
        assert!(err.to_string().contains("circular"));
    }

    #[test]
    fn test_blend_with_explicit_configuration() {
        let explicit = ProcessorConfig::including(["image"]);
        let blended =
            blend_profile_with_configuration(ProcessorKind::Enricher, Some("minimal"), &[], &explicit)
                .unwrap();
        assert_eq!(blended.includes, Some(vec!["image".to_string()]));

        let blended =
            blend_profile_with_configuration(ProcessorKind::Enricher, None, &[], &ProcessorConfig::new())
                .unwrap();
        assert!(blended.includes.unwrap().contains(&"metadata".to_string()));
    }
}
