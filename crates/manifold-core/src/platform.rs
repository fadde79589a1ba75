//! Target platform and build strategy

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Target cluster flavor, threaded through generators and enrichers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformMode {
    #[default]
    Kubernetes,
    Openshift,
}

impl PlatformMode {
    /// Name used for the composite manifest file
    pub fn classifier(&self) -> &'static str {
        match self {
            Self::Kubernetes => "kubernetes",
            Self::Openshift => "openshift",
        }
    }

    pub fn is_openshift(&self) -> bool {
        matches!(self, Self::Openshift)
    }
}

impl FromStr for PlatformMode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "kubernetes" | "k8s" => Ok(Self::Kubernetes),
            "openshift" | "ocp" => Ok(Self::Openshift),
            _ => Err(CoreError::InvalidPlatformMode(s.to_string())),
        }
    }
}

impl fmt::Display for PlatformMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.classifier())
    }
}

/// How images are built; only affects what generators and the OpenShift
/// build enricher record, never how a build runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildStrategy {
    #[default]
    Docker,
    S2i,
}

impl FromStr for BuildStrategy {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "docker" => Ok(Self::Docker),
            "s2i" => Ok(Self::S2i),
            _ => Err(CoreError::InvalidBuildStrategy(s.to_string())),
        }
    }
}

/// Serialization format of written manifests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceFileType {
    #[default]
    Yaml,
    Json,
}

impl ResourceFileType {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Yaml => "yml",
            Self::Json => "json",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_mode_parse() {
        assert_eq!("OpenShift".parse::<PlatformMode>().unwrap(), PlatformMode::Openshift);
        assert_eq!("k8s".parse::<PlatformMode>().unwrap(), PlatformMode::Kubernetes);
        assert!("nomad".parse::<PlatformMode>().is_err());
    }

    #[test]
    fn test_classifier() {
        assert_eq!(PlatformMode::Kubernetes.classifier(), "kubernetes");
        assert_eq!(PlatformMode::Openshift.to_string(), "openshift");
    }
}
