//! User-level manifest defaults

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::resolver::{PropertyField, PropertyResolvable};

/// Default prefix for resource properties
pub const RESOURCE_PROPERTY_PREFIX: &str = "manifold.resources";

/// Target-kind buckets for labels and annotations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetadataCategory {
    All,
    Deployment,
    Pod,
    ReplicaSet,
    Service,
    Ingress,
    ServiceAccount,
    Route,
}

impl MetadataCategory {
    pub const ALL: [MetadataCategory; 8] = [
        Self::All,
        Self::Deployment,
        Self::Pod,
        Self::ReplicaSet,
        Self::Service,
        Self::Ingress,
        Self::ServiceAccount,
        Self::Route,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Deployment => "deployment",
            Self::Pod => "pod",
            Self::ReplicaSet => "replicaSet",
            Self::Service => "service",
            Self::Ingress => "ingress",
            Self::ServiceAccount => "serviceAccount",
            Self::Route => "route",
        }
    }
}

/// Labels or annotations, partitioned by target kind
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MetadataConfig {
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub all: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub deployment: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub pod: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub replica_set: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub service: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub ingress: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub service_account: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub route: BTreeMap<String, String>,
}

impl MetadataConfig {
    pub fn get(&self, category: MetadataCategory) -> &BTreeMap<String, String> {
        match category {
            MetadataCategory::All => &self.all,
            MetadataCategory::Deployment => &self.deployment,
            MetadataCategory::Pod => &self.pod,
            MetadataCategory::ReplicaSet => &self.replica_set,
            MetadataCategory::Service => &self.service,
            MetadataCategory::Ingress => &self.ingress,
            MetadataCategory::ServiceAccount => &self.service_account,
            MetadataCategory::Route => &self.route,
        }
    }

    pub fn is_empty(&self) -> bool {
        MetadataCategory::ALL.iter().all(|c| self.get(*c).is_empty())
    }
}

/// A volume mounted into every container of the default controller
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VolumeConfig {
    pub name: String,
    /// `emptyDir`, `hostPath`, `configMap`, `secret` or `persistentVolumeClaim`
    #[serde(rename = "type")]
    pub volume_type: String,
    /// Mount path inside the container
    pub path: String,
    /// Host path, config map name, secret name or claim name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_only: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ResourceConfig {
    #[serde(skip_serializing_if = "MetadataConfig::is_empty")]
    pub labels: MetadataConfig,

    #[serde(skip_serializing_if = "MetadataConfig::is_empty")]
    pub annotations: MetadataConfig,

    /// Name of the default controller; defaults to the artifact id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub controller_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub replicas: Option<i32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_account: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_pull_policy: Option<String>,

    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub volumes: Vec<VolumeConfig>,
}

const RESOURCE_FIELDS: &[PropertyField] = &[
    PropertyField::scalar("controllerName", "controllerName"),
    PropertyField::scalar("namespace", "namespace"),
    PropertyField::integer("replicas", "replicas"),
    PropertyField::scalar("serviceAccount", "serviceAccount"),
    PropertyField::scalar("imagePullPolicy", "imagePullPolicy"),
    PropertyField::map("env", "env"),
    PropertyField::map("labels.all", "labels.all"),
    PropertyField::map("labels.deployment", "labels.deployment"),
    PropertyField::map("labels.pod", "labels.pod"),
    PropertyField::map("labels.replicaSet", "labels.replicaSet"),
    PropertyField::map("labels.service", "labels.service"),
    PropertyField::map("labels.ingress", "labels.ingress"),
    PropertyField::map("labels.serviceAccount", "labels.serviceAccount"),
    PropertyField::map("labels.route", "labels.route"),
    PropertyField::map("annotations.all", "annotations.all"),
    PropertyField::map("annotations.deployment", "annotations.deployment"),
    PropertyField::map("annotations.pod", "annotations.pod"),
    PropertyField::map("annotations.replicaSet", "annotations.replicaSet"),
    PropertyField::map("annotations.service", "annotations.service"),
    PropertyField::map("annotations.ingress", "annotations.ingress"),
    PropertyField::map("annotations.serviceAccount", "annotations.serviceAccount"),
    PropertyField::map("annotations.route", "annotations.route"),
];

impl PropertyResolvable for ResourceConfig {
    const DEFAULT_PREFIX: &'static str = RESOURCE_PROPERTY_PREFIX;

    fn property_fields() -> &'static [PropertyField] {
        RESOURCE_FIELDS
    }
}
