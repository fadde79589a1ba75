//! Fill-missing-only merge of labels and annotations
//!
//! User-declared metadata always wins: a candidate is only inserted when its
//! key is absent from the target map. Which candidate maps reach which part
//! of a resource is driven by [`METADATA_TARGETS`], one row per
//! `(category, kinds, metadata location)`.

use std::collections::BTreeMap;

use manifold_core::{MetadataCategory, MetadataConfig, ResourceConfig};
use serde_json::{Map, Value as JsonValue};

use crate::resource::Resource;

/// Pure form: `existing` plus every candidate whose key is absent
pub fn overlay(
    existing: &BTreeMap<String, String>,
    candidates: &BTreeMap<String, String>,
) -> BTreeMap<String, String> {
    let mut merged = existing.clone();
    for (key, value) in candidates {
        merged.entry(key.clone()).or_insert_with(|| value.clone());
    }
    merged
}

/// In-place form over a JSON object; returns how many keys were added
pub fn overlay_json<'a, I>(target: &mut Map<String, JsonValue>, candidates: I) -> usize
where
    I: IntoIterator<Item = (&'a String, &'a String)>,
{
    let mut added = 0;
    for (key, value) in candidates {
        if !target.contains_key(key) {
            target.insert(key.clone(), JsonValue::String(value.clone()));
            added += 1;
        }
    }
    added
}

/// Labels or annotations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataField {
    Labels,
    Annotations,
}

impl MetadataField {
    pub fn key(&self) -> &'static str {
        match self {
            Self::Labels => "labels",
            Self::Annotations => "annotations",
        }
    }

    pub fn select<'a>(&self, config: &'a ResourceConfig) -> &'a MetadataConfig {
        match self {
            Self::Labels => &config.labels,
            Self::Annotations => &config.annotations,
        }
    }
}

/// Where a category's metadata lands on a resource
#[derive(Debug, Clone, Copy)]
pub struct MetadataTarget {
    pub category: MetadataCategory,
    pub kinds: &'static [&'static str],
    /// Pointer to the `metadata` object receiving the overlay
    pub metadata: &'static str,
}

const WORKLOADS: &[&str] = &["Deployment", "DeploymentConfig", "StatefulSet", "DaemonSet", "Job"];
const REPLICA_SETS: &[&str] = &["ReplicaSet", "ReplicationController"];

pub const METADATA_TARGETS: &[MetadataTarget] = &[
    MetadataTarget {
        category: MetadataCategory::Deployment,
        kinds: WORKLOADS,
        metadata: "/metadata",
    },
    MetadataTarget {
        category: MetadataCategory::Pod,
        kinds: WORKLOADS,
        metadata: "/spec/template/metadata",
    },
    MetadataTarget {
        category: MetadataCategory::ReplicaSet,
        kinds: REPLICA_SETS,
        metadata: "/metadata",
    },
    MetadataTarget {
        category: MetadataCategory::Pod,
        kinds: REPLICA_SETS,
        metadata: "/spec/template/metadata",
    },
    MetadataTarget {
        category: MetadataCategory::Pod,
        kinds: &["Pod"],
        metadata: "/metadata",
    },
    MetadataTarget {
        category: MetadataCategory::Pod,
        kinds: &["CronJob"],
        metadata: "/spec/jobTemplate/spec/template/metadata",
    },
    MetadataTarget {
        category: MetadataCategory::Service,
        kinds: &["Service"],
        metadata: "/metadata",
    },
    MetadataTarget {
        category: MetadataCategory::Ingress,
        kinds: &["Ingress"],
        metadata: "/metadata",
    },
    MetadataTarget {
        category: MetadataCategory::ServiceAccount,
        kinds: &["ServiceAccount"],
        metadata: "/metadata",
    },
    MetadataTarget {
        category: MetadataCategory::Route,
        kinds: &["Route"],
        metadata: "/metadata",
    },
];

/// Targets applying to a kind. Kinds without a row get the `all`
/// candidates on their top-level metadata only.
pub fn targets_for(kind: &str) -> Vec<MetadataTarget> {
    let targets: Vec<MetadataTarget> = METADATA_TARGETS
        .iter()
        .filter(|t| t.kinds.contains(&kind))
        .copied()
        .collect();
    if targets.iter().any(|t| t.metadata == "/metadata") {
        return targets;
    }
    let mut with_root = vec![MetadataTarget {
        category: MetadataCategory::All,
        kinds: &[],
        metadata: "/metadata",
    }];
    with_root.extend(targets);
    with_root
}

/// Candidates for one category: `all` plus the kind-specific map, the
/// kind-specific value taking the key on collision
pub fn candidates(config: &MetadataConfig, category: MetadataCategory) -> BTreeMap<String, String> {
    let mut merged = config.all.clone();
    if category != MetadataCategory::All {
        merged.extend(config.get(category).clone());
    }
    merged
}

/// Overlay candidates onto the `labels`/`annotations` map under `metadata`
pub fn overlay_at(
    resource: &mut Resource,
    metadata: &str,
    field: MetadataField,
    candidates: &BTreeMap<String, String>,
) -> usize {
    if candidates.is_empty() {
        return 0;
    }
    let pointer = format!("{}/{}", metadata, field.key());
    overlay_json(resource.object_at_mut(&pointer), candidates)
}

/// Apply a `ResourceConfig`'s labels or annotations to a resource
pub fn apply_metadata(resource: &mut Resource, field: MetadataField, config: &MetadataConfig) -> usize {
    targets_for(resource.kind())
        .into_iter()
        .map(|target| {
            let candidates = candidates(config, target.category);
            overlay_at(resource, target.metadata, field, &candidates)
        })
        .sum()
}
