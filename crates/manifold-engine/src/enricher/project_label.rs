use std::collections::BTreeMap;

use serde_json::{Map, Value as JsonValue};

use super::{Enricher, EnricherContext};
use crate::error::Result;
use crate::overlay::{MetadataField, overlay_at};
use crate::resource::{Resource, ResourceList};

const NAME: &str = "project-label";
const DEFAULT_PROVIDER: &str = "manifold";

/// Adds `app`, `provider`, `group` and `version` labels, and selectors
/// built from them where none are set
#[derive(Debug, Clone, Copy, Default)]
pub struct ProjectLabelEnricher;

impl ProjectLabelEnricher {
    fn labels(ctx: &EnricherContext<'_>) -> BTreeMap<String, String> {
        let info = &ctx.project.info;
        BTreeMap::from([
            ("app".to_string(), info.artifact_id.clone()),
            (
                "provider".to_string(),
                ctx.setting(NAME, "provider")
                    .unwrap_or_else(|| DEFAULT_PROVIDER.to_string()),
            ),
            ("group".to_string(), info.group_id.clone()),
            ("version".to_string(), info.version.clone()),
        ])
    }
}

/// Where a kind keeps its label selector
fn selector_pointer(kind: &str) -> Option<&'static str> {
    match kind {
        "Service" | "DeploymentConfig" | "ReplicationController" => Some("/spec/selector"),
        "Deployment" | "StatefulSet" | "DaemonSet" | "ReplicaSet" => {
            Some("/spec/selector/matchLabels")
        }
        _ => None,
    }
}

fn has_selector(resource: &Resource, pointer: &str) -> bool {
    if !resource.is_unset(pointer) {
        return true;
    }
    // matchExpressions alone also select
    pointer.ends_with("/matchLabels") && !resource.is_unset("/spec/selector/matchExpressions")
}

impl Enricher for ProjectLabelEnricher {
    fn name(&self) -> &'static str {
        NAME
    }

    fn enrich(&self, ctx: &EnricherContext<'_>, resources: &mut ResourceList) -> Result<()> {
        let labels = Self::labels(ctx);
        // version changes between releases and must not be part of a selector
        let selector: Map<String, JsonValue> = labels
            .iter()
            .filter(|(k, _)| k.as_str() != "version")
            .map(|(k, v)| (k.clone(), JsonValue::String(v.clone())))
            .collect();

        for resource in resources.iter_mut() {
            overlay_at(resource, "/metadata", MetadataField::Labels, &labels);
            if resource.is_controller() {
                overlay_at(resource, "/spec/template/metadata", MetadataField::Labels, &labels);
            }
            if let Some(pointer) = selector_pointer(resource.kind()) {
                if !has_selector(resource, pointer) {
                    resource.set_default(pointer, JsonValue::Object(selector.clone()));
                }
            }
        }
        Ok(())
    }
}
