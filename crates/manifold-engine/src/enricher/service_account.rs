use k8s_openapi::api::core::v1::ServiceAccount;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use serde_json::Value as JsonValue;

use super::{Enricher, EnricherContext, pod_owners};
use crate::error::Result;
use crate::resource::{Resource, ResourceList};

/// Creates the configured ServiceAccount and points pod specs at it
#[derive(Debug, Clone, Copy, Default)]
pub struct ServiceAccountEnricher;

impl Enricher for ServiceAccountEnricher {
    fn name(&self) -> &'static str {
        "service-account"
    }

    fn create(&self, ctx: &EnricherContext<'_>, resources: &mut ResourceList) -> Result<()> {
        let Some(name) = ctx.resources.service_account.as_deref() else {
            return Ok(());
        };
        if resources.contains("ServiceAccount", name) {
            return Ok(());
        }
        let account = ServiceAccount {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        resources.push(Resource::from_typed(&account)?);
        Ok(())
    }

    fn enrich(&self, ctx: &EnricherContext<'_>, resources: &mut ResourceList) -> Result<()> {
        let Some(name) = ctx.resources.service_account.as_deref() else {
            return Ok(());
        };
        for resource in pod_owners(resources) {
            if let Some(pod_spec) = resource.pod_spec_pointer() {
                resource.set_default(
                    &format!("{}/serviceAccountName", pod_spec),
                    JsonValue::from(name),
                );
            }
        }
        Ok(())
    }
}
