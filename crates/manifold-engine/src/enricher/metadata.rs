use super::{Enricher, EnricherContext};
use crate::error::Result;
use crate::overlay::{MetadataField, apply_metadata};
use crate::resource::ResourceList;

/// Overlays the configured labels and annotations by kind category
#[derive(Debug, Clone, Copy, Default)]
pub struct MetadataEnricher;

impl Enricher for MetadataEnricher {
    fn name(&self) -> &'static str {
        "metadata"
    }

    fn enrich(&self, ctx: &EnricherContext<'_>, resources: &mut ResourceList) -> Result<()> {
        for field in [MetadataField::Labels, MetadataField::Annotations] {
            let config = field.select(ctx.resources);
            if config.is_empty() {
                continue;
            }
            for resource in resources.iter_mut() {
                let added = apply_metadata(resource, field, config);
                if added > 0 {
                    tracing::debug!(resource = %resource.key(), field = field.key(), added, "overlaid metadata");
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::Resource;
    use manifold_core::{ProcessorConfig, ProjectContext, ProjectInfo, ResourceConfig};
    use serde_json::json;

    #[test]
    fn test_user_annotation_survives_enrichment() {
        let project = ProjectContext::new(ProjectInfo::default(), "/tmp/app");
        let mut config = ResourceConfig::default();
        config.annotations.service.insert("service".into(), "to-be-preserved".into());
        config.annotations.service.insert("extra".into(), "EXTRA".into());
        let processors = ProcessorConfig::new();
        let ctx = EnricherContext::new(&project, &config, &processors);

        let mut list: ResourceList = [Resource::new(json!({
            "apiVersion": "v1",
            "kind": "Service",
            "metadata": { "name": "svc", "annotations": { "service": "Yay" } },
        }))]
        .into_iter()
        .collect();

        MetadataEnricher.enrich(&ctx, &mut list).unwrap();
        // second run changes nothing
        MetadataEnricher.enrich(&ctx, &mut list).unwrap();

        assert_eq!(
            list.find("Service", "svc").unwrap().get("/metadata/annotations").unwrap(),
            &json!({ "service": "Yay", "extra": "EXTRA" })
        );
    }
}
