use super::{Enricher, EnricherContext};
use crate::error::Result;
use crate::resource::ResourceList;

/// Gives every unnamed resource the default controller name
#[derive(Debug, Clone, Copy, Default)]
pub struct NameEnricher;

impl Enricher for NameEnricher {
    fn name(&self) -> &'static str {
        "name"
    }

    fn enrich(&self, ctx: &EnricherContext<'_>, resources: &mut ResourceList) -> Result<()> {
        let default_name = ctx.controller_name();
        for resource in resources.iter_mut() {
            if resource.name().trim().is_empty() {
                tracing::debug!(kind = resource.kind(), name = %default_name, "defaulting resource name");
                resource.set_name(&default_name);
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
    fn test_only_blank_names_are_set() {
        let project = ProjectContext::new(ProjectInfo::default(), "/tmp/app");
        let config = ResourceConfig {
            controller_name: Some("Shop Front".into()),
            ..Default::default()
        };
        let processors = ProcessorConfig::new();
        let ctx = EnricherContext::new(&project, &config, &processors);

        let mut list: ResourceList = [
            Resource::new(json!({ "kind": "ConfigMap", "metadata": {} })),
            Resource::skeleton("Service", "kept"),
        ]
        .into_iter()
        .collect();
        NameEnricher.enrich(&ctx, &mut list).unwrap();

        let names: Vec<&str> = list.iter().map(Resource::name).collect();
        assert_eq!(names, vec!["shop-front", "kept"]);
    }
}
