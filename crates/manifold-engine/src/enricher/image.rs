use serde_json::{Value as JsonValue, json};

use super::{Enricher, EnricherContext, pod_owners};
use crate::error::Result;
use crate::resource::ResourceList;

const NAME: &str = "image";
const DEFAULT_PULL_POLICY: &str = "IfNotPresent";

/// Fills container images, pull policy and environment
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageEnricher;

impl ImageEnricher {
    fn pull_policy(ctx: &EnricherContext<'_>) -> String {
        ctx.resources
            .image_pull_policy
            .clone()
            .or_else(|| ctx.setting(NAME, "pullPolicy"))
            .unwrap_or_else(|| DEFAULT_PULL_POLICY.to_string())
    }
}

/// Append env entries whose names are not already present
fn merge_env<'a, I>(container: &mut JsonValue, env: I)
where
    I: IntoIterator<Item = (&'a String, &'a String)>,
{
    let mut entries: Vec<JsonValue> = container
        .get("env")
        .and_then(JsonValue::as_array)
        .cloned()
        .unwrap_or_default();
    let before = entries.len();
    for (name, value) in env {
        let present = entries
            .iter()
            .any(|e| e.get("name").and_then(JsonValue::as_str) == Some(name.as_str()));
        if !present {
            entries.push(json!({ "name": name, "value": value }));
        }
    }
    if entries.len() != before {
        container["env"] = JsonValue::Array(entries);
    }
}

impl Enricher for ImageEnricher {
    fn name(&self) -> &'static str {
        NAME
    }

    fn enrich(&self, ctx: &EnricherContext<'_>, resources: &mut ResourceList) -> Result<()> {
        let images: Vec<String> = ctx.built_images().filter_map(|i| i.full_name()).collect();
        let pull_policy = Self::pull_policy(ctx);

        for resource in pod_owners(resources) {
            let Some(containers) = resource.containers_mut() else {
                continue;
            };
            for (idx, container) in containers.iter_mut().enumerate() {
                if !container.is_object() {
                    continue;
                }
                let unset = |field: &str| {
                    container
                        .get(field)
                        .and_then(JsonValue::as_str)
                        .is_none_or(str::is_empty)
                };
                let needs_image = unset("image");
                let needs_policy = unset("imagePullPolicy");

                if needs_image {
                    if let Some(image) = images.get(idx) {
                        container["image"] = JsonValue::from(image.as_str());
                    }
                }
                if needs_policy {
                    container["imagePullPolicy"] = JsonValue::from(pull_policy.as_str());
                }
                merge_env(container, &ctx.resources.env);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::Resource;
    use manifold_core::{
        BuildConfiguration, ImageConfiguration, ProcessorConfig, ProjectContext, ProjectInfo,
        ResourceConfig,
    };
    use std::collections::BTreeMap;

    #[test]
    fn test_fills_image_policy_and_env_without_clobbering() {
        let project = ProjectContext::new(ProjectInfo::default(), "/tmp/app");
        let images = vec![ImageConfiguration {
            name: Some("acme/app:1".into()),
            registry: Some("quay.io".into()),
            build: Some(BuildConfiguration::default()),
            ..Default::default()
        }];
        let config = ResourceConfig {
            env: BTreeMap::from([
                ("MODE".to_string(), "prod".to_string()),
                ("LOG".to_string(), "info".to_string()),
            ]),
            ..Default::default()
        };
        let processors = ProcessorConfig::new();
        let ctx = EnricherContext::new(&project, &config, &processors).with_images(&images);

        let mut deployment = Resource::skeleton("Deployment", "app");
        deployment.object_at_mut("/spec/template/spec").insert(
            "containers".into(),
            json!([{ "name": "app", "imagePullPolicy": "Always", "env": [{ "name": "MODE", "value": "dev" }] }]),
        );
        let mut list: ResourceList = [deployment].into_iter().collect();

        ImageEnricher.enrich(&ctx, &mut list).unwrap();

        let container = list
            .find("Deployment", "app")
            .unwrap()
            .get("/spec/template/spec/containers/0")
            .unwrap();
        assert_eq!(container["image"], "quay.io/acme/app:1");
        assert_eq!(container["imagePullPolicy"], "Always");
        assert_eq!(
            container["env"],
            json!([
                { "name": "MODE", "value": "dev" },
                { "name": "LOG", "value": "info" },
            ])
        );
    }
}
