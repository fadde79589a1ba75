//! OpenShift-only resources: BuildConfig/ImageStream pairs and Routes

use manifold_core::{BuildStrategy, ImageConfiguration};
use serde_json::{Value as JsonValue, json};

use super::{Enricher, EnricherContext, exposed_services, image_stream_ref};
use crate::error::Result;
use crate::resource::{Resource, ResourceList};

const BUILD: &str = "openshift-build";
const ROUTE: &str = "openshift-route";

/// Creates an ImageStream and a binary BuildConfig per built image
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenShiftBuildEnricher;

fn image_stream(name: &str) -> Resource {
    let mut stream = Resource::skeleton("ImageStream", name);
    stream
        .object_at_mut("/spec")
        .insert("lookupPolicy".into(), json!({ "local": false }));
    stream
}

fn build_strategy(strategy: BuildStrategy, image: &ImageConfiguration) -> JsonValue {
    let build = image.build.as_ref();
    let from = build.and_then(|b| b.from.as_deref()).map(|from| {
        let kind = match build.and_then(|b| b.from_mode.as_deref()) {
            Some("istag") => "ImageStreamTag",
            _ => "DockerImage",
        };
        json!({ "kind": kind, "name": from })
    });

    match strategy {
        BuildStrategy::S2i => {
            let mut source = json!({});
            if let Some(from) = from {
                source["from"] = from;
            }
            let env: Vec<JsonValue> = build
                .map(|b| {
                    b.env
                        .iter()
                        .map(|(name, value)| json!({ "name": name, "value": value }))
                        .collect()
                })
                .unwrap_or_default();
            if !env.is_empty() {
                source["env"] = JsonValue::Array(env);
            }
            json!({ "type": "Source", "sourceStrategy": source })
        }
        BuildStrategy::Docker => {
            let mut docker = json!({});
            if let Some(from) = from {
                docker["from"] = from;
            }
            if let Some(path) = build.and_then(|b| b.docker_file.as_deref()) {
                docker["dockerfilePath"] = JsonValue::from(path);
            }
            json!({ "type": "Docker", "dockerStrategy": docker })
        }
    }
}

impl Enricher for OpenShiftBuildEnricher {
    fn name(&self) -> &'static str {
        BUILD
    }

    fn create(&self, ctx: &EnricherContext<'_>, resources: &mut ResourceList) -> Result<()> {
        if !ctx.mode.is_openshift() {
            return Ok(());
        }
        let suffix = ctx.setting(BUILD, "buildNameSuffix").unwrap_or_else(|| match ctx.strategy {
            BuildStrategy::S2i => "-s2i".to_string(),
            BuildStrategy::Docker => "-docker".to_string(),
        });

        for image in ctx.built_images() {
            let (stream, tag) = image_stream_ref(image);
            if !resources.contains("ImageStream", &stream) {
                resources.push(image_stream(&stream));
            }

            let build_name = format!("{}{}", stream, suffix);
            if resources.contains("BuildConfig", &build_name) {
                continue;
            }
            let mut build = Resource::skeleton("BuildConfig", &build_name);
            let spec = build.object_at_mut("/spec");
            spec.insert(
                "output".into(),
                json!({ "to": { "kind": "ImageStreamTag", "name": format!("{}:{}", stream, tag) } }),
            );
            spec.insert("source".into(), json!({ "type": "Binary", "binary": {} }));
            spec.insert("strategy".into(), build_strategy(ctx.strategy, image));
            tracing::debug!(build = %build_name, "adding build config");
            resources.push(build);
        }
        Ok(())
    }
}

/// Creates a Route per exposed Service unless `generateRoute` is false
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenShiftRouteEnricher;

impl Enricher for OpenShiftRouteEnricher {
    fn name(&self) -> &'static str {
        ROUTE
    }

    fn create(&self, ctx: &EnricherContext<'_>, resources: &mut ResourceList) -> Result<()> {
        if !ctx.mode.is_openshift() || !ctx.setting_bool(ROUTE, "generateRoute", true) {
            return Ok(());
        }
        let domain = ctx.setting(ROUTE, "domain");
        let termination = ctx.setting(ROUTE, "tlsTermination");

        for (service, port) in exposed_services(resources) {
            if resources.contains("Route", &service) {
                continue;
            }
            let mut route = Resource::skeleton("Route", &service);
            let spec = route.object_at_mut("/spec");
            spec.insert("to".into(), json!({ "kind": "Service", "name": service }));
            spec.insert("port".into(), json!({ "targetPort": port }));
            if let Some(domain) = &domain {
                spec.insert("host".into(), JsonValue::from(format!("{}.{}", service, domain)));
            }
            if let Some(termination) = &termination {
                spec.insert(
                    "tls".into(),
                    json!({ "termination": termination, "insecureEdgeTerminationPolicy": "Redirect" }),
                );
            }
            tracing::debug!(service = %service, "adding route");
            resources.push(route);
        }
        Ok(())
    }
}
