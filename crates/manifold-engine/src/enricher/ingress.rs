use k8s_openapi::api::networking::v1::{
    HTTPIngressPath, HTTPIngressRuleValue, Ingress, IngressBackend, IngressRule,
    IngressServiceBackend, IngressSpec, ServiceBackendPort,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

use super::{Enricher, EnricherContext, exposed_services};
use crate::error::{EngineError, Result};
use crate::resource::{Resource, ResourceList};

const NAME: &str = "ingress";

/// Creates an Ingress per exposed Service on Kubernetes.
///
/// Needs either `host` (used as is) or `domain` (host becomes
/// `<service>.<domain>`); without both nothing is created.
#[derive(Debug, Clone, Copy, Default)]
pub struct IngressEnricher;

impl Enricher for IngressEnricher {
    fn name(&self) -> &'static str {
        NAME
    }

    fn create(&self, ctx: &EnricherContext<'_>, resources: &mut ResourceList) -> Result<()> {
        if ctx.mode.is_openshift() {
            return Ok(());
        }
        let host = ctx.setting(NAME, "host");
        let domain = ctx.setting(NAME, "domain");
        if host.is_none() && domain.is_none() {
            tracing::debug!("no ingress host or domain configured, skipping");
            return Ok(());
        }
        let path = ctx.setting(NAME, "path").unwrap_or_else(|| "/".to_string());
        let path_type = ctx.setting(NAME, "pathType").unwrap_or_else(|| "Prefix".to_string());
        let class = ctx.setting(NAME, "ingressClassName");

        for (service, port) in exposed_services(resources) {
            if resources.contains("Ingress", &service) {
                continue;
            }
            let port = i32::try_from(port)
                .map_err(|_| EngineError::enricher(NAME, format!("service '{}' has an invalid port", service)))?;
            let host = host
                .clone()
                .or_else(|| domain.as_ref().map(|d| format!("{}.{}", service, d)));

            let ingress = Ingress {
                metadata: ObjectMeta {
                    name: Some(service.clone()),
                    ..Default::default()
                },
                spec: Some(IngressSpec {
                    ingress_class_name: class.clone(),
                    rules: Some(vec![IngressRule {
                        host,
                        http: Some(HTTPIngressRuleValue {
                            paths: vec![HTTPIngressPath {
                                path: Some(path.clone()),
                                path_type: path_type.clone(),
                                backend: IngressBackend {
                                    service: Some(IngressServiceBackend {
                                        name: service.clone(),
                                        port: Some(ServiceBackendPort {
                                            number: Some(port),
                                            ..Default::default()
                                        }),
                                    }),
                                    ..Default::default()
                                },
                            }],
                        }),
                    }]),
                    ..Default::default()
                }),
                ..Default::default()
            };
            tracing::debug!(service = %service, "adding ingress");
            resources.push(Resource::from_typed(&ingress)?);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use manifold_core::{PlatformMode, ProcessorConfig, ProjectContext, ProjectInfo, ResourceConfig};
    use serde_json::json;

    fn services() -> ResourceList {
        [
            Resource::new(json!({
                "apiVersion": "v1", "kind": "Service",
                "metadata": { "name": "web" },
                "spec": { "ports": [{ "port": 8080 }] },
            })),
            Resource::new(json!({
                "apiVersion": "v1", "kind": "Service",
                "metadata": { "name": "internal", "labels": { "expose": "false" } },
                "spec": { "ports": [{ "port": 9000 }] },
            })),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_ingress_for_exposed_services() {
        let project = ProjectContext::new(ProjectInfo::default(), "/tmp/app");
        let config = ResourceConfig::default();
        let processors = ProcessorConfig::new().with_setting(NAME, "domain", "apps.example.com");
        let ctx = EnricherContext::new(&project, &config, &processors);

        let mut list = services();
        IngressEnricher.create(&ctx, &mut list).unwrap();
        IngressEnricher.create(&ctx, &mut list).unwrap();

        assert_eq!(list.of_kind("Ingress").count(), 1);
        let ingress = list.find("Ingress", "web").unwrap();
        assert_eq!(ingress.api_version(), "networking.k8s.io/v1");
        assert_eq!(ingress.str_at("/spec/rules/0/host"), Some("web.apps.example.com"));
        assert_eq!(
            ingress.get("/spec/rules/0/http/paths/0/backend/service/port/number").unwrap(),
            &json!(8080)
        );
    }

    #[test]
    fn test_nothing_without_host_or_on_openshift() {
        let project = ProjectContext::new(ProjectInfo::default(), "/tmp/app");
        let config = ResourceConfig::default();
        let processors = ProcessorConfig::new();
        let ctx = EnricherContext::new(&project, &config, &processors);
        let mut list = services();
        IngressEnricher.create(&ctx, &mut list).unwrap();
        assert_eq!(list.of_kind("Ingress").count(), 0);

        let processors = ProcessorConfig::new().with_setting(NAME, "host", "shop.example.com");
        let ctx = EnricherContext::new(&project, &config, &processors).with_mode(PlatformMode::Openshift);
        IngressEnricher.create(&ctx, &mut list).unwrap();
        assert_eq!(list.of_kind("Ingress").count(), 0);
    }
}
