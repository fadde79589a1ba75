use k8s_openapi::api::core::v1::{Service, ServicePort, ServiceSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;

use super::{Enricher, EnricherContext, parse_port};
use crate::error::{EngineError, Result};
use crate::resource::{Resource, ResourceList};

const NAME: &str = "service";

/// Creates a Service for the ports of the first image that exposes any
#[derive(Debug, Clone, Copy, Default)]
pub struct ServiceEnricher;

/// Conventional port names
fn port_name(port: i32) -> String {
    match port {
        80 | 8080 => "http".to_string(),
        443 | 8443 => "https".to_string(),
        8778 => "jolokia".to_string(),
        9779 => "prometheus".to_string(),
        other => format!("port-{}", other),
    }
}

impl ServiceEnricher {
    fn ports(ctx: &EnricherContext<'_>) -> Result<Vec<ServicePort>> {
        let Some(image) = ctx.built_images().find(|i| !i.ports().is_empty()) else {
            return Ok(Vec::new());
        };

        let mut ports = image
            .ports()
            .iter()
            .map(|spec| {
                parse_port(spec)
                    .map(|(port, protocol)| ServicePort {
                        name: Some(port_name(port)),
                        port,
                        target_port: Some(IntOrString::Int(port)),
                        protocol: Some(protocol.to_string()),
                        ..Default::default()
                    })
                    .ok_or_else(|| EngineError::enricher(NAME, format!("invalid port '{}'", spec)))
            })
            .collect::<Result<Vec<_>>>()?;

        if !ctx.setting_bool(NAME, "multiplePorts", false) {
            ports.truncate(1);
        }
        if let (Some(first), Some(port)) = (ports.first_mut(), ctx.setting_i32(NAME, "port")?) {
            first.port = port;
        }
        Ok(ports)
    }
}

impl Enricher for ServiceEnricher {
    fn name(&self) -> &'static str {
        NAME
    }

    fn create(&self, ctx: &EnricherContext<'_>, resources: &mut ResourceList) -> Result<()> {
        if !ctx.setting_bool(NAME, "expose", true) {
            return Ok(());
        }
        let ports = Self::ports(ctx)?;
        if ports.is_empty() {
            tracing::debug!("no exposed ports, skipping default service");
            return Ok(());
        }

        let name = ctx.setting(NAME, "name").unwrap_or_else(|| ctx.controller_name());
        if let Some(existing) = resources.find_mut("Service", &name) {
            // a user service with the default name only gets missing ports
            if existing.set_default("/spec/ports", serde_json::to_value(&ports)?) {
                tracing::debug!(service = %name, "added default ports to existing service");
            }
            return Ok(());
        }
        if resources.has_kind(&["Service"]) {
            tracing::debug!("services are already defined, skipping default service");
            return Ok(());
        }

        let service = Service {
            metadata: ObjectMeta {
                name: Some(name.clone()),
                ..Default::default()
            },
            spec: Some(ServiceSpec {
                ports: Some(ports),
                type_: ctx.setting(NAME, "type"),
                ..Default::default()
            }),
            ..Default::default()
        };
        tracing::debug!(service = %name, "adding default service");
        resources.push(Resource::from_typed(&service)?);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use manifold_core::{
        BuildConfiguration, ImageConfiguration, ProcessorConfig, ProjectContext, ProjectInfo,
        ResourceConfig,
    };
    use serde_json::json;

    fn images(ports: &[&str]) -> Vec<ImageConfiguration> {
        vec![ImageConfiguration {
            name: Some("acme/app:1".into()),
            build: Some(BuildConfiguration {
                ports: ports.iter().map(|p| p.to_string()).collect(),
                ..Default::default()
            }),
            ..Default::default()
        }]
    }

    #[test]
    fn test_creates_service_for_first_port() {
        let project = ProjectContext::new(ProjectInfo::default(), "/tmp/app");
        let images = images(&["8080", "8778"]);
        let config = ResourceConfig::default();
        let processors = ProcessorConfig::new().with_setting(NAME, "type", "NodePort");
        let ctx = EnricherContext::new(&project, &config, &processors).with_images(&images);

        let mut list = ResourceList::new();
        ServiceEnricher.create(&ctx, &mut list).unwrap();

        let svc = list.find("Service", "app").unwrap();
        assert_eq!(svc.str_at("/spec/type"), Some("NodePort"));
        assert_eq!(
            svc.get("/spec/ports").unwrap(),
            &json!([{ "name": "http", "port": 8080, "targetPort": 8080, "protocol": "TCP" }])
        );
    }

    #[test]
    fn test_multiple_ports_and_port_override() {
        let project = ProjectContext::new(ProjectInfo::default(), "/tmp/app");
        let images = images(&["8080", "8778"]);
        let config = ResourceConfig::default();
        let processors = ProcessorConfig::new()
            .with_setting(NAME, "multiplePorts", true)
            .with_setting(NAME, "port", 80);
        let ctx = EnricherContext::new(&project, &config, &processors).with_images(&images);

        let mut list = ResourceList::new();
        ServiceEnricher.create(&ctx, &mut list).unwrap();

        let svc = list.find("Service", "app").unwrap();
        assert_eq!(svc.get("/spec/ports/0/port").unwrap(), &json!(80));
        assert_eq!(svc.get("/spec/ports/0/targetPort").unwrap(), &json!(8080));
        assert_eq!(svc.str_at("/spec/ports/1/name"), Some("jolokia"));
    }

    #[test]
    fn test_existing_service_is_not_duplicated() {
        let project = ProjectContext::new(ProjectInfo::default(), "/tmp/app");
        let images = images(&["8080"]);
        let config = ResourceConfig::default();
        let processors = ProcessorConfig::new();
        let ctx = EnricherContext::new(&project, &config, &processors).with_images(&images);

        let mut list: ResourceList = [Resource::new(json!({
            "apiVersion": "v1",
            "kind": "Service",
            "metadata": { "name": "app", "annotations": { "service": "Yay" } },
        }))]
        .into_iter()
        .collect();
        ServiceEnricher.create(&ctx, &mut list).unwrap();

        assert_eq!(list.len(), 1);
        let svc = list.find("Service", "app").unwrap();
        assert_eq!(svc.get("/spec/ports/0/port").unwrap(), &json!(8080));
        assert_eq!(svc.str_at("/metadata/annotations/service"), Some("Yay"));
    }

    #[test]
    fn test_no_ports_no_service() {
        let project = ProjectContext::new(ProjectInfo::default(), "/tmp/app");
        let images = images(&[]);
        let config = ResourceConfig::default();
        let processors = ProcessorConfig::new();
        let ctx = EnricherContext::new(&project, &config, &processors).with_images(&images);

        let mut list = ResourceList::new();
        ServiceEnricher.create(&ctx, &mut list).unwrap();
        assert!(list.is_empty());
    }
}
