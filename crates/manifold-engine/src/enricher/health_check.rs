use k8s_openapi::api::core::v1::{HTTPGetAction, Probe, TCPSocketAction};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use serde_json::Value as JsonValue;

use super::{Enricher, EnricherContext, pod_owners};
use crate::error::Result;
use crate::resource::ResourceList;

const NAME: &str = "health-check";
const READINESS_DELAY: i32 = 10;
const LIVENESS_DELAY: i32 = 180;

/// Adds readiness and liveness probes on the first container port.
///
/// Settings: `path` switches from a TCP to an HTTP probe, `port` overrides
/// the probed port, `scheme` applies to HTTP probes and `initialDelay`
/// replaces both default delays.
#[derive(Debug, Clone, Copy, Default)]
pub struct HealthCheckEnricher;

struct ProbeSettings {
    path: Option<String>,
    port: Option<i32>,
    scheme: String,
    initial_delay: Option<i32>,
}

impl ProbeSettings {
    fn load(ctx: &EnricherContext<'_>) -> Result<Self> {
        Ok(Self {
            path: ctx.setting(NAME, "path"),
            port: ctx.setting_i32(NAME, "port")?,
            scheme: ctx
                .setting(NAME, "scheme")
                .unwrap_or_else(|| "HTTP".to_string())
                .to_uppercase(),
            initial_delay: ctx.setting_i32(NAME, "initialDelay")?,
        })
    }

    fn probe(&self, port: i32, default_delay: i32) -> Probe {
        let port = IntOrString::Int(port);
        let (http_get, tcp_socket) = match &self.path {
            Some(path) => (
                Some(HTTPGetAction {
                    path: Some(path.clone()),
                    port,
                    scheme: Some(self.scheme.clone()),
                    ..Default::default()
                }),
                None,
            ),
            None => (
                None,
                Some(TCPSocketAction {
                    port,
                    ..Default::default()
                }),
            ),
        };
        Probe {
            http_get,
            tcp_socket,
            initial_delay_seconds: Some(self.initial_delay.unwrap_or(default_delay)),
            ..Default::default()
        }
    }
}

fn first_container_port(container: &JsonValue) -> Option<i32> {
    container
        .pointer("/ports/0/containerPort")
        .and_then(JsonValue::as_i64)
        .and_then(|p| i32::try_from(p).ok())
}

impl Enricher for HealthCheckEnricher {
    fn name(&self) -> &'static str {
        NAME
    }

    fn enrich(&self, ctx: &EnricherContext<'_>, resources: &mut ResourceList) -> Result<()> {
        let settings = ProbeSettings::load(ctx)?;

        for resource in pod_owners(resources) {
            let Some(containers) = resource.containers_mut() else {
                continue;
            };
            for container in containers.iter_mut().filter(|c| c.is_object()) {
                let Some(port) = settings.port.or_else(|| first_container_port(container)) else {
                    continue;
                };
                for (field, delay) in [
                    ("readinessProbe", READINESS_DELAY),
                    ("livenessProbe", LIVENESS_DELAY),
                ] {
                    if container.get(field).is_none_or(JsonValue::is_null) {
                        container[field] = serde_json::to_value(settings.probe(port, delay))?;
                    }
                }
            }
        }
        Ok(())
    }
}
