use std::collections::BTreeSet;

use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec};
use k8s_openapi::api::core::v1::{Container, ContainerPort, PodSpec, PodTemplateSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};
use manifold_core::{ImageConfiguration, VolumeConfig};
use serde_json::{Value as JsonValue, json};

use super::{Enricher, EnricherContext, image_stream_ref, parse_port, sanitize_name};
use crate::error::{EngineError, Result};
use crate::resource::{CONTROLLER_KINDS, Resource, ResourceList};

const NAME: &str = "controller";

/// Kinds whose replica count the enricher manages
const SCALABLE: &[&str] = &["Deployment", "DeploymentConfig", "StatefulSet", "ReplicaSet"];

/// Creates the default Deployment (or DeploymentConfig on OpenShift) running
/// one container per built image
#[derive(Debug, Clone, Copy, Default)]
pub struct ControllerEnricher;

impl ControllerEnricher {
    fn controller_kind(ctx: &EnricherContext<'_>) -> Result<&'static str> {
        let default = if ctx.mode.is_openshift() {
            "DeploymentConfig"
        } else {
            "Deployment"
        };
        match ctx.setting(NAME, "type").as_deref() {
            None => Ok(default),
            Some(t) if t.eq_ignore_ascii_case("Deployment") => Ok("Deployment"),
            Some(t) if t.eq_ignore_ascii_case("DeploymentConfig") => Ok("DeploymentConfig"),
            Some(other) => Err(EngineError::enricher(
                NAME,
                format!("unsupported controller type '{}', expected Deployment or DeploymentConfig", other),
            )),
        }
    }

    fn replicas(ctx: &EnricherContext<'_>) -> Result<i32> {
        match ctx.resources.replicas {
            Some(replicas) => Ok(replicas),
            None => Ok(ctx.setting_i32(NAME, "replicaCount")?.unwrap_or(1)),
        }
    }
}

/// One container per built image
pub(crate) fn default_containers(ctx: &EnricherContext<'_>) -> Result<Vec<Container>> {
    let mut used = BTreeSet::new();
    ctx.built_images()
        .enumerate()
        .map(|(idx, image)| -> Result<Container> {
            let mut name = container_name(ctx, image);
            if !used.insert(name.clone()) {
                name = format!("{}-{}", name, idx);
                used.insert(name.clone());
            }
            Ok(Container {
                name,
                image: image.full_name(),
                ports: container_ports(image)?,
                ..Default::default()
            })
        })
        .collect()
}

fn container_name(ctx: &EnricherContext<'_>, image: &ImageConfiguration) -> String {
    let base = image
        .alias
        .as_deref()
        .map(sanitize_name)
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| sanitize_name(ctx.project.artifact_id()));
    if base.is_empty() {
        "app".to_string()
    } else {
        base
    }
}

fn container_ports(image: &ImageConfiguration) -> Result<Option<Vec<ContainerPort>>> {
    let ports = image
        .ports()
        .iter()
        .map(|spec| -> Result<ContainerPort> {
            let (port, protocol) = parse_port(spec).ok_or_else(|| {
                EngineError::enricher(
                    NAME,
                    format!("invalid port '{}' for image {}", spec, image.description()),
                )
            })?;
            Ok(ContainerPort {
                container_port: port,
                protocol: Some(protocol.to_string()),
                ..Default::default()
            })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok((!ports.is_empty()).then_some(ports))
}

/// Pod volume and its mount path for a configured volume
fn volume(config: &VolumeConfig) -> Result<(JsonValue, JsonValue)> {
    let source = || {
        config.source.clone().ok_or_else(|| {
            EngineError::enricher(NAME, format!("volume '{}' of type '{}' needs a source", config.name, config.volume_type))
        })
    };
    let volume = match config.volume_type.as_str() {
        "emptyDir" => json!({ "name": config.name, "emptyDir": {} }),
        "hostPath" => json!({ "name": config.name, "hostPath": { "path": source()? } }),
        "configMap" => json!({ "name": config.name, "configMap": { "name": source()? } }),
        "secret" => json!({ "name": config.name, "secret": { "secretName": source()? } }),
        "persistentVolumeClaim" | "pvc" => {
            json!({ "name": config.name, "persistentVolumeClaim": { "claimName": source()? } })
        }
        other => {
            return Err(EngineError::enricher(
                NAME,
                format!("unsupported volume type '{}' for volume '{}'", other, config.name),
            ));
        }
    };
    let mut mount = json!({ "name": config.name, "mountPath": config.path });
    if let Some(read_only) = config.read_only {
        mount["readOnly"] = JsonValue::Bool(read_only);
    }
    Ok((volume, mount))
}

fn pod_template(ctx: &EnricherContext<'_>) -> Result<JsonValue> {
    let mut template = serde_json::to_value(PodTemplateSpec {
        metadata: Some(ObjectMeta::default()),
        spec: Some(PodSpec {
            containers: default_containers(ctx)?,
            ..Default::default()
        }),
    })?;

    if !ctx.resources.volumes.is_empty() {
        let (volumes, mounts): (Vec<_>, Vec<_>) = ctx
            .resources
            .volumes
            .iter()
            .map(volume)
            .collect::<Result<Vec<_>>>()?
            .into_iter()
            .unzip();
        template["spec"]["volumes"] = JsonValue::Array(volumes);
        if let Some(containers) = template["spec"]["containers"].as_array_mut() {
            for container in containers {
                container["volumeMounts"] = JsonValue::Array(mounts.clone());
            }
        }
    }
    Ok(template)
}

fn deployment(ctx: &EnricherContext<'_>, name: &str) -> Result<Resource> {
    let mut deployment = Resource::from_typed(&Deployment {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            ..Default::default()
        },
        spec: Some(DeploymentSpec {
            replicas: Some(ControllerEnricher::replicas(ctx)?),
            selector: LabelSelector::default(),
            ..Default::default()
        }),
        ..Default::default()
    })?;
    deployment.value_mut()["spec"]["template"] = pod_template(ctx)?;
    Ok(deployment)
}

fn deployment_config(ctx: &EnricherContext<'_>, name: &str) -> Result<Resource> {
    let mut triggers = vec![json!({ "type": "ConfigChange" })];
    let containers = default_containers(ctx)?;
    for (container, image) in containers.iter().zip(ctx.built_images()) {
        let (stream, tag) = image_stream_ref(image);
        triggers.push(json!({
            "type": "ImageChange",
            "imageChangeParams": {
                "automatic": true,
                "containerNames": [container.name],
                "from": { "kind": "ImageStreamTag", "name": format!("{}:{}", stream, tag) },
            },
        }));
    }

    let mut dc = Resource::skeleton("DeploymentConfig", name);
    let spec = dc.object_at_mut("/spec");
    spec.insert("replicas".into(), json!(ControllerEnricher::replicas(ctx)?));
    spec.insert("selector".into(), json!({}));
    spec.insert("template".into(), pod_template(ctx)?);
    spec.insert("triggers".into(), JsonValue::Array(triggers));
    Ok(dc)
}

impl Enricher for ControllerEnricher {
    fn name(&self) -> &'static str {
        NAME
    }

    fn create(&self, ctx: &EnricherContext<'_>, resources: &mut ResourceList) -> Result<()> {
        if ctx.built_images().next().is_none() {
            tracing::debug!("no built images, skipping default controller");
            return Ok(());
        }
        if resources.has_kind(CONTROLLER_KINDS) {
            tracing::debug!("a controller is already defined, skipping default controller");
            return Ok(());
        }

        let name = ctx.controller_name();
        let controller = match Self::controller_kind(ctx)? {
            "DeploymentConfig" => deployment_config(ctx, &name)?,
            _ => deployment(ctx, &name)?,
        };
        tracing::debug!(kind = controller.kind(), name = %name, "adding default controller");
        resources.push(controller);
        Ok(())
    }

    fn enrich(&self, ctx: &EnricherContext<'_>, resources: &mut ResourceList) -> Result<()> {
        let containers = default_containers(ctx)?;
        for resource in resources.iter_mut().filter(|r| r.is_controller()) {
            if SCALABLE.contains(&resource.kind()) {
                if let Some(replicas) = ctx.resources.replicas {
                    resource.set_default("/spec/replicas", json!(replicas));
                }
            }
            // partial controller fragments get the image containers
            if !containers.is_empty() && resource.is_unset("/spec/template/spec/containers") {
                resource
                    .object_at_mut("/spec/template/spec")
                    .insert("containers".into(), serde_json::to_value(&containers)?);
            }
        }
        Ok(())
    }
}
