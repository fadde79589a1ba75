//! Enricher pipeline
//!
//! Enrichers run in two phases over the same ordered set: every enricher's
//! `create` runs before any enricher's `enrich`, so later enrichers can
//! still adjust resources created by earlier ones.

mod controller;
mod health_check;
mod image;
mod ingress;
mod metadata;
mod name;
mod openshift;
mod project_label;
mod service;
mod service_account;

pub use controller::ControllerEnricher;
pub use health_check::HealthCheckEnricher;
pub use image::ImageEnricher;
pub use ingress::IngressEnricher;
pub use metadata::MetadataEnricher;
pub use name::NameEnricher;
pub use openshift::{OpenShiftBuildEnricher, OpenShiftRouteEnricher};
pub use project_label::ProjectLabelEnricher;
pub use service::ServiceEnricher;
pub use service_account::ServiceAccountEnricher;

use manifold_core::{
    BuildStrategy, ImageConfiguration, PlatformMode, ProcessorConfig, ProjectContext,
    ResourceConfig,
};

use crate::error::{EngineError, Result};
use crate::resource::{Resource, ResourceList};

const PROPERTY_PREFIX: &str = "manifold.enricher";

/// A pluggable resource producer/decorator. Both phases default to no-ops.
pub trait Enricher {
    fn name(&self) -> &'static str;

    /// Append default resources that are not already present
    fn create(&self, _ctx: &EnricherContext<'_>, _resources: &mut ResourceList) -> Result<()> {
        Ok(())
    }

    /// Fill in fields the user left unset
    fn enrich(&self, _ctx: &EnricherContext<'_>, _resources: &mut ResourceList) -> Result<()> {
        Ok(())
    }
}

/// Read-only inputs of one enricher run, passed explicitly to every call
#[derive(Debug, Clone, Copy)]
pub struct EnricherContext<'a> {
    pub project: &'a ProjectContext,
    /// Final image configurations
    pub images: &'a [ImageConfiguration],
    pub resources: &'a ResourceConfig,
    /// Blended enricher configuration
    pub config: &'a ProcessorConfig,
    pub mode: PlatformMode,
    pub strategy: BuildStrategy,
}

impl<'a> EnricherContext<'a> {
    pub fn new(
        project: &'a ProjectContext,
        resources: &'a ResourceConfig,
        config: &'a ProcessorConfig,
    ) -> Self {
        Self {
            project,
            images: &[],
            resources,
            config,
            mode: PlatformMode::default(),
            strategy: BuildStrategy::default(),
        }
    }

    pub fn with_images(mut self, images: &'a [ImageConfiguration]) -> Self {
        self.images = images;
        self
    }

    pub fn with_mode(mut self, mode: PlatformMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_strategy(mut self, strategy: BuildStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Config value, falling back to `manifold.enricher.<enricher>.<key>`
    pub fn setting(&self, enricher: &str, key: &str) -> Option<String> {
        self.config
            .get_string(enricher, key)
            .or_else(|| {
                self.project
                    .property(&format!("{}.{}.{}", PROPERTY_PREFIX, enricher, key))
                    .map(str::to_string)
            })
            .filter(|v| !v.trim().is_empty())
    }

    pub fn setting_bool(&self, enricher: &str, key: &str, default: bool) -> bool {
        self.setting(enricher, key)
            .map(|v| v.trim().eq_ignore_ascii_case("true"))
            .unwrap_or(default)
    }

    pub fn setting_i32(&self, enricher: &str, key: &str) -> Result<Option<i32>> {
        self.setting(enricher, key)
            .map(|v| {
                v.trim().parse::<i32>().map_err(|_| {
                    EngineError::enricher(enricher, format!("'{}' must be an integer, got '{}'", key, v))
                })
            })
            .transpose()
    }

    /// Name of the default controller and of resources named after it
    pub fn controller_name(&self) -> String {
        let name = self
            .resources
            .controller_name
            .as_deref()
            .unwrap_or_else(|| self.project.artifact_id());
        sanitize_name(name)
    }

    /// Images that are built by the project
    pub fn built_images(&self) -> impl Iterator<Item = &'a ImageConfiguration> + 'a {
        self.images.iter().filter(|i| i.has_build())
    }
}

/// Registry and driver of enrichers
pub struct EnricherManager {
    enrichers: Vec<Box<dyn Enricher>>,
}

impl Default for EnricherManager {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl EnricherManager {
    pub fn new() -> Self {
        Self {
            enrichers: Vec::new(),
        }
    }

    /// Registry holding the built-in enrichers in their default order
    pub fn with_defaults() -> Self {
        Self::new()
            .register(NameEnricher)
            .register(ControllerEnricher)
            .register(ServiceEnricher)
            .register(ServiceAccountEnricher)
            .register(ImageEnricher)
            .register(MetadataEnricher)
            .register(ProjectLabelEnricher)
            .register(HealthCheckEnricher)
            .register(IngressEnricher)
            .register(OpenShiftBuildEnricher)
            .register(OpenShiftRouteEnricher)
    }

    pub fn register(mut self, enricher: impl Enricher + 'static) -> Self {
        self.enrichers.push(Box::new(enricher));
        self
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.enrichers.iter().map(|e| e.name()).collect()
    }

    /// Run the create phase, then the enrich phase, of the enrichers
    /// selected by `ctx.config`
    pub fn create_and_enrich(&self, ctx: &EnricherContext<'_>, resources: &mut ResourceList) -> Result<()> {
        let enrichers = ctx.config.prepare(&self.enrichers, |e| e.name());

        for enricher in &enrichers {
            tracing::debug!(enricher = enricher.name(), "creating default resources");
            enricher.create(ctx, resources)?;
        }
        for enricher in &enrichers {
            tracing::debug!(enricher = enricher.name(), "enriching resources");
            enricher.enrich(ctx, resources)?;
        }
        Ok(())
    }
}

/// Lowercase DNS-1123 label: alphanumerics and `-`, at most 63 characters
pub fn sanitize_name(name: &str) -> String {
    let mapped: String = name
        .to_ascii_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect();
    let trimmed = mapped.trim_matches('-');
    let mut out = String::with_capacity(trimmed.len());
    for c in trimmed.chars() {
        if c == '-' && out.ends_with('-') {
            continue;
        }
        out.push(c);
    }
    out.truncate(63);
    out.trim_end_matches('-').to_string()
}

/// A container port spec such as `8080` or `53/udp`
pub(crate) fn parse_port(spec: &str) -> Option<(i32, &'static str)> {
    let (number, protocol) = match spec.trim().split_once('/') {
        Some((n, p)) => (n, p),
        None => (spec.trim(), "tcp"),
    };
    let protocol = match protocol.to_ascii_lowercase().as_str() {
        "tcp" => "TCP",
        "udp" => "UDP",
        "sctp" => "SCTP",
        _ => return None,
    };
    number
        .parse::<i32>()
        .ok()
        .filter(|p| (1..=65535).contains(p))
        .map(|p| (p, protocol))
}

/// ImageStream name and tag for an image reference
pub(crate) fn image_stream_ref(image: &ImageConfiguration) -> (String, String) {
    let name = image.name.as_deref().unwrap_or_default();
    let last = name.rsplit('/').next().unwrap_or(name);
    let (stream, tag) = match last.split_once(':') {
        Some((stream, tag)) => (stream, tag),
        None => (last, "latest"),
    };
    (sanitize_name(stream), tag.to_string())
}

/// Services other enrichers may expose externally: they have a port, are
/// not headless and are not labeled `expose: "false"`
pub(crate) fn exposed_services(resources: &ResourceList) -> Vec<(String, i64)> {
    resources
        .of_kind("Service")
        .filter(|svc| svc.str_at("/metadata/labels/expose") != Some("false"))
        .filter(|svc| svc.str_at("/spec/clusterIP") != Some("None"))
        .filter_map(|svc| {
            let port = svc.get("/spec/ports/0/port")?.as_i64()?;
            Some((svc.name().to_string(), port))
        })
        .collect()
}

/// Resources carrying a pod spec
pub(crate) fn pod_owners(resources: &mut ResourceList) -> impl Iterator<Item = &mut Resource> {
    resources.iter_mut().filter(|r| r.pod_spec_pointer().is_some())
}

#[cfg(test)]
mod tests {
    use super::*;
    use manifold_core::{BuildConfiguration, ProjectInfo};
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("My_App.Service"), "my-app-service");
        assert_eq!(sanitize_name("--a--b--"), "a-b");
        assert_eq!(sanitize_name(&"x".repeat(80)).len(), 63);
    }

    #[test]
    fn test_parse_port() {
        assert_eq!(parse_port("8080"), Some((8080, "TCP")));
        assert_eq!(parse_port("53/udp"), Some((53, "UDP")));
        assert_eq!(parse_port("http"), None);
        assert_eq!(parse_port("70000"), None);
    }

    #[test]
    fn test_image_stream_ref() {
        let image = ImageConfiguration {
            name: Some("quay.io/acme/shop:1.2".into()),
            build: Some(BuildConfiguration::default()),
            ..Default::default()
        };
        assert_eq!(image_stream_ref(&image), ("shop".to_string(), "1.2".to_string()));
    }

    struct Phases {
        name: &'static str,
        log: Rc<RefCell<Vec<String>>>,
    }

    impl Enricher for Phases {
        fn name(&self) -> &'static str {
            self.name
        }

        fn create(&self, _: &EnricherContext<'_>, _: &mut ResourceList) -> Result<()> {
            self.log.borrow_mut().push(format!("create:{}", self.name));
            Ok(())
        }

        fn enrich(&self, _: &EnricherContext<'_>, _: &mut ResourceList) -> Result<()> {
            self.log.borrow_mut().push(format!("enrich:{}", self.name));
            Ok(())
        }
    }

    #[test]
    fn test_all_creates_run_before_any_enrich() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let manager = EnricherManager::new()
            .register(Phases {
                name: "a",
                log: Rc::clone(&log),
            })
            .register(Phases {
                name: "b",
                log: Rc::clone(&log),
            })
            .register(Phases {
                name: "c",
                log: Rc::clone(&log),
            });

        let project = ProjectContext::new(ProjectInfo::default(), "/tmp/app");
        let resources = ResourceConfig::default();
        let config = ProcessorConfig::including(["b", "a"]).with_excludes(["c"]);
        let ctx = EnricherContext::new(&project, &resources, &config);

        manager.create_and_enrich(&ctx, &mut ResourceList::new()).unwrap();

        assert_eq!(
            *log.borrow(),
            vec!["create:b", "create:a", "enrich:b", "enrich:a"]
        );
    }

    #[test]
    fn test_setting_falls_back_to_property() {
        let props = [("manifold.enricher.service.type", "NodePort")]
            .into_iter()
            .collect();
        let project = ProjectContext::new(ProjectInfo::default(), "/tmp/app").with_properties(props);
        let resources = ResourceConfig::default();
        let config = ProcessorConfig::new();
        let ctx = EnricherContext::new(&project, &resources, &config);

        assert_eq!(ctx.setting("service", "type").as_deref(), Some("NodePort"));
        assert!(ctx.setting("service", "port").is_none());
        assert_eq!(ctx.controller_name(), "app");
    }

    #[test]
    fn test_default_registration_matches_default_profile() {
        let profile = manifold_core::resolve_profile::<std::path::PathBuf>("default", &[]).unwrap();
        let mut registered = EnricherManager::with_defaults().names();
        let mut included: Vec<String> = profile.enricher.includes.unwrap();
        registered.sort();
        included.sort();
        assert_eq!(registered, included);
    }
}
