//! Generator pipeline
//!
//! Generators detect project conventions and synthesize image build
//! configurations. They run in the order given by the generator
//! `ProcessorConfig` and each sees the list as left by the previous one.

mod base;
mod dockerfile;
mod java_exec;
mod spring_boot;
mod webapp;

pub use base::{DEFAULT_NAME_FORMAT, GeneratorSettings, istag_reference};
pub use dockerfile::DockerfileGenerator;
pub use java_exec::JavaExecGenerator;
pub use spring_boot::SpringBootGenerator;
pub use webapp::WebAppGenerator;

use manifold_core::{
    BuildStrategy, ImageConfiguration, PlatformMode, ProcessorConfig, ProjectContext,
    validate_images, filter_images,
};

use crate::error::Result;

/// A pluggable image configuration producer
pub trait Generator {
    /// Stable name used in include/exclude lists and settings
    fn name(&self) -> &'static str;

    /// Whether this generator has anything to contribute
    fn is_applicable(&self, ctx: &GeneratorContext<'_>, configs: &[ImageConfiguration]) -> Result<bool>;

    /// Return the new image list; `pre_package` is set when the project
    /// artifact has not been built yet
    fn customize(
        &self,
        ctx: &GeneratorContext<'_>,
        configs: Vec<ImageConfiguration>,
        pre_package: bool,
    ) -> Result<Vec<ImageConfiguration>>;
}

/// Read-only inputs of one generator run
#[derive(Debug, Clone, Copy)]
pub struct GeneratorContext<'a> {
    pub project: &'a ProjectContext,
    /// Blended generator configuration
    pub config: &'a ProcessorConfig,
    pub mode: PlatformMode,
    pub strategy: BuildStrategy,
    /// Name/alias filters; empty keeps every image
    pub image_filter: &'a [String],
}

impl<'a> GeneratorContext<'a> {
    pub fn new(project: &'a ProjectContext, config: &'a ProcessorConfig) -> Self {
        Self {
            project,
            config,
            mode: PlatformMode::default(),
            strategy: BuildStrategy::default(),
            image_filter: &[],
        }
    }

    pub fn with_mode(mut self, mode: PlatformMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_strategy(mut self, strategy: BuildStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_image_filter(mut self, filter: &'a [String]) -> Self {
        self.image_filter = filter;
        self
    }

    /// Settings view for one generator
    pub fn settings(&self, generator: &'a str) -> GeneratorSettings<'a> {
        GeneratorSettings::new(*self, generator)
    }
}

/// Result of `generate_and_merge`
#[derive(Debug, Clone, Default)]
pub struct GeneratedImages {
    /// Validated images that pass the image filter
    pub images: Vec<ImageConfiguration>,
    /// Generators whose `customize` ran, in order
    pub applied: Vec<&'static str>,
    /// Set when a filter is configured and nothing matched it
    pub filter_warning: Option<String>,
}

/// Registry and driver of generators
pub struct GeneratorManager {
    generators: Vec<Box<dyn Generator>>,
}

impl Default for GeneratorManager {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl GeneratorManager {
    /// Empty registry
    pub fn new() -> Self {
        Self {
            generators: Vec::new(),
        }
    }

    /// Registry holding the built-in generators in their default order
    pub fn with_defaults() -> Self {
        Self::new()
            .register(DockerfileGenerator)
            .register(SpringBootGenerator)
            .register(JavaExecGenerator)
            .register(WebAppGenerator)
    }

    pub fn register(mut self, generator: impl Generator + 'static) -> Self {
        self.generators.push(Box::new(generator));
        self
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.generators.iter().map(|g| g.name()).collect()
    }

    /// Run the configured generators over `images`, validate the result
    /// and apply the image filter
    pub fn generate_and_merge(
        &self,
        ctx: &GeneratorContext<'_>,
        images: Vec<ImageConfiguration>,
        pre_package: bool,
    ) -> Result<GeneratedImages> {
        let mut images = images;
        let mut applied = Vec::new();

        for generator in ctx.config.prepare(&self.generators, |g| g.name()) {
            if !generator.is_applicable(ctx, &images)? {
                tracing::debug!(generator = generator.name(), "not applicable");
                continue;
            }
            tracing::debug!(generator = generator.name(), "customizing images");
            images = generator.customize(ctx, images, pre_package)?;
            applied.push(generator.name());
        }

        let images = validate_images(images, &ctx.project.name_formatter())?;
        let (images, filter_warning) = filter_images(&images, ctx.image_filter);
        if let Some(warning) = &filter_warning {
            tracing::warn!("{}", warning);
        }

        Ok(GeneratedImages {
            images,
            applied,
            filter_warning,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use manifold_core::{BuildConfiguration, ProjectInfo};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn project() -> ProjectContext {
        ProjectContext::new(
            ProjectInfo {
                group_id: "org.acme".into(),
                artifact_id: "shop".into(),
                version: "1.0.0".into(),
                ..Default::default()
            },
            "/nonexistent/shop",
        )
    }

    /// Records what it saw so ordering can be asserted
    struct Recording {
        name: &'static str,
        seen: Rc<RefCell<Vec<(&'static str, usize)>>>,
    }

    impl Generator for Recording {
        fn name(&self) -> &'static str {
            self.name
        }

        fn is_applicable(&self, _: &GeneratorContext<'_>, _: &[ImageConfiguration]) -> Result<bool> {
            Ok(true)
        }

        fn customize(
            &self,
            _: &GeneratorContext<'_>,
            mut configs: Vec<ImageConfiguration>,
            _: bool,
        ) -> Result<Vec<ImageConfiguration>> {
            self.seen.borrow_mut().push((self.name, configs.len()));
            configs.push(ImageConfiguration {
                name: Some(format!("acme/{}:1", self.name)),
                alias: Some(self.name.to_string()),
                ..Default::default()
            });
            Ok(configs)
        }
    }

    fn recording_manager(seen: &Rc<RefCell<Vec<(&'static str, usize)>>>) -> GeneratorManager {
        GeneratorManager::new()
            .register(Recording {
                name: "a",
                seen: Rc::clone(seen),
            })
            .register(Recording {
                name: "b",
                seen: Rc::clone(seen),
            })
    }

    #[test]
    fn test_generators_run_in_include_order_without_interleaving() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let manager = recording_manager(&seen);
        let project = project();
        let config = ProcessorConfig::including(["b", "a"]);
        let ctx = GeneratorContext::new(&project, &config);

        let result = manager.generate_and_merge(&ctx, Vec::new(), false).unwrap();

        assert_eq!(result.applied, vec!["b", "a"]);
        assert_eq!(*seen.borrow(), vec![("b", 0), ("a", 1)]);
        assert_eq!(result.images.len(), 2);
    }

    #[test]
    fn test_excluded_generator_never_runs() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let manager = recording_manager(&seen);
        let project = project();
        let config = ProcessorConfig::new().with_excludes(["a"]);
        let ctx = GeneratorContext::new(&project, &config);

        let result = manager.generate_and_merge(&ctx, Vec::new(), false).unwrap();

        assert_eq!(result.applied, vec!["b"]);
        assert!(seen.borrow().iter().all(|(name, _)| *name != "a"));
    }

    #[test]
    fn test_unknown_include_and_unmatched_filter() {
        let manager = GeneratorManager::with_defaults();
        let project = project();
        let config = ProcessorConfig::including(["does-not-exist"]);
        let filter = vec!["frontend".to_string()];
        let ctx = GeneratorContext::new(&project, &config).with_image_filter(&filter);

        let user_images = vec![ImageConfiguration {
            name: Some("%g/%a:%l".into()),
            build: Some(BuildConfiguration::default()),
            ..Default::default()
        }];
        let result = manager.generate_and_merge(&ctx, user_images, false).unwrap();

        assert!(result.applied.is_empty());
        assert!(result.images.is_empty());
        let warning = result.filter_warning.unwrap();
        assert!(warning.contains("acme/shop:1.0.0"));
        assert!(warning.contains("frontend"));
    }

    #[test]
    fn test_blank_name_fails_validation() {
        let manager = GeneratorManager::new();
        let project = project();
        let config = ProcessorConfig::new();
        let ctx = GeneratorContext::new(&project, &config);

        let err = manager
            .generate_and_merge(&ctx, vec![ImageConfiguration::default()], false)
            .unwrap_err();
        assert!(err.to_string().contains("name"));
    }

    #[test]
    fn test_default_registration_order() {
        assert_eq!(
            GeneratorManager::with_defaults().names(),
            vec!["dockerfile", "spring-boot", "java-exec", "webapp"]
        );
    }
}
