//! Resource generation orchestration
//!
//! Reads fragments, runs the enricher pipeline (once for the main resource
//! directories, once per profile subdirectory), sorts the aggregate and
//! validates it. Writing is a separate step so nothing reaches disk when
//! generation or validation fails.

use std::path::{Path, PathBuf};

use manifold_core::{
    BuildStrategy, ImageConfiguration, LoadedProject, PlatformMode, ProcessorConfig,
    ProcessorKind, ProjectContext, ResourceConfig, ResourceFileType,
    blend_profile_with_configuration, resolve, resolve_profile,
};

use crate::enricher::{EnricherContext, EnricherManager, sanitize_name};
use crate::error::Result;
use crate::fragment::{
    FragmentResolver, LocalFragmentResolver, list_fragments, list_profile_dirs, read_fragment,
};
use crate::resource::ResourceList;
use crate::validation::SchemaValidator;
use crate::writer::{ResourceWriter, item_file_names, output_items};

/// Inputs of resource generation
#[derive(Debug, Clone)]
pub struct ResourceServiceConfig {
    pub project: ProjectContext,
    /// Directories scanned for fragments, `profiles.yaml` and profile subdirectories
    pub resource_dirs: Vec<PathBuf>,
    pub target_dir: PathBuf,
    /// Resolved against the project properties
    pub resources: ResourceConfig,
    /// Explicit enricher configuration, blended over the profile
    pub enricher: ProcessorConfig,
    pub profile: Option<String>,
    /// Final images from the generator pipeline
    pub images: Vec<ImageConfiguration>,
    pub remote_fragments: Vec<String>,
    pub strategy: BuildStrategy,
    pub file_type: ResourceFileType,
    pub interpolate_template_parameters: bool,
    pub validate: bool,
    pub schema_dir: Option<PathBuf>,
}

impl ResourceServiceConfig {
    pub fn new(project: ProjectContext, target_dir: impl Into<PathBuf>) -> Self {
        Self {
            project,
            resource_dirs: Vec::new(),
            target_dir: target_dir.into(),
            resources: ResourceConfig::default(),
            enricher: ProcessorConfig::default(),
            profile: None,
            images: Vec::new(),
            remote_fragments: Vec::new(),
            strategy: BuildStrategy::default(),
            file_type: ResourceFileType::default(),
            interpolate_template_parameters: true,
            validate: false,
            schema_dir: None,
        }
    }

    /// Configuration for a loaded `manifold.yaml`
    pub fn from_project(
        loaded: &LoadedProject,
        project: ProjectContext,
        images: Vec<ImageConfiguration>,
    ) -> Result<Self> {
        let descriptor = &loaded.descriptor;
        let resources = resolve(&descriptor.resources, &project.properties)?;
        Ok(Self {
            resource_dirs: loaded.resource_dirs(),
            resources,
            enricher: descriptor.enricher.clone(),
            profile: descriptor.profile.clone(),
            images,
            remote_fragments: descriptor.remote_fragments.clone(),
            strategy: descriptor.build_strategy,
            file_type: descriptor.resource_file_type,
            interpolate_template_parameters: descriptor.interpolate_template_parameters,
            validate: descriptor.validate,
            schema_dir: loaded.schema_dir(),
            ..Self::new(project, loaded.target_dir())
        })
    }

    pub fn with_profile(mut self, profile: Option<String>) -> Self {
        if profile.is_some() {
            self.profile = profile;
        }
        self
    }

    pub fn with_validation(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }
}

/// Produces and writes the manifests of one project
pub struct ResourceService {
    config: ResourceServiceConfig,
    resolver: Box<dyn FragmentResolver>,
}

impl ResourceService {
    pub fn new(config: ResourceServiceConfig) -> Self {
        let resolver = LocalFragmentResolver::new(&config.project.base_dir);
        Self {
            config,
            resolver: Box::new(resolver),
        }
    }

    pub fn with_resolver(mut self, resolver: impl FragmentResolver + 'static) -> Self {
        self.resolver = Box::new(resolver);
        self
    }

    pub fn config(&self) -> &ResourceServiceConfig {
        &self.config
    }

    /// Name given to fragments whose file name carries none
    fn default_name(&self) -> String {
        let name = self
            .config
            .resources
            .controller_name
            .as_deref()
            .unwrap_or_else(|| self.config.project.artifact_id());
        sanitize_name(name)
    }

    fn read_dir(&self, dir: &Path, resources: &mut ResourceList) -> Result<()> {
        let default_name = self.default_name();
        for path in list_fragments(dir)? {
            for resource in read_fragment(&path, &default_name)? {
                resources.push(resource);
            }
        }
        Ok(())
    }

    fn enrich(
        &self,
        mode: PlatformMode,
        enrichers: &EnricherManager,
        config: &ProcessorConfig,
        resources: &mut ResourceList,
    ) -> Result<()> {
        let ctx = EnricherContext::new(&self.config.project, &self.config.resources, config)
            .with_images(&self.config.images)
            .with_mode(mode)
            .with_strategy(self.config.strategy);
        enrichers.create_and_enrich(&ctx, resources)
    }

    /// Build the complete, sorted resource list for `mode`
    pub fn generate_resources(&self, mode: PlatformMode, enrichers: &EnricherManager) -> Result<ResourceList> {
        let dirs = &self.config.resource_dirs;

        let mut resources = ResourceList::new();
        for dir in dirs {
            self.read_dir(dir, &mut resources)?;
        }
        let default_name = self.default_name();
        for location in &self.config.remote_fragments {
            let path = self.resolver.resolve(location)?;
            for resource in read_fragment(&path, &default_name)? {
                resources.push(resource);
            }
        }
        tracing::debug!(count = resources.len(), "read resource fragments");

        let config = blend_profile_with_configuration(
            ProcessorKind::Enricher,
            self.config.profile.as_deref(),
            dirs,
            &self.config.enricher,
        )?;
        self.enrich(mode, enrichers, &config, &mut resources)?;

        for dir in dirs {
            for (name, profile_dir) in list_profile_dirs(dir)? {
                let profile = resolve_profile(&name, dirs)?;
                let config = ProcessorConfig::blend(&profile.enricher, &self.config.enricher);

                let mut profile_resources = ResourceList::new();
                self.read_dir(&profile_dir, &mut profile_resources)?;
                self.enrich(mode, enrichers, &config, &mut profile_resources)?;
                tracing::debug!(
                    profile = %name,
                    count = profile_resources.len(),
                    "generated profile resources"
                );
                resources.extend(profile_resources);
            }
        }

        resources.sort();

        if self.config.validate {
            self.validate(&resources)?;
        }
        Ok(resources)
    }

    /// Check every item against the schemas, reporting by output file
    pub fn validate(&self, resources: &ResourceList) -> Result<()> {
        let mut validator = SchemaValidator::builtin()?;
        if let Some(dir) = &self.config.schema_dir {
            validator = validator.with_schema_dir(dir)?;
        }

        let items = output_items(resources);
        let files: Vec<String> = item_file_names(&items, self.config.file_type)
            .into_iter()
            .map(|name| self.config.target_dir.join(name).display().to_string())
            .collect();
        let report = validator.validate(items.iter().zip(files.iter().map(String::as_str)));
        if report.has_errors() {
            return Err(report.into());
        }
        Ok(())
    }

    /// Write `resources` below the target directory; returns the composite file
    pub fn write_resources(&self, resources: &ResourceList, classifier: &str) -> Result<PathBuf> {
        ResourceWriter::new(&self.config.target_dir, self.config.file_type)
            .with_interpolation(self.config.interpolate_template_parameters)
            .write(resources, classifier)
    }
}
