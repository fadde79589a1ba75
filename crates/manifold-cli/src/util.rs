//! Project loading and image generation shared by the commands

use std::path::{Path, PathBuf};

use manifold_core::{
    IMAGE_PROPERTY_PREFIX, ImageConfiguration, LoadedProject, PlatformMode, ProcessorKind,
    ProjectContext, Properties, blend_profile_with_configuration, parse_define_args, resolve,
};
use manifold_engine::{GeneratedImages, GeneratorContext, GeneratorManager};

use crate::error::Result;

/// A loaded descriptor plus its property-resolved context
pub struct Session {
    pub loaded: LoadedProject,
    pub context: ProjectContext,
}

impl Session {
    /// Load `path` and layer properties: descriptor, then files in order, then `-D` pairs
    pub fn load(path: &Path, property_files: &[PathBuf], defines: &[String]) -> Result<Self> {
        let loaded = LoadedProject::load(path)?;

        let mut extra = Properties::new();
        for file in property_files {
            extra.merge(&Properties::from_file(file)?);
        }
        extra.merge(&parse_define_args(defines)?);

        let context = loaded.context(&extra);
        tracing::debug!(
            project = %context.artifact_id(),
            properties = context.properties.len(),
            "loaded project"
        );
        Ok(Self { loaded, context })
    }

    /// Descriptor images with properties applied.
    ///
    /// Without declared images, a property-only image is built when any
    /// `manifold.image.*` property is present.
    pub fn configured_images(&self) -> Result<Vec<ImageConfiguration>> {
        let properties = &self.context.properties;
        let mut images = self
            .loaded
            .descriptor
            .images
            .iter()
            .map(|image| resolve(image, properties))
            .collect::<manifold_core::Result<Vec<_>>>()?;

        if images.is_empty() && properties.with_prefix(IMAGE_PROPERTY_PREFIX).next().is_some() {
            images.push(resolve(&ImageConfiguration::default(), properties)?);
        }
        Ok(images)
    }

    /// Run the generator pipeline over the configured images
    pub fn generate_images(
        &self,
        mode: PlatformMode,
        profile: Option<&str>,
        pre_package: bool,
    ) -> Result<GeneratedImages> {
        let descriptor = &self.loaded.descriptor;
        let profile = profile.or(descriptor.profile.as_deref());
        let config = blend_profile_with_configuration(
            ProcessorKind::Generator,
            profile,
            &self.loaded.resource_dirs(),
            &descriptor.generator,
        )?;

        let ctx = GeneratorContext::new(&self.context, &config)
            .with_mode(mode)
            .with_strategy(descriptor.build_strategy)
            .with_image_filter(&descriptor.image_filter);

        let images = self.configured_images()?;
        Ok(GeneratorManager::with_defaults().generate_and_merge(&ctx, images, pre_package)?)
    }
}
