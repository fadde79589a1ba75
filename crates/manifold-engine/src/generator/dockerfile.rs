use manifold_core::{BuildConfiguration, ImageConfiguration};

use super::{Generator, GeneratorContext};
use crate::error::Result;

const NAME: &str = "dockerfile";

/// Builds from a `Dockerfile` in the project directory
#[derive(Debug, Clone, Copy, Default)]
pub struct DockerfileGenerator;

impl DockerfileGenerator {
    fn docker_file(ctx: &GeneratorContext<'_>) -> String {
        ctx.settings(NAME).get_or("dockerFile", "Dockerfile")
    }
}

impl Generator for DockerfileGenerator {
    fn name(&self) -> &'static str {
        NAME
    }

    fn is_applicable(&self, ctx: &GeneratorContext<'_>, configs: &[ImageConfiguration]) -> Result<bool> {
        let path = ctx.project.base_dir.join(Self::docker_file(ctx));
        Ok(path.is_file() && ctx.settings(NAME).should_add_image(configs))
    }

    fn customize(
        &self,
        ctx: &GeneratorContext<'_>,
        configs: Vec<ImageConfiguration>,
        _pre_package: bool,
    ) -> Result<Vec<ImageConfiguration>> {
        let settings = ctx.settings(NAME);
        let build = BuildConfiguration {
            docker_file: Some(Self::docker_file(ctx)),
            ports: settings.get_list("ports"),
            tags: settings.get_list("tags"),
            ..Default::default()
        };
        Ok(settings.add_image(configs, settings.image(build)))
    }
}
