use manifold_core::ImageConfiguration;

use super::java_exec::{SPRING_BOOT_GROUP, java_build};
use super::{Generator, GeneratorContext};
use crate::error::Result;

const NAME: &str = "spring-boot";

/// Spring Boot fat jars; the web port follows `server.port`
#[derive(Debug, Clone, Copy, Default)]
pub struct SpringBootGenerator;

impl Generator for SpringBootGenerator {
    fn name(&self) -> &'static str {
        NAME
    }

    fn is_applicable(&self, ctx: &GeneratorContext<'_>, configs: &[ImageConfiguration]) -> Result<bool> {
        Ok(ctx.project.has_dependency(SPRING_BOOT_GROUP, None)
            && ctx.settings(NAME).should_add_image(configs))
    }

    fn customize(
        &self,
        ctx: &GeneratorContext<'_>,
        configs: Vec<ImageConfiguration>,
        pre_package: bool,
    ) -> Result<Vec<ImageConfiguration>> {
        let settings = ctx.settings(NAME);
        let web_port = ctx
            .project
            .property("server.port")
            .and_then(|p| p.trim().parse::<u16>().ok())
            .unwrap_or(8080);
        let build = java_build(&settings, web_port, pre_package);
        Ok(settings.add_image(configs, settings.image(build)))
    }
}
