use std::collections::BTreeMap;

use manifold_core::{AssemblyConfiguration, ImageConfiguration};

use super::{Generator, GeneratorContext};
use crate::error::Result;

const NAME: &str = "webapp";
const TOMCAT_BASE_IMAGE: &str = "quay.io/jkube/jkube-tomcat";

/// Deploys a `war` into an application server image
#[derive(Debug, Clone, Copy, Default)]
pub struct WebAppGenerator;

impl Generator for WebAppGenerator {
    fn name(&self) -> &'static str {
        NAME
    }

    fn is_applicable(&self, ctx: &GeneratorContext<'_>, configs: &[ImageConfiguration]) -> Result<bool> {
        Ok(ctx.project.info.packaging == "war" && ctx.settings(NAME).should_add_image(configs))
    }

    fn customize(
        &self,
        ctx: &GeneratorContext<'_>,
        configs: Vec<ImageConfiguration>,
        pre_package: bool,
    ) -> Result<Vec<ImageConfiguration>> {
        let settings = ctx.settings(NAME);
        let deployment_dir = settings.get_or("targetDir", "/deployments");

        let mut build = settings.base_build(TOMCAT_BASE_IMAGE);
        build.ports = settings.get_port("port", 8080).into_iter().collect();
        build.env = BTreeMap::from([("DEPLOY_DIR".to_string(), deployment_dir.clone())]);
        if !pre_package {
            build.assembly = Some(AssemblyConfiguration {
                target_dir: Some(deployment_dir),
                ..Default::default()
            });
        }
        if let Some(cmd) = settings.get("cmd") {
            build.cmd = vec![cmd];
        }

        Ok(settings.add_image(configs, settings.image(build)))
    }
}
