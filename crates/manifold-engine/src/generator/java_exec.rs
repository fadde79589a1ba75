use std::collections::BTreeMap;

use manifold_core::{AssemblyConfiguration, BuildConfiguration, ImageConfiguration, ProjectContext};

use super::{Generator, GeneratorContext, GeneratorSettings};
use crate::error::Result;

const NAME: &str = "java-exec";

pub(super) const JAVA_BASE_IMAGE: &str = "quay.io/jkube/jkube-java";
pub(super) const DEPLOYMENTS_DIR: &str = "/deployments";
pub(super) const SPRING_BOOT_GROUP: &str = "org.springframework.boot";

/// Runs a plain executable jar
#[derive(Debug, Clone, Copy, Default)]
pub struct JavaExecGenerator;

/// Java image with the web, Jolokia and Prometheus ports
pub(super) fn java_build(
    settings: &GeneratorSettings<'_>,
    web_port: u16,
    pre_package: bool,
) -> BuildConfiguration {
    let mut build = settings.base_build(JAVA_BASE_IMAGE);
    build.ports = [
        settings.get_port("webPort", web_port),
        settings.get_port("jolokiaPort", 8778),
        settings.get_port("prometheusPort", 9779),
    ]
    .into_iter()
    .flatten()
    .collect();

    let mut env = BTreeMap::new();
    env.insert("JAVA_APP_DIR".to_string(), DEPLOYMENTS_DIR.to_string());
    if let Some(main_class) = settings.get("mainClass") {
        env.insert("JAVA_MAIN_CLASS".to_string(), main_class);
    }
    build.env = env;
    build.workdir = Some(DEPLOYMENTS_DIR.to_string());

    // no artifact to assemble before packaging
    if !pre_package {
        build.assembly = Some(AssemblyConfiguration {
            target_dir: Some(settings.get_or("targetDir", DEPLOYMENTS_DIR)),
            exclude_final_output_artifact: Some(false),
            ..Default::default()
        });
    }
    build
}

fn is_spring_boot(project: &ProjectContext) -> bool {
    project.has_dependency(SPRING_BOOT_GROUP, None)
}

impl Generator for JavaExecGenerator {
    fn name(&self) -> &'static str {
        NAME
    }

    fn is_applicable(&self, ctx: &GeneratorContext<'_>, configs: &[ImageConfiguration]) -> Result<bool> {
        Ok(ctx.project.info.packaging == "jar"
            && !is_spring_boot(ctx.project)
            && ctx.settings(NAME).should_add_image(configs))
    }

    fn customize(
        &self,
        ctx: &GeneratorContext<'_>,
        configs: Vec<ImageConfiguration>,
        pre_package: bool,
    ) -> Result<Vec<ImageConfiguration>> {
        let settings = ctx.settings(NAME);
        let build = java_build(&settings, 8080, pre_package);
        Ok(settings.add_image(configs, settings.image(build)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use manifold_core::{Dependency, ProcessorConfig, ProjectInfo};

    fn project(packaging: &str) -> ProjectContext {
        ProjectContext::new(
            ProjectInfo {
                packaging: packaging.into(),
                ..Default::default()
            },
            "/tmp/app",
        )
    }

    #[test]
    fn test_applicable_for_plain_jar() {
        let config = ProcessorConfig::new();
        let jar = project("jar");
        assert!(JavaExecGenerator
            .is_applicable(&GeneratorContext::new(&jar, &config), &[])
            .unwrap());

        let war = project("war");
        assert!(!JavaExecGenerator
            .is_applicable(&GeneratorContext::new(&war, &config), &[])
            .unwrap());

        let mut boot = project("jar");
        boot.info.dependencies.push(Dependency {
            group_id: SPRING_BOOT_GROUP.into(),
            artifact_id: "spring-boot-starter".into(),
            version: None,
        });
        assert!(!JavaExecGenerator
            .is_applicable(&GeneratorContext::new(&boot, &config), &[])
            .unwrap());
    }

    #[test]
    fn test_not_applicable_when_user_declares_a_build() {
        let config = ProcessorConfig::new();
        let jar = project("jar");
        let ctx = GeneratorContext::new(&jar, &config);
        let user = vec![ImageConfiguration {
            name: Some("mine".into()),
            build: Some(BuildConfiguration::default()),
            ..Default::default()
        }];
        assert!(!JavaExecGenerator.is_applicable(&ctx, &user).unwrap());

        let forced = ProcessorConfig::new().with_setting(NAME, "add", true);
        let ctx = GeneratorContext::new(&jar, &forced);
        assert!(JavaExecGenerator.is_applicable(&ctx, &user).unwrap());
    }

    #[test]
    fn test_customize_builds_java_image() {
        let config = ProcessorConfig::new().with_setting(NAME, "mainClass", "org.acme.Main");
        let jar = project("jar");
        let ctx = GeneratorContext::new(&jar, &config);

        let images = JavaExecGenerator.customize(&ctx, Vec::new(), false).unwrap();
        assert_eq!(images.len(), 1);
        let build = images[0].build.as_ref().unwrap();
        assert_eq!(build.from.as_deref(), Some(JAVA_BASE_IMAGE));
        assert_eq!(build.ports, vec!["8080", "8778", "9779"]);
        assert_eq!(build.env["JAVA_MAIN_CLASS"], "org.acme.Main");
        assert!(build.assembly.is_some());

        let images = JavaExecGenerator.customize(&ctx, Vec::new(), true).unwrap();
        assert!(images[0].build.as_ref().unwrap().assembly.is_none());
    }
}
