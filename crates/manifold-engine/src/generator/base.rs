use manifold_core::{BuildConfiguration, BuildStrategy, ImageConfiguration, ImageNameFormatter};

use super::GeneratorContext;

/// Image name used when a generator has no `name` setting
pub const DEFAULT_NAME_FORMAT: &str = "%g/%a:%l";

const PROPERTY_PREFIX: &str = "manifold.generator";

/// Settings lookup and shared behavior for one generator.
///
/// A setting is read from the blended generator config first, then from the
/// property `manifold.generator.<generator>.<key>`, then from
/// `manifold.generator.<key>`.
#[derive(Debug, Clone, Copy)]
pub struct GeneratorSettings<'a> {
    ctx: GeneratorContext<'a>,
    generator: &'a str,
}

impl<'a> GeneratorSettings<'a> {
    pub fn new(ctx: GeneratorContext<'a>, generator: &'a str) -> Self {
        Self { ctx, generator }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.ctx
            .config
            .get_string(self.generator, key)
            .or_else(|| {
                let project = self.ctx.project;
                project
                    .property(&format!("{}.{}.{}", PROPERTY_PREFIX, self.generator, key))
                    .or_else(|| project.property(&format!("{}.{}", PROPERTY_PREFIX, key)))
                    .map(str::to_string)
            })
            .filter(|v| !v.trim().is_empty())
    }

    pub fn get_or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_string())
    }

    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        self.get(key)
            .map(|v| v.trim().eq_ignore_ascii_case("true"))
            .unwrap_or(default)
    }

    /// Comma-separated list setting
    pub fn get_list(&self, key: &str) -> Vec<String> {
        self.get(key)
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Port setting; `0` disables the port
    pub fn get_port(&self, key: &str, default: u16) -> Option<String> {
        match self.get(key) {
            Some(v) if v.trim() == "0" => None,
            Some(v) => Some(v.trim().to_string()),
            None => Some(default.to_string()),
        }
    }

    /// Templated image name, not yet formatted
    pub fn image_name(&self) -> String {
        self.get_or("name", DEFAULT_NAME_FORMAT)
    }

    pub fn alias(&self) -> String {
        self.get_or("alias", self.generator)
    }

    /// Whether to add an image even though the user declared some
    pub fn add(&self) -> bool {
        self.get_bool("add", false)
    }

    /// Add a generated image only when no user image carries a build, or
    /// when `add` is set
    pub fn should_add_image(&self, configs: &[ImageConfiguration]) -> bool {
        self.add() || !configs.iter().any(ImageConfiguration::has_build)
    }

    /// Fill the settings shared by every generator: `from` (with its mode
    /// under OpenShift s2i) and `tags`
    pub fn base_build(&self, default_from: &str) -> BuildConfiguration {
        let from = self.get_or("from", default_from);
        let (from, from_mode) =
            if self.ctx.mode.is_openshift() && self.ctx.strategy == BuildStrategy::S2i {
                let mode = self.get_or("fromMode", "istag");
                if mode == "istag" {
                    (istag_reference(&from), Some(mode))
                } else {
                    (from, Some(mode))
                }
            } else {
                (from, None)
            };
        BuildConfiguration {
            from: Some(from),
            from_mode,
            tags: self.get_list("tags"),
            ..Default::default()
        }
    }

    /// Wrap a build into an image with name, alias and registry
    pub fn image(&self, build: BuildConfiguration) -> ImageConfiguration {
        ImageConfiguration {
            name: Some(self.image_name()),
            alias: Some(self.alias()),
            registry: self.get("registry"),
            property_resolver_prefix: None,
            build: Some(build),
        }
    }

    /// Append `image` unless its alias or formatted name is already taken
    pub fn add_image(
        &self,
        mut configs: Vec<ImageConfiguration>,
        image: ImageConfiguration,
    ) -> Vec<ImageConfiguration> {
        let formatter = self.ctx.project.name_formatter();
        let formatted = image.name.as_deref().map(|n| formatter.format(n));
        let taken = configs.iter().any(|existing| {
            let same_alias = image.alias.is_some() && existing.alias == image.alias;
            let same_name = existing
                .name
                .as_deref()
                .map(|n| formatter.format(n))
                .is_some_and(|n| Some(n) == formatted);
            same_alias || same_name
        });
        if taken {
            tracing::debug!(
                generator = self.generator,
                image = %image.description(),
                "an image with this name or alias already exists, not adding"
            );
        } else {
            configs.push(image);
        }
        configs
    }
}

/// Reference an image as an `ImageStreamTag`: last path segment, `latest`
/// tag when none is given
pub fn istag_reference(image: &str) -> String {
    let last = image.rsplit('/').next().unwrap_or(image);
    if last.contains(':') {
        last.to_string()
    } else {
        format!("{}:latest", last)
    }
}
