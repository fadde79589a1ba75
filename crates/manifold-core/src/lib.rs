//! Manifold Core - configuration model and property resolution
//!
//! This crate provides the types the generator and enricher pipelines work on:
//! - `ImageConfiguration`: images to build, resolvable from properties
//! - `ResourceConfig`: user-level manifest defaults
//! - `ProcessorConfig` / `Profile`: which processors run and how
//! - `resolve`: table-driven property resolution with per-field combine policies
//! - `LoadedProject`: the `manifold.yaml` project descriptor

pub mod combine;
pub mod error;
pub mod image;
pub mod platform;
pub mod processor;
pub mod profile;
pub mod project;
pub mod properties;
pub mod resolver;
pub mod resource_config;

pub use combine::CombinePolicy;
pub use error::{CoreError, Result};
pub use image::{
    AssemblyConfiguration, BuildConfiguration, HealthCheckConfiguration, IMAGE_PROPERTY_PREFIX,
    IdentityFormatter,
    ImageConfiguration, ImageNameFormatter, filter_images, validate_images,
};
pub use platform::{BuildStrategy, PlatformMode, ResourceFileType};
pub use processor::ProcessorConfig;
pub use profile::{
    Profile, ProfileRepository, ProcessorKind, blend_profile_with_configuration, resolve_profile,
};
pub use project::{
    Dependency, LoadedProject, PlaceholderFormatter, ProjectContext, ProjectDescriptor, ProjectInfo,
};
pub use properties::{Properties, parse_define_args};
pub use resolver::{FieldKind, PropertyField, PropertyResolvable, ValueType, resolve};
pub use resource_config::{MetadataCategory, MetadataConfig, ResourceConfig, VolumeConfig};
