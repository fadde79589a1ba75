//! Manifold Engine - image generation and resource enrichment
//!
//! This crate turns a resolved project configuration into manifests:
//! - `GeneratorManager`: ordered, filterable generators producing image configurations
//! - `EnricherManager`: two-phase enrichers creating and decorating resources
//! - `overlay`: fill-missing-only label and annotation merging
//! - `ResourceService`: fragment discovery, per-profile enrichment, validation and writing

pub mod enricher;
pub mod error;
pub mod fragment;
pub mod generator;
pub mod overlay;
pub mod resource;
pub mod resource_service;
pub mod validation;
pub mod writer;

pub use enricher::{Enricher, EnricherContext, EnricherManager};
pub use error::{EngineError, Result, ValidationReport};
pub use fragment::{FragmentResolver, LocalFragmentResolver, SUPPORTED_EXTENSIONS};
pub use generator::{GeneratedImages, Generator, GeneratorContext, GeneratorManager};
pub use overlay::overlay;
pub use resource::{Resource, ResourceCategory, ResourceList};
pub use resource_service::{ResourceService, ResourceServiceConfig};
pub use validation::SchemaValidator;
pub use writer::ResourceWriter;
