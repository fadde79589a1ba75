//! Engine error types

use std::fmt;

use indexmap::IndexMap;
use manifold_core::CoreError;
use miette::Diagnostic;
use thiserror::Error;

/// Main engine error type
#[derive(Error, Debug, Diagnostic)]
pub enum EngineError {
    #[error(transparent)]
    #[diagnostic(code(manifold::config))]
    Config(#[from] CoreError),

    #[error("Cannot determine the kind of resource fragment {path}")]
    #[diagnostic(
        code(manifold::fragment::kind),
        help("add a 'kind' field or name the file '<name>-<type>.yml', e.g. 'app-deployment.yml'")
    )]
    UnresolvableKind { path: String },

    #[error("Unsupported extension '{extension}' for resource fragment {path}. Supported: {supported}")]
    #[diagnostic(code(manifold::fragment::extension))]
    UnsupportedExtension {
        path: String,
        extension: String,
        supported: String,
    },

    #[error("Invalid resource fragment {path}: {message}")]
    #[diagnostic(code(manifold::fragment::invalid))]
    InvalidFragment { path: String, message: String },

    #[error("Failed to resolve resource fragment '{location}'")]
    #[diagnostic(code(manifold::fragment::resolve))]
    FragmentResolution {
        location: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("{kind} '{name}' failed: {message}")]
    #[diagnostic(code(manifold::processor))]
    Processor {
        kind: &'static str,
        name: String,
        message: String,
    },

    #[error("Invalid schema for {kind}: {message}")]
    #[diagnostic(code(manifold::schema))]
    InvalidSchema { kind: String, message: String },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Validation(#[from] ValidationReport),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EngineError {
    pub fn generator(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Processor {
            kind: "Generator",
            name: name.into(),
            message: message.into(),
        }
    }

    pub fn enricher(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Processor {
            kind: "Enricher",
            name: name.into(),
            message: message.into(),
        }
    }
}

/// Schema violations collected across all resources, reported together
#[derive(Debug, Default, Clone, Error, Diagnostic)]
#[diagnostic(
    code(manifold::validation),
    help("fix the listed fields in the resource fragments or processor configuration")
)]
pub struct ValidationReport {
    /// Violations grouped by file (insertion order)
    pub violations: IndexMap<String, Vec<String>>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, file: impl Into<String>, message: impl Into<String>) {
        self.violations
            .entry(file.into())
            .or_default()
            .push(message.into());
    }

    pub fn has_errors(&self) -> bool {
        self.violations.values().any(|v| !v.is_empty())
    }

    pub fn total_errors(&self) -> usize {
        self.violations.values().map(Vec::len).sum()
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Resource validation failed with {} error(s):", self.total_errors())?;
        let mut first = true;
        for (file, messages) in &self.violations {
            for message in messages {
                if !first {
                    writeln!(f)?;
                }
                first = false;
                write!(f, "{}: {}", file, message)?;
            }
        }
        Ok(())
    }
}

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;
