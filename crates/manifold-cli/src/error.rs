//! CLI error types with exit code handling
//!
//! Library errors are flattened into a few user-facing categories, each
//! mapped to an exit code.

use manifold_core::CoreError;
use manifold_engine::EngineError;
use miette::Diagnostic;
use thiserror::Error;

use crate::exit_codes;

/// CLI-specific error type that includes exit code information
#[derive(Error, Debug, Diagnostic, Clone)]
pub enum CliError {
    /// Generated resources failed schema validation
    #[error("{message}")]
    #[diagnostic(code(manifold::cli::validation))]
    Validation {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// Invalid configuration: properties, fragments, profiles, processors
    #[error("Configuration error: {message}")]
    #[diagnostic(code(manifold::cli::config))]
    Config {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// Project descriptor missing or invalid
    #[error("Project error: {message}")]
    #[diagnostic(code(manifold::cli::project))]
    Project {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// IO error (file not found, permissions, etc.)
    #[error("IO error: {message}")]
    #[diagnostic(code(manifold::cli::io))]
    Io { message: String },

    /// Anything else, with its formatted message
    #[error("{message}")]
    #[diagnostic(code(manifold::cli::error))]
    Other { message: String },
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Validation { .. } => exit_codes::VALIDATION_ERROR,
            CliError::Config { .. } => exit_codes::CONFIG_ERROR,
            CliError::Project { .. } => exit_codes::PROJECT_ERROR,
            CliError::Io { .. } => exit_codes::IO_ERROR,
            CliError::Other { .. } => exit_codes::ERROR,
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: None,
        }
    }
}

/// Message followed by its source chain
fn with_sources(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ProjectNotFound { .. } => CliError::Project {
                message: err.to_string(),
                help: Some("run in a directory containing manifold.yaml or pass its path".to_string()),
            },
            CoreError::InvalidProject { .. } => CliError::Project {
                message: err.to_string(),
                help: None,
            },
            CoreError::ProfileNotFound { .. } => CliError::Config {
                message: err.to_string(),
                help: Some("define it in a profiles.yaml inside a resource directory".to_string()),
            },
            CoreError::Io(e) => CliError::Io {
                message: e.to_string(),
            },
            other => CliError::config(other.to_string()),
        }
    }
}

impl From<EngineError> for CliError {
    fn from(err: EngineError) -> Self {
        let help = err.help().map(|h| h.to_string());
        match err {
            EngineError::Config(core) => core.into(),
            EngineError::Validation(report) => CliError::Validation {
                message: report.to_string(),
                help,
            },
            EngineError::Io(e) => CliError::Io {
                message: e.to_string(),
            },
            EngineError::FragmentResolution { .. } => CliError::Config {
                message: with_sources(&err),
                help,
            },
            other => CliError::Config {
                message: other.to_string(),
                help,
            },
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::Io {
            message: err.to_string(),
        }
    }
}

impl From<serde_yaml::Error> for CliError {
    fn from(err: serde_yaml::Error) -> Self {
        CliError::Other {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        CliError::Other {
            message: err.to_string(),
        }
    }
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
