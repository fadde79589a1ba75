//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid combine policy '{token}'. Valid values are: REPLACE, MERGE")]
    InvalidCombinePolicy { token: String },

    #[error("Invalid value '{value}' for property '{key}': expected {expected}")]
    InvalidProperty {
        key: String,
        value: String,
        expected: String,
    },

    #[error("Configuration error: '{field}' is required for image {image} but was blank")]
    MissingField { field: String, image: String },

    #[error("Profile '{name}' is not defined (searched: {searched})")]
    ProfileNotFound { name: String, searched: String },

    #[error("Invalid profile definition in {path}: {message}")]
    InvalidProfile { path: String, message: String },

    #[error("Project descriptor not found: {path}")]
    ProjectNotFound { path: String },

    #[error("Invalid project descriptor: {message}")]
    InvalidProject { message: String },

    #[error("Invalid platform mode '{0}'. Valid values are: kubernetes, openshift")]
    InvalidPlatformMode(String),

    #[error("Invalid build strategy '{0}'. Valid values are: docker, s2i")]
    InvalidBuildStrategy(String),

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;
