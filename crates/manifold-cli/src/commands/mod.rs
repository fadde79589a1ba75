//! CLI commands

pub mod images;
pub mod profiles;
pub mod resource;
