//! Profiles command - list or show profiles visible to a project

use console::style;
use manifold_core::{CoreError, LoadedProject, ProfileRepository};
use std::path::Path;

use crate::error::Result;

pub fn run(path: &Path, show: Option<&str>) -> Result<()> {
    let repo = match LoadedProject::load(path) {
        Ok(loaded) => ProfileRepository::load(&loaded.resource_dirs())?,
        Err(CoreError::ProjectNotFound { .. }) => {
            tracing::debug!(path = %path.display(), "no project descriptor, built-in profiles only");
            ProfileRepository::builtin()?
        }
        Err(e) => return Err(e.into()),
    };

    match show {
        Some(name) => {
            let profile = repo.lookup(name)?;
            print!("{}", serde_yaml::to_string(&profile)?);
        }
        None => {
            println!("{}", style("Profiles:").bold());
            for name in repo.names() {
                println!("  {}", name);
            }
        }
    }
    Ok(())
}
