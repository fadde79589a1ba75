//! Resource command - generate, validate and write manifests

use console::style;
use manifold_core::PlatformMode;
use manifold_engine::{EnricherManager, ResourceService, ResourceServiceConfig, ResourceWriter};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::util::Session;

#[allow(clippy::too_many_arguments)]
pub fn run(
    path: &Path,
    property_files: &[PathBuf],
    defines: &[String],
    mode: PlatformMode,
    profile: Option<&str>,
    validate: bool,
    output_dir: Option<&Path>,
    dry_run: bool,
) -> Result<()> {
    let session = Session::load(path, property_files, defines)?;
    let generated = session.generate_images(mode, profile, false)?;
    if let Some(warning) = &generated.filter_warning {
        eprintln!("{} {}", style("⚠").yellow(), warning);
    }

    let mut config =
        ResourceServiceConfig::from_project(&session.loaded, session.context.clone(), generated.images)?
            .with_profile(profile.map(str::to_string));
    if validate {
        config = config.with_validation(true);
    }
    if let Some(dir) = output_dir {
        config.target_dir = dir.to_path_buf();
    }

    let service = ResourceService::new(config);
    let resources = service.generate_resources(mode, &EnricherManager::with_defaults())?;

    if dry_run {
        let config = service.config();
        let composite = ResourceWriter::new(&config.target_dir, config.file_type)
            .with_interpolation(config.interpolate_template_parameters)
            .render(&resources)?;
        print!("{}", composite);
        return Ok(());
    }

    let composite = service.write_resources(&resources, mode.classifier())?;
    println!(
        "{} {} ({} resources)",
        style("wrote").green(),
        composite.display(),
        resources.len()
    );
    Ok(())
}
