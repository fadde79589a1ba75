//! Images command - run the generator pipeline and print the result

use console::style;
use manifold_core::PlatformMode;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::util::Session;

pub fn run(
    path: &Path,
    property_files: &[PathBuf],
    defines: &[String],
    mode: PlatformMode,
    profile: Option<&str>,
    pre_package: bool,
    json_output: bool,
) -> Result<()> {
    let session = Session::load(path, property_files, defines)?;
    let generated = session.generate_images(mode, profile, pre_package)?;

    if !generated.applied.is_empty() {
        eprintln!(
            "{} Generators applied: {}",
            style("→").blue(),
            generated.applied.join(", ")
        );
    }
    if let Some(warning) = &generated.filter_warning {
        eprintln!("{} {}", style("⚠").yellow(), warning);
    }

    if json_output {
        println!("{}", serde_json::to_string_pretty(&generated.images)?);
    } else if generated.images.is_empty() {
        eprintln!("{} No images configured", style("⚠").yellow());
    } else {
        print!("{}", serde_yaml::to_string(&generated.images)?);
    }
    Ok(())
}
