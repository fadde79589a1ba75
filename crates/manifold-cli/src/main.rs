//! Manifold CLI - generate container image configurations and cluster manifests

use clap::{Parser, Subcommand};
use manifold_core::PlatformMode;
use std::path::PathBuf;

mod commands;
mod error;
mod exit_codes;
mod logging;
mod util;

#[derive(Parser)]
#[command(name = "manifold")]
#[command(author = "Manifold Contributors")]
#[command(version)]
#[command(about = "Resolve image configurations and generate Kubernetes/OpenShift manifests", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug output
    #[arg(long, global = true)]
    debug: bool,
}

/// Options shared by commands that load a project
#[derive(clap::Args)]
struct ProjectArgs {
    /// Project directory or manifold.yaml path
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Set a property (key=value), highest precedence
    #[arg(short = 'D', long = "define")]
    define: Vec<String>,

    /// Properties file(s) to merge (.properties, .yaml or .json)
    #[arg(long = "properties")]
    properties: Vec<PathBuf>,

    /// Target platform
    #[arg(long, default_value = "kubernetes")]
    mode: PlatformMode,

    /// Profile selecting generators and enrichers
    #[arg(short, long)]
    profile: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the image configurations after the generator pipeline
    Images {
        #[command(flatten)]
        project: ProjectArgs,

        /// Run generators as for a build after packaging
        #[arg(long)]
        pre_package: bool,

        /// Output as JSON instead of YAML
        #[arg(long)]
        json: bool,
    },

    /// Generate and write the cluster manifests
    Resource {
        #[command(flatten)]
        project: ProjectArgs,

        /// Validate the generated resources against the schemas
        #[arg(long)]
        validate: bool,

        /// Write into this directory instead of the project's target directory
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Print the composite manifest instead of writing files
        #[arg(long)]
        dry_run: bool,
    },

    /// List the available profiles
    Profiles {
        /// Project directory or manifold.yaml path
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Print one profile in full
        #[arg(long)]
        show: Option<String>,
    },
}

fn main() {
    miette::set_panic_hook();

    let cli = Cli::parse();
    logging::init(cli.debug);

    let result = match cli.command {
        Commands::Images {
            project,
            pre_package,
            json,
        } => commands::images::run(
            &project.path,
            &project.properties,
            &project.define,
            project.mode,
            project.profile.as_deref(),
            pre_package,
            json,
        ),

        Commands::Resource {
            project,
            validate,
            output_dir,
            dry_run,
        } => commands::resource::run(
            &project.path,
            &project.properties,
            &project.define,
            project.mode,
            project.profile.as_deref(),
            validate,
            output_dir.as_deref(),
            dry_run,
        ),

        Commands::Profiles { path, show } => commands::profiles::run(&path, show.as_deref()),
    };

    if let Err(err) = result {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}
