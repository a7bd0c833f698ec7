//! Assembly viewer
//!
//! Shows an assembly as a part tree next to its 3D scene. Click a part name
//! to hide or show it, click the glyph in front of a group to fold it.
//!
//! ```text
//! assembly_viewer --write-samples ./cubes
//! assembly_viewer --assembly ./cubes/assembly.json
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use assemview_core::Assembly;
use assemview_visualization::{InteractiveViewer, ViewerConfig};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "assembly_viewer")]
#[command(about = "View an assembly of STL parts with a synchronized part tree", long_about = None)]
struct Args {
    /// Assembly JSON file; the built-in five cube sample when omitted
    #[arg(short, long)]
    assembly: Option<PathBuf>,

    /// Directory mesh references are resolved against (default: the
    /// assembly's directory, or the current directory for the sample)
    #[arg(short, long)]
    mesh_dir: Option<PathBuf>,

    /// Viewer configuration JSON
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write the sample cubes and assembly.json to this directory and exit
    #[arg(long, value_name = "DIR")]
    write_samples: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let args = Args::parse();

    if let Some(dir) = &args.write_samples {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
        let path = assemview_io::write_sample_data(dir)
            .with_context(|| format!("Failed to write samples to {}", dir.display()))?;
        println!("Wrote {}", path.display());
        return Ok(());
    }

    let config = match &args.config {
        Some(path) => ViewerConfig::from_json_file(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?,
        None => ViewerConfig::default(),
    };

    let (assembly, assembly_dir) = match &args.assembly {
        Some(path) => assemview_io::read_assembly(path)
            .with_context(|| format!("Failed to read assembly {}", path.display()))?,
        None => {
            log::info!("No assembly given, showing the built-in sample");
            (Assembly::sample(), PathBuf::from("."))
        }
    };
    let base_dir = args.mesh_dir.unwrap_or(assembly_dir);
    log::info!("Resolving meshes against {}", base_dir.display());

    println!("Controls:");
    println!("  Left drag: rotate");
    println!("  Right drag: pan");
    println!("  Scroll: zoom");
    println!("  R: reset camera");
    println!("  F: frame visible parts");

    let viewer = InteractiveViewer::new(assembly, base_dir, config)?;
    viewer.run()?;
    Ok(())
}
