//! I/O for assemview: assembly files, STL meshes and background loading
//!
//! Mesh decoding is delegated to `stl_io`. The [`IoRegistry`] selects a
//! reader by extension or file header, and [`ThreadedMeshLoader`] feeds
//! decoded meshes to a [`ViewerContext`](assemview_core::ViewerContext).

pub mod error;
pub mod loader;
pub mod registry;
pub mod sample;
pub mod stl;

pub use error::*;
pub use loader::ThreadedMeshLoader;
pub use registry::{IoRegistry, MeshReader, MeshWriter};
pub use sample::{cube_mesh, write_sample_data, SAMPLE_ASSEMBLY_FILE};
pub use stl::{StlReader, StlWriter};

use std::path::{Path, PathBuf};

use assemview_core::{Assembly, Result, TriangleMesh};

/// Read a mesh, detecting the format
pub fn read_mesh<P: AsRef<Path>>(path: P) -> Result<TriangleMesh> {
    IoRegistry::with_defaults().read_mesh(path.as_ref())
}

/// Write a mesh in the format named by the extension
pub fn write_mesh<P: AsRef<Path>>(mesh: &TriangleMesh, path: P) -> Result<()> {
    IoRegistry::with_defaults().write_mesh(mesh, path.as_ref())
}

/// Read an assembly file and return it with the directory its mesh
/// references are relative to
pub fn read_assembly<P: AsRef<Path>>(path: P) -> Result<(Assembly, PathBuf)> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(IoError::FileNotFound {
            path: path.display().to_string(),
        }
        .into());
    }
    let assembly = Assembly::from_json_file(path)?;
    let base_dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    Ok((assembly, base_dir))
}
