//! Mesh loader that decodes files on the rayon thread pool

use std::path::{Path, PathBuf};
use std::sync::Arc;

use assemview_core::{CompletionSender, MeshLoader, MeshRequest};

use crate::registry::IoRegistry;

/// Loads leaf meshes from disk in the background.
///
/// References are resolved against `base_dir` unless they are absolute.
/// A file that cannot be read is logged and never completes.
pub struct ThreadedMeshLoader {
    registry: Arc<IoRegistry>,
    base_dir: PathBuf,
}

impl ThreadedMeshLoader {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self::with_registry(Arc::new(IoRegistry::with_defaults()), base_dir)
    }

    pub fn with_registry(registry: Arc<IoRegistry>, base_dir: impl Into<PathBuf>) -> Self {
        Self {
            registry,
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Path a mesh reference points at
    pub fn resolve(&self, reference: &str) -> PathBuf {
        let path = Path::new(reference);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }
}

impl MeshLoader for ThreadedMeshLoader {
    fn load(&self, request: MeshRequest, completions: CompletionSender) {
        let registry = Arc::clone(&self.registry);
        let path = self.resolve(&request.reference);

        rayon::spawn(move || match registry.read_mesh(&path) {
            Ok(mesh) => {
                log::debug!(
                    "Loaded {} ({} faces) for {}",
                    path.display(),
                    mesh.face_count(),
                    request.node
                );
                completions.complete(request.node, mesh);
            }
            Err(e) => {
                log::error!(
                    "Failed to load mesh '{}' for {}: {}",
                    request.reference,
                    request.node,
                    e
                );
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_relative_and_absolute() {
        let loader = ThreadedMeshLoader::new("/data/parts");
        assert_eq!(loader.resolve("a.stl"), PathBuf::from("/data/parts/a.stl"));
        assert_eq!(loader.resolve("/tmp/b.stl"), PathBuf::from("/tmp/b.stl"));
    }
}
