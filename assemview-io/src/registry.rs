//! Unified IO registry for format-agnostic mesh reading and writing
//!
//! Readers and writers are registered per format name. Reading picks a
//! reader from the file extension first and falls back to sniffing the
//! file header.

use std::collections::HashMap;
use std::path::Path;

use assemview_core::{Error, Result, TriangleMesh};

use crate::stl::{StlReader, StlWriter};

/// Trait for reading meshes from files
pub trait MeshReader: Send + Sync {
    /// Read a mesh from the given path
    fn read_mesh(&self, path: &Path) -> Result<TriangleMesh>;

    /// Check if this reader can handle the given file by examining its header
    fn can_read(&self, path: &Path) -> bool;

    /// Get the format name this reader handles
    fn format_name(&self) -> &'static str;
}

/// Trait for writing meshes to files
pub trait MeshWriter: Send + Sync {
    /// Write a mesh to the given path
    fn write_mesh(&self, mesh: &TriangleMesh, path: &Path) -> Result<()>;

    /// Get the format name this writer handles
    fn format_name(&self) -> &'static str;
}

/// IO registry that manages mesh readers and writers
pub struct IoRegistry {
    mesh_readers: HashMap<String, Box<dyn MeshReader>>,
    mesh_writers: HashMap<String, Box<dyn MeshWriter>>,
}

impl IoRegistry {
    /// Create a new empty IO registry
    pub fn new() -> Self {
        Self {
            mesh_readers: HashMap::new(),
            mesh_writers: HashMap::new(),
        }
    }

    /// Registry with every built-in format
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register_mesh_handler("stl", Box::new(StlReader));
        registry.register_mesh_writer("stl", Box::new(StlWriter));
        registry
    }

    /// Register a mesh reader for a specific format
    pub fn register_mesh_handler(&mut self, format: &str, handler: Box<dyn MeshReader>) {
        self.mesh_readers.insert(format.to_lowercase(), handler);
    }

    /// Register a mesh writer for a specific format
    pub fn register_mesh_writer(&mut self, format: &str, handler: Box<dyn MeshWriter>) {
        self.mesh_writers.insert(format.to_lowercase(), handler);
    }

    /// Read a mesh, choosing the format from the extension or the header
    pub fn read_mesh(&self, path: &Path) -> Result<TriangleMesh> {
        if let Some(reader) = extension_of(path).and_then(|ext| self.mesh_readers.get(&ext)) {
            return reader.read_mesh(path);
        }

        if let Some(reader) = self.detect_reader(path) {
            log::debug!(
                "Detected {} content in {}",
                reader.format_name(),
                path.display()
            );
            return reader.read_mesh(path);
        }

        if !path.exists() {
            return Err(Error::NotFound(path.display().to_string()));
        }
        Err(Error::UnsupportedFormat(format!(
            "No mesh reader found for {}",
            path.display()
        )))
    }

    /// Write a mesh in the format named by the path's extension
    pub fn write_mesh(&self, mesh: &TriangleMesh, path: &Path) -> Result<()> {
        let format = extension_of(path).unwrap_or_default();
        match self.mesh_writers.get(&format) {
            Some(writer) => writer.write_mesh(mesh, path),
            None => Err(Error::UnsupportedFormat(format!(
                "No mesh writer found for format: {}",
                format
            ))),
        }
    }

    /// Find a reader whose header check accepts the file
    fn detect_reader(&self, path: &Path) -> Option<&dyn MeshReader> {
        let mut formats: Vec<&String> = self.mesh_readers.keys().collect();
        formats.sort();
        formats
            .into_iter()
            .filter_map(|format| self.mesh_readers.get(format))
            .find(|reader| reader.can_read(path))
            .map(|reader| &**reader)
    }

    /// Get a list of supported formats for meshes
    pub fn supported_mesh_formats(&self) -> Vec<String> {
        let mut formats: Vec<String> = self.mesh_readers.keys().cloned().collect();
        formats.sort();
        formats
    }

    /// Check if a format is supported for reading meshes
    pub fn supports_mesh_reading(&self, format: &str) -> bool {
        self.mesh_readers.contains_key(&format.to_lowercase())
    }

    /// Check if a format is supported for writing meshes
    pub fn supports_mesh_writing(&self, format: &str) -> bool {
        self.mesh_writers.contains_key(&format.to_lowercase())
    }
}

impl Default for IoRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|s| s.to_str())
        .map(str::to_lowercase)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_defaults_cover_stl() {
        let registry = IoRegistry::with_defaults();
        assert!(registry.supports_mesh_reading("STL"));
        assert!(registry.supports_mesh_writing("stl"));
        assert!(!registry.supports_mesh_reading("obj"));
        assert_eq!(registry.supported_mesh_formats(), ["stl"]);
    }

    #[test]
    fn test_header_detection_without_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("part.bin");
        fs::write(
            &path,
            "solid t\nfacet normal 0 0 1\nouter loop\nvertex 0 0 0\nvertex 1 0 0\nvertex 0 1 0\nendloop\nendfacet\nendsolid t\n",
        )
        .unwrap();

        let mesh = IoRegistry::with_defaults().read_mesh(&path).unwrap();
        assert_eq!(mesh.face_count(), 1);
    }

    #[test]
    fn test_missing_and_unknown_files() {
        let dir = tempfile::tempdir().unwrap();
        let registry = IoRegistry::with_defaults();

        let missing = registry.read_mesh(&dir.path().join("nope.stl")).unwrap_err();
        assert!(matches!(missing, Error::NotFound(_)));

        let text = dir.path().join("notes.txt");
        fs::write(&text, "hello").unwrap();
        assert!(matches!(
            registry.read_mesh(&text).unwrap_err(),
            Error::UnsupportedFormat(_)
        ));
        assert!(registry
            .write_mesh(&TriangleMesh::new(), &dir.path().join("out.obj"))
            .is_err());
    }
}
