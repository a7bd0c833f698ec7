//! STL format support
//!
//! Decoding and encoding are delegated to `stl_io`; this module only converts
//! between its indexed mesh and [`TriangleMesh`]. Both ASCII and binary files
//! are read; files are always written as binary.

use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use assemview_core::{Point3f, Result, TriangleMesh};

use crate::registry::{MeshReader, MeshWriter};
use crate::IoError;

/// Size of the binary STL header plus triangle count
const BINARY_HEADER_LEN: u64 = 84;
/// Size of one binary STL facet record
const BINARY_FACET_LEN: u64 = 50;

pub struct StlReader;
pub struct StlWriter;

/// Decode an STL stream into a mesh with shared vertices
pub fn read_stl_from<R: Read + Seek>(reader: &mut R) -> std::io::Result<TriangleMesh> {
    let indexed = stl_io::read_stl(reader)?;
    let vertices = indexed
        .vertices
        .iter()
        .map(|v| Point3f::new(v[0], v[1], v[2]))
        .collect();
    let faces = indexed.faces.iter().map(|f| f.vertices).collect();
    Ok(TriangleMesh::from_vertices_and_faces(vertices, faces))
}

/// Convert a mesh into STL facets with computed face normals
pub fn to_stl_triangles(mesh: &TriangleMesh) -> Vec<stl_io::Triangle> {
    let vertex = |p: &Point3f| stl_io::Vertex::new([p.x, p.y, p.z]);
    mesh.triangles()
        .zip(mesh.calculate_face_normals())
        .map(|(tri, n)| stl_io::Triangle {
            normal: stl_io::Normal::new([n.x, n.y, n.z]),
            vertices: [vertex(&tri[0]), vertex(&tri[1]), vertex(&tri[2])],
        })
        .collect()
}

/// Check whether a file looks like STL.
///
/// Binary files are recognised by their size matching the facet count in the
/// header, ASCII files by the leading `solid` keyword.
pub fn looks_like_stl(path: &Path) -> bool {
    let Ok(mut file) = File::open(path) else {
        return false;
    };
    let Ok(len) = file.metadata().map(|m| m.len()) else {
        return false;
    };

    let mut header = [0u8; BINARY_HEADER_LEN as usize];
    let read = match file.read(&mut header) {
        Ok(n) => n,
        Err(_) => return false,
    };

    if read == header.len() {
        let count = u32::from_le_bytes([header[80], header[81], header[82], header[83]]) as u64;
        if BINARY_HEADER_LEN + count * BINARY_FACET_LEN == len {
            return true;
        }
    }
    let text = &header[..read];
    let start = text
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(read);
    text[start..].starts_with(b"solid")
}

impl MeshReader for StlReader {
    fn read_mesh(&self, path: &Path) -> Result<TriangleMesh> {
        let file = File::open(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => IoError::FileNotFound {
                path: path.display().to_string(),
            },
            _ => IoError::Io(e),
        })?;
        let mut reader = BufReader::new(file);
        let mesh = read_stl_from(&mut reader).map_err(|e| IoError::ParseError {
            message: format!("{}: {}", path.display(), e),
        })?;
        Ok(mesh)
    }

    fn can_read(&self, path: &Path) -> bool {
        looks_like_stl(path)
    }

    fn format_name(&self) -> &'static str {
        "stl"
    }
}

impl MeshWriter for StlWriter {
    fn write_mesh(&self, mesh: &TriangleMesh, path: &Path) -> Result<()> {
        let triangles = to_stl_triangles(mesh);
        let mut file = File::create(path).map_err(IoError::from)?;
        stl_io::write_stl(&mut file, triangles.iter()).map_err(|e| IoError::WriteError {
            message: format!("{}: {}", path.display(), e),
        })?;
        Ok(())
    }

    fn format_name(&self) -> &'static str {
        "stl"
    }
}
