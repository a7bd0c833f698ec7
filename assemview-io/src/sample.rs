//! Demonstration data: five unit cubes and the assembly that places them

use std::fs;
use std::path::{Path, PathBuf};

use assemview_core::{Assembly, Point3f, Result, TriangleMesh, Vector3f};

use crate::registry::MeshWriter;
use crate::stl::StlWriter;

/// File name of the generated assembly description
pub const SAMPLE_ASSEMBLY_FILE: &str = "assembly.json";

/// Unit cube centered on `offset`, 8 vertices and 12 outward-facing triangles
pub fn cube_mesh(offset: Vector3f) -> TriangleMesh {
    let corners = [
        [-0.5, -0.5, -0.5],
        [0.5, -0.5, -0.5],
        [0.5, 0.5, -0.5],
        [-0.5, 0.5, -0.5],
        [-0.5, -0.5, 0.5],
        [0.5, -0.5, 0.5],
        [0.5, 0.5, 0.5],
        [-0.5, 0.5, 0.5],
    ];
    let vertices = corners
        .iter()
        .map(|[x, y, z]| Point3f::new(*x, *y, *z) + offset)
        .collect();
    let faces = vec![
        [0, 3, 1],
        [1, 3, 2],
        [0, 4, 7],
        [0, 7, 3],
        [4, 5, 6],
        [4, 6, 7],
        [5, 1, 2],
        [5, 2, 6],
        [2, 3, 6],
        [3, 7, 6],
        [0, 1, 5],
        [0, 5, 4],
    ];
    TriangleMesh::from_vertices_and_faces(vertices, faces)
}

/// Write the sample cubes and `assembly.json` into `dir`.
///
/// Each cube is baked at its leaf's translation, so the geometry appears
/// shifted twice once the assembly matrix is applied. Returns the path of
/// the assembly file.
pub fn write_sample_data(dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let assembly = Assembly::sample();
    let writer = StlWriter;

    for entry in assembly.walk() {
        if let Some(reference) = entry.node.mesh_ref() {
            let cube = cube_mesh(entry.node.transform.translation_part());
            writer.write_mesh(&cube, &dir.join(reference))?;
            log::info!("Wrote {}", dir.join(reference).display());
        }
    }

    let assembly_path = dir.join(SAMPLE_ASSEMBLY_FILE);
    fs::write(&assembly_path, assembly.to_json_string()?)?;
    log::info!("Wrote {}", assembly_path.display());
    Ok(assembly_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use assemview_core::Drawable;

    #[test]
    fn test_cube_is_closed_and_outward_facing() {
        let cube = cube_mesh(Vector3f::zeros());
        assert_eq!(cube.vertex_count(), 8);
        assert_eq!(cube.face_count(), 12);

        let center = cube.center();
        for (tri, normal) in cube.triangles().zip(cube.calculate_face_normals()) {
            let face_center = (tri[0].coords + tri[1].coords + tri[2].coords) / 3.0;
            assert!((face_center - center.coords).dot(&normal) > 0.0);
        }
    }

    #[test]
    fn test_cube_offset() {
        let (min, max) = cube_mesh(Vector3f::new(-2.0, 0.0, 0.0)).bounding_box();
        assert_relative_eq!(min, Point3f::new(-2.5, -0.5, -0.5));
        assert_relative_eq!(max, Point3f::new(-1.5, 0.5, 0.5));
    }
}
