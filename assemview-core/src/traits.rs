//! Core traits for assemview

use crate::mesh::*;

/// Axis-aligned bounds as (min, max)
pub type Bounds = (Point3f, Point3f);

/// Trait for drawable/renderable objects
pub trait Drawable {
    /// Get the bounding box of the object
    fn bounding_box(&self) -> Bounds;

    /// Get the center point of the object
    fn center(&self) -> Point3f {
        let (min, max) = self.bounding_box();
        Point3f::new(
            (min.x + max.x) / 2.0,
            (min.y + max.y) / 2.0,
            (min.z + max.z) / 2.0,
        )
    }
}

/// Grow `bounds` so that it contains `point`
pub fn extend_bounds(bounds: Option<Bounds>, point: &Point3f) -> Bounds {
    match bounds {
        None => (*point, *point),
        Some((mut min, mut max)) => {
            min.x = min.x.min(point.x);
            min.y = min.y.min(point.y);
            min.z = min.z.min(point.z);

            max.x = max.x.max(point.x);
            max.y = max.y.max(point.y);
            max.z = max.z.max(point.z);
            (min, max)
        }
    }
}

impl Drawable for TriangleMesh {
    fn bounding_box(&self) -> Bounds {
        self.vertices
            .iter()
            .fold(None, |acc, v| Some(extend_bounds(acc, v)))
            .unwrap_or((Point3f::origin(), Point3f::origin()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_mesh_bounds_and_center() {
        let mesh = TriangleMesh::from_vertices_and_faces(
            vec![
                Point3f::new(-1.0, 0.0, 2.0),
                Point3f::new(3.0, -2.0, 0.0),
                Point3f::new(0.0, 4.0, 1.0),
            ],
            vec![[0, 1, 2]],
        );

        let (min, max) = mesh.bounding_box();
        assert_eq!(min, Point3f::new(-1.0, -2.0, 0.0));
        assert_eq!(max, Point3f::new(3.0, 4.0, 2.0));
        assert_relative_eq!(mesh.center(), Point3f::new(1.0, 1.0, 1.0));
    }
}
