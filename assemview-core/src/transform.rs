//! 3D transformation utilities

use nalgebra::{Matrix4, Point3, Vector3};

use crate::{Error, Result};

/// A 3D transformation applied to scene nodes and meshes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform3D {
    pub matrix: Matrix4<f32>,
}

impl Transform3D {
    /// Create an identity transformation
    pub fn identity() -> Self {
        Self {
            matrix: Matrix4::identity(),
        }
    }

    /// Create a translation transformation
    pub fn translation(translation: Vector3<f32>) -> Self {
        Self {
            matrix: Matrix4::new_translation(&translation),
        }
    }

    /// Build a transformation from 16 values in row-major order.
    ///
    /// This is the layout used by assembly files: the translation lives in
    /// elements 3, 7 and 11.
    pub fn from_row_major(values: &[f32]) -> Result<Self> {
        if values.len() != 16 {
            return Err(Error::InvalidData(format!(
                "transform matrix needs 16 values, got {}",
                values.len()
            )));
        }
        Ok(Self {
            matrix: Matrix4::from_row_slice(values),
        })
    }

    /// The 16 matrix values in row-major order
    pub fn to_row_major(&self) -> [f32; 16] {
        let mut out = [0.0; 16];
        for row in 0..4 {
            for col in 0..4 {
                out[row * 4 + col] = self.matrix[(row, col)];
            }
        }
        out
    }

    /// Apply the transformation to a point
    pub fn transform_point(&self, point: &Point3<f32>) -> Point3<f32> {
        let homogeneous = self.matrix * point.to_homogeneous();
        Point3::from_homogeneous(homogeneous).unwrap_or(*point)
    }

    /// Translation component
    pub fn translation_part(&self) -> Vector3<f32> {
        Vector3::new(self.matrix[(0, 3)], self.matrix[(1, 3)], self.matrix[(2, 3)])
    }

    /// Compose this transformation with another (`self` applied last)
    pub fn compose(self, other: Self) -> Self {
        Self {
            matrix: self.matrix * other.matrix,
        }
    }
}

impl Default for Transform3D {
    fn default() -> Self {
        Self::identity()
    }
}

impl std::ops::Mul for Transform3D {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        self.compose(rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const TRANSLATE_LEFT: [f32; 16] = [
        1.0, 0.0, 0.0, -2.0, //
        0.0, 1.0, 0.0, 0.0, //
        0.0, 0.0, 1.0, 0.0, //
        0.0, 0.0, 0.0, 1.0,
    ];

    #[test]
    fn test_row_major_translation_column() {
        let t = Transform3D::from_row_major(&TRANSLATE_LEFT).unwrap();
        assert_eq!(t.translation_part(), Vector3::new(-2.0, 0.0, 0.0));

        let p = t.transform_point(&Point3::new(0.5, 0.5, 0.5));
        assert_relative_eq!(p, Point3::new(-1.5, 0.5, 0.5));
    }

    #[test]
    fn test_row_major_layout_is_preserved() {
        let t = Transform3D::from_row_major(&TRANSLATE_LEFT).unwrap();
        assert_eq!(t.to_row_major(), TRANSLATE_LEFT);
    }

    #[test]
    fn test_wrong_length_is_rejected() {
        let err = Transform3D::from_row_major(&[1.0; 12]).unwrap_err();
        assert!(matches!(err, Error::InvalidData(_)));
    }

    #[test]
    fn test_compose_applies_parent_last() {
        let parent = Transform3D::translation(Vector3::new(1.0, 0.0, 0.0));
        let child = Transform3D::translation(Vector3::new(0.0, 2.0, 0.0));
        let world = parent * child;

        assert_relative_eq!(world.translation_part(), Vector3::new(1.0, 2.0, 0.0));
        assert_relative_eq!(
            world.transform_point(&Point3::origin()),
            Point3::new(1.0, 2.0, 0.0)
        );
    }
}
