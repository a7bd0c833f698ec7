//! Core data structures for assemview
//!
//! This crate holds the assembly description, the two live structures derived
//! from it (the 3D scene graph and the tree view), the bindings between them
//! and the [`ViewerContext`] that builds and drives all of it.

pub mod assembly;
pub mod binding;
pub mod context;
pub mod error;
pub mod loader;
pub mod mesh;
pub mod scene;
pub mod traits;
pub mod transform;
pub mod tree;

pub use assembly::*;
pub use binding::*;
pub use context::*;
pub use error::*;
pub use loader::*;
pub use mesh::*;
pub use scene::*;
pub use traits::*;
pub use transform::*;
pub use tree::*;

/// Re-export commonly used types from nalgebra
pub use nalgebra::{Matrix4, Point3, Vector3};
