//! # assemview GPU
//!
//! wgpu device setup and the scene renderer that draws the visible meshes of
//! a [`SceneGraph`](assemview_core::SceneGraph).
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use assemview_gpu::{GpuContext, SceneRenderer, DEPTH_FORMAT};
//! use winit::window::Window;
//!
//! async fn example(window: Arc<Window>) -> assemview_core::Result<()> {
//!     let size = window.inner_size();
//!     let (gpu, surface) = GpuContext::for_window(window).await?;
//!     let config = gpu.surface_config(&surface, size.width, size.height)?;
//!     let samples = gpu.sample_count(config.format);
//!     let _renderer = SceneRenderer::new(&gpu.device, config.format, DEPTH_FORMAT, samples);
//!     Ok(())
//! }
//! ```

pub mod device;
pub mod mesh;

pub use device::{pick_sample_count, GpuContext, DEPTH_FORMAT, MSAA_SAMPLES};
pub use mesh::{mesh_to_vertices, CameraUniform, MeshVertex, ModelUniform, SceneRenderer};
