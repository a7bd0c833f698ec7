//! Windowed viewer for assemblies
//!
//! The window shows the assembly as a collapsible part tree (egui) next to
//! the 3D scene (wgpu). Clicking a part name hides or shows that part;
//! clicking the glyph in front of a group folds it.
//!
//! ```rust,no_run
//! use assemview_core::Assembly;
//! use assemview_visualization::{InteractiveViewer, ViewerConfig};
//!
//! fn main() -> assemview_core::Result<()> {
//!     let viewer = InteractiveViewer::new(Assembly::sample(), "meshes", ViewerConfig::default())?;
//!     viewer.run()
//! }
//! ```

pub mod camera;
pub mod config;
pub mod interactive_viewer;
pub mod renderer;
pub mod tree_panel;

pub use camera::{Camera, OrbitControls};
pub use config::{CameraConfig, ControlsConfig, ViewerConfig, WindowConfig};
pub use interactive_viewer::{DragMode, InteractiveViewer, PointerState};
pub use renderer::{FrameRenderer, UiFrame};
pub use tree_panel::PanelOutput;

use std::path::Path;

use assemview_core::Result;

/// Open the assembly at `path` in a window and block until it closes
pub fn show_assembly<P: AsRef<Path>>(path: P, config: ViewerConfig) -> Result<()> {
    let (assembly, base_dir) = assemview_io::read_assembly(path)?;
    InteractiveViewer::new(assembly, base_dir, config)?.run()
}
