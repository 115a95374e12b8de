//! Headless viewer for fluid background scenes.
//!
//! Loads a scene, drives the engine with a virtual frame clock and writes
//! the frames out as PNG files.

pub mod output;
pub mod presets;
pub mod scene;

pub use output::write_png;
pub use scene::Scene;

/// Viewer version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
