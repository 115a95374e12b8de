//! Software 2D rendering for the fluid background.
//!
//! This crate handles:
//! - A canvas-style 2D context with transforms and save/restore
//! - Solid and radial gradient fills
//! - Gaussian blur filtering
//! - Porter-Duff compositing and blend modes
//! - Host surfaces that own a backing store

pub mod canvas;
pub mod composite;
pub mod gradient;
pub mod rasterizer;
pub mod surface;

pub use canvas::{Canvas2D, Context2D, Filter, ImageData, PathCommand};
pub use composite::CompositeOperation;
pub use gradient::{FillStyle, GradientStop, RadialGradient};
pub use rasterizer::{gaussian_kernel, Layer, PixelBuffer, PixelRect};
pub use surface::{CanvasSurface, ContextType, Surface};
