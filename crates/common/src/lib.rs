//! Common utilities and types shared by the fluid background crates.

pub mod color;
pub mod geometry;
pub mod error;
pub mod units;

pub use color::Color;
pub use geometry::{Point, Rect, Size, Transform};
pub use error::{FluidError, FluidResult};
pub use units::{resolve, Axis, Dimension, Resolved, Unit, UnitValue};
