//! Drawing surfaces.
//!
//! A [`Surface`] is the element the engine paints into: it knows its CSS
//! size, the device pixel ratio, and owns a backing store plus a 2D context.

use crate::canvas::{Canvas2D, Context2D};
use common::color::Color;
use common::geometry::Size;

/// A host drawing surface.
pub trait Surface: Send {
    /// Layout size in CSS pixels.
    fn client_size(&self) -> Size;

    /// Device pixels per CSS pixel. Hosts may report 0 or garbage; callers
    /// are expected to sanitize.
    fn device_pixel_ratio(&self) -> f64;

    /// Backing store size in device pixels.
    fn backing_size(&self) -> (u32, u32);

    /// Reallocate the backing store. This clears it.
    fn set_backing_size(&mut self, width: u32, height: u32);

    /// The 2D context, or `None` when the surface cannot provide one.
    fn context_2d(&mut self) -> Option<&mut dyn Context2D>;
}

/// Context type a canvas has been locked to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContextType {
    Context2D,
    WebGL,
    WebGL2,
}

/// In-memory canvas element backed by a [`Canvas2D`].
#[derive(Debug)]
pub struct CanvasSurface {
    client_size: Size,
    device_pixel_ratio: f64,
    context_type: Option<ContextType>,
    context: Canvas2D,
}

impl CanvasSurface {
    /// Create a surface with the given CSS size. The backing store starts
    /// empty until someone sizes it.
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            client_size: Size::new(width, height),
            device_pixel_ratio: 1.0,
            context_type: None,
            context: Canvas2D::new(0, 0),
        }
    }

    pub fn with_device_pixel_ratio(mut self, dpr: f64) -> Self {
        self.device_pixel_ratio = dpr;
        self
    }

    /// Change the layout size, as a host resize would.
    pub fn set_client_size(&mut self, width: f64, height: f64) {
        self.client_size = Size::new(width, height);
    }

    pub fn set_device_pixel_ratio(&mut self, dpr: f64) {
        self.device_pixel_ratio = dpr;
    }

    /// Lock the surface to a context type. Returns `false` if it was
    /// already locked to a different one.
    pub fn request_context(&mut self, kind: ContextType) -> bool {
        match self.context_type {
            None => {
                self.context_type = Some(kind);
                true
            }
            Some(current) => current == kind,
        }
    }

    pub fn context_type(&self) -> Option<ContextType> {
        self.context_type
    }

    pub fn canvas(&self) -> &Canvas2D {
        &self.context
    }

    /// Pixel at a backing-store coordinate.
    pub fn pixel(&self, x: u32, y: u32) -> Color {
        self.context.get_pixel(x, y)
    }

    /// Raw RGBA bytes of the backing store.
    pub fn data(&self) -> &[u8] {
        self.context.get_data()
    }
}

impl Surface for CanvasSurface {
    fn client_size(&self) -> Size {
        self.client_size
    }

    fn device_pixel_ratio(&self) -> f64 {
        self.device_pixel_ratio
    }

    fn backing_size(&self) -> (u32, u32) {
        (self.context.canvas_width(), self.context.canvas_height())
    }

    fn set_backing_size(&mut self, width: u32, height: u32) {
        self.context.resize(width, height);
    }

    fn context_2d(&mut self) -> Option<&mut dyn Context2D> {
        if self.request_context(ContextType::Context2D) {
            Some(&mut self.context)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_surface_sizes() {
        let mut surface = CanvasSurface::new(300.0, 150.0).with_device_pixel_ratio(2.0);
        assert_eq!(surface.client_size(), Size::new(300.0, 150.0));
        assert_eq!(surface.device_pixel_ratio(), 2.0);
        assert_eq!(surface.backing_size(), (0, 0));

        surface.set_backing_size(600, 300);
        assert_eq!(surface.backing_size(), (600, 300));
        assert_eq!(surface.data().len(), 600 * 300 * 4);
    }

    #[test]
    fn test_context_type_lock() {
        let mut surface = CanvasSurface::new(10.0, 10.0);
        assert!(surface.context_2d().is_some());
        assert_eq!(surface.context_type(), Some(ContextType::Context2D));
        assert!(!surface.request_context(ContextType::WebGL));

        let mut gl = CanvasSurface::new(10.0, 10.0);
        assert!(gl.request_context(ContextType::WebGL2));
        assert!(gl.context_2d().is_none());
    }

    #[test]
    fn test_draw_through_trait_object() {
        let mut surface = CanvasSurface::new(4.0, 4.0);
        surface.set_backing_size(4, 4);
        let surface_ref: &mut dyn Surface = &mut surface;
        if let Some(ctx) = surface_ref.context_2d() {
            ctx.set_fill_color("red");
            ctx.fill_rect(0.0, 0.0, 2.0, 2.0);
        }
        assert_eq!(surface.pixel(1, 1), Color::RED);
        assert_eq!(surface.pixel(3, 3), Color::TRANSPARENT);
    }
}
