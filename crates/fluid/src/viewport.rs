//! Viewport tracking.
//!
//! Layout can change without notice, so the tracker polls the surface once
//! per frame and resizes the backing store only when something moved.

use common::geometry::Size;
use render::Surface;

/// Logical size and pixel density of a surface.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Viewport {
    /// Logical width in CSS pixels.
    pub width: f64,
    /// Logical height in CSS pixels.
    pub height: f64,
    /// Device pixel ratio.
    pub dpr: f64,
}

impl Viewport {
    /// Measure a surface, replacing unusable readings: negative or
    /// non-finite sizes become 0 and a non-positive ratio becomes 1.
    pub fn measure(surface: &dyn Surface) -> Self {
        let size = surface.client_size();
        let dpr = surface.device_pixel_ratio();
        Self {
            width: sanitize_len(size.width),
            height: sanitize_len(size.height),
            dpr: if dpr.is_finite() && dpr > 0.0 { dpr } else { 1.0 },
        }
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Backing store size in device pixels.
    pub fn backing_size(&self) -> (u32, u32) {
        (to_device(self.width, self.dpr), to_device(self.height, self.dpr))
    }
}

fn sanitize_len(v: f64) -> f64 {
    if v.is_finite() && v > 0.0 {
        v
    } else {
        0.0
    }
}

fn to_device(len: f64, dpr: f64) -> u32 {
    (len * dpr).round().clamp(0.0, u32::MAX as f64) as u32
}

/// Watches a surface for size and density changes.
#[derive(Clone, Debug, Default)]
pub struct ViewportTracker {
    last: Option<Viewport>,
}

impl ViewportTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last observed viewport, or zeros before the first sync.
    pub fn current(&self) -> Viewport {
        self.last.unwrap_or_default()
    }

    /// Measure the surface and resize its backing store if the logical
    /// size or pixel ratio changed. Returns `true` on resize.
    pub fn sync(&mut self, surface: &mut dyn Surface) -> bool {
        let viewport = Viewport::measure(surface);
        if self.last == Some(viewport) {
            return false;
        }

        let (width, height) = viewport.backing_size();
        surface.set_backing_size(width, height);
        tracing::debug!(
            width = viewport.width,
            height = viewport.height,
            dpr = viewport.dpr,
            backing_width = width,
            backing_height = height,
            "viewport changed"
        );
        self.last = Some(viewport);
        true
    }
}
