//! Per-frame painting.

use crate::config::clamp_unit;
use crate::motion::{breath, drift};
use crate::registry::{BlobEntry, BlobRegistry};
use crate::viewport::Viewport;
use common::geometry::Point;
use render::{Context2D, Filter, RadialGradient};
use std::f64::consts::TAU;

/// Offset of the middle gradient stop.
pub const MID_STOP: f64 = 0.5;

/// Everything a frame needs besides the blobs themselves.
#[derive(Clone, Debug)]
pub struct FrameParams<'a> {
    pub viewport: Viewport,
    /// Seconds since the animation start.
    pub elapsed: f64,
    pub alpha: f64,
    pub blur_px: u32,
    pub composite: &'a str,
    pub background: Option<&'a str>,
    /// Global parallax magnitude.
    pub parallax: f64,
    /// Caller-supplied parallax displacement in logical pixels.
    pub parallax_vector: Point,
}

/// Where and how strongly a blob paints this frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BlobPlacement {
    pub center: Point,
    pub radius: f64,
    /// Blob opacity times breath opacity times global alpha, clamped.
    pub alpha: f64,
}

/// Compute a blob's live placement.
pub fn place_blob(entry: &BlobEntry, frame: &FrameParams<'_>) -> BlobPlacement {
    let blob = entry.blob();
    let dims = frame.viewport.size();
    let b = breath(blob.breath.as_ref(), frame.elapsed);
    let offset = drift(&blob.drift, frame.elapsed)
        + frame.parallax_vector * (blob.parallax * frame.parallax);

    BlobPlacement {
        center: entry.center(dims) + offset,
        radius: entry.base_radius(dims) * b.scale,
        alpha: clamp_unit(blob.opacity * b.opacity * frame.alpha),
    }
}

/// Paint one frame.
pub fn render_frame(ctx: &mut dyn Context2D, registry: &BlobRegistry, frame: &FrameParams<'_>) {
    let width = ctx.canvas_width() as f64;
    let height = ctx.canvas_height() as f64;

    ctx.reset_transform();
    ctx.set_filter(Filter::None);
    ctx.set_global_alpha(1.0);
    match frame.background {
        Some(background) => {
            // The base fill must not go through the configured blend mode.
            ctx.set_global_composite_operation("source-over");
            ctx.set_fill_color(background);
            ctx.fill_rect(0.0, 0.0, width, height);
        }
        None => ctx.clear_rect(0.0, 0.0, width, height),
    }

    ctx.scale(frame.viewport.dpr, frame.viewport.dpr);
    ctx.set_global_composite_operation(frame.composite);
    if frame.blur_px > 0 {
        ctx.set_filter(Filter::Blur(frame.blur_px));
    }

    for entry in registry.entries() {
        if entry.blob().layers.is_empty() {
            continue;
        }
        paint_blob(ctx, entry, frame);
    }

    ctx.set_filter(Filter::None);
}

fn paint_blob(ctx: &mut dyn Context2D, entry: &BlobEntry, frame: &FrameParams<'_>) {
    let placement = place_blob(entry, frame);
    let BlobPlacement { center, radius, alpha } = placement;
    if !(radius > 0.0 && radius.is_finite() && center.x.is_finite() && center.y.is_finite()) {
        return;
    }

    for layer in &entry.blob().layers {
        let mut gradient = RadialGradient::new(center, 0.0, radius);
        gradient.add_color_stop(0.0, layer.color.with_alpha(clamp_unit(layer.alpha_center * alpha)));
        gradient.add_color_stop(MID_STOP, layer.color.with_alpha(clamp_unit(layer.alpha_mid * alpha)));
        gradient.add_color_stop(1.0, layer.color.with_alpha(clamp_unit(layer.alpha_edge * alpha)));

        ctx.set_fill_style(gradient.into());
        ctx.begin_path();
        ctx.arc(center.x, center.y, radius, 0.0, TAU, false);
        ctx.fill();
    }
}
