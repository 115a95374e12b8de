//! 2D drawing context.
//!
//! [`Context2D`] is the slice of the host canvas API the engine draws
//! through; [`Canvas2D`] is a software implementation of it.

use crate::composite::CompositeOperation;
use crate::gradient::FillStyle;
use crate::rasterizer::{Layer, PixelBuffer, PixelRect};
use common::color::Color;
use common::geometry::{Point, Rect, Transform};
use std::f64::consts::TAU;
use std::fmt;

/// Canvas `filter` values the context understands.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Filter {
    #[default]
    None,
    /// Gaussian blur with the given standard deviation in device pixels.
    Blur(u32),
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::None => f.write_str("none"),
            Filter::Blur(px) => write!(f, "blur({}px)", px),
        }
    }
}

/// Drawing operations the fluid renderer needs from a 2D context.
pub trait Context2D {
    /// Backing store width in device pixels.
    fn canvas_width(&self) -> u32;
    /// Backing store height in device pixels.
    fn canvas_height(&self) -> u32;

    fn save(&mut self);
    fn restore(&mut self);

    fn reset_transform(&mut self);
    fn set_transform(&mut self, transform: Transform);
    fn scale(&mut self, x: f64, y: f64);
    fn translate(&mut self, x: f64, y: f64);

    fn set_global_alpha(&mut self, alpha: f64);
    /// Set the composite operation by name; unknown names are ignored.
    fn set_global_composite_operation(&mut self, op: &str);
    fn global_composite_operation(&self) -> CompositeOperation;
    fn set_filter(&mut self, filter: Filter);
    fn filter(&self) -> Filter;

    fn set_fill_style(&mut self, style: FillStyle);
    /// Set a solid fill from a CSS color string; unparsable strings are ignored.
    fn set_fill_color(&mut self, css: &str);

    fn begin_path(&mut self);
    fn arc(&mut self, x: f64, y: f64, radius: f64, start_angle: f64, end_angle: f64, anticlockwise: bool);
    fn rect(&mut self, x: f64, y: f64, width: f64, height: f64);
    fn fill(&mut self);

    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64);
    fn clear_rect(&mut self, x: f64, y: f64, width: f64, height: f64);
}

/// Path command.
#[derive(Clone, Debug, PartialEq)]
pub enum PathCommand {
    Arc {
        x: f64,
        y: f64,
        radius: f64,
        start_angle: f64,
        end_angle: f64,
        anticlockwise: bool,
    },
    Rect(f64, f64, f64, f64),
}

impl PathCommand {
    fn bounds(&self) -> Rect {
        match *self {
            PathCommand::Arc { x, y, radius, .. } => {
                Rect::new(x - radius, y - radius, radius * 2.0, radius * 2.0)
            }
            PathCommand::Rect(x, y, w, h) => {
                Rect::new(x.min(x + w), y.min(y + h), w.abs(), h.abs())
            }
        }
    }

    /// Whether a user-space point lies inside the closed shape.
    fn contains(&self, p: Point) -> bool {
        match *self {
            PathCommand::Arc {
                x,
                y,
                radius,
                start_angle,
                end_angle,
                anticlockwise,
            } => {
                let dx = p.x - x;
                let dy = p.y - y;
                if dx * dx + dy * dy > radius * radius {
                    return false;
                }
                let sweep = if anticlockwise {
                    start_angle - end_angle
                } else {
                    end_angle - start_angle
                };
                if sweep >= TAU {
                    return true;
                }
                let sweep = sweep.rem_euclid(TAU);
                let angle = dy.atan2(dx);
                let from = if anticlockwise { end_angle } else { start_angle };
                (angle - from).rem_euclid(TAU) <= sweep
            }
            PathCommand::Rect(x, y, w, h) => {
                let (x0, x1) = (x.min(x + w), x.max(x + w));
                let (y0, y1) = (y.min(y + h), y.max(y + h));
                p.x >= x0 && p.x < x1 && p.y >= y0 && p.y < y1
            }
        }
    }
}

/// Saved context state.
#[derive(Clone, Debug)]
struct ContextState {
    fill_style: FillStyle,
    global_alpha: f64,
    composite: CompositeOperation,
    filter: Filter,
    transform: Transform,
}

impl Default for ContextState {
    fn default() -> Self {
        Self {
            fill_style: FillStyle::default(),
            global_alpha: 1.0,
            composite: CompositeOperation::SourceOver,
            filter: Filter::None,
            transform: Transform::identity(),
        }
    }
}

/// Image data.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageData {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

/// Subsample offsets used for edge coverage.
const SAMPLES: [(f64, f64); 4] = [(0.25, 0.25), (0.75, 0.25), (0.25, 0.75), (0.75, 0.75)];

/// Software 2D rendering context.
#[derive(Clone, Debug)]
pub struct Canvas2D {
    buffer: PixelBuffer,
    state: ContextState,
    save_stack: Vec<ContextState>,
    path: Vec<PathCommand>,
}

impl Canvas2D {
    /// Create a new 2D context.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            buffer: PixelBuffer::new(width, height),
            state: ContextState::default(),
            save_stack: Vec::new(),
            path: Vec::new(),
        }
    }

    /// Reallocate the backing store. Like assigning `canvas.width`, this
    /// clears the pixels and resets the drawing state.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.buffer = PixelBuffer::new(width, height);
        self.state = ContextState::default();
        self.save_stack.clear();
        self.path.clear();
    }

    pub fn buffer(&self) -> &PixelBuffer {
        &self.buffer
    }

    /// Get pixel data.
    pub fn get_data(&self) -> &[u8] {
        self.buffer.as_bytes()
    }

    pub fn get_pixel(&self, x: u32, y: u32) -> Color {
        self.buffer.get_pixel(x, y)
    }

    pub fn transform(&self) -> Transform {
        self.state.transform
    }

    pub fn fill_style(&self) -> &FillStyle {
        &self.state.fill_style
    }

    pub fn global_alpha(&self) -> f64 {
        self.state.global_alpha
    }

    /// Get image data.
    pub fn get_image_data(&self, x: u32, y: u32, width: u32, height: u32) -> ImageData {
        let mut data = Vec::with_capacity(width as usize * height as usize * 4);
        for py in 0..height {
            for px in 0..width {
                let c = self.buffer.get_pixel(x.saturating_add(px), y.saturating_add(py));
                data.extend_from_slice(&[c.r, c.g, c.b, c.a]);
            }
        }
        ImageData { width, height, data }
    }

    /// Put image data, ignoring composite and filter state.
    pub fn put_image_data(&mut self, image_data: &ImageData, x: i32, y: i32) {
        for py in 0..image_data.height {
            for px in 0..image_data.width {
                let cx = x + px as i32;
                let cy = y + py as i32;
                if cx < 0 || cy < 0 {
                    continue;
                }
                let idx = (py as usize * image_data.width as usize + px as usize) * 4;
                if let Some(rgba) = image_data.data.get(idx..idx + 4) {
                    let color = Color::rgba(rgba[0], rgba[1], rgba[2], rgba[3]);
                    self.buffer.set_pixel(cx as u32, cy as u32, color);
                }
            }
        }
    }

    /// Device-pixel region touched by shapes with the given user-space
    /// bounds, grown by `spread` pixels and clipped to the backing store.
    fn device_region(&self, bounds: Rect, spread: u32) -> PixelRect {
        let device = self.state.transform.transform_rect(bounds).inflate(spread as f64, spread as f64);
        let w = self.buffer.width as f64;
        let h = self.buffer.height as f64;
        let x0 = device.x.floor().clamp(0.0, w);
        let y0 = device.y.floor().clamp(0.0, h);
        let x1 = device.right().ceil().clamp(0.0, w);
        let y1 = device.bottom().ceil().clamp(0.0, h);
        if !(x1 > x0 && y1 > y0) {
            return PixelRect { x: 0, y: 0, width: 0, height: 0 };
        }
        PixelRect {
            x: x0 as u32,
            y: y0 as u32,
            width: (x1 - x0) as u32,
            height: (y1 - y0) as u32,
        }
    }

    fn full_region(&self) -> PixelRect {
        PixelRect {
            x: 0,
            y: 0,
            width: self.buffer.width,
            height: self.buffer.height,
        }
    }

    /// Rasterize, filter and composite a set of shapes with the current state.
    fn fill_shapes(&mut self, shapes: &[PathCommand]) {
        let Some(bounds) = shapes.iter().map(PathCommand::bounds).reduce(|a, b| a.union(&b)) else {
            return;
        };
        let Some(inverse) = self.state.transform.inverse() else {
            return;
        };
        if !bounds.x.is_finite() || !bounds.y.is_finite() || !bounds.width.is_finite() || !bounds.height.is_finite() {
            return;
        }

        let sigma = match self.state.filter {
            Filter::Blur(px) => px,
            Filter::None => 0,
        };
        let spread = sigma.saturating_mul(3);
        let op = self.state.composite;
        let region = if op.is_bounded() {
            self.device_region(bounds, spread)
        } else {
            self.full_region()
        };
        if region.is_empty() {
            return;
        }

        let mut layer = Layer::new(region);
        let alpha = self.state.global_alpha;
        for ly in 0..region.height {
            for lx in 0..region.width {
                let dx = (region.x + lx) as f64;
                let dy = (region.y + ly) as f64;
                let covered = SAMPLES
                    .iter()
                    .filter(|(sx, sy)| {
                        let p = inverse.transform_point(Point::new(dx + sx, dy + sy));
                        shapes.iter().any(|s| s.contains(p))
                    })
                    .count();
                if covered == 0 {
                    continue;
                }
                let coverage = covered as f64 / SAMPLES.len() as f64 * alpha;
                let center = inverse.transform_point(Point::new(dx + 0.5, dy + 0.5));
                let c = self.state.fill_style.premultiplied_at(center);
                layer.set(lx, ly, [c[0] * coverage, c[1] * coverage, c[2] * coverage, c[3] * coverage]);
            }
        }

        if sigma > 0 {
            layer.blur(sigma as f64);
        }
        self.composite_layer(&layer, op);
    }

    fn composite_layer(&mut self, layer: &Layer, op: CompositeOperation) {
        let region = layer.region;
        for ly in 0..region.height {
            for lx in 0..region.width {
                let (x, y) = (region.x + lx, region.y + ly);
                let src = layer.get(lx, ly);
                if op.is_bounded() && src[3] <= 0.0 {
                    continue;
                }
                let dst = self.buffer.premultiplied(x, y);
                self.buffer.store_premultiplied(x, y, op.apply(src, dst));
            }
        }
    }
}

impl Context2D for Canvas2D {
    fn canvas_width(&self) -> u32 {
        self.buffer.width
    }

    fn canvas_height(&self) -> u32 {
        self.buffer.height
    }

    fn save(&mut self) {
        self.save_stack.push(self.state.clone());
    }

    fn restore(&mut self) {
        if let Some(state) = self.save_stack.pop() {
            self.state = state;
        }
    }

    fn reset_transform(&mut self) {
        self.state.transform = Transform::identity();
    }

    fn set_transform(&mut self, transform: Transform) {
        self.state.transform = transform;
    }

    fn scale(&mut self, x: f64, y: f64) {
        self.state.transform = self.state.transform.scale(x, y);
    }

    fn translate(&mut self, x: f64, y: f64) {
        self.state.transform = self.state.transform.translate(x, y);
    }

    fn set_global_alpha(&mut self, alpha: f64) {
        if alpha.is_finite() && (0.0..=1.0).contains(&alpha) {
            self.state.global_alpha = alpha;
        }
    }

    fn set_global_composite_operation(&mut self, op: &str) {
        match CompositeOperation::parse(op) {
            Some(op) => self.state.composite = op,
            None => tracing::warn!(op, "unsupported composite operation ignored"),
        }
    }

    fn global_composite_operation(&self) -> CompositeOperation {
        self.state.composite
    }

    fn set_filter(&mut self, filter: Filter) {
        self.state.filter = filter;
    }

    fn filter(&self) -> Filter {
        self.state.filter
    }

    fn set_fill_style(&mut self, style: FillStyle) {
        self.state.fill_style = style;
    }

    fn set_fill_color(&mut self, css: &str) {
        match Color::parse(css) {
            Some(color) => self.state.fill_style = FillStyle::Solid(color),
            None => tracing::warn!(color = css, "unparsable fill color ignored"),
        }
    }

    fn begin_path(&mut self) {
        self.path.clear();
    }

    fn arc(&mut self, x: f64, y: f64, radius: f64, start_angle: f64, end_angle: f64, anticlockwise: bool) {
        if radius < 0.0 {
            return;
        }
        self.path.push(PathCommand::Arc {
            x,
            y,
            radius,
            start_angle,
            end_angle,
            anticlockwise,
        });
    }

    fn rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.path.push(PathCommand::Rect(x, y, width, height));
    }

    fn fill(&mut self) {
        let path = std::mem::take(&mut self.path);
        self.fill_shapes(&path);
        self.path = path;
    }

    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.fill_shapes(&[PathCommand::Rect(x, y, width, height)]);
    }

    fn clear_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        let shape = PathCommand::Rect(x, y, width, height);
        let Some(inverse) = self.state.transform.inverse() else {
            return;
        };
        let region = self.device_region(shape.bounds(), 0);
        for py in region.y..region.y + region.height {
            for px in region.x..region.x + region.width {
                let p = inverse.transform_point(Point::new(px as f64 + 0.5, py as f64 + 0.5));
                if shape.contains(p) {
                    self.buffer.set_pixel(px, py, Color::TRANSPARENT);
                }
            }
        }
    }
}
