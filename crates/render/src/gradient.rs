//! Fill styles: solid colors and radial gradients.

use common::color::Color;
use common::geometry::Point;
use smallvec::SmallVec;

/// Gradient color stop.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GradientStop {
    /// Position (0.0 - 1.0).
    pub offset: f64,
    /// Color at this stop.
    pub color: Color,
}

/// A concentric radial gradient, like `createRadialGradient(x, y, r0, x, y, r1)`.
#[derive(Clone, Debug, PartialEq)]
pub struct RadialGradient {
    /// Center in user space.
    pub center: Point,
    /// Radius where offset 0 sits.
    pub inner_radius: f64,
    /// Radius where offset 1 sits.
    pub outer_radius: f64,
    stops: SmallVec<[GradientStop; 4]>,
}

impl RadialGradient {
    pub fn new(center: Point, inner_radius: f64, outer_radius: f64) -> Self {
        Self {
            center,
            inner_radius,
            outer_radius,
            stops: SmallVec::new(),
        }
    }

    /// Add a color stop. Offsets are clamped to 0.0 - 1.0 and NaN offsets are
    /// dropped; stops with equal offsets keep insertion order.
    pub fn add_color_stop(&mut self, offset: f64, color: Color) {
        if offset.is_nan() {
            return;
        }
        let offset = offset.clamp(0.0, 1.0);
        let pos = self.stops.partition_point(|s| s.offset <= offset);
        self.stops.insert(pos, GradientStop { offset, color });
    }

    pub fn stops(&self) -> &[GradientStop] {
        &self.stops
    }

    /// Premultiplied color at a user-space point.
    pub fn premultiplied_at(&self, point: Point) -> [f64; 4] {
        let span = self.outer_radius - self.inner_radius;
        let distance = point.distance(self.center);
        let t = if span.abs() < f64::EPSILON {
            if distance < self.outer_radius { 0.0 } else { 1.0 }
        } else {
            (distance - self.inner_radius) / span
        };
        interpolate_premultiplied(&self.stops, t)
    }
}

/// Current fill style of a drawing context.
#[derive(Clone, Debug, PartialEq)]
pub enum FillStyle {
    Solid(Color),
    Radial(RadialGradient),
}

impl Default for FillStyle {
    fn default() -> Self {
        FillStyle::Solid(Color::BLACK)
    }
}

impl FillStyle {
    /// Premultiplied color at a user-space point.
    pub fn premultiplied_at(&self, point: Point) -> [f64; 4] {
        match self {
            FillStyle::Solid(color) => premultiply(*color),
            FillStyle::Radial(gradient) => gradient.premultiplied_at(point),
        }
    }
}

impl From<Color> for FillStyle {
    fn from(color: Color) -> Self {
        FillStyle::Solid(color)
    }
}

impl From<RadialGradient> for FillStyle {
    fn from(gradient: RadialGradient) -> Self {
        FillStyle::Radial(gradient)
    }
}

pub(crate) fn premultiply(color: Color) -> [f64; 4] {
    let [r, g, b, a] = color.to_f64_array();
    [r * a, g * a, b * a, a]
}

/// Interpolate between gradient stops in premultiplied space. Offsets
/// outside the stop range pad with the first/last stop.
fn interpolate_premultiplied(stops: &[GradientStop], t: f64) -> [f64; 4] {
    let (first, last) = match (stops.first(), stops.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return [0.0; 4],
    };

    if t.is_nan() || t <= first.offset {
        return premultiply(first.color);
    }
    if t >= last.offset {
        return premultiply(last.color);
    }

    let next_idx = stops.partition_point(|s| s.offset <= t);
    let prev = &stops[next_idx - 1];
    let next = &stops[next_idx];

    let span = next.offset - prev.offset;
    if span < f64::EPSILON {
        return premultiply(next.color);
    }

    let local_t = (t - prev.offset) / span;
    let a = premultiply(prev.color);
    let b = premultiply(next.color);
    [
        a[0] + (b[0] - a[0]) * local_t,
        a[1] + (b[1] - a[1]) * local_t,
        a[2] + (b[2] - a[2]) * local_t,
        a[3] + (b[3] - a[3]) * local_t,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_stop() -> RadialGradient {
        let mut g = RadialGradient::new(Point::new(0.0, 0.0), 0.0, 100.0);
        g.add_color_stop(0.0, Color::rgb(255, 0, 0));
        g.add_color_stop(0.5, Color::rgb(255, 0, 0).with_alpha(0.5));
        g.add_color_stop(1.0, Color::rgb(255, 0, 0).with_alpha(0.0));
        g
    }

    #[test]
    fn test_gradient_interpolation() {
        let g = three_stop();
        let center = g.premultiplied_at(Point::new(0.0, 0.0));
        assert!((center[3] - 1.0).abs() < 1e-9);

        let quarter = g.premultiplied_at(Point::new(25.0, 0.0));
        assert!(quarter[3] < 1.0 && quarter[3] > 0.5);

        let edge = g.premultiplied_at(Point::new(0.0, 100.0));
        assert!(edge[3].abs() < 1e-9);

        let beyond = g.premultiplied_at(Point::new(300.0, 0.0));
        assert_eq!(beyond, edge);
    }

    #[test]
    fn test_alpha_is_monotonic_outward() {
        let g = three_stop();
        let mut last = f64::INFINITY;
        for d in 0..=100 {
            let a = g.premultiplied_at(Point::new(d as f64, 0.0))[3];
            assert!(a <= last + 1e-12);
            last = a;
        }
    }

    #[test]
    fn test_stops_sorted_and_clamped() {
        let mut g = RadialGradient::new(Point::ZERO, 0.0, 1.0);
        g.add_color_stop(0.9, Color::WHITE);
        g.add_color_stop(-3.0, Color::BLACK);
        g.add_color_stop(f64::NAN, Color::RED);
        let offsets: Vec<f64> = g.stops().iter().map(|s| s.offset).collect();
        assert_eq!(offsets, vec![0.0, 0.9]);
    }

    #[test]
    fn test_empty_gradient_is_transparent() {
        let g = RadialGradient::new(Point::ZERO, 0.0, 10.0);
        assert_eq!(g.premultiplied_at(Point::ZERO), [0.0; 4]);
    }

    #[test]
    fn test_solid_fill_premultiplied() {
        let style = FillStyle::from(Color::rgba(255, 0, 0, 0));
        assert_eq!(style.premultiplied_at(Point::ZERO), [0.0; 4]);
    }
}
