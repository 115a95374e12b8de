//! Pixel storage, scratch layers and the blur filter.

use common::color::Color;

/// Pixel buffer backing a drawing context.
#[derive(Clone, Debug)]
pub struct PixelBuffer {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// RGBA pixel data (4 bytes per pixel, not premultiplied).
    pub data: Vec<u8>,
}

impl PixelBuffer {
    pub fn new(width: u32, height: u32) -> Self {
        let size = width as usize * height as usize * 4;
        Self {
            width,
            height,
            data: vec![0; size],
        }
    }

    /// Fill with a color.
    pub fn fill(&mut self, color: Color) {
        for chunk in self.data.chunks_exact_mut(4) {
            chunk[0] = color.r;
            chunk[1] = color.g;
            chunk[2] = color.b;
            chunk[3] = color.a;
        }
    }

    /// Clear to transparent.
    pub fn clear(&mut self) {
        self.data.fill(0);
    }

    /// Whether every pixel is fully transparent.
    pub fn is_transparent(&self) -> bool {
        self.data.chunks_exact(4).all(|px| px[3] == 0)
    }

    #[inline]
    fn offset(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * 4
    }

    /// Get pixel at position.
    pub fn get_pixel(&self, x: u32, y: u32) -> Color {
        if x >= self.width || y >= self.height {
            return Color::TRANSPARENT;
        }

        let offset = self.offset(x, y);
        Color::rgba(
            self.data[offset],
            self.data[offset + 1],
            self.data[offset + 2],
            self.data[offset + 3],
        )
    }

    /// Set pixel at position.
    pub fn set_pixel(&mut self, x: u32, y: u32, color: Color) {
        if x >= self.width || y >= self.height {
            return;
        }

        let offset = self.offset(x, y);
        self.data[offset] = color.r;
        self.data[offset + 1] = color.g;
        self.data[offset + 2] = color.b;
        self.data[offset + 3] = color.a;
    }

    /// Read a pixel as premultiplied 0.0 - 1.0 channels.
    pub(crate) fn premultiplied(&self, x: u32, y: u32) -> [f64; 4] {
        let offset = self.offset(x, y);
        let a = self.data[offset + 3] as f64 / 255.0;
        [
            self.data[offset] as f64 / 255.0 * a,
            self.data[offset + 1] as f64 / 255.0 * a,
            self.data[offset + 2] as f64 / 255.0 * a,
            a,
        ]
    }

    /// Store premultiplied channels, unpremultiplying and quantizing.
    pub(crate) fn store_premultiplied(&mut self, x: u32, y: u32, px: [f64; 4]) {
        let offset = self.offset(x, y);
        let a = px[3].clamp(0.0, 1.0);
        if a <= 0.0 {
            self.data[offset..offset + 4].fill(0);
            return;
        }
        for i in 0..3 {
            self.data[offset + i] = to_u8(px[i] / a);
        }
        self.data[offset + 3] = to_u8(a);
    }

    /// Get as raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

#[inline]
fn to_u8(v: f64) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Integer device-pixel region.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Premultiplied scratch layer covering a region of the backing store.
///
/// Each drawing operation paints into one of these first so the blur
/// filter can run before compositing.
#[derive(Clone, Debug)]
pub struct Layer {
    pub region: PixelRect,
    pixels: Vec<[f32; 4]>,
}

impl Layer {
    pub fn new(region: PixelRect) -> Self {
        let len = region.width as usize * region.height as usize;
        Self {
            region,
            pixels: vec![[0.0; 4]; len],
        }
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.region.width as usize + x as usize
    }

    /// Set a pixel in layer-local coordinates.
    pub fn set(&mut self, x: u32, y: u32, px: [f64; 4]) {
        let idx = self.index(x, y);
        self.pixels[idx] = [px[0] as f32, px[1] as f32, px[2] as f32, px[3] as f32];
    }

    /// Get a pixel in layer-local coordinates.
    pub fn get(&self, x: u32, y: u32) -> [f64; 4] {
        let p = self.pixels[self.index(x, y)];
        [p[0] as f64, p[1] as f64, p[2] as f64, p[3] as f64]
    }

    /// Apply a separable gaussian blur with standard deviation `sigma`.
    /// Pixels outside the layer count as transparent.
    pub fn blur(&mut self, sigma: f64) {
        if self.region.is_empty() {
            return;
        }
        let w = self.region.width as usize;
        let h = self.region.height as usize;
        // Taps further out than the layer only ever land outside it.
        let kernel = gaussian_kernel(sigma, w.max(h));
        if kernel.len() <= 1 {
            return;
        }

        let mut tmp = vec![[0.0f32; 4]; self.pixels.len()];
        convolve(&self.pixels, &mut tmp, w, h, &kernel, 1, w);
        convolve(&tmp, &mut self.pixels, h, w, &kernel, w, 1);
    }
}

/// Normalized gaussian weights, `2 * ceil(3 * sigma) + 1` taps with the
/// radius capped at `max_radius`.
pub fn gaussian_kernel(sigma: f64, max_radius: usize) -> Vec<f32> {
    if !sigma.is_finite() || sigma <= 0.0 {
        return vec![1.0];
    }

    let radius = (sigma * 3.0).ceil().min(max_radius as f64) as i64;
    let denom = 2.0 * sigma * sigma;
    let mut weights: Vec<f64> = (-radius..=radius)
        .map(|i| (-((i * i) as f64) / denom).exp())
        .collect();
    let sum: f64 = weights.iter().sum();
    for w in &mut weights {
        *w /= sum;
    }
    weights.into_iter().map(|w| w as f32).collect()
}

/// One blur pass. `len` pixels along the pass with stride `step`, repeated
/// for `lines` lines spaced `line_stride` apart.
fn convolve(
    src: &[[f32; 4]],
    dst: &mut [[f32; 4]],
    len: usize,
    lines: usize,
    kernel: &[f32],
    step: usize,
    line_stride: usize,
) {
    let radius = (kernel.len() / 2) as isize;
    for line in 0..lines {
        let base = line * line_stride;
        for i in 0..len as isize {
            let mut acc = [0.0f32; 4];
            for (k, &weight) in kernel.iter().enumerate() {
                let j = i + k as isize - radius;
                if j < 0 || j >= len as isize {
                    continue;
                }
                let p = src[base + j as usize * step];
                for c in 0..4 {
                    acc[c] += weight * p[c];
                }
            }
            dst[base + i as usize * step] = acc;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixel_buffer() {
        let mut buffer = PixelBuffer::new(100, 100);
        assert_eq!(buffer.width, 100);
        assert_eq!(buffer.height, 100);
        assert_eq!(buffer.data.len(), 100 * 100 * 4);
        assert!(buffer.is_transparent());

        buffer.set_pixel(50, 50, Color::rgb(255, 0, 0));
        let pixel = buffer.get_pixel(50, 50);
        assert_eq!(pixel, Color::rgb(255, 0, 0));
        assert_eq!(buffer.get_pixel(500, 0), Color::TRANSPARENT);
        assert!(!buffer.is_transparent());
    }

    #[test]
    fn test_premultiplied_round_trip() {
        let mut buffer = PixelBuffer::new(1, 1);
        buffer.store_premultiplied(0, 0, [0.25, 0.0, 0.0, 0.5]);
        assert_eq!(buffer.get_pixel(0, 0), Color::rgba(128, 0, 0, 128));
        buffer.store_premultiplied(0, 0, [0.3, 0.3, 0.3, 0.0]);
        assert_eq!(buffer.get_pixel(0, 0), Color::TRANSPARENT);
    }

    #[test]
    fn test_gaussian_kernel_normalized() {
        let k = gaussian_kernel(2.0, usize::MAX);
        assert_eq!(k.len(), 13);
        let sum: f32 = k.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
        assert!(k[6] > k[5] && (k[5] - k[7]).abs() < 1e-7);
        assert_eq!(gaussian_kernel(0.0, usize::MAX), vec![1.0]);
    }

    #[test]
    fn test_gaussian_kernel_radius_capped() {
        let k = gaussian_kernel(u32::MAX as f64, 10);
        assert_eq!(k.len(), 21);
        let sum: f32 = k.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
        assert_eq!(gaussian_kernel(2.0, 4).len(), 9);
    }

    #[test]
    fn test_blur_spreads_and_conserves() {
        let region = PixelRect { x: 0, y: 0, width: 21, height: 21 };
        let mut layer = Layer::new(region);
        layer.set(10, 10, [1.0, 1.0, 1.0, 1.0]);
        layer.blur(1.5);

        let center = layer.get(10, 10)[3];
        let neighbor = layer.get(11, 10)[3];
        assert!(center < 1.0 && neighbor > 0.0 && neighbor < center);

        let mut total = 0.0;
        for y in 0..21 {
            for x in 0..21 {
                total += layer.get(x, y)[3];
            }
        }
        assert!((total - 1.0).abs() < 1e-4);
    }
}
