//! Compositing operators: Porter-Duff operations and blend modes.
//!
//! Blend modes follow the W3C Compositing and Blending formulas: the blended
//! source color is composited with `source-over`.

use std::fmt;

/// Canvas `globalCompositeOperation` values.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum CompositeOperation {
    #[default]
    SourceOver,
    SourceIn,
    SourceOut,
    SourceAtop,
    DestinationOver,
    DestinationIn,
    DestinationOut,
    DestinationAtop,
    Lighter,
    Copy,
    Xor,
    Multiply,
    Screen,
    Overlay,
    Darken,
    Lighten,
    ColorDodge,
    ColorBurn,
    HardLight,
    SoftLight,
    Difference,
    Exclusion,
    Hue,
    Saturation,
    Color,
    Luminosity,
}

impl CompositeOperation {
    /// Parse a canvas operator name. `normal` is an alias of `source-over`.
    pub fn parse(name: &str) -> Option<Self> {
        let op = match name.trim() {
            "normal" | "source-over" => Self::SourceOver,
            "source-in" => Self::SourceIn,
            "source-out" => Self::SourceOut,
            "source-atop" => Self::SourceAtop,
            "destination-over" => Self::DestinationOver,
            "destination-in" => Self::DestinationIn,
            "destination-out" => Self::DestinationOut,
            "destination-atop" => Self::DestinationAtop,
            "lighter" => Self::Lighter,
            "copy" => Self::Copy,
            "xor" => Self::Xor,
            "multiply" => Self::Multiply,
            "screen" => Self::Screen,
            "overlay" => Self::Overlay,
            "darken" => Self::Darken,
            "lighten" => Self::Lighten,
            "color-dodge" => Self::ColorDodge,
            "color-burn" => Self::ColorBurn,
            "hard-light" => Self::HardLight,
            "soft-light" => Self::SoftLight,
            "difference" => Self::Difference,
            "exclusion" => Self::Exclusion,
            "hue" => Self::Hue,
            "saturation" => Self::Saturation,
            "color" => Self::Color,
            "luminosity" => Self::Luminosity,
            _ => return None,
        };
        Some(op)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SourceOver => "source-over",
            Self::SourceIn => "source-in",
            Self::SourceOut => "source-out",
            Self::SourceAtop => "source-atop",
            Self::DestinationOver => "destination-over",
            Self::DestinationIn => "destination-in",
            Self::DestinationOut => "destination-out",
            Self::DestinationAtop => "destination-atop",
            Self::Lighter => "lighter",
            Self::Copy => "copy",
            Self::Xor => "xor",
            Self::Multiply => "multiply",
            Self::Screen => "screen",
            Self::Overlay => "overlay",
            Self::Darken => "darken",
            Self::Lighten => "lighten",
            Self::ColorDodge => "color-dodge",
            Self::ColorBurn => "color-burn",
            Self::HardLight => "hard-light",
            Self::SoftLight => "soft-light",
            Self::Difference => "difference",
            Self::Exclusion => "exclusion",
            Self::Hue => "hue",
            Self::Saturation => "saturation",
            Self::Color => "color",
            Self::Luminosity => "luminosity",
        }
    }

    /// Whether pixels outside the source shape stay untouched.
    ///
    /// Unbounded operators (`source-in`, `copy`, ...) also affect the
    /// destination where the source is transparent.
    pub fn is_bounded(&self) -> bool {
        !matches!(
            self,
            Self::SourceIn | Self::SourceOut | Self::DestinationIn | Self::DestinationAtop | Self::Copy
        )
    }

    /// Composite one premultiplied source pixel onto a premultiplied
    /// destination pixel. Channels are `[r, g, b, a]` in 0.0 - 1.0.
    pub fn apply(&self, src: [f64; 4], dst: [f64; 4]) -> [f64; 4] {
        let sa = src[3];
        let da = dst[3];
        let porter_duff = |fa: f64, fb: f64| -> [f64; 4] {
            [
                src[0] * fa + dst[0] * fb,
                src[1] * fa + dst[1] * fb,
                src[2] * fa + dst[2] * fb,
                sa * fa + da * fb,
            ]
        };

        match self {
            Self::SourceOver => porter_duff(1.0, 1.0 - sa),
            Self::SourceIn => porter_duff(da, 0.0),
            Self::SourceOut => porter_duff(1.0 - da, 0.0),
            Self::SourceAtop => porter_duff(da, 1.0 - sa),
            Self::DestinationOver => porter_duff(1.0 - da, 1.0),
            Self::DestinationIn => porter_duff(0.0, sa),
            Self::DestinationOut => porter_duff(0.0, 1.0 - sa),
            Self::DestinationAtop => porter_duff(1.0 - da, sa),
            Self::Copy => porter_duff(1.0, 0.0),
            Self::Xor => porter_duff(1.0 - da, 1.0 - sa),
            Self::Lighter => {
                let out = porter_duff(1.0, 1.0);
                [out[0].min(1.0), out[1].min(1.0), out[2].min(1.0), out[3].min(1.0)]
            }
            _ => self.blend_source_over(src, dst),
        }
    }

    fn blend_source_over(&self, src: [f64; 4], dst: [f64; 4]) -> [f64; 4] {
        let sa = src[3];
        let da = dst[3];
        if sa <= 0.0 {
            return dst;
        }

        let cs = unpremultiply(src);
        let cb = unpremultiply(dst);
        let mixed = self.blend(cb, cs);

        let mut out = [0.0; 4];
        for i in 0..3 {
            // Blended color weighted by backdrop coverage, then source-over.
            let c = (1.0 - da) * cs[i] + da * mixed[i];
            out[i] = sa * c + dst[i] * (1.0 - sa);
        }
        out[3] = sa + da * (1.0 - sa);
        out
    }

    /// Blend function `B(cb, cs)` on unpremultiplied colors.
    fn blend(&self, cb: [f64; 3], cs: [f64; 3]) -> [f64; 3] {
        match self {
            Self::Hue => set_lum(set_sat(cs, sat(cb)), lum(cb)),
            Self::Saturation => set_lum(set_sat(cb, sat(cs)), lum(cb)),
            Self::Color => set_lum(cs, lum(cb)),
            Self::Luminosity => set_lum(cb, lum(cs)),
            _ => {
                let f = |b: f64, s: f64| self.blend_channel(b, s);
                [f(cb[0], cs[0]), f(cb[1], cs[1]), f(cb[2], cs[2])]
            }
        }
    }

    fn blend_channel(&self, cb: f64, cs: f64) -> f64 {
        match self {
            Self::Multiply => cb * cs,
            Self::Screen => screen(cb, cs),
            Self::Overlay => hard_light(cs, cb),
            Self::Darken => cb.min(cs),
            Self::Lighten => cb.max(cs),
            Self::ColorDodge => {
                if cb <= 0.0 {
                    0.0
                } else if cs >= 1.0 {
                    1.0
                } else {
                    (cb / (1.0 - cs)).min(1.0)
                }
            }
            Self::ColorBurn => {
                if cb >= 1.0 {
                    1.0
                } else if cs <= 0.0 {
                    0.0
                } else {
                    1.0 - ((1.0 - cb) / cs).min(1.0)
                }
            }
            Self::HardLight => hard_light(cb, cs),
            Self::SoftLight => {
                if cs <= 0.5 {
                    cb - (1.0 - 2.0 * cs) * cb * (1.0 - cb)
                } else {
                    let d = if cb <= 0.25 {
                        ((16.0 * cb - 12.0) * cb + 4.0) * cb
                    } else {
                        cb.sqrt()
                    };
                    cb + (2.0 * cs - 1.0) * (d - cb)
                }
            }
            Self::Difference => (cb - cs).abs(),
            Self::Exclusion => cb + cs - 2.0 * cb * cs,
            _ => cs,
        }
    }
}

impl fmt::Display for CompositeOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn screen(cb: f64, cs: f64) -> f64 {
    cb + cs - cb * cs
}

fn hard_light(cb: f64, cs: f64) -> f64 {
    if cs <= 0.5 {
        cb * 2.0 * cs
    } else {
        screen(cb, 2.0 * cs - 1.0)
    }
}

fn unpremultiply(c: [f64; 4]) -> [f64; 3] {
    if c[3] <= 0.0 {
        return [0.0; 3];
    }
    [
        (c[0] / c[3]).clamp(0.0, 1.0),
        (c[1] / c[3]).clamp(0.0, 1.0),
        (c[2] / c[3]).clamp(0.0, 1.0),
    ]
}

fn lum(c: [f64; 3]) -> f64 {
    0.3 * c[0] + 0.59 * c[1] + 0.11 * c[2]
}

fn clip_color(c: [f64; 3]) -> [f64; 3] {
    let l = lum(c);
    let n = c[0].min(c[1]).min(c[2]);
    let x = c[0].max(c[1]).max(c[2]);
    let mut out = c;
    if n < 0.0 {
        for v in &mut out {
            *v = l + (*v - l) * l / (l - n);
        }
    }
    if x > 1.0 {
        for v in &mut out {
            *v = l + (*v - l) * (1.0 - l) / (x - l);
        }
    }
    out
}

fn set_lum(c: [f64; 3], l: f64) -> [f64; 3] {
    let d = l - lum(c);
    clip_color([c[0] + d, c[1] + d, c[2] + d])
}

fn sat(c: [f64; 3]) -> f64 {
    c[0].max(c[1]).max(c[2]) - c[0].min(c[1]).min(c[2])
}

fn set_sat(c: [f64; 3], s: f64) -> [f64; 3] {
    let mut idx = [0usize, 1, 2];
    idx.sort_by(|&a, &b| c[a].total_cmp(&c[b]));
    let [min, mid, max] = idx;

    let mut out = [0.0; 3];
    if c[max] > c[min] {
        out[mid] = (c[mid] - c[min]) * s / (c[max] - c[min]);
        out[max] = s;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: [f64; 4], b: [f64; 4]) -> bool {
        a.iter().zip(b.iter()).all(|(x, y)| (x - y).abs() < 1e-9)
    }

    #[test]
    fn test_parse_round_trip() {
        for name in [
            "source-over", "copy", "xor", "multiply", "screen", "overlay", "darken", "lighten",
            "color-dodge", "color-burn", "hard-light", "soft-light", "difference", "exclusion",
            "hue", "saturation", "color", "luminosity",
        ] {
            let op = CompositeOperation::parse(name).unwrap();
            assert_eq!(op.as_str(), name);
        }
        assert_eq!(CompositeOperation::parse("normal"), Some(CompositeOperation::SourceOver));
        assert_eq!(CompositeOperation::parse("plus-darker"), None);
    }

    #[test]
    fn test_source_over_on_transparent() {
        let src = [0.5, 0.0, 0.0, 0.5];
        let out = CompositeOperation::SourceOver.apply(src, [0.0; 4]);
        assert!(close(out, src));
    }

    #[test]
    fn test_blend_over_transparent_is_source_over() {
        // With no backdrop every blend mode degenerates to plain source-over.
        let src = [0.2, 0.4, 0.1, 0.5];
        for op in [
            CompositeOperation::Multiply,
            CompositeOperation::Screen,
            CompositeOperation::Difference,
            CompositeOperation::Hue,
            CompositeOperation::Luminosity,
        ] {
            assert!(close(op.apply(src, [0.0; 4]), src), "{op}");
        }
    }

    #[test]
    fn test_multiply_opaque() {
        let out = CompositeOperation::Multiply.apply([0.5, 1.0, 0.0, 1.0], [1.0, 0.5, 1.0, 1.0]);
        assert!(close(out, [0.5, 0.5, 0.0, 1.0]));
    }

    #[test]
    fn test_screen_and_difference_opaque() {
        let s = CompositeOperation::Screen.apply([0.5, 0.5, 0.5, 1.0], [0.5, 0.5, 0.5, 1.0]);
        assert!(close(s, [0.75, 0.75, 0.75, 1.0]));
        let d = CompositeOperation::Difference.apply([1.0, 0.25, 0.0, 1.0], [0.5, 0.5, 0.5, 1.0]);
        assert!(close(d, [0.5, 0.25, 0.5, 1.0]));
    }

    #[test]
    fn test_destination_out_erases() {
        let out = CompositeOperation::DestinationOut.apply([0.0, 0.0, 0.0, 1.0], [1.0, 1.0, 1.0, 1.0]);
        assert!(close(out, [0.0; 4]));
        assert!(CompositeOperation::DestinationOut.is_bounded());
        assert!(!CompositeOperation::Copy.is_bounded());
    }

    #[test]
    fn test_luminosity_keeps_backdrop_hue() {
        let gray = [0.5, 0.5, 0.5, 1.0];
        let red = [1.0, 0.0, 0.0, 1.0];
        let out = CompositeOperation::Luminosity.apply(gray, red);
        // Result keeps red's hue with the source's luminosity.
        assert!(out[0] > out[1] && (out[1] - out[2]).abs() < 1e-9);
        assert!((lum([out[0], out[1], out[2]]) - 0.5).abs() < 1e-9);
    }
}
