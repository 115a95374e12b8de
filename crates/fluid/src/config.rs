//! Engine configuration.

use serde::{Deserialize, Serialize};

/// Construction-time engine options.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineOptions {
    /// Global opacity multiplier, 0.0 - 1.0.
    pub alpha: f64,
    /// Blur standard deviation in device pixels.
    pub blur_px: f64,
    /// Global parallax magnitude.
    pub parallax_vmax: f64,
    /// Frame-rate ceiling; 0 means unlimited.
    pub fps_cap: u32,
    /// Composite operation name.
    pub composite: String,
    /// Background fill color; `None` leaves the surface transparent.
    pub background: Option<String>,
    /// Start the frame loop as soon as the engine is built.
    pub auto_start: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            alpha: 0.5,
            blur_px: 36.0,
            parallax_vmax: 1.0,
            fps_cap: 0,
            composite: "normal".to_string(),
            background: None,
            auto_start: true,
        }
    }
}

impl EngineOptions {
    /// Create options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Options for driving frames by hand: no auto start, no blur.
    pub fn manual() -> Self {
        Self {
            blur_px: 0.0,
            auto_start: false,
            ..Self::default()
        }
    }

    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn with_blur_px(mut self, blur_px: f64) -> Self {
        self.blur_px = blur_px;
        self
    }

    pub fn with_parallax(mut self, parallax: f64) -> Self {
        self.parallax_vmax = parallax;
        self
    }

    pub fn with_fps_cap(mut self, fps_cap: u32) -> Self {
        self.fps_cap = fps_cap;
        self
    }

    pub fn with_composite(mut self, composite: impl Into<String>) -> Self {
        self.composite = composite.into();
        self
    }

    pub fn with_background(mut self, background: impl Into<String>) -> Self {
        self.background = Some(background.into());
        self
    }

    pub fn with_auto_start(mut self, auto_start: bool) -> Self {
        self.auto_start = auto_start;
        self
    }
}

/// Clamp an opacity multiplier into 0.0 - 1.0; NaN becomes 0.
pub(crate) fn clamp_unit(v: f64) -> f64 {
    if v.is_nan() {
        0.0
    } else {
        v.clamp(0.0, 1.0)
    }
}

/// Truncate a blur radius to whole pixels; negative or non-finite is 0.
pub(crate) fn blur_to_px(v: f64) -> u32 {
    if v.is_finite() && v > 0.0 {
        v.trunc().min(u32::MAX as f64) as u32
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = EngineOptions::default();
        assert_eq!(options.alpha, 0.5);
        assert_eq!(options.blur_px, 36.0);
        assert_eq!(options.parallax_vmax, 1.0);
        assert_eq!(options.fps_cap, 0);
        assert_eq!(options.composite, "normal");
        assert!(options.background.is_none());
        assert!(options.auto_start);
    }

    #[test]
    fn test_partial_json() {
        let options: EngineOptions =
            serde_json::from_str(r##"{ "blurPx": 12, "fpsCap": 30, "background": "#101018", "autoStart": false }"##).unwrap();
        assert_eq!(options.blur_px, 12.0);
        assert_eq!(options.fps_cap, 30);
        assert_eq!(options.background.as_deref(), Some("#101018"));
        assert!(!options.auto_start);
        assert_eq!(options.alpha, 0.5);
    }

    #[test]
    fn test_builders() {
        let options = EngineOptions::manual()
            .with_alpha(1.0)
            .with_composite("screen")
            .with_background("black")
            .with_parallax(2.0)
            .with_fps_cap(24)
            .with_blur_px(4.0);
        assert!(!options.auto_start);
        assert_eq!(options.alpha, 1.0);
        assert_eq!(options.composite, "screen");
        assert_eq!(options.parallax_vmax, 2.0);
        assert_eq!(options.fps_cap, 24);
        assert_eq!(options.blur_px, 4.0);
    }

    #[test]
    fn test_clamps() {
        assert_eq!(clamp_unit(1.5), 1.0);
        assert_eq!(clamp_unit(-0.1), 0.0);
        assert_eq!(clamp_unit(f64::NAN), 0.0);
        assert_eq!(blur_to_px(12.9), 12);
        assert_eq!(blur_to_px(-3.0), 0);
        assert_eq!(blur_to_px(f64::INFINITY), 0);
    }
}
