//! Built-in scenes.

use crate::scene::Scene;
use common::color::Color;
use common::geometry::Point;
use fluid::{Blob, BreathSpec, CenterSpec, DriftSpec, EngineOptions, Layer};

/// Margin kept between the corner blob and the viewport edge.
const CORNER_MARGIN: f64 = 48.0;

/// Three slow blobs in greens and violets, one pinned to the bottom-left
/// corner.
pub fn aurora() -> Scene {
    let options = EngineOptions::default()
        .with_alpha(0.85)
        .with_blur_px(24.0)
        .with_composite("screen")
        .with_background("#07070f");

    let blobs = vec![
        Blob::new("aurora-green")
            .with_diameter("60vmax")
            .with_center(CenterSpec::symbolic("30%", "35%"))
            .with_layer(Layer::new(Color::rgb(46, 230, 160), 0.9, 0.35, 0.0))
            .with_layer(Layer::new(Color::rgb(180, 255, 220), 0.5, 0.1, 0.0))
            .with_drift(DriftSpec::new(40.0, 25.0, 15.0, 10.0, 0.04))
            .with_breath(BreathSpec {
                scale: [0.92, 1.08],
                opacity: [0.75, 1.0],
                speed: 0.08,
                phase: 0.0,
            }),
        Blob::new("aurora-violet")
            .with_diameter("50vmax")
            .with_center(CenterSpec::symbolic("72%", "45%"))
            .with_layer(Layer::new(Color::rgb(140, 80, 255), 0.85, 0.3, 0.0))
            .with_opacity(0.9)
            .with_parallax(0.5)
            .with_drift(DriftSpec::new(30.0, 35.0, 12.0, 8.0, 0.03))
            .with_breath(BreathSpec {
                scale: [0.95, 1.1],
                opacity: [0.6, 1.0],
                speed: 0.06,
                phase: 0.4,
            }),
        Blob::new("aurora-corner")
            .with_diameter("35vmax")
            .with_center(CenterSpec::computed(|dims| {
                Point::new(CORNER_MARGIN, dims.height - CORNER_MARGIN)
            }))
            .with_layer(Layer::new(Color::rgb(255, 90, 170), 0.7, 0.25, 0.0))
            .with_drift(DriftSpec::new(10.0, 10.0, 5.0, 5.0, 0.05)),
    ];

    Scene { options, blobs }
}
