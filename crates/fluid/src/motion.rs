//! Procedural motion: positional drift and breathing.
//!
//! Both functions take seconds since the engine's animation start, never
//! since a blob was added, so every blob shares one global phase.

use crate::blob::{BreathSpec, DriftSpec};
use common::geometry::Point;
use std::f64::consts::TAU;

/// Frequency ratio of the secondary drift component. Detuning it from the
/// primary keeps the path from closing into a visible ellipse.
pub const DRIFT_DETUNE: f64 = 0.7;

/// Drift offset in logical pixels at `t` seconds.
pub fn drift(spec: &DriftSpec, t: f64) -> Point {
    let primary = TAU * spec.speed * t;
    let secondary = TAU * DRIFT_DETUNE * spec.speed * t;
    Point::new(
        spec.ax * primary.sin() + spec.sx * secondary.cos(),
        spec.ay * primary.cos() + spec.sy * secondary.sin(),
    )
}

/// Breath multipliers for one instant.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BreathState {
    pub scale: f64,
    pub opacity: f64,
}

impl BreathState {
    pub const IDENTITY: BreathState = BreathState {
        scale: 1.0,
        opacity: 1.0,
    };
}

/// Breath multipliers at `t` seconds. No spec means no breathing.
pub fn breath(spec: Option<&BreathSpec>, t: f64) -> BreathState {
    let Some(spec) = spec else {
        return BreathState::IDENTITY;
    };
    let phase01 = 0.5 + 0.5 * (TAU * spec.phase + TAU * spec.speed * t).sin();
    BreathState {
        scale: lerp(spec.scale[0], spec.scale[1], phase01),
        opacity: lerp(spec.opacity[0], spec.opacity[1], phase01),
    }
}

/// Linear interpolation.
fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn sample_times() -> impl Iterator<Item = f64> {
        (0..2000).map(|i| i as f64 * 0.0137 - 3.0)
    }

    #[test]
    fn test_drift_bounded() {
        let spec = DriftSpec::new(12.0, -7.0, 5.0, 3.5, 0.23);
        for t in sample_times() {
            let d = drift(&spec, t);
            assert!(d.x.abs() <= 12.0 + 5.0 + EPS);
            assert!(d.y.abs() <= 7.0 + 3.5 + EPS);
        }
    }

    #[test]
    fn test_drift_at_zero() {
        let spec = DriftSpec::new(12.0, 8.0, 5.0, 3.0, 0.4);
        let d = drift(&spec, 0.0);
        assert!((d.x - 5.0).abs() < EPS);
        assert!((d.y - 8.0).abs() < EPS);
        assert_eq!(drift(&DriftSpec::default(), 42.0), Point::ZERO);
    }

    #[test]
    fn test_drift_periodic() {
        let s = 0.25;
        let primary_only = DriftSpec::new(10.0, 6.0, 0.0, 0.0, s);
        let full = DriftSpec::new(10.0, 6.0, 4.0, 2.0, s);
        for t in [0.0, 0.3, 1.7, 12.5] {
            let a = drift(&primary_only, t);
            let b = drift(&primary_only, t + 1.0 / s);
            assert!((a.x - b.x).abs() < 1e-6 && (a.y - b.y).abs() < 1e-6);

            // Both components realign after ten primary cycles.
            let a = drift(&full, t);
            let b = drift(&full, t + 10.0 / s);
            assert!((a.x - b.x).abs() < 1e-6 && (a.y - b.y).abs() < 1e-6);
        }
    }

    #[test]
    fn test_breath_periodic() {
        let s = 0.4;
        let spec = BreathSpec {
            scale: [0.8, 1.3],
            opacity: [0.2, 0.9],
            speed: s,
            phase: 0.15,
        };
        for t in [0.0, 0.9, 3.3, 27.0] {
            let a = breath(Some(&spec), t);
            let b = breath(Some(&spec), t + 1.0 / s);
            assert!((a.scale - b.scale).abs() < 1e-9);
            assert!((a.opacity - b.opacity).abs() < 1e-9);
        }
    }

    #[test]
    fn test_breath_stays_in_range() {
        let spec = BreathSpec {
            scale: [0.9, 1.1],
            opacity: [0.5, 1.0],
            speed: 0.7,
            phase: 0.0,
        };
        for t in sample_times() {
            let b = breath(Some(&spec), t);
            assert!(b.scale >= 0.9 - EPS && b.scale <= 1.1 + EPS);
            assert!(b.opacity >= 0.5 - EPS && b.opacity <= 1.0 + EPS);
        }
    }

    #[test]
    fn test_breath_phase_offset() {
        let spec = BreathSpec {
            scale: [1.0, 2.0],
            opacity: [0.0, 1.0],
            speed: 1.0,
            phase: 0.25,
        };
        // A quarter-cycle phase puts t = 0 at the peak.
        let b = breath(Some(&spec), 0.0);
        assert!((b.scale - 2.0).abs() < EPS);
        assert!((b.opacity - 1.0).abs() < EPS);
    }

    #[test]
    fn test_no_breath_is_identity() {
        for t in sample_times() {
            assert_eq!(breath(None, t), BreathState::IDENTITY);
        }
    }
}
