//! Blob configuration types.

use common::color::Color;
use common::geometry::{Point, Size};
use common::units::{Axis, Dimension};
use serde::ser::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::Arc;

/// One radial gradient pass of a blob.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Layer {
    /// Base color; its own alpha is ignored.
    pub color: Color,
    /// Alpha at the center.
    #[serde(default = "default_alpha_center")]
    pub alpha_center: f64,
    /// Alpha halfway out.
    #[serde(default = "default_alpha_mid")]
    pub alpha_mid: f64,
    /// Alpha at the rim.
    #[serde(default)]
    pub alpha_edge: f64,
}

fn default_alpha_center() -> f64 {
    1.0
}

fn default_alpha_mid() -> f64 {
    0.5
}

impl Layer {
    pub fn new(color: Color, alpha_center: f64, alpha_mid: f64, alpha_edge: f64) -> Self {
        Self {
            color,
            alpha_center,
            alpha_mid,
            alpha_edge,
        }
    }

    /// A layer fading from opaque at the center to transparent at the rim.
    pub fn solid(color: Color) -> Self {
        Self::new(color, default_alpha_center(), default_alpha_mid(), 0.0)
    }
}

/// Drift amplitudes in logical pixels and a speed in cycles per second.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriftSpec {
    pub ax: f64,
    pub ay: f64,
    pub sx: f64,
    pub sy: f64,
    pub speed: f64,
}

impl DriftSpec {
    pub fn new(ax: f64, ay: f64, sx: f64, sy: f64, speed: f64) -> Self {
        Self { ax, ay, sx, sy, speed }
    }
}

/// Periodic scale and opacity oscillation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BreathSpec {
    /// Radius multiplier range `[min, max]`.
    pub scale: [f64; 2],
    /// Opacity multiplier range `[min, max]`.
    pub opacity: [f64; 2],
    /// Cycles per second.
    pub speed: f64,
    /// Phase offset as a fraction of one cycle.
    pub phase: f64,
}

impl Default for BreathSpec {
    fn default() -> Self {
        Self {
            scale: [1.0, 1.0],
            opacity: [1.0, 1.0],
            speed: 0.0,
            phase: 0.0,
        }
    }
}

/// Viewport-relative anchor function for [`CenterSpec::Computed`].
pub type CenterFn = Arc<dyn Fn(Size) -> Point + Send + Sync>;

/// Where a blob sits.
#[derive(Clone)]
pub enum CenterSpec {
    /// Two symbolic coordinates, resolved against width and height.
    Symbolic { x: Dimension, y: Dimension },
    /// Absolute position computed from the logical viewport size.
    Computed(CenterFn),
}

impl CenterSpec {
    pub fn symbolic(x: impl Into<Dimension>, y: impl Into<Dimension>) -> Self {
        CenterSpec::Symbolic { x: x.into(), y: y.into() }
    }

    pub fn computed<F>(f: F) -> Self
    where
        F: Fn(Size) -> Point + Send + Sync + 'static,
    {
        CenterSpec::Computed(Arc::new(f))
    }

    pub fn is_computed(&self) -> bool {
        matches!(self, CenterSpec::Computed(_))
    }

    /// Resolve to a logical position.
    pub fn resolve(&self, dims: Size) -> Point {
        match self {
            CenterSpec::Symbolic { x, y } => Point::new(
                common::units::resolve(x, dims, Axis::X),
                common::units::resolve(y, dims, Axis::Y),
            ),
            CenterSpec::Computed(f) => f(dims),
        }
    }
}

impl Default for CenterSpec {
    fn default() -> Self {
        CenterSpec::symbolic("50%", "50%")
    }
}

impl fmt::Debug for CenterSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CenterSpec::Symbolic { x, y } => f
                .debug_struct("Symbolic")
                .field("x", x)
                .field("y", y)
                .finish(),
            CenterSpec::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

impl PartialEq for CenterSpec {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (CenterSpec::Symbolic { x: x1, y: y1 }, CenterSpec::Symbolic { x: x2, y: y2 }) => {
                x1 == x2 && y1 == y2
            }
            (CenterSpec::Computed(a), CenterSpec::Computed(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

#[derive(Serialize, Deserialize)]
struct SymbolicCenter {
    x: Dimension,
    y: Dimension,
}

impl Serialize for CenterSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CenterSpec::Symbolic { x, y } => SymbolicCenter {
                x: x.clone(),
                y: y.clone(),
            }
            .serialize(serializer),
            CenterSpec::Computed(_) => Err(S::Error::custom("computed centers cannot be serialized")),
        }
    }
}

impl<'de> Deserialize<'de> for CenterSpec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let SymbolicCenter { x, y } = SymbolicCenter::deserialize(deserializer)?;
        Ok(CenterSpec::Symbolic { x, y })
    }
}

/// A complete blob record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Blob {
    pub id: String,
    /// Diameter, resolved against the larger viewport dimension.
    pub diameter: Dimension,
    #[serde(skip_serializing_if = "CenterSpec::is_computed")]
    pub center: CenterSpec,
    /// Painted in order; later layers cover earlier ones.
    pub layers: Vec<Layer>,
    pub opacity: f64,
    /// Parallax sensitivity.
    pub parallax: f64,
    pub drift: DriftSpec,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub breath: Option<BreathSpec>,
}

impl Default for Blob {
    fn default() -> Self {
        Self {
            id: String::new(),
            diameter: Dimension::expr("40vmax"),
            center: CenterSpec::default(),
            layers: Vec::new(),
            opacity: 1.0,
            parallax: 0.0,
            drift: DriftSpec::default(),
            breath: None,
        }
    }
}

impl Blob {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn with_diameter(mut self, diameter: impl Into<Dimension>) -> Self {
        self.diameter = diameter.into();
        self
    }

    pub fn with_center(mut self, center: CenterSpec) -> Self {
        self.center = center;
        self
    }

    pub fn with_layer(mut self, layer: Layer) -> Self {
        self.layers.push(layer);
        self
    }

    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.opacity = opacity;
        self
    }

    pub fn with_parallax(mut self, parallax: f64) -> Self {
        self.parallax = parallax;
        self
    }

    pub fn with_drift(mut self, drift: DriftSpec) -> Self {
        self.drift = drift;
        self
    }

    pub fn with_breath(mut self, breath: BreathSpec) -> Self {
        self.breath = Some(breath);
        self
    }
}

/// A partial blob record. Present fields replace the target's fields
/// wholesale; absent fields are left alone.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlobPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diameter: Option<Dimension>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub center: Option<CenterSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layers: Option<Vec<Layer>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parallax: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drift: Option<DriftSpec>,
    /// `Some(None)` removes the breath spec; JSON `null` maps to that.
    #[serde(deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub breath: Option<Option<BreathSpec>>,
}

fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl BlobPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_diameter(mut self, diameter: impl Into<Dimension>) -> Self {
        self.diameter = Some(diameter.into());
        self
    }

    pub fn with_center(mut self, center: CenterSpec) -> Self {
        self.center = Some(center);
        self
    }

    pub fn with_layers(mut self, layers: Vec<Layer>) -> Self {
        self.layers = Some(layers);
        self
    }

    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.opacity = Some(opacity);
        self
    }

    pub fn with_parallax(mut self, parallax: f64) -> Self {
        self.parallax = Some(parallax);
        self
    }

    pub fn with_drift(mut self, drift: DriftSpec) -> Self {
        self.drift = Some(drift);
        self
    }

    pub fn with_breath(mut self, breath: Option<BreathSpec>) -> Self {
        self.breath = Some(breath);
        self
    }

    /// Merge onto `blob`. The id is never touched.
    pub fn apply_to(&self, blob: &mut Blob) {
        if let Some(diameter) = &self.diameter {
            blob.diameter = diameter.clone();
        }
        if let Some(center) = &self.center {
            blob.center = center.clone();
        }
        if let Some(layers) = &self.layers {
            blob.layers = layers.clone();
        }
        if let Some(opacity) = self.opacity {
            blob.opacity = opacity;
        }
        if let Some(parallax) = self.parallax {
            blob.parallax = parallax;
        }
        if let Some(drift) = self.drift {
            blob.drift = drift;
        }
        if let Some(breath) = self.breath {
            blob.breath = breath;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blob_from_json() {
        let json = r##"{
            "id": "a",
            "diameter": "50vmax",
            "center": { "x": "20%", "y": 300 },
            "layers": [{ "color": "#ff8800", "alphaCenter": 0.9, "alphaMid": 0.4, "alphaEdge": 0.0 }],
            "drift": { "ax": 10, "speed": 0.1 },
            "breath": { "scale": [0.9, 1.1], "speed": 0.05 }
        }"##;
        let blob: Blob = serde_json::from_str(json).unwrap();
        assert_eq!(blob.id, "a");
        assert_eq!(blob.diameter, Dimension::expr("50vmax"));
        assert_eq!(blob.center, CenterSpec::symbolic("20%", 300.0));
        assert_eq!(blob.layers[0].color, Color::rgb(255, 136, 0));
        assert_eq!(blob.drift.ax, 10.0);
        assert_eq!(blob.drift.sy, 0.0);
        assert_eq!(blob.opacity, 1.0);

        let breath = blob.breath.unwrap();
        assert_eq!(breath.opacity, [1.0, 1.0]);
        assert_eq!(breath.scale, [0.9, 1.1]);
    }

    #[test]
    fn test_layer_defaults() {
        let layer: Layer = serde_json::from_str(r#"{ "color": [10, 20, 30] }"#).unwrap();
        assert_eq!(layer, Layer::solid(Color::rgb(10, 20, 30)));
    }

    #[test]
    fn test_computed_center_skipped_in_json() {
        let blob = Blob::new("corner").with_center(CenterSpec::computed(|d| Point::new(0.0, d.height)));
        let value = serde_json::to_value(&blob).unwrap();
        assert!(value.get("center").is_none());
        assert!(serde_json::to_value(&blob.center).is_err());
        assert_eq!(blob.center.resolve(Size::new(10.0, 20.0)), Point::new(0.0, 20.0));
    }

    #[test]
    fn test_center_spec_equality() {
        let a = CenterSpec::computed(|_| Point::ZERO);
        let b = a.clone();
        assert_eq!(a, b);
        assert_ne!(a, CenterSpec::computed(|_| Point::ZERO));
        assert_ne!(a, CenterSpec::default());
        assert_eq!(format!("{:?}", a), "Computed(..)");
    }

    #[test]
    fn test_patch_merges_shallowly() {
        let mut blob = Blob::new("a")
            .with_opacity(0.3)
            .with_layer(Layer::solid(Color::RED))
            .with_breath(BreathSpec::default());

        BlobPatch::new()
            .with_id("other")
            .with_opacity(0.8)
            .with_drift(DriftSpec::new(1.0, 2.0, 3.0, 4.0, 0.5))
            .apply_to(&mut blob);

        assert_eq!(blob.id, "a");
        assert_eq!(blob.opacity, 0.8);
        assert_eq!(blob.drift.sy, 4.0);
        assert_eq!(blob.layers.len(), 1);
        assert!(blob.breath.is_some());
    }

    #[test]
    fn test_patch_null_breath_clears() {
        let patch: BlobPatch = serde_json::from_str(r#"{ "breath": null }"#).unwrap();
        assert_eq!(patch.breath, Some(None));
        let empty: BlobPatch = serde_json::from_str("{}").unwrap();
        assert_eq!(empty.breath, None);

        let mut blob = Blob::new("a").with_breath(BreathSpec::default());
        patch.apply_to(&mut blob);
        assert!(blob.breath.is_none());
    }
}
