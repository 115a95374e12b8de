//! Symbolic length values and their resolution against a viewport.
//!
//! A [`Dimension`] is either a raw pixel number or a `<number><unit>` string
//! with a unit from [`Unit`]. Resolution never fails: anything that does not
//! parse resolves to `0.0`, so a bad value collapses one shape instead of
//! aborting a frame.

use crate::geometry::Size;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The axis a value is resolved along. Only `%` cares about it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    /// Sizes measured against the larger viewport dimension.
    Max,
}

/// Length units accepted in symbolic expressions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Unit {
    Px,
    Percent,
    Vw,
    Vh,
    Vmax,
}

impl Unit {
    /// Suffixes in match order; `vmax` must be tried before shorter ones.
    const SUFFIXES: [(&'static str, Unit); 5] = [
        ("vmax", Unit::Vmax),
        ("px", Unit::Px),
        ("vw", Unit::Vw),
        ("vh", Unit::Vh),
        ("%", Unit::Percent),
    ];

    pub fn suffix(self) -> &'static str {
        match self {
            Unit::Px => "px",
            Unit::Percent => "%",
            Unit::Vw => "vw",
            Unit::Vh => "vh",
            Unit::Vmax => "vmax",
        }
    }
}

/// A parsed `<number><unit>` pair.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UnitValue {
    pub value: f64,
    pub unit: Unit,
}

impl UnitValue {
    pub const ZERO: UnitValue = UnitValue { value: 0.0, unit: Unit::Px };

    pub const fn new(value: f64, unit: Unit) -> Self {
        Self { value, unit }
    }

    /// Parse an expression such as `"50%"`, `"-12.5vw"` or `"1e2px"`.
    pub fn parse(input: &str) -> Option<Self> {
        let s = input.trim();
        let (number, unit) = Unit::SUFFIXES
            .iter()
            .find_map(|(suffix, unit)| s.strip_suffix(suffix).map(|n| (n, *unit)))?;
        let value: f64 = number.trim_end().parse().ok()?;
        value.is_finite().then_some(Self { value, unit })
    }

    /// Convert to pixels for the given viewport and axis.
    pub fn to_px(&self, dims: Size, axis: Axis) -> f64 {
        let px = match self.unit {
            Unit::Px => self.value,
            Unit::Percent => {
                let basis = match axis {
                    Axis::Y => dims.height,
                    Axis::X | Axis::Max => dims.width,
                };
                self.value * basis / 100.0
            }
            Unit::Vw => self.value * dims.width / 100.0,
            Unit::Vh => self.value * dims.height / 100.0,
            Unit::Vmax => self.value * dims.max_dimension() / 100.0,
        };
        if px.is_finite() {
            px
        } else {
            0.0
        }
    }
}

impl fmt::Display for UnitValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.value, self.unit.suffix())
    }
}

/// A symbolic scalar: pixels as a number, or a unit expression.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Dimension {
    Px(f64),
    Expr(String),
}

impl Default for Dimension {
    fn default() -> Self {
        Dimension::Px(0.0)
    }
}

impl Dimension {
    pub fn px(value: f64) -> Self {
        Dimension::Px(value)
    }

    pub fn expr(value: impl Into<String>) -> Self {
        Dimension::Expr(value.into())
    }

    /// Parse once into a form that is cheap to resolve every frame.
    pub fn compile(&self) -> Resolved {
        match self {
            Dimension::Px(v) => Resolved::Px(*v),
            Dimension::Expr(s) => match UnitValue::parse(s) {
                Some(uv) => Resolved::Unit(uv),
                None => {
                    tracing::debug!(expr = %s, "unparsable dimension, resolving to 0");
                    Resolved::Px(0.0)
                }
            },
        }
    }
}

impl From<f64> for Dimension {
    fn from(value: f64) -> Self {
        Dimension::Px(value)
    }
}

impl From<&str> for Dimension {
    fn from(value: &str) -> Self {
        Dimension::Expr(value.to_string())
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dimension::Px(v) => write!(f, "{}", v),
            Dimension::Expr(s) => write!(f, "{}", s),
        }
    }
}

/// A pre-parsed [`Dimension`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Resolved {
    Px(f64),
    Unit(UnitValue),
}

impl Default for Resolved {
    fn default() -> Self {
        Resolved::Px(0.0)
    }
}

impl Resolved {
    pub fn to_px(&self, dims: Size, axis: Axis) -> f64 {
        match self {
            Resolved::Px(v) => *v,
            Resolved::Unit(uv) => uv.to_px(dims, axis),
        }
    }
}

/// Resolve a symbolic scalar to pixels. Numbers pass through unchanged.
pub fn resolve(value: &Dimension, dims: Size, axis: Axis) -> f64 {
    match value {
        Dimension::Px(v) => *v,
        Dimension::Expr(s) => UnitValue::parse(s).map_or(0.0, |uv| uv.to_px(dims, axis)),
    }
}
