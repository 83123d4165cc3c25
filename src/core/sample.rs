//! Time codes and per-attribute sampling descriptors.

use serde::{Deserialize, Serialize};

/// Time at which attribute values are read or written.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum TimeCode {
    /// The time-independent default value.
    #[default]
    Default,
    /// A numeric sample time.
    At(f64),
}

impl TimeCode {
    /// Create a time code for a numeric time.
    pub const fn at(t: f64) -> Self {
        Self::At(t)
    }

    /// Check if this is the default time code.
    #[inline]
    pub fn is_default(&self) -> bool {
        matches!(self, Self::Default)
    }

    /// Numeric time, if any.
    #[inline]
    pub fn value(&self) -> Option<f64> {
        match self {
            Self::Default => None,
            Self::At(t) => Some(*t),
        }
    }
}

impl From<f64> for TimeCode {
    fn from(t: f64) -> Self {
        Self::At(t)
    }
}

impl From<Option<f64>> for TimeCode {
    fn from(t: Option<f64>) -> Self {
        t.map_or(Self::Default, Self::At)
    }
}

/// Whether an attribute may change over time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Variability {
    /// Value may be time-sampled.
    #[default]
    Varying,
    /// Value is constant; always stored as the default.
    Uniform,
}

/// How primvar elements map onto consumer-side elements.
///
/// Persisted as the token from its [`TokenEnum`](crate::schema::TokenEnum)
/// table.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Interpolation {
    /// One group of elements for the entire prim.
    #[default]
    Constant,
    /// One group per face.
    Uniform,
    /// One group per vertex, linearly interpolated.
    Varying,
    /// One group per vertex, interpolated by the surface basis.
    Vertex,
    /// One group per face-vertex.
    FaceVarying,
}

impl Interpolation {
    /// Check if a single group applies to every element.
    #[inline]
    pub fn is_constant(&self) -> bool {
        matches!(self, Self::Constant)
    }
}

/// How values between two time samples are resolved.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum InterpolationMode {
    /// Hold the earlier sample until the next one.
    #[default]
    Held,
    /// Blend the bracketing samples where the value type allows it.
    Linear,
}
