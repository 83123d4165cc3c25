//! Typed attribute payloads.
//!
//! [`Value`] is the closed set of data the store can hold. Every variant has
//! a stable type name used in the persisted document and in schema mismatch
//! reports.

use glam::{DMat4, Quat, Vec2, Vec3, Vec4};
use serde::{Deserialize, Serialize};

/// A single attribute value (scalar or array).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum Value {
    Bool(bool),
    Int(i32),
    Int64(i64),
    Float(f32),
    Double(f64),
    String(String),
    /// Interned identifier (enum names, interpolation tokens).
    Token(String),
    Float2(Vec2),
    Float3(Vec3),
    Float4(Vec4),
    Quat(Quat),
    Matrix4d(DMat4),
    BoolArray(Vec<bool>),
    IntArray(Vec<i32>),
    FloatArray(Vec<f32>),
    DoubleArray(Vec<f64>),
    StringArray(Vec<String>),
    TokenArray(Vec<String>),
    Float2Array(Vec<Vec2>),
    Float3Array(Vec<Vec3>),
    Float4Array(Vec<Vec4>),
    Matrix4dArray(Vec<DMat4>),
}

impl Value {
    /// Stable type name, matching the scene document.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Int64(_) => "int64",
            Self::Float(_) => "float",
            Self::Double(_) => "double",
            Self::String(_) => "string",
            Self::Token(_) => "token",
            Self::Float2(_) => "float2",
            Self::Float3(_) => "float3",
            Self::Float4(_) => "float4",
            Self::Quat(_) => "quatf",
            Self::Matrix4d(_) => "matrix4d",
            Self::BoolArray(_) => "bool[]",
            Self::IntArray(_) => "int[]",
            Self::FloatArray(_) => "float[]",
            Self::DoubleArray(_) => "double[]",
            Self::StringArray(_) => "string[]",
            Self::TokenArray(_) => "token[]",
            Self::Float2Array(_) => "float2[]",
            Self::Float3Array(_) => "float3[]",
            Self::Float4Array(_) => "float4[]",
            Self::Matrix4dArray(_) => "matrix4d[]",
        }
    }

    /// Check if this is an array variant.
    #[inline]
    pub fn is_array(&self) -> bool {
        self.len().is_some()
    }

    /// Number of elements for arrays, `None` for scalars.
    pub fn len(&self) -> Option<usize> {
        match self {
            Self::BoolArray(v) => Some(v.len()),
            Self::IntArray(v) => Some(v.len()),
            Self::FloatArray(v) => Some(v.len()),
            Self::DoubleArray(v) => Some(v.len()),
            Self::StringArray(v) => Some(v.len()),
            Self::TokenArray(v) => Some(v.len()),
            Self::Float2Array(v) => Some(v.len()),
            Self::Float3Array(v) => Some(v.len()),
            Self::Float4Array(v) => Some(v.len()),
            Self::Matrix4dArray(v) => Some(v.len()),
            _ => None,
        }
    }

    /// Text of a `String` or `Token` value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) | Self::Token(s) => Some(s),
            _ => None,
        }
    }

    /// Check that every floating point component is finite.
    ///
    /// The scene document is JSON, which has no encoding for NaN or
    /// infinity.
    pub fn is_finite(&self) -> bool {
        match self {
            Self::Float(v) => v.is_finite(),
            Self::Double(v) => v.is_finite(),
            Self::Float2(v) => v.is_finite(),
            Self::Float3(v) => v.is_finite(),
            Self::Float4(v) => v.is_finite(),
            Self::Quat(v) => v.is_finite(),
            Self::Matrix4d(v) => v.is_finite(),
            Self::FloatArray(v) => v.iter().all(|x| x.is_finite()),
            Self::DoubleArray(v) => v.iter().all(|x| x.is_finite()),
            Self::Float2Array(v) => v.iter().all(|x| x.is_finite()),
            Self::Float3Array(v) => v.iter().all(|x| x.is_finite()),
            Self::Float4Array(v) => v.iter().all(|x| x.is_finite()),
            Self::Matrix4dArray(v) => v.iter().all(|x| x.is_finite()),
            _ => true,
        }
    }

    /// Linear blend towards `other` by `alpha` in `[0, 1]`.
    ///
    /// Only floating point scalars, vectors, quaternions and equally sized
    /// float arrays interpolate. Everything else returns `None` so the
    /// caller can hold the earlier value.
    pub fn lerp(&self, other: &Value, alpha: f64) -> Option<Value> {
        let a32 = alpha as f32;
        let v = match (self, other) {
            (Self::Float(a), Self::Float(b)) => Self::Float(a + (b - a) * a32),
            (Self::Double(a), Self::Double(b)) => Self::Double(a + (b - a) * alpha),
            (Self::Float2(a), Self::Float2(b)) => Self::Float2(a.lerp(*b, a32)),
            (Self::Float3(a), Self::Float3(b)) => Self::Float3(a.lerp(*b, a32)),
            (Self::Float4(a), Self::Float4(b)) => Self::Float4(a.lerp(*b, a32)),
            (Self::Quat(a), Self::Quat(b)) => Self::Quat(a.slerp(*b, a32)),
            (Self::FloatArray(a), Self::FloatArray(b)) if a.len() == b.len() => Self::FloatArray(
                a.iter().zip(b).map(|(x, y)| x + (y - x) * a32).collect(),
            ),
            (Self::DoubleArray(a), Self::DoubleArray(b)) if a.len() == b.len() => Self::DoubleArray(
                a.iter().zip(b).map(|(x, y)| x + (y - x) * alpha).collect(),
            ),
            (Self::Float2Array(a), Self::Float2Array(b)) if a.len() == b.len() => Self::Float2Array(
                a.iter().zip(b).map(|(x, y)| x.lerp(*y, a32)).collect(),
            ),
            (Self::Float3Array(a), Self::Float3Array(b)) if a.len() == b.len() => Self::Float3Array(
                a.iter().zip(b).map(|(x, y)| x.lerp(*y, a32)).collect(),
            ),
            (Self::Float4Array(a), Self::Float4Array(b)) if a.len() == b.len() => Self::Float4Array(
                a.iter().zip(b).map(|(x, y)| x.lerp(*y, a32)).collect(),
            ),
            _ => return None,
        };
        Some(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_names() {
        assert_eq!(Value::Float3(Vec3::ZERO).type_name(), "float3");
        assert_eq!(Value::Float2Array(vec![]).type_name(), "float2[]");
        assert_eq!(Value::Token("x".into()).type_name(), "token");
    }

    #[test]
    fn test_len() {
        assert_eq!(Value::Int(3).len(), None);
        assert_eq!(Value::IntArray(vec![1, 2, 3]).len(), Some(3));
        assert!(Value::StringArray(vec![]).is_array());
        assert!(!Value::Double(1.0).is_array());
    }

    #[test]
    fn test_is_finite() {
        assert!(Value::Float(1.0).is_finite());
        assert!(!Value::Float(f32::NAN).is_finite());
        assert!(!Value::Double(f64::INFINITY).is_finite());
        assert!(!Value::Float3Array(vec![Vec3::ONE, Vec3::new(0.0, f32::NAN, 0.0)]).is_finite());
        assert!(Value::String("nan".into()).is_finite());
    }

    #[test]
    fn test_lerp() {
        let a = Value::Double(0.0);
        let b = Value::Double(10.0);
        assert_eq!(a.lerp(&b, 0.25), Some(Value::Double(2.5)));

        let a = Value::FloatArray(vec![0.0, 1.0]);
        let b = Value::FloatArray(vec![2.0, 3.0]);
        assert_eq!(a.lerp(&b, 0.5), Some(Value::FloatArray(vec![1.0, 2.0])));

        // Mismatched lengths and non-numeric values hold instead.
        let c = Value::FloatArray(vec![1.0]);
        assert_eq!(a.lerp(&c, 0.5), None);
        assert_eq!(Value::Int(1).lerp(&Value::Int(3), 0.5), None);
    }

    #[test]
    fn test_json_shape() {
        let json = serde_json::to_string(&Value::Int(7)).unwrap();
        assert_eq!(json, r#"{"type":"Int","value":7}"#);
        let back: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Value::Int(7));
    }
}
