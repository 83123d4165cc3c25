//! Conversions between Rust field types and stored [`Value`]s.

use glam::{DMat4, Quat, Vec2, Vec3, Vec4};

use crate::core::Value;

/// A Rust type that can be stored in a single attribute.
pub trait AttrValue: Sized {
    /// Stored type name, reported in schema mismatches.
    const TYPE_NAME: &'static str;

    /// Stored form. `None` means "leave the attribute unauthored".
    fn to_value(&self) -> Option<Value>;

    /// Convert back, returning the value untouched on a type mismatch.
    fn from_value(value: Value) -> std::result::Result<Self, Value>;

    /// Field contents for a blocked attribute. `None` leaves the field as is.
    fn cleared() -> Option<Self> {
        None
    }
}

macro_rules! impl_attr_value {
    ($ty:ty, $variant:ident, $name:literal) => {
        impl AttrValue for $ty {
            const TYPE_NAME: &'static str = $name;

            fn to_value(&self) -> Option<Value> {
                Some(Value::$variant(self.clone()))
            }

            fn from_value(value: Value) -> std::result::Result<Self, Value> {
                match value {
                    Value::$variant(v) => Ok(v),
                    other => Err(other),
                }
            }
        }
    };
}

impl_attr_value!(bool, Bool, "bool");
impl_attr_value!(i32, Int, "int");
impl_attr_value!(i64, Int64, "int64");
impl_attr_value!(f32, Float, "float");
impl_attr_value!(f64, Double, "double");
impl_attr_value!(Vec2, Float2, "float2");
impl_attr_value!(Vec3, Float3, "float3");
impl_attr_value!(Vec4, Float4, "float4");
impl_attr_value!(Quat, Quat, "quatf");
impl_attr_value!(DMat4, Matrix4d, "matrix4d");
impl_attr_value!(Vec<bool>, BoolArray, "bool[]");
impl_attr_value!(Vec<i32>, IntArray, "int[]");
impl_attr_value!(Vec<f32>, FloatArray, "float[]");
impl_attr_value!(Vec<f64>, DoubleArray, "double[]");
impl_attr_value!(Vec<Vec2>, Float2Array, "float2[]");
impl_attr_value!(Vec<Vec3>, Float3Array, "float3[]");
impl_attr_value!(Vec<Vec4>, Float4Array, "float4[]");
impl_attr_value!(Vec<DMat4>, Matrix4dArray, "matrix4d[]");

// Strings accept tokens on read so hand-authored documents stay readable.
impl AttrValue for String {
    const TYPE_NAME: &'static str = "string";

    fn to_value(&self) -> Option<Value> {
        Some(Value::String(self.clone()))
    }

    fn from_value(value: Value) -> std::result::Result<Self, Value> {
        match value {
            Value::String(s) | Value::Token(s) => Ok(s),
            other => Err(other),
        }
    }
}

impl AttrValue for Vec<String> {
    const TYPE_NAME: &'static str = "string[]";

    fn to_value(&self) -> Option<Value> {
        Some(Value::StringArray(self.clone()))
    }

    fn from_value(value: Value) -> std::result::Result<Self, Value> {
        match value {
            Value::StringArray(v) | Value::TokenArray(v) => Ok(v),
            other => Err(other),
        }
    }
}

/// Optional fields: `None` is simply not authored.
impl<T: AttrValue> AttrValue for Option<T> {
    const TYPE_NAME: &'static str = T::TYPE_NAME;

    fn to_value(&self) -> Option<Value> {
        self.as_ref().and_then(T::to_value)
    }

    fn from_value(value: Value) -> std::result::Result<Self, Value> {
        T::from_value(value).map(Some)
    }

    fn cleared() -> Option<Self> {
        Some(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_conversion() {
        assert_eq!(7i32.to_value(), Some(Value::Int(7)));
        assert_eq!(i32::from_value(Value::Int(7)), Ok(7));
        assert_eq!(i32::from_value(Value::Float(1.0)), Err(Value::Float(1.0)));
    }

    #[test]
    fn test_string_accepts_token() {
        assert_eq!(String::from_value(Value::Token("Y".into())), Ok("Y".to_string()));
        assert_eq!(
            Vec::<String>::from_value(Value::TokenArray(vec!["a".into()])),
            Ok(vec!["a".to_string()])
        );
    }

    #[test]
    fn test_option() {
        let none: Option<f32> = None;
        assert_eq!(none.to_value(), None);
        assert_eq!(Some(2.0f32).to_value(), Some(Value::Float(2.0)));
        assert_eq!(Option::<f32>::from_value(Value::Float(2.0)), Ok(Some(2.0)));
        assert_eq!(<Option<f32> as AttrValue>::TYPE_NAME, "float");
        assert_eq!(Option::<f32>::cleared(), Some(None));
        assert_eq!(f32::cleared(), None);
    }

    #[test]
    fn test_array_type_names_match_values() {
        let pts = vec![Vec3::ONE];
        let value = pts.to_value().unwrap();
        assert_eq!(value.type_name(), <Vec<Vec3> as AttrValue>::TYPE_NAME);
    }
}
