//! Enumerations stored as tokens.
//!
//! Each enum carries an explicit name table; the stored token is the table
//! entry, never a derived string.

use crate::core::Interpolation;

/// An enum persisted as a token through a fixed name table.
pub trait TokenEnum: Sized + Copy + PartialEq + 'static {
    /// Every variant with its stored token.
    const TOKENS: &'static [(Self, &'static str)];

    /// Stored token for this variant.
    fn token(self) -> &'static str {
        Self::TOKENS
            .iter()
            .find(|(v, _)| *v == self)
            .map(|(_, t)| *t)
            .unwrap_or("")
    }

    /// Variant for a stored token.
    fn from_token(token: &str) -> Option<Self> {
        Self::TOKENS
            .iter()
            .find(|(_, t)| *t == token)
            .map(|(v, _)| *v)
    }

    /// Allowed tokens, for diagnostics.
    fn allowed() -> String {
        let names: Vec<&str> = Self::TOKENS.iter().map(|(_, t)| *t).collect();
        format!("token in [{}]", names.join(", "))
    }
}

/// Prim visibility.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Visibility {
    #[default]
    Inherited,
    Invisible,
}

impl TokenEnum for Visibility {
    const TOKENS: &'static [(Self, &'static str)] =
        &[(Self::Inherited, "inherited"), (Self::Invisible, "invisible")];
}

/// Render purpose of a prim.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Purpose {
    #[default]
    Default,
    Render,
    Proxy,
    Guide,
}

impl TokenEnum for Purpose {
    const TOKENS: &'static [(Self, &'static str)] = &[
        (Self::Default, "default"),
        (Self::Render, "render"),
        (Self::Proxy, "proxy"),
        (Self::Guide, "guide"),
    ];
}

/// Winding order of faces.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Orientation {
    #[default]
    RightHanded,
    LeftHanded,
}

impl TokenEnum for Orientation {
    const TOKENS: &'static [(Self, &'static str)] = &[
        (Self::RightHanded, "rightHanded"),
        (Self::LeftHanded, "leftHanded"),
    ];
}

/// Subdivision scheme of a mesh.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SubdivScheme {
    #[default]
    CatmullClark,
    Loop,
    Bilinear,
    None,
}

impl TokenEnum for SubdivScheme {
    const TOKENS: &'static [(Self, &'static str)] = &[
        (Self::CatmullClark, "catmullClark"),
        (Self::Loop, "loop"),
        (Self::Bilinear, "bilinear"),
        (Self::None, "none"),
    ];
}

/// Up axis of a scene.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum UpAxis {
    Y,
    #[default]
    Z,
}

impl TokenEnum for UpAxis {
    const TOKENS: &'static [(Self, &'static str)] = &[(Self::Y, "Y"), (Self::Z, "Z")];
}

impl TokenEnum for Interpolation {
    const TOKENS: &'static [(Self, &'static str)] = &[
        (Self::Constant, "constant"),
        (Self::Uniform, "uniform"),
        (Self::Varying, "varying"),
        (Self::Vertex, "vertex"),
        (Self::FaceVarying, "faceVarying"),
    ];
}

impl From<Interpolation> for String {
    fn from(interpolation: Interpolation) -> Self {
        interpolation.token().to_string()
    }
}

impl TryFrom<String> for Interpolation {
    type Error = String;

    fn try_from(token: String) -> std::result::Result<Self, String> {
        Self::from_token(&token).ok_or_else(|| format!("unknown interpolation '{}'", token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tables_are_bijective() {
        fn check<E: TokenEnum + std::fmt::Debug>() {
            for (variant, token) in E::TOKENS {
                assert_eq!(variant.token(), *token);
                assert_eq!(E::from_token(token), Some(*variant));
            }
        }
        check::<Visibility>();
        check::<Purpose>();
        check::<Orientation>();
        check::<SubdivScheme>();
        check::<UpAxis>();
        check::<Interpolation>();
    }

    #[test]
    fn test_interpolation_tokens() {
        assert_eq!(Interpolation::FaceVarying.token(), "faceVarying");
        assert_eq!(Interpolation::from_token("vertex"), Some(Interpolation::Vertex));
        assert_eq!(Interpolation::from_token("fvr"), None);

        let json = serde_json::to_string(&Interpolation::FaceVarying).unwrap();
        assert_eq!(json, r#""faceVarying""#);
        assert!(serde_json::from_str::<Interpolation>(r#""fvr""#).is_err());
    }

    #[test]
    fn test_unknown_token() {
        assert_eq!(Purpose::from_token("Render"), None);
        assert!(Orientation::allowed().contains("leftHanded"));
    }
}
