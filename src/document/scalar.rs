//! Coercion between scalar text and Rust types.
//!
//! Scalars are stored as text and converted on read. A conversion that does
//! not fit the requested type yields the type's default value instead of an
//! error, so `"true"` read as an `i32` is `0`.

use super::node::Node;
use crate::env::{EnvLookup, expand};
use std::path::PathBuf;

/// Types that can be parsed out of an (already expanded) scalar.
pub trait FromScalar: Sized + Default {
    fn from_scalar(text: &str) -> Option<Self>;
}

/// Types that can be written into a scalar node.
pub trait ToScalar {
    fn to_scalar(&self) -> String;
}

/// Types that can be decoded from a whole node, such as sequence elements.
pub trait FromNode: Sized {
    fn from_node(node: &Node, env: &dyn EnvLookup) -> Self;
}

impl FromScalar for String {
    fn from_scalar(text: &str) -> Option<Self> {
        Some(text.to_string())
    }
}

impl FromScalar for PathBuf {
    fn from_scalar(text: &str) -> Option<Self> {
        Some(PathBuf::from(text))
    }
}

impl FromScalar for bool {
    fn from_scalar(text: &str) -> Option<Self> {
        match text {
            "true" | "True" | "TRUE" => Some(true),
            "false" | "False" | "FALSE" => Some(false),
            _ => None,
        }
    }
}

macro_rules! parsed_scalar {
    ($($ty:ty),* $(,)?) => {
        $(
            impl FromScalar for $ty {
                fn from_scalar(text: &str) -> Option<Self> {
                    text.parse().ok()
                }
            }

            impl ToScalar for $ty {
                fn to_scalar(&self) -> String {
                    self.to_string()
                }
            }
        )*
    };
}

parsed_scalar!(
    i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64
);

impl ToScalar for bool {
    fn to_scalar(&self) -> String {
        self.to_string()
    }
}

impl ToScalar for String {
    fn to_scalar(&self) -> String {
        self.clone()
    }
}

impl ToScalar for str {
    fn to_scalar(&self) -> String {
        self.to_string()
    }
}

impl ToScalar for PathBuf {
    fn to_scalar(&self) -> String {
        self.to_string_lossy().into_owned()
    }
}

impl<T: ToScalar + ?Sized> ToScalar for &T {
    fn to_scalar(&self) -> String {
        (**self).to_scalar()
    }
}

/// Read `node` as a `T`.
///
/// Missing nodes, nulls and non-scalar nodes give `default`; a scalar that
/// does not coerce gives `T::default()`.
pub fn coerce<T: FromScalar>(node: Option<&Node>, env: &dyn EnvLookup, default: T) -> T {
    match node {
        Some(Node::Scalar(text)) => T::from_scalar(&expand(text, env)).unwrap_or_default(),
        _ => default,
    }
}

macro_rules! scalar_from_node {
    ($($ty:ty),* $(,)?) => {
        $(
            impl FromNode for $ty {
                fn from_node(node: &Node, env: &dyn EnvLookup) -> Self {
                    coerce(Some(node), env, <$ty>::default())
                }
            }
        )*
    };
}

scalar_from_node!(
    String, PathBuf, bool, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32,
    f64
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::MapEnv;

    fn scalar(s: &str) -> Node {
        Node::Scalar(s.to_string())
    }

    #[test]
    fn test_bool_tokens() {
        assert_eq!(bool::from_scalar("true"), Some(true));
        assert_eq!(bool::from_scalar("false"), Some(false));
        assert_eq!(bool::from_scalar("yes"), None);
        assert_eq!(bool::from_scalar("1"), None);
    }

    #[test]
    fn test_integer_parsing_is_strict() {
        assert_eq!(i32::from_scalar("12"), Some(12));
        assert_eq!(i32::from_scalar("-7"), Some(-7));
        assert_eq!(i32::from_scalar("true"), None);
        assert_eq!(u8::from_scalar("256"), None);
        assert_eq!(i32::from_scalar(" 12"), None);
    }

    #[test]
    fn test_coerce_mismatch_gives_zero_value() {
        let env = MapEnv::new();
        let node = scalar("true");
        assert_eq!(coerce(Some(&node), &env, -1i32), 0);
        assert!(coerce(Some(&node), &env, false));
        assert_eq!(coerce(Some(&node), &env, String::new()), "true");
    }

    #[test]
    fn test_coerce_missing_or_structured_gives_default() {
        let env = MapEnv::new();
        assert_eq!(coerce(None, &env, 42i64), 42);
        assert_eq!(coerce(Some(&Node::Null), &env, 42i64), 42);
        assert_eq!(coerce(Some(&Node::Sequence(vec![])), &env, 42i64), 42);
    }

    #[test]
    fn test_coerce_expands_before_parsing() {
        let env = MapEnv::new().with("PORT", "8080").with("FLAG", "true");
        assert_eq!(coerce(Some(&scalar("${PORT}")), &env, 0u16), 8080);
        assert!(coerce(Some(&scalar("${FLAG}")), &env, false));
        assert_eq!(coerce(Some(&scalar("${FLAG}")), &env, 5i32), 0);
    }

    #[test]
    fn test_to_scalar() {
        assert_eq!(false.to_scalar(), "false");
        assert_eq!(12u32.to_scalar(), "12");
        assert_eq!("abc".to_scalar(), "abc");
        assert_eq!(PathBuf::from("/etc/x.yaml").to_scalar(), "/etc/x.yaml");
    }
}
