//! Newtype IDs for type-safe entity references.
//!
//! The commerce backend identifies every entity with an integer key. Use the
//! `define_id!` macro to wrap those keys so a product ID can never be passed
//! where a user ID is expected.

/// Error returned when an ID cannot be parsed from text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind}: {input:?}")]
pub struct ParseIdError {
    /// The ID type that failed to parse.
    pub kind: &'static str,
    /// The rejected input.
    pub input: String,
}

/// Macro to define a type-safe ID wrapper.
///
/// Creates a newtype wrapper around `i64` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `Copy`, `PartialEq`, `Eq`, `Hash`, `Ord`
/// - `new()`, `as_i64()`, `Display` and `FromStr`
///
/// # Example
///
/// ```rust
/// # use styleaura_core::define_id;
/// define_id!(ProductId);
/// define_id!(ReviewId);
///
/// let product_id: ProductId = "42".parse().unwrap();
/// assert_eq!(product_id.as_i64(), 42);
///
/// // These are different types, so this won't compile:
/// // let _: ReviewId = product_id;
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Create a new ID from an i64 value.
            #[must_use]
            pub const fn new(id: i64) -> Self {
                Self(id)
            }

            /// Get the underlying i64 value.
            #[must_use]
            pub const fn as_i64(&self) -> i64 {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = $crate::ParseIdError;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                s.trim()
                    .parse::<i64>()
                    .map(Self)
                    .map_err(|_| $crate::ParseIdError {
                        kind: stringify!($name),
                        input: s.to_owned(),
                    })
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id!(ProductId);
define_id!(UserId);
define_id!(ReviewId);
define_id!(CategoryId);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trims_whitespace() {
        let id: ProductId = " 17 ".parse().unwrap();
        assert_eq!(id, ProductId::new(17));
    }

    #[test]
    fn test_parse_rejects_non_numeric() {
        let err = "undefined".parse::<ProductId>().unwrap_err();
        assert_eq!(err.kind, "ProductId");
        assert_eq!(err.to_string(), "invalid ProductId: \"undefined\"");
    }

    #[test]
    fn test_serde_transparent() {
        let id: UserId = serde_json::from_str("7").unwrap();
        assert_eq!(id.as_i64(), 7);
        assert_eq!(serde_json::to_string(&id).unwrap(), "7");
    }
}
