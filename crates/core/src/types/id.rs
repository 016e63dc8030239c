//! Newtype IDs for type-safe entity references.
//!
//! The marketplace backend hands out identifiers as either JSON strings or
//! JSON numbers depending on the endpoint. Every ID type here is a string
//! internally, and deserialization accepts both shapes so numeric IDs are
//! coerced to their decimal string form.
//!
//! Use the `define_id!` macro to create wrappers that prevent accidentally
//! mixing IDs from different entity types.

use serde::Deserialize;

/// Wire shape of an identifier before coercion to a string.
#[doc(hidden)]
#[derive(Deserialize)]
#[serde(untagged)]
pub enum RawId {
    Text(String),
    Signed(i64),
    Unsigned(u64),
}

impl RawId {
    /// Coerce to the canonical string form, trimming surrounding whitespace.
    #[doc(hidden)]
    #[must_use]
    pub fn into_key(self) -> String {
        match self {
            Self::Text(s) => s.trim().to_owned(),
            Self::Signed(n) => n.to_string(),
            Self::Unsigned(n) => n.to_string(),
        }
    }
}

/// Macro to define a type-safe string ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize` as a plain JSON string
/// - `Deserialize` from a JSON string or integer
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - `parse()` which rejects empty/blank input, `as_str()`
/// - `Display`, `AsRef<str>`, `From<u64>`
///
/// # Example
///
/// ```rust
/// # use suturahub_core::define_id;
/// define_id!(ProductId);
/// define_id!(OrderId);
///
/// let product_id = ProductId::parse("p1").unwrap();
/// let order_id = OrderId::from(7);
///
/// assert_eq!(product_id.as_str(), "p1");
/// assert_eq!(order_id.as_str(), "7");
/// assert!(ProductId::parse("   ").is_none());
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, ::serde::Serialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Parse an ID from a string, returning `None` if it is blank.
            #[must_use]
            pub fn parse(raw: &str) -> Option<Self> {
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(Self(trimmed.to_owned()))
                }
            }

            /// Get the ID as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the ID and return the inner string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id.to_string())
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = $crate::types::id::EmptyIdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s).ok_or($crate::types::id::EmptyIdError)
            }
        }

        impl<'de> ::serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: ::serde::Deserializer<'de>,
            {
                let key = <$crate::types::id::RawId as ::serde::Deserialize>::deserialize(
                    deserializer,
                )?
                .into_key();
                if key.is_empty() {
                    return Err(<D::Error as ::serde::de::Error>::custom(
                        "identifier cannot be empty",
                    ));
                }
                Ok(Self(key))
            }
        }
    };
}

/// Returned when parsing a blank identifier.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("identifier cannot be empty")]
pub struct EmptyIdError;

// Define standard entity IDs
define_id!(ProductId);
define_id!(UserId);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trims_whitespace() {
        let id = ProductId::parse("  p1 ").unwrap();
        assert_eq!(id.as_str(), "p1");
    }

    #[test]
    fn test_parse_rejects_blank() {
        assert!(ProductId::parse("").is_none());
        assert!(ProductId::parse("  \t").is_none());
        assert_eq!("".parse::<UserId>(), Err(EmptyIdError));
    }

    #[test]
    fn test_deserialize_string_and_number() {
        let from_text: ProductId = serde_json::from_str("\"abc-42\"").unwrap();
        assert_eq!(from_text.as_str(), "abc-42");

        let from_number: ProductId = serde_json::from_str("42").unwrap();
        assert_eq!(from_number.as_str(), "42");

        let negative: UserId = serde_json::from_str("-3").unwrap();
        assert_eq!(negative.as_str(), "-3");
    }

    #[test]
    fn test_deserialize_rejects_empty_string() {
        assert!(serde_json::from_str::<ProductId>("\"\"").is_err());
        assert!(serde_json::from_str::<ProductId>("null").is_err());
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let id = ProductId::from(7);
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"7\"");
    }
}
