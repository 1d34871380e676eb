//! Newtype IDs for type-safe entity references.
//!
//! The backend uses two id shapes: small integers for the Ghana location
//! directory (regions and cities) and opaque strings for everything it stores
//! (addresses, zones, products). `define_id!` wraps the former and
//! `define_key!` the latter, so a `CityId` can never be passed where a
//! `RegionId` is expected.

/// Macro to define a type-safe integer ID wrapper.
///
/// Creates a newtype wrapper around `i32` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `Copy`, `PartialEq`, `Eq`, `Hash`, `Ord`
/// - Conversion methods: `new()`, `as_i32()`
/// - `From<i32>` and `Into<i32>` implementations
///
/// # Example
///
/// ```rust
/// # use threadline_core::define_id;
/// define_id!(RegionId);
/// define_id!(CityId);
///
/// let region = RegionId::new(1);
/// let city = CityId::new(1);
///
/// // These are different types, so this won't compile:
/// // let _: RegionId = city;
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
            PartialOrd,
            Ord,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(i32);

        impl $name {
            /// Create a new ID from an i32 value.
            #[must_use]
            pub const fn new(id: i32) -> Self {
                Self(id)
            }

            /// Get the underlying i32 value.
            #[must_use]
            pub const fn as_i32(&self) -> i32 {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = ::core::num::ParseIntError;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                s.trim().parse::<i32>().map(Self)
            }
        }

        impl From<i32> for $name {
            fn from(id: i32) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i32 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

/// Macro to define a type-safe string key wrapper for backend-assigned ids.
///
/// Creates a newtype wrapper around `String` with `#[serde(transparent)]`,
/// `Display`, `AsRef<str>`, and `From<&str>`/`From<String>`.
#[macro_export]
macro_rules! define_key {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            ::serde::Serialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        // The backend sends some keys as JSON numbers.
        impl<'de> ::serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: ::serde::Deserializer<'de>,
            {
                #[derive(::serde::Deserialize)]
                #[serde(untagged)]
                enum Raw {
                    Text(String),
                    Number(i64),
                }

                Ok(match Raw::deserialize(deserializer)? {
                    Raw::Text(text) => Self(text),
                    Raw::Number(number) => Self(number.to_string()),
                })
            }
        }

        impl $name {
            /// Create a new key.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the key as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
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

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

// Ghana location directory
define_id!(RegionId);
define_id!(CityId);

// Backend-assigned keys
define_key!(AddressId);
define_key!(ZoneId);
define_key!(PickupLocationId);
define_key!(ProductId);
define_key!(VariantId);
define_key!(BrandId);
define_key!(CategoryId);

impl AddressId {
    /// Literal id of an address held only in the shopper's session.
    pub const TEMP: &'static str = "temp";

    /// The id used for the unsaved, session-only address.
    #[must_use]
    pub fn temp() -> Self {
        Self::new(Self::TEMP)
    }

    /// Whether this id refers to the session-only address.
    #[must_use]
    pub fn is_temp(&self) -> bool {
        self.0 == Self::TEMP
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_id_serde_is_transparent() {
        let json = serde_json::to_string(&RegionId::new(4)).unwrap();
        assert_eq!(json, "4");
        let parsed: CityId = serde_json::from_str("17").unwrap();
        assert_eq!(parsed.as_i32(), 17);
    }

    #[test]
    fn test_integer_id_from_str_trims() {
        let id: RegionId = " 12 ".parse().unwrap();
        assert_eq!(id, RegionId::new(12));
        assert!("twelve".parse::<RegionId>().is_err());
    }

    #[test]
    fn test_key_serde_is_transparent() {
        let zone = ZoneId::new("z1");
        assert_eq!(serde_json::to_string(&zone).unwrap(), "\"z1\"");
        assert_eq!(zone.to_string(), "z1");
    }

    #[test]
    fn test_key_accepts_numeric_json() {
        let id: ProductId = serde_json::from_str("42").unwrap();
        assert_eq!(id.as_str(), "42");
        let id: AddressId = serde_json::from_str("\"a-7\"").unwrap();
        assert_eq!(id, AddressId::new("a-7"));
        assert!(serde_json::from_str::<ZoneId>("true").is_err());
    }

    #[test]
    fn test_temp_address_id() {
        assert!(AddressId::temp().is_temp());
        assert!(!AddressId::new("a-91").is_temp());
    }
}
