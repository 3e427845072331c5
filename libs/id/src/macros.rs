//! Macro for ULID-backed identifier types.

/// Splits `{prefix}_{rest}` and checks the prefix.
///
/// Shared by every prefixed ID so they all report the same errors.
pub(crate) fn split_prefixed<'a>(
    s: &'a str,
    expected: &'static str,
) -> Result<&'a str, crate::IdError> {
    if s.is_empty() {
        return Err(crate::IdError::Empty);
    }

    let Some((prefix, rest)) = s.split_once('_') else {
        return Err(crate::IdError::MissingSeparator);
    };

    if prefix != expected {
        return Err(crate::IdError::InvalidPrefix {
            expected,
            actual: prefix.to_string(),
        });
    }

    Ok(rest)
}

/// Parses the ULID portion of an ID.
pub(crate) fn parse_ulid(s: &str) -> Result<crate::Ulid, crate::IdError> {
    s.parse::<crate::Ulid>()
        .map_err(|e| crate::IdError::InvalidUlid(e.to_string()))
}

/// Defines a ULID-backed ID with a fixed string prefix.
///
/// The generated type is `Copy`, totally ordered (ULIDs are time-ordered),
/// parses strictly from `{prefix}_{ulid}` and serializes as that string.
///
/// ```ignore
/// define_id!(NodeId, "node");
///
/// let id = NodeId::new();
/// let parsed: NodeId = "node_01HV4Z2WQXKJNM8GPQY6VBKC3D".parse()?;
/// ```
macro_rules! define_id {
    ($name:ident, $prefix:literal) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name($crate::Ulid);

        impl $name {
            /// The prefix for this ID type.
            pub const PREFIX: &'static str = $prefix;

            /// Creates a new ID with a fresh ULID.
            #[must_use]
            pub fn new() -> Self {
                Self($crate::Ulid::new())
            }

            /// Creates an ID from a raw ULID.
            #[must_use]
            pub const fn from_ulid(ulid: $crate::Ulid) -> Self {
                Self(ulid)
            }

            /// Returns the underlying ULID.
            #[must_use]
            pub const fn ulid(&self) -> $crate::Ulid {
                self.0
            }

            /// Parses an ID in the format `{prefix}_{ulid}`.
            pub fn parse(s: &str) -> Result<Self, $crate::IdError> {
                let rest = $crate::macros::split_prefixed(s, Self::PREFIX)?;
                $crate::macros::parse_ulid(rest).map(Self)
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}_{}", Self::PREFIX, self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::IdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serializer.collect_str(self)
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let s = String::deserialize(deserializer)?;
                Self::parse(&s).map_err(serde::de::Error::custom)
            }
        }
    };
}

pub(crate) use define_id;
