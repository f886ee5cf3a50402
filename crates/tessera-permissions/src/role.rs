//! Roles and principals.

use std::fmt;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::capability::Capabilities;

/// A principal identifier (user, service account, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrincipalId(String);

impl PrincipalId {
    /// Wrap an identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PrincipalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PrincipalId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for PrincipalId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A named bundle of capabilities.
///
/// On the wire the mask is a JSON number. Directories that store masks in a
/// 64-bit column often serialize them as decimal strings to dodge
/// JavaScript's 53-bit integers, so both forms are accepted on input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    /// Role identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Capability mask.
    #[serde(
        alias = "capabilities",
        serialize_with = "serialize_mask",
        deserialize_with = "deserialize_mask"
    )]
    pub permissions: Capabilities,
}

impl Role {
    /// Create a role.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, permissions: Capabilities) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            permissions,
        }
    }
}

fn serialize_mask<S: Serializer>(mask: &Capabilities, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(mask.bits())
}

fn deserialize_mask<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Capabilities, D::Error> {
    struct MaskVisitor;

    impl Visitor<'_> for MaskVisitor {
        type Value = Capabilities;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("an unsigned 64-bit mask as a number or decimal string")
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
            Ok(Capabilities::from_bits_retain(v))
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
            u64::try_from(v)
                .map(Capabilities::from_bits_retain)
                .map_err(|_| E::invalid_value(de::Unexpected::Signed(v), &self))
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            v.trim()
                .parse::<u64>()
                .map(Capabilities::from_bits_retain)
                .map_err(|_| E::invalid_value(de::Unexpected::Str(v), &self))
        }
    }

    deserializer.deserialize_any(MaskVisitor)
}
