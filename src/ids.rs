//! Identifiers used by the suite.
//!
//! - [`PetId`] is the numeric pet identifier. Fresh ids are random 7-digit
//!   numbers so concurrently running cases do not trample each other's data
//!   on the shared remote service.
//! - [`RequestId`] is a ULID attached to every outgoing request as
//!   `x-request-id` and recorded in traces for correlation.

use rand::Rng;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{self, Display, Formatter};
use std::num::ParseIntError;
use std::str::FromStr;

/// Number of decimal digits in a generated pet id.
pub const PET_ID_DIGITS: u32 = 7;

/// Numeric pet identifier.
///
/// Serialized as a JSON number. Deserialization accepts a number or a
/// numeric string, since the service echoes whatever shape it was given.
#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug, PartialOrd, Ord)]
pub struct PetId(pub u64);

impl PetId {
    /// Generate a fresh random id with exactly [`PET_ID_DIGITS`] digits.
    ///
    /// The leading digit is never zero, so the id keeps its width when the
    /// service parses it as a number.
    pub fn random() -> Self {
        let low = 10u64.pow(PET_ID_DIGITS - 1);
        let high = 10u64.pow(PET_ID_DIGITS);
        Self(rand::thread_rng().gen_range(low..high))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl Display for PetId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PetId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<u64>().map(PetId)
    }
}

impl From<u64> for PetId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl Serialize for PetId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(self.0)
    }
}

struct PetIdVisitor;

impl Visitor<'_> for PetIdVisitor {
    type Value = PetId;

    fn expecting(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("a non-negative integer or a numeric string")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<PetId, E> {
        Ok(PetId(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<PetId, E> {
        u64::try_from(v)
            .map(PetId)
            .map_err(|_| E::custom(format!("negative pet id {v}")))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<PetId, E> {
        v.parse::<PetId>()
            .map_err(|_| E::custom(format!("invalid pet id {v:?}")))
    }
}

impl<'de> Deserialize<'de> for PetId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(PetIdVisitor)
    }
}

/// Strongly typed request identifier backed by ULID.
#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug)]
pub struct RequestId(pub ulid::Ulid);

impl RequestId {
    pub fn new() -> Self {
        Self(ulid::Ulid::new())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for RequestId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RequestId {
    type Err = ulid::DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id = ulid::Ulid::from_string(s)?;
        Ok(RequestId(id))
    }
}

impl Serialize for RequestId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for RequestId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse::<RequestId>()
            .map_err(|_| serde::de::Error::custom("invalid request id"))
    }
}
