//! Wallet address validation.
//!
//! Addresses are base-58 strings (Bitcoin alphabet, which excludes `0`, `O`,
//! `I` and `l`) between [`ADDRESS_MIN_LEN`] and [`ADDRESS_MAX_LEN`]
//! characters long. Only the textual form is checked; the decoded bytes are
//! not required to be a valid curve point.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::constants::{ADDRESS_MAX_LEN, ADDRESS_MIN_LEN};
use crate::error::AddressError;

/// A validated base-58 wallet address.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address(String);

impl Address {
    /// Validate and wrap a raw address string.
    pub fn parse(s: &str) -> Result<Self, AddressError> {
        if s.is_empty() {
            return Err(AddressError::Empty);
        }
        if !(ADDRESS_MIN_LEN..=ADDRESS_MAX_LEN).contains(&s.len()) {
            return Err(AddressError::InvalidLength(s.len()));
        }

        bs58::decode(s).into_vec().map_err(|e| match e {
            bs58::decode::Error::InvalidCharacter { character, .. } => {
                AddressError::InvalidCharacter(character)
            }
            bs58::decode::Error::NonAsciiCharacter { index } => AddressError::InvalidCharacter(
                s.get(index..).and_then(|t| t.chars().next()).unwrap_or(char::REPLACEMENT_CHARACTER),
            ),
            _ => AddressError::InvalidLength(s.len()),
        })?;

        Ok(Self(s.to_string()))
    }

    /// The address as it was supplied.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Returns `true` if `s` is a well-formed address.
pub fn is_valid_address(s: &str) -> bool {
    Address::parse(s).is_ok()
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for Address {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
