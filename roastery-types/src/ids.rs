//! Identifier types for store records.
//!
//! User ids are small monotonically-assigned integers (`max + 1` over the
//! existing collection), not UUIDs, so they stay readable in the JSON file
//! and in URLs.

use crate::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Unique identifier for a user record within the document.
///
/// Route handlers receive ids as path segments, so a `UserId` also parses
/// from a decimal string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(u64);

impl UserId {
    /// Creates a user id from a raw integer.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying integer.
    #[must_use]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }

    /// Parses a user id from a decimal string.
    pub fn parse(s: &str) -> Result<Self, Error> {
        s.trim()
            .parse::<u64>()
            .map(Self)
            .map_err(|_| Error::InvalidUserId(s.to_string()))
    }

    /// Returns true if the given JSON value identifies this user, matching
    /// either a JSON number or a numeric string (route parameters arrive as
    /// strings, and hand-edited files sometimes quote ids).
    #[must_use]
    pub fn matches(&self, value: &serde_json::Value) -> bool {
        match value {
            serde_json::Value::Number(n) => n.as_u64() == Some(self.0),
            serde_json::Value::String(s) => s.trim().parse::<u64>() == Ok(self.0),
            _ => false,
        }
    }
}

impl From<u64> for UserId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for UserId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
