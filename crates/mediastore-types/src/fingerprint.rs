use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::object::ObjectId;

/// Opaque content fingerprint produced by a content store.
///
/// The registry never interprets a fingerprint; it only guarantees that a
/// recorded fingerprint is non-empty. A `Fingerprint` can therefore never be
/// constructed from an empty or whitespace-bearing string.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Validate and wrap a fingerprint string.
    pub fn new(value: impl Into<String>) -> Result<Self, TypeError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(TypeError::EmptyFingerprint);
        }
        if value.chars().any(char::is_whitespace) {
            return Err(TypeError::InvalidFingerprint(value));
        }
        Ok(Self(value))
    }

    /// Interpret an optional raw value reported by a content store.
    ///
    /// `None`, empty and whitespace-only values all yield `Ok(None)`: they
    /// mean "the store produced nothing". Any other value is kept verbatim,
    /// so surrounding whitespace is rejected rather than stripped.
    pub fn from_reported(value: Option<&str>) -> Result<Option<Self>, TypeError> {
        match value {
            None => Ok(None),
            Some(v) if v.trim().is_empty() => Ok(None),
            Some(v) => Self::new(v).map(Some),
        }
    }

    /// The fingerprint as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First eight characters, for log lines and terminal output.
    pub fn short(&self) -> &str {
        let end = self
            .0
            .char_indices()
            .nth(8)
            .map(|(i, _)| i)
            .unwrap_or(self.0.len());
        &self.0[..end]
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", self.0)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Fingerprint {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Fingerprint {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Fingerprint> for String {
    fn from(value: Fingerprint) -> Self {
        value.0
    }
}

impl From<ObjectId> for Fingerprint {
    fn from(id: ObjectId) -> Self {
        Self(id.to_hex())
    }
}
