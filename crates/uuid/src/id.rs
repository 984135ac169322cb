//! Internal implementation of [`RecordId`].

use crate::{UuidError, UuidResult};
use std::path::{Path, PathBuf};
use std::{fmt, str::FromStr};

/// Re-exported for convenience.
pub use ::uuid::Uuid;

/// Maximum accepted identifier length.
const MAX_LEN: usize = 64;

/// Identifier of a stored record (a location or a patient).
///
/// Once constructed, the contained string is guaranteed to be non-empty, at most 64 bytes, and
/// made only of ASCII alphanumerics, `-` and `_`.
///
/// # Construction
/// - [`RecordId::generate`] allocates a fresh hyphenated v4 UUID.
/// - [`RecordId::parse`] validates an externally supplied identifier.
/// - [`RecordId::from_static`] wraps a compile-time well-known identifier.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(String);

impl RecordId {
    /// Allocates a new identifier for a freshly created record.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().hyphenated().to_string())
    }

    /// Validates and wraps an identifier supplied from outside the registry.
    ///
    /// No normalisation is applied: the identifier is compared byte-for-byte everywhere.
    ///
    /// # Errors
    ///
    /// Returns [`UuidError::InvalidInput`] if `input` is empty, too long, or contains characters
    /// other than ASCII alphanumerics, `-` and `_`.
    pub fn parse(input: &str) -> UuidResult<Self> {
        if Self::is_valid(input) {
            return Ok(Self(input.to_owned()));
        }
        Err(UuidError::InvalidInput(format!(
            "record identifier must be 1-{MAX_LEN} characters of [A-Za-z0-9_-], got: '{input}'"
        )))
    }

    /// Wraps a well-known identifier known at compile time.
    ///
    /// Intended for the fixed skeleton constants, which are covered by tests. Invalid input still
    /// produces a usable value; it simply will never match a stored record.
    pub fn from_static(input: &'static str) -> Self {
        Self(input.to_owned())
    }

    /// Returns true if `input` would be accepted by [`RecordId::parse`].
    pub fn is_valid(input: &str) -> bool {
        !input.is_empty()
            && input.len() <= MAX_LEN
            && input
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `parent_dir/<s1>/<s2>/<id>/` where `s1`/`s2` are the first two pairs of characters.
    pub fn sharded_dir(&self, parent_dir: &Path) -> PathBuf {
        let mut padded: Vec<u8> = self.0.bytes().take(4).collect();
        padded.resize(4, b'_');
        // Only ASCII bytes survive validation, so both halves are valid UTF-8.
        let s1 = String::from_utf8_lossy(&padded[0..2]).into_owned();
        let s2 = String::from_utf8_lossy(&padded[2..4]).into_owned();
        parent_dir.join(s1).join(s2).join(&self.0)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for RecordId {
    type Err = UuidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RecordId::parse(s)
    }
}

impl From<RecordId> for String {
    fn from(id: RecordId) -> Self {
        id.0
    }
}

impl AsRef<str> for RecordId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for RecordId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for RecordId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        RecordId::parse(&s).map_err(serde::de::Error::custom)
    }
}
