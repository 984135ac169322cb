//! Validated text types shared across the EMC crates.

use std::collections::BTreeMap;

/// Longest display name a location may carry, in characters.
pub const MAX_NAME_CHARS: usize = 255;

/// Errors that can occur when creating validated text types.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TextError {
    /// The input text was empty or contained only whitespace
    #[error("Text cannot be empty")]
    Empty,
    /// The input text exceeded [`MAX_NAME_CHARS`] after trimming
    #[error("Text cannot be longer than {max} characters (got {len})")]
    TooLong { len: usize, max: usize },
}

/// A string type that guarantees non-empty content of bounded length.
///
/// The input is trimmed of leading and trailing whitespace during construction, so two names that
/// differ only in surrounding whitespace compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Creates a new `NonEmptyText` from the given input.
    ///
    /// # Errors
    ///
    /// Returns [`TextError::Empty`] if the trimmed input is empty, or [`TextError::TooLong`] if it
    /// exceeds [`MAX_NAME_CHARS`] characters.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        let len = trimmed.chars().count();
        if len > MAX_NAME_CHARS {
            return Err(TextError::TooLong {
                len,
                max: MAX_NAME_CHARS,
            });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the inner string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for NonEmptyText {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for NonEmptyText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NonEmptyText::new(&s).map_err(serde::de::Error::custom)
    }
}

/// Picks the single display name out of a locale → name map.
///
/// Only one name per location is stored. The entry for `locale` wins when present; otherwise the
/// first entry in key order is used. Returns `None` for an empty map.
pub fn select_localised<'a>(names: &'a BTreeMap<String, String>, locale: &str) -> Option<&'a str> {
    names
        .get(locale)
        .or_else(|| names.values().next())
        .map(String::as_str)
}
