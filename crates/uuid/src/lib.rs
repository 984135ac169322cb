//! Record identifiers and sharded-path utilities.
//!
//! Every location (and every patient record the registry inspects) is addressed by a
//! [`RecordId`]. Identifiers are opaque strings as far as callers are concerned, but the registry
//! places two constraints on them:
//!
//! - Identifiers it *allocates* are random v4 UUIDs in lowercase hyphenated form, e.g.
//!   `3449f5fe-8e6b-4250-bcaa-fca5df28ddbf`.
//! - Identifiers it *accepts* from outside (REST path segments, CLI arguments, stored records)
//!   must be non-empty and consist only of ASCII alphanumerics, `-` and `_`.
//!
//! The second rule keeps every identifier usable as a single path component, which the file
//! gateway relies on when deriving storage directories.
//!
//! ## Sharded directory layout
//! For an identifier `id`, on-disk records live under:
//! `parent_dir/<id[0..2]>/<id[2..4]>/<id>/`
//!
//! Identifiers shorter than four characters are padded with `_` for the shard segments only.

mod id;

pub use id::{RecordId, Uuid};

/// Identifier of a location.
pub type LocationId = RecordId;

/// Identifier of a patient record.
pub type PatientId = RecordId;

/// Error type for identifier operations.
#[derive(Debug, thiserror::Error)]
pub enum UuidError {
    /// Invalid input provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for identifier operations.
pub type UuidResult<T> = Result<T, UuidError>;
