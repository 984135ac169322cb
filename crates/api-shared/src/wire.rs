//! JSON shapes exchanged with location API clients.
//!
//! A location on the wire looks like:
//!
//! ```json
//! {
//!   "uuid": "3f75ca61-ec1a-4739-af09-25a84e3dd237",
//!   "parent_uuid": "3449f5fe-8e6b-4250-bcaa-fca5df28ddbf",
//!   "names": { "en": "Triage Zone" }
//! }
//! ```
//!
//! `parent_uuid` is omitted only for the root. Request bodies keep every field optional so that
//! missing fields surface as domain validation errors with a readable reason rather than as
//! deserialisation failures.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

/// External representation of a location.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct LocationJson {
    pub uuid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_uuid: Option<String>,
    /// Locale code to display name. Always a single entry on output.
    pub names: BTreeMap<String, String>,
}

/// Envelope for list and search results.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct LocationListRes {
    pub results: Vec<LocationJson>,
}

/// Body of a create request.
///
/// `uuid` exists only so that a client-supplied identifier can be detected and rejected.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CreateLocationReq {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_uuid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub names: Option<BTreeMap<String, String>>,
}

/// Body of an update request.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UpdateLocationReq {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub names: Option<BTreeMap<String, String>>,
}

/// Query parameters accepted by search. They are currently ignored.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SearchLocationsReq {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,
}

/// Error body returned by the REST API.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ErrorRes {
    /// Machine-readable kind, e.g. `invalid_input`.
    pub error: String,
    pub message: String,
}

impl CreateLocationReq {
    /// Convenience constructor for a well-formed create request.
    pub fn new(parent_uuid: impl Into<String>, locale: &str, name: impl Into<String>) -> Self {
        Self {
            uuid: None,
            parent_uuid: Some(parent_uuid.into()),
            names: Some(BTreeMap::from([(locale.to_string(), name.into())])),
        }
    }
}

impl UpdateLocationReq {
    /// Convenience constructor for a rename.
    pub fn rename(locale: &str, name: impl Into<String>) -> Self {
        Self {
            names: Some(BTreeMap::from([(locale.to_string(), name.into())])),
        }
    }
}
