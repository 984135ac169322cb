//! The location entity and its mapping to the wire representation.

use api_shared::LocationJson;
use chrono::{DateTime, Utc};
use emc_types::NonEmptyText;
use emc_uuid::LocationId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A node in the location hierarchy.
///
/// Children are not stored; they are the locations whose `parent_id` equals this `id`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub id: LocationId,
    pub name: NonEmptyText,
    /// Absent only for the root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<LocationId>,
    #[serde(default)]
    pub retired: bool,
    /// Kept equal to the name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Location {
    pub fn new(id: LocationId, name: NonEmptyText, parent_id: Option<LocationId>) -> Self {
        let now = Utc::now();
        Self {
            id,
            description: Some(name.as_str().to_string()),
            name,
            parent_id,
            retired: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Replaces the display name and description and bumps `updated_at`.
    pub fn rename(&mut self, name: NonEmptyText) {
        self.description = Some(name.as_str().to_string());
        self.name = name;
        self.updated_at = Utc::now();
    }

    /// Maps the entity to its external representation.
    ///
    /// The single stored name is emitted under `locale`.
    pub fn to_json(&self, locale: &str) -> LocationJson {
        LocationJson {
            uuid: self.id.to_string(),
            parent_uuid: self.parent_id.as_ref().map(ToString::to_string),
            names: BTreeMap::from([(locale.to_string(), self.name.as_str().to_string())]),
        }
    }
}

/// A patient as seen by the registry: only the attribute values that hold location identifiers.
///
/// Patient identifiers belong to another subsystem and are kept as opaque strings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PatientRecord {
    pub id: String,
    /// Raw attribute values; they are not required to resolve to an existing location.
    pub location_values: Vec<String>,
}

impl PatientRecord {
    pub fn new(id: impl Into<String>, location_values: Vec<String>) -> Self {
        Self {
            id: id.into(),
            location_values,
        }
    }

    pub fn references(&self, location_id: &LocationId) -> bool {
        self.location_values
            .iter()
            .any(|v| v == location_id.as_str())
    }
}
