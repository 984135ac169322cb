//! Constants used throughout the EMC core crate.
//!
//! Holds the fixed location skeleton (root and zones) together with storage path and filename
//! constants, so every component agrees on them.

/// Identifier of the root location, representing the facility as a whole.
pub const ROOT_LOCATION_ID: &str = "3449f5fe-8e6b-4250-bcaa-fca5df28ddbf";

/// Display name given to the root location when it is first created.
pub const ROOT_LOCATION_NAME: &str = "Facility Kailahun";

/// Identifier of the triage zone, where newly arrived patients are placed.
pub const TRIAGE_ZONE_ID: &str = "3f75ca61-ec1a-4739-af09-25a84e3dd237";

/// The protected zones, as `(name, identifier)` pairs, in creation order.
///
/// Each is a direct child of the root and can never be deleted.
pub const ZONES: &[(&str, &str)] = &[
    ("Triage Zone", TRIAGE_ZONE_ID),
    ("Suspected Zone", "2f1e2418-ede6-481a-ad80-b9939a7fde8e"),
    ("Probable Zone", "3b11e7c8-a68a-4a5f-afb3-a4a053592d0e"),
    ("Confirmed Zone", "b9038895-9c9d-4908-9e0d-51fd535ddd3c"),
    ("Morgue", "4ef642b9-9843-4d0d-9b2b-84fe1984801f"),
    ("Discharged", "d7ca63c3-6ea0-4357-82fd-0910cc17a2cb"),
];

/// Returns the zone name if `id` is one of the protected zones.
pub fn zone_name(id: &str) -> Option<&'static str> {
    ZONES
        .iter()
        .find(|(_, zone_id)| *zone_id == id)
        .map(|(name, _)| *name)
}

/// Default directory for registry data when no explicit directory is configured.
pub const DEFAULT_DATA_DIR: &str = "location_data";

/// Directory name for location records storage.
pub const LOCATIONS_DIR_NAME: &str = "locations";

/// Directory name for patient records storage.
pub const PATIENTS_DIR_NAME: &str = "patients";

/// Filename for a stored location record.
pub const LOCATION_FILENAME: &str = "location.yaml";

/// Filename for a stored patient record.
pub const PATIENT_FILENAME: &str = "patient.yaml";

/// Locale used for display names on the wire.
pub const DEFAULT_LOCALE: &str = "en";

/// Patient attribute that holds the patient's assigned location.
pub const ASSIGNED_LOCATION_ATTRIBUTE: &str = "assigned_location";

#[cfg(test)]
mod tests {
    use super::*;
    use emc_uuid::RecordId;
    use std::collections::HashSet;

    #[test]
    fn test_skeleton_identifiers_are_valid_and_distinct() {
        let mut seen = HashSet::new();
        assert!(RecordId::is_valid(ROOT_LOCATION_ID));
        assert!(seen.insert(ROOT_LOCATION_ID));
        for (_, id) in ZONES {
            assert!(RecordId::is_valid(id), "invalid zone id {id}");
            assert!(seen.insert(*id), "duplicate zone id {id}");
        }
    }

    #[test]
    fn test_zone_names_are_distinct_from_root() {
        let names: HashSet<_> = ZONES.iter().map(|(name, _)| *name).collect();
        assert_eq!(names.len(), ZONES.len());
        assert!(!names.contains(ROOT_LOCATION_NAME));
    }

    #[test]
    fn test_zone_lookup() {
        assert_eq!(zone_name(TRIAGE_ZONE_ID), Some("Triage Zone"));
        assert_eq!(zone_name(ROOT_LOCATION_ID), None);
        assert_eq!(zone_name("tent-3"), None);
    }
}
