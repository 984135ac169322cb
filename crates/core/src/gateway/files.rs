//! File-backed gateway.
//!
//! ## Storage Layout
//!
//! ```text
//! <data_dir>/
//!   locations/<s1>/<s2>/<location-id>/location.yaml
//!   patients/<s1>/<s2>/<patient-id>/patient.yaml
//! ```
//!
//! where `s1` and `s2` are the first four characters of the identifier. Lookups by identifier
//! read a single file; everything else scans every record once per call.
//!
//! A record that cannot be read or parsed fails the whole call. Skipping it would hide a child
//! from a subtree walk or a patient from the delete safety scan. A record directory without a
//! record file is ignored.

use super::PersistenceGateway;
use crate::config::CoreConfig;
use crate::constants::{LOCATION_FILENAME, PATIENT_FILENAME};
use crate::location::{Location, PatientRecord};
use crate::{LocationError, LocationResult};
use emc_uuid::{LocationId, PatientId};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// On-disk shape of a patient record.
#[derive(Debug, Serialize, Deserialize)]
struct StoredPatient {
    id: String,
    #[serde(default)]
    attributes: BTreeMap<String, String>,
}

/// Gateway storing each record as a YAML file in a sharded directory tree.
#[derive(Clone, Debug)]
pub struct FileGateway {
    cfg: Arc<CoreConfig>,
}

impl FileGateway {
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        Self { cfg }
    }

    /// Writes a patient record with the given attributes, replacing any existing one.
    ///
    /// Patients are owned by another subsystem; this exists for seeding and tests.
    pub fn put_patient(
        &self,
        id: &PatientId,
        attributes: BTreeMap<String, String>,
    ) -> LocationResult<()> {
        let stored = StoredPatient {
            id: id.to_string(),
            attributes,
        };
        let yaml = serde_yaml::to_string(&stored).map_err(LocationError::YamlSerialization)?;
        let dir = id.sharded_dir(&self.cfg.patients_dir());
        write_record(&dir, PATIENT_FILENAME, &yaml)
    }

    fn location_file(&self, id: &LocationId) -> PathBuf {
        id.sharded_dir(&self.cfg.locations_dir())
            .join(LOCATION_FILENAME)
    }

    /// Every location, sorted by creation time then identifier.
    fn scan_locations(&self) -> LocationResult<Vec<Location>> {
        let mut locations: Vec<Location> =
            read_records(&self.cfg.locations_dir(), LOCATION_FILENAME)?;
        locations.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(locations)
    }
}

impl PersistenceGateway for FileGateway {
    fn get_by_id(&self, id: &LocationId) -> LocationResult<Option<Location>> {
        let path = self.location_file(id);
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(LocationError::FileRead(e)),
        };

        let location: Location =
            serde_yaml::from_str(&contents).map_err(LocationError::YamlDeserialization)?;
        if &location.id != id {
            tracing::warn!(
                "location record at {} carries mismatched id {}",
                path.display(),
                location.id
            );
        }
        Ok(Some(location))
    }

    fn get_by_name(&self, name: &str) -> LocationResult<Option<Location>> {
        Ok(self
            .scan_locations()?
            .into_iter()
            .find(|l| !l.retired && l.name.as_str() == name))
    }

    fn save(&self, location: &Location) -> LocationResult<()> {
        let yaml = serde_yaml::to_string(location).map_err(LocationError::YamlSerialization)?;
        let dir = location.id.sharded_dir(&self.cfg.locations_dir());
        write_record(&dir, LOCATION_FILENAME, &yaml)
    }

    fn purge(&self, id: &LocationId) -> LocationResult<()> {
        let dir = id.sharded_dir(&self.cfg.locations_dir());
        match fs::remove_dir_all(&dir) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("purge of absent location {}", id);
                return Ok(());
            }
            Err(e) => return Err(LocationError::FileRemove(e)),
        }

        // Prune now-empty shard directories; a non-empty shard simply stays.
        for shard in dir.ancestors().skip(1).take(2) {
            if fs::remove_dir(shard).is_err() {
                break;
            }
        }
        Ok(())
    }

    fn list_locations(&self) -> LocationResult<Vec<Location>> {
        self.scan_locations()
    }

    fn list_children(&self, id: &LocationId) -> LocationResult<Vec<Location>> {
        Ok(self
            .scan_locations()?
            .into_iter()
            .filter(|l| l.parent_id.as_ref() == Some(id))
            .collect())
    }

    fn list_patients(&self) -> LocationResult<Vec<PatientRecord>> {
        let keys = self.cfg.patient_location_attributes();
        let stored: Vec<StoredPatient> =
            read_records(&self.cfg.patients_dir(), PATIENT_FILENAME)?;

        Ok(stored
            .into_iter()
            .map(|p| {
                let location_values = keys
                    .iter()
                    .filter_map(|k| p.attributes.get(k).cloned())
                    .collect();
                PatientRecord::new(p.id, location_values)
            })
            .collect())
    }
}

/// Reads and parses `filename` from every record directory under `base`.
fn read_records<T: DeserializeOwned>(base: &Path, filename: &str) -> LocationResult<Vec<T>> {
    let mut records = Vec::new();

    for dir in record_dirs(base)? {
        let path = dir.join(filename);
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("no {} in {}", filename, dir.display());
                continue;
            }
            Err(e) => {
                tracing::error!("failed to read {}: {}", path.display(), e);
                return Err(LocationError::FileRead(e));
            }
        };
        let record = serde_yaml::from_str(&contents).map_err(|e| {
            tracing::error!("failed to parse {}: {}", path.display(), e);
            LocationError::YamlDeserialization(e)
        })?;
        records.push(record);
    }

    Ok(records)
}

/// Writes `contents` to `dir/filename` via a temporary file and a rename.
fn write_record(dir: &Path, filename: &str, contents: &str) -> LocationResult<()> {
    fs::create_dir_all(dir).map_err(LocationError::DirCreation)?;
    let target = dir.join(filename);
    let tmp = dir.join(format!("{filename}.tmp"));
    fs::write(&tmp, contents).map_err(LocationError::FileWrite)?;
    fs::rename(&tmp, &target).map_err(LocationError::FileWrite)?;
    Ok(())
}

/// Leaf record directories under `base/<s1>/<s2>/`. A missing base yields nothing.
fn record_dirs(base: &Path) -> LocationResult<Vec<PathBuf>> {
    let mut dirs = Vec::new();

    let s1_iter = match fs::read_dir(base) {
        Ok(it) => it,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(dirs),
        Err(e) => return Err(LocationError::FileRead(e)),
    };
    for s1 in s1_iter {
        let s1_path = s1.map_err(LocationError::FileRead)?.path();
        if !s1_path.is_dir() {
            continue;
        }

        for s2 in fs::read_dir(&s1_path).map_err(LocationError::FileRead)? {
            let s2_path = s2.map_err(LocationError::FileRead)?.path();
            if !s2_path.is_dir() {
                continue;
            }

            for id_ent in fs::read_dir(&s2_path).map_err(LocationError::FileRead)? {
                let id_path = id_ent.map_err(LocationError::FileRead)?.path();
                if id_path.is_dir() {
                    dirs.push(id_path);
                }
            }
        }
    }

    Ok(dirs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use emc_types::NonEmptyText;
    use tempfile::TempDir;

    fn test_gateway(dir: &Path) -> FileGateway {
        FileGateway::new(Arc::new(CoreConfig::with_data_dir(dir.to_path_buf())))
    }

    fn location(name: &str, parent: Option<&LocationId>) -> Location {
        Location::new(
            LocationId::generate(),
            NonEmptyText::new(name).unwrap(),
            parent.cloned(),
        )
    }

    #[test]
    fn test_save_writes_sharded_yaml_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let gw = test_gateway(temp_dir.path());
        let loc = location("Tent 3", None);
        gw.save(&loc).expect("save should succeed");

        let path = loc
            .id
            .sharded_dir(&temp_dir.path().join("locations"))
            .join(LOCATION_FILENAME);
        assert!(path.is_file(), "location.yaml should exist");
        assert!(
            !path.with_file_name("location.yaml.tmp").exists(),
            "temp file should be renamed away"
        );

        let loaded = gw.get_by_id(&loc.id).unwrap().expect("record should load");
        assert_eq!(loaded, loc);
    }

    #[test]
    fn test_records_survive_new_gateway_instance() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let root = location("Root", None);
        let child = location("Child", Some(&root.id));
        {
            let gw = test_gateway(temp_dir.path());
            gw.save(&root).unwrap();
            gw.save(&child).unwrap();
        }

        let gw = test_gateway(temp_dir.path());
        let children = gw.list_children(&root.id).unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].id, child.id);
        assert_eq!(
            gw.get_by_name("Child").unwrap().map(|l| l.id),
            Some(child.id)
        );
    }

    #[test]
    fn test_get_by_id_returns_none_for_missing_record() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let gw = test_gateway(temp_dir.path());

        assert!(gw.get_by_id(&LocationId::generate()).unwrap().is_none());
    }

    #[test]
    fn test_get_by_id_reports_corrupt_record() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let gw = test_gateway(temp_dir.path());
        let id = LocationId::generate();
        let dir = id.sharded_dir(&temp_dir.path().join("locations"));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(LOCATION_FILENAME), "invalid: yaml: content: [[[").unwrap();

        let err = gw.get_by_id(&id).expect_err("corrupt record should fail");
        assert!(matches!(err, LocationError::YamlDeserialization(_)));
    }

    #[test]
    fn test_scans_fail_on_corrupt_record() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let gw = test_gateway(temp_dir.path());
        let root = location("Root", None);
        gw.save(&root).unwrap();
        gw.save(&location("Valid", Some(&root.id))).unwrap();

        let bad = LocationId::generate();
        let dir = bad.sharded_dir(&temp_dir.path().join("locations"));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(LOCATION_FILENAME), "invalid: yaml: content: [[[").unwrap();

        let err = gw.list_children(&root.id).expect_err("corrupt child must not be hidden");
        assert!(matches!(err, LocationError::YamlDeserialization(_)));
        assert!(gw.list_locations().is_err());
        assert!(gw.get_by_name("Valid").is_err());
    }

    #[test]
    fn test_scans_ignore_directory_without_record() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let gw = test_gateway(temp_dir.path());
        let root = location("Root", None);
        gw.save(&root).unwrap();
        fs::create_dir_all(temp_dir.path().join("locations/ab/cd/abcd-empty")).unwrap();

        assert_eq!(gw.list_locations().unwrap().len(), 1);
    }

    #[test]
    fn test_purge_removes_record_and_prunes_empty_shards() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let gw = test_gateway(temp_dir.path());
        let loc = Location::new(
            LocationId::parse("abcd-1").unwrap(),
            NonEmptyText::new("Tent").unwrap(),
            None,
        );
        gw.save(&loc).unwrap();
        gw.purge(&loc.id).unwrap();

        assert!(gw.get_by_id(&loc.id).unwrap().is_none());
        assert!(!temp_dir.path().join("locations").join("ab").exists());

        gw.purge(&loc.id).expect("second purge should be a no-op");
    }

    #[test]
    fn test_list_patients_reads_configured_attributes() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let gw = test_gateway(temp_dir.path());

        gw.put_patient(
            &PatientId::generate(),
            BTreeMap::from([
                ("assigned_location".to_string(), "tent-3".to_string()),
                ("tribe".to_string(), "ignored".to_string()),
            ]),
        )
        .unwrap();
        gw.put_patient(&PatientId::generate(), BTreeMap::new())
            .unwrap();

        let mut patients = gw.list_patients().unwrap();
        patients.sort_by_key(|p| p.location_values.len());
        assert_eq!(patients.len(), 2);
        assert!(patients[0].location_values.is_empty());
        assert_eq!(patients[1].location_values, vec!["tent-3".to_string()]);
    }

    #[test]
    fn test_list_patients_keeps_foreign_patient_ids() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let gw = test_gateway(temp_dir.path());
        let dir = temp_dir.path().join("patients/pa/ti/patient-2");
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join(PATIENT_FILENAME),
            "id: \"MRN.0042\"\nattributes:\n  assigned_location: tent-3\n",
        )
        .unwrap();

        let patients = gw.list_patients().unwrap();
        assert_eq!(patients.len(), 1);
        assert_eq!(patients[0].id, "MRN.0042");
        assert_eq!(patients[0].location_values, vec!["tent-3".to_string()]);
    }

    #[test]
    fn test_list_patients_fails_on_unreadable_record() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let gw = test_gateway(temp_dir.path());
        // A directory where the record file should be cannot be read as a file.
        let dir = temp_dir.path().join("patients/pa/ti/patient-3");
        fs::create_dir_all(dir.join(PATIENT_FILENAME)).unwrap();

        let err = gw.list_patients().expect_err("unreadable patient must not be skipped");
        assert!(matches!(err, LocationError::FileRead(_)));
    }

    #[test]
    fn test_list_patients_fails_on_corrupt_record() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let gw = test_gateway(temp_dir.path());
        let dir = temp_dir.path().join("patients/pa/ti/patient-4");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(PATIENT_FILENAME), "attributes: [[[").unwrap();

        let err = gw.list_patients().expect_err("corrupt patient must not be skipped");
        assert!(matches!(err, LocationError::YamlDeserialization(_)));
    }

    #[test]
    fn test_list_patients_empty_without_directory() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let gw = test_gateway(temp_dir.path());

        assert!(gw.list_patients().unwrap().is_empty());
    }
}
