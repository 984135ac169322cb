use super::PersistenceGateway;
use crate::location::{Location, PatientRecord};
use crate::{LocationError, LocationResult};
use emc_uuid::LocationId;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Default)]
struct MemoryState {
    // Insertion order doubles as the sibling enumeration order.
    locations: Vec<Location>,
    patients: Vec<PatientRecord>,
}

/// In-process gateway backed by vectors behind an `RwLock`.
#[derive(Debug, Default)]
pub struct MemoryGateway {
    state: RwLock<MemoryState>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a patient record.
    pub fn put_patient(&self, patient: PatientRecord) -> LocationResult<()> {
        let mut state = self.write()?;
        match state.patients.iter_mut().find(|p| p.id == patient.id) {
            Some(existing) => *existing = patient,
            None => state.patients.push(patient),
        }
        Ok(())
    }

    /// Number of stored location records, retired ones included.
    pub fn location_count(&self) -> LocationResult<usize> {
        Ok(self.read()?.locations.len())
    }

    fn read(&self) -> LocationResult<RwLockReadGuard<'_, MemoryState>> {
        self.state.read().map_err(|_| LocationError::LockPoisoned)
    }

    fn write(&self) -> LocationResult<RwLockWriteGuard<'_, MemoryState>> {
        self.state.write().map_err(|_| LocationError::LockPoisoned)
    }
}

impl PersistenceGateway for MemoryGateway {
    fn get_by_id(&self, id: &LocationId) -> LocationResult<Option<Location>> {
        Ok(self.read()?.locations.iter().find(|l| &l.id == id).cloned())
    }

    fn get_by_name(&self, name: &str) -> LocationResult<Option<Location>> {
        Ok(self
            .read()?
            .locations
            .iter()
            .find(|l| !l.retired && l.name.as_str() == name)
            .cloned())
    }

    fn save(&self, location: &Location) -> LocationResult<()> {
        let mut state = self.write()?;
        match state.locations.iter_mut().find(|l| l.id == location.id) {
            Some(existing) => *existing = location.clone(),
            None => state.locations.push(location.clone()),
        }
        Ok(())
    }

    fn purge(&self, id: &LocationId) -> LocationResult<()> {
        self.write()?.locations.retain(|l| &l.id != id);
        Ok(())
    }

    fn list_locations(&self) -> LocationResult<Vec<Location>> {
        Ok(self.read()?.locations.clone())
    }

    fn list_children(&self, id: &LocationId) -> LocationResult<Vec<Location>> {
        Ok(self
            .read()?
            .locations
            .iter()
            .filter(|l| l.parent_id.as_ref() == Some(id))
            .cloned()
            .collect())
    }

    fn list_patients(&self) -> LocationResult<Vec<PatientRecord>> {
        Ok(self.read()?.patients.clone())
    }
}
