//! Persistence capability the registry is written against.
//!
//! The registry never touches storage directly. It asks a [`PersistenceGateway`] to load, save
//! and purge location records and to enumerate patients. Two implementations ship with the crate:
//!
//! - [`MemoryGateway`]: process-local, used by tests and for throwaway runs.
//! - [`FileGateway`]: sharded YAML records under the configured data directory.
//!
//! Gateways provide no cross-call atomicity. The registry serialises its own check-then-act
//! sections; anything beyond one process must be enforced by the storage backend.

mod files;
mod memory;

pub use files::FileGateway;
pub use memory::MemoryGateway;

use crate::location::{Location, PatientRecord};
use crate::LocationResult;
use emc_uuid::LocationId;

/// Storage operations for locations and read access to patients.
pub trait PersistenceGateway: Send + Sync {
    /// Loads a location by identifier, retired or not.
    fn get_by_id(&self, id: &LocationId) -> LocationResult<Option<Location>>;

    /// Loads a non-retired location whose name is exactly `name`.
    ///
    /// Retired locations never match, so a retired holder of a name does not block its reuse.
    fn get_by_name(&self, name: &str) -> LocationResult<Option<Location>>;

    /// Inserts or replaces the record with `location.id`.
    fn save(&self, location: &Location) -> LocationResult<()>;

    /// Permanently removes the record. Purging an absent record is not an error.
    fn purge(&self, id: &LocationId) -> LocationResult<()>;

    /// Every location, retired ones included, in the same enumeration order that
    /// [`list_children`](Self::list_children) uses for siblings.
    fn list_locations(&self) -> LocationResult<Vec<Location>>;

    /// Direct children of `id`, retired ones included, in a stable enumeration order.
    fn list_children(&self, id: &LocationId) -> LocationResult<Vec<Location>>;

    /// Every patient with the values of its location-valued attributes.
    fn list_patients(&self) -> LocationResult<Vec<PatientRecord>>;
}
