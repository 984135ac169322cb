//! The location registry service.
//!
//! Public operations over the location hierarchy: list, search, retrieve, create, update and
//! delete. Business rules enforced here:
//!
//! - names are non-empty and unique among non-retired locations
//! - identifiers are server-assigned
//! - the root and the protected zones cannot be deleted
//! - a subtree cannot be deleted while any patient references any node in it
//!
//! ## Initialisation
//!
//! The registry uses a type-state pattern. [`LocationRegistry::new`] yields a
//! `LocationRegistry<Uninitialised>` on which the only operation is
//! [`bootstrap`](LocationRegistry::bootstrap). Bootstrap guarantees the skeleton exists and
//! returns a `LocationRegistry<Ready>`, so no read or write can run before it.
//!
//! ## Concurrency
//!
//! Bootstrap, create, update and delete run under a registry-wide mutex shared by every clone,
//! which keeps their check-then-write sections atomic within the process. Reads take no lock.

use crate::config::CoreConfig;
use crate::constants::{zone_name, ROOT_LOCATION_ID};
use crate::gateway::PersistenceGateway;
use crate::location::Location;
use crate::tree::{BootstrapReport, LocationTree};
use crate::{LocationError, LocationResult};
use api_shared::{
    CreateLocationReq, LocationJson, LocationListRes, SearchLocationsReq, UpdateLocationReq,
};
use emc_types::{select_localised, NonEmptyText, TextError};
use emc_uuid::LocationId;
use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

// ============================================================================
// TYPE-STATE MARKERS
// ============================================================================

/// Marker type: the skeleton has not been verified yet.
#[derive(Clone, Copy, Debug)]
pub struct Uninitialised;

/// Marker type: bootstrap has completed.
#[derive(Clone, Debug)]
pub struct Ready {
    report: BootstrapReport,
}

// ============================================================================
// LOCATION REGISTRY
// ============================================================================

#[derive(Clone)]
pub struct LocationRegistry<S> {
    cfg: Arc<CoreConfig>,
    gateway: Arc<dyn PersistenceGateway>,
    write_lock: Arc<Mutex<()>>,
    state: S,
}

impl<S> std::fmt::Debug for LocationRegistry<S>
where
    S: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocationRegistry")
            .field("cfg", &self.cfg)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl LocationRegistry<Uninitialised> {
    pub fn new(cfg: Arc<CoreConfig>, gateway: Arc<dyn PersistenceGateway>) -> Self {
        Self {
            cfg,
            gateway,
            write_lock: Arc::new(Mutex::new(())),
            state: Uninitialised,
        }
    }

    /// Ensures the root and every protected zone exist, then unlocks the registry operations.
    ///
    /// Safe to run against a store that is already bootstrapped; nothing is modified then.
    ///
    /// # Errors
    ///
    /// Propagates gateway failures. The caller should treat them as fatal at startup.
    pub fn bootstrap(self) -> LocationResult<LocationRegistry<Ready>> {
        let report = {
            let _guard = lock(&self.write_lock)?;
            LocationTree::new(self.gateway.as_ref()).ensure_skeleton()?
        };

        if report.is_noop() {
            tracing::info!("location skeleton already present");
        } else {
            tracing::info!("bootstrap created {} skeleton locations", report.created.len());
        }

        Ok(LocationRegistry {
            cfg: self.cfg,
            gateway: self.gateway,
            write_lock: self.write_lock,
            state: Ready { report },
        })
    }
}

impl LocationRegistry<Ready> {
    /// What the bootstrap run that produced this registry created.
    pub fn bootstrap_report(&self) -> &BootstrapReport {
        &self.state.report
    }

    fn tree(&self) -> LocationTree<'_> {
        LocationTree::new(self.gateway.as_ref())
    }

    fn locale(&self) -> &str {
        self.cfg.default_locale()
    }

    // ------------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------------

    /// Every non-retired location, root first, in pre-order.
    ///
    /// A retired location is left out but its descendants are not; they keep their original
    /// `parent_uuid`.
    ///
    /// # Errors
    ///
    /// Returns [`LocationError::InvariantViolation`] if the root is missing, or a storage error.
    pub fn list_all(&self) -> LocationResult<LocationListRes> {
        let tree = self.tree();
        let root = tree.root().map_err(|e| {
            tracing::error!("location listing failed: {}", e);
            e
        })?;

        let results = tree
            .preorder(root)?
            .into_iter()
            .filter(|l| !l.retired)
            .map(|l| l.to_json(self.locale()))
            .collect();

        Ok(LocationListRes { results })
    }

    /// Same result as [`list_all`](Self::list_all); the parameters are not used for filtering.
    pub fn search(&self, params: &SearchLocationsReq) -> LocationResult<LocationListRes> {
        tracing::debug!("location search with {:?}", params);
        self.list_all()
    }

    /// Looks up one location, retired or not.
    ///
    /// `Ok(None)` means no location has this identifier; an identifier that could never be valid
    /// is treated the same way.
    pub fn retrieve(&self, id: &str) -> LocationResult<Option<LocationJson>> {
        let Ok(id) = LocationId::parse(id) else {
            tracing::debug!("retrieve with malformed location id {:?}", id);
            return Ok(None);
        };
        Ok(self
            .gateway
            .get_by_id(&id)?
            .map(|l| l.to_json(self.locale())))
    }

    // ------------------------------------------------------------------------
    // Writes
    // ------------------------------------------------------------------------

    /// Creates a location under an existing parent.
    ///
    /// # Errors
    ///
    /// Returns [`LocationError::InvalidInput`] if:
    /// - the request carries a `uuid`,
    /// - `parent_uuid` is missing or does not resolve,
    /// - no name is given, the name is blank or too long, or
    /// - another non-retired location already has the name.
    pub fn create(&self, req: CreateLocationReq) -> LocationResult<LocationJson> {
        if req.uuid.is_some() {
            return Err(LocationError::InvalidInput(
                "UUID is specified but not allowed".into(),
            ));
        }
        let parent_uuid = req.parent_uuid.ok_or_else(|| {
            LocationError::InvalidInput("Parent UUID is required but not specified".into())
        })?;

        let _guard = lock(&self.write_lock)?;

        let parent = self.resolve(&parent_uuid)?.ok_or_else(|| {
            LocationError::InvalidInput(format!(
                "No parent location found with UUID {parent_uuid}"
            ))
        })?;
        let name = self.validate_name(req.names.as_ref(), None)?;

        let location = Location::new(LocationId::generate(), name, Some(parent.id));
        self.gateway.save(&location)?;

        tracing::info!(
            "Created location {} \"{}\" under {}",
            location.id,
            location.name,
            parent_uuid
        );
        Ok(location.to_json(self.locale()))
    }

    /// Renames a location. Parent and retired flag are left untouched.
    ///
    /// Renaming a location to its current name succeeds: the uniqueness check ignores the target
    /// itself.
    ///
    /// # Errors
    ///
    /// Returns [`LocationError::NotFound`] if `id` does not resolve, and
    /// [`LocationError::InvalidInput`] for the same name problems as [`create`](Self::create).
    pub fn update(&self, id: &str, req: UpdateLocationReq) -> LocationResult<LocationJson> {
        let _guard = lock(&self.write_lock)?;

        let mut location = self
            .resolve(id)?
            .ok_or_else(|| LocationError::NotFound(format!("No location found with UUID {id}")))?;
        let name = self.validate_name(req.names.as_ref(), Some(&location.id))?;

        location.rename(name);
        self.gateway.save(&location)?;

        tracing::info!("Renamed location {} to \"{}\"", location.id, location.name);
        Ok(location.to_json(self.locale()))
    }

    /// Permanently deletes a location and its whole subtree.
    ///
    /// Every node in the subtree is checked against every patient before anything is removed;
    /// removal then runs children before parents.
    ///
    /// # Errors
    ///
    /// - [`LocationError::InvalidInput`] for the root or a protected zone (also when one sits
    ///   inside the subtree).
    /// - [`LocationError::NotFound`] if `id` does not resolve.
    /// - [`LocationError::ConstraintViolation`] naming the first node, in pre-order, that a
    ///   patient references. Nothing is removed in that case.
    /// - [`LocationError::InvariantViolation`] if the subtree contains a cycle.
    /// - A storage error if any location or patient record cannot be read. Nothing is removed.
    pub fn delete(&self, id: &str) -> LocationResult<()> {
        if id == ROOT_LOCATION_ID {
            return Err(LocationError::InvalidInput(
                "Cannot delete the root location".into(),
            ));
        }
        if let Some(zone) = zone_name(id) {
            return Err(LocationError::InvalidInput(format!(
                "Cannot delete the zone \"{zone}\""
            )));
        }

        let _guard = lock(&self.write_lock)?;

        let target = self
            .resolve(id)?
            .ok_or_else(|| LocationError::NotFound(format!("No location found with UUID {id}")))?;
        let target_name = target.name.clone();

        let subtree = self.tree().subtree(target).map_err(|e| {
            tracing::error!("delete of {} aborted: {}", id, e);
            e
        })?;

        if let Some(zone) = subtree.iter().find_map(|l| zone_name(l.id.as_str())) {
            return Err(LocationError::InvalidInput(format!(
                "Cannot delete the location \"{target_name}\" because it contains the zone \"{zone}\""
            )));
        }

        // One patient scan per delete, however large the subtree.
        let referenced: HashSet<String> = self
            .gateway
            .list_patients()?
            .into_iter()
            .flat_map(|p| p.location_values)
            .collect();

        if let Some(blocked) = subtree.iter().find(|l| referenced.contains(l.id.as_str())) {
            tracing::info!(
                "refusing to delete {}: patients assigned to {}",
                id,
                blocked.id
            );
            return Err(LocationError::ConstraintViolation {
                location_id: blocked.id.clone(),
                name: blocked.name.to_string(),
            });
        }

        for location in subtree.iter().rev() {
            self.gateway.purge(&location.id)?;
        }

        tracing::info!(
            "Deleted location {} \"{}\" and {} descendants",
            id,
            target_name,
            subtree.len() - 1
        );
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------------

    /// Resolves an externally supplied identifier. Malformed identifiers resolve to nothing.
    fn resolve(&self, id: &str) -> LocationResult<Option<Location>> {
        match LocationId::parse(id) {
            Ok(id) => self.gateway.get_by_id(&id),
            Err(_) => Ok(None),
        }
    }

    /// Picks the display name out of `names` and checks it against the naming rules.
    ///
    /// `exclude` is the location being renamed, which may keep its own name.
    fn validate_name(
        &self,
        names: Option<&BTreeMap<String, String>>,
        exclude: Option<&LocationId>,
    ) -> LocationResult<NonEmptyText> {
        let raw = names
            .and_then(|names| select_localised(names, self.locale()))
            .ok_or_else(|| LocationError::InvalidInput("No name specified for location".into()))?;

        let name = NonEmptyText::new(raw).map_err(|e| match e {
            TextError::Empty => {
                LocationError::InvalidInput("Empty name specified for location".into())
            }
            other => LocationError::InvalidInput(other.to_string()),
        })?;

        if let Some(duplicate) = self.gateway.get_by_name(name.as_str())? {
            if Some(&duplicate.id) != exclude {
                return Err(LocationError::InvalidInput(format!(
                    "Another location already has the name \"{name}\""
                )));
            }
        }

        Ok(name)
    }
}

fn lock(mutex: &Mutex<()>) -> LocationResult<MutexGuard<'_, ()>> {
    mutex.lock().map_err(|_| LocationError::LockPoisoned)
}
