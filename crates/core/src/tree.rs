//! The location hierarchy over a [`PersistenceGateway`].
//!
//! Responsible for the fixed skeleton (root plus protected zones) and for walking the tree.
//! Walks are iterative with an explicit stack and a visited set, so deep trees cannot exhaust the
//! call stack and corrupted parent pointers cannot loop forever. Output order is pre-order with
//! siblings in gateway enumeration order.
//!
//! A walk loads every record once and indexes children by parent, so its storage cost is one
//! scan regardless of tree size.

use crate::constants::{ROOT_LOCATION_ID, ROOT_LOCATION_NAME, ZONES};
use crate::gateway::PersistenceGateway;
use crate::location::Location;
use crate::{LocationError, LocationResult};
use emc_types::NonEmptyText;
use emc_uuid::LocationId;
use std::collections::{HashMap, HashSet};

/// What a bootstrap run created. Empty when the skeleton was already complete.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BootstrapReport {
    pub created: Vec<LocationId>,
}

impl BootstrapReport {
    pub fn is_noop(&self) -> bool {
        self.created.is_empty()
    }
}

/// How a walk treats a node reached a second time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum OnRevisit {
    Skip,
    Fail,
}

pub struct LocationTree<'a> {
    gateway: &'a dyn PersistenceGateway,
}

impl<'a> LocationTree<'a> {
    pub fn new(gateway: &'a dyn PersistenceGateway) -> Self {
        Self { gateway }
    }

    pub fn root_id() -> LocationId {
        LocationId::from_static(ROOT_LOCATION_ID)
    }

    /// Creates the root and every zone that does not exist yet.
    ///
    /// Existing nodes are never modified, even if they have been renamed or re-parented.
    ///
    /// # Errors
    ///
    /// Propagates gateway failures. A failure part-way leaves the nodes created so far in place;
    /// re-running completes the skeleton.
    pub fn ensure_skeleton(&self) -> LocationResult<BootstrapReport> {
        let mut report = BootstrapReport::default();
        let root_id = Self::root_id();

        match self.gateway.get_by_id(&root_id)? {
            Some(root) => {
                if !root.is_root() {
                    tracing::warn!("root location {} has a parent; leaving as is", root_id);
                }
            }
            None => {
                tracing::info!("Creating root location {}", ROOT_LOCATION_NAME);
                let root = Location::new(
                    root_id.clone(),
                    NonEmptyText::new(ROOT_LOCATION_NAME)?,
                    None,
                );
                self.gateway.save(&root)?;
                report.created.push(root_id.clone());
            }
        }

        for &(name, id) in ZONES {
            let zone_id = LocationId::from_static(id);
            match self.gateway.get_by_id(&zone_id)? {
                Some(zone) => {
                    if zone.parent_id.as_ref() != Some(&root_id) {
                        tracing::warn!("zone {} is not a child of the root; leaving as is", name);
                    }
                }
                None => {
                    tracing::info!("Creating zone location {}", name);
                    let zone = Location::new(
                        zone_id.clone(),
                        NonEmptyText::new(name)?,
                        Some(root_id.clone()),
                    );
                    self.gateway.save(&zone)?;
                    report.created.push(zone_id);
                }
            }
        }

        Ok(report)
    }

    /// Loads the root.
    ///
    /// # Errors
    ///
    /// Returns [`LocationError::InvariantViolation`] if the root is missing, which cannot happen
    /// after a successful bootstrap unless storage was tampered with.
    pub fn root(&self) -> LocationResult<Location> {
        self.gateway.get_by_id(&Self::root_id())?.ok_or_else(|| {
            LocationError::InvariantViolation(format!(
                "the root location does not exist with UUID {ROOT_LOCATION_ID}"
            ))
        })
    }

    /// Pre-order walk from `start`, retired nodes included. Revisited nodes are logged and
    /// skipped.
    pub fn preorder(&self, start: Location) -> LocationResult<Vec<Location>> {
        self.walk(start, OnRevisit::Skip)
    }

    /// `start` and all its descendants in pre-order.
    ///
    /// # Errors
    ///
    /// Returns [`LocationError::InvariantViolation`] if a node is reached twice, meaning the
    /// parent pointers contain a cycle.
    pub fn subtree(&self, start: Location) -> LocationResult<Vec<Location>> {
        self.walk(start, OnRevisit::Fail)
    }

    fn children_index(&self) -> LocationResult<HashMap<LocationId, Vec<Location>>> {
        let mut index: HashMap<LocationId, Vec<Location>> = HashMap::new();
        for location in self.gateway.list_locations()? {
            if let Some(parent) = location.parent_id.clone() {
                index.entry(parent).or_default().push(location);
            }
        }
        Ok(index)
    }

    fn walk(&self, start: Location, on_revisit: OnRevisit) -> LocationResult<Vec<Location>> {
        let mut index = self.children_index()?;
        let mut out = Vec::new();
        let mut visited = HashSet::new();
        let mut stack = vec![start];

        while let Some(current) = stack.pop() {
            if !visited.insert(current.id.clone()) {
                match on_revisit {
                    OnRevisit::Skip => {
                        tracing::warn!("location {} reached twice; skipping", current.id);
                        continue;
                    }
                    OnRevisit::Fail => {
                        return Err(LocationError::InvariantViolation(format!(
                            "location {} is its own ancestor",
                            current.id
                        )));
                    }
                }
            }

            let children = index.remove(&current.id).unwrap_or_default();
            out.push(current);
            // Reverse so the first sibling is popped first.
            stack.extend(children.into_iter().rev());
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::TRIAGE_ZONE_ID;
    use crate::gateway::MemoryGateway;

    fn add(gw: &MemoryGateway, id: &'static str, name: &str, parent: &'static str) -> Location {
        let loc = Location::new(
            LocationId::from_static(id),
            NonEmptyText::new(name).unwrap(),
            Some(LocationId::from_static(parent)),
        );
        gw.save(&loc).unwrap();
        loc
    }

    fn ids(locations: &[Location]) -> Vec<&str> {
        locations.iter().map(|l| l.id.as_str()).collect()
    }

    #[test]
    fn test_ensure_skeleton_creates_root_and_zones() {
        let gw = MemoryGateway::new();
        let report = LocationTree::new(&gw).ensure_skeleton().unwrap();

        assert_eq!(report.created.len(), 1 + ZONES.len());
        assert_eq!(report.created[0].as_str(), ROOT_LOCATION_ID);
        assert_eq!(gw.location_count().unwrap(), 1 + ZONES.len());

        let children = gw.list_children(&LocationTree::root_id()).unwrap();
        let zone_ids: Vec<&str> = ZONES.iter().map(|(_, id)| *id).collect();
        assert_eq!(ids(&children), zone_ids);
    }

    #[test]
    fn test_ensure_skeleton_is_idempotent() {
        let gw = MemoryGateway::new();
        let tree = LocationTree::new(&gw);
        tree.ensure_skeleton().unwrap();
        let second = tree.ensure_skeleton().unwrap();

        assert!(second.is_noop());
        assert_eq!(gw.location_count().unwrap(), 1 + ZONES.len());
    }

    #[test]
    fn test_ensure_skeleton_fills_in_missing_zone_only() {
        let gw = MemoryGateway::new();
        let tree = LocationTree::new(&gw);
        tree.ensure_skeleton().unwrap();

        let mut triage = gw
            .get_by_id(&LocationId::from_static(TRIAGE_ZONE_ID))
            .unwrap()
            .unwrap();
        triage.rename(NonEmptyText::new("Triage (renamed)").unwrap());
        gw.save(&triage).unwrap();
        gw.purge(&LocationId::from_static(ZONES[1].1)).unwrap();

        let report = tree.ensure_skeleton().unwrap();
        assert_eq!(ids_of(&report), vec![ZONES[1].1]);

        let triage = gw
            .get_by_id(&LocationId::from_static(TRIAGE_ZONE_ID))
            .unwrap()
            .unwrap();
        assert_eq!(triage.name.as_str(), "Triage (renamed)");
    }

    fn ids_of(report: &BootstrapReport) -> Vec<&str> {
        report.created.iter().map(|id| id.as_str()).collect()
    }

    #[test]
    fn test_root_missing_is_invariant_violation() {
        let gw = MemoryGateway::new();
        let err = LocationTree::new(&gw).root().expect_err("root should be missing");
        assert!(matches!(err, LocationError::InvariantViolation(_)));
    }

    #[test]
    fn test_preorder_visits_parents_before_children() {
        let gw = MemoryGateway::new();
        let tree = LocationTree::new(&gw);
        let root = Location::new(
            LocationId::from_static("r"),
            NonEmptyText::new("R").unwrap(),
            None,
        );
        gw.save(&root).unwrap();
        add(&gw, "a", "A", "r");
        add(&gw, "b", "B", "r");
        add(&gw, "a1", "A1", "a");
        add(&gw, "a2", "A2", "a");
        add(&gw, "b1", "B1", "b");

        let order = tree.preorder(root).unwrap();
        assert_eq!(ids(&order), vec!["r", "a", "a1", "a2", "b", "b1"]);
    }

    #[test]
    fn test_cycle_is_skipped_by_preorder_and_rejected_by_subtree() {
        let gw = MemoryGateway::new();
        let tree = LocationTree::new(&gw);
        let x = add(&gw, "x", "X", "y");
        add(&gw, "y", "Y", "x");

        let order = tree.preorder(x.clone()).unwrap();
        assert_eq!(ids(&order), vec!["x", "y"]);

        let err = tree.subtree(x).expect_err("cycle should be rejected");
        assert!(matches!(err, LocationError::InvariantViolation(_)));
    }

    /// Counts scans made through the wrapped gateway.
    struct CountingGateway {
        inner: MemoryGateway,
        scans: std::sync::atomic::AtomicUsize,
    }

    impl CountingGateway {
        fn scans(&self) -> usize {
            self.scans.load(std::sync::atomic::Ordering::SeqCst)
        }

        fn count(&self) {
            self.scans.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        }
    }

    impl PersistenceGateway for CountingGateway {
        fn get_by_id(&self, id: &LocationId) -> LocationResult<Option<Location>> {
            self.inner.get_by_id(id)
        }

        fn get_by_name(&self, name: &str) -> LocationResult<Option<Location>> {
            self.inner.get_by_name(name)
        }

        fn save(&self, location: &Location) -> LocationResult<()> {
            self.inner.save(location)
        }

        fn purge(&self, id: &LocationId) -> LocationResult<()> {
            self.inner.purge(id)
        }

        fn list_locations(&self) -> LocationResult<Vec<Location>> {
            self.count();
            self.inner.list_locations()
        }

        fn list_children(&self, id: &LocationId) -> LocationResult<Vec<Location>> {
            self.count();
            self.inner.list_children(id)
        }

        fn list_patients(&self) -> LocationResult<Vec<crate::location::PatientRecord>> {
            self.inner.list_patients()
        }
    }

    #[test]
    fn test_walk_scans_storage_once() {
        let gw = CountingGateway {
            inner: MemoryGateway::new(),
            scans: Default::default(),
        };
        let tree = LocationTree::new(&gw);
        tree.ensure_skeleton().unwrap();
        for i in 0..50 {
            let loc = Location::new(
                LocationId::parse(&format!("tent-{i}")).unwrap(),
                NonEmptyText::new(format!("Tent {i}")).unwrap(),
                Some(LocationId::from_static(TRIAGE_ZONE_ID)),
            );
            gw.save(&loc).unwrap();
        }

        let order = tree.preorder(tree.root().unwrap()).unwrap();
        assert_eq!(order.len(), 1 + ZONES.len() + 50);
        assert_eq!(order[1].id.as_str(), TRIAGE_ZONE_ID);
        assert_eq!(order[2].id.as_str(), "tent-0");
        assert_eq!(order[51].id.as_str(), "tent-49");
        assert_eq!(gw.scans(), 1);
    }

    #[test]
    fn test_deep_tree_does_not_recurse() {
        let gw = MemoryGateway::new();
        let tree = LocationTree::new(&gw);
        let root = Location::new(
            LocationId::from_static("n0"),
            NonEmptyText::new("N0").unwrap(),
            None,
        );
        gw.save(&root).unwrap();

        let mut parent = root.id.clone();
        for depth in 1..2_000 {
            let loc = Location::new(
                LocationId::parse(&format!("n{depth}")).unwrap(),
                NonEmptyText::new(format!("N{depth}")).unwrap(),
                Some(parent),
            );
            gw.save(&loc).unwrap();
            parent = loc.id;
        }

        assert_eq!(tree.subtree(root).unwrap().len(), 2_000);
    }
}
