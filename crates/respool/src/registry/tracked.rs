use std::collections::{BTreeMap, HashMap};

use crate::Resource;

/// Identifies one acquisition of an in-use handle. A handle that is
/// removed, added again and re-acquired gets a new lease.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lease(pub(super) u64);

/// The idle and in-use handles. A handle is never in both.
pub struct TrackedResources<R> {
    /// Idle handles keyed to their position in `idle_order`.
    idle: HashMap<R, u64>,
    /// Idle handles oldest first.
    idle_order: BTreeMap<u64, R>,
    in_use: HashMap<R, Lease>,
    next_position: u64,
    next_lease: u64,
}

impl<R: Resource> TrackedResources<R> {
    pub fn new() -> Self {
        Self {
            idle: HashMap::new(),
            idle_order: BTreeMap::new(),
            in_use: HashMap::new(),
            next_position: 0,
            next_lease: 0,
        }
    }

    pub fn contains(&self, resource: &R) -> bool {
        self.in_use.contains_key(resource) || self.idle.contains_key(resource)
    }

    pub fn remove(&mut self, resource: &R) -> bool {
        if let Some(position) = self.idle.remove(resource) {
            self.idle_order.remove(&position);
            return true;
        }
        self.in_use.remove(resource).is_some()
    }

    /// Moves the oldest idle handle to in-use.
    pub fn take_idle(&mut self) -> Option<(R, Lease)> {
        let (_, resource) = self.idle_order.pop_first()?;
        self.idle.remove(&resource);
        let lease = self.mark_in_use(resource.clone());
        Some((resource, lease))
    }

    pub fn push_idle(&mut self, resource: R) {
        let position = self.next_position;
        self.next_position += 1;
        self.idle_order.insert(position, resource.clone());
        self.idle.insert(resource, position);
    }

    pub fn mark_in_use(&mut self, resource: R) -> Lease {
        let lease = Lease(self.next_lease);
        self.next_lease += 1;
        self.in_use.insert(resource, lease);
        lease
    }

    pub fn unmark_in_use(&mut self, resource: &R) -> bool {
        self.in_use.remove(resource).is_some()
    }

    /// Like [`TrackedResources::unmark_in_use`], but only while the handle
    /// is still held under `lease`.
    pub fn unmark_leased(&mut self, resource: &R, lease: Lease) -> bool {
        if self.in_use.get(resource) != Some(&lease) {
            return false;
        }
        self.in_use.remove(resource);
        true
    }

    pub fn idle(&self) -> usize {
        self.idle.len()
    }

    pub fn in_use(&self) -> usize {
        self.in_use.len()
    }
}
