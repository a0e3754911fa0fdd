//! Bookkeeping sets used by the collision handler
//!
//! Both registers are ordered so iteration, and with it candidate
//! evaluation and callback order, is the same every run.

use std::collections::BTreeSet;
use std::mem;

use crate::physics::collider::ColliderHandle;

/// Set of live objects with deferred additions and removals
///
/// `add` and `remove` only queue the change; [`ObjectRegister::process`]
/// applies removals first, then additions. A removal queued in the same
/// batch as an addition of the same object cancels that addition.
#[derive(Debug, Clone)]
pub struct ObjectRegister<T> {
    all: BTreeSet<T>,
    holding: Vec<T>,
    removing: Vec<T>,
}

/// Result of flushing an [`ObjectRegister`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterChanges<T> {
    /// Objects that left the set
    pub removed: Vec<T>,
    /// Objects that joined the set
    pub added: Vec<T>,
    /// Queued additions withdrawn by a removal in the same batch
    pub cancelled: Vec<T>,
}

impl<T> Default for RegisterChanges<T> {
    fn default() -> Self {
        Self {
            removed: Vec::new(),
            added: Vec::new(),
            cancelled: Vec::new(),
        }
    }
}

impl<T: Ord + Copy> ObjectRegister<T> {
    /// Empty register sized for roughly `capacity` objects
    pub fn new(capacity: usize) -> Self {
        Self {
            all: BTreeSet::new(),
            holding: Vec::with_capacity(capacity / 4),
            removing: Vec::with_capacity(capacity / 4),
        }
    }

    /// Queue an addition
    pub fn add(&mut self, object: T) {
        self.holding.push(object);
    }

    /// Queue an addition for every object
    pub fn add_range<I: IntoIterator<Item = T>>(&mut self, objects: I) {
        self.holding.extend(objects);
    }

    /// Queue a removal
    pub fn remove(&mut self, object: T) {
        self.removing.push(object);
    }

    /// Queue a removal for every object
    pub fn remove_range<I: IntoIterator<Item = T>>(&mut self, objects: I) {
        self.removing.extend(objects);
    }

    /// Apply queued removals, then queued additions
    ///
    /// Only objects whose membership actually changed are reported.
    pub fn process(&mut self) -> RegisterChanges<T> {
        let mut changes = RegisterChanges::default();
        let mut removing = mem::take(&mut self.removing);
        for object in &removing {
            if self.all.remove(object) {
                changes.removed.push(*object);
            }
        }
        for object in self.holding.drain(..) {
            if removing.contains(&object) {
                if !changes.cancelled.contains(&object) {
                    changes.cancelled.push(object);
                }
            } else if self.all.insert(object) {
                changes.added.push(object);
            }
        }
        removing.clear();
        self.removing = removing;
        changes
    }

    /// Are there queued changes
    pub fn has_pending(&self) -> bool {
        !self.holding.is_empty() || !self.removing.is_empty()
    }

    /// Is the object live (queued changes not counted)
    pub fn contains(&self, object: &T) -> bool {
        self.all.contains(object)
    }

    /// Is a removal queued for the object
    pub fn is_removal_pending(&self, object: &T) -> bool {
        self.removing.contains(object)
    }

    /// Live objects in order
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.all.iter()
    }

    /// Snapshot of the live objects
    pub fn to_vec(&self) -> Vec<T> {
        self.all.iter().copied().collect()
    }

    /// Number of live objects
    pub fn len(&self) -> usize {
        self.all.len()
    }

    /// No live objects
    pub fn is_empty(&self) -> bool {
        self.all.is_empty()
    }

    /// Drop everything, queued changes included; returns the live objects
    pub fn clear(&mut self) -> Vec<T> {
        self.holding.clear();
        self.removing.clear();
        mem::take(&mut self.all).into_iter().collect()
    }
}

/// Ordered `(collider, other)` overlap pairs
#[derive(Debug, Clone, Default)]
pub struct OverlapRegister {
    entries: BTreeSet<(ColliderHandle, ColliderHandle)>,
}

impl OverlapRegister {
    /// Empty register
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a pair; false if it was already present
    pub fn add_entry(&mut self, collider: ColliderHandle, other: ColliderHandle) -> bool {
        self.entries.insert((collider, other))
    }

    /// Remove a pair; false if it was absent
    pub fn remove_entry(&mut self, collider: ColliderHandle, other: ColliderHandle) -> bool {
        self.entries.remove(&(collider, other))
    }

    /// Is the pair present
    pub fn contains(&self, collider: ColliderHandle, other: ColliderHandle) -> bool {
        self.entries.contains(&(collider, other))
    }

    /// Pairs in order
    pub fn iter(&self) -> impl Iterator<Item = &(ColliderHandle, ColliderHandle)> {
        self.entries.iter()
    }

    /// Take every pair out, leaving the register empty
    pub fn drain(&mut self) -> Vec<(ColliderHandle, ColliderHandle)> {
        mem::take(&mut self.entries).into_iter().collect()
    }

    /// Exchange contents with another register
    pub fn swap(&mut self, other: &mut OverlapRegister) {
        mem::swap(&mut self.entries, &mut other.entries);
    }

    /// Number of pairs
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// No pairs
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every pair
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
