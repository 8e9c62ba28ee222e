//! Binding table - who cares about which path.
//!
//! Maps every wrapped [`PropertyPath`] to an ordered list of observer ids.
//! Observers themselves live in an arena owned by the table and are addressed
//! by [`ObserverId`].
//!
//! Registration order is firing order. An observer registered twice on the
//! same path fires twice.

use indexmap::IndexMap;

use crate::error::BindingError;
use crate::observer::Observer;
use crate::path::PropertyPath;

/// Index of an observer in the table's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObserverId(usize);

impl ObserverId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Observers registered for one path.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BindingEntry {
    observers: Vec<ObserverId>,
}

impl BindingEntry {
    /// Registered ids in firing order.
    pub fn observers(&self) -> &[ObserverId] {
        &self.observers
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

// =============================================================================
// BindingTable
// =============================================================================

#[derive(Debug, Default)]
pub struct BindingTable {
    entries: IndexMap<PropertyPath, BindingEntry>,
    arena: Vec<Observer>,
}

impl BindingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty entry for `path` if there is none.
    ///
    /// Returns true if an entry was created.
    pub fn ensure(&mut self, path: PropertyPath) -> bool {
        if self.entries.contains_key(&path) {
            return false;
        }
        self.entries.insert(path, BindingEntry::default());
        true
    }

    pub fn contains(&self, path: &PropertyPath) -> bool {
        self.entries.contains_key(path)
    }

    pub fn entry(&self, path: &PropertyPath) -> Option<&BindingEntry> {
        self.entries.get(path)
    }

    /// Store `observer` in the arena and append it to `path`'s entry.
    ///
    /// Entries are never created lazily: `path` must have been ensured.
    pub fn register(
        &mut self,
        path: &PropertyPath,
        observer: Observer,
    ) -> Result<ObserverId, BindingError> {
        let entry = self
            .entries
            .get_mut(path)
            .ok_or_else(|| BindingError::unknown_path(path))?;
        let id = ObserverId(self.arena.len());
        self.arena.push(observer);
        entry.observers.push(id);
        Ok(id)
    }

    /// Append an already registered observer to `path`'s entry again.
    pub fn subscribe(&mut self, path: &PropertyPath, id: ObserverId) -> Result<(), BindingError> {
        if id.0 >= self.arena.len() {
            return Err(BindingError::unknown_path(path));
        }
        let entry = self
            .entries
            .get_mut(path)
            .ok_or_else(|| BindingError::unknown_path(path))?;
        entry.observers.push(id);
        Ok(())
    }

    /// Snapshot of the observers registered at `path`, in firing order.
    pub fn subscribers(&self, path: &PropertyPath) -> Vec<Observer> {
        self.entries
            .get(path)
            .map(|entry| {
                entry
                    .observers
                    .iter()
                    .map(|id| self.arena[id.0].clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn observer(&self, id: ObserverId) -> Option<&Observer> {
        self.arena.get(id.0)
    }

    /// Number of registrations at `path`.
    pub fn observer_count(&self, path: &PropertyPath) -> usize {
        self.entries.get(path).map_or(0, BindingEntry::len)
    }

    /// Number of observers in the arena.
    pub fn total_observers(&self) -> usize {
        self.arena.len()
    }

    /// Paths in the order their entries were created.
    pub fn paths(&self) -> impl Iterator<Item = &PropertyPath> {
        self.entries.keys()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
