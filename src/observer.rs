//! Observer - pulls one data path into one view slot.
//!
//! An observer holds no value of its own. Attaching it pulls once; every
//! [`update`](Observer::update) pulls again and rewrites the slot, even when
//! the rendered text is unchanged.
//!
//! The node reference is weak. The host owns its tree; an observer whose node
//! has been dropped simply stops writing.

use std::fmt;
use std::rc::{Rc, Weak};

use tracing::trace;

use crate::error::BindingError;
use crate::node::{Slot, ViewNode};
use crate::path::PropertyPath;
use crate::store::Store;

/// Binding from a data path (source) to a node slot (sink).
#[derive(Clone)]
pub struct Observer {
    node: Weak<dyn ViewNode>,
    slot: Slot,
    path: PropertyPath,
}

impl Observer {
    /// Create an observer and perform the initial pull.
    ///
    /// Fails if `path` does not resolve in `store`.
    pub fn attach(
        node: &Rc<dyn ViewNode>,
        slot: Slot,
        path: PropertyPath,
        store: &Store,
    ) -> Result<Self, BindingError> {
        let observer = Self {
            node: Rc::downgrade(node),
            slot,
            path,
        };
        observer.update(store)?;
        Ok(observer)
    }

    /// Read the path from the store and write it into the slot.
    pub fn update(&self, store: &Store) -> Result<(), BindingError> {
        let Some(node) = self.node.upgrade() else {
            trace!(path = %self.path, "observer node dropped, skipping update");
            return Ok(());
        };
        let value = store
            .get_path(&self.path)
            .ok_or_else(|| BindingError::unknown_path(&self.path))?;
        trace!(path = %self.path, slot = self.slot.name(), "observer update");
        node.set_slot(self.slot, value.render());
        Ok(())
    }

    pub fn path(&self) -> &PropertyPath {
        &self.path
    }

    pub fn slot(&self) -> Slot {
        self.slot
    }

    /// Whether the sink node is still alive.
    pub fn is_attached(&self) -> bool {
        self.node.strong_count() > 0
    }
}

impl fmt::Debug for Observer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observer")
            .field("path", &self.path)
            .field("slot", &self.slot)
            .field("attached", &self.is_attached())
            .finish()
    }
}
