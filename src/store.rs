//! Reactive store - the data object with intercepted reads and writes.
//!
//! [`Store::wrap`] walks the data once and creates a binding entry for every
//! property at every depth. From then on the shape is fixed: every read goes
//! through [`Store::get`] and every write through [`Store::set`], which
//! compares old and new value and, only on a change, notifies the observers
//! registered at that exact path.
//!
//! # Shape
//!
//! Keys that did not exist at wrap time can still be written, but they are
//! inert: the value is stored and readable, no observer can bind to it and no
//! notification is sent. Replacing an object with another object notifies the
//! observers of the object's own path only.
//!
//! # Reentrancy
//!
//! No borrow is held while observers run, so an observer (or a method invoked
//! by a click) may read and write the store. Cycles terminate because writing
//! an equal value is a no-op.
//!
//! # Example
//!
//! ```ignore
//! use spark_bind::Store;
//! use serde_json::json;
//!
//! let store = Store::from_json(json!({ "user": { "name": "Ada" } }))?;
//! store.set("user.name", "Grace")?;
//! assert_eq!(store.get("user.name"), Some("Grace".into()));
//! ```

use std::cell::{Ref, RefCell};
use std::rc::Rc;

use tracing::{debug, trace};

use crate::binding::{BindingTable, ObserverId};
use crate::error::{BindingError, ConfigError};
use crate::node::{Slot, ViewNode};
use crate::observer::Observer;
use crate::path::{self, PropertyPath};
use crate::value::{Record, Value};

pub struct Store {
    data: RefCell<Record>,
    bindings: RefCell<BindingTable>,
}

impl Store {
    /// Wrap `data`, creating one binding entry per property path.
    ///
    /// Nested objects are wrapped right after their own entry, so entries are
    /// created in depth-first order: `a`, `a&b`, `a&b&c`, then `a`'s siblings.
    pub fn wrap(data: Record) -> Result<Self, ConfigError> {
        let mut bindings = BindingTable::new();
        wrap_record(&data, None, &mut bindings)?;
        debug!(paths = bindings.len(), "wrapped data store");

        Ok(Self {
            data: RefCell::new(data),
            bindings: RefCell::new(bindings),
        })
    }

    /// Wrap a JSON object.
    pub fn from_json(json: serde_json::Value) -> Result<Self, ConfigError> {
        let record = Value::from(json)
            .into_object()
            .ok_or(ConfigError::DataNotObject)?;
        Self::wrap(record)
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Read a dotted path. `None` if the path is invalid or does not resolve.
    pub fn get(&self, dotted: &str) -> Option<Value> {
        let path = PropertyPath::parse(dotted).ok()?;
        self.get_path(&path)
    }

    pub fn get_path(&self, path: &PropertyPath) -> Option<Value> {
        lookup(&self.data.borrow(), path).cloned()
    }

    /// Clone of the whole data object.
    pub fn snapshot(&self) -> Record {
        self.data.borrow().clone()
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Write a dotted path.
    ///
    /// Returns `Ok(true)` if the stored value changed.
    pub fn set(&self, dotted: &str, value: impl Into<Value>) -> Result<bool, BindingError> {
        let path = PropertyPath::parse(dotted)?;
        self.set_path(&path, value.into())
    }

    pub fn set_path(&self, path: &PropertyPath, value: Value) -> Result<bool, BindingError> {
        let changed = {
            let mut data = self.data.borrow_mut();
            let record = match path.parent() {
                None => &mut *data,
                Some(parent) => lookup_mut(&mut data, &parent)
                    .and_then(Value::as_object_mut)
                    .ok_or_else(|| BindingError::unknown_path(path))?,
            };

            match record.get_mut(path.leaf()) {
                Some(current) if *current == value => false,
                Some(current) => {
                    *current = value;
                    true
                }
                None => {
                    debug!(path = %path, "write to key added after wrap, not observed");
                    record.insert(path.leaf().to_string(), value);
                    return Ok(true);
                }
            }
        };

        if changed {
            self.notify(path)?;
        }
        Ok(changed)
    }

    /// Read-modify-write a dotted path.
    pub fn modify(
        &self,
        dotted: &str,
        f: impl FnOnce(&Value) -> Value,
    ) -> Result<bool, BindingError> {
        let path = PropertyPath::parse(dotted)?;
        let current = self
            .get_path(&path)
            .ok_or_else(|| BindingError::unknown_path(&path))?;
        self.set_path(&path, f(&current))
    }

    // =========================================================================
    // Observers
    // =========================================================================

    /// Attach an observer to `path` and register it.
    ///
    /// The path must have been wrapped; the observer pulls once before it is
    /// registered.
    pub fn observe(
        &self,
        node: &Rc<dyn ViewNode>,
        slot: Slot,
        path: &PropertyPath,
    ) -> Result<ObserverId, BindingError> {
        if !self.bindings.borrow().contains(path) {
            return Err(BindingError::unknown_path(path));
        }
        let observer = Observer::attach(node, slot, path.clone(), self)?;
        self.bindings.borrow_mut().register(path, observer)
    }

    /// Update every observer registered at `path`, in registration order.
    ///
    /// Observers registered while the fan-out runs wait for the next change.
    /// Returns the number of updates performed.
    pub fn notify(&self, path: &PropertyPath) -> Result<usize, BindingError> {
        let observers = self.bindings.borrow().subscribers(path);
        trace!(path = %path, observers = observers.len(), "notify");
        for observer in &observers {
            observer.update(self)?;
        }
        Ok(observers.len())
    }

    /// The binding table, for inspection.
    pub fn bindings(&self) -> Ref<'_, BindingTable> {
        self.bindings.borrow()
    }

    /// Register an existing observer at `path` once more. It fires once per
    /// registration.
    pub fn subscribe(&self, path: &PropertyPath, id: ObserverId) -> Result<(), BindingError> {
        self.bindings.borrow_mut().subscribe(path, id)
    }

    /// Wrapped paths in entry order.
    pub fn paths(&self) -> Vec<PropertyPath> {
        self.bindings.borrow().paths().cloned().collect()
    }

    /// Number of registrations at a dotted path.
    pub fn observer_count(&self, dotted: &str) -> usize {
        PropertyPath::parse(dotted)
            .map_or(0, |path| self.bindings.borrow().observer_count(&path))
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("data", &self.data.borrow())
            .field("paths", &self.bindings.borrow().len())
            .finish()
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn wrap_record(
    record: &Record,
    parent: Option<&PropertyPath>,
    bindings: &mut BindingTable,
) -> Result<(), ConfigError> {
    for (key, value) in record {
        if !path::is_valid_name(key) {
            return Err(ConfigError::InvalidPropertyName { name: key.clone() });
        }
        let path = match parent {
            Some(parent) => parent.child(key),
            None => PropertyPath::root(key),
        };
        bindings.ensure(path.clone());

        if let Value::Object(nested) = value {
            wrap_record(nested, Some(&path), bindings)?;
        }
    }
    Ok(())
}

fn lookup<'a>(record: &'a Record, path: &PropertyPath) -> Option<&'a Value> {
    let mut segments = path.segments();
    let mut current = record.get(segments.next()?)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

fn lookup_mut<'a>(record: &'a mut Record, path: &PropertyPath) -> Option<&'a mut Value> {
    let mut segments = path.segments();
    let mut current = record.get_mut(segments.next()?)?;
    for segment in segments {
        current = current.as_object_mut()?.get_mut(segment)?;
    }
    Some(current)
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::dom::Element;
    use proptest::prelude::*;
    use serde_json::json;
    use tracing_test::traced_test;

    fn keys(store: &Store) -> Vec<String> {
        store.paths().iter().map(|p| p.as_key().to_string()).collect()
    }

    /// Bind `count` spans to `dotted` and return them.
    fn bind(store: &Store, dotted: &str, count: usize) -> Vec<Rc<Element>> {
        let path = PropertyPath::parse(dotted).unwrap();
        (0..count)
            .map(|_| {
                let element = Element::new("span");
                let node: Rc<dyn ViewNode> = element.clone();
                store.observe(&node, Slot::Content, &path).unwrap();
                element
            })
            .collect()
    }

    #[test]
    fn test_nested_paths_create_three_entries() {
        let store = Store::from_json(json!({ "a": { "b": { "c": 1 } } })).unwrap();
        assert_eq!(keys(&store), vec!["a", "a&b", "a&b&c"]);
    }

    #[test]
    fn test_entries_follow_depth_first_order() {
        let store = Store::from_json(json!({
            "user": { "name": "Ada", "tags": ["x"] },
            "count": 0
        }))
        .unwrap();
        assert_eq!(
            keys(&store),
            vec!["user", "user&name", "user&tags", "user&tags&0", "count"]
        );
    }

    #[test]
    fn test_wrap_rejects_separator_in_names() {
        let err = Store::from_json(json!({ "a&b": 1 })).unwrap_err();
        assert_eq!(err, ConfigError::InvalidPropertyName { name: "a&b".into() });

        let err = Store::from_json(json!({ "a": { "b.c": 1 } })).unwrap_err();
        assert_eq!(err, ConfigError::InvalidPropertyName { name: "b.c".into() });
    }

    #[test]
    fn test_wrap_requires_object() {
        assert_eq!(Store::from_json(json!(3)).unwrap_err(), ConfigError::DataNotObject);
    }

    #[test]
    fn test_get_nested() {
        let store = Store::from_json(json!({ "a": { "b": { "c": 1 } } })).unwrap();
        assert_eq!(store.get("a.b.c"), Some(Value::from(1)));
        assert!(store.get("a.b").unwrap().is_object());
        assert_eq!(store.get("a.x"), None);
        assert_eq!(store.get("a.b.c.d"), None);
        assert_eq!(store.get("a..b"), None);
    }

    #[test]
    fn test_change_notifies_in_registration_order() {
        let store = Store::from_json(json!({ "count": 0 })).unwrap();
        let spans = bind(&store, "count", 3);

        assert!(store.set("count", 5).unwrap());
        for span in &spans {
            assert_eq!(span.content(), "5");
            // one initial pull plus one update
            assert_eq!(span.slot_writes(), 2);
        }
    }

    #[test]
    fn test_same_value_is_silent() {
        let store = Store::from_json(json!({ "count": 0 })).unwrap();
        let spans = bind(&store, "count", 2);

        assert!(!store.set("count", 0).unwrap());
        for span in &spans {
            assert_eq!(span.slot_writes(), 1);
        }
    }

    #[test]
    fn test_nested_write_notifies_only_exact_path() {
        let store = Store::from_json(json!({ "a": { "b": { "c": 1 } } })).unwrap();
        let a = bind(&store, "a", 1);
        let ab = bind(&store, "a.b", 1);
        let abc = bind(&store, "a.b.c", 1);

        store.set("a.b.c", 2).unwrap();

        assert_eq!(a[0].slot_writes(), 1);
        assert_eq!(ab[0].slot_writes(), 1);
        assert_eq!(abc[0].slot_writes(), 2);
        assert_eq!(abc[0].content(), "2");
    }

    #[test]
    #[traced_test]
    fn test_new_key_is_inert() {
        let store = Store::from_json(json!({ "user": { "name": "Ada" } })).unwrap();
        let user = bind(&store, "user", 1);

        assert!(store.set("user.email", "ada@example.com").unwrap());
        assert_eq!(store.get("user.email"), Some(Value::from("ada@example.com")));
        assert_eq!(store.observer_count("user.email"), 0);
        assert_eq!(user[0].slot_writes(), 1);

        let node: Rc<dyn ViewNode> = Element::new("span");
        let path = PropertyPath::parse("user.email").unwrap();
        assert!(store.observe(&node, Slot::Content, &path).is_err());
        assert!(logs_contain("write to key added after wrap"));
    }

    #[test]
    fn test_write_under_scalar_fails() {
        let store = Store::from_json(json!({ "count": 0 })).unwrap();
        let err = store.set("count.inner", 1).unwrap_err();
        assert_eq!(err, BindingError::UnknownPath { path: "count.inner".into() });
    }

    #[test]
    fn test_replacing_object_notifies_object_path_only() {
        let store = Store::from_json(json!({ "a": { "b": 1 } })).unwrap();
        let a = bind(&store, "a", 1);
        let ab = bind(&store, "a.b", 1);

        store
            .set_path(&PropertyPath::parse("a").unwrap(), Value::from(json!({ "b": 2 })))
            .unwrap();

        assert_eq!(a[0].content(), r#"{"b":2}"#);
        assert_eq!(ab[0].slot_writes(), 1);
        assert_eq!(store.get("a.b"), Some(Value::from(2)));
    }

    #[test]
    fn test_modify() {
        let store = Store::from_json(json!({ "count": 1 })).unwrap();
        let spans = bind(&store, "count", 1);

        store
            .modify("count", |v| Value::from(v.as_number().unwrap_or(0.0) + 1.0))
            .unwrap();
        assert_eq!(spans[0].content(), "2");
        assert!(store.modify("missing", |v| v.clone()).is_err());
    }

    #[test]
    fn test_observer_may_write_back() {
        // An observer's node writes into the store while notify runs.
        let store = Rc::new(Store::from_json(json!({ "a": 0, "b": 0 })).unwrap());
        let a_path = PropertyPath::parse("a").unwrap();

        let element = Element::new("span");
        let node: Rc<dyn ViewNode> = element.clone();
        store.observe(&node, Slot::Content, &a_path).unwrap();

        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_clone = seen.clone();
        let store_clone = store.clone();
        element.on_slot_write(move |value| {
            seen_clone.borrow_mut().push(value.to_string());
            store_clone.set("b", value).unwrap();
        });

        store.set("a", 7).unwrap();
        assert_eq!(store.get("b"), Some(Value::from("7")));
        assert_eq!(*seen.borrow(), vec!["7"]);
    }

    #[test]
    fn test_duplicate_registration_fires_twice() {
        let store = Store::from_json(json!({ "n": 0 })).unwrap();
        let path = PropertyPath::parse("n").unwrap();
        let element = Element::new("span");
        let node: Rc<dyn ViewNode> = element.clone();

        let id = store.observe(&node, Slot::Content, &path).unwrap();
        store.subscribe(&path, id).unwrap();

        assert_eq!(store.notify(&path).unwrap(), 2);
        store.set("n", 1).unwrap();
        // initial pull + explicit notify x2 + change x2
        assert_eq!(element.slot_writes(), 5);
    }

    #[test]
    fn test_subscribe_during_notify_waits_for_next_change() {
        let store = Rc::new(Store::from_json(json!({ "n": 0 })).unwrap());
        let path = PropertyPath::parse("n").unwrap();
        let element = Element::new("span");
        let node: Rc<dyn ViewNode> = element.clone();
        let id = store.observe(&node, Slot::Content, &path).unwrap();

        let done = Rc::new(std::cell::Cell::new(false));
        let (store_clone, path_clone, done_clone) = (store.clone(), path.clone(), done.clone());
        element.on_slot_write(move |_| {
            if !done_clone.replace(true) {
                store_clone.subscribe(&path_clone, id).unwrap();
            }
        });

        store.set("n", 1).unwrap();
        assert_eq!(element.slot_writes(), 2);
        assert_eq!(store.observer_count("n"), 2);

        store.set("n", 2).unwrap();
        assert_eq!(element.slot_writes(), 4);
    }

    proptest! {
        #[test]
        fn change_fires_each_observer_once(v1 in any::<i32>(), v2 in any::<i32>(), n in 1usize..5) {
            prop_assume!(v1 != v2);
            let store = Store::from_json(json!({ "value": v1 })).unwrap();
            let spans = bind(&store, "value", n);

            prop_assert!(store.set("value", v2).unwrap());
            for span in &spans {
                prop_assert_eq!(span.slot_writes(), 2);
                prop_assert_eq!(span.content(), v2.to_string());
            }
        }

        #[test]
        fn equal_write_fires_nothing(v in "[a-z]{0,8}", n in 1usize..5) {
            let store = Store::from_json(json!({ "value": v.clone() })).unwrap();
            let spans = bind(&store, "value", n);

            prop_assert!(!store.set("value", v).unwrap());
            for span in &spans {
                prop_assert_eq!(span.slot_writes(), 1);
            }
        }
    }
}
