//! Engine - mounts data and methods onto a view tree.
//!
//! Construction does all the work, in this order:
//! 1. resolve the mount selector in the document
//! 2. wrap the data into a [`Store`]
//! 3. plan and wire the directives under the mount node
//!
//! Any failure aborts construction. There is no partially wired engine.
//!
//! # Example
//!
//! ```ignore
//! use spark_bind::{Engine, EngineOptions};
//! use spark_bind::dom::{Dom, Element};
//! use serde_json::json;
//!
//! let label = Element::new("span").attr("v-bind", "count");
//! let button = Element::new("button").attr("v-click", "inc");
//! let dom = Dom::new(
//!     Element::new("div").attr("id", "app").child(label.clone()).child(button.clone()),
//! );
//!
//! let options = EngineOptions::from_json("#app", json!({ "count": 0 }))?
//!     .method("inc", |data| {
//!         data.modify("count", |n| (n.as_number().unwrap_or(0.0) + 1.0).into())?;
//!         Ok(())
//!     });
//! let engine = Engine::new(&dom, options)?;
//!
//! button.click()?;
//! assert_eq!(label.content(), "1");
//! ```

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use tracing::debug;

use crate::compiler::{self, DirectiveNames, Wiring, DEFAULT_PREFIX};
use crate::error::{ConfigError, Result};
use crate::node::{Document, ViewNode};
use crate::store::Store;
use crate::value::{Record, Value};

// =============================================================================
// Methods
// =============================================================================

/// A user method. Receives the store explicitly.
pub type Method = Rc<dyn Fn(&Store) -> anyhow::Result<()>>;

/// Methods addressable by click directives.
pub type MethodTable = IndexMap<String, Method>;

// =============================================================================
// Options
// =============================================================================

/// Engine configuration.
///
/// Build with the chained setters or with struct update syntax:
///
/// ```ignore
/// let options = EngineOptions {
///     mount: "#app".into(),
///     directive_prefix: "data-".into(),
///     ..Default::default()
/// };
/// ```
#[derive(Clone)]
pub struct EngineOptions {
    /// Selector of the mount node.
    pub mount: String,
    /// Initial data. Its shape is fixed once the engine is built.
    pub data: Record,
    pub methods: MethodTable,
    /// Attribute prefix of the directives (`v-` gives `v-bind`, `v-model`, ...).
    pub directive_prefix: String,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            mount: String::new(),
            data: Record::new(),
            methods: MethodTable::new(),
            directive_prefix: DEFAULT_PREFIX.to_string(),
        }
    }
}

impl EngineOptions {
    pub fn new(mount: impl Into<String>) -> Self {
        Self {
            mount: mount.into(),
            ..Default::default()
        }
    }

    /// Options whose data comes from a JSON object.
    pub fn from_json(
        mount: impl Into<String>,
        data: serde_json::Value,
    ) -> std::result::Result<Self, ConfigError> {
        let data = Value::from(data)
            .into_object()
            .ok_or(ConfigError::DataNotObject)?;
        Ok(Self::new(mount).data(data))
    }

    pub fn data(mut self, data: Record) -> Self {
        self.data = data;
        self
    }

    /// Add a method, replacing any method of the same name.
    pub fn method<F>(mut self, name: impl Into<String>, method: F) -> Self
    where
        F: Fn(&Store) -> anyhow::Result<()> + 'static,
    {
        self.methods.insert(name.into(), Rc::new(method));
        self
    }

    pub fn directive_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.directive_prefix = prefix.into();
        self
    }
}

impl fmt::Debug for EngineOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineOptions")
            .field("mount", &self.mount)
            .field("data", &self.data)
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .field("directive_prefix", &self.directive_prefix)
            .finish()
    }
}

// =============================================================================
// Engine
// =============================================================================

pub struct Engine {
    mount: String,
    root: Rc<dyn ViewNode>,
    store: Rc<Store>,
    methods: MethodTable,
    names: DirectiveNames,
    wiring: Wiring,
}

impl Engine {
    /// Mount `options` onto the node selected by `options.mount`.
    pub fn new(document: &dyn Document, options: EngineOptions) -> Result<Self> {
        let EngineOptions {
            mount,
            data,
            methods,
            directive_prefix,
        } = options;

        let root = document
            .query(&mount)
            .ok_or_else(|| ConfigError::MountNotFound { selector: mount.clone() })?;
        let store = Rc::new(Store::wrap(data)?);

        let names = DirectiveNames::with_prefix(&directive_prefix);
        let instructions = compiler::plan(&root, &names);
        let wiring = compiler::wire(&instructions, &store, &methods)?;

        debug!(
            mount = %mount,
            paths = store.bindings().len(),
            observers = wiring.observers,
            "engine mounted"
        );

        Ok(Self {
            mount,
            root,
            store,
            methods,
            names,
            wiring,
        })
    }

    /// The reactive data.
    pub fn store(&self) -> &Rc<Store> {
        &self.store
    }

    /// The mount node.
    pub fn root(&self) -> &Rc<dyn ViewNode> {
        &self.root
    }

    pub fn mount(&self) -> &str {
        &self.mount
    }

    pub fn directive_names(&self) -> &DirectiveNames {
        &self.names
    }

    /// Summary of what construction wired.
    pub fn wiring(&self) -> Wiring {
        self.wiring
    }

    /// Total number of observers.
    pub fn observer_count(&self) -> usize {
        self.store.bindings().total_observers()
    }

    pub fn get(&self, dotted: &str) -> Option<Value> {
        self.store.get(dotted)
    }

    /// Write through the store. Returns `Ok(true)` if the value changed.
    pub fn set(&self, dotted: &str, value: impl Into<Value>) -> Result<bool> {
        Ok(self.store.set(dotted, value)?)
    }

    /// Invoke a method by name, as a click would.
    pub fn call(&self, name: &str) -> anyhow::Result<()> {
        let method = self
            .methods
            .get(name)
            .ok_or_else(|| crate::error::BindingError::UnknownMethod { name: name.to_string() })?;
        method(self.store.as_ref())
    }

    pub fn method_names(&self) -> impl Iterator<Item = &str> {
        self.methods.keys().map(String::as_str)
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("mount", &self.mount)
            .field("store", &self.store)
            .field("wiring", &self.wiring)
            .finish()
    }
}
