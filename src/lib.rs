//! # spark-bind
//!
//! Reactive data binding for directive-annotated view trees.
//!
//! Built on [spark-signals](https://github.com/RLabs-Inc/spark-signals) for the
//! reactive slots of the in-memory [`dom`].
//!
//! ## Architecture
//!
//! A data record is wrapped into a [`Store`]. Every property path gets a binding
//! entry when the store is built, and observers subscribe to those entries.
//! Writes that change a value push the new value to the observers of exactly
//! that path:
//! ```text
//! Store::set → BindingTable::subscribers → Observer::update → ViewNode::set_slot
//! ```
//!
//! The [`compiler`] walks the view tree under the mount node and turns
//! directives into observers and event listeners:
//!
//! - `v-bind="path"` - one-way, data to content
//! - `v-model="path"` - two-way, data to value and input back to data
//! - `v-click="method"` - calls a method with the store
//! - `v-for="item in list"` - recognised, not expanded
//!
//! ## Modules
//!
//! - [`path`] - Flat keys for nested property paths
//! - [`value`] - Dynamic values held by the store
//! - [`store`] - Reactive store and change notification
//! - [`binding`] - Path to observer table
//! - [`observer`] - Pushes values into node slots
//! - [`compiler`] - Directive scanning and wiring
//! - [`engine`] - Mounts options onto a document
//! - [`node`] - View tree abstraction
//! - [`dom`] - In-memory view tree

pub mod binding;
pub mod compiler;
pub mod dom;
pub mod engine;
pub mod error;
pub mod node;
pub mod observer;
pub mod path;
pub mod store;
pub mod value;

pub use binding::{BindingEntry, BindingTable, ObserverId};
pub use compiler::{Directive, DirectiveNames, DirectiveSet, ForEach, Wiring};
pub use engine::{Engine, EngineOptions, Method, MethodTable};
pub use error::{BindingError, ConfigError, Error, Result};
pub use node::{Document, EventHandler, EventKind, NodeKind, Slot, ViewNode};
pub use observer::Observer;
pub use path::PropertyPath;
pub use store::Store;
pub use value::{Record, Value};
