//! Directive compiler - turns annotated view nodes into bindings.
//!
//! Compilation runs in two passes over a view tree whose data has already
//! been wrapped:
//!
//! 1. [`plan`] walks the mount node's descendants depth-first (children before
//!    their parent) and emits one [`Instruction`] per directive found.
//! 2. [`wire`] checks every instruction against the store and the method
//!    table, then installs observers and listeners. Nothing is installed
//!    unless every instruction checks out.
//!
//! # Directives
//!
//! With the default `v-` prefix:
//!
//! | Attribute | Value | Wiring |
//! |-----------|-------|--------|
//! | `v-click` | method name | click listener calling the method with the store |
//! | `v-model` | dotted path | value-slot observer + input listener writing back (inputs and textareas only) |
//! | `v-bind`  | dotted path | content-slot observer |
//! | `v-for`   | `item[, index] in list` | parsed, not wired |
//!
//! A node may carry several directives; they are emitted in the order above.

use std::rc::Rc;

use tracing::{debug, warn};

use crate::engine::MethodTable;
use crate::error::BindingError;
use crate::node::{EventHandler, EventKind, Slot, ViewNode};
use crate::path::{self, PropertyPath};
use crate::store::Store;
use crate::value::Value;

// =============================================================================
// Directive Names
// =============================================================================

/// Default attribute prefix.
pub const DEFAULT_PREFIX: &str = "v-";

/// Attribute names of the directives, derived from a prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectiveNames {
    pub click: String,
    pub model: String,
    pub bind: String,
    pub for_each: String,
}

impl DirectiveNames {
    pub fn with_prefix(prefix: &str) -> Self {
        Self {
            click: format!("{prefix}click"),
            model: format!("{prefix}model"),
            bind: format!("{prefix}bind"),
            for_each: format!("{prefix}for"),
        }
    }
}

impl Default for DirectiveNames {
    fn default() -> Self {
        Self::with_prefix(DEFAULT_PREFIX)
    }
}

bitflags::bitflags! {
    /// Which directives a node carries.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct DirectiveSet: u8 {
        const CLICK = 1 << 0;
        const MODEL = 1 << 1;
        const BIND = 1 << 2;
        const FOR_EACH = 1 << 3;
    }
}

impl DirectiveSet {
    /// Scan a node's attributes.
    pub fn of(node: &dyn ViewNode, names: &DirectiveNames) -> Self {
        let mut set = DirectiveSet::empty();
        set.set(DirectiveSet::CLICK, node.has_attribute(&names.click));
        set.set(DirectiveSet::MODEL, node.has_attribute(&names.model));
        set.set(DirectiveSet::BIND, node.has_attribute(&names.bind));
        set.set(DirectiveSet::FOR_EACH, node.has_attribute(&names.for_each));
        set
    }
}

// =============================================================================
// Directives
// =============================================================================

/// A parsed `item[, index] in list` expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForEach {
    pub item: String,
    pub index: Option<String>,
    pub list: PropertyPath,
}

impl ForEach {
    /// Parse `item in list`, `item, index in list` or `(item, index) in list`.
    pub fn parse(expression: &str) -> Option<Self> {
        let (bindings, list) = expression.split_once(" in ")?;
        let bindings = bindings.trim();
        let bindings = bindings
            .strip_prefix('(')
            .and_then(|b| b.strip_suffix(')'))
            .unwrap_or(bindings);

        let mut names = bindings.split(',').map(str::trim);
        let item = names.next().filter(|name| path::is_valid_name(name))?;
        let index = match names.next() {
            Some(name) if path::is_valid_name(name) => Some(name.to_string()),
            Some(_) => return None,
            None => None,
        };
        if names.next().is_some() {
            return None;
        }

        Some(Self {
            item: item.to_string(),
            index,
            list: PropertyPath::parse(list).ok()?,
        })
    }
}

/// One directive as written on a node. Values are trimmed, not yet resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    Click { method: String },
    Model { path: String },
    Bind { path: String },
    ForEach { expression: String },
}

/// A directive together with the node it sits on.
#[derive(Clone)]
pub struct Instruction {
    pub node: Rc<dyn ViewNode>,
    pub directive: Directive,
}

impl std::fmt::Debug for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Instruction")
            .field("tag", &self.node.tag())
            .field("directive", &self.directive)
            .finish()
    }
}

// =============================================================================
// Plan
// =============================================================================

/// Collect the instructions for every descendant of `root`.
///
/// `root` itself is the mount point and is not scanned.
pub fn plan(root: &Rc<dyn ViewNode>, names: &DirectiveNames) -> Vec<Instruction> {
    let mut instructions = Vec::new();
    plan_children(root.as_ref(), names, &mut instructions);
    instructions
}

fn plan_children(parent: &dyn ViewNode, names: &DirectiveNames, out: &mut Vec<Instruction>) {
    for node in parent.children() {
        plan_children(node.as_ref(), names, out);
        plan_node(&node, names, out);
    }
}

fn plan_node(node: &Rc<dyn ViewNode>, names: &DirectiveNames, out: &mut Vec<Instruction>) {
    let set = DirectiveSet::of(node.as_ref(), names);
    if set.is_empty() {
        return;
    }

    let value = |name: &str| node.attribute(name).unwrap_or_default().trim().to_string();
    let mut push = |directive: Directive| {
        out.push(Instruction {
            node: node.clone(),
            directive,
        })
    };

    if set.contains(DirectiveSet::CLICK) {
        push(Directive::Click { method: value(&names.click) });
    }
    if set.contains(DirectiveSet::MODEL) {
        push(Directive::Model { path: value(&names.model) });
    }
    if set.contains(DirectiveSet::BIND) {
        push(Directive::Bind { path: value(&names.bind) });
    }
    if set.contains(DirectiveSet::FOR_EACH) {
        push(Directive::ForEach { expression: value(&names.for_each) });
    }
}

// =============================================================================
// Wire
// =============================================================================

/// What [`wire`] installed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Wiring {
    pub observers: usize,
    pub click_listeners: usize,
    pub input_listeners: usize,
    /// Recognized directives that install nothing (`v-for`).
    pub inert: usize,
}

/// Install observers and listeners for `instructions`.
///
/// Every instruction is checked first; on error nothing has been installed.
pub fn wire(
    instructions: &[Instruction],
    store: &Rc<Store>,
    methods: &MethodTable,
) -> Result<Wiring, BindingError> {
    for instruction in instructions {
        check(instruction, store, methods)?;
    }

    let mut wiring = Wiring::default();
    for Instruction { node, directive } in instructions {
        match directive {
            Directive::Click { method } => {
                wire_click(node, method, store, methods)?;
                wiring.click_listeners += 1;
            }
            Directive::Model { path } => {
                wire_model(node, &PropertyPath::parse(path)?, store)?;
                wiring.observers += 1;
                wiring.input_listeners += 1;
            }
            Directive::Bind { path } => {
                store.observe(node, Slot::Content, &PropertyPath::parse(path)?)?;
                wiring.observers += 1;
            }
            Directive::ForEach { expression } => {
                match ForEach::parse(expression) {
                    Some(for_each) => debug!(
                        item = %for_each.item,
                        list = %for_each.list,
                        "list rendering is not supported, directive ignored"
                    ),
                    None => warn!(expression = %expression, "malformed for-each expression ignored"),
                }
                wiring.inert += 1;
            }
        }
    }

    debug!(
        instructions = instructions.len(),
        observers = wiring.observers,
        clicks = wiring.click_listeners,
        inputs = wiring.input_listeners,
        "wired view tree"
    );
    Ok(wiring)
}

fn check(
    instruction: &Instruction,
    store: &Store,
    methods: &MethodTable,
) -> Result<(), BindingError> {
    let node = &instruction.node;
    match &instruction.directive {
        Directive::Click { method } => {
            if !methods.contains_key(method) {
                return Err(BindingError::UnknownMethod { name: method.clone() });
            }
        }
        Directive::Model { path } => {
            let parsed = resolve(store, path)?;
            if !node.kind().is_input_capable() {
                return Err(BindingError::NotInputCapable {
                    path: parsed.to_string(),
                    tag: node.tag(),
                });
            }
        }
        Directive::Bind { path } => {
            resolve(store, path)?;
        }
        Directive::ForEach { .. } => {}
    }
    Ok(())
}

/// Parse a dotted path and make sure it is bound in the store.
fn resolve(store: &Store, dotted: &str) -> Result<PropertyPath, BindingError> {
    let path = PropertyPath::parse(dotted)?;
    if !store.bindings().contains(&path) || store.get_path(&path).is_none() {
        return Err(BindingError::unknown_path(&path));
    }
    Ok(path)
}

fn wire_click(
    node: &Rc<dyn ViewNode>,
    name: &str,
    store: &Rc<Store>,
    methods: &MethodTable,
) -> Result<(), BindingError> {
    let method = methods
        .get(name)
        .cloned()
        .ok_or_else(|| BindingError::UnknownMethod { name: name.to_string() })?;
    let store = Rc::clone(store);
    let handler: EventHandler = Rc::new(move || method(store.as_ref()));
    node.listen(EventKind::Click, handler);
    Ok(())
}

fn wire_model(
    node: &Rc<dyn ViewNode>,
    path: &PropertyPath,
    store: &Rc<Store>,
) -> Result<(), BindingError> {
    store.observe(node, Slot::Value, path)?;

    // Weak: the node owns this listener
    let target = Rc::downgrade(node);
    let store = Rc::clone(store);
    let path = path.clone();
    let handler: EventHandler = Rc::new(move || -> anyhow::Result<()> {
        let Some(node) = target.upgrade() else {
            return Ok(());
        };
        store.set_path(&path, Value::Text(node.slot(Slot::Value)))?;
        Ok(())
    });
    node.listen(EventKind::Input, handler);
    Ok(())
}
