//! In-memory view tree - a reference host for the engine.
//!
//! [`Element`] implements [`ViewNode`] and [`Dom`] implements [`Document`], so
//! an engine can be mounted without a browser or a terminal. Slots are backed
//! by spark-signals, which lets host code read them reactively.
//!
//! Events are simulated: [`Element::click`] and [`Element::input`] dispatch to
//! the registered handlers synchronously, in registration order, and return
//! the first handler error.
//!
//! # Example
//!
//! ```ignore
//! use spark_bind::dom::{Dom, Element};
//!
//! let input = Element::new("input").attr("v-model", "name");
//! let dom = Dom::new(Element::new("div").attr("id", "app").child(input.clone()));
//!
//! // ... mount an engine on "#app" ...
//! input.input("Ada")?;
//! ```

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use spark_signals::{signal, Signal};

use crate::node::{Document, EventHandler, EventKind, Slot, ViewNode};

// =============================================================================
// Last Event
// =============================================================================

/// Record of the most recently dispatched event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DispatchedEvent {
    pub kind: EventKind,
    pub tag: String,
    pub id: Option<String>,
}

thread_local! {
    static LAST_EVENT: Signal<Option<DispatchedEvent>> = signal(None);
}

/// Get the last dispatched event (reactive).
pub fn last_event() -> Option<DispatchedEvent> {
    LAST_EVENT.with(|s| s.get())
}

/// Reset dispatch state (for testing).
pub fn reset_dom_state() {
    LAST_EVENT.with(|s| s.set(None));
}

// =============================================================================
// Element
// =============================================================================

/// Hook run after a slot write.
pub type SlotWriteHook = Rc<dyn Fn(&str)>;

/// A node of the in-memory tree.
pub struct Element {
    tag: String,
    attributes: RefCell<IndexMap<String, String>>,
    children: RefCell<Vec<Rc<Element>>>,
    value: Signal<String>,
    content: Signal<String>,
    listeners: RefCell<Vec<(EventKind, EventHandler)>>,
    slot_writes: Cell<usize>,
    write_hooks: RefCell<Vec<SlotWriteHook>>,
}

impl Element {
    pub fn new(tag: &str) -> Rc<Self> {
        Rc::new(Self {
            tag: tag.to_string(),
            attributes: RefCell::new(IndexMap::new()),
            children: RefCell::new(Vec::new()),
            value: signal(String::new()),
            content: signal(String::new()),
            listeners: RefCell::new(Vec::new()),
            slot_writes: Cell::new(0),
            write_hooks: RefCell::new(Vec::new()),
        })
    }

    /// Builder: set an attribute.
    pub fn attr(self: Rc<Self>, name: &str, value: &str) -> Rc<Self> {
        self.set_attribute(name, value);
        self
    }

    /// Builder: append a child.
    pub fn child(self: Rc<Self>, child: Rc<Element>) -> Rc<Self> {
        self.append_child(child);
        self
    }

    /// Builder: set the initial rendered content.
    pub fn text(self: Rc<Self>, content: &str) -> Rc<Self> {
        self.content.set(content.to_string());
        self
    }

    pub fn set_attribute(&self, name: &str, value: &str) {
        self.attributes
            .borrow_mut()
            .insert(name.to_string(), value.to_string());
    }

    pub fn remove_attribute(&self, name: &str) {
        self.attributes.borrow_mut().shift_remove(name);
    }

    pub fn append_child(&self, child: Rc<Element>) {
        self.children.borrow_mut().push(child);
    }

    pub fn element_children(&self) -> Vec<Rc<Element>> {
        self.children.borrow().clone()
    }

    pub fn id(&self) -> Option<String> {
        self.attributes.borrow().get("id").cloned()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attributes
            .borrow()
            .get("class")
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
    }

    // =========================================================================
    // Slots
    // =========================================================================

    /// Current value slot.
    pub fn value(&self) -> String {
        self.value.get()
    }

    /// Rendered content slot.
    pub fn content(&self) -> String {
        self.content.get()
    }

    /// The signal behind the value slot.
    pub fn value_signal(&self) -> Signal<String> {
        self.value.clone()
    }

    /// The signal behind the content slot.
    pub fn content_signal(&self) -> Signal<String> {
        self.content.clone()
    }

    /// Number of slot writes made through [`ViewNode::set_slot`].
    pub fn slot_writes(&self) -> usize {
        self.slot_writes.get()
    }

    /// Run `hook` after every slot write made through [`ViewNode::set_slot`].
    pub fn on_slot_write(&self, hook: impl Fn(&str) + 'static) {
        self.write_hooks.borrow_mut().push(Rc::new(hook));
    }

    // =========================================================================
    // Events
    // =========================================================================

    /// Simulate a click.
    pub fn click(&self) -> anyhow::Result<()> {
        self.dispatch(EventKind::Click)
    }

    /// Simulate user input: set the value slot, then dispatch an input event.
    pub fn input(&self, value: &str) -> anyhow::Result<()> {
        self.value.set(value.to_string());
        self.dispatch(EventKind::Input)
    }

    /// Run every handler registered for `kind`, stopping at the first error.
    pub fn dispatch(&self, kind: EventKind) -> anyhow::Result<()> {
        LAST_EVENT.with(|s| {
            s.set(Some(DispatchedEvent {
                kind,
                tag: self.tag.clone(),
                id: self.id(),
            }))
        });

        // Collect first so handlers may register more listeners
        let handlers: Vec<EventHandler> = self
            .listeners
            .borrow()
            .iter()
            .filter(|(event, _)| *event == kind)
            .map(|(_, handler)| handler.clone())
            .collect();

        for handler in handlers {
            handler()?;
        }
        Ok(())
    }

    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.listeners
            .borrow()
            .iter()
            .filter(|(event, _)| *event == kind)
            .count()
    }
}

impl ViewNode for Element {
    fn tag(&self) -> String {
        self.tag.clone()
    }

    fn attribute(&self, name: &str) -> Option<String> {
        self.attributes.borrow().get(name).cloned()
    }

    fn children(&self) -> Vec<Rc<dyn ViewNode>> {
        self.children
            .borrow()
            .iter()
            .map(|child| child.clone() as Rc<dyn ViewNode>)
            .collect()
    }

    fn slot(&self, slot: Slot) -> String {
        match slot {
            Slot::Value => self.value(),
            Slot::Content => self.content(),
        }
    }

    fn set_slot(&self, slot: Slot, value: String) {
        match slot {
            Slot::Value => self.value.set(value.clone()),
            Slot::Content => self.content.set(value.clone()),
        };
        self.slot_writes.set(self.slot_writes.get() + 1);

        let hooks = self.write_hooks.borrow().clone();
        for hook in hooks {
            hook(&value);
        }
    }

    fn listen(&self, event: EventKind, handler: EventHandler) {
        self.listeners.borrow_mut().push((event, handler));
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element")
            .field("tag", &self.tag)
            .field("attributes", &self.attributes.borrow())
            .field("children", &self.children.borrow().len())
            .finish()
    }
}

// =============================================================================
// Dom
// =============================================================================

/// A document made of [`Element`]s.
///
/// Selectors: `#id`, `.class`, or a tag name. The first match in depth-first
/// document order wins, the root included.
#[derive(Debug, Clone)]
pub struct Dom {
    root: Rc<Element>,
}

impl Dom {
    pub fn new(root: Rc<Element>) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Rc<Element> {
        &self.root
    }

    /// Find the first element matching `selector`.
    pub fn find(&self, selector: &str) -> Option<Rc<Element>> {
        let selector = selector.trim();
        if selector.is_empty() {
            return None;
        }
        find_in(&self.root, selector)
    }
}

impl Document for Dom {
    fn query(&self, selector: &str) -> Option<Rc<dyn ViewNode>> {
        self.find(selector).map(|element| element as Rc<dyn ViewNode>)
    }
}

fn matches_selector(element: &Element, selector: &str) -> bool {
    if let Some(id) = selector.strip_prefix('#') {
        element.id().as_deref() == Some(id)
    } else if let Some(class) = selector.strip_prefix('.') {
        element.has_class(class)
    } else {
        element.tag.eq_ignore_ascii_case(selector)
    }
}

fn find_in(element: &Rc<Element>, selector: &str) -> Option<Rc<Element>> {
    if matches_selector(element, selector) {
        return Some(element.clone());
    }
    element
        .element_children()
        .iter()
        .find_map(|child| find_in(child, selector))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Engine, EngineOptions};
    use serde_json::json;
    use spark_signals::effect;

    fn tree() -> Dom {
        Dom::new(
            Element::new("body").child(
                Element::new("div")
                    .attr("id", "app")
                    .child(Element::new("p").attr("class", "note big"))
                    .child(Element::new("input").attr("id", "name")),
            ),
        )
    }

    #[test]
    fn test_find_by_id_class_tag() {
        let dom = tree();
        assert_eq!(dom.find("#app").unwrap().tag(), "div");
        assert_eq!(dom.find(".big").unwrap().tag(), "p");
        assert_eq!(dom.find("INPUT").unwrap().id().as_deref(), Some("name"));
        assert_eq!(dom.find("body").unwrap().tag(), "body");
        assert!(dom.find("#missing").is_none());
        assert!(dom.find("").is_none());
    }

    #[test]
    fn test_query_returns_view_node() {
        let dom = tree();
        let node = dom.query("#app").unwrap();
        assert_eq!(node.children().len(), 2);
        assert_eq!(node.attribute("id").as_deref(), Some("app"));
        assert!(!node.has_attribute("v-bind"));
    }

    #[test]
    fn test_dispatch_in_registration_order() {
        reset_dom_state();
        let button = Element::new("button").attr("id", "go");
        let order = Rc::new(RefCell::new(Vec::new()));

        for n in 0..3 {
            let order = order.clone();
            button.listen(
                EventKind::Click,
                Rc::new(move || -> anyhow::Result<()> {
                    order.borrow_mut().push(n);
                    Ok(())
                }),
            );
        }

        button.click().unwrap();
        assert_eq!(*order.borrow(), vec![0, 1, 2]);
        assert_eq!(button.listener_count(EventKind::Click), 3);
        assert_eq!(button.listener_count(EventKind::Input), 0);

        let last = last_event().unwrap();
        assert_eq!(last.kind, EventKind::Click);
        assert_eq!(last.id.as_deref(), Some("go"));
    }

    #[test]
    fn test_dispatch_stops_at_first_error() {
        let button = Element::new("button");
        let reached = Rc::new(Cell::new(false));
        let reached_clone = reached.clone();

        button.listen(EventKind::Click, Rc::new(|| -> anyhow::Result<()> { anyhow::bail!("boom") }));
        button.listen(
            EventKind::Click,
            Rc::new(move || -> anyhow::Result<()> {
                reached_clone.set(true);
                Ok(())
            }),
        );

        let err = button.click().unwrap_err();
        assert_eq!(err.to_string(), "boom");
        assert!(!reached.get());
    }

    #[test]
    fn test_input_sets_value_before_dispatch() {
        let input = Element::new("input");
        let seen = Rc::new(RefCell::new(String::new()));
        let seen_clone = seen.clone();
        let input_clone = input.clone();

        input.listen(
            EventKind::Input,
            Rc::new(move || -> anyhow::Result<()> {
                *seen_clone.borrow_mut() = input_clone.value();
                Ok(())
            }),
        );

        input.input("typed").unwrap();
        assert_eq!(*seen.borrow(), "typed");
        // user input is not a programmatic slot write
        assert_eq!(input.slot_writes(), 0);
    }

    #[test]
    fn test_set_slot_counts_and_hooks() {
        let span = Element::new("span");
        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_clone = seen.clone();
        span.on_slot_write(move |v| seen_clone.borrow_mut().push(v.to_string()));

        span.set_slot(Slot::Content, "a".into());
        span.set_slot(Slot::Content, "a".into());

        assert_eq!(span.content(), "a");
        assert_eq!(span.slot_writes(), 2);
        assert_eq!(*seen.borrow(), vec!["a", "a"]);
    }

    #[test]
    fn test_content_signal_drives_effects() {
        let label = Element::new("span").attr("v-bind", "name");
        let other = Element::new("span").attr("v-bind", "count");
        let dom = Dom::new(
            Element::new("div")
                .attr("id", "app")
                .child(label.clone())
                .child(other.clone()),
        );
        let options =
            EngineOptions::from_json("#app", json!({ "name": "Ada", "count": 0 })).unwrap();
        let engine = Engine::new(&dom, options).unwrap();

        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_clone = seen.clone();
        let content = label.content_signal();
        let _effect = effect(move || {
            seen_clone.borrow_mut().push(content.get());
        });
        assert_eq!(*seen.borrow(), vec!["Ada"]);

        engine.set("name", "Grace").unwrap();
        assert_eq!(*seen.borrow(), vec!["Ada", "Grace"]);

        // Writes to other paths leave the effect alone
        engine.set("count", 1).unwrap();
        assert_eq!(*seen.borrow(), vec!["Ada", "Grace"]);
    }
}
