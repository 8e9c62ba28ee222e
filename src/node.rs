//! Host interface - what the engine needs from a view tree.
//!
//! The engine never owns view nodes. A host (a DOM, a terminal widget tree,
//! the in-memory [`dom`](crate::dom) module) implements [`ViewNode`] for its
//! nodes and [`Document`] for mount lookup.
//!
//! Everything here is single-threaded: nodes are shared through `Rc`, and
//! event handlers run synchronously on the thread that dispatches them.

use std::rc::Rc;

// =============================================================================
// Node Kind
// =============================================================================

/// Element kind, as far as the engine cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NodeKind {
    /// Single-line text input.
    Input,
    /// Multi-line text area.
    TextArea,
    #[default]
    Other,
}

impl NodeKind {
    /// Classify a tag name (case-insensitive).
    pub fn from_tag(tag: &str) -> Self {
        if tag.eq_ignore_ascii_case("input") {
            NodeKind::Input
        } else if tag.eq_ignore_ascii_case("textarea") {
            NodeKind::TextArea
        } else {
            NodeKind::Other
        }
    }

    /// Whether the node has an editable value slot.
    pub fn is_input_capable(self) -> bool {
        matches!(self, NodeKind::Input | NodeKind::TextArea)
    }
}

// =============================================================================
// Slots and Events
// =============================================================================

/// A named attribute slot an observer can write into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    /// The current value of an input.
    Value,
    /// The rendered content of any node.
    Content,
}

impl Slot {
    pub fn name(self) -> &'static str {
        match self {
            Slot::Value => "value",
            Slot::Content => "content",
        }
    }
}

/// Events the engine subscribes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Click,
    /// The node's value changed through user input.
    Input,
}

/// Event handler. Takes no payload: handlers re-read state from the node.
///
/// Errors are returned to whoever dispatched the event, unmodified.
pub type EventHandler = Rc<dyn Fn() -> anyhow::Result<()>>;

// =============================================================================
// Traits
// =============================================================================

/// A node in the host's view tree.
pub trait ViewNode {
    /// Tag name, used for diagnostics and the default [`kind`](ViewNode::kind).
    fn tag(&self) -> String;

    fn kind(&self) -> NodeKind {
        NodeKind::from_tag(&self.tag())
    }

    fn has_attribute(&self, name: &str) -> bool {
        self.attribute(name).is_some()
    }

    fn attribute(&self, name: &str) -> Option<String>;

    /// Child nodes in document order.
    fn children(&self) -> Vec<Rc<dyn ViewNode>>;

    /// Read a slot.
    fn slot(&self, slot: Slot) -> String;

    /// Write a slot. Must not dispatch events.
    fn set_slot(&self, slot: Slot, value: String);

    /// Subscribe to an event. Handlers run in subscription order.
    fn listen(&self, event: EventKind, handler: EventHandler);
}

/// Resolves the mount node.
pub trait Document {
    /// Find a node by a host-defined selector.
    fn query(&self, selector: &str) -> Option<Rc<dyn ViewNode>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_kind_from_tag() {
        assert_eq!(NodeKind::from_tag("INPUT"), NodeKind::Input);
        assert_eq!(NodeKind::from_tag("textarea"), NodeKind::TextArea);
        assert_eq!(NodeKind::from_tag("div"), NodeKind::Other);
    }

    #[test]
    fn test_input_capable() {
        assert!(NodeKind::Input.is_input_capable());
        assert!(NodeKind::TextArea.is_input_capable());
        assert!(!NodeKind::Other.is_input_capable());
    }
}
