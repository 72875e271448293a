//! Element identity and the surface gestures are bound to.

use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::HashMap;

/// Identifier of an element on a [`Surface`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub struct ElementId(pub u32);

/// A platform-level event dispatched to an element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchedEvent {
    /// Element the event was dispatched on
    pub target: ElementId,
    /// Event name
    pub name: String,
    /// JSON-encoded payload
    pub detail: String,
}

/// A tree of elements that input can target.
///
/// The engine only needs containment queries to resolve targets, plus an
/// optional channel for mirroring gesture events as platform events.
pub trait Surface {
    /// Whether `node` is `ancestor` or one of its descendants.
    fn contains(&self, ancestor: ElementId, node: ElementId) -> bool;

    /// Dispatch a platform-level custom event. Defaults to a no-op.
    fn dispatch(&self, target: ElementId, name: &str, detail: &str) {
        let _ = (target, name, detail);
    }
}

/// In-memory element tree backed by a parent map.
///
/// Records every dispatched event so hosts and tests can inspect them.
#[derive(Debug, Default)]
pub struct ElementTree {
    root: ElementId,
    parents: HashMap<ElementId, ElementId>,
    dispatched: RefCell<Vec<DispatchedEvent>>,
}

impl ElementTree {
    /// Create a tree containing only `root`.
    #[must_use]
    pub fn new(root: ElementId) -> Self {
        Self {
            root,
            parents: HashMap::new(),
            dispatched: RefCell::new(Vec::new()),
        }
    }

    /// Root element.
    #[must_use]
    pub const fn root(&self) -> ElementId {
        self.root
    }

    /// Attach `child` under `parent`, replacing any previous parent.
    pub fn insert(&mut self, child: ElementId, parent: ElementId) {
        if child != self.root {
            self.parents.insert(child, parent);
        }
    }

    /// Builder-style [`insert`](Self::insert).
    #[must_use]
    pub fn with_child(mut self, child: ElementId, parent: ElementId) -> Self {
        self.insert(child, parent);
        self
    }

    /// Whether the element is the root or has been inserted.
    #[must_use]
    pub fn is_known(&self, id: ElementId) -> bool {
        id == self.root || self.parents.contains_key(&id)
    }

    /// Parent of an element, if any.
    #[must_use]
    pub fn parent(&self, id: ElementId) -> Option<ElementId> {
        self.parents.get(&id).copied()
    }

    /// Events dispatched so far.
    #[must_use]
    pub fn dispatched(&self) -> Vec<DispatchedEvent> {
        self.dispatched.borrow().clone()
    }

    /// Forget recorded events.
    pub fn clear_dispatched(&self) {
        self.dispatched.borrow_mut().clear();
    }
}

impl Surface for ElementTree {
    fn contains(&self, ancestor: ElementId, node: ElementId) -> bool {
        let mut current = node;
        // Bounded walk: a malformed parent map must not loop forever.
        for _ in 0..=self.parents.len() {
            if current == ancestor {
                return true;
            }
            match self.parents.get(&current) {
                Some(&parent) => current = parent,
                None => return false,
            }
        }
        false
    }

    fn dispatch(&self, target: ElementId, name: &str, detail: &str) {
        self.dispatched.borrow_mut().push(DispatchedEvent {
            target,
            name: name.to_string(),
            detail: detail.to_string(),
        });
    }
}
