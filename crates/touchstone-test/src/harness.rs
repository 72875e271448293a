//! Test harness for gesture managers.
//!
//! Wraps a [`Manager`] on an in-memory [`ElementTree`] and records every
//! gesture event it emits, so tests can play a [`Script`] and assert on
//! the resulting event stream.

use crate::script::Script;
use std::cell::RefCell;
use std::rc::Rc;
use touchstone::{GestureError, GestureInput, Manager, ManagerOptions, RecognizerState, INPUT_EVENT};
use touchstone_core::{ElementId, ElementTree, RawInput, Surface};

/// Suffixes a recognizer's events may carry.
const SUFFIXES: [&str; 11] = [
    "", "start", "move", "end", "cancel", "left", "right", "up", "down", "in", "out",
];

/// One recorded emission.
#[derive(Debug, Clone)]
pub struct Recorded {
    /// Event name
    pub name: String,
    /// Sample the event carried
    pub input: GestureInput,
}

/// Shared log of emitted events.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    log: Rc<RefCell<Vec<Recorded>>>,
}

impl Recorder {
    /// Subscribe to every event name the manager's recognizers can emit.
    pub fn attach(manager: &Manager) -> Self {
        let recorder = Self::default();
        let names = event_names(manager);
        let log = Rc::clone(&recorder.log);
        manager.on(&names.join(" "), move |event| {
            log.borrow_mut().push(Recorded {
                name: event.name.clone(),
                input: event.input.clone(),
            });
        });
        recorder
    }

    /// Event names in emission order.
    pub fn names(&self) -> Vec<String> {
        self.log.borrow().iter().map(|r| r.name.clone()).collect()
    }

    /// Recorded events named `name`.
    pub fn named(&self, name: &str) -> Vec<Recorded> {
        self.log.borrow().iter().filter(|r| r.name == name).cloned().collect()
    }

    /// How many times `name` was emitted.
    pub fn count(&self, name: &str) -> usize {
        self.log.borrow().iter().filter(|r| r.name == name).count()
    }

    /// Forget everything recorded so far.
    pub fn clear(&self) {
        self.log.borrow_mut().clear();
    }
}

/// Every event name the registered recognizers may emit.
pub fn event_names(manager: &Manager) -> Vec<String> {
    let mut names = Vec::new();
    for recognizer in manager.recognizers() {
        for suffix in SUFFIXES {
            names.push(format!("{}{suffix}", recognizer.event()));
        }
    }
    names.sort();
    names.dedup();
    names
}

/// A manager under test.
pub struct Harness {
    manager: Manager,
    tree: Rc<ElementTree>,
    recorder: Recorder,
    inputs: Rc<RefCell<Vec<GestureInput>>>,
}

/// Root element of the harness tree.
pub const ROOT: ElementId = ElementId(1);

impl Harness {
    /// Manager with `options` on a tree holding only [`ROOT`].
    ///
    /// # Errors
    ///
    /// Returns the manager's configuration error.
    pub fn new(options: ManagerOptions) -> Result<Self, GestureError> {
        Self::with_tree(ElementTree::new(ROOT), options)
    }

    /// Manager with `options` on a caller-built tree rooted at [`ROOT`].
    ///
    /// # Errors
    ///
    /// Returns the manager's configuration error.
    pub fn with_tree(tree: ElementTree, options: ManagerOptions) -> Result<Self, GestureError> {
        let tree = Rc::new(tree);
        let surface: Rc<dyn Surface> = tree.clone();
        let manager = Manager::new(surface, ROOT, options)?;
        let recorder = Recorder::attach(&manager);

        let inputs = Rc::new(RefCell::new(Vec::new()));
        let log = Rc::clone(&inputs);
        manager.on(INPUT_EVENT, move |event| log.borrow_mut().push(event.input.clone()));

        Ok(Self {
            manager,
            tree,
            recorder,
            inputs,
        })
    }

    /// Manager with the stock preset.
    ///
    /// # Errors
    ///
    /// Returns the manager's configuration error.
    pub fn preset() -> Result<Self, GestureError> {
        Self::new(ManagerOptions::preset())
    }

    /// The manager.
    pub fn manager(&self) -> &Manager {
        &self.manager
    }

    /// The manager, mutably. Recognizers added afterwards are not recorded
    /// until [`rerecord`](Self::rerecord).
    pub fn manager_mut(&mut self) -> &mut Manager {
        &mut self.manager
    }

    /// The element tree.
    pub fn tree(&self) -> &ElementTree {
        &self.tree
    }

    /// Event recorder.
    pub fn recorder(&self) -> &Recorder {
        &self.recorder
    }

    /// Subscribe a fresh recorder covering the current recognizers.
    pub fn rerecord(&mut self) -> &mut Self {
        for name in event_names(&self.manager) {
            self.manager.off(&name, None);
        }
        self.recorder = Recorder::attach(&self.manager);
        self
    }

    // === Driving ===

    /// Feed one raw event.
    pub fn send(&mut self, raw: impl Into<RawInput>) -> &mut Self {
        self.manager.handle(&raw.into());
        self
    }

    /// Feed every event of `script` in order.
    pub fn play(&mut self, script: &Script) -> &mut Self {
        for raw in &script.events {
            self.manager.handle(raw);
        }
        self
    }

    /// Fire timers due at or before `now_ms`.
    pub fn advance(&mut self, now_ms: u64) -> &mut Self {
        self.manager.advance(now_ms);
        self
    }

    /// Fire every pending timer.
    pub fn settle(&mut self) -> &mut Self {
        while let Some(due) = self.manager.next_timer() {
            self.manager.advance(due);
        }
        self
    }

    // === Queries ===

    /// Event names emitted so far.
    pub fn events(&self) -> Vec<String> {
        self.recorder.names()
    }

    /// Computed samples emitted so far.
    pub fn inputs(&self) -> Vec<GestureInput> {
        self.inputs.borrow().clone()
    }

    /// State of the recognizer registered as `event`.
    pub fn state(&self, event: &str) -> Option<RecognizerState> {
        self.manager.get(event).map(touchstone::Recognizer::state)
    }

    // === Assertions ===

    /// Assert that `name` was emitted.
    pub fn assert_fired(&self, name: &str) -> &Self {
        assert!(
            self.recorder.count(name) > 0,
            "Expected '{name}' to fire, got {:?}",
            self.events()
        );
        self
    }

    /// Assert that `name` was not emitted.
    pub fn assert_not_fired(&self, name: &str) -> &Self {
        assert_eq!(
            self.recorder.count(name),
            0,
            "Expected '{name}' not to fire, got {:?}",
            self.events()
        );
        self
    }

    /// Assert how many times `name` was emitted.
    pub fn assert_count(&self, name: &str, expected: usize) -> &Self {
        assert_eq!(
            self.recorder.count(name),
            expected,
            "Expected '{name}' {expected} times, got {:?}",
            self.events()
        );
        self
    }

    /// Assert the emitted names, restricted to those in `expected`, match
    /// `expected` exactly.
    pub fn assert_sequence(&self, expected: &[&str]) -> &Self {
        let seen: Vec<String> = self
            .events()
            .into_iter()
            .filter(|name| expected.contains(&name.as_str()))
            .collect();
        assert_eq!(seen, expected, "Unexpected event sequence");
        self
    }
}

impl std::fmt::Debug for Harness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Harness")
            .field("manager", &self.manager)
            .field("events", &self.events())
            .finish_non_exhaustive()
    }
}
