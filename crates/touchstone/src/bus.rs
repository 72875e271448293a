//! Event subscription.
//!
//! The bus is a cheap handle around shared handler storage, so callers can
//! keep a clone and subscribe or unsubscribe from inside a handler. Each
//! emission walks a snapshot of the handlers registered at that moment.

use crate::compute::{GestureInput, StopMode};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// Handle returned by [`EventBus::on`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(u64);

/// Event delivered to handlers.
#[derive(Debug)]
pub struct GestureEvent {
    /// Event name (`panstart`, `tap`, ...)
    pub name: String,
    /// Computed sample the event describes
    pub input: GestureInput,
    prevented: Cell<bool>,
    stop: Cell<Option<StopMode>>,
}

impl GestureEvent {
    /// Create an event.
    #[must_use]
    pub fn new(name: impl Into<String>, input: GestureInput) -> Self {
        Self {
            name: name.into(),
            input,
            prevented: Cell::new(false),
            stop: Cell::new(None),
        }
    }

    /// Ask the platform not to perform its default action for the raw
    /// event behind this gesture.
    pub fn prevent_default(&self) {
        self.prevented.set(true);
    }

    /// Whether a handler called [`prevent_default`](Self::prevent_default).
    #[must_use]
    pub fn is_default_prevented(&self) -> bool {
        self.prevented.get()
    }

    /// Stop recognition for the rest of the session. A forced stop
    /// overrides a soft one.
    pub fn stop(&self, force: bool) {
        let mode = if force || self.stop.get() == Some(StopMode::Forced) {
            StopMode::Forced
        } else {
            StopMode::Soft
        };
        self.stop.set(Some(mode));
    }

    /// Stop requested by handlers, if any.
    #[must_use]
    pub fn stop_request(&self) -> Option<StopMode> {
        self.stop.get()
    }
}

type Handler = Rc<dyn Fn(&GestureEvent)>;

#[derive(Default)]
struct Registry {
    next: u64,
    handlers: HashMap<String, Vec<(HandlerId, Handler)>>,
}

/// Named-event dispatcher shared between a manager and its subscribers.
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Rc<RefCell<Registry>>,
}

impl EventBus {
    /// Create an empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for each whitespace-separated name in `events`.
    /// The same id covers every name.
    pub fn on(&self, events: &str, handler: impl Fn(&GestureEvent) + 'static) -> HandlerId {
        let handler: Handler = Rc::new(handler);
        let mut registry = self.inner.borrow_mut();
        registry.next += 1;
        let id = HandlerId(registry.next);
        for name in events.split_whitespace() {
            registry
                .handlers
                .entry(name.to_string())
                .or_default()
                .push((id, Rc::clone(&handler)));
        }
        id
    }

    /// Remove one handler, or every handler when `id` is `None`, for each
    /// whitespace-separated name in `events`.
    pub fn off(&self, events: &str, id: Option<HandlerId>) {
        let mut registry = self.inner.borrow_mut();
        for name in events.split_whitespace() {
            match id {
                Some(id) => {
                    if let Some(list) = registry.handlers.get_mut(name) {
                        list.retain(|(h, _)| *h != id);
                        if list.is_empty() {
                            registry.handlers.remove(name);
                        }
                    }
                }
                None => {
                    registry.handlers.remove(name);
                }
            }
        }
    }

    /// Deliver `event` to the handlers registered for its name.
    pub fn emit(&self, event: &GestureEvent) {
        let snapshot: Vec<Handler> = self
            .inner
            .borrow()
            .handlers
            .get(&event.name)
            .map(|list| list.iter().map(|(_, h)| Rc::clone(h)).collect())
            .unwrap_or_default();
        for handler in snapshot {
            handler(event);
        }
    }

    /// Whether anything listens for `name`.
    #[must_use]
    pub fn has_handlers(&self, name: &str) -> bool {
        self.inner.borrow().handlers.contains_key(name)
    }

    /// Drop every handler.
    pub fn clear(&self) {
        self.inner.borrow_mut().handlers.clear();
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registry = self.inner.borrow();
        let mut names: Vec<&String> = registry.handlers.keys().collect();
        names.sort();
        f.debug_struct("EventBus").field("events", &names).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recognizer::attr::tests::input_with;

    fn event(name: &str) -> GestureEvent {
        GestureEvent::new(name, input_with(|_| {}))
    }

    #[test]
    fn test_on_multiple_names() {
        let bus = EventBus::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = Rc::clone(&seen);
        bus.on("panstart panend", move |e| log.borrow_mut().push(e.name.clone()));
        bus.emit(&event("panstart"));
        bus.emit(&event("panmove"));
        bus.emit(&event("panend"));
        assert_eq!(*seen.borrow(), vec!["panstart", "panend"]);
    }

    #[test]
    fn test_off_by_id_and_all() {
        let bus = EventBus::new();
        let count = Rc::new(Cell::new(0));
        let (a, b) = (Rc::clone(&count), Rc::clone(&count));
        let first = bus.on("tap", move |_| a.set(a.get() + 1));
        bus.on("tap", move |_| b.set(b.get() + 10));
        bus.off("tap", Some(first));
        bus.emit(&event("tap"));
        assert_eq!(count.get(), 10);
        bus.off("tap", None);
        assert!(!bus.has_handlers("tap"));
        bus.emit(&event("tap"));
        assert_eq!(count.get(), 10);
    }

    #[test]
    fn test_handlers_added_during_emit_wait() {
        let bus = EventBus::new();
        let count = Rc::new(Cell::new(0));
        let (inner_bus, inner_count) = (bus.clone(), Rc::clone(&count));
        bus.on("tap", move |_| {
            let c = Rc::clone(&inner_count);
            inner_bus.on("tap", move |_| c.set(c.get() + 1));
        });
        bus.emit(&event("tap"));
        assert_eq!(count.get(), 0);
        bus.emit(&event("tap"));
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_prevent_and_stop() {
        let e = event("pan");
        assert!(!e.is_default_prevented());
        e.prevent_default();
        assert!(e.is_default_prevented());
        e.stop(true);
        e.stop(false);
        assert_eq!(e.stop_request(), Some(StopMode::Forced));
    }
}
