//! Browser bridge: DOM events in, custom events and `touch-action` out.
//!
//! Supports mouse, pointer and touch events.

use crate::input::InputClass;
use crate::manager::Manager;
use std::cell::RefCell;
use std::rc::Rc;
use touchstone_core::{
    ElementId, MouseButton, MouseInput, MouseKind, Point, PointerId, PointerInput, PointerKind,
    PointerType, RawInput, Surface, Touch, TouchInput, TouchKind,
};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    CustomEvent, CustomEventInit, Element, Event, EventTarget, HtmlElement, MouseEvent, Node,
    PointerEvent, TouchEvent, TouchList, UiEvent,
};

/// DOM elements known to the engine, addressed by [`ElementId`].
///
/// Id 0 stands for "outside every registered element".
#[derive(Debug, Default)]
pub struct DomSurface {
    elements: RefCell<Vec<Element>>,
}

impl DomSurface {
    /// Create an empty surface.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `element` and return its id. Registering twice returns the
    /// same id.
    pub fn register(&self, element: &Element) -> ElementId {
        let mut elements = self.elements.borrow_mut();
        if let Some(i) = elements.iter().position(|e| e == element) {
            return ElementId(i as u32 + 1);
        }
        elements.push(element.clone());
        ElementId(elements.len() as u32)
    }

    fn element(&self, id: ElementId) -> Option<Element> {
        let index = (id.0 as usize).checked_sub(1)?;
        self.elements.borrow().get(index).cloned()
    }

    /// Id of an event target: the element itself when registered, else the
    /// innermost registered element containing it, else 0.
    pub fn id_of(&self, target: Option<EventTarget>) -> ElementId {
        let Some(node) = target.and_then(|t| t.dyn_into::<Node>().ok()) else {
            return ElementId(0);
        };
        let elements = self.elements.borrow();
        if let Some(i) = elements.iter().position(|e| AsRef::<Node>::as_ref(e) == &node) {
            return ElementId(i as u32 + 1);
        }
        elements
            .iter()
            .rposition(|e| e.contains(Some(&node)))
            .map_or(ElementId(0), |i| ElementId(i as u32 + 1))
    }
}

impl Surface for DomSurface {
    fn contains(&self, ancestor: ElementId, node: ElementId) -> bool {
        match (self.element(ancestor), self.element(node)) {
            (Some(a), Some(n)) => a.contains(Some(&n)),
            _ => false,
        }
    }

    fn dispatch(&self, target: ElementId, name: &str, detail: &str) {
        let Some(element) = self.element(target) else {
            return;
        };
        let init = CustomEventInit::new();
        init.set_bubbles(true);
        init.set_cancelable(true);
        let detail = js_sys::JSON::parse(detail).unwrap_or_else(|_| JsValue::from_str(detail));
        init.set_detail(&detail);
        if let Ok(event) = CustomEvent::new_with_event_init_dict(name, &init) {
            let _ = element.dispatch_event(&event);
        }
    }
}

/// DOM event names an input class listens to, split by where the listener
/// sits.
///
/// Move and release events of single-pointer classes are taken from the
/// window so a drag that leaves the element still ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenEvents {
    /// Listened on the bound element
    pub element: &'static [&'static str],
    /// Listened on the window
    pub window: &'static [&'static str],
}

impl ListenEvents {
    /// Events for `class`.
    #[must_use]
    pub const fn of(class: InputClass) -> Self {
        const TOUCH: &[&str] = &["touchstart", "touchmove", "touchend", "touchcancel"];
        match class {
            InputClass::Mouse => Self {
                element: &["mousedown"],
                window: &["mousemove", "mouseup"],
            },
            InputClass::Pointer => Self {
                element: &["pointerdown"],
                window: &["pointermove", "pointerup", "pointercancel"],
            },
            InputClass::SingleTouch => Self {
                element: &["touchstart"],
                window: &["touchmove", "touchend", "touchcancel"],
            },
            InputClass::Touch => Self {
                element: TOUCH,
                window: &[],
            },
            InputClass::TouchMouse => Self {
                element: &["touchstart", "touchmove", "touchend", "touchcancel", "mousedown"],
                window: &["mousemove", "mouseup"],
            },
        }
    }
}

fn time_ms(event: &Event) -> u64 {
    event.time_stamp().max(0.0) as u64
}

/// Convert a `MouseEvent`.
pub fn mouse_input(event: &MouseEvent, surface: &DomSurface) -> Option<MouseInput> {
    let kind = match event.type_().as_str() {
        "mousedown" => MouseKind::Down,
        "mousemove" => MouseKind::Move,
        "mouseup" => MouseKind::Up,
        _ => return None,
    };
    let position = Point::new(event.client_x() as f32, event.client_y() as f32);
    let mut input = MouseInput::new(kind, position, time_ms(event))
        .with_target(surface.id_of(event.target()))
        .with_buttons(event.buttons());
    if let Some(button) = MouseButton::from_code(event.button()) {
        input = input.with_button(button);
    }
    if fires_touch_events(event) {
        input = input.from_touch();
    }
    Some(input)
}

/// Whether the device behind `event` also fires touch events, making the
/// event a compatibility mouse event.
#[must_use]
pub fn fires_touch_events(event: &UiEvent) -> bool {
    event
        .source_capabilities()
        .is_some_and(|caps| caps.fires_touch_events())
}

/// Convert a `PointerEvent`.
pub fn pointer_input(event: &PointerEvent, surface: &DomSurface) -> Option<PointerInput> {
    let kind = match event.type_().as_str() {
        "pointerdown" => PointerKind::Down,
        "pointermove" => PointerKind::Move,
        "pointerup" => PointerKind::Up,
        "pointercancel" => PointerKind::Cancel,
        "pointerout" => PointerKind::Out,
        _ => return None,
    };
    let pointer_type = event.pointer_type().parse().unwrap_or(PointerType::Mouse);
    let position = Point::new(event.client_x() as f32, event.client_y() as f32);
    let input = PointerInput::new(
        kind,
        PointerId(event.pointer_id() as u32),
        pointer_type,
        position,
        time_ms(event),
    )
    .with_target(surface.id_of(event.target()))
    .with_button(MouseButton::from_code(event.button()));
    Some(input)
}

fn touches(list: &TouchList, surface: &DomSurface) -> Vec<Touch> {
    (0..list.length())
        .filter_map(|i| list.get(i))
        .map(|t| {
            let position = Point::new(t.client_x() as f32, t.client_y() as f32);
            Touch::new(t.identifier() as u32, position).with_target(surface.id_of(t.target()))
        })
        .collect()
}

/// Convert a `TouchEvent`.
pub fn touch_input(event: &TouchEvent, surface: &DomSurface) -> Option<TouchInput> {
    let kind = match event.type_().as_str() {
        "touchstart" => TouchKind::Start,
        "touchmove" => TouchKind::Move,
        "touchend" => TouchKind::End,
        "touchcancel" => TouchKind::Cancel,
        _ => return None,
    };
    let input = TouchInput::new(
        kind,
        touches(&event.touches(), surface),
        touches(&event.changed_touches(), surface),
        time_ms(event),
    )
    .with_target(surface.id_of(event.target()));
    Some(input)
}

/// Convert any supported DOM event.
pub fn raw_input(event: &Event, surface: &DomSurface) -> Option<RawInput> {
    // PointerEvent is a MouseEvent: test it first
    if let Some(e) = event.dyn_ref::<PointerEvent>() {
        return pointer_input(e, surface).map(RawInput::Pointer);
    }
    if let Some(e) = event.dyn_ref::<TouchEvent>() {
        return touch_input(e, surface).map(RawInput::Touch);
    }
    if let Some(e) = event.dyn_ref::<MouseEvent>() {
        return mouse_input(e, surface).map(RawInput::Mouse);
    }
    None
}

/// Write the manager's `touch-action` onto an element.
pub fn apply_touch_action(element: &HtmlElement, value: &str) -> Result<(), JsValue> {
    element.style().set_property("touch-action", value)
}

type Listener = Closure<dyn FnMut(Event)>;

/// DOM listeners feeding a manager. Dropping the binding detaches them.
pub struct Binding {
    manager: Rc<RefCell<Manager>>,
    element: Element,
    applied: Rc<RefCell<String>>,
    listeners: Vec<(EventTarget, &'static str, Listener)>,
}

impl Binding {
    /// Listen for the manager's input class and forward every event.
    /// Platform defaults are prevented when the manager asks.
    pub fn attach(
        manager: Rc<RefCell<Manager>>,
        surface: Rc<DomSurface>,
        element: &Element,
    ) -> Result<Self, JsValue> {
        let window: EventTarget = web_sys::window()
            .ok_or_else(|| JsValue::from_str("no window"))?
            .into();
        let applied = Rc::new(RefCell::new(String::new()));
        refresh(&manager, element, &applied)?;

        let events = ListenEvents::of(manager.borrow().input_class());
        let targets = [(EventTarget::from(element.clone()), events.element), (window, events.window)];
        let mut listeners = Vec::new();
        for (target, names) in targets {
            for &name in names {
                let listener = forward(&manager, &surface, element, &applied);
                target.add_event_listener_with_callback(name, listener.as_ref().unchecked_ref())?;
                listeners.push((target.clone(), name, listener));
            }
        }

        Ok(Self {
            manager,
            element: element.clone(),
            applied,
            listeners,
        })
    }

    /// Write the manager's current `touch-action` onto the element if it
    /// changed since the last write. Input events refresh it themselves;
    /// call this after reconfiguring the manager outside a handler.
    pub fn refresh_touch_action(&self) -> Result<(), JsValue> {
        refresh(&self.manager, &self.element, &self.applied)
    }

    /// `touch-action` last written to the element.
    #[must_use]
    pub fn applied_touch_action(&self) -> String {
        self.applied.borrow().clone()
    }
}

fn refresh(manager: &RefCell<Manager>, element: &Element, applied: &RefCell<String>) -> Result<(), JsValue> {
    let manager = manager.borrow();
    let value = manager.touch_action();
    if *applied.borrow() == value {
        return Ok(());
    }
    if let Some(html) = element.dyn_ref::<HtmlElement>() {
        apply_touch_action(html, value)?;
    }
    *applied.borrow_mut() = value.to_string();
    Ok(())
}

fn forward(
    manager: &Rc<RefCell<Manager>>,
    surface: &Rc<DomSurface>,
    element: &Element,
    applied: &Rc<RefCell<String>>,
) -> Listener {
    let manager = Rc::clone(manager);
    let surface = Rc::clone(surface);
    let element = element.clone();
    let applied = Rc::clone(applied);
    Closure::new(move |event: Event| {
        let Some(raw) = raw_input(&event, &surface) else {
            return;
        };
        let outcome = manager.borrow_mut().handle(&raw);
        if outcome.default_prevented {
            event.prevent_default();
        }
        // Handlers may have reconfigured the manager
        let _ = refresh(&manager, &element, &applied);
    })
}

impl Drop for Binding {
    fn drop(&mut self) {
        for (target, name, listener) in &self.listeners {
            let _ = target.remove_event_listener_with_callback(name, listener.as_ref().unchecked_ref());
        }
    }
}

impl std::fmt::Debug for Binding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.listeners.iter().map(|(_, n, _)| *n).collect();
        f.debug_struct("Binding").field("events", &names).finish_non_exhaustive()
    }
}
