//! Raw platform input events.
//!
//! These mirror the three families of browser pointer input (mouse events,
//! unified pointer events and touch events) closely enough to be converted
//! from the DOM one-to-one, while staying plain serializable data so traces
//! can be recorded and replayed.

use crate::element::ElementId;
use crate::geometry::Point;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Pointer identifier for pointer events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub struct PointerId(pub u32);

/// Type of pointer device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PointerType {
    /// Mouse pointer
    #[default]
    Mouse,
    /// Touch pointer
    Touch,
    /// Pen/stylus pointer
    Pen,
    /// Depth-camera pointer
    Kinect,
}

impl PointerType {
    /// Map a legacy numeric pointer code (2 touch, 3 pen, 4 mouse, 5 kinect).
    #[must_use]
    pub const fn from_code(code: u32) -> Option<Self> {
        match code {
            2 => Some(Self::Touch),
            3 => Some(Self::Pen),
            4 => Some(Self::Mouse),
            5 => Some(Self::Kinect),
            _ => None,
        }
    }

    /// Lowercase platform name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mouse => "mouse",
            Self::Touch => "touch",
            Self::Pen => "pen",
            Self::Kinect => "kinect",
        }
    }
}

impl fmt::Display for PointerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error parsing a pointer type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown pointer type '{0}'")]
pub struct ParsePointerTypeError(pub String);

impl FromStr for PointerType {
    type Err = ParsePointerTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mouse" => Ok(Self::Mouse),
            "touch" => Ok(Self::Touch),
            "pen" => Ok(Self::Pen),
            "kinect" => Ok(Self::Kinect),
            other => other
                .parse::<u32>()
                .ok()
                .and_then(Self::from_code)
                .ok_or_else(|| ParsePointerTypeError(s.to_string())),
        }
    }
}

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MouseButton {
    /// Left mouse button
    #[default]
    Left,
    /// Middle mouse button (wheel click)
    Middle,
    /// Right mouse button
    Right,
    /// Additional button 1
    Button4,
    /// Additional button 2
    Button5,
}

impl MouseButton {
    /// Map a DOM `MouseEvent.button` value.
    #[must_use]
    pub const fn from_code(code: i16) -> Option<Self> {
        match code {
            0 => Some(Self::Left),
            1 => Some(Self::Middle),
            2 => Some(Self::Right),
            3 => Some(Self::Button4),
            4 => Some(Self::Button5),
            _ => None,
        }
    }
}

/// Bit of the primary button in `MouseInput::buttons`.
pub const PRIMARY_BUTTON: u16 = 1;

const fn default_buttons() -> u16 {
    PRIMARY_BUTTON
}

/// Kind of a mouse event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MouseKind {
    /// `mousedown`
    Down,
    /// `mousemove`
    Move,
    /// `mouseup`
    Up,
}

/// A mouse event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MouseInput {
    /// Event kind
    pub kind: MouseKind,
    /// Client position
    pub position: Point,
    /// Button that changed state
    #[serde(default)]
    pub button: MouseButton,
    /// Bitmask of pressed buttons
    #[serde(default = "default_buttons")]
    pub buttons: u16,
    /// Element under the pointer
    #[serde(default)]
    pub target: ElementId,
    /// Timestamp in milliseconds
    pub time_ms: u64,
    /// Set when the platform reports the event as derived from touch
    #[serde(default)]
    pub fires_touch_events: bool,
}

impl MouseInput {
    /// Left-button mouse event; `buttons` reflects the held primary button.
    #[must_use]
    pub fn new(kind: MouseKind, position: Point, time_ms: u64) -> Self {
        Self {
            kind,
            position,
            button: MouseButton::Left,
            buttons: if kind == MouseKind::Up { 0 } else { PRIMARY_BUTTON },
            target: ElementId::default(),
            time_ms,
            fires_touch_events: false,
        }
    }

    /// Set the target element.
    #[must_use]
    pub const fn with_target(mut self, target: ElementId) -> Self {
        self.target = target;
        self
    }

    /// Set the changed button.
    #[must_use]
    pub const fn with_button(mut self, button: MouseButton) -> Self {
        self.button = button;
        self
    }

    /// Set the pressed-buttons bitmask.
    #[must_use]
    pub const fn with_buttons(mut self, buttons: u16) -> Self {
        self.buttons = buttons;
        self
    }

    /// Mark as synthesized from touch input.
    #[must_use]
    pub const fn from_touch(mut self) -> Self {
        self.fires_touch_events = true;
        self
    }
}

/// Kind of a pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerKind {
    /// `pointerdown`
    Down,
    /// `pointermove`
    Move,
    /// `pointerup`
    Up,
    /// `pointercancel`
    Cancel,
    /// `pointerout`
    Out,
}

/// A unified pointer event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointerInput {
    /// Event kind
    pub kind: PointerKind,
    /// Pointer ID
    pub pointer_id: PointerId,
    /// Pointer type
    #[serde(default)]
    pub pointer_type: PointerType,
    /// Client position
    pub position: Point,
    /// Button (for mouse pointers)
    #[serde(default)]
    pub button: Option<MouseButton>,
    /// Element under the pointer
    #[serde(default)]
    pub target: ElementId,
    /// Timestamp in milliseconds
    pub time_ms: u64,
}

impl PointerInput {
    /// Create a pointer event. Non-touch pointers press the left button.
    #[must_use]
    pub fn new(
        kind: PointerKind,
        pointer_id: PointerId,
        pointer_type: PointerType,
        position: Point,
        time_ms: u64,
    ) -> Self {
        Self {
            kind,
            pointer_id,
            pointer_type,
            position,
            button: (pointer_type != PointerType::Touch).then_some(MouseButton::Left),
            target: ElementId::default(),
            time_ms,
        }
    }

    /// Set the target element.
    #[must_use]
    pub const fn with_target(mut self, target: ElementId) -> Self {
        self.target = target;
        self
    }

    /// Set the button.
    #[must_use]
    pub const fn with_button(mut self, button: Option<MouseButton>) -> Self {
        self.button = button;
        self
    }
}

/// Kind of a touch event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TouchKind {
    /// `touchstart`
    Start,
    /// `touchmove`
    Move,
    /// `touchend`
    End,
    /// `touchcancel`
    Cancel,
}

/// One touch contact as reported by a touch event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Touch {
    /// Touch identifier
    pub id: u32,
    /// Client position
    pub position: Point,
    /// Element the touch started on
    #[serde(default)]
    pub target: ElementId,
}

impl Touch {
    /// Create a touch on the default element.
    #[must_use]
    pub const fn new(id: u32, position: Point) -> Self {
        Self {
            id,
            position,
            target: ElementId(0),
        }
    }

    /// Set the target element.
    #[must_use]
    pub const fn with_target(mut self, target: ElementId) -> Self {
        self.target = target;
        self
    }
}

/// A touch event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TouchInput {
    /// Event kind
    pub kind: TouchKind,
    /// All touches currently on the surface
    pub touches: Vec<Touch>,
    /// Touches that changed in this event
    pub changed_touches: Vec<Touch>,
    /// Event target
    #[serde(default)]
    pub target: ElementId,
    /// Timestamp in milliseconds
    pub time_ms: u64,
}

impl TouchInput {
    /// Create a touch event.
    #[must_use]
    pub fn new(kind: TouchKind, touches: Vec<Touch>, changed_touches: Vec<Touch>, time_ms: u64) -> Self {
        let target = changed_touches
            .first()
            .or_else(|| touches.first())
            .map(|t| t.target)
            .unwrap_or_default();
        Self {
            kind,
            touches,
            changed_touches,
            target,
            time_ms,
        }
    }

    /// Set the event target.
    #[must_use]
    pub const fn with_target(mut self, target: ElementId) -> Self {
        self.target = target;
        self
    }
}

/// Any raw input event the engine accepts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "lowercase")]
pub enum RawInput {
    /// Mouse event
    Mouse(MouseInput),
    /// Pointer event
    Pointer(PointerInput),
    /// Touch event
    Touch(TouchInput),
}

impl RawInput {
    /// Timestamp in milliseconds.
    #[must_use]
    pub const fn time_ms(&self) -> u64 {
        match self {
            Self::Mouse(m) => m.time_ms,
            Self::Pointer(p) => p.time_ms,
            Self::Touch(t) => t.time_ms,
        }
    }

    /// Event target.
    #[must_use]
    pub const fn target(&self) -> ElementId {
        match self {
            Self::Mouse(m) => m.target,
            Self::Pointer(p) => p.target,
            Self::Touch(t) => t.target,
        }
    }

    /// Platform event name, for logging.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Mouse(m) => match m.kind {
                MouseKind::Down => "mousedown",
                MouseKind::Move => "mousemove",
                MouseKind::Up => "mouseup",
            },
            Self::Pointer(p) => match p.kind {
                PointerKind::Down => "pointerdown",
                PointerKind::Move => "pointermove",
                PointerKind::Up => "pointerup",
                PointerKind::Cancel => "pointercancel",
                PointerKind::Out => "pointerout",
            },
            Self::Touch(t) => match t.kind {
                TouchKind::Start => "touchstart",
                TouchKind::Move => "touchmove",
                TouchKind::End => "touchend",
                TouchKind::Cancel => "touchcancel",
            },
        }
    }

    /// Rewrite every target not accepted by `keep` to `fallback`.
    pub fn retarget(&mut self, keep: impl Fn(ElementId) -> bool, fallback: ElementId) {
        let fix = |t: &mut ElementId| {
            if !keep(*t) {
                *t = fallback;
            }
        };
        match self {
            Self::Mouse(m) => fix(&mut m.target),
            Self::Pointer(p) => fix(&mut p.target),
            Self::Touch(t) => {
                fix(&mut t.target);
                for touch in t.touches.iter_mut().chain(t.changed_touches.iter_mut()) {
                    fix(&mut touch.target);
                }
            }
        }
    }
}

impl From<MouseInput> for RawInput {
    fn from(m: MouseInput) -> Self {
        Self::Mouse(m)
    }
}

impl From<PointerInput> for RawInput {
    fn from(p: PointerInput) -> Self {
        Self::Pointer(p)
    }
}

impl From<TouchInput> for RawInput {
    fn from(t: TouchInput) -> Self {
        Self::Touch(t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pointer_type_from_str() {
        assert_eq!("touch".parse::<PointerType>(), Ok(PointerType::Touch));
        assert_eq!("PEN".parse::<PointerType>(), Ok(PointerType::Pen));
        assert_eq!("4".parse::<PointerType>(), Ok(PointerType::Mouse));
        assert_eq!("5".parse::<PointerType>(), Ok(PointerType::Kinect));
        assert!("trackball".parse::<PointerType>().is_err());
        assert!("7".parse::<PointerType>().is_err());
    }

    #[test]
    fn test_pointer_type_display() {
        assert_eq!(PointerType::Kinect.to_string(), "kinect");
    }

    #[test]
    fn test_mouse_button_from_code() {
        assert_eq!(MouseButton::from_code(0), Some(MouseButton::Left));
        assert_eq!(MouseButton::from_code(2), Some(MouseButton::Right));
        assert_eq!(MouseButton::from_code(9), None);
    }

    #[test]
    fn test_mouse_input_buttons_follow_kind() {
        let down = MouseInput::new(MouseKind::Down, Point::ORIGIN, 0);
        let up = MouseInput::new(MouseKind::Up, Point::ORIGIN, 0);
        assert_eq!(down.buttons, PRIMARY_BUTTON);
        assert_eq!(up.buttons, 0);
    }

    #[test]
    fn test_pointer_input_touch_has_no_button() {
        let p = PointerInput::new(
            PointerKind::Down,
            PointerId(1),
            PointerType::Touch,
            Point::ORIGIN,
            0,
        );
        assert_eq!(p.button, None);
    }

    #[test]
    fn test_touch_input_target_from_changed() {
        let t = Touch::new(1, Point::ORIGIN).with_target(ElementId(4));
        let input = TouchInput::new(TouchKind::Start, vec![t], vec![t], 0);
        assert_eq!(input.target, ElementId(4));
    }

    #[test]
    fn test_raw_input_accessors() {
        let raw: RawInput = MouseInput::new(MouseKind::Move, Point::new(1.0, 2.0), 42)
            .with_target(ElementId(3))
            .into();
        assert_eq!(raw.time_ms(), 42);
        assert_eq!(raw.target(), ElementId(3));
        assert_eq!(raw.name(), "mousemove");
    }

    #[test]
    fn test_retarget() {
        let t = Touch::new(1, Point::ORIGIN).with_target(ElementId(9));
        let mut raw: RawInput = TouchInput::new(TouchKind::Start, vec![t], vec![t], 0).into();
        raw.retarget(|id| id == ElementId(1), ElementId(1));
        let RawInput::Touch(touch) = raw else {
            panic!("expected touch");
        };
        assert_eq!(touch.target, ElementId(1));
        assert_eq!(touch.touches[0].target, ElementId(1));
        assert_eq!(touch.changed_touches[0].target, ElementId(1));
    }

    #[test]
    fn test_raw_input_json_shape() {
        let json = r#"{"source":"mouse","kind":"down","position":{"x":1.0,"y":2.0},"time_ms":5}"#;
        let raw: RawInput = serde_json::from_str(json).unwrap();
        let RawInput::Mouse(m) = &raw else {
            panic!("expected mouse");
        };
        assert_eq!(m.kind, MouseKind::Down);
        assert_eq!(m.button, MouseButton::Left);
        assert_eq!(m.buttons, PRIMARY_BUTTON);
        assert!(!m.fires_touch_events);

        let back: RawInput = serde_json::from_str(&serde_json::to_string(&raw).unwrap()).unwrap();
        assert_eq!(back, raw);
    }

    #[test]
    fn test_pointer_json_defaults() {
        let json = r#"{"source":"pointer","kind":"cancel","pointer_id":3,"position":{"x":0.0,"y":0.0},"time_ms":1}"#;
        let raw: RawInput = serde_json::from_str(json).unwrap();
        assert_eq!(raw.name(), "pointercancel");
    }
}
