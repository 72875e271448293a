//! Touch-action hints.
//!
//! Recognizers tell the platform which native gestures to leave alone
//! (`pan-y` for a horizontal pan keeps vertical scrolling native, and so on).
//! The manager collapses those wishes into one CSS `touch-action` value and,
//! on platforms without native support, emulates it by preventing defaults.

use crate::compute::GestureInput;
use serde::{Deserialize, Serialize};
use std::fmt;
use touchstone_core::Direction;

/// One touch-action keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TouchAction {
    /// Browser handles everything
    Auto,
    /// Browser pans and zooms but skips double-tap zoom
    Manipulation,
    /// Browser handles nothing
    None,
    /// Browser handles horizontal panning
    PanX,
    /// Browser handles vertical panning
    PanY,
}

impl TouchAction {
    /// CSS keyword.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Manipulation => "manipulation",
            Self::None => "none",
            Self::PanX => "pan-x",
            Self::PanY => "pan-y",
        }
    }

    /// Touch actions that keep native scrolling on the axes a directional
    /// recognizer does not use.
    #[must_use]
    pub fn for_direction(direction: Direction) -> Vec<Self> {
        let mut actions = Vec::new();
        if direction.intersects(Direction::HORIZONTAL) {
            actions.push(Self::PanY);
        }
        if direction.intersects(Direction::VERTICAL) {
            actions.push(Self::PanX);
        }
        actions
    }
}

impl fmt::Display for TouchAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the manager picks its touch-action value.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TouchActionSetting {
    /// Derive it from the enabled recognizers
    #[default]
    Compute,
    /// Use this CSS value verbatim
    Literal(String),
}

impl From<String> for TouchActionSetting {
    fn from(value: String) -> Self {
        let value = value.trim().to_ascii_lowercase();
        if value == "compute" {
            Self::Compute
        } else {
            Self::Literal(value)
        }
    }
}

impl From<&str> for TouchActionSetting {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<TouchActionSetting> for String {
    fn from(setting: TouchActionSetting) -> Self {
        match setting {
            TouchActionSetting::Compute => "compute".to_string(),
            TouchActionSetting::Literal(value) => value,
        }
    }
}

fn has(actions: &str, keyword: &str) -> bool {
    actions.split_whitespace().any(|a| a == keyword)
}

/// Collapse a space-separated list of actions to the single most
/// restrictive value that satisfies all of them.
#[must_use]
pub fn clean(actions: &str) -> TouchAction {
    if has(actions, "none") {
        return TouchAction::None;
    }
    let pan_x = has(actions, "pan-x");
    let pan_y = has(actions, "pan-y");
    // Each axis is claimed by a different recognizer: the browser may take neither.
    if pan_x && pan_y {
        return TouchAction::None;
    }
    if pan_x {
        return TouchAction::PanX;
    }
    if pan_y {
        return TouchAction::PanY;
    }
    if has(actions, "manipulation") {
        return TouchAction::Manipulation;
    }
    TouchAction::Auto
}

/// Collapse recognizer preferences.
#[must_use]
pub fn compute(actions: impl IntoIterator<Item = TouchAction>) -> TouchAction {
    let joined: Vec<&str> = actions.into_iter().map(TouchAction::as_str).collect();
    clean(&joined.join(" "))
}

/// Outcome of the prevent-default emulation for one sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prevention {
    /// Let the platform act
    Allow,
    /// Prevent this event; the session already prevented once
    Prevent,
    /// Prevent this event and every later one in the session
    PreventSession,
}

/// Emulate `touch-action` by deciding whether to prevent the raw event.
///
/// `none` prevents everything except what looks like a tap (one pointer,
/// moved less than 2px, down for less than 250ms); a single pan axis
/// prevents movement along the other axis; `pan-x pan-y` leaves scrolling
/// to the platform.
#[must_use]
pub fn prevent_defaults(actions: &str, input: &GestureInput, session_prevented: bool) -> Prevention {
    if session_prevented {
        return Prevention::Prevent;
    }

    let has_none = has(actions, "none");
    let has_pan_y = has(actions, "pan-y");
    let has_pan_x = has(actions, "pan-x");

    if has_none {
        let tap_like = input.pointers.len() == 1 && input.distance < 2.0 && input.delta_time < 250;
        if tap_like {
            return Prevention::Allow;
        }
    }

    if has_pan_x && has_pan_y {
        return Prevention::Allow;
    }

    let direction = input.offset_direction;
    if has_none
        || (has_pan_y && direction.intersects(Direction::HORIZONTAL))
        || (has_pan_x && direction.intersects(Direction::VERTICAL))
    {
        return Prevention::PreventSession;
    }
    Prevention::Allow
}
