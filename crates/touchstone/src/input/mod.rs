//! Input normalization.
//!
//! Each source adapts one family of raw platform events into
//! [`InputSample`]s. Sources are stateful: they track which pointers are
//! down so that every sample carries the full pointer set.

mod mouse;
mod pointer;
mod single_touch;
mod touch;
mod touch_mouse;

pub use mouse::MouseSource;
pub use pointer::PointerSource;
pub use single_touch::SingleTouchSource;
pub use touch::TouchSource;
pub use touch_mouse::{DedupConfig, TouchMouseSource};

use crate::compute::{InputSample, Pointer};
use serde::{Deserialize, Serialize};
use std::fmt;
use touchstone_core::{ElementId, Surface, Touch};

/// What a source may consult while handling an event.
#[derive(Clone, Copy)]
pub struct InputContext<'a> {
    /// Element tree
    pub surface: &'a dyn Surface,
    /// Element the source listens on
    pub target: ElementId,
}

impl fmt::Debug for InputContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputContext").field("target", &self.target).finish_non_exhaustive()
    }
}

/// A stateful adapter from raw events to samples.
pub trait InputSource: fmt::Debug {
    /// Normalize one raw event. `None` when the event is ignored
    /// (hover, foreign source, stray move).
    fn handle(&mut self, raw: &touchstone_core::RawInput, cx: &InputContext<'_>) -> Option<InputSample>;

    /// Forget every tracked pointer.
    fn reset(&mut self);
}

/// Which platform features are available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformSupport {
    /// Unified pointer events
    pub pointer_events: bool,
    /// Touch events
    pub touch: bool,
    /// Touch without a mouse
    pub only_touch: bool,
    /// Native CSS `touch-action`
    pub native_touch_action: bool,
}

impl Default for PlatformSupport {
    fn default() -> Self {
        Self {
            pointer_events: false,
            touch: true,
            only_touch: false,
            native_touch_action: true,
        }
    }
}

/// Input source selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InputClass {
    /// [`MouseSource`]
    Mouse,
    /// [`PointerSource`]
    Pointer,
    /// [`SingleTouchSource`]
    SingleTouch,
    /// [`TouchSource`]
    Touch,
    /// [`TouchMouseSource`]
    TouchMouse,
}

impl InputClass {
    /// `explicit` if given, else the best source for `support`.
    #[must_use]
    pub const fn select(explicit: Option<Self>, support: &PlatformSupport) -> Self {
        if let Some(class) = explicit {
            return class;
        }
        if support.pointer_events {
            Self::Pointer
        } else if support.only_touch {
            Self::Touch
        } else if !support.touch {
            Self::Mouse
        } else {
            Self::TouchMouse
        }
    }

    /// Instantiate the source.
    #[must_use]
    pub fn build(self, dedup: DedupConfig) -> Box<dyn InputSource> {
        match self {
            Self::Mouse => Box::new(MouseSource::new()),
            Self::Pointer => Box::new(PointerSource::new()),
            Self::SingleTouch => Box::new(SingleTouchSource::new()),
            Self::Touch => Box::new(TouchSource::new()),
            Self::TouchMouse => Box::new(TouchMouseSource::new(dedup)),
        }
    }
}

fn touch_pointer(touch: &Touch) -> Pointer {
    Pointer::new(touch.id, touch.position, touch.target)
}

/// Keep the first touch per id, then order by id.
fn unique_by_id(touches: impl IntoIterator<Item = Touch>) -> Vec<Touch> {
    let mut out: Vec<Touch> = Vec::new();
    for touch in touches {
        if !out.iter().any(|t| t.id == touch.id) {
            out.push(touch);
        }
    }
    out.sort_by_key(|t| t.id);
    out
}
