//! Touchstone: multi-pointer gesture recognition.
//!
//! Raw mouse, pointer and touch events go in; named gesture events
//! (`panstart`, `pinchin`, `doubletap`, `press`, ...) come out.
//!
//! ```
//! use std::rc::Rc;
//! use touchstone::{Manager, ManagerOptions};
//! use touchstone_core::{ElementId, ElementTree, MouseInput, MouseKind, Point, RawInput, Surface};
//!
//! let root = ElementId(1);
//! let surface: Rc<dyn Surface> = Rc::new(ElementTree::new(root));
//! let mut manager = Manager::with_preset(surface, root).unwrap();
//! manager.on("tap", |event| println!("tap at {:?}", event.input.center));
//!
//! let down = MouseInput::new(MouseKind::Down, Point::new(10.0, 10.0), 0).with_target(root);
//! let up = MouseInput::new(MouseKind::Up, Point::new(10.0, 10.0), 80).with_target(root);
//! manager.handle(&RawInput::Mouse(down));
//! manager.handle(&RawInput::Mouse(up));
//! // Timers (press, tap intervals) fire on later input or here
//! manager.advance(400);
//! ```
//!
//! # Layout
//!
//! - [`input`]: raw events to [`InputSample`]s
//! - [`compute`]: samples to [`GestureInput`] kinematics per [`Session`]
//! - [`recognizer`]: the gesture state machines
//! - [`Manager`]: arbitration, timers and event dispatch
//! - [`ManagerOptions`]: serde configuration and the stock preset

pub mod bus;
pub mod compute;
pub mod config;
pub mod error;
pub mod input;
pub mod manager;
pub mod recognizer;
pub mod timer;
pub mod touch_action;

#[cfg(target_arch = "wasm32")]
pub mod browser;

pub use bus::{EventBus, GestureEvent, HandlerId};
pub use compute::{GestureInput, InputPhase, InputSample, Pointer, Session, StopMode};
pub use config::{ManagerOptions, RecognizerSpec};
pub use error::GestureError;
pub use input::{DedupConfig, InputClass, InputSource, PlatformSupport};
pub use manager::{InputOutcome, Manager, SetOptions};
pub use recognizer::{
    GestureRecognizer, Recognizer, RecognizerId, RecognizerOptions, RecognizerState, RecognizerType,
};
pub use touch_action::{TouchAction, TouchActionSetting};

/// Event emitted for every computed sample, before recognition.
pub const INPUT_EVENT: &str = "touchstone.input";
