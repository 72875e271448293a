//! Testing tools for touchstone.
//!
//! - [`Script`]: timed raw input with gesture-shaped builders
//! - [`Harness`]: a manager on an in-memory tree that records what it emits
//!
//! ```
//! use touchstone_core::Point;
//! use touchstone_test::{Harness, Script, ROOT};
//!
//! let mut harness = Harness::preset().unwrap();
//! harness.play(&Script::on(ROOT).touch_tap(0, Point::new(10.0, 10.0), 0, 60));
//! harness.assert_fired("tap");
//! ```

#![allow(clippy::missing_panics_doc)]

pub mod harness;
pub mod script;

pub use harness::{event_names, Harness, Recorded, Recorder, ROOT};
pub use script::{Script, ScriptError};
