//! Timed raw input scripts.
//!
//! A [`Script`] is an ordered list of raw events with absolute timestamps.
//! Builders cover the common shapes (taps, drags, pinches, rotations) so
//! tests read as gestures rather than event soup; scripts also load from
//! YAML for replay.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use touchstone_core::{
    ElementId, MouseInput, MouseKind, Point, PointerId, PointerInput, PointerKind, PointerType, RawInput, Touch,
    TouchInput, TouchKind,
};

/// Error loading a script.
#[derive(Debug, Error)]
pub enum ScriptError {
    /// The YAML could not be parsed.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    /// Timestamps go backwards.
    #[error("event {index} at {time_ms}ms is earlier than the previous event")]
    OutOfOrder {
        /// Position in the script
        index: usize,
        /// Offending timestamp
        time_ms: u64,
    },
}

/// An ordered list of raw events.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Script {
    /// Element generated events target
    #[serde(default)]
    pub target: ElementId,
    /// Events in time order
    #[serde(default)]
    pub events: Vec<RawInput>,
}

impl Script {
    /// Empty script targeting element 0.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty script whose generated events target `target`.
    #[must_use]
    pub fn on(target: ElementId) -> Self {
        Self {
            target,
            events: Vec::new(),
        }
    }

    /// Parse a script from YAML.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is invalid or timestamps decrease.
    pub fn from_yaml(yaml: &str) -> Result<Self, ScriptError> {
        let script: Self = serde_yaml_ng::from_str(yaml)?;
        script.validate()?;
        Ok(script)
    }

    /// Serialize to YAML.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_yaml(&self) -> Result<String, ScriptError> {
        Ok(serde_yaml_ng::to_string(self)?)
    }

    /// Check that timestamps never decrease.
    ///
    /// # Errors
    ///
    /// Returns the first out-of-order event.
    pub fn validate(&self) -> Result<(), ScriptError> {
        for (index, pair) in self.events.windows(2).enumerate() {
            if pair[1].time_ms() < pair[0].time_ms() {
                return Err(ScriptError::OutOfOrder {
                    index: index + 1,
                    time_ms: pair[1].time_ms(),
                });
            }
        }
        Ok(())
    }

    /// Timestamp of the last event.
    #[must_use]
    pub fn end_ms(&self) -> u64 {
        self.events.last().map_or(0, RawInput::time_ms)
    }

    /// Number of events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the script is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Append a raw event.
    #[must_use]
    pub fn push(mut self, raw: impl Into<RawInput>) -> Self {
        self.events.push(raw.into());
        self
    }

    /// Append every event of `other`.
    #[must_use]
    pub fn then(mut self, other: Self) -> Self {
        self.events.extend(other.events);
        self
    }

    // === Mouse ===

    /// One mouse event.
    #[must_use]
    pub fn mouse(self, kind: MouseKind, at: Point, time_ms: u64) -> Self {
        let target = self.target;
        self.push(MouseInput::new(kind, at, time_ms).with_target(target))
    }

    /// Press and release in place.
    #[must_use]
    pub fn mouse_tap(self, at: Point, start_ms: u64, hold_ms: u64) -> Self {
        self.mouse(MouseKind::Down, at, start_ms)
            .mouse(MouseKind::Up, at, start_ms + hold_ms)
    }

    /// Press at `from`, move in `steps` even steps to `to`, release there.
    #[must_use]
    pub fn mouse_drag(mut self, from: Point, to: Point, start_ms: u64, duration_ms: u64, steps: u32) -> Self {
        self = self.mouse(MouseKind::Down, from, start_ms);
        for (at, time_ms) in path(from, to, start_ms, duration_ms, steps) {
            self = self.mouse(MouseKind::Move, at, time_ms);
        }
        self.mouse(MouseKind::Up, to, start_ms + duration_ms)
    }

    // === Pointer ===

    /// One pointer event.
    #[must_use]
    pub fn pointer(self, kind: PointerKind, id: u32, pointer_type: PointerType, at: Point, time_ms: u64) -> Self {
        let target = self.target;
        self.push(PointerInput::new(kind, PointerId(id), pointer_type, at, time_ms).with_target(target))
    }

    /// A touch-type pointer dragged from `from` to `to`.
    #[must_use]
    pub fn pointer_drag(mut self, id: u32, from: Point, to: Point, start_ms: u64, duration_ms: u64, steps: u32) -> Self {
        self = self.pointer(PointerKind::Down, id, PointerType::Touch, from, start_ms);
        for (at, time_ms) in path(from, to, start_ms, duration_ms, steps) {
            self = self.pointer(PointerKind::Move, id, PointerType::Touch, at, time_ms);
        }
        self.pointer(PointerKind::Up, id, PointerType::Touch, to, start_ms + duration_ms)
    }

    // === Touch ===

    fn touch_at(&self, id: u32, at: Point) -> Touch {
        Touch::new(id, at).with_target(self.target)
    }

    /// One touch event.
    #[must_use]
    pub fn touch(self, kind: TouchKind, touches: Vec<Touch>, changed: Vec<Touch>, time_ms: u64) -> Self {
        let target = self.target;
        self.push(TouchInput::new(kind, touches, changed, time_ms).with_target(target))
    }

    /// One finger down and up in place.
    #[must_use]
    pub fn touch_tap(self, id: u32, at: Point, start_ms: u64, hold_ms: u64) -> Self {
        let t = self.touch_at(id, at);
        self.touch(TouchKind::Start, vec![t], vec![t], start_ms)
            .touch(TouchKind::End, vec![], vec![t], start_ms + hold_ms)
    }

    /// One finger dragged from `from` to `to`.
    #[must_use]
    pub fn touch_drag(mut self, id: u32, from: Point, to: Point, start_ms: u64, duration_ms: u64, steps: u32) -> Self {
        let first = self.touch_at(id, from);
        self = self.touch(TouchKind::Start, vec![first], vec![first], start_ms);
        for (at, time_ms) in path(from, to, start_ms, duration_ms, steps) {
            let t = self.touch_at(id, at);
            self = self.touch(TouchKind::Move, vec![t], vec![t], time_ms);
        }
        let last = self.touch_at(id, to);
        self.touch(TouchKind::End, vec![], vec![last], start_ms + duration_ms)
    }

    /// Two fingers placed together, moved through `frames`, lifted together.
    ///
    /// Each frame gives the positions of fingers 0 and 1.
    #[must_use]
    pub fn two_finger(mut self, frames: &[(Point, Point)], start_ms: u64, step_ms: u64) -> Self {
        let Some(&(a0, b0)) = frames.first() else {
            return self;
        };
        let pair = |s: &Self, a: Point, b: Point| vec![s.touch_at(0, a), s.touch_at(1, b)];

        let first = pair(&self, a0, b0);
        self = self.touch(TouchKind::Start, first.clone(), first, start_ms);
        let mut time_ms = start_ms;
        let mut last = (a0, b0);
        for &(a, b) in &frames[1..] {
            time_ms += step_ms;
            let both = pair(&self, a, b);
            self = self.touch(TouchKind::Move, both.clone(), both, time_ms);
            last = (a, b);
        }
        let lifted = pair(&self, last.0, last.1);
        self.touch(TouchKind::End, vec![], lifted, time_ms + step_ms)
    }

    /// Two fingers on a horizontal line through `center`, spreading from
    /// `from_radius` to `to_radius`.
    #[must_use]
    pub fn pinch(self, center: Point, from_radius: f32, to_radius: f32, start_ms: u64, step_ms: u64, steps: u32) -> Self {
        let frames: Vec<(Point, Point)> = (0..=steps)
            .map(|i| {
                let r = lerp(from_radius, to_radius, i, steps);
                (Point::new(center.x - r, center.y), Point::new(center.x + r, center.y))
            })
            .collect();
        self.two_finger(&frames, start_ms, step_ms)
    }

    /// Two fingers at `radius` around `center`, turning by `degrees`.
    #[must_use]
    pub fn rotate(self, center: Point, radius: f32, degrees: f32, start_ms: u64, step_ms: u64, steps: u32) -> Self {
        let frames: Vec<(Point, Point)> = (0..=steps)
            .map(|i| {
                let angle = lerp(0.0, degrees, i, steps).to_radians();
                let (dx, dy) = (radius * angle.cos(), radius * angle.sin());
                (Point::new(center.x - dx, center.y - dy), Point::new(center.x + dx, center.y + dy))
            })
            .collect();
        self.two_finger(&frames, start_ms, step_ms)
    }
}

fn lerp(from: f32, to: f32, i: u32, steps: u32) -> f32 {
    if steps == 0 {
        return to;
    }
    from + (to - from) * (i as f32 / steps as f32)
}

/// Intermediate move positions, excluding the start and including `to`.
fn path(from: Point, to: Point, start_ms: u64, duration_ms: u64, steps: u32) -> Vec<(Point, u64)> {
    (1..=steps)
        .map(|i| {
            let t = i as f32 / steps as f32;
            let time_ms = start_ms + duration_ms * u64::from(i) / u64::from(steps);
            (from.lerp(&to, t), time_ms)
        })
        .collect()
}
