use super::{InputContext, InputSource, MouseSource, TouchSource};
use crate::compute::{InputPhase, InputSample};
use serde::{Deserialize, Serialize};
use touchstone_core::{Point, RawInput};

/// Window in which mouse events near a recent touch count as synthetic.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DedupConfig {
    /// How long a touch position is remembered, in ms
    pub timeout_ms: u64,
    /// Per-axis distance within which a mouse event matches, inclusive
    pub distance: f32,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 2500,
            distance: 25.0,
        }
    }
}

/// Touch and mouse together. Touch wins: the compatibility mouse events a
/// browser fires after a touch are dropped.
#[derive(Debug, Clone, Default)]
pub struct TouchMouseSource {
    touch: TouchSource,
    mouse: MouseSource,
    dedup: DedupConfig,
    primary_touch: Option<u32>,
    last_touches: Vec<(Point, u64)>,
}

impl TouchMouseSource {
    /// Create a source with the given de-duplication window.
    #[must_use]
    pub fn new(dedup: DedupConfig) -> Self {
        Self {
            dedup,
            ..Self::default()
        }
    }

    fn expire(&mut self, now_ms: u64) {
        let timeout = self.dedup.timeout_ms;
        self.last_touches.retain(|&(_, at)| now_ms.saturating_sub(at) < timeout);
    }

    fn record_touches(&mut self, sample: &InputSample) {
        let Some(first) = sample.changed_pointers.first() else {
            return;
        };
        match sample.phase {
            InputPhase::Start => self.primary_touch = Some(first.id),
            InputPhase::End | InputPhase::Cancel => {}
            InputPhase::Move => return,
        }
        if self.primary_touch == Some(first.id) {
            self.last_touches.push((first.position, sample.time_ms));
        }
    }

    fn is_synthetic(&self, position: Point) -> bool {
        let limit = self.dedup.distance;
        self.last_touches
            .iter()
            .any(|(t, _)| (position.x - t.x).abs() <= limit && (position.y - t.y).abs() <= limit)
    }
}

impl InputSource for TouchMouseSource {
    fn handle(&mut self, raw: &RawInput, cx: &InputContext<'_>) -> Option<InputSample> {
        self.expire(raw.time_ms());
        match raw {
            RawInput::Touch(_) => {
                let sample = self.touch.handle(raw, cx)?;
                self.record_touches(&sample);
                Some(sample)
            }
            RawInput::Mouse(mouse) => {
                let sample = self.mouse.handle(raw, cx)?;
                if mouse.fires_touch_events || self.is_synthetic(mouse.position) {
                    tracing::trace!(x = mouse.position.x, y = mouse.position.y, "dropped synthetic mouse event");
                    return None;
                }
                Some(sample)
            }
            RawInput::Pointer(_) => None,
        }
    }

    fn reset(&mut self) {
        self.touch.reset();
        self.mouse.reset();
        self.primary_touch = None;
        self.last_touches.clear();
    }
}
