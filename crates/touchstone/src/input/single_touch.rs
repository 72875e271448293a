use super::{touch_pointer, unique_by_id, InputContext, InputSource};
use crate::compute::{InputPhase, InputSample};
use touchstone_core::{PointerType, RawInput, TouchKind};

/// Touch events taken at face value, without target filtering.
#[derive(Debug, Clone, Default)]
pub struct SingleTouchSource {
    started: bool,
}

impl SingleTouchSource {
    /// Create an idle source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl InputSource for SingleTouchSource {
    fn handle(&mut self, raw: &RawInput, _cx: &InputContext<'_>) -> Option<InputSample> {
        let RawInput::Touch(event) = raw else {
            return None;
        };

        let phase = match event.kind {
            TouchKind::Start => InputPhase::Start,
            TouchKind::Move => InputPhase::Move,
            TouchKind::End => InputPhase::End,
            TouchKind::Cancel => InputPhase::Cancel,
        };
        if phase == InputPhase::Start {
            self.started = true;
        }
        if !self.started {
            return None;
        }

        let lifted = matches!(phase, InputPhase::End | InputPhase::Cancel);
        let all = if lifted {
            unique_by_id(event.touches.iter().chain(&event.changed_touches).copied())
        } else {
            event.touches.clone()
        };
        if lifted && all.len() == event.changed_touches.len() {
            self.started = false;
        }

        Some(InputSample {
            pointers: all.iter().map(touch_pointer).collect(),
            changed_pointers: event.changed_touches.iter().map(touch_pointer).collect(),
            phase,
            pointer_type: PointerType::Touch,
            src_target: event.target,
            time_ms: event.time_ms,
        })
    }

    fn reset(&mut self) {
        self.started = false;
    }
}
