use super::{InputContext, InputSource};
use crate::compute::{InputPhase, InputSample, Pointer};
use touchstone_core::{MouseButton, MouseKind, PointerType, RawInput, PRIMARY_BUTTON};

/// Mouse events. Only drags with the primary button count.
#[derive(Debug, Clone, Default)]
pub struct MouseSource {
    pressed: bool,
}

impl MouseSource {
    /// Create an idle source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the primary button is held.
    #[must_use]
    pub const fn is_pressed(&self) -> bool {
        self.pressed
    }
}

impl InputSource for MouseSource {
    fn handle(&mut self, raw: &RawInput, _cx: &InputContext<'_>) -> Option<InputSample> {
        let RawInput::Mouse(mouse) = raw else {
            return None;
        };

        let mut phase = match mouse.kind {
            MouseKind::Down => InputPhase::Start,
            MouseKind::Move => InputPhase::Move,
            MouseKind::Up => InputPhase::End,
        };
        if phase == InputPhase::Start && mouse.button == MouseButton::Left {
            self.pressed = true;
        }
        // Button released outside the window
        if phase == InputPhase::Move && mouse.buttons & PRIMARY_BUTTON == 0 {
            phase = InputPhase::End;
        }
        if !self.pressed {
            return None;
        }
        if phase == InputPhase::End {
            self.pressed = false;
        }

        let pointer = Pointer::new(0, mouse.position, mouse.target);
        Some(InputSample {
            pointers: vec![pointer],
            changed_pointers: vec![pointer],
            phase,
            pointer_type: PointerType::Mouse,
            src_target: mouse.target,
            time_ms: mouse.time_ms,
        })
    }

    fn reset(&mut self) {
        self.pressed = false;
    }
}
