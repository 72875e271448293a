use super::{InputContext, InputSource};
use crate::compute::{InputPhase, InputSample, Pointer};
use touchstone_core::{MouseButton, PointerKind, PointerType, RawInput};

/// Unified pointer events. Keeps pointers in the order they went down.
#[derive(Debug, Clone, Default)]
pub struct PointerSource {
    store: Vec<Pointer>,
}

impl PointerSource {
    /// Create an empty source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pointers currently down.
    #[must_use]
    pub fn active(&self) -> &[Pointer] {
        &self.store
    }
}

impl InputSource for PointerSource {
    fn handle(&mut self, raw: &RawInput, _cx: &InputContext<'_>) -> Option<InputSample> {
        let RawInput::Pointer(event) = raw else {
            return None;
        };

        let phase = match event.kind {
            PointerKind::Down => InputPhase::Start,
            PointerKind::Move => InputPhase::Move,
            PointerKind::Up => InputPhase::End,
            PointerKind::Cancel | PointerKind::Out => InputPhase::Cancel,
        };
        let is_touch = event.pointer_type == PointerType::Touch;
        let pointer = Pointer::new(event.pointer_id.0, event.position, event.target);

        let mut index = self.store.iter().position(|p| p.id == pointer.id);
        let mut remove = false;
        if phase == InputPhase::Start && (event.button == Some(MouseButton::Left) || is_touch) {
            if index.is_none() {
                self.store.push(pointer);
                index = Some(self.store.len() - 1);
            }
        } else if matches!(phase, InputPhase::End | InputPhase::Cancel) {
            remove = true;
        }

        // Not down: a hover
        let index = index?;
        self.store[index] = pointer;

        let sample = InputSample {
            pointers: self.store.clone(),
            changed_pointers: vec![pointer],
            phase,
            pointer_type: event.pointer_type,
            src_target: event.target,
            time_ms: event.time_ms,
        };
        if remove {
            self.store.remove(index);
        }
        Some(sample)
    }

    fn reset(&mut self) {
        self.store.clear();
    }
}
