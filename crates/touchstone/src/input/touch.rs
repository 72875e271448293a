use super::{touch_pointer, unique_by_id, InputContext, InputSource};
use crate::compute::{InputPhase, InputSample};
use std::collections::BTreeSet;
use touchstone_core::{PointerType, RawInput, Touch, TouchKind};

/// Multi-touch events restricted to touches that started inside the
/// listening element, so that two managers on one screen each see only
/// their own fingers.
#[derive(Debug, Clone, Default)]
pub struct TouchSource {
    target_ids: BTreeSet<u32>,
}

impl TouchSource {
    /// Create an empty source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Ids of touches that started inside the target.
    pub fn tracked(&self) -> impl Iterator<Item = u32> + '_ {
        self.target_ids.iter().copied()
    }

    fn touches(
        &mut self,
        phase: InputPhase,
        all: &[Touch],
        changed: &[Touch],
        cx: &InputContext<'_>,
    ) -> Option<(Vec<Touch>, Vec<Touch>)> {
        if matches!(phase, InputPhase::Start | InputPhase::Move) && all.len() == 1 {
            self.target_ids.insert(all[0].id);
            return Some((all.to_vec(), all.to_vec()));
        }

        let target_touches: Vec<Touch> = all
            .iter()
            .filter(|t| cx.surface.contains(cx.target, t.target))
            .copied()
            .collect();

        if phase == InputPhase::Start {
            self.target_ids.extend(target_touches.iter().map(|t| t.id));
        }

        let lifted = matches!(phase, InputPhase::End | InputPhase::Cancel);
        let mut changed_target = Vec::new();
        for touch in changed {
            if self.target_ids.contains(&touch.id) {
                changed_target.push(*touch);
            }
            if lifted {
                self.target_ids.remove(&touch.id);
            }
        }
        if changed_target.is_empty() {
            return None;
        }

        // Lifted touches are gone from `all` but belong in the sample
        let merged = unique_by_id(target_touches.into_iter().chain(changed_target.iter().copied()));
        Some((merged, changed_target))
    }
}

impl InputSource for TouchSource {
    fn handle(&mut self, raw: &RawInput, cx: &InputContext<'_>) -> Option<InputSample> {
        let RawInput::Touch(event) = raw else {
            return None;
        };

        let phase = match event.kind {
            TouchKind::Start => InputPhase::Start,
            TouchKind::Move => InputPhase::Move,
            TouchKind::End => InputPhase::End,
            TouchKind::Cancel => InputPhase::Cancel,
        };
        let (all, changed) = self.touches(phase, &event.touches, &event.changed_touches, cx)?;

        Some(InputSample {
            pointers: all.iter().map(touch_pointer).collect(),
            changed_pointers: changed.iter().map(touch_pointer).collect(),
            phase,
            pointer_type: PointerType::Touch,
            src_target: event.target,
            time_ms: event.time_ms,
        })
    }

    fn reset(&mut self) {
        self.target_ids.clear();
    }
}
