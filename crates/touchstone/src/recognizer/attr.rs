//! Attribute test shared by continuous recognizers.
//!
//! Pan, pinch, rotate and swipe all follow the same shape: a per-sample
//! boolean test decides whether the gesture holds, and the lifecycle state
//! follows from that test, the previous state and the input phase.

use super::{Emission, RecognizerState};
use crate::compute::{GestureInput, InputPhase};

/// Pointer count check; `0` accepts any count.
#[must_use]
pub fn pointers_match(required: usize, input: &GestureInput) -> bool {
    required == 0 || input.pointers.len() == required
}

/// Next state given the attribute test result.
///
/// An active gesture is cancelled when the test stops holding or the input
/// is cancelled, ends on an End phase and otherwise moves from Began to
/// Changed. An inactive one begins when the test holds and fails otherwise.
#[must_use]
pub fn process(state: RecognizerState, phase: InputPhase, valid: bool) -> RecognizerState {
    let recognized = state.is_active();
    if recognized && (phase == InputPhase::Cancel || !valid) {
        RecognizerState::Cancelled
    } else if recognized || valid {
        if phase == InputPhase::End {
            RecognizerState::Ended
        } else if recognized {
            RecognizerState::Changed
        } else {
            RecognizerState::Began
        }
    } else {
        RecognizerState::Failed
    }
}

/// Lifecycle emission: `<event><start|move>`, `<event>`, the additional
/// event if any, then `<event><end|cancel>`.
pub fn emit_states(event: &str, state: RecognizerState, input: &GestureInput, out: &mut Vec<Emission>) {
    if !state.emits() {
        return;
    }
    if state.is_active() {
        out.push(Emission::new(format!("{event}{}", state.suffix()), input.clone()));
    }
    out.push(Emission::new(event, input.clone()));
    if let Some(additional) = &input.additional_event {
        out.push(Emission::new(additional.clone(), input.clone()));
    }
    if !state.is_active() {
        out.push(Emission::new(format!("{event}{}", state.suffix()), input.clone()));
    }
}
