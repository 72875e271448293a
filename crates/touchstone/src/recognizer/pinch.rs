//! Pinch: two pointers moving apart or together.

use super::{attr, non_negative, Context, Emission, GestureRecognizer, RecognizerOptions, RecognizerState};
use crate::compute::GestureInput;
use crate::error::GestureError;
use crate::touch_action::TouchAction;

/// Pinch recognizer options.
#[derive(Debug, Clone, PartialEq)]
pub struct PinchOptions {
    /// Event name
    pub event: String,
    /// Required pointer count (0 for any)
    pub pointers: usize,
    /// Minimal `|scale - 1|` before the pinch begins, exclusive
    pub threshold: f32,
}

impl Default for PinchOptions {
    fn default() -> Self {
        Self {
            event: "pinch".to_string(),
            pointers: 2,
            threshold: 0.0,
        }
    }
}

/// Recognizes scale changes. Emits `pinch`, `pinchstart`, `pinchmove`,
/// `pinchend`, `pinchcancel`, `pinchin` and `pinchout`.
///
/// Once begun the pinch stays valid while the pointer count holds, even if
/// the scale drifts back under the threshold.
#[derive(Debug, Clone, Default)]
pub struct Pinch {
    options: PinchOptions,
}

impl Pinch {
    /// Pinch with default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pinch with `options` merged onto the defaults.
    pub fn with_options(options: &RecognizerOptions) -> Result<Self, GestureError> {
        let mut pinch = Self::new();
        pinch.set(options)?;
        Ok(pinch)
    }
}

impl GestureRecognizer for Pinch {
    fn event(&self) -> &str {
        &self.options.event
    }

    fn kind(&self) -> &'static str {
        "pinch"
    }

    fn options(&self) -> RecognizerOptions {
        RecognizerOptions::new()
            .with_event(self.options.event.clone())
            .with_pointers(self.options.pointers)
            .with_threshold(self.options.threshold)
    }

    fn set(&mut self, options: &RecognizerOptions) -> Result<(), GestureError> {
        let mut next = self.options.clone();
        if let Some(event) = &options.event {
            next.event.clone_from(event);
        }
        if let Some(pointers) = options.pointers {
            next.pointers = pointers;
        }
        if let Some(threshold) = options.threshold {
            next.threshold = non_negative(&next.event, "threshold", threshold)?;
        }
        self.options = next;
        Ok(())
    }

    fn process(&mut self, input: &mut GestureInput, cx: &mut Context<'_>) -> RecognizerState {
        let valid = attr::pointers_match(self.options.pointers, input)
            && ((input.scale - 1.0).abs() > self.options.threshold || cx.state.is_active());
        attr::process(cx.state, input.phase, valid)
    }

    fn touch_action(&self) -> Vec<TouchAction> {
        vec![TouchAction::None]
    }

    fn emit(
        &mut self,
        state: RecognizerState,
        input: Option<&mut GestureInput>,
        _now_ms: u64,
        out: &mut Vec<Emission>,
    ) {
        let Some(input) = input else {
            return;
        };
        if input.scale != 1.0 {
            let in_out = if input.scale < 1.0 { "in" } else { "out" };
            input.additional_event = Some(format!("{}{in_out}", self.options.event));
        }
        attr::emit_states(&self.options.event, state, input, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::InputPhase;
    use crate::recognizer::attr::tests::{input_with, pair_with};
    use crate::recognizer::RecognizerId;
    use crate::timer::Timers;

    fn run(pinch: &mut Pinch, state: RecognizerState, input: &mut GestureInput) -> RecognizerState {
        let mut timers = Timers::new();
        let mut cx = Context {
            id: RecognizerId(1),
            state,
            has_require_failures: false,
            timers: &mut timers,
        };
        pinch.process(input, &mut cx)
    }

    #[test]
    fn test_begins_on_any_scale_change() {
        let mut pinch = Pinch::new();
        let mut still = pair_with(|_| {});
        assert_eq!(run(&mut pinch, RecognizerState::Possible, &mut still), RecognizerState::Failed);
        let mut spread = pair_with(|i| i.scale = 1.2);
        assert_eq!(run(&mut pinch, RecognizerState::Possible, &mut spread), RecognizerState::Began);
    }

    #[test]
    fn test_hysteresis_once_active() {
        let mut pinch = Pinch::with_options(&RecognizerOptions::new().with_threshold(0.5)).unwrap();
        let mut small = pair_with(|i| i.scale = 1.1);
        assert_eq!(run(&mut pinch, RecognizerState::Possible, &mut small), RecognizerState::Failed);
        assert_eq!(run(&mut pinch, RecognizerState::Changed, &mut small), RecognizerState::Changed);
    }

    #[test]
    fn test_pointer_loss_cancels() {
        let mut pinch = Pinch::new();
        let mut single = input_with(|i| i.scale = 1.5);
        assert_eq!(run(&mut pinch, RecognizerState::Changed, &mut single), RecognizerState::Cancelled);
    }

    #[test]
    fn test_end_phase_ends() {
        let mut pinch = Pinch::new();
        let mut end = pair_with(|i| {
            i.scale = 0.8;
            i.phase = InputPhase::End;
        });
        assert_eq!(run(&mut pinch, RecognizerState::Changed, &mut end), RecognizerState::Ended);
    }

    #[test]
    fn test_emit_in_out() {
        let mut pinch = Pinch::new();
        let mut out = Vec::new();
        let mut closing = pair_with(|i| i.scale = 0.5);
        pinch.emit(RecognizerState::Changed, Some(&mut closing), 0, &mut out);
        let names: Vec<&str> = out.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["pinchmove", "pinch", "pinchin"]);

        out.clear();
        let mut opening = pair_with(|i| i.scale = 2.0);
        pinch.emit(RecognizerState::Ended, Some(&mut opening), 0, &mut out);
        let names: Vec<&str> = out.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["pinch", "pinchout", "pinchend"]);
    }

    #[test]
    fn test_touch_action_none() {
        assert_eq!(Pinch::new().touch_action(), vec![TouchAction::None]);
    }
}
