//! Rotate: two pointers turning around their center.

use super::{attr, non_negative, Context, Emission, GestureRecognizer, RecognizerOptions, RecognizerState};
use crate::compute::GestureInput;
use crate::error::GestureError;
use crate::touch_action::TouchAction;

/// Rotate recognizer options.
#[derive(Debug, Clone, PartialEq)]
pub struct RotateOptions {
    /// Event name
    pub event: String,
    /// Required pointer count (0 for any)
    pub pointers: usize,
    /// Minimal rotation in degrees before the gesture begins, exclusive
    pub threshold: f32,
}

impl Default for RotateOptions {
    fn default() -> Self {
        Self {
            event: "rotate".to_string(),
            pointers: 2,
            threshold: 0.0,
        }
    }
}

/// Recognizes rotation. Emits `rotate`, `rotatestart`, `rotatemove`,
/// `rotateend` and `rotatecancel`.
#[derive(Debug, Clone, Default)]
pub struct Rotate {
    options: RotateOptions,
}

impl Rotate {
    /// Rotate with default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rotate with `options` merged onto the defaults.
    pub fn with_options(options: &RecognizerOptions) -> Result<Self, GestureError> {
        let mut rotate = Self::new();
        rotate.set(options)?;
        Ok(rotate)
    }
}

impl GestureRecognizer for Rotate {
    fn event(&self) -> &str {
        &self.options.event
    }

    fn kind(&self) -> &'static str {
        "rotate"
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
            && (input.rotation.abs() > self.options.threshold || cx.state.is_active());
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
        if let Some(input) = input {
            attr::emit_states(&self.options.event, state, input, out);
        }
    }
}
