//! Pan: a drag past a distance threshold in an allowed direction.

use super::{attr, non_negative, Context, Emission, GestureRecognizer, RecognizerOptions, RecognizerState};
use crate::compute::GestureInput;
use crate::error::GestureError;
use crate::touch_action::TouchAction;
use touchstone_core::Direction;

/// Pan recognizer options.
#[derive(Debug, Clone, PartialEq)]
pub struct PanOptions {
    /// Event name
    pub event: String,
    /// Required pointer count (0 for any)
    pub pointers: usize,
    /// Minimal distance before the pan begins, exclusive
    pub threshold: f32,
    /// Allowed directions
    pub direction: Direction,
}

impl Default for PanOptions {
    fn default() -> Self {
        Self {
            event: "pan".to_string(),
            pointers: 1,
            threshold: 10.0,
            direction: Direction::ALL,
        }
    }
}

/// Recognizes drags. Emits `pan`, `panstart`, `panmove`, `panend`,
/// `pancancel` and a direction event (`panleft`, ...).
///
/// With a single-axis direction mask the pan locks to that axis: movement
/// is measured along it only, and a sample must move along it since the
/// last emission to count.
#[derive(Debug, Clone, Default)]
pub struct Pan {
    options: PanOptions,
    prev_x: Option<f32>,
    prev_y: Option<f32>,
}

impl Pan {
    /// Pan with default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pan with `options` merged onto the defaults.
    pub fn with_options(options: &RecognizerOptions) -> Result<Self, GestureError> {
        let mut pan = Self::new();
        pan.set(options)?;
        Ok(pan)
    }

    /// Current options.
    #[must_use]
    pub const fn pan_options(&self) -> &PanOptions {
        &self.options
    }

    fn direction_test(&self, input: &mut GestureInput) -> bool {
        let wanted = self.options.direction;
        let mut has_moved = true;
        let mut distance = input.distance;
        let mut direction = input.direction;
        let (x, y) = (input.delta_x, input.delta_y);

        if !direction.intersects(wanted) {
            if wanted.intersects(Direction::HORIZONTAL) {
                direction = if x == 0.0 {
                    Direction::NONE
                } else if x < 0.0 {
                    Direction::LEFT
                } else {
                    Direction::RIGHT
                };
                has_moved = self.prev_x != Some(x);
                distance = x.abs();
            } else {
                direction = if y == 0.0 {
                    Direction::NONE
                } else if y < 0.0 {
                    Direction::UP
                } else {
                    Direction::DOWN
                };
                has_moved = self.prev_y != Some(y);
                distance = y.abs();
            }
        }
        input.direction = direction;
        has_moved && distance > self.options.threshold && direction.intersects(wanted)
    }
}

impl GestureRecognizer for Pan {
    fn event(&self) -> &str {
        &self.options.event
    }

    fn kind(&self) -> &'static str {
        "pan"
    }

    fn options(&self) -> RecognizerOptions {
        RecognizerOptions::new()
            .with_event(self.options.event.clone())
            .with_pointers(self.options.pointers)
            .with_threshold(self.options.threshold)
            .with_direction(self.options.direction)
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
        if let Some(direction) = options.direction {
            next.direction = direction;
        }
        self.options = next;
        Ok(())
    }

    fn process(&mut self, input: &mut GestureInput, cx: &mut Context<'_>) -> RecognizerState {
        let valid = attr::pointers_match(self.options.pointers, input)
            && (cx.state.is_active() || self.direction_test(input));
        attr::process(cx.state, input.phase, valid)
    }

    fn touch_action(&self) -> Vec<TouchAction> {
        TouchAction::for_direction(self.options.direction)
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
        self.prev_x = Some(input.delta_x);
        self.prev_y = Some(input.delta_y);

        let suffix = input.direction.suffix();
        if !suffix.is_empty() {
            input.additional_event = Some(format!("{}{suffix}", self.options.event));
        }
        attr::emit_states(&self.options.event, state, input, out);
    }
}
