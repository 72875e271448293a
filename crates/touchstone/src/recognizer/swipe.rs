//! Swipe: a fast directional release.

use super::{attr, non_negative, Context, Emission, GestureRecognizer, RecognizerOptions, RecognizerState};
use crate::compute::{GestureInput, InputPhase};
use crate::error::GestureError;
use crate::touch_action::TouchAction;
use touchstone_core::Direction;

/// Swipe recognizer options.
#[derive(Debug, Clone, PartialEq)]
pub struct SwipeOptions {
    /// Event name
    pub event: String,
    /// Required pointer count, compared against the session maximum
    pub pointers: usize,
    /// Minimal distance, exclusive
    pub threshold: f32,
    /// Minimal velocity in px/ms, exclusive
    pub velocity: f32,
    /// Allowed directions
    pub direction: Direction,
}

impl Default for SwipeOptions {
    fn default() -> Self {
        Self {
            event: "swipe".to_string(),
            pointers: 1,
            threshold: 10.0,
            velocity: 0.3,
            direction: Direction::HORIZONTAL | Direction::VERTICAL,
        }
    }
}

/// Recognizes swipes on release. Emits `swipe<dir>` then `swipe`.
#[derive(Debug, Clone, Default)]
pub struct Swipe {
    options: SwipeOptions,
}

impl Swipe {
    /// Swipe with default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Swipe with `options` merged onto the defaults.
    pub fn with_options(options: &RecognizerOptions) -> Result<Self, GestureError> {
        let mut swipe = Self::new();
        swipe.set(options)?;
        Ok(swipe)
    }

    /// Session velocity along the configured axes.
    fn velocity(&self, input: &GestureInput) -> f32 {
        let direction = self.options.direction;
        let horizontal = direction.intersects(Direction::HORIZONTAL);
        let vertical = direction.intersects(Direction::VERTICAL);
        match (horizontal, vertical) {
            (true, false) => input.overall_velocity_x,
            (false, true) => input.overall_velocity_y,
            _ => input.overall_velocity,
        }
    }

    fn attr_test(&self, input: &GestureInput) -> bool {
        attr::pointers_match(self.options.pointers, input)
            && self.options.direction.intersects(input.offset_direction)
            && input.distance > self.options.threshold
            && input.max_pointers == self.options.pointers
            && self.velocity(input).abs() > self.options.velocity
            && input.phase == InputPhase::End
    }
}

impl GestureRecognizer for Swipe {
    fn event(&self) -> &str {
        &self.options.event
    }

    fn kind(&self) -> &'static str {
        "swipe"
    }

    fn options(&self) -> RecognizerOptions {
        RecognizerOptions::new()
            .with_event(self.options.event.clone())
            .with_pointers(self.options.pointers)
            .with_threshold(self.options.threshold)
            .with_velocity(self.options.velocity)
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
        if let Some(velocity) = options.velocity {
            next.velocity = non_negative(&next.event, "velocity", velocity)?;
        }
        if let Some(direction) = options.direction {
            next.direction = direction;
        }
        self.options = next;
        Ok(())
    }

    fn process(&mut self, input: &mut GestureInput, cx: &mut Context<'_>) -> RecognizerState {
        let valid = self.attr_test(input);
        attr::process(cx.state, input.phase, valid)
    }

    fn touch_action(&self) -> Vec<TouchAction> {
        TouchAction::for_direction(self.options.direction)
    }

    fn emit(
        &mut self,
        _state: RecognizerState,
        input: Option<&mut GestureInput>,
        _now_ms: u64,
        out: &mut Vec<Emission>,
    ) {
        let Some(input) = input else {
            return;
        };
        let suffix = input.offset_direction.suffix();
        if !suffix.is_empty() {
            out.push(Emission::new(format!("{}{suffix}", self.options.event), input.clone()));
        }
        out.push(Emission::new(self.options.event.clone(), input.clone()));
    }
}
