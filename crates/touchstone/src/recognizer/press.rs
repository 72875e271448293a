//! Press: a pointer held still for a while.

use super::{non_negative, Context, Emission, GestureRecognizer, RecognizerOptions, RecognizerState};
use crate::compute::{GestureInput, InputPhase};
use crate::error::GestureError;
use crate::timer::{TimerAction, TimerId, TimerTask, Timers};
use crate::touch_action::TouchAction;

/// Press recognizer options.
#[derive(Debug, Clone, PartialEq)]
pub struct PressOptions {
    /// Event name
    pub event: String,
    /// Required pointer count (0 for any)
    pub pointers: usize,
    /// Hold duration in ms, exclusive
    pub time: u64,
    /// Allowed movement while held, exclusive
    pub threshold: f32,
}

impl Default for PressOptions {
    fn default() -> Self {
        Self {
            event: "press".to_string(),
            pointers: 1,
            time: 251,
            threshold: 9.0,
        }
    }
}

/// Recognizes long holds. Emits `press` when the hold time elapses and
/// `pressup` when the pointer lifts after that.
#[derive(Debug, Clone, Default)]
pub struct Press {
    options: PressOptions,
    timer: Option<TimerId>,
    input: Option<GestureInput>,
}

impl Press {
    /// Press with default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Press with `options` merged onto the defaults.
    pub fn with_options(options: &RecognizerOptions) -> Result<Self, GestureError> {
        let mut press = Self::new();
        press.set(options)?;
        Ok(press)
    }

    /// Whether a hold timer is running.
    #[must_use]
    pub const fn is_waiting(&self) -> bool {
        self.timer.is_some()
    }
}

impl GestureRecognizer for Press {
    fn event(&self) -> &str {
        &self.options.event
    }

    fn kind(&self) -> &'static str {
        "press"
    }

    fn options(&self) -> RecognizerOptions {
        RecognizerOptions::new()
            .with_event(self.options.event.clone())
            .with_pointers(self.options.pointers)
            .with_time(self.options.time)
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
        if let Some(time) = options.time {
            next.time = time;
        }
        if let Some(threshold) = options.threshold {
            next.threshold = non_negative(&next.event, "threshold", threshold)?;
        }
        self.options = next;
        Ok(())
    }

    fn process(&mut self, input: &mut GestureInput, cx: &mut Context<'_>) -> RecognizerState {
        let valid_pointers = super::attr::pointers_match(self.options.pointers, input);
        let valid_movement = input.distance < self.options.threshold;
        let valid_time = input.delta_time > self.options.time;
        let lifted = matches!(input.phase, InputPhase::End | InputPhase::Cancel);

        self.input = Some(input.clone());

        if !valid_movement || !valid_pointers || (lifted && !valid_time) {
            self.reset(cx.timers);
        } else if input.phase == InputPhase::Start {
            self.reset(cx.timers);
            let task = TimerTask {
                recognizer: cx.id,
                action: TimerAction::Recognize,
            };
            self.timer = Some(cx.timers.schedule(input.time_ms + self.options.time, task));
        } else if input.phase == InputPhase::End {
            return RecognizerState::RECOGNIZED;
        }
        RecognizerState::Failed
    }

    fn touch_action(&self) -> Vec<TouchAction> {
        vec![TouchAction::Auto]
    }

    fn reset(&mut self, timers: &mut Timers) {
        if let Some(timer) = self.timer.take() {
            timers.cancel(timer);
        }
    }

    fn emit(
        &mut self,
        state: RecognizerState,
        input: Option<&mut GestureInput>,
        now_ms: u64,
        out: &mut Vec<Emission>,
    ) {
        if state != RecognizerState::RECOGNIZED {
            return;
        }
        match input {
            Some(input) if input.phase == InputPhase::End => {
                out.push(Emission::new(format!("{}up", self.options.event), input.clone()));
            }
            _ => {
                // Fired by the hold timer
                self.timer = None;
                if let Some(held) = self.input.as_mut() {
                    held.time_ms = now_ms;
                    out.push(Emission::new(self.options.event.clone(), held.clone()));
                }
            }
        }
    }
}
