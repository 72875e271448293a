//! Tap: quick touches, optionally repeated.

use super::{attr, non_negative, Context, Emission, GestureRecognizer, RecognizerOptions, RecognizerState};
use crate::compute::{GestureInput, InputPhase};
use crate::error::GestureError;
use crate::timer::{TimerAction, TimerId, TimerTask, Timers};
use crate::touch_action::TouchAction;
use touchstone_core::Point;

/// Tap recognizer options.
#[derive(Debug, Clone, PartialEq)]
pub struct TapOptions {
    /// Event name
    pub event: String,
    /// Required pointer count (0 for any)
    pub pointers: usize,
    /// Taps needed to recognize
    pub taps: u32,
    /// Maximum ms between taps, exclusive
    pub interval: u64,
    /// Maximum ms a pointer may stay down, exclusive
    pub time: u64,
    /// Allowed movement during a tap, exclusive
    pub threshold: f32,
    /// Maximum distance between consecutive taps, exclusive
    pub pos_threshold: f32,
}

impl Default for TapOptions {
    fn default() -> Self {
        Self {
            event: "tap".to_string(),
            pointers: 1,
            taps: 1,
            interval: 300,
            time: 250,
            threshold: 9.0,
            pos_threshold: 10.0,
        }
    }
}

/// Recognizes taps. A tap counts when the pointer lifts quickly without
/// moving; consecutive taps close in time and space accumulate, and the
/// recognizer fires each time the count reaches a multiple of `taps`.
///
/// When other recognizers must fail first, recognition is held back for
/// `interval` ms so that a longer multi-tap can still claim the sequence.
#[derive(Debug, Clone, Default)]
pub struct Tap {
    options: TapOptions,
    prev_time: Option<u64>,
    prev_center: Option<Point>,
    timer: Option<TimerId>,
    input: Option<GestureInput>,
    count: u32,
}

impl Tap {
    /// Tap with default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Tap with `options` merged onto the defaults.
    pub fn with_options(options: &RecognizerOptions) -> Result<Self, GestureError> {
        let mut tap = Self::new();
        tap.set(options)?;
        Ok(tap)
    }

    /// Taps counted in the current streak.
    #[must_use]
    pub const fn count(&self) -> u32 {
        self.count
    }

    fn schedule(&mut self, cx: &mut Context<'_>, due_ms: u64, action: TimerAction) {
        let task = TimerTask {
            recognizer: cx.id,
            action,
        };
        self.timer = Some(cx.timers.schedule(due_ms, task));
    }

    fn fail_timeout(&mut self, cx: &mut Context<'_>, time_ms: u64) -> RecognizerState {
        self.schedule(cx, time_ms + self.options.interval, TimerAction::Fail);
        RecognizerState::Failed
    }
}

impl GestureRecognizer for Tap {
    fn event(&self) -> &str {
        &self.options.event
    }

    fn kind(&self) -> &'static str {
        "tap"
    }

    fn options(&self) -> RecognizerOptions {
        RecognizerOptions::new()
            .with_event(self.options.event.clone())
            .with_pointers(self.options.pointers)
            .with_taps(self.options.taps)
            .with_interval(self.options.interval)
            .with_time(self.options.time)
            .with_threshold(self.options.threshold)
            .with_pos_threshold(self.options.pos_threshold)
    }

    fn set(&mut self, options: &RecognizerOptions) -> Result<(), GestureError> {
        let mut next = self.options.clone();
        if let Some(event) = &options.event {
            next.event.clone_from(event);
        }
        if let Some(pointers) = options.pointers {
            next.pointers = pointers;
        }
        if let Some(taps) = options.taps {
            if taps == 0 {
                return Err(GestureError::invalid(&next.event, "taps", "must be at least 1"));
            }
            next.taps = taps;
        }
        if let Some(interval) = options.interval {
            next.interval = interval;
        }
        if let Some(time) = options.time {
            next.time = time;
        }
        if let Some(threshold) = options.threshold {
            next.threshold = non_negative(&next.event, "threshold", threshold)?;
        }
        if let Some(pos_threshold) = options.pos_threshold {
            next.pos_threshold = non_negative(&next.event, "pos_threshold", pos_threshold)?;
        }
        self.options = next;
        Ok(())
    }

    fn process(&mut self, input: &mut GestureInput, cx: &mut Context<'_>) -> RecognizerState {
        let valid_pointers = attr::pointers_match(self.options.pointers, input);
        let valid_movement = input.distance < self.options.threshold;
        let valid_touch_time = input.delta_time < self.options.time;

        self.reset(cx.timers);

        if input.phase == InputPhase::Start && self.count == 0 {
            return self.fail_timeout(cx, input.time_ms);
        }

        if valid_movement && valid_touch_time && valid_pointers {
            if input.phase != InputPhase::End {
                return self.fail_timeout(cx, input.time_ms);
            }

            let valid_interval = self
                .prev_time
                .map_or(true, |prev| input.time_ms.saturating_sub(prev) < self.options.interval);
            let valid_multi_tap = self
                .prev_center
                .map_or(true, |prev| prev.distance(&input.center) < self.options.pos_threshold);

            self.prev_time = Some(input.time_ms);
            self.prev_center = Some(input.center);
            self.count = if valid_interval && valid_multi_tap {
                self.count + 1
            } else {
                1
            };
            self.input = Some(input.clone());

            if self.count % self.options.taps == 0 {
                if !cx.has_require_failures {
                    return RecognizerState::RECOGNIZED;
                }
                self.schedule(cx, input.time_ms + self.options.interval, TimerAction::Recognize);
                return RecognizerState::Began;
            }
        }
        RecognizerState::Failed
    }

    fn touch_action(&self) -> Vec<TouchAction> {
        vec![TouchAction::Manipulation]
    }

    fn reset(&mut self, timers: &mut Timers) {
        if let Some(timer) = self.timer.take() {
            timers.cancel(timer);
        }
    }

    fn emit(
        &mut self,
        state: RecognizerState,
        _input: Option<&mut GestureInput>,
        _now_ms: u64,
        out: &mut Vec<Emission>,
    ) {
        if state != RecognizerState::RECOGNIZED {
            return;
        }
        if let Some(tapped) = self.input.as_mut() {
            tapped.tap_count = Some(self.count);
            out.push(Emission::new(self.options.event.clone(), tapped.clone()));
        }
    }
}
