//! Gesture recognizers.
//!
//! A [`Recognizer`] wraps one [`GestureRecognizer`] implementation with the
//! bookkeeping the manager needs: identity, lifecycle state, the enable flag
//! and the `simultaneous` / `require_failure` relations.
//!
//! # State machine
//!
//! ```text
//!              +--> Began --> Changed* --+--> Ended (recognized)
//!  Possible ---+                         +--> Cancelled
//!              +--> Ended (atomic gestures such as tap)
//!              +--> Failed
//! ```
//!
//! Terminal states drop back to `Possible` at the start of the next cycle.

pub mod attr;
mod pan;
mod pinch;
mod press;
mod rotate;
mod swipe;
mod tap;

pub use pan::{Pan, PanOptions};
pub use pinch::{Pinch, PinchOptions};
pub use press::{Press, PressOptions};
pub use rotate::{Rotate, RotateOptions};
pub use swipe::{Swipe, SwipeOptions};
pub use tap::{Tap, TapOptions};

use crate::compute::GestureInput;
use crate::error::GestureError;
use crate::timer::Timers;
use crate::touch_action::TouchAction;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::rc::Rc;
use touchstone_core::Direction;

/// Identifier allocated by the owning manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize)]
pub struct RecognizerId(pub(crate) u32);

impl RecognizerId {
    /// Raw value.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for RecognizerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Lifecycle state of a recognizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecognizerState {
    /// Waiting for input
    #[default]
    Possible,
    /// Gesture started
    Began,
    /// Gesture continues
    Changed,
    /// Gesture completed
    Ended,
    /// Gesture aborted after it began
    Cancelled,
    /// Gesture not detected
    Failed,
}

impl RecognizerState {
    /// Alias of [`Ended`](Self::Ended) for discrete gestures.
    pub const RECOGNIZED: Self = Self::Ended;

    /// Ended, Cancelled or Failed.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Ended | Self::Cancelled | Self::Failed)
    }

    /// Began or Changed: the gesture is in progress.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Began | Self::Changed)
    }

    /// States that produce events.
    #[must_use]
    pub const fn emits(self) -> bool {
        matches!(self, Self::Began | Self::Changed | Self::Ended | Self::Cancelled)
    }

    /// States that claim exclusive status in a session.
    #[must_use]
    pub const fn claims(self) -> bool {
        matches!(self, Self::Began | Self::Changed | Self::Ended)
    }

    /// Whether a recognizer in this state lets dependents emit.
    #[must_use]
    pub const fn releases_dependents(self) -> bool {
        matches!(self, Self::Failed | Self::Possible)
    }

    /// Event name suffix: `start`, `move`, `end`, `cancel` or empty.
    #[must_use]
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::Began => "start",
            Self::Changed => "move",
            Self::Ended => "end",
            Self::Cancelled => "cancel",
            Self::Possible | Self::Failed => "",
        }
    }
}

impl fmt::Display for RecognizerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Possible => "possible",
            Self::Began => "began",
            Self::Changed => "changed",
            Self::Ended => "ended",
            Self::Cancelled => "cancelled",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Built-in recognizer kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecognizerType {
    /// Single or multi pointer drag
    Pan,
    /// Two pointer scale
    Pinch,
    /// Two pointer rotation
    Rotate,
    /// Fast directional release
    Swipe,
    /// Long hold
    Press,
    /// Single or multi tap
    Tap,
}

impl RecognizerType {
    /// Build a recognizer with `options` merged onto the type's defaults.
    pub fn build(self, options: &RecognizerOptions) -> Result<Box<dyn GestureRecognizer>, GestureError> {
        Ok(match self {
            Self::Pan => Box::new(Pan::with_options(options)?),
            Self::Pinch => Box::new(Pinch::with_options(options)?),
            Self::Rotate => Box::new(Rotate::with_options(options)?),
            Self::Swipe => Box::new(Swipe::with_options(options)?),
            Self::Press => Box::new(Press::with_options(options)?),
            Self::Tap => Box::new(Tap::with_options(options)?),
        })
    }

    /// Lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pan => "pan",
            Self::Pinch => "pinch",
            Self::Rotate => "rotate",
            Self::Swipe => "swipe",
            Self::Press => "press",
            Self::Tap => "tap",
        }
    }
}

/// Partial recognizer options.
///
/// Unset fields keep their current value; fields a recognizer does not
/// understand are ignored by it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RecognizerOptions {
    /// Event name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,
    /// Whether the recognizer runs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable: Option<bool>,
    /// Required pointer count (0 for any)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pointers: Option<usize>,
    /// Distance, scale or rotation threshold
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f32>,
    /// Allowed directions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<Direction>,
    /// Minimal velocity in px/ms
    #[serde(skip_serializing_if = "Option::is_none")]
    pub velocity: Option<f32>,
    /// Hold duration in ms
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<u64>,
    /// Taps required
    #[serde(skip_serializing_if = "Option::is_none")]
    pub taps: Option<u32>,
    /// Maximum ms between taps
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval: Option<u64>,
    /// Maximum distance between taps
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pos_threshold: Option<f32>,
}

impl RecognizerOptions {
    /// Empty options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the event name.
    #[must_use]
    pub fn with_event(mut self, event: impl Into<String>) -> Self {
        self.event = Some(event.into());
        self
    }

    /// Set the enable flag.
    #[must_use]
    pub const fn with_enable(mut self, enable: bool) -> Self {
        self.enable = Some(enable);
        self
    }

    /// Set the pointer count.
    #[must_use]
    pub const fn with_pointers(mut self, pointers: usize) -> Self {
        self.pointers = Some(pointers);
        self
    }

    /// Set the threshold.
    #[must_use]
    pub const fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = Some(threshold);
        self
    }

    /// Set the direction mask.
    #[must_use]
    pub const fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = Some(direction);
        self
    }

    /// Set the velocity.
    #[must_use]
    pub const fn with_velocity(mut self, velocity: f32) -> Self {
        self.velocity = Some(velocity);
        self
    }

    /// Set the time.
    #[must_use]
    pub const fn with_time(mut self, time: u64) -> Self {
        self.time = Some(time);
        self
    }

    /// Set the tap count.
    #[must_use]
    pub const fn with_taps(mut self, taps: u32) -> Self {
        self.taps = Some(taps);
        self
    }

    /// Set the tap interval.
    #[must_use]
    pub const fn with_interval(mut self, interval: u64) -> Self {
        self.interval = Some(interval);
        self
    }

    /// Set the tap position threshold.
    #[must_use]
    pub const fn with_pos_threshold(mut self, pos_threshold: f32) -> Self {
        self.pos_threshold = Some(pos_threshold);
        self
    }
}

/// Reject negative or non-finite values.
pub(crate) fn non_negative(event: &str, field: &'static str, value: f32) -> Result<f32, GestureError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(GestureError::invalid(event, field, format!("must be a non-negative number, got {value}")))
    }
}

/// A named event produced by a recognizer.
#[derive(Debug, Clone, PartialEq)]
pub struct Emission {
    /// Event name
    pub name: String,
    /// Sample the event carries
    pub input: GestureInput,
}

impl Emission {
    /// Create an emission.
    #[must_use]
    pub fn new(name: impl Into<String>, input: GestureInput) -> Self {
        Self {
            name: name.into(),
            input,
        }
    }
}

/// Per-cycle view the manager hands to [`GestureRecognizer::process`].
pub struct Context<'a> {
    /// Identity of the recognizer, used to own timers
    pub id: RecognizerId,
    /// State at the start of the cycle (terminal states already reset)
    pub state: RecognizerState,
    /// Whether other recognizers must fail before this one may emit
    pub has_require_failures: bool,
    /// Timer queue for delayed transitions
    pub timers: &'a mut Timers,
}

/// The behaviour of one gesture type.
pub trait GestureRecognizer: fmt::Debug {
    /// Base event name (`pan`, `doubletap`, ...).
    fn event(&self) -> &str;

    /// Kind name for diagnostics.
    fn kind(&self) -> &'static str;

    /// Current options, fully populated.
    fn options(&self) -> RecognizerOptions;

    /// Merge options onto the current ones.
    fn set(&mut self, options: &RecognizerOptions) -> Result<(), GestureError>;

    /// Consume one sample and return the next state.
    fn process(&mut self, input: &mut GestureInput, cx: &mut Context<'_>) -> RecognizerState;

    /// Preferred touch actions while enabled.
    fn touch_action(&self) -> Vec<TouchAction>;

    /// Drop timers and transient flags.
    fn reset(&mut self, timers: &mut Timers) {
        let _ = timers;
    }

    /// Produce events for `state`. `input` is `None` when a timer fired.
    fn emit(
        &mut self,
        state: RecognizerState,
        input: Option<&mut GestureInput>,
        now_ms: u64,
        out: &mut Vec<Emission>,
    );
}

type EnablePredicate = Rc<dyn Fn(&GestureInput) -> bool>;

/// A gesture recognizer registered with a manager.
pub struct Recognizer {
    pub(crate) id: RecognizerId,
    pub(crate) state: RecognizerState,
    enabled: bool,
    enable_when: Option<EnablePredicate>,
    pub(crate) simultaneous: BTreeSet<RecognizerId>,
    pub(crate) require_fail: Vec<RecognizerId>,
    pub(crate) gesture: Box<dyn GestureRecognizer>,
}

impl Recognizer {
    /// Wrap a gesture implementation. The id is assigned when added to a manager.
    #[must_use]
    pub fn new(gesture: impl GestureRecognizer + 'static) -> Self {
        Self::from_boxed(Box::new(gesture))
    }

    /// Wrap a boxed gesture implementation.
    #[must_use]
    pub fn from_boxed(gesture: Box<dyn GestureRecognizer>) -> Self {
        Self {
            id: RecognizerId::default(),
            state: RecognizerState::Possible,
            enabled: true,
            enable_when: None,
            simultaneous: BTreeSet::new(),
            require_fail: Vec::new(),
            gesture,
        }
    }

    /// Build a built-in recognizer.
    pub fn from_type(kind: RecognizerType, options: &RecognizerOptions) -> Result<Self, GestureError> {
        let mut recognizer = Self::from_boxed(kind.build(options)?);
        if let Some(enable) = options.enable {
            recognizer.enabled = enable;
        }
        Ok(recognizer)
    }

    /// Manager-assigned id.
    #[must_use]
    pub const fn id(&self) -> RecognizerId {
        self.id
    }

    /// Event name.
    #[must_use]
    pub fn event(&self) -> &str {
        self.gesture.event()
    }

    /// Kind name.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        self.gesture.kind()
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> RecognizerState {
        self.state
    }

    /// Enable flag, ignoring any predicate.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Current options including the enable flag.
    #[must_use]
    pub fn options(&self) -> RecognizerOptions {
        let mut options = self.gesture.options();
        options.enable = Some(self.enabled);
        options
    }

    /// Merge options; `event` renames the recognizer.
    pub fn set(&mut self, options: &RecognizerOptions) -> Result<(), GestureError> {
        self.gesture.set(options)?;
        if let Some(enable) = options.enable {
            self.enabled = enable;
        }
        Ok(())
    }

    /// Set the enable flag.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Gate recognition on a predicate evaluated per sample.
    pub fn set_enable_when(&mut self, predicate: impl Fn(&GestureInput) -> bool + 'static) {
        self.enable_when = Some(Rc::new(predicate));
    }

    /// Remove the enable predicate.
    pub fn clear_enable_when(&mut self) {
        self.enable_when = None;
    }

    /// Whether the recognizer may run on `input`.
    pub(crate) fn allows(&self, input: &GestureInput) -> bool {
        self.enabled && self.enable_when.as_ref().map_or(true, |p| p(input))
    }

    /// Whether this recognizer may run while `other` is active.
    #[must_use]
    pub fn can_recognize_with(&self, other: RecognizerId) -> bool {
        self.simultaneous.contains(&other)
    }

    /// Whether other recognizers must fail before this one emits.
    #[must_use]
    pub fn has_require_failures(&self) -> bool {
        !self.require_fail.is_empty()
    }

    /// Recognizers allowed to run simultaneously.
    #[must_use]
    pub fn simultaneous(&self) -> impl Iterator<Item = RecognizerId> + '_ {
        self.simultaneous.iter().copied()
    }

    /// Recognizers that must fail first.
    #[must_use]
    pub fn require_failures(&self) -> &[RecognizerId] {
        &self.require_fail
    }

    /// Preferred touch actions.
    #[must_use]
    pub fn touch_action(&self) -> Vec<TouchAction> {
        self.gesture.touch_action()
    }

    pub(crate) fn forget(&mut self, other: RecognizerId) {
        self.simultaneous.remove(&other);
        self.require_fail.retain(|id| *id != other);
    }
}

impl fmt::Debug for Recognizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Recognizer")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("enabled", &self.enabled)
            .field("enable_when", &self.enable_when.is_some())
            .field("simultaneous", &self.simultaneous)
            .field("require_fail", &self.require_fail)
            .field("gesture", &self.gesture)
            .finish()
    }
}
