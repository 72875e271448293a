//! The recognizer manager.
//!
//! A [`Manager`] owns everything one gesture surface needs: the input
//! source, the session, the ordered recognizer list, the timer queue and
//! the event bus. Every raw event runs exactly one recognition cycle:
//!
//! 1. fire timers that came due before the event
//! 2. normalize the event into a sample and fold it into the session
//! 3. emit [`INPUT_EVENT`](crate::INPUT_EVENT) with the computed sample
//! 4. let each recognizer, in registration order, process its own clone
//!
//! The first recognizer that begins (or recognizes) claims the session;
//! afterwards only it and recognizers declared simultaneous with it run.

use crate::bus::{EventBus, GestureEvent, HandlerId};
use crate::compute::{GestureInput, InputSample, Session, StopMode};
use crate::config::ManagerOptions;
use crate::error::GestureError;
use crate::input::{DedupConfig, InputClass, InputContext, InputSource, PlatformSupport};
use crate::recognizer::{Context, Recognizer, RecognizerId, RecognizerOptions, RecognizerState};
use crate::timer::{TimerAction, Timers};
use crate::touch_action::{self, Prevention, TouchActionSetting};
use crate::INPUT_EVENT;
use std::fmt;
use std::rc::Rc;
use touchstone_core::{ElementId, RawInput, Surface};
use tracing::{debug, trace};

/// Result of handling one raw event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InputOutcome {
    /// The event produced a sample and ran a recognition cycle
    pub handled: bool,
    /// The platform's default action should be suppressed
    pub default_prevented: bool,
}

/// Partial manager settings for [`Manager::set`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetOptions {
    /// Touch-action policy
    pub touch_action: Option<TouchActionSetting>,
    /// Also dispatch events through [`Surface::dispatch`]
    pub dom_events: Option<bool>,
    /// Whether input is handled at all
    pub enable: Option<bool>,
    /// Element the input source listens on
    pub input_target: Option<ElementId>,
}

impl SetOptions {
    /// Empty settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the touch-action policy.
    #[must_use]
    pub fn with_touch_action(mut self, setting: impl Into<TouchActionSetting>) -> Self {
        self.touch_action = Some(setting.into());
        self
    }

    /// Toggle surface dispatch.
    #[must_use]
    pub const fn with_dom_events(mut self, dom_events: bool) -> Self {
        self.dom_events = Some(dom_events);
        self
    }

    /// Toggle input handling.
    #[must_use]
    pub const fn with_enable(mut self, enable: bool) -> Self {
        self.enable = Some(enable);
        self
    }

    /// Change the listening element.
    #[must_use]
    pub const fn with_input_target(mut self, target: ElementId) -> Self {
        self.input_target = Some(target);
        self
    }
}

#[derive(Debug, Clone)]
struct Settings {
    touch_action: TouchActionSetting,
    dom_events: bool,
    enable: bool,
    input_target: Option<ElementId>,
}

type ManagerPredicate = Rc<dyn Fn() -> bool>;

/// Gesture recognition for one root element.
pub struct Manager {
    surface: Rc<dyn Surface>,
    root: ElementId,
    settings: Settings,
    enable_when: Option<ManagerPredicate>,
    support: PlatformSupport,
    input_class: InputClass,
    input: Box<dyn InputSource>,
    session: Session,
    recognizers: Vec<Recognizer>,
    timers: Timers,
    bus: EventBus,
    touch_action: String,
    next_id: u32,
    now_ms: u64,
    default_prevented: bool,
}

impl Manager {
    /// Build a manager and install the configured recognizers.
    ///
    /// Relations (`with`, `require_failure`) are resolved after every
    /// recognizer is added, so they may refer forward. Options are checked
    /// with [`ManagerOptions::validate`] first.
    pub fn new(surface: Rc<dyn Surface>, root: ElementId, options: ManagerOptions) -> Result<Self, GestureError> {
        options.validate()?;
        let input_class = InputClass::select(options.input_class, &options.support);
        let mut manager = Self {
            surface,
            root,
            settings: Settings {
                touch_action: options.touch_action,
                dom_events: options.dom_events,
                enable: options.enable,
                input_target: options.input_target,
            },
            enable_when: None,
            support: options.support,
            input_class,
            input: input_class.build(options.dedup),
            session: Session::new(),
            recognizers: Vec::new(),
            timers: Timers::new(),
            bus: EventBus::new(),
            touch_action: String::new(),
            next_id: 0,
            now_ms: 0,
            default_prevented: false,
        };
        manager.update_touch_action();

        let mut names = Vec::with_capacity(options.recognizers.len());
        for spec in &options.recognizers {
            let recognizer = Recognizer::from_type(spec.kind, &spec.options)?;
            names.push(recognizer.event().to_string());
            manager.add(recognizer);
        }
        for (name, spec) in names.iter().zip(&options.recognizers) {
            for other in &spec.with {
                manager.recognize_with(name, other)?;
            }
            for other in &spec.require_failure {
                manager.require_failure(name, other)?;
            }
        }

        debug!(
            root = root.0,
            input = ?input_class,
            recognizers = manager.recognizers.len(),
            touch_action = %manager.touch_action,
            "manager ready"
        );
        Ok(manager)
    }

    /// Build a manager with the default recognizer preset.
    pub fn with_preset(surface: Rc<dyn Surface>, root: ElementId) -> Result<Self, GestureError> {
        Self::new(surface, root, ManagerOptions::preset())
    }

    /// Root element.
    #[must_use]
    pub const fn root(&self) -> ElementId {
        self.root
    }

    /// Selected input source.
    #[must_use]
    pub const fn input_class(&self) -> InputClass {
        self.input_class
    }

    /// Current session.
    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// Shared event bus.
    #[must_use]
    pub const fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Latest time seen, in ms.
    #[must_use]
    pub const fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Due time of the next pending timer.
    #[must_use]
    pub fn next_timer(&self) -> Option<u64> {
        self.timers.next_due()
    }

    /// Resolved touch-action value.
    #[must_use]
    pub fn touch_action(&self) -> &str {
        &self.touch_action
    }

    /// Registered recognizers in registration order.
    #[must_use]
    pub fn recognizers(&self) -> &[Recognizer] {
        &self.recognizers
    }

    /// Whether input is handled.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.settings.enable && self.enable_when.as_ref().map_or(true, |p| p())
    }

    /// Handle one raw event.
    pub fn handle(&mut self, raw: &RawInput) -> InputOutcome {
        self.advance(raw.time_ms());
        self.default_prevented = false;
        if !self.is_enabled() {
            return InputOutcome::default();
        }

        let cx = InputContext {
            surface: self.surface.as_ref(),
            target: self.settings.input_target.unwrap_or(self.root),
        };
        let Some(sample) = self.input.handle(raw, &cx) else {
            trace!(event = raw.name(), "ignored");
            return InputOutcome::default();
        };
        self.input_handler(sample);

        InputOutcome {
            handled: true,
            default_prevented: self.default_prevented,
        }
    }

    /// Fire every timer due at or before `now_ms`.
    pub fn advance(&mut self, now_ms: u64) {
        self.now_ms = self.now_ms.max(now_ms);
        while let Some((due, task)) = self.timers.pop_due(now_ms) {
            let Some(index) = self.index_of(task.recognizer) else {
                continue;
            };
            trace!(recognizer = %self.recognizers[index].event(), due, action = ?task.action, "timer fired");
            match task.action {
                TimerAction::Recognize => {
                    self.recognizers[index].state = RecognizerState::RECOGNIZED;
                    self.try_emit(index, None, due);
                }
                TimerAction::Fail => {
                    self.recognizers[index].state = RecognizerState::Failed;
                }
            }
        }
    }

    fn input_handler(&mut self, sample: InputSample) {
        let is_first = sample.is_first();
        let is_final = sample.is_final();
        if is_first {
            self.session = Session::new();
            // A stop can strand a recognizer mid-gesture
            for recognizer in &mut self.recognizers {
                if recognizer.state.is_active() {
                    recognizer.gesture.reset(&mut self.timers);
                    recognizer.state = RecognizerState::Possible;
                }
            }
        }

        let input = self
            .session
            .compute(sample, is_first, is_final, self.surface.as_ref(), self.root);
        trace!(
            phase = ?input.phase,
            pointers = input.pointers.len(),
            x = input.center.x,
            y = input.center.y,
            dx = input.delta_x,
            dy = input.delta_y,
            velocity = input.velocity,
            "input"
        );

        self.emit(INPUT_EVENT, &input);
        self.recognize(&input);
        self.session.set_prev_input(&input);
    }

    /// Run one recognition cycle over a computed sample.
    pub fn recognize(&mut self, input: &GestureInput) {
        match self.session.stopped {
            Some(StopMode::Forced) => return,
            Some(StopMode::Soft) => {
                debug!(active = ?self.session.active, "soft stop releases active recognizer");
                self.session.active = None;
                self.session.stopped = None;
            }
            None => {}
        }

        if !self.support.native_touch_action {
            match touch_action::prevent_defaults(&self.touch_action, input, self.session.prevented) {
                Prevention::Allow => {}
                Prevention::Prevent => self.default_prevented = true,
                Prevention::PreventSession => {
                    self.session.prevented = true;
                    self.default_prevented = true;
                }
            }
        }

        if let Some(active) = self.session.active {
            let finished = self
                .index_of(active)
                .map_or(true, |i| self.recognizers[i].state == RecognizerState::RECOGNIZED);
            if finished {
                self.session.active = None;
            }
        }

        for index in 0..self.recognizers.len() {
            let active = self.session.active;
            let recognizer = &self.recognizers[index];
            let allowed = self.session.stopped != Some(StopMode::Forced)
                && active.map_or(true, |a| recognizer.id == a || recognizer.can_recognize_with(a));

            if allowed {
                self.run(index, input);
            } else {
                let recognizer = &mut self.recognizers[index];
                recognizer.gesture.reset(&mut self.timers);
            }

            let recognizer = &self.recognizers[index];
            if active.is_none() && recognizer.state.claims() {
                debug!(recognizer = %recognizer.event(), state = %recognizer.state, "claimed session");
                self.session.active = Some(recognizer.id);
            }
        }
    }

    fn run(&mut self, index: usize, input: &GestureInput) {
        let mut sample = input.clone();
        let recognizer = &mut self.recognizers[index];
        if !recognizer.allows(&sample) {
            recognizer.gesture.reset(&mut self.timers);
            recognizer.state = RecognizerState::Failed;
            return;
        }
        if recognizer.state.is_terminal() {
            recognizer.state = RecognizerState::Possible;
        }

        let previous = recognizer.state;
        let mut cx = Context {
            id: recognizer.id,
            state: previous,
            has_require_failures: recognizer.has_require_failures(),
            timers: &mut self.timers,
        };
        let next = recognizer.gesture.process(&mut sample, &mut cx);
        if next != previous && next != RecognizerState::Failed {
            debug!(recognizer = %recognizer.event(), from = %previous, to = %next, "state");
        }
        recognizer.state = next;

        if next.emits() {
            self.try_emit(index, Some(&mut sample), input.time_ms);
        }
    }

    /// Emit if no required recognizer is still in play, else fail.
    fn try_emit(&mut self, index: usize, input: Option<&mut GestureInput>, now_ms: u64) {
        if !self.can_emit(index) {
            let recognizer = &mut self.recognizers[index];
            debug!(recognizer = %recognizer.event(), "blocked by require-failure");
            recognizer.state = RecognizerState::Failed;
            return;
        }

        let recognizer = &mut self.recognizers[index];
        let mut out = Vec::new();
        recognizer.gesture.emit(recognizer.state, input, now_ms, &mut out);
        for emission in out {
            self.emit(&emission.name, &emission.input);
        }
    }

    fn can_emit(&self, index: usize) -> bool {
        self.recognizers[index].require_fail.iter().all(|required| {
            self.index_of(*required)
                .map_or(true, |i| self.recognizers[i].state.releases_dependents())
        })
    }

    /// Dispatch a named event to subscribers (and the surface when
    /// `dom_events` is on). Handlers may prevent the default or stop the
    /// session through the event.
    pub fn emit(&mut self, name: &str, input: &GestureInput) {
        if self.settings.dom_events {
            let detail = serde_json::to_string(input).unwrap_or_default();
            self.surface.dispatch(input.target, name, &detail);
        }
        if !self.bus.has_handlers(name) {
            return;
        }

        let event = GestureEvent::new(name, input.clone());
        self.bus.emit(&event);
        if event.is_default_prevented() {
            self.default_prevented = true;
        }
        if let Some(mode) = event.stop_request() {
            self.stop(mode == StopMode::Forced);
        }
    }

    /// Stop recognition for this session.
    ///
    /// A forced stop refuses every recognizer, including the rest of the
    /// current cycle, until the next sequence starts. A soft stop only
    /// releases the active recognizer's claim at the next cycle.
    pub fn stop(&mut self, force: bool) {
        let mode = if force || self.session.stopped == Some(StopMode::Forced) {
            StopMode::Forced
        } else {
            StopMode::Soft
        };
        debug!(mode = ?mode, "stop");
        self.session.stopped = Some(mode);
    }

    /// Subscribe to whitespace-separated event names.
    pub fn on(&self, events: &str, handler: impl Fn(&GestureEvent) + 'static) -> HandlerId {
        self.bus.on(events, handler)
    }

    /// Unsubscribe one handler, or all when `id` is `None`.
    pub fn off(&self, events: &str, id: Option<HandlerId>) {
        self.bus.off(events, id);
    }

    /// Recognizer registered under `event`.
    #[must_use]
    pub fn get(&self, event: &str) -> Option<&Recognizer> {
        self.recognizers.iter().find(|r| r.event() == event)
    }

    /// Register a recognizer, replacing any with the same event name.
    pub fn add(&mut self, mut recognizer: Recognizer) -> RecognizerId {
        let event = recognizer.event().to_string();
        if self.get(&event).is_some() {
            self.remove(&event);
        }

        self.next_id += 1;
        recognizer.id = RecognizerId(self.next_id);
        recognizer.state = RecognizerState::Possible;
        let id = recognizer.id;
        debug!(recognizer = %event, kind = recognizer.kind(), id = %id, "added");
        self.recognizers.push(recognizer);
        self.update_touch_action();
        id
    }

    /// Unregister a recognizer. Its timers are cancelled and other
    /// recognizers forget their relations to it.
    pub fn remove(&mut self, event: &str) -> Option<Recognizer> {
        let index = self.recognizers.iter().position(|r| r.event() == event)?;
        let mut recognizer = self.recognizers.remove(index);
        recognizer.gesture.reset(&mut self.timers);
        self.timers.cancel_for(recognizer.id);
        for other in &mut self.recognizers {
            other.forget(recognizer.id);
        }
        if self.session.active == Some(recognizer.id) {
            self.session.active = None;
        }
        debug!(recognizer = %event, "removed");
        self.update_touch_action();
        Some(recognizer)
    }

    fn index_of(&self, id: RecognizerId) -> Option<usize> {
        self.recognizers.iter().position(|r| r.id == id)
    }

    fn index_named(&self, event: &str) -> Result<usize, GestureError> {
        self.recognizers
            .iter()
            .position(|r| r.event() == event)
            .ok_or_else(|| GestureError::UnknownRecognizer(event.to_string()))
    }

    /// Let `event` and `other` be active in the same session. Mutual.
    pub fn recognize_with(&mut self, event: &str, other: &str) -> Result<(), GestureError> {
        let a = self.index_named(event)?;
        let b = self.index_named(other)?;
        let (id_a, id_b) = (self.recognizers[a].id, self.recognizers[b].id);
        self.recognizers[a].simultaneous.insert(id_b);
        self.recognizers[b].simultaneous.insert(id_a);
        Ok(())
    }

    /// Stop `event` from running alongside `other`. Only `event`'s side of
    /// the relation is dropped.
    pub fn drop_recognize_with(&mut self, event: &str, other: &str) -> Result<(), GestureError> {
        let a = self.index_named(event)?;
        let id_b = self.recognizers[self.index_named(other)?].id;
        self.recognizers[a].simultaneous.remove(&id_b);
        Ok(())
    }

    /// Hold back `event`'s emissions until `other` has failed.
    pub fn require_failure(&mut self, event: &str, other: &str) -> Result<(), GestureError> {
        let a = self.index_named(event)?;
        let id_b = self.recognizers[self.index_named(other)?].id;
        let list = &mut self.recognizers[a].require_fail;
        if !list.contains(&id_b) {
            list.push(id_b);
        }
        Ok(())
    }

    /// Undo [`require_failure`](Self::require_failure).
    pub fn drop_require_failure(&mut self, event: &str, other: &str) -> Result<(), GestureError> {
        let a = self.index_named(event)?;
        let id_b = self.recognizers[self.index_named(other)?].id;
        self.recognizers[a].require_fail.retain(|id| *id != id_b);
        Ok(())
    }

    /// Merge options onto a registered recognizer.
    pub fn set_recognizer_options(&mut self, event: &str, options: &RecognizerOptions) -> Result<(), GestureError> {
        let index = self.index_named(event)?;
        self.recognizers[index].set(options)?;
        self.update_touch_action();
        Ok(())
    }

    /// Enable or disable a registered recognizer.
    pub fn set_enabled(&mut self, event: &str, enabled: bool) -> Result<(), GestureError> {
        let index = self.index_named(event)?;
        self.recognizers[index].set_enabled(enabled);
        self.update_touch_action();
        Ok(())
    }

    /// Gate a registered recognizer on a per-sample predicate.
    pub fn set_recognizer_enable_when(
        &mut self,
        event: &str,
        predicate: impl Fn(&GestureInput) -> bool + 'static,
    ) -> Result<(), GestureError> {
        let index = self.index_named(event)?;
        self.recognizers[index].set_enable_when(predicate);
        Ok(())
    }

    /// Gate all input handling on a predicate.
    pub fn set_enable_when(&mut self, predicate: impl Fn() -> bool + 'static) {
        self.enable_when = Some(Rc::new(predicate));
    }

    /// Remove the input gate predicate.
    pub fn clear_enable_when(&mut self) {
        self.enable_when = None;
    }

    /// Change manager settings.
    pub fn set(&mut self, options: SetOptions) {
        if let Some(dom_events) = options.dom_events {
            self.settings.dom_events = dom_events;
        }
        if let Some(enable) = options.enable {
            self.settings.enable = enable;
        }
        if let Some(setting) = options.touch_action {
            self.settings.touch_action = setting;
            self.update_touch_action();
        }
        if let Some(target) = options.input_target {
            self.settings.input_target = Some(target);
            self.input.reset();
        }
    }

    fn update_touch_action(&mut self) {
        let value = match &self.settings.touch_action {
            TouchActionSetting::Compute => touch_action::compute(
                self.recognizers
                    .iter()
                    .filter(|r| r.is_enabled())
                    .flat_map(Recognizer::touch_action),
            )
            .as_str()
            .to_string(),
            TouchActionSetting::Literal(value) => value.clone(),
        };
        if value != self.touch_action {
            debug!(touch_action = %value, "touch-action");
            self.touch_action = value;
        }
    }

    /// Tear down: cancel timers, drop handlers and forget the session.
    pub fn destroy(mut self) {
        for recognizer in &mut self.recognizers {
            recognizer.gesture.reset(&mut self.timers);
        }
        self.timers.clear();
        self.bus.clear();
        self.session = Session::new();
        self.input.reset();
        debug!(root = self.root.0, "destroyed");
    }
}

impl fmt::Debug for Manager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Manager")
            .field("root", &self.root)
            .field("settings", &self.settings)
            .field("input_class", &self.input_class)
            .field("session", &self.session)
            .field("recognizers", &self.recognizers)
            .field("timers", &self.timers)
            .field("touch_action", &self.touch_action)
            .field("now_ms", &self.now_ms)
            .finish_non_exhaustive()
    }
}
