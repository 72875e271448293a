//! Manager configuration.
//!
//! Configuration is plain serde data so that hosts can ship gesture setups
//! as YAML or JSON:
//!
//! ```yaml
//! touch_action: compute
//! recognizers:
//!   - type: tap
//!   - type: tap
//!     options: { event: doubletap, taps: 2 }
//!     with: [tap]
//! ```

use crate::error::GestureError;
use crate::input::{DedupConfig, InputClass, PlatformSupport};
use crate::recognizer::{RecognizerOptions, RecognizerType};
use crate::touch_action::TouchActionSetting;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use touchstone_core::{Direction, ElementId};

/// One recognizer to install.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RecognizerSpec {
    /// Recognizer kind
    #[serde(rename = "type")]
    pub kind: RecognizerType,
    /// Options merged onto the kind's defaults
    #[serde(default, skip_serializing_if = "is_default")]
    pub options: RecognizerOptions,
    /// Event names allowed to run simultaneously
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub with: Vec<String>,
    /// Event names that must fail before this one emits
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub require_failure: Vec<String>,
}

fn is_default(options: &RecognizerOptions) -> bool {
    *options == RecognizerOptions::default()
}

impl RecognizerSpec {
    /// A recognizer of `kind` with default options.
    #[must_use]
    pub fn new(kind: RecognizerType) -> Self {
        Self {
            kind,
            options: RecognizerOptions::default(),
            with: Vec::new(),
            require_failure: Vec::new(),
        }
    }

    /// Set options.
    #[must_use]
    pub fn with_options(mut self, options: RecognizerOptions) -> Self {
        self.options = options;
        self
    }

    /// Add a simultaneous partner.
    #[must_use]
    pub fn recognize_with(mut self, event: impl Into<String>) -> Self {
        self.with.push(event.into());
        self
    }

    /// Add a recognizer that must fail first.
    #[must_use]
    pub fn require_failure(mut self, event: impl Into<String>) -> Self {
        self.require_failure.push(event.into());
        self
    }

    /// Event name this spec registers under.
    #[must_use]
    pub fn event(&self) -> &str {
        self.options.event.as_deref().unwrap_or(self.kind.as_str())
    }
}

/// Everything needed to build a [`Manager`](crate::Manager).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ManagerOptions {
    /// Touch-action policy
    pub touch_action: TouchActionSetting,
    /// Mirror events through the surface
    pub dom_events: bool,
    /// Handle input at all
    pub enable: bool,
    /// Element the input source listens on (defaults to the root)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_target: Option<ElementId>,
    /// Force an input source instead of picking one from `support`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_class: Option<InputClass>,
    /// Platform capabilities
    pub support: PlatformSupport,
    /// Touch/mouse de-duplication window
    pub dedup: DedupConfig,
    /// Recognizers in registration order
    pub recognizers: Vec<RecognizerSpec>,
}

impl Default for ManagerOptions {
    fn default() -> Self {
        Self {
            touch_action: TouchActionSetting::Compute,
            dom_events: false,
            enable: true,
            input_target: None,
            input_class: None,
            support: PlatformSupport::default(),
            dedup: DedupConfig::default(),
            recognizers: Vec::new(),
        }
    }
}

impl ManagerOptions {
    /// The stock recognizer set.
    ///
    /// Rotate and pinch start disabled; pan and swipe are horizontal; tap
    /// and doubletap may both fire.
    #[must_use]
    pub fn preset() -> Self {
        Self {
            recognizers: vec![
                RecognizerSpec::new(RecognizerType::Rotate)
                    .with_options(RecognizerOptions::new().with_enable(false)),
                RecognizerSpec::new(RecognizerType::Pinch)
                    .with_options(RecognizerOptions::new().with_enable(false))
                    .recognize_with("rotate"),
                RecognizerSpec::new(RecognizerType::Swipe)
                    .with_options(RecognizerOptions::new().with_direction(Direction::HORIZONTAL)),
                RecognizerSpec::new(RecognizerType::Pan)
                    .with_options(RecognizerOptions::new().with_direction(Direction::HORIZONTAL))
                    .recognize_with("swipe"),
                RecognizerSpec::new(RecognizerType::Tap),
                RecognizerSpec::new(RecognizerType::Tap)
                    .with_options(RecognizerOptions::new().with_event("doubletap").with_taps(2))
                    .recognize_with("tap"),
                RecognizerSpec::new(RecognizerType::Press),
            ],
            ..Self::default()
        }
    }

    /// Parse options from YAML.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is invalid or fails validation.
    pub fn from_yaml(yaml: &str) -> Result<Self, GestureError> {
        let options: Self = serde_yaml_ng::from_str(yaml)?;
        options.validate()?;
        Ok(options)
    }

    /// Parse options from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is invalid or fails validation.
    pub fn from_json(json: &str) -> Result<Self, GestureError> {
        let options: Self = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    /// Serialize to YAML.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_yaml(&self) -> Result<String, GestureError> {
        Ok(serde_yaml_ng::to_string(self)?)
    }

    /// Validate the configuration.
    ///
    /// Checks:
    /// 1. Every recognizer's options are in range
    /// 2. Event names are unique
    /// 3. Relations name registered recognizers other than their owner
    ///
    /// # Errors
    ///
    /// Returns the first validation error found.
    pub fn validate(&self) -> Result<(), GestureError> {
        self.validate_options()?;
        self.validate_names()?;
        self.validate_relations()?;
        Ok(())
    }

    fn validate_options(&self) -> Result<(), GestureError> {
        for spec in &self.recognizers {
            spec.kind.build(&spec.options)?;
        }
        Ok(())
    }

    fn validate_names(&self) -> Result<(), GestureError> {
        let mut seen = HashSet::new();
        for spec in &self.recognizers {
            if !seen.insert(spec.event()) {
                return Err(GestureError::DuplicateRecognizer(spec.event().to_string()));
            }
        }
        Ok(())
    }

    fn validate_relations(&self) -> Result<(), GestureError> {
        let names: HashSet<&str> = self.recognizers.iter().map(RecognizerSpec::event).collect();
        for spec in &self.recognizers {
            for other in spec.with.iter().chain(&spec.require_failure) {
                if other == spec.event() {
                    return Err(GestureError::SelfRelation(other.clone()));
                }
                if !names.contains(other.as_str()) {
                    return Err(GestureError::UnknownRecognizer(other.clone()));
                }
            }
        }
        Ok(())
    }
}
