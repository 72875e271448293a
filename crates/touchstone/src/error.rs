//! Error types for manager setup and configuration.

use thiserror::Error;
use touchstone_core::ParseDirectionError;

/// Errors surfaced while building or reconfiguring a [`Manager`](crate::Manager).
///
/// Input handling itself never fails; these only come out of setup paths.
#[derive(Debug, Error)]
pub enum GestureError {
    /// A recognizer was referenced by an event name that is not registered.
    #[error("Unknown recognizer: {0}")]
    UnknownRecognizer(String),

    /// Two recognizers in one configuration share an event name.
    #[error("Duplicate recognizer: {0}")]
    DuplicateRecognizer(String),

    /// A recognizer was related to itself.
    #[error("Recognizer '{0}' cannot be related to itself")]
    SelfRelation(String),

    /// An option value is out of range.
    #[error("Invalid value for '{field}' on {recognizer}: {message}")]
    InvalidOption {
        /// Recognizer event name
        recognizer: String,
        /// Option name
        field: &'static str,
        /// What is wrong with it
        message: String,
    },

    /// A direction string could not be parsed.
    #[error("Invalid direction: {0}")]
    Direction(#[from] ParseDirectionError),

    /// YAML configuration could not be parsed.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    /// JSON configuration could not be parsed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl GestureError {
    pub(crate) fn invalid(recognizer: &str, field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidOption {
            recognizer: recognizer.to_string(),
            field,
            message: message.into(),
        }
    }
}
