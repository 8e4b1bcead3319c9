//! Error types for the scrivener-rs library.
//!
//! Every variant carries enough context (stage, identifier, strategy step or
//! session id) for a caller to retry the failing stage alone. Failures that a
//! component can absorb with a documented fallback never surface here; they
//! are recorded on the result's fidelity instead.

use std::io;
use std::num::{ParseFloatError, ParseIntError};

use thiserror::Error;

use crate::core::profile::StyleProfile;
use crate::transfer::TransferOutcome;

/// Main result type for scrivener operations.
pub type Result<T> = std::result::Result<T, ScrivenerError>;

/// Comprehensive error type for all scrivener operations.
#[derive(Error, Debug)]
pub enum ScrivenerError {
    /// Empty or otherwise invalid input text where no fallback is defined
    #[error("Input error: {message}")]
    Input {
        /// Error description
        message: String,
        /// Stage that rejected the input
        stage: Option<String>,
    },

    /// Language-model capability failure
    #[error("Provider error from '{provider}': {message}")]
    Provider {
        /// Provider name
        provider: String,
        /// Error description
        message: String,
    },

    /// Embedding capability failure
    #[error("Embedding error: {message}")]
    Embedding {
        /// Error description
        message: String,
        /// Number of texts in the failed request
        batch_size: Option<usize>,
    },

    /// An external call exceeded its deadline
    #[error("Timeout after {timeout_ms}ms during {operation}")]
    Timeout {
        /// Operation that timed out
        operation: String,
        /// Configured timeout in milliseconds
        timeout_ms: u64,
    },

    /// Too many LLM sub-calls failed; the profile is attached but flagged
    #[error("Analysis degraded: {failed} of {total} sub-calls failed")]
    AnalysisDegraded {
        /// Best-effort profile built from fallbacks
        profile: Box<StyleProfile>,
        /// Failed sub-call count
        failed: usize,
        /// Attempted sub-call count
        total: usize,
    },

    /// Similarity method misuse
    #[error("Invalid weights: expected {expected} weights, got {actual}")]
    InvalidWeights {
        /// Expected weight vector length
        expected: usize,
        /// Actual weight vector length
        actual: usize,
        /// Additional reason (negative or zero-sum weights)
        reason: Option<String>,
    },

    /// Rewrite failure with the furthest completed partial result
    #[error("Transfer failed ({strategy} strategy, step {step}): {message}")]
    TransferFailed {
        /// Strategy name
        strategy: String,
        /// 1-based step that failed
        step: usize,
        /// Error description
        message: String,
        /// Partial outcome from completed steps, if any
        partial: Option<Box<TransferOutcome>>,
    },

    /// Unknown review session
    #[error("Session not found: {session_id}")]
    SessionNotFound {
        /// Session identifier
        session_id: String,
    },

    /// Review session passed its inactivity window
    #[error("Session expired: {session_id}")]
    SessionExpired {
        /// Session identifier
        session_id: String,
    },

    /// Review session was exported and no longer accepts decisions
    #[error("Session {session_id} is frozen after export")]
    SessionFrozen {
        /// Session identifier
        session_id: String,
    },

    /// Change identifier not present in the session
    #[error("Change {change_id} not found in session {session_id}")]
    ChangeNotFound {
        /// Session identifier
        session_id: String,
        /// Change identifier
        change_id: String,
    },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config {
        /// Error description
        message: String,
        /// Configuration field that caused the error
        field: Option<String>,
    },

    /// Validation errors for input data
    #[error("Validation error: {message}")]
    Validation {
        /// Error description
        message: String,
        /// Field or input that failed validation
        field: Option<String>,
    },

    /// Serialization/deserialization errors
    #[error("Serialization error: {message}")]
    Serialization {
        /// Error description
        message: String,
        /// Data type being serialized
        data_type: Option<String>,
        /// Underlying serialization error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// I/O related errors
    #[error("I/O error: {message}")]
    Io {
        /// Human-readable error message
        message: String,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Analysis pipeline errors with no defined fallback
    #[error("Pipeline error at stage '{stage}': {message}")]
    Pipeline {
        /// Pipeline stage where error occurred
        stage: String,
        /// Error description
        message: String,
        /// Identifier of the item being processed
        identifier: Option<String>,
    },

    /// Generic internal errors
    #[error("Internal error: {message}")]
    Internal {
        /// Error description
        message: String,
        /// Additional context
        context: Option<String>,
    },
}

impl ScrivenerError {
    /// Create a new input error
    pub fn input(message: impl Into<String>) -> Self {
        Self::Input {
            message: message.into(),
            stage: None,
        }
    }

    /// Create a new provider error
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create a new embedding error
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::Embedding {
            message: message.into(),
            batch_size: None,
        }
    }

    /// Create a new timeout error
    pub fn timeout(operation: impl Into<String>, timeout_ms: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            timeout_ms,
        }
    }

    /// Create a weight-shape mismatch error
    pub fn invalid_weights(expected: usize, actual: usize) -> Self {
        Self::InvalidWeights {
            expected,
            actual,
            reason: None,
        }
    }

    /// Create a new configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            field: None,
        }
    }

    /// Create a new configuration error with field context
    pub fn config_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Create a new validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            field: None,
        }
    }

    /// Create a new validation error with field context
    pub fn validation_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Create a new pipeline error
    pub fn pipeline(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Pipeline {
            stage: stage.into(),
            message: message.into(),
            identifier: None,
        }
    }

    /// Create a new internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            context: None,
        }
    }

    /// Add context to an existing error
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        match &mut self {
            Self::Internal { context: ctx, .. } => {
                *ctx = Some(context.into());
            }
            Self::Pipeline { identifier, .. } => {
                *identifier = Some(context.into());
            }
            Self::Input { stage, .. } => {
                *stage = Some(context.into());
            }
            _ => {}
        }
        self
    }

    /// True for errors raised by an external capability (LLM, embedding, timeout).
    pub fn is_capability_failure(&self) -> bool {
        matches!(
            self,
            Self::Provider { .. } | Self::Embedding { .. } | Self::Timeout { .. }
        )
    }

    /// True when the session cannot be used because it is unknown or expired.
    pub fn is_session_not_found(&self) -> bool {
        matches!(
            self,
            Self::SessionNotFound { .. } | Self::SessionExpired { .. }
        )
    }
}

impl From<io::Error> for ScrivenerError {
    fn from(err: io::Error) -> Self {
        Self::Io {
            message: "I/O operation failed".to_string(),
            source: err,
        }
    }
}

impl From<serde_json::Error> for ScrivenerError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            message: format!("JSON serialization failed: {err}"),
            data_type: Some("JSON".to_string()),
            source: Some(Box::new(err)),
        }
    }
}

impl From<serde_yaml::Error> for ScrivenerError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Serialization {
            message: format!("YAML serialization failed: {err}"),
            data_type: Some("YAML".to_string()),
            source: Some(Box::new(err)),
        }
    }
}

impl From<reqwest::Error> for ScrivenerError {
    fn from(err: reqwest::Error) -> Self {
        Self::provider("http", err.to_string())
    }
}

impl From<ParseIntError> for ScrivenerError {
    fn from(err: ParseIntError) -> Self {
        Self::validation(format!("Invalid integer: {err}"))
    }
}

impl From<ParseFloatError> for ScrivenerError {
    fn from(err: ParseFloatError) -> Self {
        Self::validation(format!("Invalid float: {err}"))
    }
}

/// Result extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;

    /// Add static context to an error result
    fn context(self, msg: &'static str) -> Result<T>;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<ScrivenerError>,
{
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.into().with_context(f()))
    }

    fn context(self, msg: &'static str) -> Result<T> {
        self.map_err(|e| e.into().with_context(msg))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = ScrivenerError::config("Invalid configuration");
        assert!(matches!(err, ScrivenerError::Config { .. }));

        let err = ScrivenerError::provider("gemini", "quota exceeded");
        assert!(err.is_capability_failure());
    }

    #[test]
    fn test_error_with_context() {
        let err =
            ScrivenerError::internal("Something went wrong").with_context("During fusion");

        if let ScrivenerError::Internal { context, .. } = err {
            assert_eq!(context, Some("During fusion".to_string()));
        } else {
            panic!("Expected Internal error");
        }
    }

    #[test]
    fn test_pipeline_context_sets_identifier() {
        let err = ScrivenerError::pipeline("vectorize", "embedding failed").with_context("unit-7");

        if let ScrivenerError::Pipeline {
            stage, identifier, ..
        } = err
        {
            assert_eq!(stage, "vectorize");
            assert_eq!(identifier.as_deref(), Some("unit-7"));
        } else {
            panic!("Expected Pipeline error");
        }
    }

    #[test]
    fn test_result_extension() {
        let result: std::result::Result<i32, std::io::Error> = Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "File not found",
        ));

        let scrivener_result = result.context("Failed to read configuration file");
        assert!(matches!(scrivener_result, Err(ScrivenerError::Io { .. })));
    }

    #[test]
    fn test_timeout_display() {
        let err = ScrivenerError::timeout("llm completion", 1500);
        assert_eq!(
            err.to_string(),
            "Timeout after 1500ms during llm completion"
        );
        assert!(err.is_capability_failure());
    }

    #[test]
    fn test_session_errors_classified() {
        let missing = ScrivenerError::SessionNotFound {
            session_id: "abc".into(),
        };
        let expired = ScrivenerError::SessionExpired {
            session_id: "abc".into(),
        };
        let frozen = ScrivenerError::SessionFrozen {
            session_id: "abc".into(),
        };
        assert!(missing.is_session_not_found());
        assert!(expired.is_session_not_found());
        assert!(!frozen.is_session_not_found());
    }

    #[test]
    fn test_invalid_weights_display() {
        let err = ScrivenerError::invalid_weights(6, 4);
        assert!(err.to_string().contains("expected 6 weights, got 4"));
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<i32>("invalid json").unwrap_err();
        let err: ScrivenerError = json_err.into();

        if let ScrivenerError::Serialization { data_type, .. } = err {
            assert_eq!(data_type, Some("JSON".to_string()));
        } else {
            panic!("Expected Serialization error");
        }
    }

    #[test]
    fn test_from_yaml_error() {
        let yaml_err = serde_yaml::from_str::<i32>("invalid: yaml: content").unwrap_err();
        let err: ScrivenerError = yaml_err.into();
        assert!(matches!(err, ScrivenerError::Serialization { .. }));
    }

    #[test]
    fn test_from_parse_float_error() {
        let parse_err = "not_a_float".parse::<f64>().unwrap_err();
        let err: ScrivenerError = parse_err.into();
        assert!(matches!(err, ScrivenerError::Validation { .. }));
    }
}
