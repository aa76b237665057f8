//! Placement errors.

use serde::{Deserialize, Serialize};

/// Result type for placement decisions.
pub type Result<T> = std::result::Result<T, PlacementError>;

/// Why a placement request could not be honoured.
///
/// Both variants are terminal for the run: the message is meant to be shown
/// to the user verbatim before any computation starts.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlacementError {
    /// The user's explicit choices contradict each other or the environment.
    #[error("Inconsistent input: {0}")]
    InconsistentInput(String),

    /// The request is sound, but this build cannot do it.
    #[error("Not implemented: {0}")]
    NotImplemented(String),
}

impl PlacementError {
    /// Create an inconsistent-input error.
    pub fn inconsistent(message: impl Into<String>) -> Self {
        Self::InconsistentInput(message.into())
    }

    /// Create a not-implemented error.
    pub fn not_implemented(message: impl Into<String>) -> Self {
        Self::NotImplemented(message.into())
    }

    /// Get the error category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InconsistentInput(_) => ErrorCategory::InconsistentInput,
            Self::NotImplemented(_) => ErrorCategory::NotImplemented,
        }
    }

    /// Get the message without the category prefix.
    pub fn message(&self) -> &str {
        match self {
            Self::InconsistentInput(msg) | Self::NotImplemented(msg) => msg,
        }
    }
}

/// Error category, for callers that branch on the kind of failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCategory {
    /// Fixable by changing flags.
    InconsistentInput,
    /// Fixable only by requesting a different placement.
    NotImplemented,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InconsistentInput => f.write_str("inconsistent input"),
            Self::NotImplemented => f.write_str("not implemented"),
        }
    }
}

/// Errors from parsing option strings.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// Unknown task target value
    #[error("Invalid task target '{0}', expected one of auto, cpu, gpu")]
    TaskTarget(String),

    /// Malformed GPU task assignment
    #[error("Invalid GPU task assignment '{input}': {reason}")]
    Assignment {
        /// The rejected input
        input: String,
        /// What was wrong with it
        reason: String,
    },
}
