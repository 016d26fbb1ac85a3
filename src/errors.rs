// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the capture picker
//!
//! Two layers:
//! - [`PickerError`]: what the workflow reports to its host. Session start
//!   failures and still-capture failures are kept apart because the host
//!   reacts to them differently (one ends the activation, the other does not).
//! - [`AppError`]: everything the binary front-ends can fail with.

use crate::backends::camera::BackendError;
use std::fmt;

/// Result type alias for workflow operations
pub type PickerResult<T> = Result<T, PickerError>;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Errors surfaced by the capture workflow to its host
///
/// These never reach the delegate; the delegate only hears about user-driven
/// outcomes.
#[derive(Debug, Clone)]
pub enum PickerError {
    /// The camera session could not be started (no camera, permission denied).
    /// The workflow is inert after this.
    SessionStart(BackendError),
    /// A still capture failed. The workflow is back in `Previewing` and the
    /// user may trigger again.
    Capture(BackendError),
}

impl PickerError {
    /// Whether the workflow can keep running after this error
    pub fn is_recoverable(&self) -> bool {
        matches!(self, PickerError::Capture(_))
    }
}

impl fmt::Display for PickerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PickerError::SessionStart(e) => write!(f, "Camera session failed to start: {}", e),
            PickerError::Capture(e) => write!(f, "Still capture failed: {}", e),
        }
    }
}

impl std::error::Error for PickerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PickerError::SessionStart(e) | PickerError::Capture(e) => Some(e),
        }
    }
}

/// Application-level error type
#[derive(Debug)]
pub enum AppError {
    /// Workflow errors
    Picker(PickerError),
    /// Configuration errors (unreadable or malformed config file)
    Config(String),
    /// Terminal / filesystem I/O errors
    Io(std::io::Error),
    /// Generic error with message
    Other(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Picker(e) => write!(f, "Picker error: {}", e),
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
            AppError::Io(e) => write!(f, "I/O error: {}", e),
            AppError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Picker(e) => Some(e),
            AppError::Io(e) => Some(e),
            AppError::Config(_) | AppError::Other(_) => None,
        }
    }
}

impl From<PickerError> for AppError {
    fn from(err: PickerError) -> Self {
        AppError::Picker(err)
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(err)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<String> for AppError {
    fn from(msg: String) -> Self {
        AppError::Other(msg)
    }
}

impl From<&str> for AppError {
    fn from(msg: &str) -> Self {
        AppError::Other(msg.to_string())
    }
}
