//! Error types for the reconciliation engine.
//!
//! This module provides the error hierarchy for every stage of a
//! reconciliation: configuration loading, snapshot persistence, remote API
//! calls, planning contracts and sequenced execution.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::planner::{Area, OperationKind};

/// The main error type for the reconciliation engine.
#[derive(Debug, Error)]
pub enum KdaError {
    /// Configuration-related errors.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Snapshot and lock errors.
    #[error("State error: {0}")]
    State(#[from] StateError),

    /// Remote control-plane errors.
    #[error("Remote API error: {0}")]
    Remote(#[from] RemoteError),

    /// A desired tree breaks a mapping or deletion contract.
    #[error("Contract violation: {0}")]
    Contract(#[from] ContractViolation),

    /// Sequencing errors.
    #[error("Reconciliation error: {0}")]
    Reconcile(#[from] ReconcileError),

    /// IO errors.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The manifest file was not found.
    #[error("Configuration file not found: {path}")]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// The manifest could not be parsed.
    #[error("Failed to parse configuration: {message}")]
    ParseError {
        /// Description of the parse error.
        message: String,
        /// Optional source location.
        location: Option<String>,
    },

    /// Validation failed.
    #[error("Configuration validation failed: {message}")]
    ValidationError {
        /// Description of the validation error.
        message: String,
        /// Field that failed validation.
        field: Option<String>,
    },

    /// Environment variable is missing.
    #[error("Missing environment variable: {name}")]
    MissingEnvVar {
        /// Name of the missing variable.
        name: String,
    },
}

/// Snapshot and lock errors.
#[derive(Debug, Error)]
pub enum StateError {
    /// Snapshot is corrupted.
    #[error("State is corrupted: {message}")]
    Corrupted {
        /// Description of the corruption.
        message: String,
    },

    /// Lock acquisition failed.
    #[error("Failed to acquire state lock: {message}")]
    LockFailed {
        /// Description of the lock failure.
        message: String,
    },

    /// Lock is held by another process.
    #[error("State is locked by another process (lock holder: {holder}, since: {since})")]
    LockedByOther {
        /// Identifier of the lock holder.
        holder: String,
        /// When the lock was acquired.
        since: String,
    },

    /// Serialization error.
    #[error("State serialization error: {message}")]
    SerializationError {
        /// Description of the serialization error.
        message: String,
    },

    /// Snapshot format version mismatch.
    #[error("State version mismatch: expected {expected}, found {found}")]
    VersionMismatch {
        /// Expected format version.
        expected: String,
        /// Found format version.
        found: String,
    },
}

/// Errors reported by (or while talking to) the remote control plane.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// Authentication failed.
    #[error("Remote authentication failed: {message}")]
    AuthenticationFailed {
        /// Description of the auth failure.
        message: String,
    },

    /// The request carried a stale application version.
    #[error("Version conflict on '{resource}': {message}")]
    VersionConflict {
        /// Application name.
        resource: String,
        /// Message from the remote system.
        message: String,
    },

    /// The resource or one of its sub-objects does not exist.
    #[error("Resource not found: {resource}")]
    NotFound {
        /// What was looked up.
        resource: String,
    },

    /// The application is in a status that does not accept the request.
    #[error("Resource '{resource}' is in use: {message}")]
    InvalidState {
        /// Application name.
        resource: String,
        /// Message from the remote system.
        message: String,
    },

    /// API request failed.
    #[error("Remote API request failed: {status} {code} - {message}")]
    ApiRequestFailed {
        /// HTTP status code.
        status: u16,
        /// Remote error code, if any.
        code: String,
        /// Error message from API.
        message: String,
    },

    /// Throttled by the remote system.
    #[error("Remote API throttled, retry after {retry_after_secs} seconds")]
    Throttled {
        /// Seconds to wait before retrying.
        retry_after_secs: u64,
    },

    /// Network error.
    #[error("Network error communicating with the remote API: {message}")]
    NetworkError {
        /// Description of the network error.
        message: String,
    },

    /// Invalid response from API.
    #[error("Invalid response from remote API: {message}")]
    InvalidResponse {
        /// Description of the response issue.
        message: String,
    },

    /// An asynchronous remote operation finished unsuccessfully.
    #[error("Operation {operation_id} on '{resource}' failed: {message}")]
    OperationFailed {
        /// Application name.
        resource: String,
        /// Remote operation identifier.
        operation_id: String,
        /// Failure details.
        message: String,
    },

    /// The application entered a status it cannot leave on its own.
    #[error("Application '{resource}' entered unexpected status {status} while waiting for {expected}")]
    UnexpectedStatus {
        /// Application name.
        resource: String,
        /// Status observed.
        status: String,
        /// Status being waited for.
        expected: String,
    },
}

/// A tree that breaks a mapping or deletion contract.
///
/// Raised before any remote call is issued.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{area}: {message}")]
pub struct ContractViolation {
    /// Configuration area (or path) where the violation was found.
    pub area: String,
    /// Description of the violation.
    pub message: String,
}

impl ContractViolation {
    /// Creates a new contract violation.
    #[must_use]
    pub fn new(area: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            area: area.into(),
            message: message.into(),
        }
    }
}

/// Sequencing errors.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// A sequenced step failed; later steps were not attempted.
    #[error("{operation} of {area} failed: {source}")]
    StepFailed {
        /// Area being reconciled.
        area: Area,
        /// Kind of operation that failed.
        operation: OperationKind,
        /// The underlying error, unchanged.
        #[source]
        source: Box<KdaError>,
    },

    /// A wait exceeded its deadline.
    #[error("Timeout after {timeout_secs}s waiting for '{resource}' to reach {expected}")]
    Timeout {
        /// Application name.
        resource: String,
        /// Condition being waited for.
        expected: String,
        /// Configured timeout.
        timeout_secs: u64,
    },

    /// The run was cancelled by the caller.
    #[error("Reconciliation cancelled")]
    Cancelled,
}

/// Coarse classification of any error, following the engine's taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Tree broke a mapping or deletion contract.
    ContractViolation,
    /// Stale application version.
    VersionConflict,
    /// Resource or sub-object missing.
    NotFound,
    /// A wait exceeded its deadline.
    Timeout,
    /// Throttling or network failure.
    Transient,
    /// Caller cancelled the run.
    Cancelled,
    /// Everything else.
    Other,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::ContractViolation => "contract-violation",
            Self::VersionConflict => "version-conflict",
            Self::NotFound => "not-found",
            Self::Timeout => "timeout",
            Self::Transient => "transient",
            Self::Cancelled => "cancelled",
            Self::Other => "other",
        };
        write!(f, "{s}")
    }
}

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, KdaError>;

impl KdaError {
    /// Classifies the error, looking through step context.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Contract(_) => ErrorKind::ContractViolation,
            Self::Remote(RemoteError::VersionConflict { .. }) => ErrorKind::VersionConflict,
            Self::Remote(RemoteError::NotFound { .. }) => ErrorKind::NotFound,
            Self::Remote(RemoteError::Throttled { .. } | RemoteError::NetworkError { .. }) => {
                ErrorKind::Transient
            }
            Self::Reconcile(ReconcileError::Timeout { .. }) => ErrorKind::Timeout,
            Self::Reconcile(ReconcileError::Cancelled) => ErrorKind::Cancelled,
            Self::Reconcile(ReconcileError::StepFailed { source, .. }) => source.kind(),
            _ => ErrorKind::Other,
        }
    }

    /// Returns true if the remote reported the resource as missing.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    /// Returns true if this error is retryable.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Remote(RemoteError::Throttled { .. } | RemoteError::NetworkError { .. })
                | Self::State(StateError::LockFailed { .. })
        )
    }

    /// Returns the suggested retry delay in seconds, if applicable.
    #[must_use]
    pub const fn retry_delay_secs(&self) -> Option<u64> {
        match self {
            Self::Remote(RemoteError::Throttled { retry_after_secs }) => Some(*retry_after_secs),
            Self::Remote(RemoteError::NetworkError { .. }) => Some(5),
            Self::State(StateError::LockFailed { .. }) => Some(2),
            _ => None,
        }
    }
}

impl ConfigError {
    /// Creates a validation error for a specific field.
    #[must_use]
    pub fn validation(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Creates a validation error without a specific field.
    #[must_use]
    pub fn validation_general(message: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
            field: None,
        }
    }
}

impl StateError {
    /// Creates a serialization error with the given message.
    #[must_use]
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::SerializationError {
            message: message.into(),
        }
    }
}

impl RemoteError {
    /// Creates an API request error.
    #[must_use]
    pub fn api_error(status: u16, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ApiRequestFailed {
            status,
            code: code.into(),
            message: message.into(),
        }
    }

    /// Creates a network error.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::NetworkError {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_looks_through_step_context() {
        let inner = KdaError::from(RemoteError::VersionConflict {
            resource: "app".to_string(),
            message: "stale".to_string(),
        });
        let err = KdaError::from(ReconcileError::StepFailed {
            area: Area::Outputs,
            operation: OperationKind::Add,
            source: Box::new(inner),
        });

        assert_eq!(err.kind(), ErrorKind::VersionConflict);
        assert!(err.to_string().contains("outputs"));
    }

    #[test]
    fn test_transient_errors_are_retryable() {
        let throttled = KdaError::from(RemoteError::Throttled { retry_after_secs: 3 });
        assert!(throttled.is_retryable());
        assert_eq!(throttled.retry_delay_secs(), Some(3));
        assert_eq!(throttled.kind(), ErrorKind::Transient);

        let conflict = KdaError::from(ContractViolation::new("input", "cannot remove"));
        assert!(!conflict.is_retryable());
        assert_eq!(conflict.kind(), ErrorKind::ContractViolation);
    }
}
