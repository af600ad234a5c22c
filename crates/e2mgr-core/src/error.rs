// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Error types for e2mgr-core.
//!
//! Every failure a caller can observe is one [`E2MgrError`] variant, and every
//! variant has exactly one [`ErrorKind`]. Outward layers map kinds, never
//! concrete messages.

use std::fmt;

use crate::model::ConnectionStatus;
use crate::store::StoreError;

/// Result type using E2MgrError
pub type Result<T> = std::result::Result<T, E2MgrError>;

/// Fieldless classification of an [`E2MgrError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed setup request.
    Validation,
    /// Store failure after the gateway's own retry budget.
    Store,
    /// No such RAN or termination instance record.
    NotFound,
    /// The pool has no usable termination instance.
    NoInstanceAvailable,
    /// The RAN is in a lifecycle state that forbids the request.
    WrongState,
    /// The message sender failed to dispatch.
    Transport,
    /// The routing manager rejected or did not answer a request.
    RouteRegistrar,
}

impl ErrorKind {
    /// Stable numeric code reported to API clients.
    pub fn code(self) -> u16 {
        match self {
            Self::Validation => 402,
            Self::WrongState => 403,
            Self::NotFound => 404,
            Self::Store => 500,
            Self::Transport => 502,
            Self::NoInstanceAvailable => 510,
            Self::RouteRegistrar => 511,
        }
    }

    /// Upper snake case name, used in logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "VALIDATION_ERROR",
            Self::Store => "STORE_ERROR",
            Self::NotFound => "NOT_FOUND",
            Self::NoInstanceAvailable => "NO_INSTANCE_AVAILABLE",
            Self::WrongState => "WRONG_STATE",
            Self::Transport => "TRANSPORT_ERROR",
            Self::RouteRegistrar => "ROUTE_REGISTRAR_ERROR",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors produced by the pool, association, setup and shutdown components.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum E2MgrError {
    /// Input validation failed.
    #[error("Validation error for '{field}': {message}")]
    Validation {
        /// The field that failed validation.
        field: String,
        /// The validation error message.
        message: String,
    },

    /// Store operation failed.
    #[error("Store error during '{operation}': {details}")]
    Store {
        /// The operation that failed.
        operation: String,
        /// Error details.
        details: String,
    },

    /// A RAN or termination instance record does not exist.
    #[error("{resource} '{key}' not found")]
    NotFound {
        /// Record type, e.g. `RAN` or `E2T instance`.
        resource: String,
        /// Primary key that was looked up.
        key: String,
    },

    /// Instance selection found nothing to hand out.
    #[error("No termination instance available: {reason}")]
    NoInstanceAvailable {
        /// Why selection failed.
        reason: String,
    },

    /// The RAN's current status forbids the requested activity.
    #[error("Activity {activity} rejected: RAN '{ran_name}' is in wrong state {status}")]
    WrongState {
        /// The RAN the request targeted.
        ran_name: String,
        /// The rejected activity, e.g. `X2_SETUP`.
        activity: String,
        /// The status found on the record.
        status: ConnectionStatus,
    },

    /// Dispatch onto the message bus failed.
    #[error("Failed to send {msg_type} for '{ran_name}': {reason}")]
    Transport {
        /// Message type name.
        msg_type: String,
        /// Addressed RAN name (empty for broadcasts).
        ran_name: String,
        /// The reason for failure.
        reason: String,
    },

    /// The routing manager call failed.
    #[error("Routing manager error during '{operation}': {details}")]
    RouteRegistrar {
        /// The routing manager operation.
        operation: String,
        /// Error details.
        details: String,
    },
}

impl E2MgrError {
    /// Build a validation error.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Build a selection failure.
    pub fn no_instance(reason: impl Into<String>) -> Self {
        Self::NoInstanceAvailable {
            reason: reason.into(),
        }
    }

    /// The kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } => ErrorKind::Validation,
            Self::Store { .. } => ErrorKind::Store,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::NoInstanceAvailable { .. } => ErrorKind::NoInstanceAvailable,
            Self::WrongState { .. } => ErrorKind::WrongState,
            Self::Transport { .. } => ErrorKind::Transport,
            Self::RouteRegistrar { .. } => ErrorKind::RouteRegistrar,
        }
    }

    /// Stable numeric code for this error.
    pub fn error_code(&self) -> u16 {
        self.kind().code()
    }
}

impl From<StoreError> for E2MgrError {
    fn from(err: StoreError) -> Self {
        let details = err.to_string();
        match err {
            StoreError::NotFound { resource, key } => E2MgrError::NotFound {
                resource: resource.to_string(),
                key,
            },
            StoreError::Connection { operation, .. } | StoreError::Internal { operation, .. } => {
                E2MgrError::Store {
                    operation: operation.to_string(),
                    details,
                }
            }
        }
    }
}
