//! The closed error taxonomy from §7: every error a handler or external
//! client can raise is one of these five kinds, and the runtime's retry
//! policy is keyed off which one it is.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub reason: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, reason: impl Into<String>, message: impl Into<String>) -> Self {
        Self { field: field.into(), reason: reason.into(), message: message.into() }
    }
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {} ({})", self.field, self.message, self.reason)
    }
}

#[derive(Debug, Error)]
pub enum Error {
    /// Network/timeout/optimistic-concurrency-conflict. Retried with backoff;
    /// does not touch conditions except to surface on the Nth failure.
    #[error("transient error: {0}")]
    Transient(String),

    /// A cross-reference lookup came back empty. The reconciler sets
    /// `Blocked(reason)` and returns `Ok(())`, waiting for a future event.
    #[error("{reason}: {message}")]
    NotFound { reason: String, message: String },

    /// Admission rejected the object outright; never persisted.
    #[error("{kind} {name:?} is invalid: {}", .field_errors.iter().map(|e| e.to_string()).collect::<Vec<_>>().join(", "))]
    Invalid { kind: String, name: String, field_errors: Vec<FieldError> },

    /// Secret store / cross-tenant access refused the operation. Surfaced,
    /// never retried.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Programmer error (missing scheme, bad invariant). Logged and bubbled
    /// up; the runtime restarts the worker.
    #[error("fatal: {0}")]
    Fatal(String),
}

impl Error {
    pub fn not_found(reason: impl Into<String>, message: impl Into<String>) -> Self {
        Error::NotFound { reason: reason.into(), message: message.into() }
    }

    pub fn invalid(kind: impl Into<String>, name: impl Into<String>, field_errors: Vec<FieldError>) -> Self {
        Error::Invalid { kind: kind.into(), name: name.into(), field_errors }
    }

    /// Best-effort classification of a lower-level error (e.g. from the
    /// in-memory store) that doesn't already carry one of our kinds.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Transient(_))
    }

    /// When a reconcile errors but the error names a specific missing
    /// dependency, the handler should have already converted it into a
    /// `Blocked` condition rather than propagating it; this is a defensive
    /// fallback reason for anything that slips through uncaught.
    pub fn blocked_reason(&self) -> Option<&str> {
        match self {
            Error::NotFound { reason, .. } => Some(reason),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, anyhow::Error>;
