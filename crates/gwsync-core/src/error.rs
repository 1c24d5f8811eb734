// ── Reconciliation errors ──
//
// Everything a lifecycle phase can fail with. Validation and immutable
// field errors are raised before any remote call; remote failures carry
// the name of the operation that failed. The "not found" answer is never
// an error here: Read turns it into `ReadOutcome::Gone`.

use gwsync_api::NotReady;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReconcileError {
    // ── Rejected before any remote call ──────────────────────────────
    /// A declared configuration violates a cross-field rule.
    #[error("Invalid {field}: {message}")]
    Validation { field: String, message: String },

    /// An update tried to change a field that is fixed after creation.
    #[error("{field} cannot be changed after the gateway is created")]
    ImmutableField { field: String },

    // ── Remote failures ──────────────────────────────────────────────
    #[error("{operation} failed: {source}")]
    RemoteCall {
        operation: String,
        #[source]
        source: gwsync_api::Error,
    },

    /// A retried call was still reporting a provisioning condition when
    /// the attempt bound was reached.
    #[error("{operation} failed after {attempts} attempts: {condition}")]
    RetryExhausted {
        operation: String,
        attempts: u32,
        condition: NotReady,
    },

    // ── Store ────────────────────────────────────────────────────────
    #[error("Invalid stored state: {message}")]
    InvalidState { message: String },
}

impl ReconcileError {
    pub(crate) fn validation(field: &str, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.to_owned(),
            message: message.into(),
        }
    }

    /// Adapter for `map_err`: wrap an API error with the operation name.
    pub(crate) fn remote(operation: &str) -> impl FnOnce(gwsync_api::Error) -> Self + '_ {
        move |source| Self::RemoteCall {
            operation: operation.to_owned(),
            source,
        }
    }

    /// The field a validation or immutability error refers to.
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::Validation { field, .. } | Self::ImmutableField { field } => Some(field),
            _ => None,
        }
    }

    /// Whether the error was raised before any remote call was issued.
    pub fn is_rejected_locally(&self) -> bool {
        matches!(
            self,
            Self::Validation { .. } | Self::ImmutableField { .. } | Self::InvalidState { .. }
        )
    }
}
