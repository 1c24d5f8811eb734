use thiserror::Error;

/// Top-level error type for the `gwsync-api` crate.
///
/// Covers every failure mode of the controller action API:
/// authentication, transport, controller-reported failures and decoding.
/// `gwsync-core` maps these into reconciliation errors.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Login failed, or a request was rejected for lack of a valid session.
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS handshake or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Controller ──────────────────────────────────────────────────
    /// The controller answered `return: false` for an action.
    ///
    /// `condition` is set when the reason says the target gateway is
    /// still being provisioned.
    #[error("{action} failed: {reason}")]
    Api {
        action: String,
        reason: String,
        condition: Option<NotReady>,
    },

    /// The controller reports that the addressed object does not exist.
    #[error("Not found: {resource}")]
    NotFound { resource: String },

    // ── Data ────────────────────────────────────────────────────────
    /// A request payload could not be encoded as JSON.
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if this is the controller's "object does not exist" answer.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// The provisioning condition behind a failed action, if any.
    pub fn transient_condition(&self) -> Option<NotReady> {
        match self {
            Self::Api { condition, .. } => *condition,
            _ => None,
        }
    }

    /// Returns `true` if auth has expired and logging in again might help.
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, Self::Authentication { .. })
    }
}

// ── Transient conditions ────────────────────────────────────────────

/// Reasons the controller gives while a gateway is still coming up.
///
/// The controller only reports these as free text; [`NotReady::classify`]
/// is the single place that text is inspected. Everything above the wire
/// layer compares the enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotReady {
    /// "gateway ... is not up"
    GatewayNotUp,
    /// "... not ready ..."
    GatewayNotReady,
    /// "... operation in progress ..."
    OperationInProgress,
    /// "... please try again ..."
    TryAgainLater,
}

const NOT_READY_MARKERS: [(&str, NotReady); 4] = [
    ("is not up", NotReady::GatewayNotUp),
    ("not ready", NotReady::GatewayNotReady),
    ("in progress", NotReady::OperationInProgress),
    ("try again", NotReady::TryAgainLater),
];

impl NotReady {
    /// Every known condition.
    pub const ALL: [Self; 4] = [
        Self::GatewayNotUp,
        Self::GatewayNotReady,
        Self::OperationInProgress,
        Self::TryAgainLater,
    ];

    /// Match a controller reason against the known not-ready phrasings.
    pub fn classify(reason: &str) -> Option<Self> {
        let lower = reason.to_ascii_lowercase();
        NOT_READY_MARKERS
            .iter()
            .find(|(marker, _)| lower.contains(marker))
            .map(|(_, condition)| *condition)
    }
}

impl std::fmt::Display for NotReady {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::GatewayNotUp => "gateway not up",
            Self::GatewayNotReady => "gateway not ready",
            Self::OperationInProgress => "operation in progress",
            Self::TryAgainLater => "try again later",
        };
        f.write_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_known_reasons() {
        assert_eq!(
            NotReady::classify("Gateway spoke-1 is not up. Please wait."),
            Some(NotReady::GatewayNotUp)
        );
        assert_eq!(
            NotReady::classify("Route table update in progress"),
            Some(NotReady::OperationInProgress)
        );
        assert_eq!(
            NotReady::classify("Controller busy, please TRY AGAIN later"),
            Some(NotReady::TryAgainLater)
        );
    }

    #[test]
    fn classify_ignores_unrelated_reasons() {
        assert_eq!(NotReady::classify("Invalid CIDR 10.0.0.0/33"), None);
    }

    #[test]
    fn only_api_errors_carry_conditions() {
        let err = Error::Api {
            action: "edit_gateway_custom_routes".into(),
            reason: "gateway is not up".into(),
            condition: Some(NotReady::GatewayNotUp),
        };
        assert_eq!(err.transient_condition(), Some(NotReady::GatewayNotUp));

        let err = Error::NotFound {
            resource: "spoke-1".into(),
        };
        assert!(err.is_not_found());
        assert_eq!(err.transient_condition(), None);
    }
}
