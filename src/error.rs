//! Failure taxonomy shared by the bootstrap helper and the scenario clients.

use thiserror::Error;

/// Why a support API interaction did not produce a usable value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SupportError {
    /// The actor has no auth headers yet; nothing was sent.
    #[error("actor is not authenticated")]
    Unauthenticated,

    /// A game, issue type, ticket, session or token could not be obtained.
    /// `status` is set when the step failed on an HTTP response.
    #[error("could not resolve {what}")]
    ResolutionFailure { what: String, status: Option<u16> },

    /// The server answered outside the accepted status set, or never answered
    /// (`status == 0`).
    #[error("request failed with status {status}: {body}")]
    TransportFailure { status: u16, body: String },
}

impl SupportError {
    pub fn resolution(what: impl Into<String>) -> Self {
        Self::ResolutionFailure {
            what: what.into(),
            status: None,
        }
    }

    pub fn transport(status: u16, body: impl Into<String>) -> Self {
        Self::TransportFailure {
            status,
            body: body.into(),
        }
    }

    /// Fold a failed request into a failure to resolve `what`, keeping its
    /// status. Other variants pass through unchanged.
    pub fn while_resolving(self, what: &str) -> Self {
        match self {
            Self::TransportFailure { status, .. } => Self::ResolutionFailure {
                what: what.to_string(),
                status: Some(status),
            },
            other => other,
        }
    }

    /// HTTP status behind the failure, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthenticated => None,
            Self::ResolutionFailure { status, .. } => *status,
            Self::TransportFailure { status, .. } => Some(*status),
        }
    }

    /// Auth expiry (401) and throttling (429) are expected under load.
    pub fn is_soft(&self) -> bool {
        self.status().is_some_and(crate::failure::is_soft_status)
    }
}

pub type SupportResult<T> = Result<T, SupportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn soft_only_for_throttle_and_auth_expiry() {
        assert!(SupportError::transport(401, "").is_soft());
        assert!(SupportError::transport(429, "slow down").is_soft());
        assert!(!SupportError::transport(500, "boom").is_soft());
        assert!(!SupportError::Unauthenticated.is_soft());
        assert!(!SupportError::resolution("ticket").is_soft());
    }

    #[test]
    fn transport_failure_carries_body_in_message() {
        let err = SupportError::transport(503, "upstream down");
        assert_eq!(err.to_string(), "request failed with status 503: upstream down");
    }

    #[test]
    fn resolving_keeps_the_status() {
        let err = SupportError::transport(429, "slow down").while_resolving("session");
        assert_eq!(
            err,
            SupportError::ResolutionFailure {
                what: "session".to_string(),
                status: Some(429),
            }
        );
        assert!(err.is_soft());
        assert_eq!(err.to_string(), "could not resolve session");

        let missing = SupportError::resolution("ticket id").while_resolving("ticket");
        assert_eq!(missing, SupportError::resolution("ticket id"));
        assert_eq!(SupportError::Unauthenticated.while_resolving("ticket"), SupportError::Unauthenticated);
    }
}
