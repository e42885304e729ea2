use thiserror::Error;

/// Failure classification for paid API calls.
///
/// Every failure the handshake can produce maps to exactly one variant here,
/// so retry decisions dispatch on the variant instead of matching substrings
/// of error text. The remote has two independent sources of transient
/// failure — the data backend timing out on heavy queries, and the upstream
/// chain RPC rate-limiting settlement — both surface as HTTP statuses and
/// land in the transient variants below.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Phase 1 did not follow the two-phase shape (no 402, or an
    /// unreadable quote). Contract mismatch, never retried.
    #[error("payment handshake mismatch: {detail}")]
    ProtocolMismatch { detail: String },

    /// Phase 2 returned a non-success status outside the transient set.
    /// Carries a bounded body excerpt for diagnostics.
    #[error("payment rejected (status {status}): {excerpt}")]
    PaymentRejected { status: u16, excerpt: String },

    /// HTTP 504 at either phase. The remote's own request timeout is the
    /// only timeout in play; no client-side deadline is set.
    #[error("gateway timeout")]
    Timeout,

    /// HTTP 429 at either phase.
    #[error("rate limited upstream")]
    RateLimited,

    /// HTTP 500/502/503 at either phase.
    #[error("server error (status {status})")]
    ServerError { status: u16 },

    /// The signer could not produce a payment credential.
    #[error("payment signing failed: {detail}")]
    Signing { detail: String },

    /// Connection-level failure before any status was received.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

impl ApiError {
    /// Whether a retry shortly after is believed likely to succeed.
    ///
    /// Anything else fails fast: retrying a contract mismatch or a rejected
    /// payment burns attempts without changing the outcome.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout | Self::RateLimited | Self::ServerError { .. } => true,
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }

    /// Map an HTTP status from either handshake phase to its transient
    /// variant, or `None` if the status carries no transient signal.
    pub fn from_transient_status(status: u16) -> Option<Self> {
        match status {
            504 => Some(Self::Timeout),
            429 => Some(Self::RateLimited),
            500 | 502 | 503 => Some(Self::ServerError { status }),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_statuses_map_to_variants() {
        assert!(matches!(
            ApiError::from_transient_status(504),
            Some(ApiError::Timeout)
        ));
        assert!(matches!(
            ApiError::from_transient_status(429),
            Some(ApiError::RateLimited)
        ));
        for status in [500, 502, 503] {
            assert!(matches!(
                ApiError::from_transient_status(status),
                Some(ApiError::ServerError { status: s }) if s == status
            ));
        }
    }

    #[test]
    fn non_transient_statuses_map_to_none() {
        for status in [200, 400, 401, 402, 403, 404, 422] {
            assert!(ApiError::from_transient_status(status).is_none());
        }
    }

    #[test]
    fn classification_is_variant_based() {
        assert!(ApiError::Timeout.is_transient());
        assert!(ApiError::RateLimited.is_transient());
        assert!(ApiError::ServerError { status: 503 }.is_transient());
        assert!(
            !ApiError::ProtocolMismatch {
                detail: "expected 402".into()
            }
            .is_transient()
        );
        assert!(
            !ApiError::PaymentRejected {
                status: 400,
                excerpt: "bad request".into()
            }
            .is_transient()
        );
        assert!(
            !ApiError::Signing {
                detail: "no key".into()
            }
            .is_transient()
        );
    }
}
