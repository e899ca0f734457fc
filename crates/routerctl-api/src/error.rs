use thiserror::Error;

/// Top-level error type for the `routerctl-api` crate.
///
/// Covers every failure mode an API implementation can surface:
/// socket I/O, connection setup, router-side traps, protocol violations,
/// and the HTTP public-IP lookup. `routerctl-core` wraps these with
/// stage context before they reach a caller.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// Socket-level I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The router refused or dropped the connection.
    #[error("Cannot connect to router at {address}: {reason}")]
    Connect { address: String, reason: String },

    /// An operation did not complete in time.
    #[error("Operation timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// Operation attempted on a connection that is not open.
    #[error("Connection is not open")]
    NotConnected,

    // ── Router responses ────────────────────────────────────────────
    /// The router answered with a `!trap` sentence.
    #[error("Router trap: {message}")]
    Trap { message: String },

    /// The router answered with `!fatal` and closed the session.
    #[error("Router fatal error: {message}")]
    Fatal { message: String },

    /// Malformed or out-of-sequence data on the wire.
    #[error("Protocol error: {0}")]
    Protocol(String),

    // ── HTTP (public IP lookup) ─────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The lookup service answered with something that is not an IP address.
    #[error("Invalid public IP response: {reason}")]
    InvalidIpResponse { reason: String },
}

impl Error {
    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(e) => e.is_timeout() || e.is_connect(),
            Self::Timeout { .. } | Self::Connect { .. } | Self::Io(_) => true,
            _ => false,
        }
    }

    /// Returns `true` if the router itself rejected the request.
    pub fn is_router_rejection(&self) -> bool {
        matches!(self, Self::Trap { .. } | Self::Fatal { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connect_errors_are_transient() {
        let err = Error::Connect {
            address: "192.168.88.1:8728".into(),
            reason: "refused".into(),
        };
        assert!(err.is_transient());
        assert!(!err.is_router_rejection());
    }

    #[test]
    fn traps_are_rejections() {
        let err = Error::Trap {
            message: "no such item".into(),
        };
        assert!(err.is_router_rejection());
        assert!(!err.is_transient());
        assert_eq!(err.to_string(), "Router trap: no such item");
    }
}
