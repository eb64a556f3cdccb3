//! # Errors
//!
//! One error type shared by the parser, the driver contract and every
//! backend. Callers distinguish three tiers: client input problems
//! ([`Error::MalformedFilter`]), absence ([`Error::NotFound`]) and
//! server-side failures (everything else).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// A filter segment could not be percent-decoded.
    #[error("malformed filter: {0}")]
    MalformedFilter(String),

    #[error("invalid connection url {url:?}: {reason}")]
    InvalidConnectionUrl { url: String, reason: String },

    /// No registered driver accepts the connection-URL scheme.
    #[error("no registered driver supports scheme {0:?}")]
    UnsupportedScheme(String),

    /// Connecting to the backend or its health check failed.
    #[error("connection failed: {0}")]
    Connection(String),

    /// An ID lookup exhausted every partition.
    #[error("{0:?} not found in any collection")]
    NotFound(String),

    /// A storage call failed.
    #[error("backend error: {0}")]
    Backend(String),

    /// A native operator token the backend cannot evaluate.
    #[error("unknown filter operator {0:?}")]
    UnknownOperator(String),

    /// A declared capability the backend does not provide. Terminal, not retryable.
    #[error("{0} is not implemented by this driver")]
    NotImplemented(&'static str),

    /// The request deadline elapsed before the backend answered.
    #[error("request cancelled before the backend answered")]
    Cancelled,
}

impl Error {
    pub fn backend(err: impl std::fmt::Display) -> Self {
        Self::Backend(err.to_string())
    }

    pub fn connection(err: impl std::fmt::Display) -> Self {
        Self::Connection(err.to_string())
    }

    /// True for errors caused by the caller's input rather than the service.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::MalformedFilter(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_names_the_id() {
        let err = Error::NotFound("e04cf9d3".into());
        assert_eq!(err.to_string(), "\"e04cf9d3\" not found in any collection");
    }

    #[test]
    fn test_only_malformed_filter_is_client_error() {
        assert!(Error::MalformedFilter("bad".into()).is_client_error());
        assert!(!Error::NotFound("x".into()).is_client_error());
        assert!(!Error::Cancelled.is_client_error());
        assert!(!Error::NotImplemented("search_event").is_client_error());
    }
}
