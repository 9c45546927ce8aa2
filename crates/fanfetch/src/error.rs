//! Error types for fanfetch.

use std::path::PathBuf;

use thiserror::Error;

/// Error type produced by pluggable collaborators (parsers, customizers).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Fatal endpoint misconfiguration.
///
/// These are caller bugs and surface from [`EndpointBuilder::build`] or
/// [`EndpointConfig::load`]; they are never folded into per-identifier results.
///
/// [`EndpointBuilder::build`]: crate::EndpointBuilder::build
/// [`EndpointConfig::load`]: crate::EndpointConfig::load
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("endpoint requires a response parser")]
    MissingParser,

    #[error("endpoint requires an HTTP method")]
    MissingMethod,

    #[error("endpoint requires a base URL")]
    MissingUrl,

    #[error("invalid HTTP method {0:?}")]
    InvalidMethod(String),

    #[error("invalid header {name:?}: {reason}")]
    InvalidHeader { name: String, reason: String },

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] BoxError),

    #[error("config file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to load endpoint config: {0}")]
    Load(#[from] Box<figment::Error>),
}

/// Failure of a single identifier's request.
///
/// The `Display` output is what ends up in the result slot of a dispatch.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("custom header function: {0}")]
    Customize(#[source] BoxError),

    #[error("failure for {id:?} {source}")]
    Build {
        id: String,
        #[source]
        source: http::Error,
    },

    #[error("failure for {id:?} {source}")]
    Transport {
        id: String,
        #[source]
        source: BoxError,
    },

    #[error("failure for {id:?} {source}")]
    Parse {
        id: String,
        #[source]
        source: BoxError,
    },
}

impl RequestError {
    /// Only transport failures are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, RequestError::Transport { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_customize_message() {
        let err = RequestError::Customize("no credentials".into());
        assert_eq!(err.to_string(), "custom header function: no credentials");
    }

    #[test]
    fn test_failure_message_quotes_identifier() {
        let err = RequestError::Transport {
            id: "AKQ".into(),
            source: "connection reset".into(),
        };
        assert_eq!(err.to_string(), "failure for \"AKQ\" connection reset");

        let err = RequestError::Parse {
            id: "SGX".into(),
            source: "status 404".into(),
        };
        assert_eq!(err.to_string(), "failure for \"SGX\" status 404");
    }

    #[test]
    fn test_only_transport_is_retryable() {
        assert!(
            RequestError::Transport { id: "a".into(), source: "x".into() }.is_retryable()
        );
        assert!(!RequestError::Parse { id: "a".into(), source: "x".into() }.is_retryable());
        assert!(!RequestError::Customize("x".into()).is_retryable());
    }
}
