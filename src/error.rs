//! Error types for the translation pipeline
//!
//! Every failure path in the crate resolves to one variant of [`Error`].
//! Local validation errors (`InvalidInput`, `InvalidLanguage`) are raised
//! before any request is sent; `Transport`/`RateLimit` come from the HTTP
//! exchange; `Decode` means the endpoint's response framing was not
//! recognizable at all; `PartialFailure` aggregates per-item failures under
//! the strict partial-failure policy.

use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum Error {
    /// Malformed call shape (e.g. a keyed mapping with duplicate keys).
    /// Raised before any network activity.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A `from`/`to` value that resolves to no known language and was not
    /// forced. Raised before any network activity.
    #[error("unsupported language: {0}")]
    InvalidLanguage(String),

    /// Network or HTTP-level failure (DNS, timeout, non-2xx status).
    /// Surfaced verbatim; the crate never retries internally.
    #[error("request failed{}: {message}", status.map(|s| format!(" with status {s}")).unwrap_or_default())]
    Transport {
        status: Option<u16>,
        message: String,
    },

    /// HTTP 429 from the endpoint, split out so callers can apply their
    /// own backoff policy.
    #[error("Too Many Requests")]
    RateLimit,

    /// The response framing could not be located at all. The wire format
    /// is owned by the upstream service and drifts; rather than guess,
    /// the parser fails closed with this.
    #[error("unrecognized response format: {0}")]
    Decode(String),

    /// Some items failed while others succeeded and the caller asked for
    /// all-or-nothing semantics (`reject_on_partial_fail: true`).
    #[error("Partial Translation Request Fail at indices {failed:?}")]
    PartialFailure { failed: Vec<usize> },

    /// The caller cancelled the request via a [`CancelToken`].
    ///
    /// [`CancelToken`]: crate::transport::CancelToken
    #[error("request cancelled")]
    Cancelled,
}

/// Result type used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// True for errors raised by local validation, before any request.
    pub fn is_local(&self) -> bool {
        matches!(self, Error::InvalidInput(_) | Error::InvalidLanguage(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_display_with_status() {
        let err = Error::Transport {
            status: Some(503),
            message: "service unavailable".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("503"));
        assert!(msg.contains("service unavailable"));
    }

    #[test]
    fn test_transport_display_without_status() {
        let err = Error::Transport {
            status: None,
            message: "connection refused".to_string(),
        };
        assert_eq!(err.to_string(), "request failed: connection refused");
    }

    #[test]
    fn test_partial_failure_lists_indices() {
        let err = Error::PartialFailure {
            failed: vec![1, 4, 7],
        };
        let msg = err.to_string();
        assert!(msg.contains("Partial Translation Request Fail"));
        assert!(msg.contains("[1, 4, 7]"));
    }

    #[test]
    fn test_is_local() {
        assert!(Error::InvalidInput("x".to_string()).is_local());
        assert!(Error::InvalidLanguage("xx".to_string()).is_local());
        assert!(!Error::RateLimit.is_local());
        assert!(!Error::Cancelled.is_local());
    }
}
