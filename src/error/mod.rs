//! Error types for rendering, reactivity and the live session layer.

use thiserror::Error;

/// Convenience alias used across the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// A unified error type for all Schorle subsystems.
#[derive(Debug, Error)]
pub enum Error {
    /// A builder or `text()` call happened outside an open rendering context.
    #[error("No rendering context is active")]
    NoRenderingContext,

    /// The element tree cannot be serialized as-is.
    #[error("Malformed element: {reason}")]
    MalformedElement { reason: String },

    /// The WebSocket request carried no known session.
    #[error("Session is missing or unknown")]
    SessionMissing,

    /// A second WebSocket tried to attach to a live session.
    #[error("Session '{0}' is already connected")]
    SessionAlreadyConnected(String),

    /// The client referenced a handler id that was never registered.
    #[error("Handler '{0}' is not registered")]
    HandlerMissing(String),

    /// A wire message could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A signal or effector subscriber failed.
    #[error("Subscriber failed: {0}")]
    SubscriberFailure(String),

    /// WebSocket or HTTP I/O failed.
    #[error("IO error: {0}")]
    Io(String),

    /// Raised by application code inside handlers, effectors or renders.
    #[error("{0}")]
    Handler(String),
}

impl Error {
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedElement {
            reason: reason.into(),
        }
    }

    /// Wrap an arbitrary application failure.
    pub fn handler(message: impl std::fmt::Display) -> Self {
        Self::Handler(message.to_string())
    }

    /// A failure of subscriber `index` of `source`.
    pub fn subscriber(source: &str, index: usize, cause: &Error) -> Self {
        Self::SubscriberFailure(format!("{} subscriber #{}: {}", source, index, cause))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<rmp_serde::encode::Error> for Error {
    fn from(err: rmp_serde::encode::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<rmp_serde::decode::Error> for Error {
    fn from(err: rmp_serde::decode::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<tungstenite::Error> for Error {
    fn from(err: tungstenite::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<hyper::Error> for Error {
    fn from(err: hyper::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_message() {
        let err = Error::malformed("text and children on <div>");
        assert_eq!(
            err.to_string(),
            "Malformed element: text and children on <div>"
        );
    }

    #[test]
    fn test_subscriber_failure_names_its_source() {
        let err = Error::subscriber("increment", 2, &Error::handler("boom"));
        assert_eq!(
            err.to_string(),
            "Subscriber failed: increment subscriber #2: boom"
        );
    }

    #[test]
    fn test_json_error_converts() {
        let err: Error = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert!(matches!(err, Error::Serialization(_)));
    }
}
