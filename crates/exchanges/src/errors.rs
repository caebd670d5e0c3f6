//! Exchange error types
//!
//! Every failure carries a kind tag so callers can branch on what went wrong
//! without string matching, plus the raw payload when one was received.

use thiserror::Error;

/// Result type for exchange operations
pub type Result<T> = std::result::Result<T, ExchangeError>;

/// Exchange operation errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExchangeError {
    /// Connection, TLS or socket failure. Never retried by this layer.
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("HTTP error {status}: {body}")]
    Http { status: u16, body: String },

    /// Response is not JSON, or not the shape the venue dialect expects
    #[error("Decode error: {message}")]
    Decode { message: String, payload: String },

    /// The exchange answered but its envelope reports failure
    #[error("{exchange} reported failure: {message}")]
    Exchange {
        exchange: String,
        message: String,
        payload: String,
    },

    #[error("{0} API Key or Secret Key are empty")]
    MissingCredentials(String),

    #[error("Signing error: {0}")]
    Signing(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Unknown coin: {0}")]
    UnknownCoin(String),

    #[error("Unknown pair: {0}")]
    UnknownPair(String),

    #[error("{exchange} does not support {operation}")]
    UnsupportedOperation { exchange: String, operation: String },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Fixed point error: {0}")]
    FixedPoint(String),
}

/// Coarse classification of [`ExchangeError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Transport,
    Decode,
    Exchange,
    Authentication,
    Configuration,
    Unsupported,
}

impl ExchangeError {
    pub fn decode(message: impl Into<String>, payload: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
            payload: payload.into(),
        }
    }

    pub fn exchange(exchange: &str, message: impl Into<String>, payload: impl Into<String>) -> Self {
        Self::Exchange {
            exchange: exchange.to_string(),
            message: message.into(),
            payload: payload.into(),
        }
    }

    pub fn unsupported(exchange: &str, operation: &str) -> Self {
        Self::UnsupportedOperation {
            exchange: exchange.to_string(),
            operation: operation.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Transport(_) | Self::Http { .. } => ErrorKind::Transport,
            Self::Decode { .. } | Self::FixedPoint(_) => ErrorKind::Decode,
            Self::Exchange { .. } => ErrorKind::Exchange,
            Self::MissingCredentials(_) | Self::Signing(_) => ErrorKind::Authentication,
            Self::InvalidUrl(_)
            | Self::UnknownCoin(_)
            | Self::UnknownPair(_)
            | Self::Configuration(_) => ErrorKind::Configuration,
            Self::UnsupportedOperation { .. } => ErrorKind::Unsupported,
        }
    }

    /// Raw response text that caused the error, if any
    pub fn payload(&self) -> Option<&str> {
        match self {
            Self::Decode { payload, .. } | Self::Exchange { payload, .. } => Some(payload),
            Self::Http { body, .. } => Some(body),
            _ => None,
        }
    }

    /// Attach the raw response to an error that lacks one
    pub fn with_payload(self, raw: &str) -> Self {
        match self {
            Self::Decode { message, payload } if payload.is_empty() => Self::Decode {
                message,
                payload: raw.to_string(),
            },
            Self::Exchange {
                exchange,
                message,
                payload,
            } if payload.is_empty() => Self::Exchange {
                exchange,
                message,
                payload: raw.to_string(),
            },
            Self::FixedPoint(message) => Self::Decode {
                message,
                payload: raw.to_string(),
            },
            other => other,
        }
    }
}

impl From<tradegate_core::FixedError> for ExchangeError {
    fn from(err: tradegate_core::FixedError) -> Self {
        Self::FixedPoint(err.to_string())
    }
}

impl From<serde_json::Error> for ExchangeError {
    fn from(err: serde_json::Error) -> Self {
        Self::decode(err.to_string(), String::new())
    }
}

impl From<url::ParseError> for ExchangeError {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidUrl(err.to_string())
    }
}
