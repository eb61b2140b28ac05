//! Unified error handling for the journeys library.
//!
//! Parsing is pure and reports [`ParseError`]; everything that talks to the
//! remote API reports [`GiroError`]. The journey store turns the latter into
//! the human-readable string shown by the app.

use thiserror::Error;

/// Failure to parse one of the journey's locale-formatted fields.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Date not in `DD/MM/YYYY HH:mm` form, or a field out of range
    #[error("invalid journey date '{input}': {reason}")]
    InvalidDate { input: String, reason: String },
    /// Duration with neither an hours nor a minutes group
    #[error("invalid journey duration '{input}'")]
    InvalidDuration { input: String },
}

/// Unified error type for journey operations.
#[derive(Debug, Clone, Error)]
pub enum GiroError {
    /// Transport failure (connection, timeout, TLS)
    #[error("Network error: {message}")]
    Http { message: String },
    /// The API answered with a failure status or `success: false`
    #[error("{}", format_api_error(.message, .status_code))]
    Api {
        message: String,
        status_code: Option<u16>,
    },
    /// The API answered with a body we could not decode
    #[error("Unexpected response from server: {message}")]
    Decode { message: String },
    /// Input rejected before reaching the API
    #[error("{}", .errors.join("; "))]
    Validation { errors: Vec<String> },
    /// A field failed to parse
    #[error(transparent)]
    Parse(#[from] ParseError),
    /// The store was shut down while the operation was in flight
    #[error("Operation cancelled")]
    Cancelled,
    /// Configuration error
    #[error("Configuration error: {message}")]
    Config { message: String },
}

fn format_api_error(message: &str, status_code: &Option<u16>) -> String {
    match *status_code {
        // Messages coming from the API are shown verbatim
        Some(_) if !message.is_empty() => message.to_string(),
        Some(code) => format!("Request failed with HTTP {}", code),
        None => message.to_string(),
    }
}

impl GiroError {
    /// Whether retrying the same request could succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            GiroError::Http { .. } => true,
            GiroError::Api {
                status_code: Some(code),
                ..
            } => *code == 429 || *code >= 500,
            _ => false,
        }
    }
}

/// Result type alias for journey operations.
pub type Result<T> = std::result::Result<T, GiroError>;
