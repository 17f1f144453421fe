//! voicecrm - terminal operator console for an AI voice-assistant CRM
//!
//! Lists and filters logged calls, opens call details, retries failed calls,
//! and surfaces customers and metrics from the CRM backend API.

pub mod api;
pub mod cli;
pub mod config;
pub mod tui;
pub mod view;

use thiserror::Error;

/// Generic message shown when the backend cannot be reached.
pub const TRANSPORT_FAILURE_MESSAGE: &str =
    "Could not reach the CRM server. Check your connection and try again.";

/// Generic message shown when the backend answers with something unreadable.
pub const PARSE_FAILURE_MESSAGE: &str = "The CRM server returned an unexpected response.";

/// Main error type for voicecrm
#[derive(Error, Debug)]
pub enum CrmError {
    /// Bad user input, caught before any request is sent
    #[error("Invalid {field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    /// Network failure, timeout, or non-2xx HTTP status
    #[error("Transport error: {message}")]
    Transport {
        status: Option<u16>,
        message: String,
    },

    /// Response body was not the JSON we expected
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl CrmError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            status: None,
            message: message.into(),
        }
    }

    /// Text suitable for showing to an operator.
    ///
    /// Transport and parse failures collapse to a generic message; the
    /// details belong in the log, not on screen.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation { message, .. } => message.clone(),
            Self::Transport { .. } => TRANSPORT_FAILURE_MESSAGE.to_string(),
            Self::Parse(_) => PARSE_FAILURE_MESSAGE.to_string(),
            Self::Config(message) => format!("Configuration error: {}", message),
        }
    }

    /// Whether this error came from the network boundary.
    pub fn is_transport_or_parse(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Parse(_))
    }
}

pub type Result<T> = std::result::Result<T, CrmError>;

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "voicecrm";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_and_parse_errors_hide_details_from_operators() {
        let err = CrmError::Transport {
            status: Some(502),
            message: "GET /api/calls returned 502 Bad Gateway".to_string(),
        };
        assert_eq!(err.user_message(), TRANSPORT_FAILURE_MESSAGE);
        assert!(err.is_transport_or_parse());

        let err = CrmError::Parse("expected value at line 1".to_string());
        assert_eq!(err.user_message(), PARSE_FAILURE_MESSAGE);
    }

    #[test]
    fn config_errors_are_not_network_errors() {
        let err = CrmError::Config("api.base_url is empty".to_string());
        assert_eq!(err.user_message(), "Configuration error: api.base_url is empty");
        assert!(!err.is_transport_or_parse());
    }

    #[test]
    fn validation_errors_name_the_field() {
        let err = CrmError::validation("start_date", "Start date is required");
        assert_eq!(err.to_string(), "Invalid start_date: Start date is required");
        assert_eq!(err.user_message(), "Start date is required");
    }
}
