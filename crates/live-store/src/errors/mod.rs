//! Error types and failure classification for the live store crate.
//!
//! This module provides:
//! - [`LiveStoreError`]: The error enum for a single fetch cycle
//! - [`ErrorClass`]: Classification used for logging and cycle accounting
//! - [`ConfigError`]: Invalid store or transport configuration

mod class;

pub use class::ErrorClass;

use std::time::Duration;

use thiserror::Error;

/// Errors that can end a fetch cycle.
///
/// None of these escape the public store API. The driver turns them into the
/// snapshot's `error` message and backs off, except [`LiveStoreError::Cancelled`]
/// which is dropped silently.
#[derive(Error, Debug)]
pub enum LiveStoreError {
    /// The server answered with a non-2xx, non-304 status.
    #[error("{message}")]
    Http {
        /// HTTP status code
        status: u16,
        /// Message from the structured error body, or derived from the status
        message: String,
    },

    /// The request never produced a response.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The transport gave up waiting for a response.
    #[error("Request timed out: {resource}")]
    Timeout {
        /// The sub-resource being fetched
        resource: String,
    },

    /// The response body did not match the expected payload shape.
    #[error("Invalid response for {resource}: {message}")]
    Decode {
        /// The sub-resource being fetched
        resource: String,
        /// Parser message
        message: String,
    },

    /// The payload parsed but violates a domain constraint.
    #[error("Validation failed for {resource}: {message}")]
    Validation {
        /// The sub-resource being fetched
        resource: String,
        /// Description of the violated constraint
        message: String,
    },

    /// A sub-resource path could not be joined onto the base URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The cycle was superseded by a newer one.
    #[error("Request cancelled")]
    Cancelled,
}

impl LiveStoreError {
    /// Builds the error for a non-2xx, non-304 response.
    ///
    /// The message comes from a structured `{"error": ..}` or `{"message": ..}`
    /// body when the server sent one.
    pub fn from_status(status: u16, body: &[u8]) -> Self {
        let message = structured_message(body)
            .unwrap_or_else(|| format!("Request failed with status {}", status));
        Self::Http { status, message }
    }

    /// Returns the classification for this error.
    ///
    /// ```
    /// use stables_live_store::errors::{ErrorClass, LiveStoreError};
    ///
    /// let error = LiveStoreError::from_status(503, b"");
    /// assert_eq!(error.error_class(), ErrorClass::Transient);
    ///
    /// let error = LiveStoreError::from_status(404, b"");
    /// assert_eq!(error.error_class(), ErrorClass::Terminal);
    /// ```
    pub fn error_class(&self) -> ErrorClass {
        match self {
            Self::Cancelled => ErrorClass::Cancelled,

            Self::Network(_) | Self::Timeout { .. } => ErrorClass::Transient,

            Self::Http { status, .. } => match status {
                408 | 425 | 429 => ErrorClass::Transient,
                500..=599 => ErrorClass::Transient,
                _ => ErrorClass::Terminal,
            },

            Self::Decode { .. } | Self::Validation { .. } | Self::InvalidUrl(_) => {
                ErrorClass::Terminal
            }
        }
    }

    /// Whether this error means the cycle was superseded rather than failed.
    pub fn is_cancellation(&self) -> bool {
        self.error_class() == ErrorClass::Cancelled
    }
}

fn structured_message(body: &[u8]) -> Option<String> {
    #[derive(serde::Deserialize)]
    struct ErrorBody {
        error: Option<String>,
        message: Option<String>,
    }

    let parsed: ErrorBody = serde_json::from_slice(body).ok()?;
    parsed
        .error
        .or(parsed.message)
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
}

/// Invalid live store or transport configuration.
#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Poll interval must be greater than zero")]
    ZeroPollInterval,

    #[error("Jitter ratio must be within 0.0..=1.0, got {0}")]
    InvalidJitterRatio(f64),

    #[error("Max backoff {max:?} is below the minimum backoff {min:?}")]
    BackoffRange { min: Duration, max: Duration },

    #[error("Invalid base URL: {0}")]
    InvalidBaseUrl(String),

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),
}
