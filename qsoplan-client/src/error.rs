//! Error handling for the QSO Plan client
//!
//! This module provides a comprehensive error type for all client operations.
//! Errors are automatically converted from underlying library errors using
//! `thiserror`.
//!
//! ## Error Handling Patterns
//!
//! ### Basic Usage
//!
//! ```rust,no_run
//! use qsoplan_client::{validate, Result};
//!
//! fn prepare_call_sign(raw: &str) -> Result<String> {
//!     // Errors are propagated with the `?` operator
//!     let call_sign = validate::normalize_call_sign(raw)?;
//!     Ok(call_sign)
//! }
//! ```
//!
//! ### Error Matching
//!
//! Match on specific error variants for custom handling:
//!
//! ```rust
//! use qsoplan_client::ClientError;
//!
//! fn describe(error: &ClientError) -> String {
//!     match error {
//!         ClientError::NotLoggedIn => "log in first".to_string(),
//!         ClientError::Api { status, detail } => format!("server said {status}: {detail}"),
//!         other => other.to_string(),
//!     }
//! }
//! ```
//!
//! ### Creating Domain Errors
//!
//! ```rust
//! use qsoplan_client::ClientError;
//!
//! let error = ClientError::Validation("Call sign must be 3-10 alphanumeric characters".to_string());
//! let error = ClientError::Api { status: 400, detail: "Cannot delete confirmed QSOs".to_string() };
//! let error = ClientError::NotLoggedIn;
//! ```
//!
//! ## Error Categories
//!
//! ### I/O Errors
//! File system failures while persisting the session.
//! Automatically converted from `std::io::Error`.
//!
//! ### Serialization Errors
//! JSON parsing and serialization failures.
//! Automatically converted from `serde_json::Error`.
//!
//! ### Transport Errors
//! HTTP-level failures talking to the API server.
//! Automatically converted from `reqwest::Error`; timeouts and connection
//! failures get their own variants via [`ClientError::from_reqwest`].
//!
//! ### API Errors
//! Structured rejections from the server: the HTTP status plus the error
//! detail extracted from the response body (`detail` strings, field maps and
//! bare message arrays all fold into the same place).
//!
//! ### Domain Errors
//! Client-side conditions: `NotLoggedIn`, `SessionExpired`, `Validation`.

use thiserror::Error;

/// Result type for client operations
///
/// Type alias for `Result<T, ClientError>` used throughout the library.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur during client operations
///
/// Most errors automatically convert from underlying library errors using
/// the `From` trait:
/// - `std::io::Error` → `ClientError::Io`
/// - `serde_json::Error` → `ClientError::Json`
/// - `reqwest::Error` → `ClientError::Http`
///
/// # Examples
///
/// ```rust
/// use qsoplan_client::ClientError;
///
/// let error = ClientError::NotLoggedIn;
/// assert_eq!(error.to_string(), "Not logged in");
///
/// let error = ClientError::Api { status: 400, detail: "Cannot log a QSO with yourself".to_string() };
/// assert_eq!(error.to_string(), "API error (400): Cannot log a QSO with yourself");
/// ```
#[derive(Error, Debug)]
pub enum ClientError {
    /// I/O error (session file, config paths)
    ///
    /// Automatically converted from `std::io::Error`.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    ///
    /// Automatically converted from `serde_json::Error`.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP transport error
    ///
    /// Automatically converted from `reqwest::Error`. Use
    /// [`ClientError::from_reqwest`] to classify timeouts and connection
    /// failures into their own variants.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Request timed out
    #[error("Connection timeout: {0}")]
    Timeout(String),

    /// Could not reach the server
    #[error("Connection failed: {0}")]
    Connect(String),

    /// Structured rejection from the API server
    ///
    /// Carries the HTTP status and the error detail folded out of the
    /// response body.
    #[error("API error ({status}): {detail}")]
    Api { status: u16, detail: String },

    /// No session is stored; the operation requires authentication
    #[error("Not logged in")]
    NotLoggedIn,

    /// The stored session is no longer accepted and could not be refreshed
    #[error("Session expired")]
    SessionExpired,

    /// Input failed client-side validation
    #[error("Validation error: {0}")]
    Validation(String),
}

impl ClientError {
    /// Convert a generic transport error into a more specific variant
    ///
    /// Examines the error and returns a timeout or connection variant when
    /// possible, providing better error messages to users.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use qsoplan_client::ClientError;
    ///
    /// # fn handle(error: reqwest::Error) -> ClientError {
    /// ClientError::from_reqwest(error, "fetching contact list")
    /// # }
    /// ```
    pub fn from_reqwest(error: reqwest::Error, context: &str) -> Self {
        if error.is_timeout() {
            ClientError::Timeout(format!("{}: {}", context, error))
        } else if error.is_connect() {
            ClientError::Connect(format!("{}: {}", context, error))
        } else {
            ClientError::Http(error)
        }
    }

    /// Check if this error is recoverable (transient error that can be retried)
    ///
    /// Returns `true` if the error might succeed on retry, `false` if it's
    /// permanent.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use qsoplan_client::ClientError;
    ///
    /// let error = ClientError::Timeout("request timed out".to_string());
    /// assert!(error.is_recoverable());
    ///
    /// let error = ClientError::NotLoggedIn;
    /// assert!(!error.is_recoverable());
    /// ```
    pub fn is_recoverable(&self) -> bool {
        match self {
            ClientError::Timeout(_)
            | ClientError::Connect(_)
            | ClientError::Http(_)
            | ClientError::Io(_) => true,
            // Server-side failures may clear up; client rejects will not.
            ClientError::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Check if this error requires user action
    ///
    /// Returns `true` if the error cannot be resolved automatically and
    /// requires user intervention (logging in again, fixing the input).
    ///
    /// # Examples
    ///
    /// ```rust
    /// use qsoplan_client::ClientError;
    ///
    /// let error = ClientError::SessionExpired;
    /// assert!(error.requires_user_action());
    ///
    /// let error = ClientError::Timeout("request timed out".to_string());
    /// assert!(!error.requires_user_action());
    /// ```
    pub fn requires_user_action(&self) -> bool {
        match self {
            ClientError::NotLoggedIn
            | ClientError::SessionExpired
            | ClientError::Validation(_) => true,
            ClientError::Api { status, .. } => matches!(*status, 400 | 401 | 403),
            _ => false,
        }
    }

    /// Get a user-friendly error message suitable for display
    ///
    /// Returns a simplified, actionable message that can be shown to users
    /// without exposing transport internals.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use qsoplan_client::ClientError;
    ///
    /// let error = ClientError::NotLoggedIn;
    /// assert_eq!(error.user_message(), "Not logged in. Please log in first.");
    /// ```
    pub fn user_message(&self) -> String {
        match self {
            ClientError::NotLoggedIn => "Not logged in. Please log in first.".to_string(),
            ClientError::SessionExpired => {
                "Session expired. Please log in again.".to_string()
            }
            ClientError::Validation(msg) => msg.clone(),
            ClientError::Api { status: 401, .. } => {
                "Authentication rejected. Please log in again.".to_string()
            }
            ClientError::Api { detail, .. } => detail.clone(),
            ClientError::Timeout(_) => {
                "The server took too long to respond. Check your connection and try again."
                    .to_string()
            }
            ClientError::Connect(_) => {
                "Could not reach the server. Check the server URL and your connection."
                    .to_string()
            }
            ClientError::Http(e) => format!("Network error: {}.", e),
            ClientError::Io(e) => format!("I/O error: {}.", e),
            ClientError::Json(e) => format!("Data format error: {}.", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = ClientError::NotLoggedIn;
        assert_eq!(error.to_string(), "Not logged in");

        let error = ClientError::Validation("Call sign must be 3-10 alphanumeric characters".to_string());
        assert_eq!(
            error.to_string(),
            "Validation error: Call sign must be 3-10 alphanumeric characters"
        );

        let error = ClientError::Api {
            status: 400,
            detail: "Cannot delete confirmed QSOs".to_string(),
        };
        assert_eq!(error.to_string(), "API error (400): Cannot delete confirmed QSOs");
    }

    #[test]
    fn test_io_error_conversion() {
        use std::io::{Error, ErrorKind};

        let io_error = Error::new(ErrorKind::NotFound, "file not found");
        let client_error: ClientError = io_error.into();

        assert!(matches!(client_error, ClientError::Io(_)));
        assert!(client_error.to_string().contains("file not found"));
    }

    #[test]
    fn test_json_error_conversion() {
        let json = r#"{"invalid json"#;
        let json_error = serde_json::from_str::<serde_json::Value>(json).unwrap_err();
        let client_error: ClientError = json_error.into();

        assert!(matches!(client_error, ClientError::Json(_)));
    }

    #[test]
    fn test_recoverable_classification() {
        assert!(ClientError::Timeout("t".to_string()).is_recoverable());
        assert!(ClientError::Connect("c".to_string()).is_recoverable());
        assert!(ClientError::Api { status: 503, detail: "down".to_string() }.is_recoverable());

        assert!(!ClientError::NotLoggedIn.is_recoverable());
        assert!(!ClientError::Api { status: 400, detail: "bad".to_string() }.is_recoverable());
        assert!(!ClientError::Validation("v".to_string()).is_recoverable());
    }

    #[test]
    fn test_user_action_classification() {
        assert!(ClientError::NotLoggedIn.requires_user_action());
        assert!(ClientError::SessionExpired.requires_user_action());
        assert!(ClientError::Validation("v".to_string()).requires_user_action());
        assert!(ClientError::Api { status: 401, detail: "no".to_string() }.requires_user_action());

        assert!(!ClientError::Timeout("t".to_string()).requires_user_action());
        assert!(!ClientError::Api { status: 500, detail: "boom".to_string() }.requires_user_action());
    }
}
