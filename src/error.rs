//! Error types for chatbox.
//!
//! Every failure the controller can observe is one of these variants.  Only
//! [`Error::Configuration`] is fatal; the rest are recovered by the controller
//! and surface to the user as a fixed failure message.

use std::error;
use std::fmt;
use std::sync::Arc;

/// The main error type for chatbox.
#[derive(Clone, Debug)]
pub enum Error {
    /// Required page elements are missing.
    Configuration {
        /// Human-readable error message.
        message: String,
        /// Identifiers of the elements that could not be located.
        missing: Vec<String>,
    },

    /// The backend answered with a non-success status.
    Http {
        /// HTTP status code.
        status_code: u16,
        /// Canonical reason phrase for the status, if known.
        reason: Option<String>,
        /// Response body, if it could be read.
        body: Option<String>,
    },

    /// The request did not complete within the configured timeout.
    Timeout {
        /// Human-readable error message.
        message: String,
        /// Duration of the timeout in seconds.
        duration: Option<f64>,
    },

    /// The backend could not be reached.
    Connection {
        /// Human-readable error message.
        message: String,
        /// Underlying cause.
        source: Option<Arc<dyn error::Error + Send + Sync>>,
    },

    /// HTTP client error.
    HttpClient {
        /// Human-readable error message.
        message: String,
        /// The underlying error.
        source: Option<Arc<dyn error::Error + Send + Sync>>,
    },

    /// Error during JSON serialization or deserialization.
    Serialization {
        /// Human-readable error message.
        message: String,
        /// The underlying error.
        source: Option<Arc<dyn error::Error + Send + Sync>>,
    },

    /// A URL parsing or manipulation error.
    Url {
        /// Human-readable error message.
        message: String,
        /// The underlying error.
        source: Option<url::ParseError>,
    },
}

impl Error {
    /// Creates a new configuration error listing the missing element ids.
    pub fn configuration(message: impl Into<String>, missing: Vec<String>) -> Self {
        Error::Configuration {
            message: message.into(),
            missing,
        }
    }

    /// Creates a new HTTP status error.
    pub fn http(status_code: u16, reason: Option<String>, body: Option<String>) -> Self {
        Error::Http {
            status_code,
            reason,
            body,
        }
    }

    /// Creates a new timeout error.
    pub fn timeout(message: impl Into<String>, duration: Option<f64>) -> Self {
        Error::Timeout {
            message: message.into(),
            duration,
        }
    }

    /// Creates a new connection error.
    pub fn connection(
        message: impl Into<String>,
        source: Option<Box<dyn error::Error + Send + Sync>>,
    ) -> Self {
        Error::Connection {
            message: message.into(),
            source: source.map(Arc::from),
        }
    }

    /// Creates a new HTTP client error.
    pub fn http_client(
        message: impl Into<String>,
        source: Option<Box<dyn error::Error + Send + Sync>>,
    ) -> Self {
        Error::HttpClient {
            message: message.into(),
            source: source.map(Arc::from),
        }
    }

    /// Creates a new serialization error.
    pub fn serialization(
        message: impl Into<String>,
        source: Option<Box<dyn error::Error + Send + Sync>>,
    ) -> Self {
        Error::Serialization {
            message: message.into(),
            source: source.map(Arc::from),
        }
    }

    /// Creates a new URL error.
    pub fn url(message: impl Into<String>, source: Option<url::ParseError>) -> Self {
        Error::Url {
            message: message.into(),
            source,
        }
    }

    /// Returns true if this error is a configuration error.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Error::Configuration { .. })
    }

    /// Returns true if the backend answered with a non-success status.
    pub fn is_http(&self) -> bool {
        matches!(self, Error::Http { .. })
    }

    /// Returns true if this error is a timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout { .. })
    }

    /// Returns true if this error is a connection error.
    pub fn is_connection(&self) -> bool {
        matches!(self, Error::Connection { .. })
    }

    /// Returns true if the request never produced a usable response.
    ///
    /// This covers everything that is neither a configuration problem nor a
    /// non-success status: unreachable hosts, timeouts, and bodies that could
    /// not be read or parsed.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Error::Timeout { .. }
                | Error::Connection { .. }
                | Error::HttpClient { .. }
                | Error::Serialization { .. }
        )
    }

    /// Returns the status code associated with this error, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::Http { status_code, .. } => Some(*status_code),
            _ => None,
        }
    }

    /// Returns the element ids that could not be located, if any.
    pub fn missing_elements(&self) -> &[String] {
        match self {
            Error::Configuration { missing, .. } => missing,
            _ => &[],
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Configuration { message, missing } => {
                if missing.is_empty() {
                    write!(f, "Configuration error: {message}")
                } else {
                    write!(
                        f,
                        "Configuration error: {message} (missing: {})",
                        missing.join(", ")
                    )
                }
            }
            Error::Http {
                status_code,
                reason,
                ..
            } => {
                if let Some(reason) = reason {
                    write!(f, "Server error: {status_code} {reason}")
                } else {
                    write!(f, "Server error: {status_code}")
                }
            }
            Error::Timeout { message, duration } => {
                if let Some(duration) = duration {
                    write!(f, "Timeout error: {message} ({duration} seconds)")
                } else {
                    write!(f, "Timeout error: {message}")
                }
            }
            Error::Connection { message, .. } => {
                write!(f, "Connection error: {message}")
            }
            Error::HttpClient { message, .. } => {
                write!(f, "HTTP client error: {message}")
            }
            Error::Serialization { message, .. } => {
                write!(f, "Serialization error: {message}")
            }
            Error::Url { message, .. } => {
                write!(f, "URL error: {message}")
            }
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::Connection { source, .. } => source
                .as_ref()
                .map(|e| e.as_ref() as &(dyn error::Error + 'static)),
            Error::HttpClient { source, .. } => source
                .as_ref()
                .map(|e| e.as_ref() as &(dyn error::Error + 'static)),
            Error::Serialization { source, .. } => source
                .as_ref()
                .map(|e| e.as_ref() as &(dyn error::Error + 'static)),
            Error::Url { source, .. } => {
                source.as_ref().map(|e| e as &(dyn error::Error + 'static))
            }
            _ => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::serialization(format!("JSON error: {err}"), Some(Box::new(err)))
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::url(format!("URL parse error: {err}"), Some(err))
    }
}

/// A specialized Result type for chatbox operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_lists_missing_elements() {
        let err = Error::configuration(
            "required page elements not found",
            vec!["chat-form".to_string(), "user-input".to_string()],
        );
        assert!(err.is_configuration());
        assert!(!err.is_transport());
        assert_eq!(err.missing_elements(), ["chat-form", "user-input"]);
        assert_eq!(
            err.to_string(),
            "Configuration error: required page elements not found (missing: chat-form, user-input)"
        );
    }

    #[test]
    fn http_error_display() {
        let err = Error::http(500, Some("Internal Server Error".to_string()), None);
        assert!(err.is_http());
        assert!(!err.is_transport());
        assert_eq!(err.status_code(), Some(500));
        assert_eq!(err.to_string(), "Server error: 500 Internal Server Error");
        assert_eq!(
            Error::http(599, None, None).to_string(),
            "Server error: 599"
        );
    }

    #[test]
    fn transport_classification() {
        assert!(Error::timeout("slow", Some(1.5)).is_transport());
        assert!(Error::timeout("slow", Some(1.5)).is_timeout());
        assert!(Error::connection("refused", None).is_transport());
        assert!(Error::connection("refused", None).is_connection());
        assert!(!Error::connection("refused", None).is_timeout());
        assert!(Error::http_client("broken", None).is_transport());
        assert!(Error::serialization("bad json", None).is_transport());
        assert!(!Error::url("bad url", None).is_transport());
        assert_eq!(Error::connection("refused", None).status_code(), None);
    }

    #[test]
    fn json_errors_convert_with_source() {
        let parse = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = Error::from(parse);
        assert!(matches!(err, Error::Serialization { .. }));
        assert!(error::Error::source(&err).is_some());
    }
}
