//! Error types and handling for Tarif EDF
//!
//! Network and parsing failures abort only the refresh step they happen in;
//! the coordinator logs them and keeps the last good state published.

use thiserror::Error;

/// Result type alias for Tarif EDF operations
pub type Result<T> = std::result::Result<T, TarifError>;

/// Main error type for Tarif EDF
#[derive(Debug, Error)]
pub enum TarifError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Network errors: timeout, connection failure or non-2xx status
    #[error("Fetch error: {message}")]
    Fetch { message: String },

    /// Malformed schedule row, numeric field or JSON payload
    #[error("Parse error: {message}")]
    Parse { message: String },

    /// Validation errors
    #[error("Validation error: {field} - {message}")]
    Validation { field: String, message: String },

    /// File I/O errors
    #[error("I/O error: {message}")]
    Io { message: String },

    /// Serialization/deserialization errors (configuration files)
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// HTTP status server errors
    #[error("Web server error: {message}")]
    Web { message: String },
}

impl TarifError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        TarifError::Config {
            message: message.into(),
        }
    }

    /// Create a new fetch error
    pub fn fetch<S: Into<String>>(message: S) -> Self {
        TarifError::Fetch {
            message: message.into(),
        }
    }

    /// Create a new parse error
    pub fn parse<S: Into<String>>(message: S) -> Self {
        TarifError::Parse {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(field: S, message: S) -> Self {
        TarifError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a new I/O error
    pub fn io<S: Into<String>>(message: S) -> Self {
        TarifError::Io {
            message: message.into(),
        }
    }

    /// Create a new web error
    pub fn web<S: Into<String>>(message: S) -> Self {
        TarifError::Web {
            message: message.into(),
        }
    }

    /// Whether the error comes from the network rather than from the payload
    pub fn is_fetch(&self) -> bool {
        matches!(self, TarifError::Fetch { .. })
    }
}

impl From<std::io::Error> for TarifError {
    fn from(err: std::io::Error) -> Self {
        TarifError::io(err.to_string())
    }
}

impl From<serde_yaml::Error> for TarifError {
    fn from(err: serde_yaml::Error) -> Self {
        TarifError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for TarifError {
    fn from(err: serde_json::Error) -> Self {
        TarifError::parse(err.to_string())
    }
}

impl From<csv::Error> for TarifError {
    fn from(err: csv::Error) -> Self {
        TarifError::parse(err.to_string())
    }
}

impl From<reqwest::Error> for TarifError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TarifError::fetch(format!("request timed out: {}", err))
        } else {
            TarifError::fetch(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = TarifError::config("test config error");
        assert!(matches!(err, TarifError::Config { .. }));

        let err = TarifError::fetch("timeout");
        assert!(matches!(err, TarifError::Fetch { .. }));
        assert!(err.is_fetch());

        let err = TarifError::validation("field", "test validation error");
        assert!(matches!(err, TarifError::Validation { .. }));
        assert!(!err.is_fetch());
    }

    #[test]
    fn test_error_display() {
        let err = TarifError::parse("bad number");
        assert_eq!(format!("{}", err), "Parse error: bad number");

        let err = TarifError::validation("test_field", "invalid value");
        assert_eq!(
            format!("{}", err),
            "Validation error: test_field - invalid value"
        );
    }
}
