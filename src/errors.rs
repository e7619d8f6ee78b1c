use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Enumerates high-level errors returned by this library.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Represents an SQL error.
    #[error("SQLx error")]
    Sqlx { source: sqlx::Error },

    /// Represents a failure to reach the database at startup.
    #[error("Could not connect to the database after {attempts} attempts")]
    ConnectionFailed { attempts: u32, source: sqlx::Error },

    /// Represents a request body that isn't valid JSON for the
    /// operation.
    #[error("Malformed payload: {0}")]
    MalformedPayload(serde_json::Error),

    /// Represents a required field that is absent or blank.
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// Represents a field whose value is out of range or unparsable.
    #[error("Invalid {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },

    /// Represents an identifier that cannot be parsed.
    #[error("Invalid ID: {0}")]
    InvalidId(String),

    /// Represents an identifier with no matching record.
    #[error("No record with ID {0}")]
    NonExistentId(String),

    #[error("Username is already taken")]
    UsernameTaken,

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Login required")]
    Unauthenticated,

    /// Represents an environment variable with an unusable value.
    #[error("Invalid value for {name}: {reason}")]
    InvalidConfiguration { name: String, reason: String },

    #[error("Failed to generate URL")]
    FailedToGenerateUrl { source: url::ParseError },

    #[error("Failed to read page {path:?}")]
    PageUnavailable { path: PathBuf, source: io::Error },
}

impl BackendError {
    pub fn invalid_field(field: &'static str, reason: impl Into<String>) -> Self {
        BackendError::InvalidField {
            field,
            reason: reason.into(),
        }
    }
}
