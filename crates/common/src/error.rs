//! Common error types and handling for the kata solver

/// Common result type
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for the kata solver
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Upstream failure: {0}")]
    Upstream(String),

    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Get the error code for logs and user-facing reports
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::InvalidArgument(_) => "INVALID_ARGUMENT",
            Error::NotFound(_) => "NOT_FOUND",
            Error::Upstream(_) => "UPSTREAM_FAILURE",
            Error::InvariantViolation(_) => "INVARIANT_VIOLATION",
            Error::Configuration(_) => "CONFIGURATION_ERROR",
            Error::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Whether the error was caused by the caller's input rather than a
    /// collaborator or an internal fault
    pub fn is_caller_error(&self) -> bool {
        matches!(self, Error::InvalidArgument(_) | Error::NotFound(_))
    }
}
