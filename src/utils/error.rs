use thiserror::Error;

/// Custom error types for the IP gate service
#[derive(Error, Debug)]
pub enum GateError {
    /// Configuration related errors
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// A list or audit file could not be written
    #[error("Storage error: {0}")]
    Storage(String),

    /// JSON encoding or decoding failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// No access attempt exists with the given id
    #[error("Attempt not found: {0}")]
    AttemptNotFound(String),

    /// Invalid request errors
    #[error("Invalid request: {0}")]
    InvalidInput(String),

    /// TTL string does not follow `<digits>[mhd]`
    #[error("{0}")]
    InvalidTtl(String),

    /// No admin token is available to the caller
    #[error("ADMIN_TOKEN not set in environment")]
    MissingAdminToken,

    /// Bearer token missing or wrong
    #[error("Invalid admin token")]
    Unauthorized,

    /// Rate limiting errors
    #[error("Rate limit exceeded for IP: {0}")]
    RateLimitExceeded(String),

    /// Transport failure talking to the admin API
    #[error("HTTP error: {0}")]
    Http(String),

    /// Admin API answered with a non-success status
    #[error("API error ({status}): {body}")]
    Api { status: u16, body: String },

    /// Internal server errors
    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Result type for IP gate operations
pub type GateResult<T> = Result<T, GateError>;

impl From<reqwest::Error> for GateError {
    fn from(err: reqwest::Error) -> Self {
        GateError::Http(err.to_string())
    }
}

impl From<std::io::Error> for GateError {
    fn from(err: std::io::Error) -> Self {
        GateError::Storage(err.to_string())
    }
}
