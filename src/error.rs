use thiserror::Error;

/// Main error type for alertdog
#[derive(Error, Debug)]
pub enum AlertdogError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    // Network errors
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Endpoint {endpoint} rejected push: HTTP {status}")]
    EndpointRejected { endpoint: String, status: u16 },

    #[error("Endpoint {endpoint} timed out after {timeout_ms}ms")]
    EndpointTimeout { endpoint: String, timeout_ms: u64 },

    // Delivery errors
    #[error("Failed to push alert to any alertmanager ({attempted} attempted)")]
    PushFailed { attempted: usize },

    #[error("PagerDuty error: {0}")]
    PagerDuty(String),

    // Validation errors
    #[error("Validation failed: {0}")]
    Validation(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Generic errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

/// Result type alias for AlertdogError
pub type Result<T> = std::result::Result<T, AlertdogError>;
