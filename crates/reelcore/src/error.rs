use thiserror::Error;

/// Centralized error types for the application
///
/// Everything except extraction outcomes is converted to this enum.
/// Extraction never fails with an `AppError`; see [`ExtractError`].
#[derive(Error, Debug)]
pub enum AppError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Database connection pool errors
    #[error("Database pool error: {0}")]
    DatabasePool(#[from] r2d2::Error),

    /// Schema migration errors
    #[error("Migration error: {0}")]
    Migration(#[from] refinery::Error),

    /// Telegram API errors
    #[cfg(feature = "telegram")]
    #[error("Telegram error: {0}")]
    Telegram(#[from] teloxide::RequestError),

    /// HTTP client errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing errors
    #[error("URL parsing error: {0}")]
    Url(#[from] url::ParseError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Type alias for Result with AppError
pub type AppResult<T> = Result<T, AppError>;

/// Why an extraction attempt failed.
///
/// The `Display` output is the user-facing error string carried by
/// `ExtractionResult::Failure`; the chat layer matches on substrings of it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    /// No API endpoint configured; no request was made
    #[error("Server misconfigured: API_ENDPOINT is not set")]
    Misconfigured,

    /// The request did not complete within the configured bound
    #[error("Request timed out")]
    Timeout,

    /// DNS, connect, socket or proxy failure
    #[error("Internal fetch error: {0}")]
    Transport(String),

    /// The API answered with a non-2xx status
    #[error("Server error: {0}")]
    Server(String),

    /// 2xx response whose body is not JSON
    #[error("Invalid JSON from API")]
    InvalidJson,

    /// 2xx JSON response of no recognized shape
    #[error("Unknown API response")]
    UnknownResponse,

    /// The API reported `status: "error"`
    #[error("{0}")]
    Upstream(String),
}

impl ExtractError {
    /// Returns subcategory for logs
    pub fn subcategory(&self) -> &'static str {
        match self {
            ExtractError::Misconfigured => "misconfigured",
            ExtractError::Timeout => "timeout",
            ExtractError::Transport(_) => "transport",
            ExtractError::Server(_) => "server",
            ExtractError::InvalidJson => "invalid_json",
            ExtractError::UnknownResponse => "unknown_response",
            ExtractError::Upstream(_) => "upstream",
        }
    }

    /// True when the failure happened below HTTP, i.e. the proxy (if any)
    /// did not carry the exchange.
    pub fn is_transport(&self) -> bool {
        matches!(self, ExtractError::Timeout | ExtractError::Transport(_))
    }
}
