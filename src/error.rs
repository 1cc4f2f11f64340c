use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

// Enum for handling application-level errors.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String), // Missing API key or a broken local setup.

    #[error("Generation failed after {attempts} attempt(s): {source}")]
    Generation {
        attempts: u32,
        #[source]
        source: TransportError,
    },

    #[error("Failed to parse {what}: {reason}")]
    Parse { what: &'static str, reason: String },

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Session is busy: {0}")]
    Busy(&'static str),

    #[error("Session was reset while a request was in flight")]
    Cancelled,

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IO(#[from] std::io::Error),

    #[error("Invalid filter pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Logger error: {0}")]
    Logger(#[from] log::SetLoggerError),
}

impl AppError {
    pub fn parse(what: &'static str, reason: impl ToString) -> Self {
        AppError::Parse {
            what,
            reason: reason.to_string(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation(message.into())
    }
}

// A single failed attempt against the generation endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("connection failed: {0}")]
    Connect(String),

    #[error("DNS lookup failed: {0}")]
    Dns(String),

    #[error("request timed out")]
    Timeout,

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed response body: {0}")]
    MalformedBody(String),

    #[error("response contained no content")]
    MissingContent,

    #[error("request failed: {0}")]
    Request(String),
}

impl TransportError {
    /// Whether another attempt may succeed where this one failed.
    pub fn is_retryable(&self) -> bool {
        match self {
            TransportError::Connect(_) | TransportError::Dns(_) | TransportError::Timeout => true,
            TransportError::Status { status, .. } => {
                *status >= 500 || *status == 429 || *status == 408
            }
            TransportError::MalformedBody(_)
            | TransportError::MissingContent
            | TransportError::Request(_) => false,
        }
    }
}
