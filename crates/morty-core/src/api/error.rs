use thiserror::Error;

/// Normalized failure from the HTTP client and resource accessors.
///
/// Every variant carries plain data so the error can be cloned and handed to
/// all consumers waiting on a shared in-flight query.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Rate limited - please wait before retrying")]
    RateLimited,

    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Could not build request: {0}")]
    ClientBuild(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Invalid episode URL: {0}")]
    InvalidEpisodeUrl(String),

    #[error("Request was cancelled before it completed")]
    Cancelled,
}

/// Coarse failure class used for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The server answered with a non-2xx status.
    Server,
    /// No response reached us.
    Network,
    /// The request never left, or its result could not be understood.
    Client,
}

impl ErrorClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorClass::Server => "server-error",
            ErrorClass::Network => "network-error",
            ErrorClass::Client => "client-error",
        }
    }
}

impl std::fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// Body shape the API uses for failures, e.g. `{"error": "Character not found"}`.
#[derive(serde::Deserialize)]
struct ErrorBody {
    error: String,
}

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    /// Prefer the API's own `error` message over the raw body.
    fn message_from_body(body: &str) -> String {
        match serde_json::from_str::<ErrorBody>(body) {
            Ok(parsed) => parsed.error,
            Err(_) => Self::truncate_body(body.trim()),
        }
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let message = Self::message_from_body(body);
        match status.as_u16() {
            404 => ApiError::NotFound(message),
            429 => ApiError::RateLimited,
            code => ApiError::Server {
                status: code,
                message,
            },
        }
    }

    /// Map a transport-level failure from reqwest.
    pub fn from_transport(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout
        } else if err.is_builder() {
            ApiError::ClientBuild(err.to_string())
        } else if err.is_decode() {
            ApiError::InvalidResponse(err.to_string())
        } else {
            ApiError::Network(err.to_string())
        }
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            ApiError::NotFound(_) | ApiError::RateLimited | ApiError::Server { .. } => {
                ErrorClass::Server
            }
            ApiError::Network(_) | ApiError::Timeout | ApiError::Cancelled => ErrorClass::Network,
            ApiError::ClientBuild(_)
            | ApiError::InvalidResponse(_)
            | ApiError::InvalidEpisodeUrl(_) => ErrorClass::Client,
        }
    }

    /// Whether the cache layer should spend its retry budget on this error.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            ApiError::NotFound(_) | ApiError::ClientBuild(_) | ApiError::InvalidEpisodeUrl(_)
        )
    }
}
