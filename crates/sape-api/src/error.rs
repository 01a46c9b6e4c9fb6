use thiserror::Error;

/// Failures talking to the SAPE REST backend.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The server could not be reached at all.
    #[error("Could not connect to the server: {0}")]
    Connection(String),

    /// The request did not complete within the configured timeout.
    #[error("Request timed out")]
    Timeout,

    /// The server answered with a non-2xx status.
    #[error("Server answered {status}: {message}")]
    Status { status: u16, message: String },

    /// The response body was not the expected JSON.
    #[error("Invalid response from server: {0}")]
    Decode(String),

    /// Any other client-side failure (bad URL, TLS setup, ...).
    #[error("HTTP client error: {0}")]
    Http(#[source] reqwest::Error),
}

impl ApiError {
    /// HTTP status carried by the error, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ApiError::Timeout
        } else if e.is_connect() {
            ApiError::Connection(e.to_string())
        } else if e.is_decode() {
            ApiError::Decode(e.to_string())
        } else {
            ApiError::Http(e)
        }
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;
