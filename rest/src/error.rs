use thiserror::Error;

/// Transport-level failures for public REST endpoints.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HttpError {
    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out")]
    Timeout,

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("decode error: {0}")]
    Decode(String),

    #[error("status {status} response: {body}")]
    Http { status: u16, body: String },
}

impl HttpError {
    /// Whether a retry can reasonably succeed: timeouts, connection drops and
    /// 5xx responses. Client errors and decode failures are final.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout | Self::Network(_) => true,
            Self::Http { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for HttpError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_connect() || err.is_request() {
            Self::Network(err.to_string())
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}
