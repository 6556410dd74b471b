use thiserror::Error;

/// Failures while fetching or normalizing a venue's depth payload.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum VenueError {
    #[error("transport error: {0}")]
    Http(#[from] rest::HttpError),

    #[error("malformed payload for {venue} {symbol}: {reason}")]
    MalformedPayload {
        venue: String,
        symbol: String,
        reason: String,
    },
}

impl VenueError {
    pub(crate) fn malformed(
        venue: impl Into<String>,
        symbol: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::MalformedPayload {
            venue: venue.into(),
            symbol: symbol.into(),
            reason: reason.into(),
        }
    }
}

/// Type alias for results returned by venue operations
pub type VenueResult<T> = Result<T, VenueError>;
