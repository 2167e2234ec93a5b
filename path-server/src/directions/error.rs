//! Routing oracle error types.

/// Errors from a routing oracle.
#[derive(Debug, thiserror::Error)]
pub enum DirectionsError {
    /// HTTP request failed (network error, connect failure, etc.)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON deserialization failed
    #[error("JSON parse error: {message}")]
    Json {
        message: String,
        body: Option<String>,
    },

    /// API returned an error status code
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// API answered, but with a non-OK directions status
    #[error("directions status {status}: {message}")]
    Status { status: String, message: String },

    /// Rate limited by the API
    #[error("rate limited by directions API")]
    RateLimited,

    /// Invalid API key or request denied
    #[error("unauthorized (invalid API key or request denied)")]
    Unauthorized,

    /// The call did not complete within the per-call timeout
    #[error("directions request timed out")]
    Timeout,

    /// The oracle could not serve the request at all
    #[error("directions oracle unavailable: {0}")]
    Unavailable(String),
}
