//! Error taxonomy for EV Tracker API calls.
//!
//! Remote failures map onto a small set of variants keyed by HTTP status;
//! local validation failures never touch the network and are kept distinct
//! so callers can tell a bad draft from a rejected request.

/// Errors returned by [`EvTrackerClient`](crate::EvTrackerClient) operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// The HTTP transport could not be constructed
    #[error("client init error: {0}")]
    Init(String),

    /// The API returned a non-success status not covered by a more
    /// specific variant (plain 4xx/5xx)
    #[error("API error (status {status}): {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Error message from the API, or the raw body when none was given
        message: String,
    },

    /// The API rejected the key (401) or the key lacks permissions (403)
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// Transport-level failure: DNS, refused connection, timeout
    #[error("connection error: {0}")]
    Connection(String),

    /// The API throttled the request (429)
    #[error("rate limit exceeded, retry after {retry_after_secs}s")]
    RateLimit {
        /// Seconds to wait, from the `Retry-After` header (60 when absent)
        retry_after_secs: u64,
    },

    /// The response body could not be decoded as the expected shape
    #[error("unexpected response payload: {0}")]
    Payload(String),

    /// A session draft failed local validation; no request was sent
    #[error("invalid session: {0}")]
    Validation(String),
}
