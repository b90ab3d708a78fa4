// Error taxonomy for proxy-score queries.
//
// Each variant marks the stage where a query stopped: before the network call
// (Throttled), during it (Transport), or while interpreting the answer.

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IpIntelError {
    /// The shared rate limiter could not grant a token within the client's max wait.
    #[error("throttled: can't make query within the next {max_wait:?}")]
    Throttled { max_wait: Duration },

    /// Connection, TLS, or timeout failure before a response arrived.
    #[error("failed to query API: {0}")]
    Transport(#[from] reqwest::Error),

    /// The service itself answered HTTP 429.
    #[error("API error: rate limit exceeded")]
    ServiceRateLimited,

    /// The body was not JSON of the expected shape.
    #[error("failed to parse API response: {0}")]
    Parse(String),

    /// The body decoded but reported a non-success status.
    #[error("API error: {0}")]
    Service(String),
}

impl IpIntelError {
    /// True for both local throttling and a remote 429.
    pub fn is_rate_limit(&self) -> bool {
        matches!(
            self,
            IpIntelError::Throttled { .. } | IpIntelError::ServiceRateLimited
        )
    }
}
