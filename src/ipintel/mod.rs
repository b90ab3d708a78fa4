// getipintel.net proxy detection: rate limiter, query client, errors.
//
// The RateLimiter is the only shared state: build one per process and clone
// it into every IpIntelClient. Each client call takes a token, makes one
// request, and returns either a score or an IpIntelError.

pub mod client;
pub mod error;
pub mod rate_limiter;
pub mod traits;

pub use client::{interpret_response, CheckType, ClientConfig, IpIntelClient};
pub use error::IpIntelError;
pub use rate_limiter::RateLimiter;
pub use traits::{ProxyScorer, ProxyVerdict};
