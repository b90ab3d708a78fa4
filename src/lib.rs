// ipintel: rate-limited client for the getipintel.net proxy detection API
//
// This is the library root. `ipintel` holds the query pipeline (shared rate
// limiter, HTTP client, errors); `config` loads settings from the
// environment; `output` renders results for the CLI.

pub mod config;
pub mod ipintel;
pub mod output;

pub use config::Config;
pub use ipintel::{
    CheckType, ClientConfig, IpIntelClient, IpIntelError, ProxyScorer, ProxyVerdict, RateLimiter,
};
