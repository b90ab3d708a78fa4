// HTTP client for the getipintel.net check endpoint.
//
// One query = one token from the shared rate limiter + one GET. The token is
// spent as soon as it is granted; a failed request does not give it back.
// There is no retry: every error goes straight to the caller.
//
// API docs: https://getipintel.net/free-proxy-vpn-tor-detection-api/

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::{self, Deserializer};
use serde::Deserialize;
use tracing::{debug, warn};

use super::error::IpIntelError;
use super::rate_limiter::RateLimiter;
use super::traits::ProxyScorer;

/// Host serving the check endpoint.
pub const SERVICE_HOST: &str = "check.getipintel.net";

/// Overall timeout for a single query, connect through body.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Identifies this library to the service.
pub const USER_AGENT: &str = concat!(
    "ipintel/",
    env!("CARGO_PKG_VERSION"),
    " (getipintel.net proxy check client)"
);

/// Detection mode, sent as the `flags` query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CheckType {
    /// Static lists only. The score is either 0 or 1.
    #[default]
    Static,
    /// Static lists plus machine learning. The score is anywhere in [0, 1].
    Dynamic,
}

impl CheckType {
    pub fn flag(&self) -> &'static str {
        match self {
            CheckType::Static => "m",
            CheckType::Dynamic => "b",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CheckType::Static => "static",
            CheckType::Dynamic => "dynamic",
        }
    }
}

impl fmt::Display for CheckType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CheckType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "static" | "m" => Ok(CheckType::Static),
            "dynamic" | "b" => Ok(CheckType::Dynamic),
            other => anyhow::bail!("unknown check type '{other}' (expected static or dynamic)"),
        }
    }
}

/// Per-client settings. Fixed once the client is built.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    email: String,
    use_tls: bool,
    check: CheckType,
    max_wait: Duration,
}

impl ClientConfig {
    /// `max_wait` bounds how long a query may wait for the rate limiter.
    /// Zero means wait as long as it takes.
    pub fn new(email: impl Into<String>, use_tls: bool, check: CheckType, max_wait: Duration) -> Self {
        Self {
            email: email.into(),
            use_tls,
            check,
            max_wait,
        }
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn scheme(&self) -> &'static str {
        if self.use_tls {
            "https"
        } else {
            "http"
        }
    }

    pub fn check(&self) -> CheckType {
        self.check
    }

    pub fn max_wait(&self) -> Duration {
        self.max_wait
    }

    /// `{scheme}://check.getipintel.net`
    pub fn base_url(&self) -> String {
        format!("{}://{}", self.scheme(), SERVICE_HOST)
    }
}

/// Body returned by `check.php?format=json`.
#[derive(Debug, Deserialize)]
struct CheckResponse {
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default, deserialize_with = "string_float")]
    result: Option<f64>,
}

/// The score arrives as a string-encoded float ("0.5"). Anything else in
/// that field, including a bare number, fails decoding.
fn string_float<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    raw.trim()
        .parse::<f64>()
        .map(Some)
        .map_err(|e| <D::Error as de::Error>::custom(format!("invalid result '{raw}': {e}")))
}

/// Turn an HTTP status and body into a score.
///
/// A 429 wins over whatever the body says. Any other status is decoded,
/// since the service reports errors such as bad IPs in the JSON body. The
/// whole body must decode before the status field is looked at.
pub fn interpret_response(status: StatusCode, body: &[u8]) -> Result<f64, IpIntelError> {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(IpIntelError::ServiceRateLimited);
    }

    let decoded: CheckResponse =
        serde_json::from_slice(body).map_err(|e| IpIntelError::Parse(e.to_string()))?;

    if decoded.status != "success" {
        let message = decoded
            .message
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| format!("status '{}'", decoded.status));
        return Err(IpIntelError::Service(message));
    }

    decoded
        .result
        .ok_or_else(|| IpIntelError::Parse("missing result field".to_string()))
}

/// Client for the getipintel.net proxy detection API.
#[derive(Clone)]
pub struct IpIntelClient {
    http: reqwest::Client,
    config: ClientConfig,
    limiter: RateLimiter,
    base_url: String,
}

impl IpIntelClient {
    /// Build a client that draws query slots from `limiter`.
    ///
    /// Pass clones of the same limiter to every client in the process; the
    /// service counts queries per contact address, not per client.
    pub fn new(config: ClientConfig, limiter: RateLimiter) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url: config.base_url(),
            config,
            limiter,
        })
    }

    /// Send queries somewhere other than check.getipintel.net.
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// The exact URL a query for `ip` would request. Values are inserted
    /// as given, without percent-encoding.
    pub fn check_url(&self, ip: &str) -> String {
        format!(
            "{}/check.php?ip={}&contact={}&flags={}&format=json",
            self.base_url,
            ip,
            self.config.email,
            self.config.check.flag()
        )
    }

    /// Query the proxy score for `ip`.
    pub async fn score(&self, ip: &str) -> Result<f64, IpIntelError> {
        let max_wait = self.config.max_wait;
        if !self.limiter.acquire(1, max_wait).await {
            debug!(ip = ip, max_wait_ms = max_wait.as_millis() as u64, "Query throttled locally");
            return Err(IpIntelError::Throttled { max_wait });
        }

        debug!(ip = ip, check = %self.config.check, "Querying getipintel");

        let response = self.http.get(self.check_url(ip)).send().await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            warn!(ip = ip, "getipintel rate limit exceeded");
            return Err(IpIntelError::ServiceRateLimited);
        }

        let body = response.bytes().await?;
        let score = interpret_response(status, &body)?;

        debug!(ip = ip, score = score, "getipintel lookup complete");
        Ok(score)
    }
}

#[async_trait]
impl ProxyScorer for IpIntelClient {
    async fn score_ip(&self, ip: &str) -> Result<f64, IpIntelError> {
        self.score(ip).await
    }
}
