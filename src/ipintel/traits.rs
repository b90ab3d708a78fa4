// Proxy scorer trait and verdict tiers.
//
// IpIntelClient is the real implementation. Code that only needs "a score
// for this IP" can take a &dyn ProxyScorer and be handed a stub in tests.

use async_trait::async_trait;

use super::error::IpIntelError;

/// How to read a proxy score.
///
/// The service recommends treating anything at or above 0.99 as a proxy,
/// and 0.95 as a reasonable cutoff where false positives are acceptable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyVerdict {
    Clean,
    Suspicious,
    Proxy,
}

impl ProxyVerdict {
    /// Determine the verdict from a score (0.0-1.0). Negative scores are
    /// service error codes and read as clean.
    pub fn from_score(score: f64) -> Self {
        match score {
            s if s >= 0.99 => ProxyVerdict::Proxy,
            s if s >= 0.90 => ProxyVerdict::Suspicious,
            _ => ProxyVerdict::Clean,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProxyVerdict::Clean => "Clean",
            ProxyVerdict::Suspicious => "Suspicious",
            ProxyVerdict::Proxy => "Proxy",
        }
    }
}

impl std::fmt::Display for ProxyVerdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Anything that can produce a proxy score for an IP address.
#[async_trait]
pub trait ProxyScorer: Send + Sync {
    /// Score a single IP.
    async fn score_ip(&self, ip: &str) -> Result<f64, IpIntelError>;

    /// Score several IPs one after another, keeping each outcome.
    /// A failure for one IP does not stop the rest.
    async fn score_many(&self, ips: &[String]) -> Vec<(String, Result<f64, IpIntelError>)> {
        let mut results = Vec::with_capacity(ips.len());
        for ip in ips {
            results.push((ip.clone(), self.score_ip(ip).await));
        }
        results
    }
}
