use std::env;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::ipintel::{CheckType, ClientConfig};

/// Central configuration loaded from environment variables.
///
/// The .env file is loaded automatically at startup via dotenvy. CLI flags
/// override individual values after loading.
#[derive(Debug, Clone)]
pub struct Config {
    /// Contact email sent with every query (IPINTEL_CONTACT). The service
    /// requires a working address and bans queries without one.
    pub contact_email: String,
    /// Use https instead of http (IPINTEL_USE_TLS)
    pub use_tls: bool,
    /// Detection mode (IPINTEL_CHECK: static or dynamic)
    pub check: CheckType,
    /// How long a query may wait for the rate limiter (IPINTEL_MAX_WAIT_SECS).
    /// Zero waits indefinitely.
    pub max_wait: Duration,
    /// Endpoint override (IPINTEL_BASE_URL), e.g. for a local proxy
    pub base_url: Option<String>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Missing variables fall back to defaults; malformed ones are errors.
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let use_tls = match lookup("IPINTEL_USE_TLS") {
            Some(raw) => parse_bool(&raw)
                .with_context(|| format!("Invalid IPINTEL_USE_TLS value '{raw}'"))?,
            None => false,
        };

        let check = match lookup("IPINTEL_CHECK") {
            Some(raw) => raw.parse::<CheckType>().context("Invalid IPINTEL_CHECK value")?,
            None => CheckType::default(),
        };

        let max_wait = match lookup("IPINTEL_MAX_WAIT_SECS") {
            Some(raw) => {
                let secs: f64 = raw
                    .trim()
                    .parse()
                    .with_context(|| format!("Invalid IPINTEL_MAX_WAIT_SECS value '{raw}'"))?;
                Duration::try_from_secs_f64(secs)
                    .with_context(|| format!("Invalid IPINTEL_MAX_WAIT_SECS value '{raw}'"))?
            }
            None => Duration::ZERO,
        };

        Ok(Self {
            contact_email: lookup("IPINTEL_CONTACT").unwrap_or_default(),
            use_tls,
            check,
            max_wait,
            base_url: lookup("IPINTEL_BASE_URL").filter(|url| !url.is_empty()),
        })
    }

    /// Check that a contact email is configured.
    /// Call this before any operation that queries the service.
    pub fn require_contact(&self) -> Result<()> {
        if self.contact_email.trim().is_empty() {
            anyhow::bail!(
                "IPINTEL_CONTACT not set. Add your email address to your .env file.\n\
                 getipintel.net uses it to reach you about abuse or outages."
            );
        }
        if !self.contact_email.contains('@') {
            anyhow::bail!(
                "IPINTEL_CONTACT '{}' does not look like an email address",
                self.contact_email
            );
        }
        Ok(())
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::new(
            self.contact_email.clone(),
            self.use_tls,
            self.check,
            self.max_wait,
        )
    }
}

fn parse_bool(raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => anyhow::bail!("expected true or false"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = load(&[]).unwrap();
        assert!(config.contact_email.is_empty());
        assert!(!config.use_tls);
        assert_eq!(config.check, CheckType::Static);
        assert_eq!(config.max_wait, Duration::ZERO);
        assert!(config.base_url.is_none());
    }

    #[test]
    fn test_all_values_parsed() {
        let config = load(&[
            ("IPINTEL_CONTACT", "ops@example.com"),
            ("IPINTEL_USE_TLS", "yes"),
            ("IPINTEL_CHECK", "dynamic"),
            ("IPINTEL_MAX_WAIT_SECS", "2.5"),
            ("IPINTEL_BASE_URL", "http://localhost:9000"),
        ])
        .unwrap();
        assert_eq!(config.contact_email, "ops@example.com");
        assert!(config.use_tls);
        assert_eq!(config.check, CheckType::Dynamic);
        assert_eq!(config.max_wait, Duration::from_millis(2500));
        assert_eq!(config.base_url.as_deref(), Some("http://localhost:9000"));
    }

    #[test]
    fn test_invalid_values_are_errors() {
        assert!(load(&[("IPINTEL_USE_TLS", "maybe")]).is_err());
        assert!(load(&[("IPINTEL_CHECK", "full")]).is_err());
        assert!(load(&[("IPINTEL_MAX_WAIT_SECS", "soon")]).is_err());
        assert!(load(&[("IPINTEL_MAX_WAIT_SECS", "-1")]).is_err());
    }

    #[test]
    fn test_require_contact() {
        assert!(load(&[]).unwrap().require_contact().is_err());
        assert!(load(&[("IPINTEL_CONTACT", "nobody")])
            .unwrap()
            .require_contact()
            .is_err());
        assert!(load(&[("IPINTEL_CONTACT", "a@b.com")])
            .unwrap()
            .require_contact()
            .is_ok());
    }

    #[test]
    fn test_client_config_carries_values() {
        let config = load(&[
            ("IPINTEL_CONTACT", "a@b.com"),
            ("IPINTEL_USE_TLS", "true"),
            ("IPINTEL_CHECK", "b"),
            ("IPINTEL_MAX_WAIT_SECS", "5"),
        ])
        .unwrap();
        let client_config = config.client_config();
        assert_eq!(client_config.email(), "a@b.com");
        assert_eq!(client_config.scheme(), "https");
        assert_eq!(client_config.check(), CheckType::Dynamic);
        assert_eq!(client_config.max_wait(), Duration::from_secs(5));
    }
}
