// Unit tests for verdict tiers and the ProxyScorer trait.
//
// Tests ProxyVerdict::from_score boundary conditions and the sequential
// score_many default, using a stub scorer with no network access.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use ipintel::{IpIntelError, ProxyScorer, ProxyVerdict};

// ============================================================
// ProxyVerdict::from_score: boundary conditions
// ============================================================

#[test]
fn verdict_exact_boundary_proxy() {
    assert_eq!(ProxyVerdict::from_score(0.99), ProxyVerdict::Proxy);
}

#[test]
fn verdict_static_positive_is_proxy() {
    assert_eq!(ProxyVerdict::from_score(1.0), ProxyVerdict::Proxy);
}

#[test]
fn verdict_just_below_proxy() {
    assert_eq!(ProxyVerdict::from_score(0.989), ProxyVerdict::Suspicious);
}

#[test]
fn verdict_exact_boundary_suspicious() {
    assert_eq!(ProxyVerdict::from_score(0.90), ProxyVerdict::Suspicious);
}

#[test]
fn verdict_just_below_suspicious() {
    assert_eq!(ProxyVerdict::from_score(0.899), ProxyVerdict::Clean);
}

#[test]
fn verdict_zero_and_negative_are_clean() {
    assert_eq!(ProxyVerdict::from_score(0.0), ProxyVerdict::Clean);
    assert_eq!(ProxyVerdict::from_score(-1.0), ProxyVerdict::Clean);
}

#[test]
fn verdict_display() {
    assert_eq!(ProxyVerdict::Proxy.to_string(), "Proxy");
    assert_eq!(ProxyVerdict::Suspicious.to_string(), "Suspicious");
    assert_eq!(ProxyVerdict::Clean.to_string(), "Clean");
}

// ============================================================
// ProxyScorer::score_many: default sequential implementation
// ============================================================

/// Scores "10.x" addresses as proxies and rejects anything starting with "bad".
struct StubScorer {
    calls: AtomicUsize,
}

#[async_trait]
impl ProxyScorer for StubScorer {
    async fn score_ip(&self, ip: &str) -> Result<f64, IpIntelError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if ip.starts_with("bad") {
            return Err(IpIntelError::Service("Invalid IP address".to_string()));
        }
        Ok(if ip.starts_with("10.") { 1.0 } else { 0.0 })
    }
}

#[tokio::test]
async fn score_many_keeps_order_and_continues_after_errors() {
    let scorer = StubScorer {
        calls: AtomicUsize::new(0),
    };
    let ips = vec![
        "10.0.0.1".to_string(),
        "bad-input".to_string(),
        "8.8.8.8".to_string(),
    ];

    let results = scorer.score_many(&ips).await;

    assert_eq!(scorer.calls.load(Ordering::SeqCst), 3);
    assert_eq!(results.len(), 3);
    assert_eq!(results[0].0, "10.0.0.1");
    assert_eq!(*results[0].1.as_ref().unwrap(), 1.0);
    assert!(matches!(results[1].1, Err(IpIntelError::Service(_))));
    assert_eq!(results[2].0, "8.8.8.8");
    assert_eq!(*results[2].1.as_ref().unwrap(), 0.0);
}

#[tokio::test]
async fn score_many_empty_input() {
    let scorer = StubScorer {
        calls: AtomicUsize::new(0),
    };
    let results = scorer.score_many(&[]).await;
    assert!(results.is_empty());
    assert_eq!(scorer.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn scorer_usable_as_trait_object() {
    let scorer: Box<dyn ProxyScorer> = Box::new(StubScorer {
        calls: AtomicUsize::new(0),
    });
    assert_eq!(scorer.score_ip("10.1.2.3").await.unwrap(), 1.0);
}
