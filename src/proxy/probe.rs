//! Single-candidate probes.
//!
//! A forward proxy is probed twice, once per capability, with both attempts
//! running side by side and timed on their own. A SOCKS proxy is probed
//! against an ordered list of targets under one shared clock, and the first
//! target that answers decides its latency.
//!
//! All attempts share the probe's deadline, which starts when the probe is
//! launched. Failures of any kind produce no outcome.

use crate::proxy::checker::CheckerConfig;
use crate::proxy::models::{Candidate, Capability, ProbeOutcome, ProtocolClass};
use crate::proxy::transport::Transport;
use reqwest::Url;
use tokio::time::{timeout_at, Instant};
use tracing::debug;

/// Probe a candidate according to its protocol class
pub async fn probe<T: Transport>(
    transport: &T,
    candidate: &Candidate,
    config: &CheckerConfig,
) -> Vec<ProbeOutcome> {
    match candidate.class {
        ProtocolClass::Forward => probe_forward(transport, candidate, config).await,
        ProtocolClass::Socks4 | ProtocolClass::Socks5 => {
            probe_socks(transport, candidate, config).await.into_iter().collect()
        }
    }
}

/// Check plain HTTP and CONNECT-tunnelled HTTPS through a forward proxy
///
/// Returns zero, one or two outcomes.
pub async fn probe_forward<T: Transport>(
    transport: &T,
    candidate: &Candidate,
    config: &CheckerConfig,
) -> Vec<ProbeOutcome> {
    let deadline = Instant::now() + config.timeout;

    let (http_ms, https_ms) = tokio::join!(
        timed_attempt(transport, candidate, &config.test_url_http, deadline),
        timed_attempt(transport, candidate, &config.test_url_https, deadline),
    );

    [(Capability::Http, http_ms), (Capability::Https, https_ms)]
        .into_iter()
        .filter_map(|(capability, elapsed_ms)| {
            elapsed_ms.map(|ms| ProbeOutcome::forward(candidate.clone(), capability, ms))
        })
        .collect()
}

/// Check a SOCKS proxy, HTTPS target first, then plain HTTP
pub async fn probe_socks<T: Transport>(
    transport: &T,
    candidate: &Candidate,
    config: &CheckerConfig,
) -> Option<ProbeOutcome> {
    let start = Instant::now();
    let deadline = start + config.timeout;
    let targets = [&config.test_url_https, &config.test_url_http];

    match timeout_at(deadline, first_success(transport, candidate, &targets, deadline)).await {
        Ok(Some(_)) => Some(ProbeOutcome::socks(candidate.clone(), elapsed_ms(start))),
        Ok(None) => None,
        Err(_) => {
            debug!(proxy = %candidate.hostport(), "socks probe timed out");
            None
        }
    }
}

/// Try `targets` in order and return the first one that succeeds
async fn first_success<'u, T: Transport>(
    transport: &T,
    candidate: &Candidate,
    targets: &[&'u Url],
    deadline: Instant,
) -> Option<&'u Url> {
    for url in targets {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match transport.fetch(candidate, url, remaining).await {
            Ok(()) => return Some(*url),
            Err(e) => {
                debug!(proxy = %candidate.hostport(), url = %url, error = %e, "probe attempt failed");
            }
        }
    }
    None
}

/// One independently timed attempt; `Some(elapsed_ms)` on success
async fn timed_attempt<T: Transport>(
    transport: &T,
    candidate: &Candidate,
    url: &Url,
    deadline: Instant,
) -> Option<f64> {
    let start = Instant::now();
    let remaining = deadline.saturating_duration_since(start);

    match timeout_at(deadline, transport.fetch(candidate, url, remaining)).await {
        Ok(Ok(())) => Some(elapsed_ms(start)),
        Ok(Err(e)) => {
            debug!(proxy = %candidate.hostport(), url = %url, error = %e, "probe attempt failed");
            None
        }
        Err(_) => {
            debug!(proxy = %candidate.hostport(), url = %url, "probe attempt timed out");
            None
        }
    }
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MockTransport;
    use std::time::Duration;

    fn config() -> CheckerConfig {
        CheckerConfig::new().with_timeout(Duration::from_secs(1))
    }

    fn forward(hostport: &str) -> Candidate {
        Candidate::from_hostport(ProtocolClass::Forward, hostport).unwrap()
    }

    fn socks5(hostport: &str) -> Candidate {
        Candidate::from_hostport(ProtocolClass::Socks5, hostport).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_forward_both_capabilities_timed_independently() {
        let transport = MockTransport::new()
            .succeed("1.1.1.1:80", "http", Duration::from_millis(50))
            .succeed("1.1.1.1:80", "https", Duration::from_millis(120));

        let outcomes = probe_forward(&transport, &forward("1.1.1.1:80"), &config()).await;
        assert_eq!(outcomes.len(), 2);

        let http = outcomes
            .iter()
            .find(|o| o.capability == Some(Capability::Http))
            .unwrap();
        let https = outcomes
            .iter()
            .find(|o| o.capability == Some(Capability::Https))
            .unwrap();
        assert!((http.elapsed_ms - 50.0).abs() < 5.0);
        assert!((https.elapsed_ms - 120.0).abs() < 5.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_forward_hanging_https_does_not_skew_http() {
        let transport = MockTransport::new()
            .succeed("1.1.1.1:80", "http", Duration::from_millis(40))
            .hang("1.1.1.1:80", "https");

        let outcomes = probe_forward(&transport, &forward("1.1.1.1:80"), &config()).await;
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].capability, Some(Capability::Http));
        assert!((outcomes[0].elapsed_ms - 40.0).abs() < 5.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_forward_all_failures_yield_nothing() {
        let transport = MockTransport::new()
            .fail("1.1.1.1:80", "http", Duration::from_millis(10))
            .hang("1.1.1.1:80", "https");

        let outcomes = probe_forward(&transport, &forward("1.1.1.1:80"), &config()).await;
        assert!(outcomes.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_forward_success_after_deadline_is_dropped() {
        let transport = MockTransport::new()
            .succeed("1.1.1.1:80", "http", Duration::from_millis(1500))
            .succeed("1.1.1.1:80", "https", Duration::from_millis(900));

        let outcomes = probe_forward(&transport, &forward("1.1.1.1:80"), &config()).await;
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].capability, Some(Capability::Https));
    }

    #[tokio::test(start_paused = true)]
    async fn test_socks_https_first_short_circuits() {
        let transport = MockTransport::new()
            .succeed("2.2.2.2:1080", "https", Duration::from_millis(30))
            .succeed("2.2.2.2:1080", "http", Duration::from_millis(5));

        let outcome = probe_socks(&transport, &socks5("2.2.2.2:1080"), &config())
            .await
            .unwrap();
        assert_eq!(outcome.capability, None);
        assert!((outcome.elapsed_ms - 30.0).abs() < 5.0);
        // The http target must never have been tried
        assert_eq!(transport.calls("2.2.2.2:1080", "http"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_socks_falls_back_to_http_with_cumulative_time() {
        let transport = MockTransport::new()
            .fail("2.2.2.2:1080", "https", Duration::from_millis(100))
            .succeed("2.2.2.2:1080", "http", Duration::from_millis(20));

        let outcome = probe_socks(&transport, &socks5("2.2.2.2:1080"), &config())
            .await
            .unwrap();
        assert!((outcome.elapsed_ms - 120.0).abs() < 5.0);
        assert_eq!(transport.calls("2.2.2.2:1080", "https"), 1);
        assert_eq!(transport.calls("2.2.2.2:1080", "http"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_socks_shared_deadline_covers_both_targets() {
        let transport = MockTransport::new()
            .fail("2.2.2.2:1080", "https", Duration::from_millis(800))
            .succeed("2.2.2.2:1080", "http", Duration::from_millis(400));

        let outcome = probe_socks(&transport, &socks5("2.2.2.2:1080"), &config()).await;
        assert!(outcome.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_probe_dispatches_on_class() {
        let transport = MockTransport::new()
            .succeed("3.3.3.3:1080", "https", Duration::from_millis(10))
            .succeed("3.3.3.3:8080", "http", Duration::from_millis(10))
            .succeed("3.3.3.3:8080", "https", Duration::from_millis(10));

        let socks = Candidate::from_hostport(ProtocolClass::Socks4, "3.3.3.3:1080").unwrap();
        assert_eq!(probe(&transport, &socks, &config()).await.len(), 1);
        assert_eq!(probe(&transport, &forward("3.3.3.3:8080"), &config()).await.len(), 2);
    }
}
