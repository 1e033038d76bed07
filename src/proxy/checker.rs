//! Proxy checker module running probes over a candidate set under a
//! concurrency ceiling

use crate::config::{
    default_url, DEFAULT_CONCURRENCY, DEFAULT_TEST_URL_HTTP, DEFAULT_TEST_URL_HTTPS,
    DEFAULT_TIMEOUT_SECS,
};
use crate::proxy::models::{Candidate, CandidateSet, ProbeOutcome};
use crate::proxy::probe;
use crate::proxy::transport::{ReqwestTransport, Transport};
use futures::stream::{self, StreamExt};
use reqwest::Url;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tracing::{info, warn};

/// Configuration for proxy checker
#[derive(Debug, Clone)]
pub struct CheckerConfig {
    /// Deadline of each probe, counted from its launch
    pub timeout: Duration,
    /// Maximum number of probes in flight
    pub concurrency: usize,
    /// Plain HTTP test target
    pub test_url_http: Url,
    /// HTTPS test target
    pub test_url_https: Url,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs_f64(DEFAULT_TIMEOUT_SECS),
            concurrency: DEFAULT_CONCURRENCY,
            test_url_http: default_url(DEFAULT_TEST_URL_HTTP),
            test_url_https: default_url(DEFAULT_TEST_URL_HTTPS),
        }
    }
}

impl CheckerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the ceiling; zero is bumped to one so a run always makes progress
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_test_url_http(mut self, url: Url) -> Self {
        self.test_url_http = url;
        self
    }

    pub fn with_test_url_https(mut self, url: Url) -> Self {
        self.test_url_https = url;
        self
    }
}

/// Bounded validator for candidate sets
#[derive(Debug, Clone)]
pub struct ProxyChecker<T = ReqwestTransport> {
    config: CheckerConfig,
    transport: T,
}

impl ProxyChecker<ReqwestTransport> {
    /// Create a new proxy checker with default configuration
    pub fn new() -> Self {
        Self::with_config(CheckerConfig::default())
    }

    /// Create a new proxy checker with custom configuration
    pub fn with_config(config: CheckerConfig) -> Self {
        Self::with_transport(config, ReqwestTransport::new())
    }
}

impl Default for ProxyChecker<ReqwestTransport> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Transport> ProxyChecker<T> {
    /// Create a checker sending its probes through a custom transport
    pub fn with_transport(config: CheckerConfig, transport: T) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &CheckerConfig {
        &self.config
    }

    /// Check a single candidate
    pub async fn check_proxy(&self, candidate: &Candidate) -> Vec<ProbeOutcome> {
        probe::probe(&self.transport, candidate, &self.config).await
    }

    /// Check every candidate of a set, at most `concurrency` at a time
    ///
    /// Only successful outcomes are returned, in completion order.
    pub async fn check_proxies(&self, candidates: &CandidateSet) -> Vec<ProbeOutcome> {
        let started = Instant::now();
        info!(
            class = %candidates.class(),
            candidates = candidates.len(),
            concurrency = self.config.concurrency,
            timeout_ms = self.config.timeout.as_millis() as u64,
            "validating candidates"
        );

        // Fresh gate per run so classes never share a ceiling
        let semaphore = Arc::new(Semaphore::new(self.config.concurrency));

        let results = stream::iter(candidates.iter())
            .map(|candidate| {
                let sem = Arc::clone(&semaphore);
                async move {
                    let Ok(_permit) = sem.acquire().await else {
                        warn!(proxy = %candidate.hostport(), "concurrency gate closed, skipping");
                        return Vec::new();
                    };
                    self.check_proxy(candidate).await
                }
            })
            .buffer_unordered(self.config.concurrency)
            .collect::<Vec<_>>()
            .await;

        let outcomes: Vec<ProbeOutcome> = results.into_iter().flatten().collect();

        info!(
            class = %candidates.class(),
            outcomes = outcomes.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "validation finished"
        );

        outcomes
    }
}
