//! Proxy crawler module for harvesting candidates from source lists
//!
//! This module provides functionality for:
//! - Reading the `URL [type]` sources file
//! - Fetching every source concurrently
//! - Extracting candidates and merging them per protocol class

use crate::error::RunError;
use crate::proxy::models::{CandidatePool, CandidateSet, ProtocolClass};
use crate::proxy::parser::ProxyParser;
use crate::Result;
use futures::stream::{self, StreamExt};
use reqwest::Client;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

/// Default timeout for HTTP requests in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default number of sources fetched at once
const DEFAULT_FETCH_CONCURRENCY: usize = 20;

/// Default user agent for HTTP requests
const DEFAULT_USER_AGENT: &str = "free-proxy-list-bot/1.0";

/// Result of crawling a single source
#[derive(Debug, Clone)]
pub struct CrawlResult {
    /// The source that was crawled
    pub source: ProxySource,
    /// `host:port` entries extracted from the source
    pub entries: Vec<String>,
    /// Error message if crawling failed
    pub error: Option<String>,
}

impl CrawlResult {
    /// Create a successful crawl result
    pub fn success(source: ProxySource, entries: Vec<String>) -> Self {
        Self {
            source,
            entries,
            error: None,
        }
    }

    /// Create a failed crawl result
    pub fn failure(source: ProxySource, error: String) -> Self {
        Self {
            source,
            entries: Vec::new(),
            error: Some(error),
        }
    }

    /// Check if the crawl was successful
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Configuration for proxy crawler
#[derive(Debug, Clone)]
pub struct CrawlerConfig {
    /// Timeout for HTTP requests
    pub timeout: Duration,
    /// User agent for HTTP requests
    pub user_agent: String,
    /// Number of sources fetched at once
    pub concurrency: usize,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            concurrency: DEFAULT_FETCH_CONCURRENCY,
        }
    }
}

impl CrawlerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: String) -> Self {
        self.user_agent = user_agent;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }
}

/// Proxy source: a URL serving a plain text list for one protocol class
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxySource {
    /// URL to fetch candidates from
    pub url: String,
    /// Protocol class the listed candidates belong to
    pub class: ProtocolClass,
}

impl ProxySource {
    pub fn new(url: &str, class: ProtocolClass) -> Self {
        Self {
            url: url.to_string(),
            class,
        }
    }

    /// Parse one `URL [type]` line of the sources file
    ///
    /// The type defaults to `mixed`; http, https, mixed and forward all map
    /// to the forward class. Unknown types are reported as `Err` with the
    /// offending type.
    pub fn parse_line(line: &str) -> Option<std::result::Result<Self, String>> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return None;
        }

        let mut parts = line.split_whitespace();
        let url = parts.next()?;
        let kind = parts
            .next()
            .map(str::to_lowercase)
            .unwrap_or_else(|| "mixed".to_string());

        let class = match kind.as_str() {
            "http" | "https" | "mixed" | "forward" => ProtocolClass::Forward,
            "socks4" => ProtocolClass::Socks4,
            "socks5" => ProtocolClass::Socks5,
            _ => return Some(Err(kind)),
        };

        Some(Ok(Self::new(url, class)))
    }
}

/// Proxy crawler for fetching candidates from source lists
pub struct ProxyCrawler {
    config: CrawlerConfig,
    client: Client,
}

impl ProxyCrawler {
    /// Create a new proxy crawler with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(CrawlerConfig::default())
    }

    /// Create a new proxy crawler with custom configuration
    pub fn with_config(config: CrawlerConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .danger_accept_invalid_certs(true)
            .build()?;

        Ok(Self { config, client })
    }

    /// Read the sources file, skipping blank lines, comments and unknown types
    pub fn read_sources<P: AsRef<Path>>(path: P) -> std::result::Result<Vec<ProxySource>, RunError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| RunError::SourcesUnavailable {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(Self::parse_sources(&content))
    }

    /// Parse the content of a sources file
    pub fn parse_sources(content: &str) -> Vec<ProxySource> {
        content
            .lines()
            .filter_map(ProxySource::parse_line)
            .filter_map(|parsed| match parsed {
                Ok(source) => Some(source),
                Err(kind) => {
                    warn!(kind = %kind, "ignoring source with unknown proxy type");
                    None
                }
            })
            .collect()
    }

    /// Fetch a single URL and extract its candidates
    pub async fn crawl_url(&self, url: &str) -> Result<Vec<String>> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        let content = response.text().await?;
        Ok(ProxyParser::parse_string(&content))
    }

    /// Fetch every source concurrently, returning a result for each
    pub async fn crawl_sources_with_results(&self, sources: &[ProxySource]) -> Vec<CrawlResult> {
        stream::iter(sources)
            .map(|source| async move {
                match self.crawl_url(&source.url).await {
                    Ok(entries) => CrawlResult::success(source.clone(), entries),
                    Err(e) => CrawlResult::failure(source.clone(), e.to_string()),
                }
            })
            .buffer_unordered(self.config.concurrency)
            .collect()
            .await
    }

    /// Fetch every source and merge the candidates into per-class sets
    ///
    /// Failed sources are logged and skipped.
    pub async fn crawl_sources(&self, sources: &[ProxySource]) -> CandidatePool {
        let results = self.crawl_sources_with_results(sources).await;
        let pool = Self::merge_results(&results);

        info!(
            sources = sources.len(),
            forward = pool.forward.len(),
            socks4 = pool.socks4.len(),
            socks5 = pool.socks5.len(),
            "sources crawled"
        );

        pool
    }

    /// Merge crawl results into deduplicated per-class candidate sets
    pub fn merge_results(results: &[CrawlResult]) -> CandidatePool {
        let mut per_class: [BTreeSet<&str>; 3] = Default::default();

        for result in results {
            if let Some(error) = &result.error {
                warn!(source = %result.source.url, error = %error, "failed to crawl source");
                continue;
            }
            info!(source = %result.source.url, entries = result.entries.len(), "source crawled");

            let slot = match result.source.class {
                ProtocolClass::Forward => 0,
                ProtocolClass::Socks4 => 1,
                ProtocolClass::Socks5 => 2,
            };
            per_class[slot].extend(result.entries.iter().map(String::as_str));
        }

        let [forward, socks4, socks5] = per_class;
        CandidatePool {
            forward: CandidateSet::from_hostports(ProtocolClass::Forward, forward),
            socks4: CandidateSet::from_hostports(ProtocolClass::Socks4, socks4),
            socks5: CandidateSet::from_hostports(ProtocolClass::Socks5, socks5),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Plain HTTP server returning the same body for every request
    async fn spawn_list_server(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            loop {
                if let Ok((mut socket, _)) = listener.accept().await {
                    tokio::spawn(async move {
                        let mut buf = [0u8; 4096];
                        let _ = socket.read(&mut buf).await;
                        let response = format!(
                            "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_line,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                    });
                }
            }
        });

        format!("http://{}/list.txt", addr)
    }

    #[test]
    fn test_crawler_config_default() {
        let config = CrawlerConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        assert_eq!(config.user_agent, DEFAULT_USER_AGENT);
        assert_eq!(config.concurrency, DEFAULT_FETCH_CONCURRENCY);
    }

    #[test]
    fn test_crawler_config_builder() {
        let config = CrawlerConfig::new()
            .with_timeout(Duration::from_secs(60))
            .with_user_agent("Custom Agent".to_string())
            .with_concurrency(4);

        assert_eq!(config.timeout, Duration::from_secs(60));
        assert_eq!(config.user_agent, "Custom Agent");
        assert_eq!(config.concurrency, 4);
    }

    #[test]
    fn test_proxy_source_parse_line() {
        assert_eq!(
            ProxySource::parse_line("https://example.com/list.txt"),
            Some(Ok(ProxySource::new(
                "https://example.com/list.txt",
                ProtocolClass::Forward
            )))
        );
        assert_eq!(
            ProxySource::parse_line("  https://example.com/s5.txt   SOCKS5 "),
            Some(Ok(ProxySource::new(
                "https://example.com/s5.txt",
                ProtocolClass::Socks5
            )))
        );
        assert_eq!(
            ProxySource::parse_line("https://example.com/x.txt ftp"),
            Some(Err("ftp".to_string()))
        );
        assert!(ProxySource::parse_line("# comment").is_none());
        assert!(ProxySource::parse_line("   ").is_none());
    }

    #[test]
    fn test_parse_sources_skips_unknown_types() {
        let content = r#"
# Forward proxies
https://a.example/http.txt http
https://b.example/https.txt https
https://c.example/mixed.txt

https://d.example/s4.txt socks4
https://e.example/bogus.txt carrier-pigeon
"#;
        let sources = ProxyCrawler::parse_sources(content);
        assert_eq!(sources.len(), 4);
        assert_eq!(
            sources
                .iter()
                .filter(|s| s.class == ProtocolClass::Forward)
                .count(),
            3
        );
        assert_eq!(sources[3].class, ProtocolClass::Socks4);
    }

    #[test]
    fn test_read_sources_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = ProxyCrawler::read_sources(dir.path().join("sources.txt")).unwrap_err();
        assert!(matches!(err, RunError::SourcesUnavailable { .. }));
    }

    #[test]
    fn test_crawl_result_success() {
        let source = ProxySource::new("https://example.com/proxies.txt", ProtocolClass::Forward);
        let result = CrawlResult::success(
            source,
            vec!["192.168.1.1:8080".to_string(), "192.168.1.2:3128".to_string()],
        );
        assert!(result.is_success());
        assert_eq!(result.entries.len(), 2);
        assert!(result.error.is_none());
    }

    #[test]
    fn test_crawl_result_failure() {
        let source = ProxySource::new("https://example.com/proxies.txt", ProtocolClass::Socks4);
        let result = CrawlResult::failure(source, "Connection failed".to_string());
        assert!(!result.is_success());
        assert!(result.entries.is_empty());
        assert_eq!(result.error, Some("Connection failed".to_string()));
    }

    #[test]
    fn test_merge_results_dedups_per_class() {
        let results = vec![
            CrawlResult::success(
                ProxySource::new("a", ProtocolClass::Forward),
                vec!["1.1.1.1:80".into(), "2.2.2.2:80".into()],
            ),
            CrawlResult::success(
                ProxySource::new("b", ProtocolClass::Forward),
                vec!["2.2.2.2:80".into()],
            ),
            CrawlResult::success(
                ProxySource::new("c", ProtocolClass::Socks5),
                vec!["1.1.1.1:80".into()],
            ),
            CrawlResult::failure(ProxySource::new("d", ProtocolClass::Socks4), "boom".into()),
        ];

        let pool = ProxyCrawler::merge_results(&results);
        assert_eq!(pool.forward.len(), 2);
        assert_eq!(pool.socks5.len(), 1);
        assert!(pool.socks4.is_empty());
    }

    #[tokio::test]
    async fn test_crawl_sources_from_local_server() {
        let good = spawn_list_server(
            "200 OK",
            "# list\n10.0.0.1:3128\n10.0.0.2:8080\nnot a proxy\n10.0.0.1:3128\n",
        )
        .await;
        let broken = spawn_list_server("500 Internal Server Error", "10.9.9.9:80\n").await;

        let crawler = ProxyCrawler::new().unwrap();
        let sources = vec![
            ProxySource::new(&good, ProtocolClass::Forward),
            ProxySource::new(&broken, ProtocolClass::Socks5),
        ];

        let pool = crawler.crawl_sources(&sources).await;
        let forward: Vec<String> = pool.forward.iter().map(|c| c.hostport()).collect();
        assert_eq!(forward, vec!["10.0.0.1:3128", "10.0.0.2:8080"]);
        assert!(pool.socks5.is_empty());
    }
}
