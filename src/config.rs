//! Run configuration.
//!
//! Built once in `main` from command line arguments (with environment
//! fallbacks handled by clap) and passed by value from there on. Nothing in
//! the validation core looks at the environment.

use crate::error::ConfigError;
use crate::proxy::CheckerConfig;
use reqwest::Url;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_TIMEOUT_SECS: f64 = 8.0;
pub const DEFAULT_CONCURRENCY: usize = 200;
pub const DEFAULT_MAX_PER_TYPE: usize = 2000;
pub const DEFAULT_TEST_URL_HTTP: &str = "http://api.ipify.org?format=json";
pub const DEFAULT_TEST_URL_HTTPS: &str = "https://api.ipify.org?format=json";
pub const DEFAULT_SOURCES_FILE: &str = "scripts/sources.txt";
pub const DEFAULT_OUT_DIR: &str = "proxies";
pub const DEFAULT_README: &str = "README.md";

/// Validated, immutable configuration of one run
#[derive(Debug, Clone)]
pub struct Config {
    timeout_secs: f64,
    timeout: Duration,
    concurrency: usize,
    max_per_type: usize,
    test_url_http: Url,
    test_url_https: Url,
    /// Test URLs as configured, echoed in the run summary
    raw_test_url_http: String,
    raw_test_url_https: String,
    /// File listing `URL [type]` source entries
    pub sources_file: PathBuf,
    /// Directory receiving the list files and `summary.json`
    pub out_dir: PathBuf,
    /// README whose stats block gets refreshed, if present
    pub readme: PathBuf,
}

impl Config {
    /// Validate raw settings into a configuration
    pub fn new(
        timeout_secs: f64,
        concurrency: usize,
        max_per_type: usize,
        test_url_http: &str,
        test_url_https: &str,
    ) -> Result<Self, ConfigError> {
        if !timeout_secs.is_finite() || timeout_secs <= 0.0 {
            return Err(ConfigError::InvalidTimeout(timeout_secs));
        }
        let timeout = Duration::try_from_secs_f64(timeout_secs)
            .map_err(|_| ConfigError::InvalidTimeout(timeout_secs))?;

        if concurrency == 0 {
            return Err(ConfigError::InvalidConcurrency);
        }
        if max_per_type == 0 {
            return Err(ConfigError::InvalidMaxPerType);
        }

        Ok(Self {
            timeout_secs,
            timeout,
            concurrency,
            max_per_type,
            test_url_http: parse_test_url("http", test_url_http)?,
            test_url_https: parse_test_url("https", test_url_https)?,
            raw_test_url_http: test_url_http.to_string(),
            raw_test_url_https: test_url_https.to_string(),
            sources_file: PathBuf::from(DEFAULT_SOURCES_FILE),
            out_dir: PathBuf::from(DEFAULT_OUT_DIR),
            readme: PathBuf::from(DEFAULT_README),
        })
    }

    pub fn with_sources_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.sources_file = path.into();
        self
    }

    pub fn with_out_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.out_dir = path.into();
        self
    }

    pub fn with_readme(mut self, path: impl Into<PathBuf>) -> Self {
        self.readme = path.into();
        self
    }

    pub fn timeout_secs(&self) -> f64 {
        self.timeout_secs
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub fn max_per_type(&self) -> usize {
        self.max_per_type
    }

    pub fn test_url_http(&self) -> &Url {
        &self.test_url_http
    }

    pub fn test_url_https(&self) -> &Url {
        &self.test_url_https
    }

    /// HTTP test URL exactly as given, before `Url` normalization
    pub fn raw_test_url_http(&self) -> &str {
        &self.raw_test_url_http
    }

    pub fn raw_test_url_https(&self) -> &str {
        &self.raw_test_url_https
    }

    /// Settings the validator needs, handed over by value
    pub fn checker(&self) -> CheckerConfig {
        CheckerConfig::new()
            .with_timeout(self.timeout)
            .with_concurrency(self.concurrency)
            .with_test_url_http(self.test_url_http.clone())
            .with_test_url_https(self.test_url_https.clone())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            timeout: Duration::from_secs_f64(DEFAULT_TIMEOUT_SECS),
            concurrency: DEFAULT_CONCURRENCY,
            max_per_type: DEFAULT_MAX_PER_TYPE,
            test_url_http: default_url(DEFAULT_TEST_URL_HTTP),
            test_url_https: default_url(DEFAULT_TEST_URL_HTTPS),
            raw_test_url_http: DEFAULT_TEST_URL_HTTP.to_string(),
            raw_test_url_https: DEFAULT_TEST_URL_HTTPS.to_string(),
            sources_file: PathBuf::from(DEFAULT_SOURCES_FILE),
            out_dir: PathBuf::from(DEFAULT_OUT_DIR),
            readme: PathBuf::from(DEFAULT_README),
        }
    }
}

fn parse_test_url(scheme: &'static str, raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw).map_err(|e| ConfigError::InvalidTestUrl {
        name: scheme,
        url: raw.to_string(),
        reason: e.to_string(),
    })?;

    if url.scheme() != scheme {
        return Err(ConfigError::InvalidTestUrl {
            name: scheme,
            url: raw.to_string(),
            reason: format!("expected {} scheme, got {}", scheme, url.scheme()),
        });
    }

    Ok(url)
}

/// Parse one of the built-in test URLs.
pub(crate) fn default_url(raw: &'static str) -> Url {
    // Literal constants above, always valid.
    Url::parse(raw).expect("built-in test url is valid")
}
