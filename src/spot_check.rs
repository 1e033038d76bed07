//! Manual spot checks of published lists through `curl`.
//!
//! Samples a handful of entries from one list and routes a request through
//! each of them with the system `curl`, so the result matches what a user
//! would see when trying the proxies by hand.

use crate::proxy::{ListKind, ProxyParser};
use crate::Result;
use anyhow::{anyhow, bail, Context};
use rand::seq::SliceRandom;
use std::io::ErrorKind;
use std::path::Path;
use std::process::Command;

/// Seconds handed to `curl --max-time`
pub const CURL_MAX_TIME_SECS: u64 = 10;

/// Default spot-check target for a scheme
pub fn default_target(scheme: &str) -> String {
    format!("{}://api.ipify.org?format=json", scheme)
}

/// Load a published list, failing when it is missing or empty
pub fn load_published(dir: &Path, kind: ListKind) -> Result<Vec<String>> {
    let path = dir.join(kind.file_name());
    if !path.exists() {
        bail!(
            "{} does not exist. Run open-proxy-list first.",
            path.display()
        );
    }

    let proxies = ProxyParser::load_list(&path)
        .with_context(|| format!("cannot read {}", path.display()))?;
    if proxies.is_empty() {
        bail!("No proxies found in {}.", path.display());
    }

    Ok(proxies)
}

/// Pick up to `limit` distinct entries at random
pub fn sample(proxies: &[String], limit: usize) -> Vec<String> {
    let mut rng = rand::thread_rng();
    proxies
        .choose_multiple(&mut rng, limit.min(proxies.len()))
        .cloned()
        .collect()
}

/// Proxy URL handed to `curl -x` for an entry of the given list
pub fn curl_proxy_url(kind: ListKind, hostport: &str) -> String {
    let scheme = match kind {
        ListKind::Socks4 => "socks4a",
        ListKind::Socks5 => "socks5h",
        ListKind::Http | ListKind::Https | ListKind::All => "http",
    };
    format!("{}://{}", scheme, hostport)
}

/// Arguments of the `curl` invocation for one proxy
pub fn curl_args(kind: ListKind, hostport: &str, url: &str) -> Vec<String> {
    vec![
        "-x".to_string(),
        curl_proxy_url(kind, hostport),
        url.to_string(),
        "--max-time".to_string(),
        CURL_MAX_TIME_SECS.to_string(),
        "-s".to_string(),
        "-v".to_string(),
    ]
}

/// Run `curl` through one proxy and return its exit code
///
/// A missing `curl` binary is an error; a failing request is not.
pub fn check_with_curl(kind: ListKind, hostport: &str, url: &str) -> Result<i32> {
    let status = Command::new("curl")
        .args(curl_args(kind, hostport, url))
        .status()
        .map_err(|e| match e.kind() {
            ErrorKind::NotFound => anyhow!("curl is not installed or not found in PATH."),
            _ => anyhow!("cannot run curl: {}", e),
        })?;

    // Killed by a signal: no exit code, count as failure
    Ok(status.code().unwrap_or(-1))
}

/// Format the closing summary line
pub fn summary_line(successes: usize, total: usize) -> String {
    format!(
        "Summary: {}/{} succeeded (curl exit code 0).",
        successes, total
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::fs;

    #[test]
    fn test_load_published_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_published(dir.path(), ListKind::Http).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn test_load_published_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("socks5.txt"), "\n\n").unwrap();
        let err = load_published(dir.path(), ListKind::Socks5).unwrap_err();
        assert!(err.to_string().contains("No proxies found"));
    }

    #[test]
    fn test_load_published() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("https.txt"), "1.1.1.1:80\n2.2.2.2:3128\n").unwrap();
        assert_eq!(
            load_published(dir.path(), ListKind::Https).unwrap(),
            vec!["1.1.1.1:80", "2.2.2.2:3128"]
        );
    }

    #[test]
    fn test_sample_is_bounded_and_distinct() {
        let proxies: Vec<String> = (1..=10).map(|i| format!("10.0.0.{}:80", i)).collect();

        let picked = sample(&proxies, 4);
        assert_eq!(picked.len(), 4);
        let unique: HashSet<_> = picked.iter().collect();
        assert_eq!(unique.len(), 4);
        assert!(picked.iter().all(|p| proxies.contains(p)));

        assert_eq!(sample(&proxies, 50).len(), 10);
        assert!(sample(&proxies, 0).is_empty());
    }

    #[test]
    fn test_curl_args() {
        assert_eq!(
            curl_args(ListKind::Socks5, "1.2.3.4:1080", "https://example.com"),
            vec![
                "-x",
                "socks5h://1.2.3.4:1080",
                "https://example.com",
                "--max-time",
                "10",
                "-s",
                "-v"
            ]
        );
        assert_eq!(curl_proxy_url(ListKind::Https, "1.2.3.4:80"), "http://1.2.3.4:80");
        assert_eq!(curl_proxy_url(ListKind::Socks4, "1.2.3.4:1080"), "socks4a://1.2.3.4:1080");
    }

    #[test]
    fn test_default_target_and_summary() {
        assert_eq!(default_target("https"), "https://api.ipify.org?format=json");
        assert_eq!(
            summary_line(3, 5),
            "Summary: 3/5 succeeded (curl exit code 0)."
        );
    }
}
