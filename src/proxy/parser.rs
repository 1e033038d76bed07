//! Proxy parser module for extracting candidates from source text and
//! reading/writing published list files

use crate::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::path::Path;

/// A whole line holding exactly one `IPv4:PORT` pair, whitespace tolerated
/// around the separator
static CANDIDATE_LINE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?P<host>\d{1,3}(?:\.\d{1,3}){3})\s*:\s*(?P<port>\d{2,5})\s*$")
        .expect("Invalid candidate line regex")
});

/// Proxy parser for candidate lines and list files
pub struct ProxyParser;

impl ProxyParser {
    /// Parse a single candidate line into its normalized `host:port` form
    ///
    /// Blank lines, comments, anything that is not a bare IPv4:PORT pair,
    /// octets above 255 and ports outside 1..=65535 are rejected.
    pub fn parse_line(line: &str) -> Option<String> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return None;
        }

        let caps = CANDIDATE_LINE_REGEX.captures(line)?;
        let host = &caps["host"];
        let port: u32 = caps["port"].parse().ok()?;

        for octet in host.split('.') {
            let num: u32 = octet.parse().ok()?;
            if num > 255 {
                return None;
            }
        }

        if !(1..=65535).contains(&port) {
            return None;
        }

        Some(format!("{}:{}", host, port))
    }

    /// Parse candidates from a string (multiple lines), keeping source order
    pub fn parse_string(content: &str) -> Vec<String> {
        content.lines().filter_map(Self::parse_line).collect()
    }

    /// Save a list of `host:port` entries, one per line
    pub fn save_list<P: AsRef<Path>, S: AsRef<str>>(path: P, entries: &[S]) -> Result<()> {
        let mut content = entries
            .iter()
            .map(AsRef::as_ref)
            .collect::<Vec<_>>()
            .join("\n");
        if !entries.is_empty() {
            content.push('\n');
        }

        fs::write(path, content)?;
        Ok(())
    }

    /// Load the non-blank lines of a published list
    pub fn load_list<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
        let content = fs::read_to_string(path)?;
        Ok(content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect())
    }
}
