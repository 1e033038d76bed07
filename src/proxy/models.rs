//! Proxy data models

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Protocol class a candidate was harvested for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ProtocolClass {
    /// HTTP forward proxy, tested for both plain HTTP and CONNECT tunnelling
    #[default]
    Forward,
    Socks4,
    Socks5,
}

impl ProtocolClass {
    pub const ALL: [ProtocolClass; 3] = [
        ProtocolClass::Forward,
        ProtocolClass::Socks4,
        ProtocolClass::Socks5,
    ];

    /// URL scheme used to reach a proxy of this class.
    ///
    /// SOCKS schemes are the remote-DNS variants so that test hostnames are
    /// resolved by the proxy, not locally.
    pub fn proxy_scheme(&self) -> &'static str {
        match self {
            ProtocolClass::Forward => "http",
            ProtocolClass::Socks4 => "socks4a",
            ProtocolClass::Socks5 => "socks5h",
        }
    }
}

impl fmt::Display for ProtocolClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolClass::Forward => write!(f, "forward"),
            ProtocolClass::Socks4 => write!(f, "socks4"),
            ProtocolClass::Socks5 => write!(f, "socks5"),
        }
    }
}

/// Capability a forward proxy was verified for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Capability {
    Http,
    Https,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::Http => write!(f, "http"),
            Capability::Https => write!(f, "https"),
        }
    }
}

/// Published list a working proxy ends up in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ListKind {
    Http,
    Https,
    Socks4,
    Socks5,
    All,
}

impl ListKind {
    pub const ALL: [ListKind; 5] = [
        ListKind::Http,
        ListKind::Https,
        ListKind::Socks4,
        ListKind::Socks5,
        ListKind::All,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ListKind::Http => "http",
            ListKind::Https => "https",
            ListKind::Socks4 => "socks4",
            ListKind::Socks5 => "socks5",
            ListKind::All => "all",
        }
    }

    pub fn file_name(&self) -> String {
        format!("{}.txt", self.label())
    }
}

impl fmt::Display for ListKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl std::str::FromStr for ListKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "http" => Ok(ListKind::Http),
            "https" => Ok(ListKind::Https),
            "socks4" => Ok(ListKind::Socks4),
            "socks5" => Ok(ListKind::Socks5),
            "all" => Ok(ListKind::All),
            _ => Err(format!(
                "Invalid list type: {}. Use: http, https, socks4, socks5, all",
                s
            )),
        }
    }
}

/// A harvested, not yet validated proxy endpoint
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Candidate {
    pub class: ProtocolClass,
    pub host: String,
    pub port: u16,
}

impl Candidate {
    pub fn new(class: ProtocolClass, host: impl Into<String>, port: u16) -> Self {
        Self {
            class,
            host: host.into(),
            port,
        }
    }

    /// Build a candidate from an already validated `host:port` entry
    pub fn from_hostport(class: ProtocolClass, hostport: &str) -> Option<Self> {
        let (host, port) = hostport.rsplit_once(':')?;
        let port: u16 = port.parse().ok()?;
        if host.is_empty() || port == 0 {
            return None;
        }
        Some(Self::new(class, host, port))
    }

    /// Get the candidate in `host:port` format
    pub fn hostport(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the URL a client uses to route through this candidate
    pub fn proxy_url(&self) -> String {
        format!("{}://{}:{}", self.class.proxy_scheme(), self.host, self.port)
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.proxy_url())
    }
}

/// Deduplicated candidates of a single protocol class, ordered lexically by
/// their `host:port` string
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CandidateSet {
    class: ProtocolClass,
    items: Vec<Candidate>,
}

impl CandidateSet {
    pub fn new(class: ProtocolClass) -> Self {
        Self {
            class,
            items: Vec::new(),
        }
    }

    /// Build a set from `host:port` entries, dropping malformed and duplicate ones
    pub fn from_hostports<I, S>(class: ProtocolClass, entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let unique: BTreeMap<String, Candidate> = entries
            .into_iter()
            .filter_map(|entry| Candidate::from_hostport(class, entry.as_ref().trim()))
            .map(|candidate| (candidate.hostport(), candidate))
            .collect();

        Self {
            class,
            items: unique.into_values().collect(),
        }
    }

    pub fn class(&self) -> ProtocolClass {
        self.class
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Candidate> {
        self.items.iter()
    }

    /// Keep at most `max` candidates, the lexically smallest first
    pub fn capped(mut self, max: usize) -> Self {
        self.items.truncate(max);
        self
    }
}

impl<'a> IntoIterator for &'a CandidateSet {
    type Item = &'a Candidate;
    type IntoIter = std::slice::Iter<'a, Candidate>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// Candidate sets for every protocol class of one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidatePool {
    pub forward: CandidateSet,
    pub socks4: CandidateSet,
    pub socks5: CandidateSet,
}

impl Default for CandidatePool {
    fn default() -> Self {
        Self {
            forward: CandidateSet::new(ProtocolClass::Forward),
            socks4: CandidateSet::new(ProtocolClass::Socks4),
            socks5: CandidateSet::new(ProtocolClass::Socks5),
        }
    }
}

impl CandidatePool {
    pub fn get(&self, class: ProtocolClass) -> &CandidateSet {
        match class {
            ProtocolClass::Forward => &self.forward,
            ProtocolClass::Socks4 => &self.socks4,
            ProtocolClass::Socks5 => &self.socks5,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.forward.is_empty() && self.socks4.is_empty() && self.socks5.is_empty()
    }

    pub fn total(&self) -> usize {
        self.forward.len() + self.socks4.len() + self.socks5.len()
    }

    /// Cap every class to `max` candidates
    pub fn capped(self, max: usize) -> Self {
        Self {
            forward: self.forward.capped(max),
            socks4: self.socks4.capped(max),
            socks5: self.socks5.capped(max),
        }
    }
}

/// Successful result of a single probe attempt
///
/// Failed attempts produce no outcome at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeOutcome {
    pub candidate: Candidate,
    /// Set for forward proxies only
    pub capability: Option<Capability>,
    pub elapsed_ms: f64,
}

impl ProbeOutcome {
    pub fn forward(candidate: Candidate, capability: Capability, elapsed_ms: f64) -> Self {
        Self {
            candidate,
            capability: Some(capability),
            elapsed_ms,
        }
    }

    pub fn socks(candidate: Candidate, elapsed_ms: f64) -> Self {
        Self {
            candidate,
            capability: None,
            elapsed_ms,
        }
    }
}
