//! Proxy module for harvesting, validating and ranking proxies
//!
//! This module provides functionality for:
//! - Crawling source lists and extracting `IP:PORT` candidates
//! - Probing candidates concurrently under a fixed ceiling
//! - Ranking working proxies by latency into per-protocol lists
//! - Publishing the lists, a JSON summary and a README stats block

pub mod checker;
pub mod crawler;
pub mod models;
pub mod parser;
pub mod probe;
pub mod publisher;
pub mod ranker;
pub mod stats;
pub mod transport;

pub use checker::{CheckerConfig, ProxyChecker};
pub use crawler::{CrawlResult, CrawlerConfig, ProxyCrawler, ProxySource};
pub use models::{
    Candidate, CandidatePool, CandidateSet, Capability, ListKind, ProbeOutcome, ProtocolClass,
};
pub use parser::ProxyParser;
pub use publisher::Publisher;
pub use ranker::{rank, WorkingLists};
pub use stats::{ListCounts, RunStats};
pub use transport::{ReqwestTransport, Transport};
