//! Per-run statistics, serialized as `summary.json`

use crate::config::Config;
use crate::proxy::models::{CandidatePool, ListKind};
use crate::proxy::ranker::WorkingLists;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Candidate and working counts of one list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListCounts {
    pub candidates: usize,
    pub working: usize,
}

/// Configuration echo stored alongside the counts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsConfig {
    pub concurrency: usize,
    pub max_per_type: usize,
    pub test_url_http: String,
    pub test_url_https: String,
    pub timeout_sec: f64,
}

/// Statistics of one run; field order is alphabetical so the JSON keys come
/// out sorted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunStats {
    pub config: StatsConfig,
    pub counts: BTreeMap<String, ListCounts>,
    pub updated_utc: String,
}

impl RunStats {
    pub fn new(config: &Config, candidates: &CandidatePool, lists: &WorkingLists) -> Self {
        let forward = candidates.forward.len();
        let candidate_count = |kind: ListKind| match kind {
            ListKind::Http | ListKind::Https => forward,
            ListKind::Socks4 => candidates.socks4.len(),
            ListKind::Socks5 => candidates.socks5.len(),
            ListKind::All => candidates.total(),
        };

        let counts = ListKind::ALL
            .iter()
            .map(|kind| {
                (
                    kind.label().to_string(),
                    ListCounts {
                        candidates: candidate_count(*kind),
                        working: lists.get(*kind).len(),
                    },
                )
            })
            .collect();

        Self {
            config: StatsConfig {
                concurrency: config.concurrency(),
                max_per_type: config.max_per_type(),
                test_url_http: config.raw_test_url_http().to_string(),
                test_url_https: config.raw_test_url_https().to_string(),
                timeout_sec: config.timeout_secs(),
            },
            counts,
            updated_utc: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, false),
        }
    }

    pub fn counts(&self, kind: ListKind) -> ListCounts {
        self.counts
            .get(kind.label())
            .copied()
            .unwrap_or(ListCounts {
                candidates: 0,
                working: 0,
            })
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
