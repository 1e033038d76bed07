//! Ranking of probe outcomes into the published working lists

use crate::proxy::models::{Capability, ListKind, ProbeOutcome, ProtocolClass};
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashSet};
use tracing::info;

/// Final per-protocol lists of `host:port` entries
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkingLists {
    pub http: Vec<String>,
    pub https: Vec<String>,
    pub socks4: Vec<String>,
    pub socks5: Vec<String>,
    /// Lexically sorted union of the four protocol lists
    pub all: Vec<String>,
    /// Whether `https` was copied over from `http`
    pub https_fallback: bool,
}

impl WorkingLists {
    pub fn get(&self, kind: ListKind) -> &[String] {
        match kind {
            ListKind::Http => &self.http,
            ListKind::Https => &self.https,
            ListKind::Socks4 => &self.socks4,
            ListKind::Socks5 => &self.socks5,
            ListKind::All => &self.all,
        }
    }
}

/// Turn successful outcomes into ranked working lists.
///
/// Each protocol list is ordered by ascending latency, ties broken by the
/// `host:port` string. When no forward proxy passed the HTTPS check but some
/// passed plain HTTP, the HTTP list doubles as the HTTPS list.
pub fn rank(outcomes: Vec<ProbeOutcome>) -> WorkingLists {
    let mut buckets: [Vec<ProbeOutcome>; 4] = Default::default();
    for outcome in outcomes {
        let slot = match (outcome.candidate.class, outcome.capability) {
            (ProtocolClass::Forward, Some(Capability::Https)) => 1,
            (ProtocolClass::Forward, _) => 0,
            (ProtocolClass::Socks4, _) => 2,
            (ProtocolClass::Socks5, _) => 3,
        };
        buckets[slot].push(outcome);
    }

    let [http, https, socks4, socks5] = buckets.map(by_latency);
    let mut lists = WorkingLists {
        http,
        https,
        socks4,
        socks5,
        ..Default::default()
    };

    if lists.https.is_empty() && !lists.http.is_empty() {
        info!(
            http = lists.http.len(),
            "no proxy passed the https check, publishing http list as https"
        );
        lists.https = lists.http.clone();
        lists.https_fallback = true;
    }

    lists.all = union_sorted([&lists.http, &lists.https, &lists.socks4, &lists.socks5]);
    lists
}

/// Sort by latency and keep the fastest entry per `host:port`
fn by_latency(mut outcomes: Vec<ProbeOutcome>) -> Vec<String> {
    outcomes.sort_by(|a, b| {
        a.elapsed_ms
            .partial_cmp(&b.elapsed_ms)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.candidate.hostport().cmp(&b.candidate.hostport()))
    });

    let mut seen = HashSet::new();
    outcomes
        .into_iter()
        .map(|outcome| outcome.candidate.hostport())
        .filter(|hostport| seen.insert(hostport.clone()))
        .collect()
}

fn union_sorted(lists: [&Vec<String>; 4]) -> Vec<String> {
    lists
        .into_iter()
        .flatten()
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proxy::models::Candidate;

    fn forward(hostport: &str, capability: Capability, ms: f64) -> ProbeOutcome {
        let candidate = Candidate::from_hostport(ProtocolClass::Forward, hostport).unwrap();
        ProbeOutcome::forward(candidate, capability, ms)
    }

    fn socks(class: ProtocolClass, hostport: &str, ms: f64) -> ProbeOutcome {
        ProbeOutcome::socks(Candidate::from_hostport(class, hostport).unwrap(), ms)
    }

    #[test]
    fn test_rank_orders_by_latency() {
        let lists = rank(vec![
            socks(ProtocolClass::Socks5, "1.1.1.1:1080", 30.0),
            socks(ProtocolClass::Socks5, "2.2.2.2:1080", 10.0),
            socks(ProtocolClass::Socks5, "3.3.3.3:1080", 20.0),
        ]);
        assert_eq!(
            lists.socks5,
            vec!["2.2.2.2:1080", "3.3.3.3:1080", "1.1.1.1:1080"]
        );
        assert!(lists.socks4.is_empty());
    }

    #[test]
    fn test_rank_ties_break_lexically() {
        let lists = rank(vec![
            socks(ProtocolClass::Socks4, "9.9.9.9:1080", 15.0),
            socks(ProtocolClass::Socks4, "10.0.0.1:1080", 15.0),
            socks(ProtocolClass::Socks4, "5.5.5.5:1080", 5.0),
        ]);
        assert_eq!(
            lists.socks4,
            vec!["5.5.5.5:1080", "10.0.0.1:1080", "9.9.9.9:1080"]
        );
    }

    #[test]
    fn test_rank_partitions_forward_capabilities() {
        let lists = rank(vec![
            forward("1.1.1.1:80", Capability::Http, 50.0),
            forward("1.1.1.1:80", Capability::Https, 70.0),
            forward("2.2.2.2:80", Capability::Https, 20.0),
        ]);
        assert_eq!(lists.http, vec!["1.1.1.1:80"]);
        assert_eq!(lists.https, vec!["2.2.2.2:80", "1.1.1.1:80"]);
        assert!(!lists.https_fallback);
    }

    #[test]
    fn test_rank_https_fallback_copies_http() {
        let lists = rank(vec![
            forward("2.2.2.2:80", Capability::Http, 80.0),
            forward("1.1.1.1:80", Capability::Http, 40.0),
        ]);
        assert_eq!(lists.http, vec!["1.1.1.1:80", "2.2.2.2:80"]);
        assert_eq!(lists.https, lists.http);
        assert!(lists.https_fallback);
    }

    #[test]
    fn test_rank_never_backfills_http_from_https() {
        let lists = rank(vec![forward("1.1.1.1:80", Capability::Https, 40.0)]);
        assert!(lists.http.is_empty());
        assert_eq!(lists.https, vec!["1.1.1.1:80"]);
        assert!(!lists.https_fallback);
    }

    #[test]
    fn test_rank_buckets_by_class_and_capability() {
        let mut stray = socks(ProtocolClass::Socks5, "5.5.5.5:1080", 5.0);
        stray.capability = Some(Capability::Https);
        let lists = rank(vec![
            stray,
            socks(ProtocolClass::Socks4, "4.4.4.4:1080", 5.0),
            ProbeOutcome {
                candidate: Candidate::from_hostport(ProtocolClass::Forward, "1.1.1.1:80").unwrap(),
                capability: None,
                elapsed_ms: 5.0,
            },
        ]);
        assert_eq!(lists.socks5, vec!["5.5.5.5:1080"]);
        assert_eq!(lists.socks4, vec!["4.4.4.4:1080"]);
        assert_eq!(lists.http, vec!["1.1.1.1:80"]);
        assert!(lists.https_fallback);
    }

    #[test]
    fn test_rank_no_outcomes() {
        let lists = rank(Vec::new());
        assert_eq!(lists, WorkingLists::default());
    }

    #[test]
    fn test_rank_dedups_keeping_fastest() {
        let lists = rank(vec![
            socks(ProtocolClass::Socks5, "1.1.1.1:1080", 90.0),
            socks(ProtocolClass::Socks5, "2.2.2.2:1080", 50.0),
            socks(ProtocolClass::Socks5, "1.1.1.1:1080", 10.0),
        ]);
        assert_eq!(lists.socks5, vec!["1.1.1.1:1080", "2.2.2.2:1080"]);
    }

    #[test]
    fn test_rank_all_is_sorted_union() {
        let lists = rank(vec![
            forward("3.3.3.3:80", Capability::Http, 5.0),
            forward("1.1.1.1:80", Capability::Https, 50.0),
            socks(ProtocolClass::Socks4, "3.3.3.3:80", 1.0),
            socks(ProtocolClass::Socks5, "2.2.2.2:1080", 9.0),
        ]);
        assert_eq!(
            lists.all,
            vec!["1.1.1.1:80", "2.2.2.2:1080", "3.3.3.3:80"]
        );
        assert_eq!(lists.get(ListKind::All), lists.all.as_slice());
    }
}
