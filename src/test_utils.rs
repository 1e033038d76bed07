//! Test utilities.
//!
//! `MockTransport` scripts how each candidate answers, per URL scheme, and
//! records how many distinct candidates were being probed at the same time.
//! It drives the unit tests as well as the integration tests under `tests/`.

use crate::proxy::models::Candidate;
use crate::proxy::transport::Transport;
use crate::Result;
use anyhow::anyhow;
use reqwest::Url;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Scripted behaviour of one `(host:port, scheme)` route
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockRoute {
    /// Answer successfully after the delay
    Succeed(Duration),
    /// Fail after the delay
    Fail(Duration),
    /// Never answer
    Hang,
}

/// In-memory transport with scripted per-route behaviour
///
/// Routes that were not scripted fail immediately, like a refused connection.
#[derive(Debug, Default)]
pub struct MockTransport {
    routes: HashMap<(String, String), MockRoute>,
    calls: Mutex<HashMap<(String, String), usize>>,
    active: Mutex<HashMap<String, usize>>,
    max_active: AtomicUsize,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(mut self, hostport: &str, scheme: &str, route: MockRoute) -> Self {
        self.routes
            .insert((hostport.to_string(), scheme.to_string()), route);
        self
    }

    pub fn succeed(self, hostport: &str, scheme: &str, delay: Duration) -> Self {
        self.route(hostport, scheme, MockRoute::Succeed(delay))
    }

    pub fn fail(self, hostport: &str, scheme: &str, delay: Duration) -> Self {
        self.route(hostport, scheme, MockRoute::Fail(delay))
    }

    pub fn hang(self, hostport: &str, scheme: &str) -> Self {
        self.route(hostport, scheme, MockRoute::Hang)
    }

    /// Number of fetches issued for a route so far
    pub fn calls(&self, hostport: &str, scheme: &str) -> usize {
        lock(&self.calls)
            .get(&(hostport.to_string(), scheme.to_string()))
            .copied()
            .unwrap_or(0)
    }

    /// Highest number of distinct candidates with a fetch in flight at once
    pub fn max_concurrent_candidates(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }

    fn enter(&self, hostport: &str) -> ActiveGuard<'_> {
        let mut active = lock(&self.active);
        *active.entry(hostport.to_string()).or_insert(0) += 1;
        self.max_active.fetch_max(active.len(), Ordering::SeqCst);

        ActiveGuard {
            transport: self,
            hostport: hostport.to_string(),
        }
    }
}

impl Transport for MockTransport {
    async fn fetch(&self, candidate: &Candidate, url: &Url, _timeout: Duration) -> Result<()> {
        let key = (candidate.hostport(), url.scheme().to_string());
        *lock(&self.calls).entry(key.clone()).or_insert(0) += 1;

        let _guard = self.enter(&key.0);
        match self.routes.get(&key).copied() {
            Some(MockRoute::Succeed(delay)) => {
                tokio::time::sleep(delay).await;
                Ok(())
            }
            Some(MockRoute::Fail(delay)) => {
                tokio::time::sleep(delay).await;
                Err(anyhow!("scripted failure for {}", url))
            }
            Some(MockRoute::Hang) => {
                std::future::pending::<()>().await;
                Ok(())
            }
            None => Err(anyhow!("connection refused")),
        }
    }
}

/// Marks a candidate as in flight until dropped, including when the fetch
/// future is cancelled by a timeout
struct ActiveGuard<'a> {
    transport: &'a MockTransport,
    hostport: String,
}

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        let mut active = lock(&self.transport.active);
        if let Some(count) = active.get_mut(&self.hostport) {
            *count -= 1;
            if *count == 0 {
                active.remove(&self.hostport);
            }
        }
    }
}

fn lock<V>(mutex: &Mutex<V>) -> std::sync::MutexGuard<'_, V> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
