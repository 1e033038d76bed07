//! Transport used by probes to send one request through one candidate

use crate::proxy::models::Candidate;
use crate::Result;
use anyhow::bail;
use reqwest::{Client, Proxy as ReqwestProxy, Url};
use std::future::Future;
use std::time::Duration;

/// Sends a single GET through a candidate proxy.
///
/// An implementation returns `Ok(())` only when a response with status below
/// 400 arrived and its body was read to the end. Every other situation is an
/// error; callers do not distinguish between error kinds.
pub trait Transport: Send + Sync {
    fn fetch(
        &self,
        candidate: &Candidate,
        url: &Url,
        timeout: Duration,
    ) -> impl Future<Output = Result<()>> + Send;
}

/// Transport backed by a fresh `reqwest` client per request
///
/// Clients are never shared: each attempt owns its connection and drops it
/// when done, so a stuck proxy cannot hold up or skew another attempt.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport;

impl ReqwestTransport {
    pub fn new() -> Self {
        Self
    }

    /// Create a reqwest client routed through the candidate
    fn create_client(&self, candidate: &Candidate, timeout: Duration) -> Result<Client> {
        // Forward proxies get plain HTTP proxying and CONNECT for https URLs,
        // SOCKS proxies tunnel everything.
        let reqwest_proxy = ReqwestProxy::all(candidate.proxy_url())?;

        let client = Client::builder()
            .proxy(reqwest_proxy)
            .timeout(timeout)
            .connect_timeout(timeout)
            .pool_max_idle_per_host(0)
            .danger_accept_invalid_certs(true)
            .build()?;

        Ok(client)
    }
}

impl Transport for ReqwestTransport {
    async fn fetch(&self, candidate: &Candidate, url: &Url, timeout: Duration) -> Result<()> {
        let client = self.create_client(candidate, timeout)?;

        let response = client.get(url.clone()).send().await?;
        let status = response.status();
        if status.as_u16() >= 400 {
            bail!("HTTP status: {}", status);
        }

        response.bytes().await?;
        Ok(())
    }
}
