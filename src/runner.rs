//! One full refresh cycle: crawl, cap, validate, rank, publish.

use crate::config::Config;
use crate::error::RunError;
use crate::proxy::{
    rank, CandidatePool, CrawlerConfig, ProtocolClass, ProxyChecker, ProxyCrawler, Publisher,
    ReqwestTransport, RunStats, Transport, WorkingLists,
};
use crate::Result;
use tracing::info;

/// What a finished run produced
#[derive(Debug, Clone)]
pub struct RunReport {
    pub lists: WorkingLists,
    pub stats: RunStats,
}

/// Drives a refresh cycle with a given transport
pub struct Runner<T = ReqwestTransport> {
    config: Config,
    checker: ProxyChecker<T>,
    publisher: Publisher,
}

impl Runner<ReqwestTransport> {
    pub fn new(config: Config) -> Self {
        Self::with_transport(config, ReqwestTransport::new())
    }
}

impl<T: Transport> Runner<T> {
    pub fn with_transport(config: Config, transport: T) -> Self {
        let checker = ProxyChecker::with_transport(config.checker(), transport);
        let publisher = Publisher::new(&config.out_dir, &config.readme);
        Self {
            config,
            checker,
            publisher,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Crawl the configured sources and run the cycle on what they yield
    pub async fn run(&self) -> Result<RunReport> {
        let sources = ProxyCrawler::read_sources(&self.config.sources_file)?;
        info!(
            path = %self.config.sources_file.display(),
            sources = sources.len(),
            "sources loaded"
        );

        let crawler = ProxyCrawler::with_config(CrawlerConfig::default())?;
        let pool = crawler.crawl_sources(&sources).await;
        self.run_with_candidates(pool).await
    }

    /// Cap, validate, rank and publish an already harvested pool
    ///
    /// An empty pool is fatal and leaves the output directory untouched.
    pub async fn run_with_candidates(&self, pool: CandidatePool) -> Result<RunReport> {
        let pool = pool.capped(self.config.max_per_type());
        if pool.is_empty() {
            return Err(RunError::NoCandidates.into());
        }

        let mut outcomes = Vec::new();
        for class in ProtocolClass::ALL {
            outcomes.extend(self.checker.check_proxies(pool.get(class)).await);
        }

        let lists = rank(outcomes);
        let stats = RunStats::new(&self.config, &pool, &lists);
        self.publisher.publish(&lists, &stats)?;

        info!(
            http = lists.http.len(),
            https = lists.https.len(),
            socks4 = lists.socks4.len(),
            socks5 = lists.socks5.len(),
            all = lists.all.len(),
            https_fallback = lists.https_fallback,
            out_dir = %self.publisher.out_dir().display(),
            "run published"
        );

        Ok(RunReport { lists, stats })
    }
}
