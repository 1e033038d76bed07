//! Open Proxy List - free proxy harvester, validator and ranker
//!
//! Harvests `IP:PORT` candidates from public source lists, checks each one
//! by routing real requests through it, and publishes latency-ranked lists
//! of working HTTP, HTTPS, SOCKS4 and SOCKS5 proxies.

pub mod config;
pub mod error;
pub mod proxy;
pub mod runner;
pub mod spot_check;
pub mod test_utils;

pub use config::Config;
pub use error::{ConfigError, RunError};
pub use proxy::*;
pub use runner::{RunReport, Runner};

/// Application result type
pub type Result<T> = anyhow::Result<T>;
