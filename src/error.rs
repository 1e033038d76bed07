//! Error types for conditions that abort a whole run.
//!
//! Probe-level failures never show up here: they are absorbed at the probe
//! boundary and simply leave the candidate off the working lists.

use std::path::PathBuf;
use thiserror::Error;

/// Invalid run configuration, detected once at startup.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    /// Probe timeout must be a finite number of seconds above zero.
    #[error("timeout must be a positive number of seconds, got {0}")]
    InvalidTimeout(f64),

    /// At least one probe must be allowed in flight.
    #[error("concurrency must be greater than zero")]
    InvalidConcurrency,

    /// Candidate cap must leave room for at least one candidate.
    #[error("max candidates per type must be greater than zero")]
    InvalidMaxPerType,

    /// Test URL is unparsable or uses the wrong scheme.
    #[error("invalid {name} test url {url:?}: {reason}")]
    InvalidTestUrl {
        name: &'static str,
        url: String,
        reason: String,
    },
}

/// Fatal run errors. Nothing is published when one of these is returned.
#[derive(Debug, Error)]
pub enum RunError {
    /// Every protocol class ended up with zero candidates.
    #[error("no proxy candidates were harvested; refusing to publish empty lists")]
    NoCandidates,

    /// The sources file could not be read.
    #[error("cannot read proxy sources from {path:?}")]
    SourcesUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
