//! Publishing of working lists, `summary.json` and the README stats block

use crate::proxy::models::ListKind;
use crate::proxy::parser::ProxyParser;
use crate::proxy::ranker::WorkingLists;
use crate::proxy::stats::RunStats;
use crate::Result;
use anyhow::Context;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const STATS_START: &str = "<!-- STATS:START -->";
pub const STATS_END: &str = "<!-- STATS:END -->";
pub const SUMMARY_FILE: &str = "summary.json";

/// Writes run artifacts to disk
#[derive(Debug, Clone)]
pub struct Publisher {
    out_dir: PathBuf,
    readme: PathBuf,
}

impl Publisher {
    pub fn new(out_dir: impl Into<PathBuf>, readme: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
            readme: readme.into(),
        }
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    /// Write every list file, the summary and refresh the README
    pub fn publish(&self, lists: &WorkingLists, stats: &RunStats) -> Result<()> {
        fs::create_dir_all(&self.out_dir)
            .with_context(|| format!("cannot create {}", self.out_dir.display()))?;

        for kind in ListKind::ALL {
            let path = self.out_dir.join(kind.file_name());
            ProxyParser::save_list(&path, lists.get(kind))
                .with_context(|| format!("cannot write {}", path.display()))?;
            info!(list = %kind, entries = lists.get(kind).len(), path = %path.display(), "list written");
        }

        let summary = self.out_dir.join(SUMMARY_FILE);
        fs::write(&summary, stats.to_json()?)
            .with_context(|| format!("cannot write {}", summary.display()))?;
        self.update_readme(stats)?;
        Ok(())
    }

    /// Replace the text between the stats markers, if the README has them
    ///
    /// Returns whether the README was rewritten.
    pub fn update_readme(&self, stats: &RunStats) -> Result<bool> {
        if !self.readme.exists() {
            debug!(path = %self.readme.display(), "no README, skipping stats block");
            return Ok(false);
        }

        let text = fs::read_to_string(&self.readme)
            .with_context(|| format!("cannot read {}", self.readme.display()))?;
        let Some(updated) = replace_stats_block(&text, stats) else {
            debug!(path = %self.readme.display(), "README has no stats markers");
            return Ok(false);
        };

        fs::write(&self.readme, updated)
            .with_context(|| format!("cannot write {}", self.readme.display()))?;
        Ok(true)
    }
}

/// Render the markdown block, markers included
pub fn render_stats_block(stats: &RunStats) -> String {
    let mut block = format!(
        "{}\nLast update (UTC): **{}**\n\n| Type | Working | Total Candidates |\n|---|---:|---:|\n",
        STATS_START, stats.updated_utc
    );

    for (label, kind) in [
        ("HTTP", ListKind::Http),
        ("HTTPS", ListKind::Https),
        ("SOCKS4", ListKind::Socks4),
        ("SOCKS5", ListKind::Socks5),
        ("ALL", ListKind::All),
    ] {
        let counts = stats.counts(kind);
        block.push_str(&format!(
            "| {} | {} | {} |\n",
            label, counts.working, counts.candidates
        ));
    }

    block.push_str(STATS_END);
    block
}

fn replace_stats_block(text: &str, stats: &RunStats) -> Option<String> {
    let (pre, rest) = text.split_once(STATS_START)?;
    let (_, post) = rest.split_once(STATS_END)?;
    Some(format!("{}{}{}", pre, render_stats_block(stats), post))
}
