use anyhow::Result;
use clap::Parser;
use open_proxy_list::config::{
    DEFAULT_CONCURRENCY, DEFAULT_MAX_PER_TYPE, DEFAULT_OUT_DIR, DEFAULT_README,
    DEFAULT_SOURCES_FILE, DEFAULT_TEST_URL_HTTP, DEFAULT_TEST_URL_HTTPS, DEFAULT_TIMEOUT_SECS,
};
use open_proxy_list::{Config, ListKind, Runner};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Harvest, validate and publish free HTTP/HTTPS/SOCKS proxy lists
#[derive(Parser)]
#[command(name = "open-proxy-list")]
#[command(about = "Harvest, validate and publish free HTTP/HTTPS/SOCKS proxy lists")]
struct Cli {
    /// Per-probe timeout in seconds
    #[arg(long, env = "PROXY_TIMEOUT_SEC", default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout: f64,

    /// Maximum number of probes in flight
    #[arg(short = 'n', long, env = "PROXY_CONCURRENCY", default_value_t = DEFAULT_CONCURRENCY)]
    concurrency: usize,

    /// Maximum number of candidates validated per protocol class
    #[arg(long, env = "PROXY_MAX_PER_TYPE", default_value_t = DEFAULT_MAX_PER_TYPE)]
    max_per_type: usize,

    /// Plain HTTP URL to test proxies against
    #[arg(long, env = "PROXY_TEST_URL_HTTP", default_value = DEFAULT_TEST_URL_HTTP)]
    test_url_http: String,

    /// HTTPS URL to test proxies against
    #[arg(long, env = "PROXY_TEST_URL_HTTPS", default_value = DEFAULT_TEST_URL_HTTPS)]
    test_url_https: String,

    /// File listing source URLs, one `URL [type]` per line
    #[arg(short, long, default_value = DEFAULT_SOURCES_FILE)]
    sources: PathBuf,

    /// Output directory for the lists and summary.json
    #[arg(short, long, default_value = DEFAULT_OUT_DIR)]
    out_dir: PathBuf,

    /// README whose stats block is refreshed
    #[arg(long, default_value = DEFAULT_README)]
    readme: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let config = Config::new(
        cli.timeout,
        cli.concurrency,
        cli.max_per_type,
        &cli.test_url_http,
        &cli.test_url_https,
    )?
    .with_sources_file(cli.sources)
    .with_out_dir(cli.out_dir)
    .with_readme(cli.readme);

    println!(
        "Checking with concurrency {}, timeout: {}s, max {} per type",
        config.concurrency(),
        config.timeout_secs(),
        config.max_per_type()
    );
    println!(
        "Test URLs: {} | {}",
        config.raw_test_url_http(),
        config.raw_test_url_https()
    );
    println!();

    let runner = Runner::new(config);
    let report = runner.run().await?;

    println!("Results (working / candidates):");
    for kind in ListKind::ALL {
        let counts = report.stats.counts(kind);
        println!("  {:<7} {} / {}", kind.label(), counts.working, counts.candidates);
    }
    if report.lists.https_fallback {
        println!("  (https list falls back to the http list)");
    }
    println!(
        "\nSaved lists to {:?} (updated {})",
        runner.config().out_dir,
        report.stats.updated_utc
    );

    Ok(())
}
