use anyhow::Result;
use clap::Parser;
use open_proxy_list::spot_check::{check_with_curl, default_target, load_published, sample, summary_line};
use open_proxy_list::ListKind;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Quickly test a few published proxies using curl
#[derive(Parser)]
#[command(name = "spot-check")]
#[command(about = "Quickly test a few published proxies using curl")]
struct Cli {
    /// Which list to sample from
    #[arg(short = 't', long = "type", default_value_t = ListKind::Http)]
    list: ListKind,

    /// How many random proxies to test
    #[arg(short, long, default_value_t = 5)]
    limit: usize,

    /// Whether to test an HTTP or HTTPS target
    #[arg(long, default_value = "http", value_parser = ["http", "https"])]
    scheme: String,

    /// Override the test URL (default: <scheme>://api.ipify.org?format=json)
    #[arg(long)]
    url: Option<String>,

    /// Directory holding the published lists
    #[arg(short, long, default_value = "proxies")]
    dir: PathBuf,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let kind = cli.list;

    let proxies = load_published(&cli.dir, kind)?;
    let picked = sample(&proxies, cli.limit);
    println!(
        "Loaded {} proxies from {}, testing {} of them.",
        proxies.len(),
        cli.dir.join(kind.file_name()).display(),
        picked.len()
    );

    let url = cli.url.unwrap_or_else(|| default_target(&cli.scheme));

    let mut successes = 0;
    for proxy in &picked {
        println!("\n=== Testing proxy: {} ({} {}) ===", proxy, cli.scheme.to_uppercase(), url);
        let code = check_with_curl(kind, proxy, &url)?;
        info!(proxy = %proxy, exit_code = code, "curl finished");
        println!("exit status: {}", code);
        if code == 0 {
            successes += 1;
        }
    }

    println!("\n{}", summary_line(successes, picked.len()));
    Ok(())
}
