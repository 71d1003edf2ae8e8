//! # Cadent CLI Entry Point
//!
//! Main binary for querying cadent metric hosts.
//!
//! ## Usage
//!
//! ```bash
//! # Resolve a pattern against two hosts
//! cadent -H http://cadent-a:8083 -H http://cadent-b:8083 find 'servers.*.cpu'
//!
//! # Only print leaves
//! cadent -H http://cadent-a:8083 find --leaves 'servers.*.cpu'
//!
//! # Fetch the last hour of two paths (hosts from a config file)
//! cadent --config cadent.toml fetch --from 1700000000 servers.a.cpu servers.b.cpu
//!
//! # Patterns are resolved before fetching
//! CADENT_URLS=http://cadent-a:8083 cadent fetch --from 1700000000 'servers.*.cpu'
//! ```
//!
//! ## URL Format
//!
//! All host URLs must include the `http://` or `https://` prefix:
//! - ✅ `http://127.0.0.1:8083`
//! - ✅ `https://cadent.example.com`
//! - ❌ `127.0.0.1:8083`

use anyhow::{bail, Result};
use argh::FromArgs;
use cadent_cli::{describe_error, extend_leaves, is_pattern, load_config, node_lines};
use cadent_finder::{CadentFinder, LeafNode, Node, PathQuery};
use std::io::Write;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

/// Main CLI structure parsed from command-line arguments.
#[derive(FromArgs)]
/// cadent - resolve and fetch metrics from cadent hosts
struct Cli {
    /// cadent host base URL; repeat for several hosts
    #[argh(option, short = 'H')]
    host: Vec<String>,

    /// TOML config file with a [cadent] table, used when no -H is given
    #[argh(option)]
    config: Option<PathBuf>,

    /// per-request timeout in milliseconds
    #[argh(option)]
    timeout_ms: Option<u64>,

    #[argh(subcommand)]
    command: Commands,
}

#[derive(FromArgs)]
#[argh(subcommand)]
enum Commands {
    Find(FindArgs),
    Fetch(FetchArgs),
}

/// Arguments for resolving a path pattern.
///
/// # Example
///
/// ```bash
/// cadent -H http://127.0.0.1:8083 find 'servers.{web1,web2}.cpu.*'
/// ```
#[derive(FromArgs)]
#[argh(subcommand, name = "find")]
/// resolve a path pattern and print matching nodes as JSON lines
struct FindArgs {
    /// print leaves only
    #[argh(switch)]
    leaves: bool,

    /// glob-style path pattern
    #[argh(positional)]
    pattern: String,
}

/// Arguments for fetching series.
///
/// Targets containing glob characters are resolved with `find` first; other
/// targets are fetched as literal paths.
#[derive(FromArgs)]
#[argh(subcommand, name = "fetch")]
/// fetch series for paths or patterns and print the merged result as JSON
struct FetchArgs {
    /// range start, unix seconds
    #[argh(option)]
    from: i64,

    /// range end, unix seconds (default: now)
    #[argh(option)]
    until: Option<i64>,

    /// metric paths or patterns
    #[argh(positional)]
    targets: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli: Cli = argh::from_env();

    // RUST_LOG overrides the default level; stdout is reserved for results
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(&cli.host, cli.config.as_deref(), cli.timeout_ms)?;
    let finder = CadentFinder::new(config).map_err(describe_error)?;

    match cli.command {
        Commands::Find(args) => run_find(&finder, args).await,
        Commands::Fetch(args) => run_fetch(&finder, args).await,
    }
}

/// Executes the `find` subcommand.
///
/// Fails only when every host failed; partial failures are logged.
async fn run_find(finder: &CadentFinder, args: FindArgs) -> Result<()> {
    let resolution = finder.find_nodes(&PathQuery::new(args.pattern.as_str())).await;
    if resolution.all_failed() {
        bail!(
            "All {} hosts failed to resolve '{}'",
            resolution.hosts_queried,
            args.pattern
        );
    }

    let mut stdout = std::io::stdout().lock();
    for line in node_lines(&resolution, args.leaves)? {
        writeln!(stdout, "{}", line)?;
    }
    Ok(())
}

/// Executes the `fetch` subcommand.
///
/// # Errors
///
/// Returns an error if:
/// - No targets were given, or the range is empty
/// - A host fails during the fetch
async fn run_fetch(finder: &CadentFinder, args: FetchArgs) -> Result<()> {
    if args.targets.is_empty() {
        bail!("At least one target is required");
    }
    let until = args.until.unwrap_or_else(now);
    if args.from >= until {
        bail!("Invalid range: --from {} is not before --until {}", args.from, until);
    }

    let mut leaves: Vec<LeafNode> = Vec::new();
    for target in &args.targets {
        if is_pattern(target) {
            let resolution = finder.find_nodes(&PathQuery::new(target.as_str())).await;
            tracing::debug!("{} resolved to {} nodes", target, resolution.nodes.len());
            extend_leaves(&mut leaves, resolution);
        } else {
            extend_leaves(&mut leaves, [Node::Leaf(LeafNode::new(target.as_str()))]);
        }
    }

    if leaves.is_empty() {
        tracing::warn!("No leaves matched {:?}", args.targets);
    }

    let result = finder
        .fetch_multi(&leaves, args.from, until)
        .await
        .map_err(describe_error)?;
    println!("{}", serde_json::to_string(&result)?);

    Ok(())
}

fn now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
