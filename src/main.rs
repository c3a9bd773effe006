//! nspolicy - Namespace Network Policy Sidecar
//!
//! Rewrites the kernel filter table's INPUT and OUTPUT chains to a two-rule
//! policy: accept intra-namespace traffic, drop wider intra-cluster traffic.
//! The two CIDR ranges come from the container environment.
//!
//! # Usage
//!
//! ```bash
//! # One-shot: configure the chains and exit
//! ip_range_cluster=10.0.0.0/8 ip_range_ns=10.1.2.0/24 nspolicy
//!
//! # Sidecar keepalive: stay alive for a day after configuring
//! nspolicy --keepalive 86400
//!
//! # Dump the resulting chains as JSON
//! nspolicy --json
//! ```

use clap::Parser;
use nspolicy::core::chains::KernelChains;
use nspolicy::core::error::IptablesErrorPattern;
use nspolicy::core::installer;
use nspolicy::keepalive::{self, KeepaliveOutcome};
use nspolicy::{Config, Error};
use std::process::ExitCode;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "nspolicy")]
#[command(
    about = "Namespace network policy sidecar - partitions pod traffic by CIDR range",
    long_about = None
)]
struct Cli {
    /// Stay alive for this many seconds after configuring the chains
    /// (keeps the sidecar container running; the process then exits 0)
    #[arg(long, value_name = "SECONDS")]
    keepalive: Option<u64>,

    /// Print the resulting chain contents as JSON instead of plain text
    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let runtime = tokio::runtime::Runtime::new().expect("Failed to create Tokio runtime");
    match runtime.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report_error(&e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}

async fn run(cli: Cli) -> Result<(), Error> {
    // Fail fast on configuration problems, before any kernel access.
    let config = Config::from_env()?;
    info!(
        cluster = %config.cluster_range,
        namespace = %config.namespace_range,
        "configuration loaded"
    );

    if !nix::unistd::getuid().is_root() {
        warn!("not running as root; filter-table changes normally require root or CAP_NET_ADMIN");
    }

    let backend = KernelChains::new()?;
    let report = installer::install(&backend, &config.policy())?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", report.to_listing());
    }

    if let Some(secs) = cli.keepalive {
        match keepalive::wait(Duration::from_secs(secs)).await? {
            KeepaliveOutcome::Elapsed => info!("keepalive elapsed, exiting"),
            KeepaliveOutcome::Interrupted(signal) => {
                info!(signal, "shutdown signal received, exiting");
            }
        }
    }

    Ok(())
}

/// Prints the error and, for filter-table failures, a translated message
/// with actionable suggestions.
fn report_error(e: &Error) {
    eprintln!("Error: {e}");

    if let Error::Iptables { message } = e {
        let translation = IptablesErrorPattern::match_error(message);
        eprintln!("{}", translation.user_message);
        for suggestion in &translation.suggestions {
            eprintln!("  - {suggestion}");
        }
    }
}
