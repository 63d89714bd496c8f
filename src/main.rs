use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use hirewise::config::{HirewiseConfig, LoggingConfig};
use hirewise::posting::parse_job_posting;
use hirewise::ratelimit::{spawn_sweeper, RateLimitKey, RateLimiter};

#[derive(Debug, Parser)]
#[command(name = "hirewise", version, about = "Job posting parsing and rate limiting tools")]
struct Cli {
    /// Path to a YAML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit JSON log lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Parse a pasted job posting and print it as JSON
    Parse {
        /// File containing the posting; reads stdin when omitted
        file: Option<PathBuf>,
    },
    /// Check one subject per stdin line against a scope's rate limit
    Gate {
        /// Scope whose policy applies, e.g. `job-search`
        #[arg(long)]
        scope: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => HirewiseConfig::from_file(path)?,
        None => HirewiseConfig::default(),
    };
    init_tracing(&config.logging, cli.json_logs);

    info!(version = env!("CARGO_PKG_VERSION"), "Starting Hirewise");

    match cli.command {
        Command::Parse { file } => run_parse(file),
        Command::Gate { scope } => run_gate(&config, &scope).await,
    }
}

fn init_tracing(logging: &LoggingConfig, json_override: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if logging.json || json_override {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn run_parse(file: Option<PathBuf>) -> anyhow::Result<()> {
    let text = match file {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    let parsed = parse_job_posting(&text);
    if parsed.is_empty() {
        warn!("Nothing could be extracted; fill the job form manually");
    }

    println!("{}", serde_json::to_string_pretty(&parsed)?);
    Ok(())
}

async fn run_gate(config: &HirewiseConfig, scope: &str) -> anyhow::Result<()> {
    let rules = config.rate_limiting.load_rules()?;
    let policy = rules
        .policy_for(scope)
        .ok_or_else(|| anyhow::anyhow!("no rate limit rule for scope `{}`", scope))?;
    info!(
        scope = %scope,
        limit = policy.limit(),
        window_ms = policy.window().as_millis() as u64,
        "Rate limit gate ready"
    );

    let limiter = Arc::new(RateLimiter::new());
    let sweeper = spawn_sweeper(
        Arc::clone(&limiter),
        Duration::from_secs(config.rate_limiting.sweep_interval_secs),
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(subject) = line? else { break };
                let subject = subject.trim();
                if subject.is_empty() {
                    continue;
                }

                let key = RateLimitKey::new(scope, subject);
                let Some(decision) = limiter.check_with_rules(&key.to_string_key(), &rules) else {
                    warn!(key = %key, "No rate limit rule applies");
                    continue;
                };
                let verdict = if decision.allowed { "allowed" } else { "denied" };
                println!(
                    "{}\t{}\tremaining={}\treset_after_ms={}",
                    key,
                    verdict,
                    decision.remaining,
                    decision.reset_after.as_millis()
                );
            }
            _ = &mut shutdown => break,
        }
    }

    sweeper.stop();
    info!(tracked = limiter.len(), "Rate limit gate stopped");
    Ok(())
}

/// Wait for a shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        }
        _ = terminate => {
            info!("Received SIGTERM, shutting down");
        }
    }
}
