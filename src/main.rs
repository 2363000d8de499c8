//! redlimit - operator CLI for the distributed rate limiter
//!
//! Inspects and edits limiter state in the shared store. Every command prints
//! one JSON document on stdout; logs go to stderr.

#![allow(missing_docs)]

use anyhow::Context;
use clap::{Parser, Subcommand};
use redlimit::utils::format_duration;
use redlimit::utils::logging::{LogLevel, init_tracing};
use redlimit::{
    Algorithm, Config, DEFAULT_HISTORY_LIMIT, RateLimitOptions, RateLimiter,
};
use serde_json::{Value, json};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

#[derive(Debug, Parser)]
#[command(name = "redlimit", version, about = "Inspect and manage distributed rate limits")]
struct Cli {
    /// YAML configuration file; environment variables are used when omitted
    #[arg(short, long, env = "REDLIMIT_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (overridden by RUST_LOG)
    #[arg(long, default_value = "warn")]
    log_level: LogLevel,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Count one request against a limit and print the decision
    Check {
        identifier: String,
        #[arg(long)]
        limit: i64,
        #[arg(long, default_value_t = 60_000)]
        window_ms: u64,
        /// sliding-window, token-bucket or fixed-window
        #[arg(long)]
        algorithm: Option<Algorithm>,
        #[arg(long, default_value_t = 1.0)]
        burst: f64,
    },
    /// Clear every counter for an identifier
    Reset { identifier: String },
    /// Ban an identifier
    Ban {
        identifier: String,
        #[arg(long, default_value_t = 3600)]
        duration_secs: u64,
    },
    /// Lift a ban
    Unban { identifier: String },
    /// Show ban status
    Status { identifier: String },
    /// Show hourly and daily request counts
    Stats { identifier: String },
    /// Show recent violations, most recent first
    Violations {
        identifier: String,
        #[arg(long, default_value_t = DEFAULT_HISTORY_LIMIT)]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_level, cli.json_logs);

    match run(cli).await {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<String> {
    let config = match &cli.config {
        Some(path) => Config::from_file(path)
            .await
            .with_context(|| format!("loading {}", path.display()))?,
        None => Config::from_env().context("loading configuration from the environment")?,
    };

    let limiter = RateLimiter::connect(&config)
        .await
        .context("creating rate limiter")?;

    let output = execute(&limiter, cli.command).await?;
    Ok(serde_json::to_string_pretty(&output)?)
}

async fn execute(limiter: &RateLimiter, command: Command) -> anyhow::Result<Value> {
    let value = match command {
        Command::Check {
            identifier,
            limit,
            window_ms,
            algorithm,
            burst,
        } => {
            let mut options =
                RateLimitOptions::new(identifier, limit, window_ms).with_burst_multiplier(burst);
            options.algorithm = algorithm;
            serde_json::to_value(limiter.check_limit(&options).await?)?
        }
        Command::Reset { identifier } => {
            limiter.reset(&identifier).await?;
            json!({ "identifier": identifier, "reset": true })
        }
        Command::Ban {
            identifier,
            duration_secs,
        } => {
            limiter
                .set_ban(&identifier, Duration::from_secs(duration_secs))
                .await?;
            let status = limiter.is_banned(&identifier).await?;
            json!({
                "identifier": identifier,
                "banned": status.banned,
                "until": status.until.map(format_timestamp),
                "duration": format_duration(duration_secs.saturating_mul(1000)),
            })
        }
        Command::Unban { identifier } => {
            limiter.remove_ban(&identifier).await?;
            json!({ "identifier": identifier, "banned": false })
        }
        Command::Status { identifier } => {
            let status = limiter.is_banned(&identifier).await?;
            json!({
                "identifier": identifier,
                "banned": status.banned,
                "until": status.until.map(format_timestamp),
                "storeConnected": limiter.is_store_connected(),
            })
        }
        Command::Stats { identifier } => {
            let stats = limiter.get_usage_stats(&identifier).await?;
            json!({
                "identifier": identifier,
                "hourly": stats.hourly,
                "daily": stats.daily,
            })
        }
        Command::Violations { identifier, limit } => {
            let history = limiter.get_violation_history(&identifier, limit).await?;
            json!({ "identifier": identifier, "violations": history })
        }
    };
    Ok(value)
}

/// RFC 3339 rendering of a millisecond timestamp
fn format_timestamp(ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(ms)
        .map(|at| at.to_rfc3339())
        .unwrap_or_else(|| ms.to_string())
}
