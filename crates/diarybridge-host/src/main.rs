//! diarybridge host - the process the dashboard spawns to reach the diary
//! platform.
//!
//! Reads one JSON request per line on stdin (`login`, `count`, `list`) and
//! writes one JSON envelope per line on stdout. Logs go to a file, since
//! stdout carries the protocol.

mod protocol;

use std::path::PathBuf;

use anyhow::{Context, Result};
use diarybridge_core::{config::APP_NAME, Bridge, Config};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the tracing subscriber, writing to a daily log file
fn init_tracing() -> Result<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let log_dir = Config::log_dir().unwrap_or_else(|_| PathBuf::from("./logs"));
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;
    let appender = tracing_appender::rolling::daily(log_dir, format!("{}.log", APP_NAME));
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .with(filter)
        .init();

    Ok(guard)
}

fn load_config() -> Result<Config> {
    let args: Vec<String> = std::env::args().collect();
    let mut config = match args.iter().position(|a| a == "--config") {
        Some(i) => {
            let path = args
                .get(i + 1)
                .ok_or_else(|| anyhow::anyhow!("--config needs a path"))?;
            Config::load_from(&PathBuf::from(path))?
        }
        None => Config::load()?,
    };
    config.apply_env_overrides();
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let _guard = init_tracing()?;
    let config = load_config().context("Failed to load configuration")?;
    let bridge = Bridge::connect(&config).context("Failed to create bridge")?;
    info!(base_url = %config.base_url, shop_dir = ?config.shop_dir, "diarybridge host starting");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let reply = protocol::handle_line(&bridge, &line).await;
        let mut out = serde_json::to_vec(&reply)?;
        out.push(b'\n');
        stdout.write_all(&out).await?;
        stdout.flush().await?;
    }

    info!(
        active_sessions = bridge.sessions().active_sessions().await,
        "stdin closed, diarybridge host shutting down"
    );
    Ok(())
}
