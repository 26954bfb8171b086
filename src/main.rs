//! MdVault - markdown vault service
//!
//! Serves a sandboxed directory tree to an editor front end over
//! newline-delimited JSON on stdin/stdout. Logs go to stderr.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use mdvault::{AppConfig, Vault, VaultApp};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "mdvault", version, about = "Sandboxed markdown vault service")]
struct Args {
    /// Vault root directory (defaults to the configured root, then ./content)
    #[arg(short, long)]
    root: Option<PathBuf>,

    /// Config file to use instead of the platform config directory
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level override (error, warn, info, debug, trace)
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load().unwrap_or_default(),
    };

    // Initialize logging
    let level = args.log_level.as_deref().unwrap_or(&config.log_level);
    let level: LevelFilter = level
        .parse()
        .with_context(|| format!("Invalid log level: {level}"))?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(level)
        .init();

    let root = config.resolve_root(args.root.clone());
    std::fs::create_dir_all(&root)
        .with_context(|| format!("Failed to create vault root: {}", root.display()))?;

    let vault = Vault::open(&root)?.with_sorting(config.tree.sort_entries);
    tracing::info!("Serving vault at {}", vault.root().display());

    config.add_recent_root(vault.root().to_path_buf());
    let saved = match &args.config {
        Some(path) => config.save_to(path),
        None => config.save(),
    };
    if let Err(e) = saved {
        tracing::warn!("Failed to save config: {:#}", e);
    }

    VaultApp::new(vault).run_stdio().await
}
