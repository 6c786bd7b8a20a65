pub mod commands;
pub mod config;
pub mod content;
pub mod db;
pub mod state;
pub mod voice;

use anyhow::Context;
use config::AppConfig;
use db::SqliteRepository;
use state::AppState;
use std::io;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Install the log subscriber. Logs go to stderr so they never mix with the
/// drill on stdout.
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

pub fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = AppConfig::from_env()?;

    if let Some(parent) = config.db_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("cannot create {}", parent.display()))?;
    }

    tracing::info!("Opening database at {}", config.db_path.display());
    let repository = SqliteRepository::open(&config.db_path)
        .with_context(|| format!("cannot open database {}", config.db_path.display()))?;
    let mut state = AppState::new(repository, &config)?;

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    commands::run_loop(&mut state, stdin.lock(), &mut stdout)?;
    Ok(())
}
