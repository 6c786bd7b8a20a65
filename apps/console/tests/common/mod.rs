//! Shared setup for the console integration tests.

#![allow(dead_code)]

use chrono::NaiveDate;
use drill_core::FixedClock;
use speaking_drill_console::commands::{execute, Command};
use speaking_drill_console::config::AppConfig;
use speaking_drill_console::db::SqliteRepository;
use speaking_drill_console::state::AppState;
use std::path::{Path, PathBuf};

pub const USER_ID: u64 = 7;

pub fn fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

pub fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
}

pub fn config(db_path: PathBuf) -> AppConfig {
    AppConfig {
        db_path,
        content_dir: fixtures_dir(),
        user_id: USER_ID,
        threshold: None,
        points: None,
        word_boundaries: false,
    }
}

/// App state over an in-memory database and a clock set to 2024-05-10.
pub struct TestContext {
    pub state: AppState,
    pub clock: FixedClock,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_config(config(PathBuf::from(":memory:")))
    }

    pub fn with_config(config: AppConfig) -> Self {
        let repository = SqliteRepository::open_in_memory().expect("in-memory database");
        Self::with_repository(repository, &config)
    }

    pub fn with_repository(repository: SqliteRepository, config: &AppConfig) -> Self {
        let clock = FixedClock::new(day(10));
        let state = AppState::with_clock(repository, config, Box::new(clock.clone()))
            .expect("app state");
        Self { state, clock }
    }

    /// Run one input line and return what it printed.
    pub fn send(&mut self, line: &str) -> String {
        let mut out = Vec::new();
        let command = Command::parse(line).expect("valid command");
        execute(&mut self.state, &mut out, command).expect("command succeeds");
        String::from_utf8(out).expect("utf-8 output")
    }
}

/// Database file in the temp directory, removed on drop.
pub struct TempDb {
    pub path: PathBuf,
}

impl TempDb {
    pub fn new(name: &str) -> Self {
        let path = std::env::temp_dir().join(format!(
            "speaking-drill-{}-{}.db",
            name,
            std::process::id()
        ));
        let _ = std::fs::remove_file(&path);
        Self { path }
    }
}

impl Drop for TempDb {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}
