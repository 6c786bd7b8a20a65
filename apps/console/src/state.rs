//! Application state.

use crate::config::AppConfig;
use crate::content::ContentLoader;
use crate::db::{DbError, SettingsRepository, SqliteRepository};
use crate::voice::ConsoleVoice;
use drill_core::{
    Clock, DrillSettings, ProgressCoordinator, ProgressStore, SystemClock, UserId,
};
use std::time::Instant;
use tracing::{debug, info};

/// Everything one console session works with.
pub struct AppState {
    pub coordinator: ProgressCoordinator<SqliteRepository>,
    pub content: ContentLoader,
    pub voice: ConsoleVoice,
    pub user_id: UserId,
    /// When the question on screen was asked.
    pub asked_at: Option<Instant>,
}

impl AppState {
    /// Build the state with the wall clock, honoring the stored reset hour.
    pub fn new(repository: SqliteRepository, config: &AppConfig) -> Result<Self, DbError> {
        let settings = effective_settings(&repository, config)?;
        let clock = SystemClock::new(settings.daily_reset_hour);
        Ok(Self::assemble(repository, config, &settings, Box::new(clock)))
    }

    pub fn with_clock(
        repository: SqliteRepository,
        config: &AppConfig,
        clock: Box<dyn Clock>,
    ) -> Result<Self, DbError> {
        let settings = effective_settings(&repository, config)?;
        Ok(Self::assemble(repository, config, &settings, clock))
    }

    fn assemble(
        repository: SqliteRepository,
        config: &AppConfig,
        settings: &DrillSettings,
        clock: Box<dyn Clock>,
    ) -> Self {
        let mut store = ProgressStore::new(repository, clock);
        store.subscribe(|event, _| match serde_json::to_string(event) {
            Ok(json) => debug!("progress event {}", json),
            Err(e) => debug!("progress event {:?} ({})", event, e),
        });
        store.load(config.user_id);

        info!(
            "ready for user {} (threshold {}, {} points per answer)",
            config.user_id, settings.acceptance_threshold, settings.points_per_correct
        );

        Self {
            coordinator: ProgressCoordinator::new(store, settings),
            content: ContentLoader::new(&config.content_dir),
            voice: ConsoleVoice {
                word_boundaries: config.word_boundaries,
            },
            user_id: config.user_id,
            asked_at: None,
        }
    }

    pub fn repository(&self) -> &SqliteRepository {
        self.coordinator.store().backend()
    }
}

/// Stored settings with the environment overrides applied and saved back.
fn effective_settings(
    repository: &SqliteRepository,
    config: &AppConfig,
) -> Result<DrillSettings, DbError> {
    let mut settings = repository.get_settings()?;
    let stored = settings.clone();

    if let Some(threshold) = config.threshold {
        settings.acceptance_threshold = threshold;
    }
    if let Some(points) = config.points {
        settings.points_per_correct = points;
    }

    if settings != stored {
        repository.save_settings(&settings)?;
        info!("saved settings from the environment");
    }
    Ok(settings)
}
