//! Repository pattern for database access.

use crate::db::error::DbError;
use crate::db::schema::{INIT_GLOBAL_SETTINGS, SCHEMA, SCHEMA_VERSION};
use chrono::Utc;
use drill_core::{BackendError, DrillSettings, EditMetric, ProgressBackend};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

type Result<T> = std::result::Result<T, DbError>;

/// Repository for settings operations.
pub trait SettingsRepository {
    fn get_settings(&self) -> Result<DrillSettings>;
    fn save_settings(&self, settings: &DrillSettings) -> Result<()>;
}

/// SQLite implementation of repositories.
pub struct SqliteRepository {
    conn: Connection,
}

impl SqliteRepository {
    /// Open database at path, creating if necessary.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let repo = Self { conn };
        repo.initialize()?;
        Ok(repo)
    }

    /// Open in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let repo = Self { conn };
        repo.initialize()?;
        Ok(repo)
    }

    fn initialize(&self) -> Result<()> {
        self.conn.execute_batch(SCHEMA)?;
        self.conn.execute_batch(INIT_GLOBAL_SETTINGS)?;
        self.conn.execute(
            "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
            params![SCHEMA_VERSION],
        )?;
        Ok(())
    }

    pub fn schema_version(&self) -> Result<i32> {
        self.conn
            .query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))
            .map_err(Into::into)
    }

    pub fn get_record(&self, key: &str) -> Result<Option<String>> {
        self.conn
            .query_row(
                "SELECT payload FROM progress_records WHERE storage_key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .map_err(Into::into)
    }

    pub fn put_record(&self, key: &str, payload: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO progress_records (storage_key, payload, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(storage_key) DO UPDATE SET payload = excluded.payload, updated_at = excluded.updated_at",
            params![key, payload, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    pub fn delete_record(&self, key: &str) -> Result<usize> {
        let removed = self
            .conn
            .execute("DELETE FROM progress_records WHERE storage_key = ?1", params![key])?;
        Ok(removed)
    }

    /// Keys of all stored progress records, sorted.
    pub fn record_keys(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT storage_key FROM progress_records ORDER BY storage_key")?;
        let keys = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;
        Ok(keys)
    }
}

impl ProgressBackend for SqliteRepository {
    fn read(&self, key: &str) -> std::result::Result<Option<String>, BackendError> {
        self.get_record(key)
            .map_err(|e| BackendError::Unavailable(e.to_string()))
    }

    fn write(&self, key: &str, payload: &str) -> std::result::Result<(), BackendError> {
        self.put_record(key, payload).map_err(|e| BackendError::Write {
            key: key.to_string(),
            reason: e.to_string(),
        })
    }

    fn remove(&self, key: &str) -> std::result::Result<(), BackendError> {
        self.delete_record(key)
            .map(|_| ())
            .map_err(|e| BackendError::Write {
                key: key.to_string(),
                reason: e.to_string(),
            })
    }
}

impl SettingsRepository for SqliteRepository {
    fn get_settings(&self) -> Result<DrillSettings> {
        self.conn
            .query_row(
                "SELECT acceptance_threshold, points_per_correct, edit_metric, daily_reset_hour FROM global_settings WHERE id = 1",
                [],
                |row| {
                    let metric_str: String = row.get(2)?;

                    Ok(DrillSettings {
                        acceptance_threshold: row.get(0)?,
                        points_per_correct: row.get(1)?,
                        edit_metric: EditMetric::from_str(&metric_str).unwrap_or_default(),
                        daily_reset_hour: row.get(3)?,
                    })
                },
            )
            .map_err(Into::into)
    }

    fn save_settings(&self, settings: &DrillSettings) -> Result<()> {
        if !(0.0..=1.0).contains(&settings.acceptance_threshold) {
            return Err(DbError::InvalidData(format!(
                "acceptance threshold {} is outside 0..=1",
                settings.acceptance_threshold
            )));
        }
        if settings.daily_reset_hour > 23 {
            return Err(DbError::InvalidData(format!(
                "daily reset hour {} is outside 0..=23",
                settings.daily_reset_hour
            )));
        }

        self.conn.execute(
            "UPDATE global_settings SET acceptance_threshold = ?1, points_per_correct = ?2, edit_metric = ?3, daily_reset_hour = ?4 WHERE id = 1",
            params![
                settings.acceptance_threshold,
                settings.points_per_correct,
                settings.edit_metric.as_str(),
                settings.daily_reset_hour,
            ],
        )?;

        Ok(())
    }
}
