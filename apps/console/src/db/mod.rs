//! Local SQLite database for progress records and settings.

pub mod error;
pub mod repository;
pub mod schema;

pub use error::DbError;
pub use repository::{SettingsRepository, SqliteRepository};
