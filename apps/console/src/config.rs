//! Runtime configuration from the environment.

use anyhow::{Context, Result};
use drill_core::UserId;
use std::path::PathBuf;

pub const DB_PATH_VAR: &str = "DRILL_DB_PATH";
pub const CONTENT_DIR_VAR: &str = "DRILL_CONTENT_DIR";
pub const USER_ID_VAR: &str = "DRILL_USER_ID";
pub const THRESHOLD_VAR: &str = "DRILL_THRESHOLD";
pub const POINTS_VAR: &str = "DRILL_POINTS";
pub const WORD_BOUNDARIES_VAR: &str = "DRILL_WORD_BOUNDARIES";

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub content_dir: PathBuf,
    pub user_id: UserId,
    /// Overrides the stored acceptance threshold when set.
    pub threshold: Option<f64>,
    /// Overrides the stored points per correct answer when set.
    pub points: Option<u32>,
    /// Have the console voice report a boundary for every spoken word.
    pub word_boundaries: bool,
}

impl AppConfig {
    /// Read the process environment. `run` loads `.env` into it first.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let db_path = lookup(DB_PATH_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(default_db_path);
        let content_dir = lookup(CONTENT_DIR_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("modules"));

        let user_id = match lookup(USER_ID_VAR) {
            Some(raw) => raw
                .trim()
                .parse()
                .with_context(|| format!("{} must be a number, got {:?}", USER_ID_VAR, raw))?,
            None => 1,
        };

        let threshold = match lookup(THRESHOLD_VAR) {
            Some(raw) => {
                let value: f64 = raw
                    .trim()
                    .parse()
                    .with_context(|| format!("{} must be a number, got {:?}", THRESHOLD_VAR, raw))?;
                anyhow::ensure!(
                    (0.0..=1.0).contains(&value),
                    "{} must be between 0 and 1, got {}",
                    THRESHOLD_VAR,
                    value
                );
                Some(value)
            }
            None => None,
        };

        let points = lookup(POINTS_VAR)
            .map(|raw| {
                raw.trim()
                    .parse::<u32>()
                    .with_context(|| format!("{} must be a whole number, got {:?}", POINTS_VAR, raw))
            })
            .transpose()?;

        let word_boundaries = match lookup(WORD_BOUNDARIES_VAR) {
            Some(raw) => parse_flag(&raw)
                .with_context(|| format!("{} must be true or false, got {:?}", WORD_BOUNDARIES_VAR, raw))?,
            None => false,
        };

        Ok(Self {
            db_path,
            content_dir,
            user_id,
            threshold,
            points,
            word_boundaries,
        })
    }
}

fn parse_flag(raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => anyhow::bail!("unrecognized flag value {:?}", other),
    }
}

fn default_db_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("speaking-drill")
        .join("progress.db")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<AppConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]).unwrap();
        assert_eq!(config.content_dir, PathBuf::from("modules"));
        assert_eq!(config.user_id, 1);
        assert_eq!(config.threshold, None);
        assert_eq!(config.points, None);
        assert!(!config.word_boundaries);
        assert!(config.db_path.ends_with("speaking-drill/progress.db"));
    }

    #[test]
    fn test_overrides() {
        let config = config(&[
            (DB_PATH_VAR, "/tmp/drill.db"),
            (CONTENT_DIR_VAR, "content"),
            (USER_ID_VAR, " 42 "),
            (THRESHOLD_VAR, "0.85"),
            (POINTS_VAR, "5"),
            (WORD_BOUNDARIES_VAR, "TRUE"),
        ])
        .unwrap();

        assert_eq!(
            config,
            AppConfig {
                db_path: PathBuf::from("/tmp/drill.db"),
                content_dir: PathBuf::from("content"),
                user_id: 42,
                threshold: Some(0.85),
                points: Some(5),
                word_boundaries: true,
            }
        );
    }

    #[test]
    fn test_invalid_values_are_errors() {
        assert!(config(&[(USER_ID_VAR, "abc")]).is_err());
        assert!(config(&[(THRESHOLD_VAR, "1.2")]).is_err());
        assert!(config(&[(POINTS_VAR, "-3")]).is_err());
        assert!(config(&[(WORD_BOUNDARIES_VAR, "maybe")]).is_err());
    }

    #[test]
    fn test_from_env_reads_only_the_process_environment() {
        // read first, so a `.env` loaded by `from_env` would show up as a difference
        let direct = AppConfig::from_lookup(|name| std::env::var(name).ok()).unwrap();
        assert_eq!(AppConfig::from_env().unwrap(), direct);
    }

    #[test]
    fn test_word_boundary_flag_spellings() {
        for raw in ["1", "true", " yes ", "On"] {
            assert!(config(&[(WORD_BOUNDARIES_VAR, raw)]).unwrap().word_boundaries, "{raw:?}");
        }
        for raw in ["0", "false", "no", "off", ""] {
            assert!(!config(&[(WORD_BOUNDARIES_VAR, raw)]).unwrap().word_boundaries, "{raw:?}");
        }
    }
}
