//! Settings commands.

use crate::db::SettingsRepository;
use crate::state::AppState;
use drill_core::DrillSettings;
use std::io::Write;
use tracing::info;

use super::CommandError;

pub fn show<W: Write>(state: &mut AppState, out: &mut W) -> Result<(), CommandError> {
    let settings = state.repository().get_settings()?;
    writeln!(out, "  acceptance threshold: {}", settings.acceptance_threshold)?;
    writeln!(out, "  points per correct answer: {}", settings.points_per_correct)?;
    writeln!(out, "  edit metric: {}", settings.edit_metric.as_str())?;
    writeln!(out, "  day starts at: {:02}:00", settings.daily_reset_hour)?;
    Ok(())
}

pub fn set_threshold<W: Write>(
    state: &mut AppState,
    out: &mut W,
    threshold: f64,
) -> Result<(), CommandError> {
    if !(0.0..=1.0).contains(&threshold) {
        return Err(CommandError::new("the threshold must be between 0 and 1"));
    }
    update(state, |s| s.acceptance_threshold = threshold)?;
    writeln!(out, "Acceptance threshold set to {}.", threshold)?;
    Ok(())
}

pub fn set_points<W: Write>(
    state: &mut AppState,
    out: &mut W,
    points: u32,
) -> Result<(), CommandError> {
    update(state, |s| s.points_per_correct = points)?;
    writeln!(out, "Correct answers are now worth {} points.", points)?;
    Ok(())
}

/// Save changed settings and hand them to the coordinator.
fn update(state: &mut AppState, change: impl FnOnce(&mut DrillSettings)) -> Result<(), CommandError> {
    let mut settings = state.repository().get_settings()?;
    change(&mut settings);
    state.repository().save_settings(&settings)?;
    state.coordinator.apply_settings(&settings);
    info!(
        "settings updated: threshold {}, {} points",
        settings.acceptance_threshold, settings.points_per_correct
    );
    Ok(())
}
