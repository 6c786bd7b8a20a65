//! Progress views.

use crate::state::AppState;
use std::io::Write;

use super::CommandError;

/// Days shown in the activity overview.
const OVERVIEW_DAYS: usize = 7;

/// Today's activity per module and the recent daily totals.
pub fn overview<W: Write>(state: &mut AppState, out: &mut W) -> Result<(), CommandError> {
    let store = state.coordinator.store();
    store.log_summary(None);

    let today = store.today_activity();
    writeln!(out, "Today ({}):", store.today())?;
    if today.is_empty() {
        writeln!(out, "  no practice yet")?;
    }
    for entry in &today {
        let minutes = entry.activity.time_spent.unwrap_or(0) / 60;
        writeln!(
            out,
            "  {}: {} answered, {} correct, {} min",
            entry.module_id, entry.activity.questions_answered, entry.activity.correct_answers, minutes
        )?;
    }

    let by_date = store.activity_by_date();
    if !by_date.is_empty() {
        writeln!(out, "Recent days:")?;
        for (date, totals) in by_date.iter().rev().take(OVERVIEW_DAYS) {
            writeln!(
                out,
                "  {}: {} answered, {}% correct",
                date,
                totals.questions_answered,
                totals.accuracy_percent()
            )?;
        }
    }
    Ok(())
}

pub fn module_stats<W: Write>(
    state: &mut AppState,
    out: &mut W,
    module_id: &str,
) -> Result<(), CommandError> {
    let store = state.coordinator.store();
    store.log_summary(Some(module_id));

    let Some(module) = store.module_progress(module_id) else {
        writeln!(out, "No progress for module {} yet.", module_id)?;
        return Ok(());
    };

    writeln!(out, "{}:", module_id)?;
    writeln!(
        out,
        "  answered {}/{}, correct {} ({}%), score {}",
        module.answered_questions,
        module.total_questions,
        module.correct_answers,
        module.accuracy(),
        module.score
    )?;
    match module.completed_date {
        Some(date) => writeln!(out, "  completed on {}", date)?,
        None => writeln!(out, "  in progress")?,
    }
    writeln!(out, "  last practiced {}", module.last_access_date)?;
    Ok(())
}

pub fn history<W: Write>(
    state: &mut AppState,
    out: &mut W,
    module_id: &str,
) -> Result<(), CommandError> {
    let sessions = state.coordinator.store().session_history(module_id);
    if sessions.is_empty() {
        writeln!(out, "No activity recorded for module {}.", module_id)?;
        return Ok(());
    }

    for session in sessions {
        writeln!(
            out,
            "  {}: {} answered, {} correct",
            session.date, session.questions_answered, session.correct_answers
        )?;
    }
    Ok(())
}

/// Delete the learner's record and start again with an empty one.
pub fn clear<W: Write>(state: &mut AppState, out: &mut W) -> Result<(), CommandError> {
    state.coordinator.clear_progress(state.user_id);
    state.asked_at = None;
    writeln!(out, "All progress cleared. Open a module to start again.")?;
    Ok(())
}

pub fn export<W: Write>(state: &mut AppState, out: &mut W) -> Result<(), CommandError> {
    match state.coordinator.store().progress() {
        Some(progress) => writeln!(out, "{}", serde_json::to_string_pretty(progress)?)?,
        None => writeln!(out, "No progress loaded.")?,
    }
    Ok(())
}
