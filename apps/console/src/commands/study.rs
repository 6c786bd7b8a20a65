//! Drill commands: opening modules, answering, hints and resets.

use crate::state::AppState;
use drill_core::DrillStep;
use std::io::Write;
use std::time::Instant;
use tracing::debug;

use super::CommandError;

/// List modules in the content directory with the learner's score.
pub fn list_modules<W: Write>(state: &mut AppState, out: &mut W) -> Result<(), CommandError> {
    let modules = state.content.available_modules();
    if modules.is_empty() {
        writeln!(out, "No modules found in {}", state.content.dir().display())?;
        return Ok(());
    }

    let store = state.coordinator.store();
    for module_id in modules {
        match store.module_progress(&module_id) {
            Some(m) if m.is_completed() => {
                writeln!(out, "  {} (completed, {} points)", module_id, m.score)?
            }
            Some(m) => writeln!(
                out,
                "  {} ({}/{} answered, {} points)",
                module_id, m.answered_questions, m.total_questions, m.score
            )?,
            None => writeln!(out, "  {}", module_id)?,
        }
    }
    Ok(())
}

/// Activate a module and ask its next unanswered question.
pub fn open_module<W: Write>(
    state: &mut AppState,
    out: &mut W,
    module_id: &str,
) -> Result<(), CommandError> {
    record_elapsed(state);

    let content = state.content.load_or_default(module_id);
    let title = content.display_title().to_string();
    let resume = state.coordinator.activate_module(content);

    if resume.module_id != module_id {
        writeln!(
            out,
            "Module {} is not available, practicing the default drill instead.",
            module_id
        )?;
    }
    writeln!(out, "== {} ==", title)?;
    if resume.completed {
        writeln!(
            out,
            "You already completed this module with {} points. Use :reset to practice it again.",
            resume.score
        )?;
    } else if resume.resumed_at > 0 {
        writeln!(
            out,
            "Resuming at question {} of {} with {} points.",
            resume.resumed_at + 1,
            resume.total,
            resume.score
        )?;
    }

    ask_next(state, out)
}

/// Check a spoken answer, speak the feedback and move on once it is spoken.
pub fn answer<W: Write>(state: &mut AppState, out: &mut W, text: &str) -> Result<(), CommandError> {
    let Some(feedback) = state.coordinator.submit_answer(text) else {
        writeln!(out, "No question is waiting for an answer. Use :open <module> first.")?;
        return Ok(());
    };
    record_elapsed(state);

    if feedback.is_correct {
        writeln!(
            out,
            "Correct! +{} ({:.0}% match, {} points)",
            feedback.points_awarded,
            feedback.similarity * 100.0,
            feedback.score
        )?;
    } else {
        writeln!(
            out,
            "Incorrect ({:.0}% match). Expected: {}",
            feedback.similarity * 100.0,
            feedback.expected
        )?;
    }

    let AppState {
        coordinator, voice, ..
    } = state;
    let mut next = None;
    voice.speak(out, &feedback.reply, |event| {
        if let Some(step) = coordinator.handle_playback(event) {
            next = Some(step);
        }
    })?;

    match next {
        Some(step) => present(state, out, step),
        None => Ok(()),
    }
}

/// Speak the expected answer of the current question.
pub fn hint<W: Write>(state: &mut AppState, out: &mut W) -> Result<(), CommandError> {
    let Some(expected) = state.coordinator.correct_answer().map(str::to_string) else {
        writeln!(out, "There is no question to give a hint for.")?;
        return Ok(());
    };
    speak(state, out, &expected)
}

/// Start the active module over.
pub fn reset<W: Write>(state: &mut AppState, out: &mut W) -> Result<(), CommandError> {
    let Some(module_id) = state.coordinator.active_module_id().map(str::to_string) else {
        writeln!(out, "Open a module before resetting it.")?;
        return Ok(());
    };

    state.asked_at = None;
    if !state.coordinator.reset_module() {
        return Err(CommandError::new(format!("could not reset module {}", module_id)));
    }
    writeln!(out, "Module {} reset.", module_id)?;
    ask_next(state, out)
}

fn ask_next<W: Write>(state: &mut AppState, out: &mut W) -> Result<(), CommandError> {
    match state.coordinator.next_question() {
        Some(step) => present(state, out, step),
        None => Ok(()),
    }
}

fn present<W: Write>(state: &mut AppState, out: &mut W, step: DrillStep) -> Result<(), CommandError> {
    match &step {
        DrillStep::Ask(prompt) => {
            writeln!(out, "[{}/{}] {}", prompt.number, prompt.total, prompt.question)?;
            if let Some(translation) = &prompt.translation {
                writeln!(out, "      ({})", translation)?;
            }
            state.asked_at = Some(Instant::now());
        }
        DrillStep::Finished { score } => {
            writeln!(out, "Module finished! Final score: {}", score)?;
            state.asked_at = None;
        }
    }
    speak(state, out, step.speech())
}

/// Speak text that does not move the drill forward.
fn speak<W: Write>(state: &mut AppState, out: &mut W, text: &str) -> Result<(), CommandError> {
    let AppState {
        coordinator, voice, ..
    } = state;
    voice.speak(out, text, |event| {
        if let Some(step) = coordinator.handle_playback(event) {
            debug!("unexpected advance while speaking: {:?}", step);
        }
    })?;
    Ok(())
}

/// Add the time spent on the question on screen to today's activity.
fn record_elapsed(state: &mut AppState) {
    let Some(asked_at) = state.asked_at.take() else {
        return;
    };
    let Some(module_id) = state.coordinator.active_module_id().map(str::to_string) else {
        return;
    };
    let seconds = asked_at.elapsed().as_secs();
    if seconds > 0 {
        state
            .coordinator
            .store_mut()
            .record_time_spent(&module_id, seconds);
    }
}
