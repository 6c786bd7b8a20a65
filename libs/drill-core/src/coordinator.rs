//! Ties dialog sessions to the progress ledger.
//!
//! A module activation resumes where the stored progress left off, every
//! validated answer is recorded, and the move to the next question waits for
//! the end-of-playback callback of whatever speaks the feedback.

use crate::matching::AnswerValidator;
use crate::progress::{ProgressBackend, ProgressStore};
use crate::session::DialogSession;
use crate::types::{DialogItem, DrillSettings, ModuleContent, UserId};
use serde::Serialize;
use tracing::{debug, info};

const CORRECT_REPLY: &str = "Great!";
const FINISHED_REPLY: &str = "Congratulations! You finished this module.";

/// Lifecycle callbacks from the speech synthesis collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackEvent {
    Started,
    Boundary,
    Finished,
}

/// A question ready to be spoken.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prompt {
    /// 1-based position within the module.
    pub number: usize,
    pub total: usize,
    pub question: String,
    pub translation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum DrillStep {
    Ask(Prompt),
    Finished { score: u32 },
}

impl DrillStep {
    /// Text handed to the speech synthesizer.
    pub fn speech(&self) -> &str {
        match self {
            Self::Ask(prompt) => &prompt.question,
            Self::Finished { .. } => FINISHED_REPLY,
        }
    }
}

/// Where an activated module picks up.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResumePoint {
    pub module_id: String,
    /// Items already answered, and so skipped.
    pub resumed_at: usize,
    pub total: usize,
    pub score: u32,
    pub completed: bool,
}

/// Verdict on one spoken answer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnswerFeedback {
    pub is_correct: bool,
    pub similarity: f64,
    pub points_awarded: u32,
    /// Displayed score after this answer.
    pub score: u32,
    /// Text to speak back to the learner.
    pub reply: String,
    /// Primary accepted answer of the item.
    pub expected: String,
}

#[derive(Debug)]
struct ActiveDrill {
    session: DialogSession,
    current: Option<DialogItem>,
    score: u32,
    advance_pending: bool,
}

/// Owns the progress store and the session of the module being practiced.
pub struct ProgressCoordinator<B: ProgressBackend> {
    store: ProgressStore<B>,
    validator: AnswerValidator,
    points_per_correct: u32,
    active: Option<ActiveDrill>,
    speaking: bool,
}

impl<B: ProgressBackend> ProgressCoordinator<B> {
    pub fn new(store: ProgressStore<B>, settings: &DrillSettings) -> Self {
        Self {
            store,
            validator: AnswerValidator::from_settings(settings),
            points_per_correct: settings.points_per_correct,
            active: None,
            speaking: false,
        }
    }

    pub fn store(&self) -> &ProgressStore<B> {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut ProgressStore<B> {
        &mut self.store
    }

    pub fn validator(&self) -> &AnswerValidator {
        &self.validator
    }

    pub fn points_per_correct(&self) -> u32 {
        self.points_per_correct
    }

    /// Swap in new threshold, metric and points. Takes effect on the next answer.
    pub fn apply_settings(&mut self, settings: &DrillSettings) {
        self.validator = AnswerValidator::from_settings(settings);
        self.points_per_correct = settings.points_per_correct;
    }

    pub fn active_module_id(&self) -> Option<&str> {
        self.active.as_ref().map(|a| a.session.module_id())
    }

    /// Displayed score of the active module.
    pub fn score(&self) -> u32 {
        self.active.as_ref().map_or(0, |a| a.score)
    }

    pub fn is_speaking(&self) -> bool {
        self.speaking
    }

    /// Open a module and move past the questions already answered.
    ///
    /// Assumes the module's items are in the same order as when the progress
    /// was recorded.
    pub fn activate_module(&mut self, content: ModuleContent) -> ResumePoint {
        let module_id = content.module_id.clone();
        let mut session = DialogSession::new(content);
        let total = session.total_questions();

        self.store
            .initialize_module(&module_id, u32::try_from(total).unwrap_or(u32::MAX));

        let (answered, score, completed) = self
            .store
            .module_progress(&module_id)
            .map_or((0, 0, false), |m| {
                (m.answered_questions as usize, m.score, m.is_completed())
            });

        if answered > 0 {
            session.skip_to_question(answered);
            info!(
                "resuming module {} at question {} of {} with score {}",
                module_id,
                session.current_question_number(),
                total,
                score
            );
        } else {
            info!("starting module {} ({} questions)", module_id, total);
        }

        let resumed_at = session.current_question_number();
        self.active = Some(ActiveDrill {
            session,
            current: None,
            score,
            advance_pending: false,
        });
        self.speaking = false;

        ResumePoint {
            module_id,
            resumed_at,
            total,
            score,
            completed,
        }
    }

    /// Pull the next item. `None` when no module is active.
    pub fn next_question(&mut self) -> Option<DrillStep> {
        let active = self.active.as_mut()?;
        active.advance_pending = false;

        let step = match active.session.get_next().cloned() {
            Some(item) => {
                let prompt = Prompt {
                    number: active.session.current_question_number(),
                    total: active.session.total_questions(),
                    question: item.question.clone(),
                    translation: item.translation.clone(),
                };
                active.current = Some(item);
                DrillStep::Ask(prompt)
            }
            None => {
                active.current = None;
                DrillStep::Finished {
                    score: active.score,
                }
            }
        };
        Some(step)
    }

    /// Validate a recognized answer against the current item and record it.
    ///
    /// Returns `None` when there is no question waiting for an answer,
    /// including while the feedback for the previous answer is still pending.
    pub fn submit_answer(&mut self, text: &str) -> Option<AnswerFeedback> {
        let active = self.active.as_mut()?;
        if active.advance_pending {
            debug!("answer ignored while waiting for playback to finish");
            return None;
        }
        let item = active.current.as_ref()?;

        let result = self
            .validator
            .evaluate(text, item.expected_answers.as_slice());
        let expected = item.expected_answers.primary().to_string();
        let points_awarded = if result.is_correct {
            self.points_per_correct
        } else {
            0
        };

        active.score += points_awarded;
        active.advance_pending = true;
        let module_id = active.session.module_id().to_string();
        let score = active.score;

        self.store
            .record_answer(&module_id, result.is_correct, self.points_per_correct);

        let reply = if result.is_correct {
            CORRECT_REPLY.to_string()
        } else {
            format!("Not quite. The answer is: {}", expected)
        };

        Some(AnswerFeedback {
            is_correct: result.is_correct,
            similarity: result.similarity,
            points_awarded,
            score,
            reply,
            expected,
        })
    }

    /// React to a playback callback. The end of the feedback playback moves
    /// on to the next question.
    pub fn handle_playback(&mut self, event: PlaybackEvent) -> Option<DrillStep> {
        match event {
            PlaybackEvent::Started => {
                self.speaking = true;
                None
            }
            PlaybackEvent::Boundary => None,
            PlaybackEvent::Finished => {
                self.speaking = false;
                let pending = self.active.as_ref().is_some_and(|a| a.advance_pending);
                if pending {
                    self.next_question()
                } else {
                    None
                }
            }
        }
    }

    /// Primary answer of the question on screen, for reading it aloud.
    pub fn correct_answer(&self) -> Option<&str> {
        self.active
            .as_ref()?
            .current
            .as_ref()
            .map(|item| item.expected_answers.primary())
    }

    /// Start the active module over, in storage and in the session.
    pub fn reset_module(&mut self) -> bool {
        let Some(active) = self.active.as_mut() else {
            return false;
        };

        active.session.reset();
        active.current = None;
        active.score = 0;
        active.advance_pending = false;
        let module_id = active.session.module_id().to_string();
        self.store.reset_module(&module_id)
    }

    /// Delete the learner's stored progress, start an empty record and close
    /// the active module.
    pub fn clear_progress(&mut self, user_id: UserId) {
        self.active = None;
        self.speaking = false;
        self.store.clear_user_progress(user_id);
        self.store.load(user_id);
    }
}
