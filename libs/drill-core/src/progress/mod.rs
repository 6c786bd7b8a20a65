//! Per-learner progress ledger with date-bucketed activity.
//!
//! Every mutation is written through to the backend and then announced to
//! the registered listeners. Nothing is buffered.

mod backend;

pub use backend::{MemoryBackend, ProgressBackend};

use crate::clock::Clock;
use crate::types::{ActivityTotals, ModuleProgress, SessionActivity, UserId, UserProgress};
use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Storage key of a learner's progress record.
pub fn storage_key(user_id: UserId) -> String {
    format!("user_progress_{}", user_id)
}

/// Change announced to listeners after it has been persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressEvent {
    Loaded { user_id: UserId, migrated: usize },
    ModuleInitialized { module_id: String },
    AnswerRecorded { module_id: String, is_correct: bool, points: u32 },
    ModuleCompleted { module_id: String, date: NaiveDate },
    TimeRecorded { module_id: String, seconds: u64 },
    ModuleReset { module_id: String },
    Cleared { user_id: UserId },
}

/// Handle returned by [`ProgressStore::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Box<dyn Fn(&ProgressEvent, Option<&UserProgress>) + Send>;

/// Activity of one module on a given day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleActivity {
    pub module_id: String,
    pub activity: SessionActivity,
}

/// Owns the loaded progress record of one learner.
pub struct ProgressStore<B: ProgressBackend> {
    backend: B,
    clock: Box<dyn Clock>,
    progress: Option<UserProgress>,
    /// Set while the stored record could not be read. Writing would replace
    /// it with whatever is in memory.
    read_failed: bool,
    listeners: Vec<(ListenerId, Listener)>,
    next_listener: u64,
}

impl<B: ProgressBackend> ProgressStore<B> {
    pub fn new(backend: B, clock: Box<dyn Clock>) -> Self {
        Self {
            backend,
            clock,
            progress: None,
            read_failed: false,
            listeners: Vec::new(),
            next_listener: 0,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// Register a listener for every persisted change.
    pub fn subscribe<F>(&mut self, listener: F) -> ListenerId
    where
        F: Fn(&ProgressEvent, Option<&UserProgress>) + Send + 'static,
    {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Returns false when the id was not registered.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
        self.listeners.len() != before
    }

    /// Load the learner's record, or start an empty one.
    ///
    /// Records that fail to parse are discarded. Modules stored without a
    /// score get a score of 0. The resulting record is written back straight
    /// away.
    ///
    /// When the backend cannot be read at all, an empty record is used in
    /// memory and nothing is written until a later load succeeds.
    pub fn load(&mut self, user_id: UserId) -> &UserProgress {
        let key = storage_key(user_id);
        self.read_failed = false;
        let (progress, migrated) = match self.backend.read(&key) {
            Ok(Some(payload)) => match decode(&payload) {
                Ok((mut progress, migrated)) => {
                    if progress.user_id != user_id {
                        warn!(
                            "record under {} belongs to user {}, reassigning",
                            key, progress.user_id
                        );
                        progress.user_id = user_id;
                    }
                    (progress, migrated)
                }
                Err(e) => {
                    warn!("discarding corrupt progress record {}: {}", key, e);
                    (UserProgress::new(user_id), 0)
                }
            },
            Ok(None) => (UserProgress::new(user_id), 0),
            Err(e) => {
                warn!(
                    "could not read progress record {}: {}; changes stay in memory",
                    key, e
                );
                self.read_failed = true;
                (UserProgress::new(user_id), 0)
            }
        };

        if migrated > 0 {
            info!("migrated {} module record(s) without a score for user {}", migrated, user_id);
        }

        self.progress = Some(progress);
        self.persist();
        self.emit(ProgressEvent::Loaded { user_id, migrated });
        self.progress.get_or_insert_with(|| UserProgress::new(user_id))
    }

    pub fn progress(&self) -> Option<&UserProgress> {
        self.progress.as_ref()
    }

    /// Create progress for a module on first activation, otherwise refresh its
    /// last access date. Returns false when no record is loaded.
    pub fn initialize_module(&mut self, module_id: &str, total_questions: u32) -> bool {
        let today = self.clock.today();
        let Some(progress) = self.progress.as_mut() else {
            debug!("no progress loaded, cannot initialize module {}", module_id);
            return false;
        };

        match progress.modules.get_mut(module_id) {
            Some(module) => module.last_access_date = today,
            None => {
                info!("starting progress for module {} ({} questions)", module_id, total_questions);
                progress.modules.insert(
                    module_id.to_string(),
                    ModuleProgress::new(module_id, total_questions, today),
                );
            }
        }

        self.persist();
        self.emit(ProgressEvent::ModuleInitialized {
            module_id: module_id.to_string(),
        });
        true
    }

    /// Count one answer. Does nothing (false) when the module has no progress.
    pub fn record_answer(&mut self, module_id: &str, is_correct: bool, points: u32) -> bool {
        let today = self.clock.today();
        let Some(module) = self.module_mut(module_id) else {
            debug!("no progress for module {}, answer not recorded", module_id);
            return false;
        };

        module.answered_questions += 1;
        if is_correct {
            module.correct_answers += 1;
            module.score += points;
        }

        let newly_completed =
            module.answered_questions >= module.total_questions && module.completed_date.is_none();
        if newly_completed {
            module.completed_date = Some(today);
        }

        let session = session_on(&mut module.sessions, today);
        session.questions_answered += 1;
        if is_correct {
            session.correct_answers += 1;
        }

        debug!(
            "module {}: answered={}/{}, score={}, correct={}",
            module_id,
            module.answered_questions,
            module.total_questions,
            module.score,
            module.correct_answers
        );
        if newly_completed {
            info!("module {} completed", module_id);
        }

        self.persist();
        self.emit(ProgressEvent::AnswerRecorded {
            module_id: module_id.to_string(),
            is_correct,
            points: if is_correct { points } else { 0 },
        });
        if newly_completed {
            self.emit(ProgressEvent::ModuleCompleted {
                module_id: module_id.to_string(),
                date: today,
            });
        }
        true
    }

    /// Add practice time to today's activity for the module.
    pub fn record_time_spent(&mut self, module_id: &str, seconds: u64) -> bool {
        let today = self.clock.today();
        let Some(module) = self.module_mut(module_id) else {
            return false;
        };

        let session = session_on(&mut module.sessions, today);
        session.time_spent = Some(session.time_spent.unwrap_or(0) + seconds);

        self.persist();
        self.emit(ProgressEvent::TimeRecorded {
            module_id: module_id.to_string(),
            seconds,
        });
        true
    }

    /// Start the module over.
    ///
    /// Only today's activity entry is dropped; earlier days keep their counts
    /// even though the module totals go back to zero.
    pub fn reset_module(&mut self, module_id: &str) -> bool {
        let today = self.clock.today();
        let Some(module) = self.module_mut(module_id) else {
            return false;
        };

        module.answered_questions = 0;
        module.correct_answers = 0;
        module.score = 0;
        module.completed_date = None;
        module.last_access_date = today;

        let before = module.sessions.len();
        module.sessions.retain(|s| s.date != today);
        if module.sessions.len() != before {
            debug!("cleared today's activity for module {}", module_id);
        }

        info!("module {} reset", module_id);
        self.persist();
        self.emit(ProgressEvent::ModuleReset {
            module_id: module_id.to_string(),
        });
        true
    }

    /// Delete the learner's stored record and unload it.
    pub fn clear_user_progress(&mut self, user_id: UserId) {
        let key = storage_key(user_id);
        if let Err(e) = self.backend.remove(&key) {
            warn!("could not remove progress record {}: {}", key, e);
        }
        self.progress = None;
        info!("cleared progress for user {}", user_id);
        self.emit(ProgressEvent::Cleared { user_id });
    }

    pub fn module_progress(&self, module_id: &str) -> Option<&ModuleProgress> {
        self.progress.as_ref()?.modules.get(module_id)
    }

    /// Score of the module, 0 when it has no progress.
    pub fn module_score(&self, module_id: &str) -> u32 {
        self.module_progress(module_id).map_or(0, |m| m.score)
    }

    pub fn today_activity(&self) -> Vec<ModuleActivity> {
        self.activity_for_date(self.clock.today())
    }

    /// Activity of every module on `date`.
    pub fn activity_for_date(&self, date: NaiveDate) -> Vec<ModuleActivity> {
        let Some(progress) = &self.progress else {
            return Vec::new();
        };

        progress
            .modules
            .iter()
            .filter_map(|(module_id, module)| {
                module.session_on(date).map(|activity| ModuleActivity {
                    module_id: module_id.clone(),
                    activity: activity.clone(),
                })
            })
            .collect()
    }

    /// Answer counts per day, summed across modules.
    pub fn activity_by_date(&self) -> BTreeMap<NaiveDate, ActivityTotals> {
        let mut totals: BTreeMap<NaiveDate, ActivityTotals> = BTreeMap::new();
        if let Some(progress) = &self.progress {
            for module in progress.modules.values() {
                for session in &module.sessions {
                    totals.entry(session.date).or_default().add(session);
                }
            }
        }
        totals
    }

    /// All activity entries of a module, oldest first.
    pub fn session_history(&self, module_id: &str) -> Vec<SessionActivity> {
        let mut sessions = self
            .module_progress(module_id)
            .map(|m| m.sessions.clone())
            .unwrap_or_default();
        sessions.sort_by_key(|s| s.date);
        sessions
    }

    /// Dump the ledger (or one module of it) at debug level.
    pub fn log_summary(&self, module_id: Option<&str>) {
        let Some(progress) = &self.progress else {
            debug!("no progress data loaded");
            return;
        };

        match module_id {
            Some(id) => match progress.modules.get(id) {
                Some(m) => debug!(
                    "module {}: total={} answered={} correct={} score={} accuracy={}% sessions={}",
                    id,
                    m.total_questions,
                    m.answered_questions,
                    m.correct_answers,
                    m.score,
                    m.accuracy(),
                    m.sessions.len()
                ),
                None => debug!("no progress for module {}", id),
            },
            None => {
                for (id, m) in &progress.modules {
                    debug!(
                        "{}: {}/{} ({} points)",
                        id, m.answered_questions, m.total_questions, m.score
                    );
                }
            }
        }
    }

    fn module_mut(&mut self, module_id: &str) -> Option<&mut ModuleProgress> {
        self.progress.as_mut()?.modules.get_mut(module_id)
    }

    fn persist(&self) {
        let Some(progress) = &self.progress else {
            return;
        };

        let key = storage_key(progress.user_id);
        if self.read_failed {
            debug!("not writing {} until it has been read", key);
            return;
        }
        match serde_json::to_string(progress) {
            Ok(payload) => {
                if let Err(e) = self.backend.write(&key, &payload) {
                    warn!("failed to persist progress {}: {}", key, e);
                }
            }
            Err(e) => warn!("failed to serialize progress {}: {}", key, e),
        }
    }

    fn emit(&self, event: ProgressEvent) {
        for (_, listener) in &self.listeners {
            listener(&event, self.progress.as_ref());
        }
    }
}

/// Parse a stored record, giving a score of 0 to modules that lack one.
fn decode(payload: &str) -> Result<(UserProgress, usize), serde_json::Error> {
    let mut value: Value = serde_json::from_str(payload)?;
    let mut migrated = 0;

    if let Some(modules) = value.get_mut("modules").and_then(Value::as_object_mut) {
        for module in modules.values_mut() {
            if let Some(fields) = module.as_object_mut() {
                if fields.get("score").map_or(true, Value::is_null) {
                    fields.insert("score".to_string(), Value::from(0));
                    migrated += 1;
                }
            }
        }
    }

    let progress = serde_json::from_value(value)?;
    Ok((progress, migrated))
}

/// Today's entry, created when missing.
fn session_on(sessions: &mut Vec<SessionActivity>, date: NaiveDate) -> &mut SessionActivity {
    let index = match sessions.iter().position(|s| s.date == date) {
        Some(index) => index,
        None => {
            sessions.push(SessionActivity::new(date));
            sessions.len() - 1
        }
    };
    &mut sessions[index]
}

#[cfg(test)]
mod tests;
