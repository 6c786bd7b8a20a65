//! Core types for drill content, progress records and settings.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Identifier of the learner a progress record belongs to.
pub type UserId = u64;

/// Non-empty ordered collection of acceptable answer forms.
///
/// Content may spell the answer as a single string or as a list; both become
/// this type at the deserialization boundary. An empty list is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "AnswerField", into = "Vec<String>")]
pub struct ExpectedAnswers(Vec<String>);

#[derive(Deserialize)]
#[serde(untagged)]
enum AnswerField {
    One(String),
    Many(Vec<String>),
}

impl ExpectedAnswers {
    /// Build from a list of forms. Returns `None` when the list is empty.
    pub fn new(forms: Vec<String>) -> Option<Self> {
        if forms.is_empty() {
            None
        } else {
            Some(Self(forms))
        }
    }

    /// A one-element collection.
    pub fn single(form: impl Into<String>) -> Self {
        Self(vec![form.into()])
    }

    /// The first listed form, used when the answer is read back to the learner.
    pub fn primary(&self) -> &str {
        &self.0[0]
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl TryFrom<AnswerField> for ExpectedAnswers {
    type Error = &'static str;

    fn try_from(field: AnswerField) -> Result<Self, Self::Error> {
        match field {
            AnswerField::One(form) => Ok(Self::single(form)),
            AnswerField::Many(forms) => {
                Self::new(forms).ok_or("expected at least one acceptable answer")
            }
        }
    }
}

impl From<ExpectedAnswers> for Vec<String> {
    fn from(answers: ExpectedAnswers) -> Self {
        answers.0
    }
}

/// One drill item: a question and the answers accepted for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogItem {
    pub question: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translation: Option<String>,
    pub expected_answers: ExpectedAnswers,
}

impl DialogItem {
    pub fn new(question: impl Into<String>, expected_answers: ExpectedAnswers) -> Self {
        Self {
            question: question.into(),
            translation: None,
            expected_answers,
        }
    }

    pub fn with_translation(mut self, translation: impl Into<String>) -> Self {
        self.translation = Some(translation.into());
        self
    }
}

/// The ordered drill items of one module, loaded as a whole.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleContent {
    pub module_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub items: Vec<DialogItem>,
}

impl ModuleContent {
    pub fn new(module_id: impl Into<String>, items: Vec<DialogItem>) -> Self {
        Self {
            module_id: module_id.into(),
            title: None,
            items,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Title for display, falling back to the module id.
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.module_id)
    }
}

/// Answer counts for one module on one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionActivity {
    pub date: NaiveDate,
    pub questions_answered: u32,
    pub correct_answers: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_spent: Option<u64>,
}

impl SessionActivity {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            questions_answered: 0,
            correct_answers: 0,
            time_spent: None,
        }
    }
}

/// Persisted progress of one learner through one module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleProgress {
    pub module_id: String,
    pub total_questions: u32,
    pub answered_questions: u32,
    pub correct_answers: u32,
    #[serde(default)]
    pub score: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_date: Option<NaiveDate>,
    pub last_access_date: NaiveDate,
    #[serde(default)]
    pub sessions: Vec<SessionActivity>,
}

impl ModuleProgress {
    /// Fresh progress for a module first opened on `today`.
    pub fn new(module_id: impl Into<String>, total_questions: u32, today: NaiveDate) -> Self {
        Self {
            module_id: module_id.into(),
            total_questions,
            answered_questions: 0,
            correct_answers: 0,
            score: 0,
            completed_date: None,
            last_access_date: today,
            sessions: Vec::new(),
        }
    }

    pub fn is_completed(&self) -> bool {
        self.completed_date.is_some()
    }

    /// Rounded percentage of correct answers, 0 when nothing was answered.
    pub fn accuracy(&self) -> u32 {
        percent(self.correct_answers, self.answered_questions)
    }

    /// The activity entry for `date`, if any.
    pub fn session_on(&self, date: NaiveDate) -> Option<&SessionActivity> {
        self.sessions.iter().find(|s| s.date == date)
    }
}

/// Root progress record of one learner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProgress {
    pub user_id: UserId,
    #[serde(default)]
    pub modules: BTreeMap<String, ModuleProgress>,
}

impl UserProgress {
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            modules: BTreeMap::new(),
        }
    }
}

/// Answer counts summed across modules for one day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityTotals {
    pub questions_answered: u32,
    pub correct_answers: u32,
}

impl ActivityTotals {
    pub fn add(&mut self, activity: &SessionActivity) {
        self.questions_answered += activity.questions_answered;
        self.correct_answers += activity.correct_answers;
    }

    pub fn accuracy_percent(&self) -> u32 {
        percent(self.correct_answers, self.questions_answered)
    }
}

fn percent(part: u32, whole: u32) -> u32 {
    if whole == 0 {
        0
    } else {
        ((part as f64 / whole as f64) * 100.0).round() as u32
    }
}

/// Distance used by the fuzzy matcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditMetric {
    /// Insert, delete and substitute at unit cost.
    Levenshtein,
    /// Levenshtein plus unit-cost swap of two adjacent characters.
    OptimalStringAlignment,
}

impl Default for EditMetric {
    fn default() -> Self {
        Self::OptimalStringAlignment
    }
}

impl EditMetric {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Levenshtein => "levenshtein",
            Self::OptimalStringAlignment => "optimal_string_alignment",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "levenshtein" => Some(Self::Levenshtein),
            "optimal_string_alignment" | "osa" => Some(Self::OptimalStringAlignment),
            _ => None,
        }
    }
}

/// Tunable drill policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrillSettings {
    /// Minimum similarity accepted when no canonical form matches exactly.
    pub acceptance_threshold: f64,
    pub points_per_correct: u32,
    pub edit_metric: EditMetric,
    /// Hour of day (0-23) at which a new calendar day starts for bucketing.
    pub daily_reset_hour: u32,
}

impl Default for DrillSettings {
    fn default() -> Self {
        Self {
            acceptance_threshold: 0.8,
            points_per_correct: 10,
            edit_metric: EditMetric::default(),
            daily_reset_hour: 0,
        }
    }
}
