//! Core engine for the spoken-answer drill.
//!
//! Provides:
//! - Text normalization for comparing spoken answers
//! - Edit-distance matching and the answer validator
//! - Dialog sessions (a cursor over a module's drill items)
//! - The progress ledger with per-day activity and a pluggable backend
//! - The coordinator that resumes sessions from stored progress

pub mod clock;
pub mod coordinator;
pub mod error;
pub mod matching;
pub mod normalize;
pub mod parser;
pub mod progress;
pub mod session;
pub mod types;

pub use clock::{Clock, FixedClock, SystemClock};
pub use coordinator::{
    AnswerFeedback, DrillStep, PlaybackEvent, ProgressCoordinator, Prompt, ResumePoint,
};
pub use error::{BackendError, ContentError};
pub use matching::{
    distance, levenshtein_distance, osa_distance, similarity, AnswerValidator, MatchResult,
};
pub use normalize::normalize;
pub use parser::{default_drill, parse_module, DEFAULT_DRILL_ID};
pub use progress::{
    storage_key, ListenerId, MemoryBackend, ModuleActivity, ProgressBackend, ProgressEvent,
    ProgressStore,
};
pub use session::DialogSession;
pub use types::{
    ActivityTotals, DialogItem, DrillSettings, EditMetric, ExpectedAnswers, ModuleContent,
    ModuleProgress, SessionActivity, UserId, UserProgress,
};
