//! JSON parser for drill module content.
//!
//! # Formats
//! A bare list of dialogs, where `answer` is a string or a list of strings:
//! ```json
//! [
//!   { "question": "How are you?", "translation": "Como vai?", "answer": ["I am fine", "Fine, thanks"] }
//! ]
//! ```
//!
//! Or a module object with steps; alternatives are accepted after the answers:
//! ```json
//! {
//!   "id": "greetings",
//!   "title": "Greetings & Introductions",
//!   "steps": [
//!     { "id": "g1", "prompt": "Say hello", "expected": { "answers": ["Hello"], "alternatives": ["Hi"] } }
//!   ]
//! }
//! ```

use crate::error::ContentError;
use crate::types::{DialogItem, ExpectedAnswers, ModuleContent};
use serde::Deserialize;
use serde_json::Value;

#[derive(Deserialize)]
#[serde(untagged)]
enum RawAnswer {
    One(String),
    Many(Vec<String>),
}

impl RawAnswer {
    fn into_forms(self) -> Vec<String> {
        match self {
            Self::One(form) => vec![form],
            Self::Many(forms) => forms,
        }
    }
}

#[derive(Deserialize)]
struct RawDialog {
    question: String,
    #[serde(default)]
    translation: Option<String>,
    answer: RawAnswer,
}

#[derive(Deserialize)]
struct RawExpected {
    #[serde(default)]
    answers: Vec<String>,
    #[serde(default)]
    alternatives: Vec<String>,
}

#[derive(Deserialize)]
struct RawStep {
    prompt: String,
    #[serde(default)]
    translation: Option<String>,
    expected: RawExpected,
}

#[derive(Deserialize)]
struct RawStepModule {
    #[serde(default)]
    title: Option<String>,
    steps: Vec<RawStep>,
}

/// Parse the content of one module.
///
/// `module_id` names the module regardless of any id inside the document.
pub fn parse_module(module_id: &str, json: &str) -> Result<ModuleContent, ContentError> {
    let value: Value = serde_json::from_str(json)?;

    let (title, raw_items): (Option<String>, Vec<(String, Option<String>, Vec<String>)>) =
        if value.is_array() {
            let dialogs: Vec<RawDialog> = serde_json::from_value(value)?;
            let items = dialogs
                .into_iter()
                .map(|d| (d.question, d.translation, d.answer.into_forms()))
                .collect();
            (None, items)
        } else {
            let module: RawStepModule = serde_json::from_value(value)?;
            let items = module
                .steps
                .into_iter()
                .map(|s| {
                    let mut forms = s.expected.answers;
                    forms.extend(s.expected.alternatives);
                    (s.prompt, s.translation, forms)
                })
                .collect();
            (module.title, items)
        };

    if raw_items.is_empty() {
        return Err(ContentError::EmptyModule {
            module_id: module_id.to_string(),
        });
    }

    let mut items = Vec::with_capacity(raw_items.len());
    for (index, (question, translation, forms)) in raw_items.into_iter().enumerate() {
        let forms: Vec<String> = forms.into_iter().filter(|f| !f.trim().is_empty()).collect();
        let expected_answers =
            ExpectedAnswers::new(forms).ok_or_else(|| ContentError::MissingAnswers {
                module_id: module_id.to_string(),
                index,
            })?;
        items.push(DialogItem {
            question,
            translation: translation.filter(|t| !t.trim().is_empty()),
            expected_answers,
        });
    }

    Ok(ModuleContent {
        module_id: module_id.to_string(),
        title,
        items,
    })
}

/// Module id of the built-in drill. Its progress is kept apart from the
/// modules it stands in for.
pub const DEFAULT_DRILL_ID: &str = "default";

/// Small built-in drill used when a module's content cannot be loaded.
pub fn default_drill() -> ModuleContent {
    let items = vec![
        DialogItem::new(
            "Hello! How are you?",
            ExpectedAnswers::new(vec![
                "I am fine, thank you!".to_string(),
                "I'm fine, thank you!".to_string(),
                "Fine, thanks".to_string(),
            ])
            .unwrap_or_else(|| ExpectedAnswers::single("I am fine, thank you!")),
        )
        .with_translation("Olá! Como você está?"),
        DialogItem::new(
            "What is your name?",
            ExpectedAnswers::new(vec!["My name is Alex".to_string(), "I am Alex".to_string()])
                .unwrap_or_else(|| ExpectedAnswers::single("My name is Alex")),
        )
        .with_translation("Qual é o seu nome?"),
        DialogItem::new("Nice to meet you!", ExpectedAnswers::single("Nice to meet you too!"))
            .with_translation("Prazer em conhecê-lo!"),
    ];

    ModuleContent {
        module_id: DEFAULT_DRILL_ID.to_string(),
        title: Some("Default drill".to_string()),
        items,
    }
}
