//! Answer matching for spoken drill answers.

use crate::normalize::normalize;
use crate::types::{DrillSettings, EditMetric};
use serde::{Deserialize, Serialize};

/// Result of checking a spoken answer against its acceptable forms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    /// Whether the answer is accepted.
    pub is_correct: bool,
    /// Similarity of the comparison that decided the verdict: the accepted
    /// form, or the closest rejected form when nothing matched.
    pub similarity: f64,
    /// Position of the accepted form in the expected list.
    pub matched_index: Option<usize>,
    /// Normalized spoken answer (for display).
    pub typed_normalized: String,
}

/// Decides whether spoken text matches any of a set of acceptable forms.
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerValidator {
    pub threshold: f64,
    pub metric: EditMetric,
}

impl Default for AnswerValidator {
    fn default() -> Self {
        Self::from_settings(&DrillSettings::default())
    }
}

impl AnswerValidator {
    pub fn new(threshold: f64, metric: EditMetric) -> Self {
        Self { threshold, metric }
    }

    pub fn from_settings(settings: &DrillSettings) -> Self {
        Self::new(settings.acceptance_threshold, settings.edit_metric)
    }

    /// True when any expected form matches. An empty list never matches.
    pub fn is_correct<S: AsRef<str>>(&self, user_text: &str, expected: &[S]) -> bool {
        self.evaluate(user_text, expected).is_correct
    }

    /// Check forms in order and stop at the first acceptable one.
    ///
    /// There is no ranking across forms: a later form that would score higher
    /// is never looked at once an earlier one passes.
    pub fn evaluate<S: AsRef<str>>(&self, user_text: &str, expected: &[S]) -> MatchResult {
        let typed_normalized = normalize(user_text);

        if expected.is_empty() {
            tracing::debug!("no acceptable forms supplied, rejecting answer");
            return MatchResult {
                is_correct: false,
                similarity: 0.0,
                matched_index: None,
                typed_normalized,
            };
        }

        let mut closest = 0.0_f64;
        for (index, form) in expected.iter().enumerate() {
            let form_normalized = normalize(form.as_ref());
            if typed_normalized == form_normalized {
                return MatchResult {
                    is_correct: true,
                    similarity: 1.0,
                    matched_index: Some(index),
                    typed_normalized,
                };
            }

            let score = similarity(&typed_normalized, &form_normalized, self.metric);
            if score >= self.threshold {
                return MatchResult {
                    is_correct: true,
                    similarity: score,
                    matched_index: Some(index),
                    typed_normalized,
                };
            }
            closest = closest.max(score);
        }

        MatchResult {
            is_correct: false,
            similarity: closest,
            matched_index: None,
            typed_normalized,
        }
    }
}

/// Edit distance under the chosen metric.
pub fn distance(a: &str, b: &str, metric: EditMetric) -> usize {
    match metric {
        EditMetric::Levenshtein => levenshtein_distance(a, b),
        EditMetric::OptimalStringAlignment => osa_distance(a, b),
    }
}

/// Similarity in `[0, 1]`: `1 - distance / max(len a, len b, 1)`.
///
/// Lengths count chars, so identical strings (including two empty ones)
/// score exactly 1.0.
pub fn similarity(a: &str, b: &str, metric: EditMetric) -> f64 {
    let max_len = a.chars().count().max(b.chars().count()).max(1);
    let distance = distance(a, b, metric);
    1.0 - (distance as f64 / max_len as f64)
}

/// Split into char vectors, longer first. Rows walk the longer string so the
/// rolling rows are sized by the shorter one.
fn by_length(a: &str, b: &str) -> (Vec<char>, Vec<char>) {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    if a_chars.len() >= b_chars.len() {
        (a_chars, b_chars)
    } else {
        (b_chars, a_chars)
    }
}

/// Calculate Levenshtein distance between two strings.
pub fn levenshtein_distance(a: &str, b: &str) -> usize {
    let (long, short) = by_length(a, b);

    let m = long.len();
    let n = short.len();

    if n == 0 {
        return m;
    }

    // Two rows instead of the full matrix
    let mut prev = (0..=n).collect::<Vec<_>>();
    let mut curr = vec![0; n + 1];

    for i in 1..=m {
        curr[0] = i;

        for j in 1..=n {
            let cost = if long[i - 1] == short[j - 1] { 0 } else { 1 };

            curr[j] = (prev[j] + 1) // deletion
                .min(curr[j - 1] + 1) // insertion
                .min(prev[j - 1] + cost); // substitution
        }

        std::mem::swap(&mut prev, &mut curr);
    }

    prev[n]
}

/// Optimal string alignment distance: Levenshtein plus adjacent transposition
/// at unit cost, so "teh" is one edit away from "the".
pub fn osa_distance(a: &str, b: &str) -> usize {
    let (long, short) = by_length(a, b);

    let m = long.len();
    let n = short.len();

    if n == 0 {
        return m;
    }

    // Transpositions look two rows back
    let mut two_back = vec![0; n + 1];
    let mut prev = (0..=n).collect::<Vec<_>>();
    let mut curr = vec![0; n + 1];

    for i in 1..=m {
        curr[0] = i;

        for j in 1..=n {
            let cost = if long[i - 1] == short[j - 1] { 0 } else { 1 };

            let mut best = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
            if i > 1 && j > 1 && long[i - 1] == short[j - 2] && long[i - 2] == short[j - 1] {
                best = best.min(two_back[j - 2] + 1);
            }
            curr[j] = best;
        }

        std::mem::swap(&mut two_back, &mut prev);
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[n]
}
