//! Canonical form of spoken answers.

/// Characters removed before comparison.
const STRIPPED: &[char] = &[
    '.', ',', '!', '?', ':', ';', '"', '\'', '\u{2019}', '\u{201C}', '\u{201D}', '-',
];

/// Tokens dropped when they stand alone.
const ARTICLES: &[&str] = &["a", "an"];

/// Reduce free-form text to the canonical form used for every comparison.
///
/// Lowercases, strips punctuation, drops the articles "a" and "an", folds
/// "i am" into "im" (the same form "I'm" takes once its apostrophe is gone)
/// and collapses whitespace. Articles go first so that the result is a fixed
/// point: `normalize(normalize(s)) == normalize(s)`.
pub fn normalize(text: &str) -> String {
    let stripped: String = text
        .to_lowercase()
        .chars()
        .filter(|c| !STRIPPED.contains(c))
        .collect();

    let tokens: Vec<&str> = stripped
        .split_whitespace()
        .filter(|token| !ARTICLES.contains(token))
        .collect();

    let mut out: Vec<&str> = Vec::with_capacity(tokens.len());
    let mut i = 0;
    while i < tokens.len() {
        if tokens[i] == "i" && tokens.get(i + 1) == Some(&"am") {
            out.push("im");
            i += 2;
        } else {
            out.push(tokens[i]);
            i += 1;
        }
    }

    out.join(" ")
}
