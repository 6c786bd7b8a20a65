//! Console commands.
//!
//! Lines starting with `:` are commands; anything else is a spoken answer.

pub mod settings;
pub mod stats;
pub mod study;

use crate::state::AppState;
use crate::voice::LineRecognizer;
use drill_core::ContentError;
use std::io::{BufRead, Write};
use thiserror::Error;

pub const HELP: &str = "\
Commands:
  :modules             list available modules
  :open <module>       start or resume a module
  :hint                hear the expected answer again
  :reset               start the current module over
  :stats [module]      today's activity, or one module's progress
  :history <module>    day by day activity of a module
  :settings            show drill settings
  :threshold <0..1>    set the acceptance threshold
  :points <n>          set points per correct answer
  :clear               delete all of your progress
  :export              print your progress record as JSON
  :help                show this help
  :quit                leave
Anything else is taken as your answer.";

#[derive(Debug, Error)]
#[error("{message}")]
pub struct CommandError {
    pub message: String,
}

impl CommandError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<crate::db::DbError> for CommandError {
    fn from(e: crate::db::DbError) -> Self {
        Self { message: e.to_string() }
    }
}

impl From<ContentError> for CommandError {
    fn from(e: ContentError) -> Self {
        Self { message: e.to_string() }
    }
}

impl From<std::io::Error> for CommandError {
    fn from(e: std::io::Error) -> Self {
        Self { message: e.to_string() }
    }
}

impl From<serde_json::Error> for CommandError {
    fn from(e: serde_json::Error) -> Self {
        Self { message: e.to_string() }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Modules,
    Open(String),
    Answer(String),
    Hint,
    Reset,
    Stats(Option<String>),
    History(String),
    Settings,
    Threshold(f64),
    Points(u32),
    Clear,
    Export,
    Help,
    Quit,
}

impl Command {
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let line = line.trim();
        let Some(rest) = line.strip_prefix(':') else {
            return Ok(Self::Answer(line.to_string()));
        };

        let mut parts = rest.split_whitespace();
        let name = parts.next().unwrap_or_default().to_lowercase();
        let arg = parts.next();

        let command = match (name.as_str(), arg) {
            ("modules", _) => Self::Modules,
            ("open", Some(id)) => Self::Open(id.to_string()),
            ("open", None) => return Err(CommandError::new("usage: :open <module>")),
            ("hint", _) => Self::Hint,
            ("reset", _) => Self::Reset,
            ("stats", id) => Self::Stats(id.map(str::to_string)),
            ("history", Some(id)) => Self::History(id.to_string()),
            ("history", None) => return Err(CommandError::new("usage: :history <module>")),
            ("settings", _) => Self::Settings,
            ("threshold", Some(value)) => {
                let value: f64 = value
                    .parse()
                    .map_err(|_| CommandError::new(format!("not a number: {}", value)))?;
                Self::Threshold(value)
            }
            ("threshold", None) => return Err(CommandError::new("usage: :threshold <0..1>")),
            ("points", Some(value)) => {
                let value: u32 = value
                    .parse()
                    .map_err(|_| CommandError::new(format!("not a whole number: {}", value)))?;
                Self::Points(value)
            }
            ("points", None) => return Err(CommandError::new("usage: :points <n>")),
            ("clear", _) => Self::Clear,
            ("export", _) => Self::Export,
            ("help" | "h" | "?", _) => Self::Help,
            ("quit" | "q" | "exit", _) => Self::Quit,
            _ => return Err(CommandError::new(format!("unknown command :{}, try :help", name))),
        };
        Ok(command)
    }
}

/// Whether the loop keeps reading input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub fn execute<W: Write>(
    state: &mut AppState,
    out: &mut W,
    command: Command,
) -> Result<Flow, CommandError> {
    match command {
        Command::Modules => study::list_modules(state, out)?,
        Command::Open(module_id) => study::open_module(state, out, &module_id)?,
        Command::Answer(text) => study::answer(state, out, &text)?,
        Command::Hint => study::hint(state, out)?,
        Command::Reset => study::reset(state, out)?,
        Command::Stats(Some(module_id)) => stats::module_stats(state, out, &module_id)?,
        Command::Stats(None) => stats::overview(state, out)?,
        Command::History(module_id) => stats::history(state, out, &module_id)?,
        Command::Settings => settings::show(state, out)?,
        Command::Threshold(value) => settings::set_threshold(state, out, value)?,
        Command::Points(value) => settings::set_points(state, out, value)?,
        Command::Clear => stats::clear(state, out)?,
        Command::Export => stats::export(state, out)?,
        Command::Help => writeln!(out, "{}", HELP)?,
        Command::Quit => return Ok(Flow::Quit),
    }
    Ok(Flow::Continue)
}

/// Read utterances until `:quit` or end of input. Command failures are
/// reported and the loop carries on.
pub fn run_loop<R: BufRead, W: Write>(
    state: &mut AppState,
    input: R,
    out: &mut W,
) -> Result<(), CommandError> {
    let mut recognizer = LineRecognizer::new(input);
    writeln!(out, "Speaking drill. Type :help for commands.")?;

    while let Some(line) = recognizer.next_utterance()? {
        let flow = Command::parse(&line).and_then(|command| execute(state, out, command));
        match flow {
            Ok(Flow::Quit) => break,
            Ok(Flow::Continue) => {}
            Err(e) => writeln!(out, "error: {}", e)?,
        }
    }

    writeln!(out, "Bye!")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_plain_text_is_an_answer() {
        assert_eq!(
            Command::parse("  I am fine, thank you ").unwrap(),
            Command::Answer("I am fine, thank you".to_string())
        );
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse(":open greetings").unwrap(), Command::Open("greetings".into()));
        assert_eq!(Command::parse(":STATS").unwrap(), Command::Stats(None));
        assert_eq!(
            Command::parse(":stats shopping").unwrap(),
            Command::Stats(Some("shopping".into()))
        );
        assert_eq!(Command::parse(":threshold 0.9").unwrap(), Command::Threshold(0.9));
        assert_eq!(Command::parse(":points 5").unwrap(), Command::Points(5));
        assert_eq!(Command::parse(":q").unwrap(), Command::Quit);
    }

    #[test]
    fn test_parse_errors() {
        assert!(Command::parse(":open").is_err());
        assert!(Command::parse(":points many").is_err());
        assert!(Command::parse(":dance").is_err());
        assert!(Command::parse(":").is_err());
    }
}
