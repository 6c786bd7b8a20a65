//! Console stand-ins for speech synthesis and recognition.
//!
//! Synthesis prints the text and reports the playback lifecycle right away.
//! Recognition reads one finalized utterance per input line.

use drill_core::PlaybackEvent;
use std::io::{self, BufRead, Write};

#[derive(Debug, Clone, Default)]
pub struct ConsoleVoice {
    /// Report a word boundary for every word spoken.
    pub word_boundaries: bool,
}

impl ConsoleVoice {
    pub fn new() -> Self {
        Self::default()
    }

    /// "Speak" `text`, passing each playback event to `on_event` in order.
    pub fn speak<W: Write>(
        &self,
        out: &mut W,
        text: &str,
        mut on_event: impl FnMut(PlaybackEvent),
    ) -> io::Result<()> {
        on_event(PlaybackEvent::Started);
        writeln!(out, "  >> {}", text)?;
        if self.word_boundaries {
            for _ in text.split_whitespace() {
                on_event(PlaybackEvent::Boundary);
            }
        }
        on_event(PlaybackEvent::Finished);
        Ok(())
    }
}

/// Reads recognized text line by line, skipping blank lines.
pub struct LineRecognizer<R> {
    input: R,
}

impl<R: BufRead> LineRecognizer<R> {
    pub fn new(input: R) -> Self {
        Self { input }
    }

    /// Next utterance, trimmed. `None` at end of input.
    pub fn next_utterance(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        loop {
            line.clear();
            if self.input.read_line(&mut line)? == 0 {
                return Ok(None);
            }
            let text = line.trim();
            if !text.is_empty() {
                return Ok(Some(text.to_string()));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    #[test]
    fn test_playback_events_in_order() {
        let voice = ConsoleVoice {
            word_boundaries: true,
        };
        let mut out = Vec::new();
        let mut events = Vec::new();

        voice.speak(&mut out, "Nice to meet you", |e| events.push(e)).unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), "  >> Nice to meet you\n");
        assert_eq!(events.first(), Some(&PlaybackEvent::Started));
        assert_eq!(events.last(), Some(&PlaybackEvent::Finished));
        assert_eq!(events.iter().filter(|e| **e == PlaybackEvent::Boundary).count(), 4);
    }

    #[test]
    fn test_no_boundaries_by_default() {
        let mut events = Vec::new();
        ConsoleVoice::new()
            .speak(&mut io::sink(), "Hello there", |e| events.push(e))
            .unwrap();
        assert_eq!(events, vec![PlaybackEvent::Started, PlaybackEvent::Finished]);
    }

    #[test]
    fn test_recognizer_skips_blank_lines() {
        let mut recognizer = LineRecognizer::new(Cursor::new("  I am fine \n\n   \nbye\n"));
        assert_eq!(recognizer.next_utterance().unwrap().as_deref(), Some("I am fine"));
        assert_eq!(recognizer.next_utterance().unwrap().as_deref(), Some("bye"));
        assert_eq!(recognizer.next_utterance().unwrap(), None);
    }
}
