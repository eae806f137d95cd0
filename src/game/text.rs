//! # Text Reveal
//!
//! Dialogue text lines and the character-by-character reveal state machine.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Reveal speed of a text line, in milliseconds per character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Speed {
    Pause,
    Slow,
    #[default]
    Normal,
    Fast,
    SuperFast,
}

impl Speed {
    pub fn delay(self) -> Duration {
        let ms = match self {
            Speed::Pause => 500,
            Speed::Slow => 90,
            Speed::Normal => 60,
            Speed::Fast => 30,
            Speed::SuperFast => 10,
        };
        Duration::from_millis(ms)
    }
}

/// One styled run of dialogue text.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextLine {
    pub string: String,
    #[serde(default)]
    pub speed: Speed,
    /// Pause lines reveal their spaces with a delay too.
    #[serde(default)]
    pub pause: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub classes: Vec<String>,
}

impl TextLine {
    pub fn new(string: impl Into<String>, speed: Speed) -> Self {
        Self {
            string: string.into(),
            speed,
            pause: false,
            classes: Vec::new(),
        }
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.classes.push(class.into());
        self
    }

    /// Replaces every `{CASTER}`, `{TARGET}` and `{ACTION}` placeholder.
    pub fn substitute(&self, caster: &str, target: &str, action: &str) -> Self {
        Self {
            string: self
                .string
                .replace("{CASTER}", caster)
                .replace("{TARGET}", target)
                .replace("{ACTION}", action),
            ..self.clone()
        }
    }
}

/// Joins lines with single spaces into the plain text a reader sees.
pub fn plain_text(lines: &[TextLine]) -> String {
    lines
        .iter()
        .map(|line| line.string.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Debug, Clone)]
struct RevealChar {
    ch: char,
    delay: Duration,
}

/// Reveals text one character at a time.
///
/// The reveal itself is passive: a driver asks for the next character and
/// sleeps for the delay it carries. [`RevealingText::warp_to_done`] skips
/// straight to the end.
///
/// # Examples
///
/// ```
/// use crust::{RevealingText, Speed, TextLine};
///
/// let mut text = RevealingText::new(&[TextLine::new("Hi there", Speed::Fast)]);
/// let (ch, _) = text.reveal_next().unwrap();
/// assert_eq!(ch, 'H');
/// text.warp_to_done();
/// assert!(text.is_done());
/// assert_eq!(text.revealed(), "Hi there");
/// ```
#[derive(Debug, Clone)]
pub struct RevealingText {
    chars: Vec<RevealChar>,
    cursor: usize,
}

impl RevealingText {
    pub fn new(lines: &[TextLine]) -> Self {
        let mut chars = Vec::new();
        for (i, line) in lines.iter().enumerate() {
            if i > 0 {
                chars.push(RevealChar {
                    ch: ' ',
                    delay: Duration::ZERO,
                });
            }
            for ch in line.string.chars() {
                let delay = if ch == ' ' && !line.pause {
                    Duration::ZERO
                } else {
                    line.speed.delay()
                };
                chars.push(RevealChar { ch, delay });
            }
        }
        Self { chars, cursor: 0 }
    }

    /// Reveals the next character, returning it with the delay to wait after it.
    pub fn reveal_next(&mut self) -> Option<(char, Duration)> {
        let next = self.chars.get(self.cursor)?;
        self.cursor += 1;
        Some((next.ch, next.delay))
    }

    pub fn warp_to_done(&mut self) {
        self.cursor = self.chars.len();
    }

    pub fn is_done(&self) -> bool {
        self.cursor >= self.chars.len()
    }

    pub fn revealed(&self) -> String {
        self.chars[..self.cursor].iter().map(|c| c.ch).collect()
    }

    pub fn full_text(&self) -> String {
        self.chars.iter().map(|c| c.ch).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speed_delays() {
        assert_eq!(Speed::Pause.delay(), Duration::from_millis(500));
        assert_eq!(Speed::SuperFast.delay(), Duration::from_millis(10));
    }

    #[test]
    fn test_substitute_all_placeholders() {
        let line = TextLine::new("{CASTER} uses {ACTION} on {TARGET}! {CASTER}!", Speed::Fast);
        let out = line.substitute("Slice Samurai", "Call Me Kale", "Fling");
        assert_eq!(
            out.string,
            "Slice Samurai uses Fling on Call Me Kale! Slice Samurai!"
        );
        assert_eq!(out.speed, Speed::Fast);
    }

    #[test]
    fn test_spaces_reveal_instantly() {
        let mut text = RevealingText::new(&[TextLine::new("a b", Speed::Slow)]);
        assert_eq!(text.reveal_next(), Some(('a', Duration::from_millis(90))));
        assert_eq!(text.reveal_next(), Some((' ', Duration::ZERO)));
        assert_eq!(text.reveal_next(), Some(('b', Duration::from_millis(90))));
        assert_eq!(text.reveal_next(), None);
    }

    #[test]
    fn test_lines_joined_with_space() {
        let lines = vec![
            TextLine::new("Feelin'", Speed::Fast),
            TextLine::new("saucy!", Speed::Fast).with_class("orange"),
        ];
        assert_eq!(plain_text(&lines), "Feelin' saucy!");
        assert_eq!(RevealingText::new(&lines).full_text(), "Feelin' saucy!");
    }

    #[test]
    fn test_textline_deserialize_defaults() {
        let line: TextLine = serde_json::from_str(r#"{"string":"Hello"}"#).unwrap();
        assert_eq!(line.speed, Speed::Normal);
        assert!(!line.pause);
        let fast: TextLine =
            serde_json::from_str(r#"{"string":"Bahaha!","speed":"superFast"}"#).unwrap();
        assert_eq!(fast.speed, Speed::SuperFast);
    }
}
