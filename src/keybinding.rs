//! Keybinding Translator
//!
//! Turns VS Code-style keybinding strings into chord sequences.
//!
//! ```text
//! "ctrl+k ctrl+c"  -> [["ctrl", "k"], ["ctrl", "c"]]
//! "shift+alt+down" -> [["shift", "alt", "down"]]
//! ```
//!
//! Key names are not validated here. An unknown name only fails when the
//! injector tries to press it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Keys pressed together, in the order they are held down.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chord {
    pub keys: Vec<String>,
}

impl Chord {
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl fmt::Display for Chord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.keys.join("+"))
    }
}

/// One fully parsed keybinding: chords pressed one after the other.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChordSequence {
    pub chords: Vec<Chord>,
}

impl ChordSequence {
    pub fn len(&self) -> usize {
        self.chords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chords.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Chord> {
        self.chords.iter()
    }

    /// Nested key lists, handy for logs and assertions.
    pub fn to_key_lists(&self) -> Vec<Vec<String>> {
        self.chords.iter().map(|c| c.keys.clone()).collect()
    }
}

impl fmt::Display for ChordSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.chords.iter().map(|c| c.to_string()).collect();
        write!(f, "{}", parts.join(" "))
    }
}

/// Parse a keybinding string into a chord sequence.
///
/// The whole string is lowercased, split on single spaces into chords and
/// each chord is split on `+` into keys. Callers only pass non-empty bindings.
pub fn parse_keybinding(binding: &str) -> ChordSequence {
    let lowered = binding.to_lowercase();
    let chords = lowered
        .split(' ')
        .map(|chord| Chord::new(chord.split('+')))
        .collect();

    ChordSequence { chords }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multi_chord_binding() {
        let seq = parse_keybinding("ctrl+k ctrl+c");
        assert_eq!(
            seq.to_key_lists(),
            vec![vec!["ctrl", "k"], vec!["ctrl", "c"]]
        );
    }

    #[test]
    fn test_single_chord_binding() {
        let seq = parse_keybinding("shift+alt+down");
        assert_eq!(seq.to_key_lists(), vec![vec!["shift", "alt", "down"]]);
    }

    #[test]
    fn test_case_normalized() {
        assert_eq!(
            parse_keybinding("Ctrl+Shift+P"),
            parse_keybinding("ctrl+shift+p")
        );
        assert_eq!(parse_keybinding("CTRL+K").to_string(), "ctrl+k");
    }

    #[test]
    fn test_reparse_is_identical() {
        let first = parse_keybinding("ctrl+k ctrl+shift+s");
        let second = parse_keybinding("ctrl+k ctrl+shift+s");
        assert_eq!(first, second);
    }

    #[test]
    fn test_single_key() {
        let seq = parse_keybinding("F5");
        assert_eq!(seq.len(), 1);
        assert_eq!(seq.chords[0].keys, vec!["f5"]);
    }

    #[test]
    fn test_names_are_not_validated() {
        let seq = parse_keybinding("ctrl+definitelynotakey");
        assert_eq!(seq.chords[0].keys, vec!["ctrl", "definitelynotakey"]);
    }

    #[test]
    fn test_display_round_trips_canonical_form() {
        let seq = parse_keybinding("Ctrl+K Ctrl+C");
        assert_eq!(seq.to_string(), "ctrl+k ctrl+c");
    }
}
