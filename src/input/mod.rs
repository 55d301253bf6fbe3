//! Input Module - Keyboard chord injection
//!
//! SAFETY: OS key injection is disabled by default and requires explicit
//! opt-in via the `input` feature flag: `--features input`. Without it every
//! chord goes to the dry-run injector, which only logs.
//!
//! # Policy
//! - A chord is pressed as a unit: every key down in order, then released in
//!   reverse order
//! - A failing chord is logged and skipped; the rest of the sequence still runs
//! - A fixed pause follows every chord so the editor can redraw

#[cfg(feature = "input")]
use enigo::{Direction, Enigo, Keyboard, Settings};

use crate::keybinding::{Chord, ChordSequence};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Something that can press a chord on the host.
pub trait KeyInjector {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Press every key of the chord together, then release them.
    fn press_chord(&mut self, chord: &Chord) -> Result<(), InputError>;
}

/// Injector that only logs what it would have pressed.
#[derive(Debug, Default)]
pub struct DryRunInjector {
    pressed: Vec<String>,
}

impl DryRunInjector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Chords "pressed" so far, in display form.
    pub fn pressed(&self) -> &[String] {
        &self.pressed
    }
}

impl KeyInjector for DryRunInjector {
    fn name(&self) -> &'static str {
        "dry-run"
    }

    fn press_chord(&mut self, chord: &Chord) -> Result<(), InputError> {
        if chord.is_empty() || chord.keys.iter().any(|k| k.is_empty()) {
            return Err(InputError::EmptyKey(chord.to_string()));
        }
        tracing::info!(chord = %chord, "[dry-run] would press");
        self.pressed.push(chord.to_string());
        Ok(())
    }
}

/// enigo-backed injector (requires the `input` feature)
#[cfg(feature = "input")]
pub struct EnigoInjector {
    enigo: Enigo,
}

#[cfg(feature = "input")]
impl EnigoInjector {
    pub fn new() -> Result<Self, InputError> {
        let settings = Settings::default();
        let enigo = Enigo::new(&settings).map_err(|e| InputError::InitError(e.to_string()))?;
        Ok(Self { enigo })
    }
}

#[cfg(feature = "input")]
impl KeyInjector for EnigoInjector {
    fn name(&self) -> &'static str {
        "enigo"
    }

    fn press_chord(&mut self, chord: &Chord) -> Result<(), InputError> {
        // Resolve every name first so a bad key never leaves modifiers held
        let keys = chord
            .keys
            .iter()
            .map(|k| parse_key(k))
            .collect::<Result<Vec<_>, _>>()?;

        let mut held = Vec::with_capacity(keys.len());
        let mut failure = None;
        for key in &keys {
            match self.enigo.key(*key, Direction::Press) {
                Ok(()) => held.push(*key),
                Err(e) => {
                    failure = Some(InputError::KeyboardError(e.to_string()));
                    break;
                }
            }
        }

        for key in held.iter().rev() {
            if let Err(e) = self.enigo.key(*key, Direction::Release) {
                tracing::warn!(chord = %chord, "Key release failed: {}", e);
            }
        }

        match failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Map a lowercase key name to an enigo key.
#[cfg(feature = "input")]
fn parse_key(key: &str) -> Result<enigo::Key, InputError> {
    use enigo::Key;

    if key.is_empty() {
        return Err(InputError::EmptyKey(key.to_string()));
    }

    let parsed = match key {
        // Modifier keys
        "ctrl" | "control" => Key::Control,
        "alt" | "option" => Key::Alt,
        "shift" => Key::Shift,
        "super" | "win" | "meta" | "cmd" | "command" => Key::Meta,

        // Function keys
        "f1" => Key::F1,
        "f2" => Key::F2,
        "f3" => Key::F3,
        "f4" => Key::F4,
        "f5" => Key::F5,
        "f6" => Key::F6,
        "f7" => Key::F7,
        "f8" => Key::F8,
        "f9" => Key::F9,
        "f10" => Key::F10,
        "f11" => Key::F11,
        "f12" => Key::F12,
        "f13" => Key::F13,
        "f14" => Key::F14,
        "f15" => Key::F15,
        "f16" => Key::F16,
        "f17" => Key::F17,
        "f18" => Key::F18,
        "f19" => Key::F19,
        "f20" => Key::F20,

        // Navigation keys
        "up" | "uparrow" => Key::UpArrow,
        "down" | "downarrow" => Key::DownArrow,
        "left" | "leftarrow" => Key::LeftArrow,
        "right" | "rightarrow" => Key::RightArrow,
        "home" => Key::Home,
        "end" => Key::End,
        "pageup" | "pgup" => Key::PageUp,
        "pagedown" | "pgdn" => Key::PageDown,

        // Editing keys
        "backspace" | "back" => Key::Backspace,
        "delete" | "del" => Key::Delete,
        #[cfg(not(target_os = "macos"))]
        "insert" | "ins" => Key::Insert,
        "enter" | "return" => Key::Return,
        "tab" => Key::Tab,
        "escape" | "esc" => Key::Escape,
        "space" => Key::Space,
        "capslock" => Key::CapsLock,

        // Punctuation as VS Code spells it
        "comma" => Key::Unicode(','),
        "period" => Key::Unicode('.'),
        "slash" => Key::Unicode('/'),
        "backslash" => Key::Unicode('\\'),
        "minus" => Key::Unicode('-'),
        "equal" => Key::Unicode('='),
        "semicolon" => Key::Unicode(';'),
        "quote" => Key::Unicode('\''),
        "backquote" => Key::Unicode('`'),
        "bracketleft" => Key::Unicode('['),
        "bracketright" => Key::Unicode(']'),

        // Single character
        _ => {
            let mut chars = key.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Key::Unicode(c),
                _ => return Err(InputError::UnknownKey(key.to_string())),
            }
        }
    };

    Ok(parsed)
}

/// Pick the injector for this run.
pub fn create_injector(dry_run: bool) -> Result<Box<dyn KeyInjector>, InputError> {
    if dry_run {
        return Ok(Box::new(DryRunInjector::new()));
    }

    #[cfg(feature = "input")]
    {
        Ok(Box::new(EnigoInjector::new()?))
    }

    #[cfg(not(feature = "input"))]
    {
        tracing::warn!("Built without the `input` feature; chords will only be logged");
        Ok(Box::new(DryRunInjector::new()))
    }
}

/// A chord that could not be injected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChordFailure {
    pub chord: String,
    pub error: String,
}

/// Result of pressing a whole sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActuationReport {
    pub attempted: usize,
    pub failures: Vec<ChordFailure>,
}

impl ActuationReport {
    pub fn succeeded(&self) -> usize {
        self.attempted - self.failures.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Presses chord sequences with pacing. One bad chord never blocks the next.
pub struct Actuator {
    injector: Box<dyn KeyInjector>,
    chord_delay: Duration,
}

impl Actuator {
    pub fn new(injector: Box<dyn KeyInjector>, chord_delay: Duration) -> Self {
        Self {
            injector,
            chord_delay,
        }
    }

    pub fn injector_name(&self) -> &'static str {
        self.injector.name()
    }

    pub fn actuate(&mut self, sequence: &ChordSequence) -> ActuationReport {
        tracing::info!(keys = %sequence, injector = self.injector.name(), "Actuating");

        let mut report = ActuationReport::default();
        for chord in sequence.iter() {
            report.attempted += 1;
            if let Err(e) = self.injector.press_chord(chord) {
                tracing::error!(chord = %chord, "Key error: {}", e);
                report.failures.push(ChordFailure {
                    chord: chord.to_string(),
                    error: e.to_string(),
                });
            }

            if !self.chord_delay.is_zero() {
                std::thread::sleep(self.chord_delay);
            }
        }

        report
    }
}

/// Input errors
#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("Input initialization failed: {0}")]
    InitError(String),

    #[error("Unknown key: {0}")]
    UnknownKey(String),

    #[error("Empty key name in chord '{0}'")]
    EmptyKey(String),

    #[error("Keyboard operation failed: {0}")]
    KeyboardError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keybinding::parse_keybinding;

    /// Records chords and fails any chord containing `poison`.
    struct Scripted {
        poison: &'static str,
        log: std::rc::Rc<std::cell::RefCell<Vec<String>>>,
    }

    impl KeyInjector for Scripted {
        fn name(&self) -> &'static str {
            "scripted"
        }

        fn press_chord(&mut self, chord: &Chord) -> Result<(), InputError> {
            self.log.borrow_mut().push(chord.to_string());
            if chord.keys.iter().any(|k| k == self.poison) {
                return Err(InputError::UnknownKey(self.poison.to_string()));
            }
            Ok(())
        }
    }

    #[test]
    fn test_bad_chord_does_not_abort_sequence() {
        let log = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
        let injector = Scripted {
            poison: "bogus",
            log: log.clone(),
        };
        let mut actuator = Actuator::new(Box::new(injector), Duration::ZERO);

        let report = actuator.actuate(&parse_keybinding("ctrl+k ctrl+bogus ctrl+c"));

        assert_eq!(report.attempted, 3);
        assert_eq!(report.succeeded(), 2);
        assert_eq!(report.failures[0].chord, "ctrl+bogus");
        assert_eq!(*log.borrow(), vec!["ctrl+k", "ctrl+bogus", "ctrl+c"]);
    }

    #[test]
    fn test_dry_run_records() {
        let mut dry = DryRunInjector::new();
        dry.press_chord(&Chord::new(["ctrl", "s"])).unwrap();
        assert_eq!(dry.pressed(), &["ctrl+s".to_string()]);
    }

    #[test]
    fn test_dry_run_rejects_empty_key() {
        // "ctrl+" parses to ["ctrl", ""]
        let seq = parse_keybinding("ctrl+");
        let mut dry = DryRunInjector::new();
        assert!(matches!(
            dry.press_chord(&seq.chords[0]),
            Err(InputError::EmptyKey(_))
        ));
    }

    #[cfg(feature = "input")]
    #[test]
    fn test_parse_key_aliases() {
        assert_eq!(parse_key("cmd").unwrap(), parse_key("command").unwrap());
        assert_eq!(parse_key("ctrl").unwrap(), enigo::Key::Control);
        assert_eq!(parse_key("k").unwrap(), enigo::Key::Unicode('k'));
        assert!(matches!(parse_key("hyperspace"), Err(InputError::UnknownKey(_))));
    }
}
