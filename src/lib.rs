//! Ghost Agent Library
//!
//! Turns a free-text intention into keystrokes for a VS Code-family editor:
//! resolve the intent against the macro table and the harvested command
//! index, expand macros into steps, translate keybindings into chords and
//! press them.

pub mod actions;
pub mod archive;
pub mod cli;
pub mod clipboard;
pub mod core;
pub mod dispatcher;
pub mod index;
pub mod input;
pub mod keybinding;
pub mod logging;
pub mod macros;
pub mod resolver;
pub mod sentinel;

pub use crate::core::{AgentConfig, ConfigManager, GhostError};
pub use actions::{ActionError, ActionOutcome, InternalActionHandler};
pub use archive::{ArchiveEntry, ArchiveError, ArchiveLog};
pub use clipboard::{ClipboardError, ClipboardSource, SystemClipboard};
pub use dispatcher::{DispatchReport, GhostAgent, MacroReport, StepOutcome, StepReport};
pub use index::{CommandIndex, CommandRecord, IndexError};
pub use input::{ActuationReport, Actuator, DryRunInjector, InputError, KeyInjector};
pub use keybinding::{parse_keybinding, Chord, ChordSequence};
pub use logging::{EventId, GhostEvent, LogLevel, SystemLogger};
pub use macros::{InternalAction, MacroDefinition, MacroError, MacroStep, MacroTable};
pub use resolver::{resolve_intent, Resolution};
pub use sentinel::{Sentinel, SentinelError, WatchSummary};

#[cfg(feature = "input")]
pub use input::EnigoInjector;
