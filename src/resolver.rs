//! Intent Resolver
//!
//! Free text -> macro | single command | not found. Resolution order:
//! 1. exact macro key (`"Clean Slate"` -> `clean_slate`)
//! 2. first macro whose spoken key is contained in the intent, in
//!    registration order
//! 3. command search in the index (all terms, keybinding required)
//!
//! Step 2 is first-match, not best-match. If two macro keys both appear in an
//! intent the earlier registered macro wins.

use crate::index::{CommandIndex, CommandRecord, IndexError};
use crate::macros::{MacroDefinition, MacroTable};

/// Outcome of resolving an intent.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution<'a> {
    Macro(&'a MacroDefinition),
    Command(CommandRecord),
    NotFound,
}

/// Normalized form used for exact key matching.
pub fn normalize_intent(intent: &str) -> String {
    intent.to_lowercase().replace(' ', "_")
}

/// Macro-only part of resolution (steps 1 and 2).
pub fn match_macro<'a>(intent: &str, macros: &'a MacroTable) -> Option<&'a MacroDefinition> {
    let normalized = normalize_intent(intent);
    if let Some(def) = macros.get(&normalized) {
        return Some(def);
    }

    let lowered = intent.to_lowercase();
    macros.iter().find(|def| lowered.contains(&def.spoken_key()))
}

/// Resolve an intent against the macro table, then the command index.
pub fn resolve_intent<'a>(
    intent: &str,
    macros: &'a MacroTable,
    index: &CommandIndex,
) -> Result<Resolution<'a>, IndexError> {
    if let Some(def) = match_macro(intent, macros) {
        tracing::debug!(intent, key = %def.key, "Intent matched macro");
        return Ok(Resolution::Macro(def));
    }

    match index.search(intent)? {
        Some(record) => {
            tracing::debug!(intent, command = %record.command_id, "Intent matched command");
            Ok(Resolution::Command(record))
        }
        None => Ok(Resolution::NotFound),
    }
}
