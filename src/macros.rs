//! Macro Table - named, ordered sequences of editor commands
//!
//! Steps are either a real editor command (pressed through its keybinding)
//! or an internal action handled by the agent itself. The reserved token
//! form `__AGENT_INTERNAL_<NAME>__` only exists at the parse boundary
//! (config files, the built-in table); inside the agent a step is always a
//! [`MacroStep`].

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

const INTERNAL_PREFIX: &str = "__AGENT_INTERNAL_";
const INTERNAL_SUFFIX: &str = "__";

/// Side effects the agent performs itself, without key injection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum InternalAction {
    /// Read the clipboard and append it to the archive log.
    ArchiveClipboard,
    /// Reserved token with no handler. Running it is a no-op that fails.
    Unrecognized(String),
}

impl InternalAction {
    pub fn name(&self) -> &str {
        match self {
            InternalAction::ArchiveClipboard => "ARCHIVE_CLIPBOARD",
            InternalAction::Unrecognized(name) => name,
        }
    }

    fn from_name(name: &str) -> Self {
        match name {
            "ARCHIVE_CLIPBOARD" => InternalAction::ArchiveClipboard,
            other => InternalAction::Unrecognized(other.to_string()),
        }
    }
}

/// One macro step.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MacroStep {
    KeyCommand(String),
    Internal(InternalAction),
}

impl MacroStep {
    pub fn command(id: impl Into<String>) -> Self {
        MacroStep::KeyCommand(id.into())
    }

    /// The token form used in config files.
    pub fn token(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for MacroStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MacroStep::KeyCommand(id) => write!(f, "{}", id),
            MacroStep::Internal(action) => {
                write!(f, "{}{}{}", INTERNAL_PREFIX, action.name(), INTERNAL_SUFFIX)
            }
        }
    }
}

impl FromStr for MacroStep {
    type Err = MacroError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim();
        if token.is_empty() {
            return Err(MacroError::EmptyStep);
        }

        let internal = token
            .strip_prefix(INTERNAL_PREFIX)
            .and_then(|rest| rest.strip_suffix(INTERNAL_SUFFIX))
            .filter(|name| !name.is_empty());

        Ok(match internal {
            Some(name) => MacroStep::Internal(InternalAction::from_name(name)),
            None => MacroStep::KeyCommand(token.to_string()),
        })
    }
}

impl Serialize for MacroStep {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.token())
    }
}

impl<'de> Deserialize<'de> for MacroStep {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Macro errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MacroError {
    #[error("Macro step token is empty")]
    EmptyStep,

    #[error("Macro '{0}' has no steps")]
    NoSteps(String),

    #[error("Macro key is empty")]
    EmptyKey,

    #[error("Duplicate macro key: {0}")]
    DuplicateKey(String),
}

/// A named macro.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawMacro")]
pub struct MacroDefinition {
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: String,
    pub steps: Vec<MacroStep>,
}

#[derive(Deserialize)]
struct RawMacro {
    key: String,
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    icon: String,
    steps: Vec<MacroStep>,
}

impl TryFrom<RawMacro> for MacroDefinition {
    type Error = MacroError;

    fn try_from(raw: RawMacro) -> Result<Self, Self::Error> {
        MacroDefinition::new(raw.key, raw.name, raw.description, raw.icon, raw.steps)
    }
}

impl MacroDefinition {
    pub fn new(
        key: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        icon: impl Into<String>,
        steps: Vec<MacroStep>,
    ) -> Result<Self, MacroError> {
        let key = key.into();
        if key.trim().is_empty() {
            return Err(MacroError::EmptyKey);
        }
        if steps.is_empty() {
            return Err(MacroError::NoSteps(key));
        }
        Ok(Self {
            key,
            name: name.into(),
            description: description.into(),
            icon: icon.into(),
            steps,
        })
    }

    /// Key as spoken: `clean_slate` -> `clean slate`.
    pub fn spoken_key(&self) -> String {
        self.key.replace('_', " ")
    }
}

/// Macros in registration order. Order matters: it breaks ties when more
/// than one key is contained in an intent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MacroTable {
    macros: Vec<MacroDefinition>,
}

impl MacroTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_definitions(defs: Vec<MacroDefinition>) -> Result<Self, MacroError> {
        let mut table = Self::new();
        for def in defs {
            table.register(def)?;
        }
        Ok(table)
    }

    /// Append a macro. Keys are unique.
    pub fn register(&mut self, def: MacroDefinition) -> Result<(), MacroError> {
        if self.get(&def.key).is_some() {
            return Err(MacroError::DuplicateKey(def.key));
        }
        self.macros.push(def);
        Ok(())
    }

    /// Replace a macro in place (keeping its position) or append it.
    pub fn upsert(&mut self, def: MacroDefinition) {
        match self.macros.iter_mut().find(|m| m.key == def.key) {
            Some(slot) => *slot = def,
            None => self.macros.push(def),
        }
    }

    pub fn get(&self, key: &str) -> Option<&MacroDefinition> {
        self.macros.iter().find(|m| m.key == key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &MacroDefinition> {
        self.macros.iter()
    }

    pub fn len(&self) -> usize {
        self.macros.len()
    }

    pub fn is_empty(&self) -> bool {
        self.macros.is_empty()
    }

    /// The macros that ship with the agent.
    pub fn builtin() -> Self {
        use MacroStep::Internal;

        let cmd = MacroStep::command;
        let defs = vec![
            builtin(
                "clean_slate",
                "Tabula Rasa (Clean Slate)",
                "Closes all editors, sidebars, and panels to reset the workspace to a clean state.",
                "🧹",
                vec![
                    cmd("workbench.action.closeAllEditors"),
                    cmd("workbench.action.closeSidebar"),
                    cmd("workbench.action.closePanel"),
                ],
            ),
            builtin(
                "debug_prep",
                "Debug Session Prep",
                "Prepares the layout for debugging: splits editor and focuses terminal.",
                "🐞",
                vec![
                    cmd("workbench.action.splitEditorRight"),
                    cmd("workbench.action.terminal.focus"),
                    cmd("workbench.debug.action.toggleRepl"),
                ],
            ),
            builtin(
                "smart_save",
                "Smart Save & Format",
                "Formats the document and then saves it.",
                "💾",
                vec![
                    cmd("editor.action.formatDocument"),
                    cmd("workbench.action.files.save"),
                ],
            ),
            builtin(
                "zen_mode",
                "Zen Coding Mode",
                "Toggles Zen Mode and closes sidebar for maximum focus.",
                "🧘",
                vec![
                    cmd("workbench.action.toggleZenMode"),
                    cmd("workbench.action.closeSidebar"),
                ],
            ),
            builtin(
                "archive_chat",
                "Archive Chat Response",
                "Copies selected text and appends it to the chat log with metadata.",
                "📜",
                vec![
                    cmd("editor.action.clipboardCopyAction"),
                    Internal(InternalAction::ArchiveClipboard),
                ],
            ),
        ];

        Self { macros: defs }
    }
}

fn builtin(key: &str, name: &str, description: &str, icon: &str, steps: Vec<MacroStep>) -> MacroDefinition {
    MacroDefinition {
        key: key.into(),
        name: name.into(),
        description: description.into(),
        icon: icon.into(),
        steps,
    }
}
