use crate::archive::DEFAULT_SEPARATOR;
use crate::macros::{MacroDefinition, MacroTable};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

const APP_DIR: &str = "ghost-agent";

fn data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

/// Runtime configuration, built once at startup and passed down.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Harvested command database
    pub db_path: PathBuf,
    /// Log file for the archive-clipboard action and watch mode
    pub archive_path: PathBuf,
    pub archive_separator: String,
    /// Pause after every macro step
    pub step_delay_ms: u64,
    /// Pause after every chord
    pub chord_delay_ms: u64,
    /// Time to focus the target window before the first key
    pub warmup_secs: u64,
    /// Pause before reading the clipboard in the archive action
    pub archive_settle_ms: u64,
    /// Clipboard poll interval in watch mode
    pub watch_poll_ms: u64,
    /// Extra or replacement macros, matched to built-ins by key
    pub macros: Vec<MacroDefinition>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        let base = data_dir();
        Self {
            db_path: base.join("commands.db"),
            archive_path: base.join("chat_archive.txt"),
            archive_separator: DEFAULT_SEPARATOR.into(),
            step_delay_ms: 500,
            chord_delay_ms: 100,
            warmup_secs: 3,
            archive_settle_ms: 300,
            watch_poll_ms: 500,
            macros: Vec::new(),
        }
    }
}

impl AgentConfig {
    /// Zero delays, for tests and scripted runs.
    pub fn without_delays(mut self) -> Self {
        self.step_delay_ms = 0;
        self.chord_delay_ms = 0;
        self.warmup_secs = 0;
        self.archive_settle_ms = 0;
        self
    }

    pub fn step_delay(&self) -> Duration {
        Duration::from_millis(self.step_delay_ms)
    }

    pub fn chord_delay(&self) -> Duration {
        Duration::from_millis(self.chord_delay_ms)
    }

    pub fn warmup(&self) -> Duration {
        Duration::from_secs(self.warmup_secs)
    }

    pub fn archive_settle(&self) -> Duration {
        Duration::from_millis(self.archive_settle_ms)
    }

    pub fn watch_poll(&self) -> Duration {
        // A zero interval would spin
        Duration::from_millis(self.watch_poll_ms.max(10))
    }

    /// Built-in macros with configured ones layered on top.
    pub fn macro_table(&self) -> MacroTable {
        let mut table = MacroTable::builtin();
        for def in &self.macros {
            table.upsert(def.clone());
        }
        table
    }
}

pub struct ConfigManager {
    path: PathBuf,
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigManager {
    pub fn new() -> Self {
        let path = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
            .join("config.toml");
        Self { path }
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Load the config, falling back to defaults when missing or unreadable.
    pub fn load(&self) -> AgentConfig {
        if !self.path.exists() {
            return AgentConfig::default();
        }

        match fs::read_to_string(&self.path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!(path = %self.path.display(), "Ignoring invalid config: {}", e);
                    AgentConfig::default()
                }
            },
            Err(e) => {
                tracing::warn!(path = %self.path.display(), "Cannot read config: {}", e);
                AgentConfig::default()
            }
        }
    }

    pub fn save(&self, config: &AgentConfig) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(config).map_err(|e| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("Failed to serialize config to TOML: {}", e),
            )
        })?;
        fs::write(&self.path, content)
    }
}
