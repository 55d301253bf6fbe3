//! Structured event logging for Ghost Agent
//!
//! Every dispatch decision is emitted as a [`GhostEvent`]:
//! - always: `tracing`
//! - Linux: also syslog (tag `ghost-agent`) when a socket is there
//!
//! Filter commands:
//! - Linux: `journalctl -t ghost-agent`
//! - Console: `RUST_LOG=ghost_agent=debug ghost-agent ...`

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Event IDs for filtering in system logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u32)]
pub enum EventId {
    // Informational (1000-1099)
    DispatchStart = 1000,
    MacroStarted = 1010,
    MacroCompleted = 1011,
    CommandActuated = 1020,
    ClipboardArchived = 1030,
    WatchStarted = 1040,
    WatchStopped = 1041,

    // Warnings (1100-1199)
    MissingKeybinding = 1100,
    IntentNotFound = 1110,

    // Errors (1200-1299)
    UnknownCommand = 1200,
    ActuationFailed = 1210,
    ArchiveFailed = 1220,
    ClipboardReadFailed = 1230,

    // Critical (1300-1399)
    IndexUnavailable = 1300,
}

/// Log severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warning => write!(f, "WARNING"),
            LogLevel::Error => write!(f, "ERROR"),
            LogLevel::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// Structured log event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GhostEvent {
    pub timestamp: DateTime<Utc>,
    pub event_id: EventId,
    pub level: LogLevel,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub macro_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keybinding: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl GhostEvent {
    pub fn new(event_id: EventId, level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            event_id,
            level,
            message: message.into(),
            intent: None,
            macro_key: None,
            command_id: None,
            keybinding: None,
            reason: None,
        }
    }

    pub fn with_intent(mut self, intent: impl Into<String>) -> Self {
        let intent = intent.into();
        // Truncate for log safety
        self.intent = Some(if intent.chars().count() > 200 {
            intent.chars().take(200).collect()
        } else {
            intent
        });
        self
    }

    pub fn with_macro(mut self, key: impl Into<String>) -> Self {
        self.macro_key = Some(key.into());
        self
    }

    pub fn with_command(mut self, command_id: impl Into<String>) -> Self {
        self.command_id = Some(command_id.into());
        self
    }

    pub fn with_keybinding(mut self, keys: impl Into<String>) -> Self {
        self.keybinding = Some(keys.into());
        self
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Format for syslog-style output
    pub fn to_syslog_format(&self) -> String {
        let mut parts = vec![
            format!("GHOST[{}]", self.event_id as u32),
            format!("level={}", self.level),
        ];

        if let Some(ref intent) = self.intent {
            let escaped = intent.replace('"', "\\\"").replace('\n', " ");
            parts.push(format!("intent=\"{}\"", escaped));
        }
        if let Some(ref key) = self.macro_key {
            parts.push(format!("macro={}", key));
        }
        if let Some(ref cmd) = self.command_id {
            parts.push(format!("cmd={}", cmd));
        }
        if let Some(ref keys) = self.keybinding {
            parts.push(format!("keys=\"{}\"", keys));
        }
        if let Some(ref reason) = self.reason {
            parts.push(format!("reason=\"{}\"", reason.replace('"', "\\\"")));
        }

        parts.push(format!("msg={}", self.message));
        parts.join(" ")
    }
}

#[cfg(target_os = "linux")]
mod linux;

/// Emits [`GhostEvent`]s to `tracing` and, on Linux, to syslog.
pub struct SystemLogger {
    #[cfg(target_os = "linux")]
    syslog: std::sync::Mutex<Option<linux::SyslogSink>>,
}

impl SystemLogger {
    pub fn new() -> Self {
        Self {
            #[cfg(target_os = "linux")]
            syslog: std::sync::Mutex::new(linux::SyslogSink::connect()),
        }
    }

    pub fn log(&self, event: GhostEvent) {
        let line = event.to_syslog_format();
        self.forward(event.level, &line);
        trace_event(event.level, &line);
    }

    #[cfg(target_os = "linux")]
    fn forward(&self, level: LogLevel, line: &str) {
        if let Ok(mut guard) = self.syslog.lock() {
            if let Some(sink) = guard.as_mut() {
                sink.send(level, line);
            }
        }
    }

    #[cfg(not(target_os = "linux"))]
    fn forward(&self, _level: LogLevel, _line: &str) {}
}

impl Default for SystemLogger {
    fn default() -> Self {
        Self::new()
    }
}

fn trace_event(level: LogLevel, line: &str) {
    match level {
        LogLevel::Debug => tracing::debug!("{}", line),
        LogLevel::Info => tracing::info!("{}", line),
        LogLevel::Warning => tracing::warn!("{}", line),
        LogLevel::Error => tracing::error!("{}", line),
        LogLevel::Critical => tracing::error!(critical = true, "{}", line),
    }
}

/// Convenience functions
impl SystemLogger {
    pub fn dispatch_start(&self, intent: &str) {
        self.log(
            GhostEvent::new(EventId::DispatchStart, LogLevel::Info, "Intention received")
                .with_intent(intent),
        );
    }

    pub fn intent_not_found(&self, intent: &str) {
        self.log(
            GhostEvent::new(EventId::IntentNotFound, LogLevel::Warning, "No macro or command matched")
                .with_intent(intent),
        );
    }

    pub fn macro_started(&self, key: &str, name: &str) {
        self.log(
            GhostEvent::new(
                EventId::MacroStarted,
                LogLevel::Info,
                format!("Initiating macro: {}", name),
            )
            .with_macro(key),
        );
    }

    pub fn macro_completed(&self, key: &str, steps: usize, clean: bool) {
        let level = if clean { LogLevel::Info } else { LogLevel::Warning };
        self.log(
            GhostEvent::new(
                EventId::MacroCompleted,
                level,
                format!("Macro completed ({} steps, clean={})", steps, clean),
            )
            .with_macro(key),
        );
    }

    pub fn command_actuated(&self, command_id: &str, keybinding: &str) {
        self.log(
            GhostEvent::new(EventId::CommandActuated, LogLevel::Info, "Command actuated")
                .with_command(command_id)
                .with_keybinding(keybinding),
        );
    }

    pub fn missing_keybinding(&self, command_id: &str) {
        self.log(
            GhostEvent::new(
                EventId::MissingKeybinding,
                LogLevel::Warning,
                "No keybinding assigned (skipping)",
            )
            .with_command(command_id),
        );
    }

    pub fn unknown_command(&self, command_id: &str) {
        self.log(
            GhostEvent::new(
                EventId::UnknownCommand,
                LogLevel::Error,
                "Command id not found in index (skipping)",
            )
            .with_command(command_id),
        );
    }

    pub fn actuation_failed(&self, command_id: &str, chord: &str, error: &str) {
        self.log(
            GhostEvent::new(EventId::ActuationFailed, LogLevel::Error, "Chord injection failed")
                .with_command(command_id)
                .with_keybinding(chord)
                .with_reason(error),
        );
    }

    pub fn clipboard_archived(&self, seq: usize, path: &str) {
        self.log(
            GhostEvent::new(
                EventId::ClipboardArchived,
                LogLevel::Info,
                format!("Archived entry #{} to {}", seq, path),
            ),
        );
    }

    pub fn archive_failed(&self, action: &str, reason: &str) {
        self.log(
            GhostEvent::new(EventId::ArchiveFailed, LogLevel::Error, "Internal action failed")
                .with_command(action)
                .with_reason(reason),
        );
    }

    /// First failure of a run of clipboard read errors in watch mode.
    pub fn clipboard_read_failed(&self, reason: &str) {
        self.log(
            GhostEvent::new(
                EventId::ClipboardReadFailed,
                LogLevel::Warning,
                "Clipboard read failed, still watching",
            )
            .with_reason(reason),
        );
    }

    pub fn clipboard_unavailable(&self, reason: &str) {
        self.log(
            GhostEvent::new(
                EventId::ClipboardReadFailed,
                LogLevel::Error,
                "No clipboard connection, watch mode stopping",
            )
            .with_reason(reason),
        );
    }

    pub fn index_unavailable(&self, reason: &str) {
        self.log(
            GhostEvent::new(
                EventId::IndexUnavailable,
                LogLevel::Critical,
                "Command index unavailable, exiting",
            )
            .with_reason(reason),
        );
    }

    pub fn watch_started(&self, path: &str) {
        self.log(GhostEvent::new(
            EventId::WatchStarted,
            LogLevel::Info,
            format!("Watch mode started, archiving to {}", path),
        ));
    }

    pub fn watch_stopped(&self, archived: usize) {
        self.log(GhostEvent::new(
            EventId::WatchStopped,
            LogLevel::Info,
            format!("Watch mode stopped after {} entries", archived),
        ));
    }
}

/// Collects formatted `tracing` output for assertions.
#[cfg(test)]
pub(crate) mod capture {
    use std::io;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    pub(crate) struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Captured {
        /// Route this thread's events here until the guard drops.
        pub(crate) fn install(&self) -> tracing::subscriber::DefaultGuard {
            let sink = self.clone();
            let subscriber = tracing_subscriber::fmt()
                .with_writer(move || sink.clone())
                .with_ansi(false)
                .with_max_level(tracing::Level::DEBUG)
                .finish();
            tracing::subscriber::set_default(subscriber)
        }

        pub(crate) fn text(&self) -> String {
            self.0
                .lock()
                .map(|buf| String::from_utf8_lossy(&buf).into_owned())
                .unwrap_or_default()
        }
    }

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if let Ok(mut inner) = self.0.lock() {
                inner.extend_from_slice(buf);
            }
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }
}
