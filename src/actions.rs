//! Internal Action Handler
//!
//! Runs the non-keyboard steps of a macro. The set is closed: every
//! [`InternalAction`] variant has exactly one handler here.

use crate::archive::{ArchiveEntry, ArchiveError, ArchiveLog};
use crate::clipboard::{ClipboardError, ClipboardSource};
use crate::macros::InternalAction;
use std::time::Duration;

/// What an internal action produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    Archived(ArchiveEntry),
}

/// Internal action errors
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    #[error("Clipboard is empty, nothing archived")]
    EmptyClipboard,

    #[error(transparent)]
    Clipboard(#[from] ClipboardError),

    #[error(transparent)]
    Archive(#[from] ArchiveError),

    #[error("No handler for internal action '{0}'")]
    Unrecognized(String),
}

pub struct InternalActionHandler {
    clipboard: Box<dyn ClipboardSource>,
    archive: ArchiveLog,
    /// Pause before reading the clipboard so a preceding copy can land.
    settle_delay: Duration,
}

impl InternalActionHandler {
    pub fn new(clipboard: Box<dyn ClipboardSource>, archive: ArchiveLog, settle_delay: Duration) -> Self {
        Self {
            clipboard,
            archive,
            settle_delay,
        }
    }

    pub fn archive(&self) -> &ArchiveLog {
        &self.archive
    }

    pub fn run(&mut self, action: &InternalAction) -> Result<ActionOutcome, ActionError> {
        match action {
            InternalAction::ArchiveClipboard => self.archive_clipboard(),
            InternalAction::Unrecognized(name) => Err(ActionError::Unrecognized(name.clone())),
        }
    }

    fn archive_clipboard(&mut self) -> Result<ActionOutcome, ActionError> {
        if !self.settle_delay.is_zero() {
            std::thread::sleep(self.settle_delay);
        }

        let text = self.clipboard.read_text()?;
        if text.trim().is_empty() {
            return Err(ActionError::EmptyClipboard);
        }

        let entry = self.archive.append(&text)?;
        tracing::info!(
            seq = entry.sequence_number,
            path = %self.archive.path().display(),
            "Clipboard archived ({} chars)",
            text.chars().count()
        );
        Ok(ActionOutcome::Archived(entry))
    }
}
