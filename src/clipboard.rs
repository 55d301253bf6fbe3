//! Text clipboard access.

use arboard::Clipboard;

/// Clipboard errors
#[derive(Debug, thiserror::Error)]
pub enum ClipboardError {
    #[error("Clipboard not available: {0}")]
    Unavailable(String),

    #[error("Clipboard read failed: {0}")]
    ReadFailed(String),
}

/// Source of clipboard text.
pub trait ClipboardSource {
    fn read_text(&mut self) -> Result<String, ClipboardError>;
}

/// The OS clipboard, via `arboard`.
pub struct SystemClipboard {
    clipboard: Option<Clipboard>,
}

impl SystemClipboard {
    pub fn new() -> Self {
        // Initialize eagerly but keep going without one
        let clipboard = match Clipboard::new() {
            Ok(c) => Some(c),
            Err(e) => {
                tracing::warn!("Failed to initialize clipboard: {}", e);
                None
            }
        };
        Self { clipboard }
    }
}

impl Default for SystemClipboard {
    fn default() -> Self {
        Self::new()
    }
}

impl ClipboardSource for SystemClipboard {
    fn read_text(&mut self) -> Result<String, ClipboardError> {
        let cb = self
            .clipboard
            .as_mut()
            .ok_or_else(|| ClipboardError::Unavailable("no clipboard connection".into()))?;

        match cb.get_text() {
            Ok(text) => Ok(text),
            // Non-text content reads the same as an empty clipboard
            Err(arboard::Error::ContentNotAvailable) => Ok(String::new()),
            Err(e) => Err(ClipboardError::ReadFailed(e.to_string())),
        }
    }
}
