//! Sentinel - watch mode clipboard harvester
//!
//! ```text
//!   watcher thread (owns the clipboard)          async loop
//!   ┌──────────────────────────────┐   mpsc    ┌───────────────────────────┐
//!   │ poll every N ms (monotonic)  │ ───────►  │ select!                   │
//!   │ send only new, non-blank text│           │  - cancel token           │
//!   │ exit when token is cancelled │           │  - next clipboard text    │──► archive log
//!   └──────────────────────────────┘           │  - heartbeat              │
//!                                              └───────────────────────────┘
//! ```
//!
//! Content already on the clipboard when the watch starts is the baseline and
//! is not archived. Only one sentinel should run against an archive at a time.
//! Read errors are counted and the first of each run is logged as a warning;
//! a missing clipboard connection ends the watch with an error.

use crate::archive::ArchiveLog;
use crate::clipboard::{ClipboardError, ClipboardSource};
use crate::logging::SystemLogger;
use serde::Serialize;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

const CHANNEL_CAPACITY: usize = 32;
const HEARTBEAT: Duration = Duration::from_secs(60);

/// Totals for one watch session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WatchSummary {
    pub archived: usize,
    /// Archive writes that failed
    pub failures: usize,
    /// Clipboard reads that failed
    pub read_failures: usize,
    pub elapsed: Duration,
}

/// Sentinel errors
#[derive(Debug, thiserror::Error)]
pub enum SentinelError {
    #[error("Failed to start clipboard watcher: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("Clipboard unavailable: {0}")]
    ClipboardUnavailable(String),
}

/// What the watcher thread reports.
#[derive(Debug)]
enum Harvest {
    Text(String),
    /// A read failed. `first` marks the start of a run of failures.
    ReadFailed { reason: String, first: bool },
    /// No clipboard connection at all; the watcher has stopped.
    Unavailable(String),
}

/// Poll the clipboard on a dedicated thread and forward changes.
///
/// The clipboard is built inside the thread by `make_clipboard`, so sources
/// that are not `Send` still work.
fn spawn_clipboard_watcher<F>(
    make_clipboard: F,
    poll: Duration,
    cancel: CancellationToken,
    tx: mpsc::Sender<Harvest>,
) -> std::io::Result<JoinHandle<()>>
where
    F: FnOnce() -> Box<dyn ClipboardSource> + Send + 'static,
{
    std::thread::Builder::new()
        .name("clipboard-watcher".into())
        .spawn(move || {
            let mut clipboard = make_clipboard();
            let mut last = clipboard.read_text().unwrap_or_default();
            let mut failing = false;
            let mut next_tick = Instant::now() + poll;

            while !cancel.is_cancelled() {
                let now = Instant::now();
                if next_tick > now {
                    std::thread::sleep(next_tick - now);
                }
                next_tick += poll;

                if cancel.is_cancelled() {
                    break;
                }

                let harvest = match clipboard.read_text() {
                    Ok(text) => {
                        failing = false;
                        if text == last || text.trim().is_empty() {
                            continue;
                        }
                        last = text.clone();
                        Harvest::Text(text)
                    }
                    Err(ClipboardError::Unavailable(reason)) => {
                        let _ = tx.blocking_send(Harvest::Unavailable(reason));
                        break;
                    }
                    Err(e) => {
                        let first = !failing;
                        failing = true;
                        Harvest::ReadFailed {
                            reason: e.to_string(),
                            first,
                        }
                    }
                };

                if tx.blocking_send(harvest).is_err() {
                    // Receiver gone
                    break;
                }
            }
            tracing::debug!("Clipboard watcher exiting");
        })
}

pub struct Sentinel {
    archive: ArchiveLog,
    poll: Duration,
    logger: SystemLogger,
}

impl Sentinel {
    pub fn new(archive: ArchiveLog, poll: Duration) -> Self {
        Self {
            archive,
            poll,
            logger: SystemLogger::new(),
        }
    }

    /// Archive clipboard changes until `cancel` fires.
    ///
    /// Stops early with [`SentinelError::ClipboardUnavailable`] when there is
    /// no clipboard to watch.
    pub async fn run<F>(&self, make_clipboard: F, cancel: CancellationToken) -> Result<WatchSummary, SentinelError>
    where
        F: FnOnce() -> Box<dyn ClipboardSource> + Send + 'static,
    {
        let started = Instant::now();
        let (tx, mut rx) = mpsc::channel::<Harvest>(CHANNEL_CAPACITY);
        let watcher = spawn_clipboard_watcher(make_clipboard, self.poll, cancel.clone(), tx)?;

        let archive_path = self.archive.path().display().to_string();
        self.logger.watch_started(&archive_path);

        let mut heartbeat = tokio::time::interval(HEARTBEAT);
        heartbeat.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        let mut summary = WatchSummary::default();
        let mut fatal = None;
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                next = rx.recv() => match next {
                    Some(Harvest::Text(text)) => match self.archive.append(&text) {
                        Ok(entry) => {
                            summary.archived += 1;
                            self.logger.clipboard_archived(entry.sequence_number, &archive_path);
                            let preview: String = text.chars().take(30).collect();
                            tracing::debug!(
                                seq = entry.sequence_number,
                                "Saved {} chars: {}...",
                                text.chars().count(),
                                preview.replace('\n', " ")
                            );
                        }
                        Err(e) => {
                            summary.failures += 1;
                            self.logger.archive_failed("watch", &e.to_string());
                        }
                    },
                    Some(Harvest::ReadFailed { reason, first }) => {
                        summary.read_failures += 1;
                        if first {
                            self.logger.clipboard_read_failed(&reason);
                        } else {
                            tracing::debug!("Clipboard read failed again: {}", reason);
                        }
                    }
                    Some(Harvest::Unavailable(reason)) => {
                        self.logger.clipboard_unavailable(&reason);
                        fatal = Some(SentinelError::ClipboardUnavailable(reason));
                        break;
                    }
                    None => break,
                },
                _ = heartbeat.tick() => {
                    tracing::debug!(archived = summary.archived, "Sentinel watching");
                }
            }
        }

        // Stop the watcher if we left for any other reason, then reap it
        cancel.cancel();
        drop(rx);
        if tokio::task::spawn_blocking(move || watcher.join())
            .await
            .map(|joined| joined.is_err())
            .unwrap_or(true)
        {
            tracing::warn!("Clipboard watcher did not shut down cleanly");
        }

        summary.elapsed = started.elapsed();
        self.logger.watch_stopped(summary.archived);
        match fatal {
            Some(err) => Err(err),
            None => Ok(summary),
        }
    }
}
