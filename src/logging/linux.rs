//! syslog/journald sink (`journalctl -t ghost-agent`)

use super::LogLevel;
use syslog::{Facility, Formatter3164, Logger, LoggerBackend};

const SYSLOG_TAG: &str = "ghost-agent";

pub(super) struct SyslogSink {
    logger: Logger<LoggerBackend, Formatter3164>,
}

impl SyslogSink {
    /// `None` when there is no syslog socket (containers, CI).
    pub(super) fn connect() -> Option<Self> {
        let formatter = Formatter3164 {
            facility: Facility::LOG_USER,
            hostname: None,
            process: SYSLOG_TAG.into(),
            pid: std::process::id(),
        };

        match syslog::unix(formatter) {
            Ok(logger) => Some(Self { logger }),
            Err(e) => {
                tracing::debug!("syslog unavailable, tracing only: {}", e);
                None
            }
        }
    }

    pub(super) fn send(&mut self, level: LogLevel, line: &str) {
        let sent = match level {
            LogLevel::Debug => self.logger.debug(line),
            LogLevel::Info => self.logger.info(line),
            LogLevel::Warning => self.logger.warning(line),
            LogLevel::Error => self.logger.err(line),
            LogLevel::Critical => self.logger.crit(line),
        };
        if let Err(e) = sent {
            tracing::debug!("syslog write failed: {}", e);
        }
    }
}
