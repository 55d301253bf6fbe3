//! Ghost Agent Core - configuration and top-level errors

pub mod config;

pub use config::{AgentConfig, ConfigManager};

use crate::index::IndexError;
use crate::input::InputError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GhostError {
    /// Opening or querying the command index failed. At startup this is fatal.
    #[error("Command index error: {0}")]
    Index(#[from] IndexError),

    #[error("Input unavailable: {0}")]
    InputUnavailable(#[from] InputError),
}
