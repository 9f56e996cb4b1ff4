use thiserror::Error;

use crate::core::commands::CommandError;
use crate::core::config::ConfigError;
use crate::parser::ParseError;
use crate::process::{LaunchError, ProcessError};

#[derive(Debug, Error)]
pub enum ShellError {
    #[error("Readline error: {0}")]
    Readline(#[from] rustyline::error::ReadlineError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Flag error: {0}")]
    FlagError(String),
    #[error("Config error: {0}")]
    ConfigError(#[from] ConfigError),
    #[error("{0}")]
    ParseError(#[from] ParseError),
    #[error("{0}")]
    CommandError(#[from] CommandError),
    #[error("{0}")]
    ProcessError(#[from] ProcessError),
    #[error("{0}")]
    LaunchError(#[from] LaunchError),
}

impl ShellError {
    /// Only a failed fork takes the whole shell down; everything else is
    /// reported and the prompt loop carries on.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ShellError::ProcessError(ProcessError::Fork(_)))
    }
}
