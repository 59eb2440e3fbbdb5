use thiserror::Error;

use crate::pattern::PatternError;

use super::Command;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParseError {
    #[error("Invalid {command} format at line {line}")]
    InvalidFormat {
        command: Command,
        line: usize,
        args: String,
    },
    #[error("Invalid {command} format at line {line}: {source}")]
    InvalidPattern {
        command: Command,
        line: usize,
        args: String,
        source: PatternError,
    },
}

impl ParseError {
    pub fn line(&self) -> usize {
        match self {
            Self::InvalidFormat { line, .. } | Self::InvalidPattern { line, .. } => *line,
        }
    }

    pub fn command(&self) -> Command {
        match self {
            Self::InvalidFormat { command, .. } | Self::InvalidPattern { command, .. } => *command,
        }
    }
}
