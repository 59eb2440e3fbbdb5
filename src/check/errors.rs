use std::{io, path::PathBuf};

use thiserror::Error;

use crate::directive::ParseError;

/// Errors that abort a whole run before any directive executes.
#[derive(Debug, Error)]
pub enum CheckerError {
    #[error("Test file not found: {}", path.display())]
    TranscriptNotFound { path: PathBuf },
    #[error("failed to read test file {}: {source}", path.display())]
    TranscriptUnreadable { path: PathBuf, source: io::Error },
}

/// A recoverable failure of a single directive. The run records it and
/// moves on to the next directive.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CheckError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("Error executing command '{command}' at line {line}: {message}")]
    Execution {
        command: String,
        line: usize,
        message: String,
    },
    #[error("IR dumps not found for method: {fragment}")]
    DumpsNotFound { fragment: String },
    #[error("IR file not found for pass: {pass}")]
    PassNotFound { pass: String },
    #[error("No IR scope selected")]
    NoScope,
    #[error("Instruction not found: {pattern}")]
    InstructionNotFound { pattern: String },
    #[error("Instruction should not exist: {pattern}")]
    UnexpectedInstruction { pattern: String },
    #[error("Block not found: {name}")]
    BlockNotFound { name: String },
    #[error("Instruction count mismatch for {pattern}: expected={expected}, actual={actual}")]
    CountMismatch {
        pattern: String,
        expected: usize,
        actual: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Parse,
    Selection,
    Search,
    CountMismatch,
}

impl CheckError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Parse(_) | Self::Execution { .. } => ErrorCategory::Parse,
            Self::DumpsNotFound { .. } | Self::PassNotFound { .. } | Self::NoScope => {
                ErrorCategory::Selection
            }
            Self::InstructionNotFound { .. }
            | Self::UnexpectedInstruction { .. }
            | Self::BlockNotFound { .. } => ErrorCategory::Search,
            Self::CountMismatch { .. } => ErrorCategory::CountMismatch,
        }
    }
}
