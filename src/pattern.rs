use std::fmt;

use regex::Regex;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PatternError {
    #[error("empty pattern")]
    Empty,
    #[error("unterminated regex {0:?}")]
    Unterminated(String),
    #[error("invalid regex {pattern:?}: {message}")]
    InvalidRegex { pattern: String, message: String },
}

/// A search pattern as written in a directive argument.
///
/// `/payload/` is an unanchored regular expression, anything else is a
/// literal substring. The delimiters are only inspected here, once. A regex
/// payload runs up to the next `/` and any text after it is ignored.
#[derive(Debug, Clone)]
pub enum Pattern {
    Literal(String),
    Regex(Regex),
}

impl Pattern {
    pub fn parse(raw: &str) -> Result<Self, PatternError> {
        let raw = raw.trim();

        if let Some(rest) = raw.strip_prefix('/') {
            let Some((payload, trailing)) = rest.split_once('/') else {
                return Err(PatternError::Unterminated(raw.to_string()));
            };
            if !trailing.trim().is_empty() {
                debug!("ignoring text after /{payload}/: {trailing:?}");
            }
            return Self::regex(payload);
        }

        let literal = raw
            .strip_prefix('"')
            .and_then(|x| x.strip_suffix('"'))
            .unwrap_or(raw);

        Self::literal(literal)
    }

    pub fn literal(text: &str) -> Result<Self, PatternError> {
        if text.is_empty() {
            return Err(PatternError::Empty);
        }
        Ok(Self::Literal(text.to_string()))
    }

    pub fn regex(payload: &str) -> Result<Self, PatternError> {
        if payload.is_empty() {
            return Err(PatternError::Empty);
        }
        Regex::new(payload)
            .map(Self::Regex)
            .map_err(|e| PatternError::InvalidRegex {
                pattern: payload.to_string(),
                message: e.to_string(),
            })
    }

    pub fn matches(&self, line: &str) -> bool {
        match self {
            Self::Literal(text) => line.contains(text.as_str()),
            Self::Regex(re) => re.is_match(line),
        }
    }

    /// Returns a pattern that only matches when `prefix` directly precedes
    /// this pattern. The prefix is always taken literally.
    pub fn with_prefix(&self, prefix: &str) -> Result<Self, PatternError> {
        match self {
            Self::Literal(text) => Ok(Self::Literal(format!("{prefix}{text}"))),
            Self::Regex(re) => {
                Self::regex(&format!("{}{}", regex::escape(prefix), re.as_str()))
            }
        }
    }

    pub fn is_regex(&self) -> bool {
        matches!(self, Self::Regex(_))
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(text) => f.write_str(text),
            Self::Regex(re) => f.write_str(re.as_str()),
        }
    }
}
