use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::directive::DirectiveSyntax;

/// Checker settings, optionally loaded from a TOML file.
///
/// Every field falls back to the conventions of the compiler's dump
/// format, so an empty file is a valid config.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CheckerConfig {
    /// Prefix marking a directive line in the test source.
    pub directive_marker: String,
    /// Subdirectory of the work dir holding the dumps.
    pub dump_dir: String,
    /// Extension of dump files, without the dot.
    pub dump_extension: String,
    /// Lines starting with this are the method signature and never counted.
    pub header_prefix: String,
    /// Prepended to an `IN_BLOCK` name to find the block start.
    pub block_prefix: String,
    /// A line whose trimmed text starts with this opens the next block.
    pub block_separator: String,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            directive_marker: "//!".to_string(),
            dump_dir: "ir_dump".to_string(),
            dump_extension: "ir".to_string(),
            header_prefix: "Method:".to_string(),
            block_prefix: "prop: ".to_string(),
            block_separator: "prop:".to_string(),
        }
    }
}

impl CheckerConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&text)?)
    }

    pub fn directive_syntax(&self) -> DirectiveSyntax {
        DirectiveSyntax {
            marker: self.directive_marker.clone(),
        }
    }
}
