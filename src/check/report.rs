use std::fmt;

use super::errors::CheckError;

/// A recorded directive failure together with the context it happened in.
#[derive(Debug, Clone, PartialEq)]
pub struct Failure {
    /// Transcript line of the failing directive.
    pub line: usize,
    pub method: Option<String>,
    pub pass: Option<String>,
    pub error: CheckError,
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Test failed: {}",
            self.method.as_deref().unwrap_or("unknown")
        )?;
        if let Some(pass) = &self.pass {
            write!(f, " (Pass: {pass})")?;
        }
        write!(f, " - {}", self.error)
    }
}

#[derive(Debug, Default)]
pub struct ValidationReport {
    pub failures: Vec<Failure>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn verdict(&self) -> String {
        if self.is_success() {
            "Validation completed successfully!".to_string()
        } else {
            format!("Validation failed with {} errors:", self.failures.len())
        }
    }

    /// The verdict line followed by one line per failure.
    pub fn render(&self) -> String {
        let mut out = self.verdict();
        for failure in &self.failures {
            out.push_str(&format!("\n  - {failure}"));
        }
        out
    }
}
