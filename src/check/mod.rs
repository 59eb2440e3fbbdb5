use std::{
    io,
    ops::Range,
    path::{Path, PathBuf},
};

use ariadne::{ColorGenerator, Label, Report, ReportKind};
use tracing::{debug, error, info, warn};

use crate::{
    binder::{BindError, MethodBinder, PassSide},
    directive::{Directive, DirectiveKind, ParseError, Transcript, parse_transcript},
    driver::config::CheckerConfig,
    pattern::Pattern,
    scope::ScopeCursor,
};

pub use errors::{CheckError, CheckerError, ErrorCategory};
pub use report::{Failure, ValidationReport};

mod errors;
mod report;

/// Everything one validation run mutates. Built fresh per run and consumed
/// into a [`ValidationReport`] at the end.
#[derive(Debug)]
pub struct EngineState {
    pub method: Option<String>,
    pub pass: Option<String>,
    /// The active scope: a whole dump, or a block narrowed out of one.
    pub scope: Option<ScopeCursor>,
    pub binder: MethodBinder,
    pub failures: Vec<Failure>,
    pub warnings: Vec<String>,
}

impl EngineState {
    pub fn new(binder: MethodBinder) -> Self {
        Self {
            method: None,
            pass: None,
            scope: None,
            binder,
            failures: Vec::new(),
            warnings: Vec::new(),
        }
    }

    fn fail(&mut self, line: usize, error: CheckError) {
        let failure = Failure {
            line,
            method: self.method.clone(),
            pass: self.pass.clone(),
            error,
        };
        error!("{failure}");
        self.failures.push(failure);
    }

    fn scope_mut(&mut self) -> Result<&mut ScopeCursor, CheckError> {
        self.scope.as_mut().ok_or(CheckError::NoScope)
    }

    fn load_scope(&mut self, scope: ScopeCursor) {
        if let Some(file) = self.binder.current() {
            info!("Loaded IR file: {}", file.path.display());
        }
        self.scope = Some(scope);
    }

    pub fn into_report(self) -> ValidationReport {
        ValidationReport {
            failures: self.failures,
            warnings: self.warnings,
        }
    }
}

/// Runs transcripts against the dumps of one work directory.
#[derive(Debug, Clone)]
pub struct Checker {
    work_dir: PathBuf,
    config: CheckerConfig,
}

impl Checker {
    pub fn new(work_dir: impl Into<PathBuf>, config: CheckerConfig) -> Self {
        Self {
            work_dir: work_dir.into(),
            config,
        }
    }

    pub fn dump_dir(&self) -> PathBuf {
        self.work_dir.join(&self.config.dump_dir)
    }

    /// Reads and checks a test source. Only a missing or unreadable file
    /// aborts; every directive failure ends up in the report.
    pub fn run_file(&self, path: &Path) -> Result<ValidationReport, CheckerError> {
        info!("Starting validation for: {}", path.display());
        let source = std::fs::read_to_string(path).map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => CheckerError::TranscriptNotFound {
                path: path.to_path_buf(),
            },
            _ => CheckerError::TranscriptUnreadable {
                path: path.to_path_buf(),
                source,
            },
        })?;
        Ok(self.run_source(&source))
    }

    pub fn run_source(&self, source: &str) -> ValidationReport {
        let transcript = parse_transcript(source, &self.config.directive_syntax());
        self.execute(&transcript)
    }

    /// Executes the transcript strictly in source order. A failing directive
    /// is recorded and the run continues with the next one.
    pub fn execute(&self, transcript: &Transcript) -> ValidationReport {
        let binder = MethodBinder::new(self.dump_dir(), self.config.dump_extension.as_str());
        let mut state = EngineState::new(binder);

        for entry in &transcript.entries {
            match entry {
                Ok(directive) => {
                    if let Err(error) = self.step(&mut state, directive) {
                        state.fail(directive.line, error);
                    }
                }
                Err(error) => state.fail(error.line(), CheckError::Parse(error.clone())),
            }
        }

        state.into_report()
    }

    fn step(&self, state: &mut EngineState, directive: &Directive) -> Result<(), CheckError> {
        match &directive.kind {
            DirectiveKind::Method(name) => select_method(state, directive, name),
            DirectiveKind::PassBefore(pass) => {
                select_pass(state, directive, pass, PassSide::Before)
            }
            DirectiveKind::PassAfter(pass) => select_pass(state, directive, pass, PassSide::After),
            DirectiveKind::InBlock(name) => self.in_block(state, directive, name),
            DirectiveKind::Inst(pattern) => {
                let scope = state.scope_mut()?;
                info!("Searching for instruction: {pattern}");
                match scope.find(pattern) {
                    Some(line) => {
                        debug!("matched {line:?}");
                        Ok(())
                    }
                    None => Err(CheckError::InstructionNotFound {
                        pattern: pattern.to_string(),
                    }),
                }
            }
            DirectiveKind::InstNot(pattern) => {
                let scope = state.scope_mut()?;
                info!("Verifying instruction not present: {pattern}");
                if scope.exists(pattern) {
                    return Err(CheckError::UnexpectedInstruction {
                        pattern: pattern.to_string(),
                    });
                }
                Ok(())
            }
            DirectiveKind::InstCount { pattern, count } => {
                let scope = state.scope_mut()?;
                let actual = scope.count_all(pattern, &self.config.header_prefix);
                info!("Counting instruction: {pattern}, expected: {count}, actual: {actual}");
                if actual != *count {
                    return Err(CheckError::CountMismatch {
                        pattern: pattern.to_string(),
                        expected: *count,
                        actual,
                    });
                }
                Ok(())
            }
            DirectiveKind::Reserved(command) => {
                debug!("skipping {command} at line {}", directive.line);
                Ok(())
            }
            DirectiveKind::Unknown(token) => {
                let message = format!("Unknown command: {token} at line {}", directive.line);
                warn!("{message}");
                state.warnings.push(message);
                Ok(())
            }
        }
    }

    fn in_block(
        &self,
        state: &mut EngineState,
        directive: &Directive,
        name: &Pattern,
    ) -> Result<(), CheckError> {
        let scope = state.scope_mut()?;
        info!("Searching in block: {name}");

        let marker = name
            .with_prefix(&self.config.block_prefix)
            .map_err(|e| execution_error(directive, e))?;
        let block = scope
            .derive_block(&marker, &self.config.block_separator)
            .ok_or_else(|| CheckError::BlockNotFound {
                name: name.to_string(),
            })?;

        debug!("narrowed to {} ({} lines)", block.label(), block.lines().len());
        state.scope = Some(block);
        Ok(())
    }
}

fn select_method(
    state: &mut EngineState,
    directive: &Directive,
    name: &str,
) -> Result<(), CheckError> {
    info!("Selecting method: {name}");
    state.method = Some(name.to_string());
    state.pass = None;
    // A failed bind must not leave the previous method's dump in scope.
    state.scope = None;

    let scope = state
        .binder
        .bind(name)
        .map_err(|e| bind_error(directive, e))?;
    state.load_scope(scope);
    info!(
        "Found {} IR files for method: {name}",
        state.binder.files().len()
    );
    Ok(())
}

fn select_pass(
    state: &mut EngineState,
    directive: &Directive,
    pass: &str,
    side: PassSide,
) -> Result<(), CheckError> {
    info!("Selecting pass {side}: {pass}");
    state.pass = Some(format!("Pass {side}: {pass}"));

    let scope = state
        .binder
        .select_pass(pass, side)
        .map_err(|e| bind_error(directive, e))?;
    state.load_scope(scope);
    Ok(())
}

fn bind_error(directive: &Directive, error: BindError) -> CheckError {
    match error {
        BindError::DumpsNotFound { fragment } => CheckError::DumpsNotFound { fragment },
        BindError::PassNotFound { pass } => CheckError::PassNotFound { pass },
        e @ BindError::Io { .. } => execution_error(directive, e),
    }
}

fn execution_error(directive: &Directive, error: impl std::fmt::Display) -> CheckError {
    CheckError::Execution {
        command: directive.command_name().to_string(),
        line: directive.line,
        message: error.to_string(),
    }
}

/// A byte range inside a transcript, labeled with the transcript's path.
#[derive(Debug, Clone)]
pub struct FileSpan {
    pub span: Range<usize>,
    pub path: String,
}

impl FileSpan {
    pub fn new(path: String, span: Range<usize>) -> Self {
        Self { path, span }
    }
}

impl ariadne::Span for FileSpan {
    type SourceId = String;

    fn source(&self) -> &Self::SourceId {
        &self.path
    }

    fn start(&self) -> usize {
        self.span.start
    }

    fn end(&self) -> usize {
        self.span.end
    }
}

/// Byte range of the 1-based `line` in `source`, without its line break.
pub fn line_span(source: &str, line: usize) -> Range<usize> {
    let mut start = 0;
    for (index, text) in source.split_inclusive('\n').enumerate() {
        if index + 1 == line {
            let len = text.trim_end_matches(['\n', '\r']).len();
            return start..start + len;
        }
        start += text.len();
    }
    source.len()..source.len()
}

/// Creates a report pointing at a malformed directive line.
pub fn parse_error_to_report(
    error: &ParseError,
    path: &str,
    transcript: &str,
) -> Report<'static, FileSpan> {
    let mut colors = ColorGenerator::new();
    colors.next();

    let filespan = FileSpan::new(path.to_string(), line_span(transcript, error.line()));
    let (code, label) = match error {
        ParseError::InvalidFormat { command, .. } => (
            "InvalidFormat",
            format!("{command} arguments don't follow the expected syntax."),
        ),
        ParseError::InvalidPattern { source, .. } => ("InvalidPattern", source.to_string()),
    };

    Report::build(ReportKind::Error, filespan.clone())
        .with_code(code)
        .with_label(
            Label::new(filespan)
                .with_message(label)
                .with_color(colors.next()),
        )
        .with_message(format!("Malformed {} directive.", error.command()))
        .finish()
}
