use std::{
    fmt, io,
    path::PathBuf,
    sync::LazyLock,
};

use regex::Regex;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::scope::ScopeCursor;

static SEPARATOR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"::|[<>.\-]").unwrap());

#[derive(Debug, Error)]
pub enum BindError {
    #[error("IR dumps not found for method: {fragment}")]
    DumpsNotFound { fragment: String },
    #[error("IR file not found for pass: {pass}")]
    PassNotFound { pass: String },
    #[error("failed to read {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },
}

/// One pass snapshot of one method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpFile {
    pub path: PathBuf,
    pub filename: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassSide {
    /// The snapshot taken right before the pass ran.
    Before,
    /// The snapshot the pass itself produced.
    After,
}

impl fmt::Display for PassSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Before => f.write_str("before"),
            Self::After => f.write_str("after"),
        }
    }
}

/// Turns a qualified method name into the fragment used in dump filenames,
/// e.g. `a.ETSGLOBAL::f` becomes `a_ETSGLOBAL_f`.
pub fn sanitize_method(method: &str) -> String {
    SEPARATOR_RE.replace_all(method, "_").into_owned()
}

/// Locates the dump files of a method and hands out cursors over them.
#[derive(Debug)]
pub struct MethodBinder {
    dump_dir: PathBuf,
    extension: String,
    files: Vec<DumpFile>,
    index: usize,
}

impl MethodBinder {
    pub fn new(dump_dir: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            dump_dir: dump_dir.into(),
            extension: extension.into(),
            files: Vec::new(),
            index: 0,
        }
    }

    /// The dump files of the bound method, in pass order.
    pub fn files(&self) -> &[DumpFile] {
        &self.files
    }

    pub fn current(&self) -> Option<&DumpFile> {
        self.files.get(self.index)
    }

    pub fn clear(&mut self) {
        self.files.clear();
        self.index = 0;
    }

    /// Binds `method` and returns a cursor over its first dump. On any error
    /// the binder is left with no method bound.
    ///
    /// Filenames embed zero padded sequence numbers, so lexicographic order
    /// is pass execution order.
    #[instrument(level = "debug", skip(self))]
    pub fn bind(&mut self, method: &str) -> Result<ScopeCursor, BindError> {
        self.clear();
        let fragment = sanitize_method(method);
        debug!("processed method name: {fragment}");

        let mut files = self.list_dumps(&fragment)?;
        if files.is_empty() {
            return Err(BindError::DumpsNotFound { fragment });
        }
        files.sort_by(|a, b| a.filename.cmp(&b.filename));
        debug!(
            "candidate dumps: {}",
            itertools::join(files.iter().map(|x| x.filename.as_str()), ", ")
        );

        self.files = files;
        self.rebind(0).inspect_err(|_| self.clear())
    }

    /// Rebinds to the dump around the first file whose name contains `pass`.
    #[instrument(level = "debug", skip(self))]
    pub fn select_pass(&mut self, pass: &str, side: PassSide) -> Result<ScopeCursor, BindError> {
        let found = self
            .files
            .iter()
            .position(|x| x.filename.contains(pass))
            .ok_or_else(|| BindError::PassNotFound {
                pass: pass.to_string(),
            })?;

        let index = match side {
            PassSide::Before => found.saturating_sub(1),
            PassSide::After => found,
        };
        self.rebind(index)
    }

    fn rebind(&mut self, index: usize) -> Result<ScopeCursor, BindError> {
        let file = &self.files[index];
        let text = std::fs::read_to_string(&file.path).map_err(|source| BindError::Io {
            path: file.path.clone(),
            source,
        })?;
        self.index = index;
        Ok(ScopeCursor::from_text("IR", &text))
    }

    fn list_dumps(&self, fragment: &str) -> Result<Vec<DumpFile>, BindError> {
        let entries = match std::fs::read_dir(&self.dump_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(BindError::Io {
                    path: self.dump_dir.clone(),
                    source,
                });
            }
        };

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| BindError::Io {
                path: self.dump_dir.clone(),
                source,
            })?;
            let path = entry.path();
            if !path.is_file()
                || path.extension().and_then(|x| x.to_str()) != Some(self.extension.as_str())
            {
                continue;
            }
            let Some(filename) = path.file_name().and_then(|x| x.to_str()) else {
                continue;
            };
            if filename.contains(fragment) {
                files.push(DumpFile {
                    filename: filename.to_string(),
                    path,
                });
            }
        }

        Ok(files)
    }
}
