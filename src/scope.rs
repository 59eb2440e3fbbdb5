use crate::pattern::Pattern;

/// A window of IR text lines with a forward-only search position.
///
/// `position` only grows during the lifetime of a cursor. Narrowing into a
/// block produces a brand new cursor starting at 0.
#[derive(Debug, Clone)]
pub struct ScopeCursor {
    lines: Vec<String>,
    position: usize,
    label: String,
}

impl ScopeCursor {
    pub fn new(label: impl Into<String>, lines: Vec<String>) -> Self {
        Self {
            lines,
            position: 0,
            label: label.into(),
        }
    }

    pub fn from_text(label: impl Into<String>, text: &str) -> Self {
        Self::new(label, text.lines().map(str::to_string).collect())
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Finds the first line at or after the position matching `pattern` and
    /// moves past it. On a miss the position is left untouched.
    pub fn find(&mut self, pattern: &Pattern) -> Option<&str> {
        let index = self.index_of(pattern, self.position)?;
        self.position = index + 1;
        Some(&self.lines[index])
    }

    /// Like [`ScopeCursor::find`] but never moves the position.
    pub fn exists(&self, pattern: &Pattern) -> bool {
        self.index_of(pattern, self.position).is_some()
    }

    /// Counts matching lines over the whole scope, ignoring the position.
    /// Lines starting with `header_prefix` (the method signature) never count.
    pub fn count_all(&self, pattern: &Pattern, header_prefix: &str) -> usize {
        self.lines
            .iter()
            .filter(|line| !line.starts_with(header_prefix) && pattern.matches(line))
            .count()
    }

    /// Carves out the block introduced by the first line at or after the
    /// position matching `marker`. The block runs up to (not including) the
    /// next line whose trimmed text starts with `separator`, or to the end.
    ///
    /// The parent position moves to the end of the block.
    pub fn derive_block(&mut self, marker: &Pattern, separator: &str) -> Option<ScopeCursor> {
        let start = self.index_of(marker, self.position)?;
        let end = self.lines[start + 1..]
            .iter()
            .position(|line| line.trim().starts_with(separator))
            .map_or(self.lines.len(), |offset| start + 1 + offset);

        self.position = end;

        Some(ScopeCursor::new(
            format!("block_{marker}"),
            self.lines[start..end].to_vec(),
        ))
    }

    fn index_of(&self, pattern: &Pattern, from: usize) -> Option<usize> {
        self.lines
            .iter()
            .enumerate()
            .skip(from)
            .find(|(_, line)| pattern.matches(line))
            .map(|(index, _)| index)
    }
}

#[cfg(test)]
mod tests {
    use super::ScopeCursor;
    use crate::pattern::Pattern;

    const DUMP: &str = "\
Method: demo.ETSGLOBAL::AppendString
prop: start
  v0 = StringBuilder::<ctor>()
  v1 = Intrinsic.StdCoreSbAppendString(v0, v2)
prop: loop
  v3 = Intrinsic.StdCoreSbAppendString(v1, v4)
  v5 = Intrinsic.StdCoreSbToString(v3)
prop: exit
  return v5";

    fn pat(raw: &str) -> Pattern {
        Pattern::parse(raw).unwrap()
    }

    #[test]
    fn find_moves_forward() {
        let mut scope = ScopeCursor::from_text("IR", DUMP);
        let line = scope.find(&pat("/ToString/")).map(str::to_string);
        assert_eq!(line.as_deref(), Some("  v5 = Intrinsic.StdCoreSbToString(v3)"));
        assert_eq!(scope.position(), 7);

        // The constructor lies before the current position.
        assert!(scope.find(&pat("/StringBuilder::<ctor>/")).is_none());
        assert_eq!(scope.position(), 7);
    }

    #[test]
    fn exists_does_not_move() {
        let mut scope = ScopeCursor::from_text("IR", DUMP);
        assert!(scope.exists(&pat("/return/")));
        assert_eq!(scope.position(), 0);

        scope.find(&pat("/ToString/"));
        assert!(!scope.exists(&pat("/<ctor>/")));
    }

    #[test]
    fn count_ignores_position_and_header() {
        let mut scope = ScopeCursor::from_text("IR", DUMP);
        scope.find(&pat("return"));
        // The header line mentions AppendString too.
        assert_eq!(scope.count_all(&pat("/AppendString/"), "Method:"), 2);
        assert_eq!(scope.count_all(&pat("/AppendString/"), "nothing"), 3);
    }

    #[test]
    fn derive_block_narrows_and_advances_parent() {
        let mut scope = ScopeCursor::from_text("IR", DUMP);
        let block = scope
            .derive_block(&pat("loop").with_prefix("prop: ").unwrap(), "prop:")
            .unwrap();

        assert_eq!(block.position(), 0);
        assert_eq!(block.lines().len(), 3);
        assert_eq!(block.lines()[0], "prop: loop");
        assert!(block.exists(&pat("ToString")));
        assert!(!block.exists(&pat("<ctor>")));
        assert_eq!(scope.position(), 7);
    }

    #[test]
    fn derive_last_block_runs_to_end() {
        let mut scope = ScopeCursor::from_text("IR", DUMP);
        let block = scope.derive_block(&pat("prop: exit"), "prop:").unwrap();
        assert_eq!(block.lines(), ["prop: exit", "  return v5"]);
        assert_eq!(scope.position(), 9);
    }

    #[test]
    fn derive_missing_block() {
        let mut scope = ScopeCursor::from_text("IR", DUMP);
        scope.find(&pat("ToString"));
        assert!(scope.derive_block(&pat("prop: start"), "prop:").is_none());
        assert_eq!(scope.position(), 7);
    }
}
