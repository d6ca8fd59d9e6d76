// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Source location tracking.

/// A byte range in a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Smallest span covering both `self` and `other`.
    pub fn to(self, other: Span) -> Span {
        Span::new(self.start.min(other.start), self.end.max(other.end))
    }
}

/// Precomputed line-start offsets for O(log n) byte-offset → line:col lookup.
#[derive(Debug, Clone)]
pub struct LineMap {
    /// Byte offset of the start of each line. line_starts[0] is always 0.
    line_starts: Vec<u32>,
}

impl LineMap {
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0u32];
        for (i, b) in source.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push((i + 1) as u32);
            }
        }
        LineMap { line_starts }
    }

    /// Convert byte offset to (line, col), both 1-based.
    pub fn offset_to_line_col(&self, offset: usize) -> (u32, u32) {
        let line_idx = self.line_index(offset);
        let col = offset as u32 - self.line_starts[line_idx] + 1;
        ((line_idx + 1) as u32, col)
    }

    /// Byte offset where the line containing `offset` begins.
    pub fn line_start(&self, offset: usize) -> usize {
        self.line_starts[self.line_index(offset)] as usize
    }

    /// Source text of a 1-based line number, without its newline.
    pub fn line_text<'a>(&self, source: &'a str, line: u32) -> Option<&'a str> {
        let idx = (line as usize).checked_sub(1)?;
        let start = *self.line_starts.get(idx)? as usize;
        let end = self
            .line_starts
            .get(idx + 1)
            .map(|&s| (s as usize).saturating_sub(1))
            .unwrap_or(source.len());
        source.get(start..end)
    }

    pub fn line_count(&self) -> u32 {
        self.line_starts.len() as u32
    }

    fn line_index(&self, offset: usize) -> usize {
        match self.line_starts.binary_search(&(offset as u32)) {
            Ok(i) => i,
            Err(i) => i.saturating_sub(1),
        }
    }
}

/// Text of one compiled unit together with its label and line map.
///
/// Spans in a tree index into `text`. The label is what diagnostics print
/// in front of `line:col`.
#[derive(Debug)]
pub struct SourceFile {
    pub label: String,
    pub text: String,
    pub lines: LineMap,
}

impl SourceFile {
    pub fn new(label: impl Into<String>, text: impl Into<String>) -> Self {
        let text = text.into();
        let lines = LineMap::new(&text);
        Self { label: label.into(), text, lines }
    }

    /// Text of `span`, widened to start at the beginning of its first line so
    /// the leading indentation is kept.
    pub fn lines_of(&self, span: Span) -> &str {
        let start = self.lines.line_start(span.start);
        let end = span.end.min(self.text.len());
        self.text.get(start..end).unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_source() {
        let lm = LineMap::new("");
        assert_eq!(lm.offset_to_line_col(0), (1, 1));
        assert_eq!(lm.line_count(), 1);
    }

    #[test]
    fn lines_and_columns() {
        let src = "def f():\n    pass\n";
        let lm = LineMap::new(src);
        assert_eq!(lm.line_count(), 3);
        assert_eq!(lm.offset_to_line_col(0), (1, 1));
        assert_eq!(lm.offset_to_line_col(13), (2, 5)); // 'p'
        assert_eq!(lm.line_text(src, 2), Some("    pass"));
        assert_eq!(lm.line_text(src, 3), Some(""));
        assert_eq!(lm.line_text(src, 4), None);
    }

    #[test]
    fn newline_belongs_to_its_line() {
        let lm = LineMap::new("ab\ncd\n");
        assert_eq!(lm.offset_to_line_col(2), (1, 3));
        assert_eq!(lm.offset_to_line_col(3), (2, 1));
    }

    #[test]
    fn line_start_of_offset() {
        let lm = LineMap::new("x = 1\n    y\n");
        assert_eq!(lm.line_start(3), 0);
        assert_eq!(lm.line_start(10), 6);
    }

    #[test]
    fn lines_of_keeps_indentation() {
        let file = SourceFile::new("<test>", "if x:\n    def f():\n        pass\n");
        // span of `def f(): pass` starts at the `d`
        let span = Span::new(10, 31);
        assert_eq!(file.lines_of(span), "    def f():\n        pass");
    }

    #[test]
    fn span_cover() {
        assert_eq!(Span::new(4, 6).to(Span::new(1, 5)), Span::new(1, 6));
    }
}
