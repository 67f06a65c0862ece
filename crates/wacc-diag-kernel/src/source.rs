//! Source text with its masked twin, and line/column bookkeeping.
//!
//! Analysis never looks at comments or string/char literal contents, so every
//! pass scans a *masked* copy of the document where those spans are replaced
//! by `*`. Masking is byte-length preserving, which is what lets a diagnostic
//! found in the masked text be reported against the original.

/// Starts a comment that runs to the end of the line.
pub const COMMENT_MARKER: char = '#';

/// Byte written over every masked byte.
pub const MASK_PLACEHOLDER: char = '*';

/// Replace comments and quoted literals with placeholders.
///
/// Each masked character becomes as many `*` bytes as its UTF-8 encoding
/// takes, so `mask(text).len() == text.len()` and every byte offset is valid
/// in both strings. Newlines are never masked. A literal left unterminated
/// is masked up to the end of its line.
pub fn mask(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            COMMENT_MARKER => {
                push_masked(&mut out, ch);
                while let Some(&next) = chars.peek() {
                    if next == '\n' {
                        break;
                    }
                    push_masked(&mut out, next);
                    chars.next();
                }
            }
            '"' | '\'' => {
                push_masked(&mut out, ch);
                while let Some(&next) = chars.peek() {
                    if next == '\n' {
                        break;
                    }
                    chars.next();
                    push_masked(&mut out, next);
                    if next == '\\' {
                        // An escape swallows the following character, quotes included
                        if let Some(&escaped) = chars.peek() {
                            if escaped != '\n' {
                                chars.next();
                                push_masked(&mut out, escaped);
                            }
                        }
                    } else if next == ch {
                        break;
                    }
                }
            }
            _ => out.push(ch),
        }
    }

    out
}

fn push_masked(out: &mut String, ch: char) {
    for _ in 0..ch.len_utf8() {
        out.push(MASK_PLACEHOLDER);
    }
}

/// A 0-based line and character column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

/// Byte offsets of line starts, for offset ↔ (line, column) conversion.
#[derive(Debug, Clone)]
pub struct LineIndex {
    line_starts: Vec<usize>,
    len: usize,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            text.bytes()
                .enumerate()
                .filter(|(_, b)| *b == b'\n')
                .map(|(i, _)| i + 1),
        );
        Self {
            line_starts,
            len: text.len(),
        }
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Position of a byte offset. Offsets past the end clamp to the end.
    pub fn position(&self, text: &str, offset: usize) -> Position {
        let offset = offset.min(self.len);
        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next - 1,
        };
        let start = self.line_starts[line];
        let column = text
            .get(start..offset)
            .map(|s| s.chars().count())
            .unwrap_or(offset - start);
        Position { line, column }
    }

    /// Byte offset of a 0-based line and character column.
    ///
    /// A line past the last one yields the text length. The column is walked
    /// as characters from the line start and may run past the line's end,
    /// but never past the end of the text.
    pub fn offset(&self, text: &str, position: Position) -> usize {
        let Some(&start) = self.line_starts.get(position.line) else {
            return self.len;
        };
        text.get(start..)
            .and_then(|rest| rest.char_indices().nth(position.column))
            .map(|(i, _)| start + i)
            .unwrap_or(self.len)
    }
}

/// One document snapshot: the original text and its masked twin.
///
/// Built fresh for every validation pass.
#[derive(Debug, Clone)]
pub struct SourceText {
    original: String,
    masked: String,
    lines: LineIndex,
}

impl SourceText {
    pub fn new(text: impl Into<String>) -> Self {
        let original = text.into();
        let masked = mask(&original);
        let lines = LineIndex::new(&original);
        Self {
            original,
            masked,
            lines,
        }
    }

    pub fn original(&self) -> &str {
        &self.original
    }

    pub fn masked(&self) -> &str {
        &self.masked
    }

    pub fn len(&self) -> usize {
        self.original.len()
    }

    pub fn is_empty(&self) -> bool {
        self.original.is_empty()
    }

    pub fn lines(&self) -> &LineIndex {
        &self.lines
    }

    pub fn position(&self, offset: usize) -> Position {
        self.lines.position(&self.original, offset)
    }

    pub fn offset(&self, position: Position) -> usize {
        self.lines.offset(&self.original, position)
    }
}
