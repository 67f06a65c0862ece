//! Translating the external analyzer's text output into diagnostics.
//!
//! The analyzer prints one message per line. A line of interest looks like
//!
//! ```text
//! Undefined variable #foo# ^extra detail^ | (3, 5)
//! ```
//!
//! where `#…#` wraps the identifier, `^…^` wraps a free-text payload and
//! `| (line, col)` gives a 1-based line and 0-based column. Any of the three
//! may be missing; a missing or malformed coordinate puts the diagnostic at
//! offset 0 rather than dropping it.

use std::sync::LazyLock;

use regex::Regex;
use wacc_diag_types::{DiagnosticKind, DiagnosticRecord, Severity};

use crate::diagnostics::DiagnosticBuilder;
use crate::external::AnalyzerOutput;
use crate::source::{Position, SourceText};

/// Substrings of error lines and the diagnostic each one selects.
///
/// Every entry is tested against every line, so one line can produce more
/// than one diagnostic.
pub const ERROR_KEYWORDS: &[(&str, DiagnosticKind)] = &[
    ("Undefined", DiagnosticKind::UndefinedIdentifier),
    ("Already defined", DiagnosticKind::MultipleDefinition),
    ("Parameter num mismatch", DiagnosticKind::ParameterNumMismatch),
    ("Type mismatch", DiagnosticKind::TypeMismatch),
    ("Return in main", DiagnosticKind::ReturnInMain),
    ("Insufficient array rank", DiagnosticKind::InsufficientArrayRank),
    ("Access to null literal", DiagnosticKind::AccessToNullLiteral),
    ("Empty program body", DiagnosticKind::EmptyProgramBody),
    ("Parse Error", DiagnosticKind::GeneralSyntaxError),
    ("Invalid integer", DiagnosticKind::InvalidInteger),
];

/// Substring of warning lines that report an unused variable.
pub const UNUSED_VARIABLE: &str = "Unused variable";

static IDENT: LazyLock<Regex> = LazyLock::new(|| pattern(r"#([^#]+)#"));
static INFO: LazyLock<Regex> = LazyLock::new(|| pattern(r"\^(.+)\^"));
static COORDINATE: LazyLock<Regex> = LazyLock::new(|| pattern(r"\|\s*\((\d+),\s*(\d+)\)"));
static WARNING_TRAILER: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"(?i)warning(?:s|\(s\))?:"));
static ERROR_TRAILER: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"(?i)(?:semantic|syntax) error(?:s|\(s\))?:"));

/// Compile one of the marker patterns above. They are literals, and every
/// one is compiled by `marker_patterns_compile` in the tests.
#[allow(clippy::expect_used)]
fn pattern(source: &str) -> Regex {
    Regex::new(source).expect("marker patterns are valid")
}

/// The identifier between `#` markers, or `""`.
pub fn identifier(line: &str) -> &str {
    IDENT
        .captures(line)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .unwrap_or("")
}

/// The payload between the first and last `^`, with inner `^` removed.
pub fn additional_info(line: &str) -> String {
    INFO.captures(line)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().replace('^', ""))
        .unwrap_or_default()
}

/// The `(line, col)` coordinate following a pipe, as written.
pub fn coordinate(line: &str) -> Option<(usize, usize)> {
    let caps = COORDINATE.captures(line)?;
    let line_no = caps.get(1)?.as_str().parse().ok()?;
    let column = caps.get(2)?.as_str().parse().ok()?;
    Some((line_no, column))
}

/// Absolute offset of a line's coordinate in `source`, or 0.
pub fn offset(source: &SourceText, line: &str) -> usize {
    match coordinate(line) {
        Some((line_no, column)) if line_no >= 1 => source.offset(Position {
            line: line_no - 1,
            column,
        }),
        _ => 0,
    }
}

/// Everything after the trailer, or `None` if the channel has none.
fn section_after<'a>(channel: &'a str, trailer: &Regex) -> Option<&'a str> {
    trailer.find(channel).map(|m| &channel[m.end()..])
}

/// Parses the analyzer's two output channels.
pub struct ExternalOutputParser<'a> {
    source: &'a SourceText,
}

impl<'a> ExternalOutputParser<'a> {
    pub fn new(source: &'a SourceText) -> Self {
        Self { source }
    }

    /// Error diagnostics followed by warning diagnostics.
    pub fn parse(
        &self,
        output: &AnalyzerOutput,
        db: &mut DiagnosticBuilder,
    ) -> Vec<DiagnosticRecord> {
        let mut diagnostics = self.parse_errors(&output.stderr, db);
        diagnostics.extend(self.parse_warnings(&output.stdout, db));
        diagnostics
    }

    /// Parse the error channel: the section after a `semantic error(s):` or
    /// `syntax error(s):` trailer, or the whole channel as raw failure text.
    pub fn parse_errors(
        &self,
        channel: &str,
        db: &mut DiagnosticBuilder,
    ) -> Vec<DiagnosticRecord> {
        let section = section_after(channel, &ERROR_TRAILER).unwrap_or(channel);
        db.severity(Severity::Error);

        let mut diagnostics = Vec::new();
        for line in section.lines() {
            for &(needle, kind) in ERROR_KEYWORDS {
                if line.contains(needle) {
                    diagnostics.push(self.error_diagnostic(line, kind, db));
                }
            }
        }
        diagnostics
    }

    /// Parse the informational channel. Only the section after a
    /// `warning(s):` trailer is considered.
    pub fn parse_warnings(
        &self,
        channel: &str,
        db: &mut DiagnosticBuilder,
    ) -> Vec<DiagnosticRecord> {
        let Some(section) = section_after(channel, &WARNING_TRAILER) else {
            return Vec::new();
        };
        db.severity(Severity::Warning);

        section
            .lines()
            .filter(|line| line.contains(UNUSED_VARIABLE))
            .map(|line| {
                let record = db
                    .ident(identifier(line))
                    .start(offset(self.source, line))
                    .is_function(false)
                    .build(DiagnosticKind::UnusedIdentifier);
                self.bounded(record)
            })
            .collect()
    }

    fn error_diagnostic(
        &self,
        line: &str,
        kind: DiagnosticKind,
        db: &mut DiagnosticBuilder,
    ) -> DiagnosticRecord {
        let mut info = additional_info(line);
        if info.is_empty() && is_passthrough(kind) {
            info = line.trim().to_string();
        }
        let is_function = match kind {
            DiagnosticKind::UndefinedIdentifier => word_is_function(line, 1),
            DiagnosticKind::MultipleDefinition => word_is_function(line, 2),
            _ => false,
        };
        let record = db
            .ident(identifier(line))
            .start(offset(self.source, line))
            .additional_info(info)
            .is_function(is_function)
            .build(kind);
        self.bounded(record)
    }

    /// Keep ranges inside the document. A coordinate past the end already
    /// clamps the start, but the identifier's length can still overhang.
    fn bounded(&self, mut record: DiagnosticRecord) -> DiagnosticRecord {
        let len = self.source.len();
        record.range = record.range.clamp_to(len);
        if let Some(related) = record.related.as_mut() {
            related.range = related.range.clamp_to(len);
        }
        record
    }
}

/// Kinds whose message is the analyzer's own text.
fn is_passthrough(kind: DiagnosticKind) -> bool {
    matches!(
        kind,
        DiagnosticKind::TypeMismatch
            | DiagnosticKind::AccessToNullLiteral
            | DiagnosticKind::ParameterNumMismatch
            | DiagnosticKind::InsufficientArrayRank
            | DiagnosticKind::GeneralSyntaxError
    )
}

/// Whether the `position`-th whitespace-separated word is `function`.
fn word_is_function(line: &str, position: usize) -> bool {
    line.split_whitespace().nth(position) == Some("function")
}
