//! Diagnostics fixture parser and runner.
//!
//! A fixture file holds any number of cases:
//!
//! ```text
//! === unclosed_begin
//! begin
//!   skip
//! --- stderr
//! Semantic errors:
//! Return in main | (2, 2)
//! ---
//! error[UnmatchedBlock] 'begin' without 'end' @ begin
//! error[ReturnInMain] Cannot have 'return' statement in main @
//! ```
//!
//! The source runs from the header to the first `---` line. Optional
//! `--- stderr` and `--- stdout` sections stand in for the analyzer's error
//! and informational channels. A bare `---` starts the expectations, one per
//! line in production order: `severity[Kind] message @ covered`, where
//! `covered` is the source text under the diagnostic's range.

use std::str::FromStr;

use wacc_diag_kernel::diagnostics::DiagnosticBuilder;
use wacc_diag_kernel::external::{AnalyzerOutput, ExternalOutputParser};
use wacc_diag_kernel::validator::{validate_local, BlockReportMode};
use wacc_diag_kernel::SourceText;
use wacc_diag_types::{DiagnosticKind, DiagnosticRecord, ParseKindError, Severity};

use crate::{TestResult, TestSummary};

const URI: &str = "file:///fixture.wacc";

/// Failure to read a fixture file.
#[derive(Debug, thiserror::Error)]
pub enum FixtureError {
    #[error("line {line}: unknown section `{header}`")]
    UnknownSection { line: usize, header: String },

    #[error("line {line}: case `{name}` has no `---` expectations section")]
    MissingExpectations { name: String, line: usize },

    #[error("line {line}: expected `severity[Kind] message @ covered`, got `{text}`")]
    MalformedExpectation { line: usize, text: String },

    #[error("line {line}: {source}")]
    Kind {
        line: usize,
        #[source]
        source: ParseKindError,
    },
}

/// One expected diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expectation {
    pub severity: Severity,
    pub kind: DiagnosticKind,
    pub message: String,
    pub covered: String,
}

impl Expectation {
    /// The diagnostic as it appears in a fixture line.
    pub fn render(&self) -> String {
        format!(
            "{}[{}] {} @ {}",
            self.severity, self.kind, self.message, self.covered
        )
        .trim_end()
        .to_string()
    }

    fn from_record(record: &DiagnosticRecord, source: &str) -> Self {
        Self {
            severity: record.severity,
            kind: record.kind,
            message: record.message.clone(),
            covered: record.range.slice(source).unwrap_or("<out of range>").to_string(),
        }
    }
}

fn parse_expectation(line_number: usize, text: &str) -> Result<Expectation, FixtureError> {
    let malformed = || FixtureError::MalformedExpectation {
        line: line_number,
        text: text.to_string(),
    };
    let kind_err = |source| FixtureError::Kind {
        line: line_number,
        source,
    };

    let (head, covered) = text.rsplit_once(" @").ok_or_else(malformed)?;
    let covered = covered.strip_prefix(' ').unwrap_or(covered);
    let (severity, rest) = head.split_once('[').ok_or_else(malformed)?;
    let (kind, message) = rest.split_once("] ").ok_or_else(malformed)?;

    Ok(Expectation {
        severity: Severity::from_str(severity).map_err(kind_err)?,
        kind: DiagnosticKind::from_str(kind).map_err(kind_err)?,
        message: message.to_string(),
        covered: covered.to_string(),
    })
}

/// A single fixture case.
#[derive(Debug, Clone)]
pub struct FixtureCase {
    /// Test name from the `=== name` line.
    pub name: String,
    /// Line number of the header (1-indexed).
    pub line_number: usize,
    pub source: String,
    /// Canned analyzer output, empty when the case has none.
    pub analyzer: AnalyzerOutput,
    pub expected: Vec<Expectation>,
}

#[derive(Clone, Copy)]
enum Section {
    Source,
    Stderr,
    Stdout,
    Expectations,
}

/// Parse a fixture file into cases.
pub fn parse_fixtures(content: &str) -> Result<Vec<FixtureCase>, FixtureError> {
    let mut cases = Vec::new();
    let mut current: Option<(FixtureCase, Section, Vec<&str>, Vec<&str>, Vec<&str>)> = None;

    for (index, line) in content.lines().enumerate() {
        let line_number = index + 1;

        if let Some(name) = line.strip_prefix("===") {
            if let Some(open) = current.take() {
                cases.push(finish(open)?);
            }
            let case = FixtureCase {
                name: name.trim().to_string(),
                line_number,
                source: String::new(),
                analyzer: AnalyzerOutput::default(),
                expected: Vec::new(),
            };
            current = Some((case, Section::Source, Vec::new(), Vec::new(), Vec::new()));
            continue;
        }

        // Text before the first header is commentary.
        let Some((case, section, source, stderr, stdout)) = current.as_mut() else {
            continue;
        };

        if let Some(header) = line.strip_prefix("---") {
            *section = match header.trim() {
                "" => Section::Expectations,
                "stderr" => Section::Stderr,
                "stdout" => Section::Stdout,
                other => {
                    return Err(FixtureError::UnknownSection {
                        line: line_number,
                        header: other.to_string(),
                    });
                }
            };
            continue;
        }

        match section {
            Section::Source => source.push(line),
            Section::Stderr => stderr.push(line),
            Section::Stdout => stdout.push(line),
            Section::Expectations => {
                let text = line.trim_end();
                if !text.trim().is_empty() {
                    case.expected.push(parse_expectation(line_number, text)?);
                }
            }
        }
    }

    if let Some(open) = current {
        cases.push(finish(open)?);
    }
    Ok(cases)
}

fn finish(
    (mut case, section, source, stderr, stdout): (
        FixtureCase,
        Section,
        Vec<&str>,
        Vec<&str>,
        Vec<&str>,
    ),
) -> Result<FixtureCase, FixtureError> {
    if !matches!(section, Section::Expectations) {
        return Err(FixtureError::MissingExpectations {
            name: case.name,
            line: case.line_number,
        });
    }
    case.source = source.join("\n");
    case.analyzer = AnalyzerOutput {
        stdout: stdout.join("\n"),
        stderr: stderr.join("\n"),
        exit_code: Some(0),
    };
    Ok(case)
}

impl FixtureCase {
    /// Produce this case's diagnostics the way an engine pass does, with the
    /// canned analyzer output in place of a real run.
    pub fn diagnostics(&self) -> Vec<DiagnosticRecord> {
        let source = SourceText::new(self.source.as_str());
        let mut db = DiagnosticBuilder::new(URI, false);
        let mut records = validate_local(&source, &mut db, BlockReportMode::All).into_records();
        records.extend(ExternalOutputParser::new(&source).parse(&self.analyzer, &mut db));
        records
    }

    /// Run this case and return the result.
    pub fn run(&self) -> TestResult {
        let actual: Vec<String> = self
            .diagnostics()
            .iter()
            .map(|record| Expectation::from_record(record, &self.source).render())
            .collect();
        let expected: Vec<String> = self.expected.iter().map(Expectation::render).collect();

        if actual == expected {
            TestResult::Pass
        } else {
            TestResult::Fail {
                expected: expected.join("\n"),
                actual: actual.join("\n"),
            }
        }
    }
}

/// Run every case and summarize.
pub fn run_fixtures(cases: &[FixtureCase]) -> TestSummary {
    let mut summary = TestSummary::new();
    for case in cases {
        summary.record(&case.name, case.line_number, case.run());
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sections() {
        let cases = parse_fixtures(
            "a fixture file\n\
             === first\n\
             begin\n  skip\n\
             --- stderr\n\
             Semantic errors:\n\
             --- stdout\n\
             Warnings:\n\
             ---\n\
             error[UnmatchedBlock] 'begin' without 'end' @ begin\n\
             \n\
             === second\n\
             begin skip end\n\
             ---\n",
        )
        .unwrap();
        assert_eq!(cases.len(), 2);
        assert_eq!(cases[0].name, "first");
        assert_eq!(cases[0].line_number, 2);
        assert_eq!(cases[0].source, "begin\n  skip");
        assert_eq!(cases[0].analyzer.stderr, "Semantic errors:");
        assert_eq!(cases[0].analyzer.stdout, "Warnings:");
        assert_eq!(cases[0].expected.len(), 1);
        assert_eq!(cases[0].expected[0].kind, DiagnosticKind::UnmatchedBlock);
        assert!(cases[1].expected.is_empty());
        assert!(cases.iter().all(|c| c.run().is_pass()));
    }

    #[test]
    fn empty_covered_text() {
        let e = parse_expectation(1, "error[ReturnInMain] Cannot have 'return' statement in main @")
            .unwrap();
        assert_eq!(e.covered, "");
        assert_eq!(e.message, "Cannot have 'return' statement in main");
        assert_eq!(
            e.render(),
            "error[ReturnInMain] Cannot have 'return' statement in main @"
        );
    }

    #[test]
    fn rejects_bad_input() {
        assert!(matches!(
            parse_fixtures("=== a\nskip\n"),
            Err(FixtureError::MissingExpectations { line: 1, .. })
        ));
        assert!(matches!(
            parse_fixtures("=== a\nskip\n--- stdin\n"),
            Err(FixtureError::UnknownSection { line: 3, .. })
        ));
        assert!(matches!(
            parse_fixtures("=== a\nskip\n---\nnot an expectation\n"),
            Err(FixtureError::MalformedExpectation { line: 4, .. })
        ));
        assert!(matches!(
            parse_fixtures("=== a\nskip\n---\nfatal[UnmatchedBlock] x @ y\n"),
            Err(FixtureError::Kind { line: 4, .. })
        ));
    }

    #[test]
    fn mismatch_reports_both_sides() {
        let cases = parse_fixtures("=== a\nbegin skip\n---\n").unwrap();
        match cases[0].run() {
            TestResult::Fail { expected, actual } => {
                assert!(expected.is_empty());
                assert_eq!(actual, "error[UnmatchedBlock] 'begin' without 'end' @ begin");
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }
}
