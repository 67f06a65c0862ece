//! Output formats for `wacc-diag check`.

use std::ops::Range;

use anyhow::{Context, Result};
use ariadne::{Color, Config, IndexType, Label, Report, ReportKind, Source};
use serde::Serialize;
use wacc_diag_kernel::SourceText;
use wacc_diag_types::{DiagnosticRecord, Severity};

/// A diagnostic with line/column positions for JSON consumers.
#[derive(Debug, Serialize)]
pub struct JsonDiagnostic<'a> {
    #[serde(flatten)]
    pub record: &'a DiagnosticRecord,
    pub start: LineColumn,
    pub end: LineColumn,
}

/// 0-based line and character column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LineColumn {
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Serialize)]
struct JsonFile<'a> {
    path: &'a str,
    diagnostics: Vec<JsonDiagnostic<'a>>,
}

pub fn json(path: &str, source: &SourceText, records: &[DiagnosticRecord]) -> Result<String> {
    let position = |offset| {
        let p = source.position(offset);
        LineColumn {
            line: p.line,
            column: p.column,
        }
    };
    let file = JsonFile {
        path,
        diagnostics: records
            .iter()
            .map(|record| JsonDiagnostic {
                record,
                start: position(record.range.start),
                end: position(record.range.end),
            })
            .collect(),
    };
    serde_json::to_string_pretty(&file).context("Failed to serialize diagnostics")
}

pub fn human(
    path: &str,
    text: &str,
    records: &[DiagnosticRecord],
    colour: bool,
) -> Result<String> {
    let mut output = Vec::new();
    for record in records {
        let (kind, color) = match record.severity {
            Severity::Error => (ReportKind::Error, Color::Red),
            Severity::Warning => (ReportKind::Warning, Color::Yellow),
        };
        let span = label_span(text, record);
        let mut report = Report::build(kind, (path, span.clone()))
            .with_config(
                Config::default()
                    .with_index_type(IndexType::Byte)
                    .with_color(colour),
            )
            .with_code(record.kind.as_str())
            .with_message(&record.message)
            .with_label(
                Label::new((path, span))
                    .with_message(&record.message)
                    .with_color(color),
            );
        if let Some(related) = &record.related {
            report = report.with_note(&related.message);
        }
        report
            .finish()
            .write((path, Source::from(text)), &mut output)
            .context("Failed to render diagnostic")?;
    }
    Ok(String::from_utf8_lossy(&output).into_owned())
}

/// Empty ranges (an analyzer message with no identifier) widen to the next
/// character so the label has something to point at.
fn label_span(text: &str, record: &DiagnosticRecord) -> Range<usize> {
    let start = record.range.start.min(text.len());
    let end = record.range.end.clamp(start, text.len());
    if start < end {
        return start..end;
    }
    match text.get(start..).and_then(|rest| rest.chars().next()) {
        Some(c) => start..start + c.len_utf8(),
        None => start..end,
    }
}

/// One line per record, for `--format short`.
pub fn short(path: &str, source: &SourceText, records: &[DiagnosticRecord]) -> String {
    records
        .iter()
        .map(|record| {
            let p = source.position(record.range.start);
            format!(
                "{path}:{}:{}: {}[{}] {}\n",
                p.line + 1,
                p.column + 1,
                record.severity,
                record.kind,
                record.message
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use wacc_diag_types::{DiagnosticKind, TextRange};

    fn record(
        kind: DiagnosticKind,
        severity: Severity,
        range: TextRange,
        message: &str,
    ) -> DiagnosticRecord {
        DiagnosticRecord {
            kind,
            severity,
            range,
            message: message.to_string(),
            related: None,
        }
    }

    const TEXT: &str = "begin\n  int x = 1\n";

    fn records() -> Vec<DiagnosticRecord> {
        vec![
            record(
                DiagnosticKind::UnmatchedBlock,
                Severity::Error,
                TextRange::new(0, 5),
                "'begin' without 'end'",
            ),
            record(
                DiagnosticKind::UnusedIdentifier,
                Severity::Warning,
                TextRange::new(12, 13),
                "Unused variable: x.",
            ),
        ]
    }

    #[test]
    fn json_carries_line_and_column() {
        let source = SourceText::new(TEXT);
        let out = json("prog.wacc", &source, &records()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        let second = &value["diagnostics"][1];
        assert_eq!(second["kind"], "UnusedIdentifier");
        assert_eq!(second["severity"], "warning");
        assert_eq!(second["start"]["line"], 1);
        assert_eq!(second["start"]["column"], 6);
        assert_eq!(second["range"]["start"], 12);
        assert!(second.get("related").is_none());
    }

    #[test]
    fn short_format() {
        let source = SourceText::new(TEXT);
        insta::assert_snapshot!(short("prog.wacc", &source, &records()).trim_end(), @r"
        prog.wacc:1:1: error[UnmatchedBlock] 'begin' without 'end'
        prog.wacc:2:7: warning[UnusedIdentifier] Unused variable: x.
        ");
    }

    #[test]
    fn human_output_names_every_message() {
        let out = human("prog.wacc", TEXT, &records(), false).unwrap();
        assert!(out.contains("'begin' without 'end'"));
        assert!(out.contains("Unused variable: x."));
        assert!(out.contains("prog.wacc"));
    }

    #[test]
    fn empty_ranges_widen() {
        let r = record(
            DiagnosticKind::EmptyProgramBody,
            Severity::Error,
            TextRange::new(6, 6),
            "Empty program body!",
        );
        assert_eq!(label_span(TEXT, &r), 6..7);
        let at_end = record(
            DiagnosticKind::EmptyProgramBody,
            Severity::Error,
            TextRange::new(99, 99),
            "Empty program body!",
        );
        assert_eq!(label_span(TEXT, &at_end), TEXT.len()..TEXT.len());
    }
}
