//! wacc-diag-types: pure data types shared by the wacc-diag crates.
//!
//! Everything a diagnostic consumer needs to receive results lives here,
//! with no dependency on the analysis machinery:
//!
//! - [`DiagnosticKind`]: the closed set of diagnostics the engine produces
//! - [`Severity`]: error or warning
//! - [`TextRange`]: half-open byte range into the original document text
//! - [`DiagnosticRecord`]: one positioned, rendered diagnostic
//! - [`IdentifierKind`]: the two identifier namespaces

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Every diagnostic the engine can emit.
///
/// Local checks produce the identifier and block kinds; the remaining kinds
/// only come from translating the external analyzer's output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagnosticKind {
    MultipleDefinition,
    InvalidIdentifier,
    UnusedIdentifier,
    UndefinedIdentifier,
    TypeMismatch,
    ReturnInMain,
    AccessToNullLiteral,
    ParameterNumMismatch,
    InsufficientArrayRank,
    EmptyProgramBody,
    KeywordClash,
    GeneralSyntaxError,
    InvalidInteger,
    UnmatchedBlock,
}

impl DiagnosticKind {
    /// All kinds, in declaration order.
    pub const ALL: [DiagnosticKind; 14] = [
        DiagnosticKind::MultipleDefinition,
        DiagnosticKind::InvalidIdentifier,
        DiagnosticKind::UnusedIdentifier,
        DiagnosticKind::UndefinedIdentifier,
        DiagnosticKind::TypeMismatch,
        DiagnosticKind::ReturnInMain,
        DiagnosticKind::AccessToNullLiteral,
        DiagnosticKind::ParameterNumMismatch,
        DiagnosticKind::InsufficientArrayRank,
        DiagnosticKind::EmptyProgramBody,
        DiagnosticKind::KeywordClash,
        DiagnosticKind::GeneralSyntaxError,
        DiagnosticKind::InvalidInteger,
        DiagnosticKind::UnmatchedBlock,
    ];

    /// The stable name used in fixtures and JSON output.
    pub fn as_str(self) -> &'static str {
        match self {
            DiagnosticKind::MultipleDefinition => "MultipleDefinition",
            DiagnosticKind::InvalidIdentifier => "InvalidIdentifier",
            DiagnosticKind::UnusedIdentifier => "UnusedIdentifier",
            DiagnosticKind::UndefinedIdentifier => "UndefinedIdentifier",
            DiagnosticKind::TypeMismatch => "TypeMismatch",
            DiagnosticKind::ReturnInMain => "ReturnInMain",
            DiagnosticKind::AccessToNullLiteral => "AccessToNullLiteral",
            DiagnosticKind::ParameterNumMismatch => "ParameterNumMismatch",
            DiagnosticKind::InsufficientArrayRank => "InsufficientArrayRank",
            DiagnosticKind::EmptyProgramBody => "EmptyProgramBody",
            DiagnosticKind::KeywordClash => "KeywordClash",
            DiagnosticKind::GeneralSyntaxError => "GeneralSyntaxError",
            DiagnosticKind::InvalidInteger => "InvalidInteger",
            DiagnosticKind::UnmatchedBlock => "UnmatchedBlock",
        }
    }

    /// Whether a related-information attachment may accompany this kind.
    pub fn supports_related_info(self) -> bool {
        matches!(
            self,
            DiagnosticKind::InvalidIdentifier | DiagnosticKind::UnusedIdentifier
        )
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string names no known enum variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {what}: {value:?}")]
pub struct ParseKindError {
    what: &'static str,
    value: String,
}

impl FromStr for DiagnosticKind {
    type Err = ParseKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DiagnosticKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| ParseKindError {
                what: "diagnostic kind",
                value: s.to_string(),
            })
    }
}

/// Diagnostic severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Error,
    Warning,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = ParseKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "error" => Ok(Severity::Error),
            "warning" => Ok(Severity::Warning),
            other => Err(ParseKindError {
                what: "severity",
                value: other.to_string(),
            }),
        }
    }
}

/// Half-open byte range `[start, end)` into the original document text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TextRange {
    pub start: usize,
    pub end: usize,
}

impl TextRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// A range of `len` bytes beginning at `start`.
    pub fn at(start: usize, len: usize) -> Self {
        Self {
            start,
            end: start + len,
        }
    }

    /// The range with both ends limited to `len`.
    pub fn clamp_to(self, len: usize) -> Self {
        Self {
            start: self.start.min(len),
            end: self.end.min(len),
        }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The covered slice of `text`, if the range lies on char boundaries.
    pub fn slice<'a>(&self, text: &'a str) -> Option<&'a str> {
        text.get(self.start..self.end)
    }
}

impl From<std::ops::Range<usize>> for TextRange {
    fn from(range: std::ops::Range<usize>) -> Self {
        Self::new(range.start, range.end)
    }
}

/// A secondary location attached to a diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedInfo {
    /// Document the location points into.
    pub uri: String,
    pub range: TextRange,
    pub message: String,
}

/// One rendered, positioned diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticRecord {
    pub kind: DiagnosticKind,
    pub severity: Severity,
    pub range: TextRange,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related: Option<RelatedInfo>,
}

impl DiagnosticRecord {
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for DiagnosticRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}[{}] {}..{}: {}",
            self.severity, self.kind, self.range.start, self.range.end, self.message
        )
    }
}

/// The two independent identifier namespaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentifierKind {
    Variable,
    Function,
}

impl IdentifierKind {
    pub fn from_is_function(is_function: bool) -> Self {
        if is_function {
            IdentifierKind::Function
        } else {
            IdentifierKind::Variable
        }
    }

    pub fn is_function(self) -> bool {
        self == IdentifierKind::Function
    }

    pub fn as_str(self) -> &'static str {
        match self {
            IdentifierKind::Variable => "variable",
            IdentifierKind::Function => "function",
        }
    }
}

impl fmt::Display for IdentifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_names_round_trip_through_from_str() {
        for kind in DiagnosticKind::ALL {
            assert_eq!(kind.as_str().parse::<DiagnosticKind>(), Ok(kind));
        }
        assert!("Bogus".parse::<DiagnosticKind>().is_err());
    }

    #[test]
    fn only_identifier_kinds_carry_related_info() {
        let with: Vec<_> = DiagnosticKind::ALL
            .into_iter()
            .filter(|k| k.supports_related_info())
            .collect();
        assert_eq!(
            with,
            vec![
                DiagnosticKind::InvalidIdentifier,
                DiagnosticKind::UnusedIdentifier
            ]
        );
    }

    #[test]
    fn range_slice_and_len() {
        let text = "int x = 1";
        let range = TextRange::at(4, 1);
        assert_eq!(range.len(), 1);
        assert_eq!(range.slice(text), Some("x"));
        assert!(TextRange::at(3, 0).is_empty());
        assert_eq!(TextRange::new(8, 20).slice(text), None);
    }

    #[test]
    fn record_serializes_without_empty_related() {
        let record = DiagnosticRecord {
            kind: DiagnosticKind::UnusedIdentifier,
            severity: Severity::Warning,
            range: TextRange::at(4, 1),
            message: "Unused variable: x.".to_string(),
            related: None,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["severity"], "warning");
        assert_eq!(json["kind"], "UnusedIdentifier");
        assert!(json.get("related").is_none());
    }

    #[test]
    fn severity_parses_lowercase_names() {
        assert_eq!("error".parse::<Severity>(), Ok(Severity::Error));
        assert_eq!("warning".parse::<Severity>(), Ok(Severity::Warning));
        assert!("Error".parse::<Severity>().is_err());
    }
}
