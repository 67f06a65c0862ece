//! Rendering diagnostics into records.
//!
//! [`DiagnosticBuilder`] is a staged accumulator: callers set the identifier,
//! start offset and friends, then call [`DiagnosticBuilder::build`] with a
//! kind. Staged fields persist across builds, so a caller reporting several
//! offsets of the same identifier only updates the start.

use wacc_diag_types::{
    DiagnosticKind, DiagnosticRecord, IdentifierKind, RelatedInfo, Severity, TextRange,
};

/// Related-info text attached to invalid identifier diagnostics.
pub const INVALID_IDENTIFIER_HINT: &str =
    "Identifiers must start with an underscore ('_') or a letter";

/// Builds [`DiagnosticRecord`]s for one document.
#[derive(Debug, Clone)]
pub struct DiagnosticBuilder {
    uri: String,
    /// Client capability, fixed for the builder's lifetime.
    related_information: bool,
    ident: String,
    start: usize,
    kind: IdentifierKind,
    additional_info: String,
    severity: Severity,
}

impl DiagnosticBuilder {
    pub fn new(uri: impl Into<String>, related_information: bool) -> Self {
        Self {
            uri: uri.into(),
            related_information,
            ident: String::new(),
            start: 0,
            kind: IdentifierKind::Variable,
            additional_info: String::new(),
            severity: Severity::Error,
        }
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn related_information(&self) -> bool {
        self.related_information
    }

    pub fn ident(&mut self, ident: impl Into<String>) -> &mut Self {
        self.ident = ident.into();
        self
    }

    pub fn start(&mut self, start: usize) -> &mut Self {
        self.start = start;
        self
    }

    pub fn is_function(&mut self, is_function: bool) -> &mut Self {
        self.kind = IdentifierKind::from_is_function(is_function);
        self
    }

    pub fn identifier_kind(&mut self, kind: IdentifierKind) -> &mut Self {
        self.kind = kind;
        self
    }

    pub fn additional_info(&mut self, info: impl Into<String>) -> &mut Self {
        self.additional_info = info.into();
        self
    }

    pub fn severity(&mut self, severity: Severity) -> &mut Self {
        self.severity = severity;
        self
    }

    /// Render the staged fields as a diagnostic of `kind`.
    ///
    /// The range covers the identifier's length from the start offset. It is
    /// computed on masked text and reported against the original, which only
    /// works because masking preserves length.
    pub fn build(&self, kind: DiagnosticKind) -> DiagnosticRecord {
        let range = TextRange::at(self.start, self.ident.len());
        let related = if self.related_information {
            self.related_message(kind).map(|message| RelatedInfo {
                uri: self.uri.clone(),
                range,
                message,
            })
        } else {
            None
        };
        DiagnosticRecord {
            kind,
            severity: self.severity,
            range,
            message: self.message(kind),
            related,
        }
    }

    /// The message template for `kind`, filled from the staged fields.
    pub fn message(&self, kind: DiagnosticKind) -> String {
        let ident = &self.ident;
        let what = self.kind.as_str();
        match kind {
            DiagnosticKind::MultipleDefinition => {
                format!("Multiple definition of {what}: {ident}.")
            }
            DiagnosticKind::InvalidIdentifier => format!("Invalid {what} identifier: {ident}."),
            DiagnosticKind::UnusedIdentifier => format!("Unused {what}: {ident}."),
            DiagnosticKind::UndefinedIdentifier => format!("Undefined {what}: {ident}."),
            DiagnosticKind::ReturnInMain => "Cannot have 'return' statement in main".to_string(),
            DiagnosticKind::TypeMismatch
            | DiagnosticKind::AccessToNullLiteral
            | DiagnosticKind::ParameterNumMismatch
            | DiagnosticKind::InsufficientArrayRank
            | DiagnosticKind::GeneralSyntaxError => self.additional_info.clone(),
            DiagnosticKind::EmptyProgramBody => "Empty program body!".to_string(),
            DiagnosticKind::KeywordClash => {
                format!("'{ident}' has clashed with a keyword, please rename this {what}")
            }
            DiagnosticKind::UnmatchedBlock => {
                format!("'{ident}' without '{}'", self.additional_info)
            }
            DiagnosticKind::InvalidInteger => format!(
                "Invalid integer: a 32-bit integer has to be from {} to {}",
                i32::MIN,
                i32::MAX
            ),
        }
    }

    fn related_message(&self, kind: DiagnosticKind) -> Option<String> {
        match kind {
            DiagnosticKind::InvalidIdentifier => Some(INVALID_IDENTIFIER_HINT.to_string()),
            DiagnosticKind::UnusedIdentifier => Some(if self.kind.is_function() {
                format!("{} is declared but it is never called", self.ident)
            } else {
                format!("{} is declared but its value is never read", self.ident)
            }),
            _ => None,
        }
    }
}
