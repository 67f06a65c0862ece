//! wacc-diag-kernel: the analysis core of wacc-diag.
//!
//! This crate provides:
//!
//! - **Source**: comment and literal masking, line/column conversion
//! - **Lexer**: Tokenizes masked WACC source using logos
//! - **Validator**: block-structure and identifier checks
//! - **External**: runs the WACC compiler and scrapes its output
//! - **Engine**: per-document validation passes with stale-result discarding
//!
//! Records and kinds live in `wacc-diag-types` and are re-exported here.

pub mod config;
pub mod diagnostics;
pub mod engine;
pub mod error;
pub mod external;
pub mod lexer;
pub mod paths;
pub mod source;
pub mod validator;

pub use config::{AnalyzerConfig, EngineConfig};
pub use diagnostics::DiagnosticBuilder;
pub use engine::{Engine, ExternalStatus, PassReport, ValidationOutcome};
pub use error::{AnalyzerError, ConfigError};
pub use external::{Analyzer, AnalyzerOutput, NoAnalyzer, ProcessAnalyzer};
pub use source::{Position, SourceText};
pub use validator::BlockReportMode;

pub use wacc_diag_types::{
    DiagnosticKind, DiagnosticRecord, IdentifierKind, RelatedInfo, Severity, TextRange,
};
