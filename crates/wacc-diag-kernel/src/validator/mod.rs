//! Local validation of WACC source, no external analyzer involved.
//!
//! Both checks scan the masked text so that comments and literals never
//! contribute keywords or identifiers:
//!
//! - **Block structure**: `begin…end`, `if…then…else…fi`, `while…do…done`
//!   and `is…end` nest and close in order
//! - **Identifiers**: invalid, duplicate, unused and undefined names, and
//!   names that clash with keywords
//!
//! # Example
//!
//! ```
//! use wacc_diag_kernel::diagnostics::DiagnosticBuilder;
//! use wacc_diag_kernel::source::SourceText;
//! use wacc_diag_kernel::validator::{validate_local, BlockReportMode};
//!
//! let source = SourceText::new("begin skip");
//! let mut db = DiagnosticBuilder::new("file:///a.wacc", false);
//! let local = validate_local(&source, &mut db, BlockReportMode::All);
//! assert_eq!(local.blocks[0].message, "'begin' without 'end'");
//! ```

mod blocks;
mod identifiers;

pub use blocks::{keyword_text, BlockConstruct, BlockReportMode, BlockScopeValidator};
pub use identifiers::{
    is_valid_identifier, IdentifierEntry, IdentifierTable, IdentifierValidator, Namespace,
};

use wacc_diag_types::DiagnosticRecord;

use crate::diagnostics::DiagnosticBuilder;
use crate::lexer::TokenStream;
use crate::source::SourceText;

/// Diagnostics from the local checks, grouped by check.
#[derive(Debug, Clone, Default)]
pub struct LocalDiagnostics {
    pub blocks: Vec<DiagnosticRecord>,
    pub identifiers: Vec<DiagnosticRecord>,
    pub table: IdentifierTable,
}

impl LocalDiagnostics {
    /// Block diagnostics first, then identifier diagnostics.
    pub fn into_records(self) -> Vec<DiagnosticRecord> {
        let mut records = self.blocks;
        records.extend(self.identifiers);
        records
    }
}

/// Run the block and identifier checks over one document.
pub fn validate_local(
    source: &SourceText,
    db: &mut DiagnosticBuilder,
    mode: BlockReportMode,
) -> LocalDiagnostics {
    let tokens = TokenStream::new(source.masked());
    let blocks = BlockScopeValidator::new(mode).validate(&tokens, db);
    let table = IdentifierTable::scan(&tokens);
    let identifiers = IdentifierValidator::new(&table, &tokens).validate(db);
    LocalDiagnostics {
        blocks,
        identifiers,
        table,
    }
}
