//! Identifier declarations and the checks run over them.
//!
//! [`IdentifierTable::scan`] walks the token stream once and records every
//! declaration it recognizes, keeping functions and variables in separate
//! namespaces. [`IdentifierValidator`] then classifies the entries.
//!
//! A declaration is a type followed by a word:
//!
//! ```text
//! decl      := type word
//! type      := base ('[' ']')*
//!            | 'pair' '(' pair-elem ',' pair-elem ')' ('[' ']')*
//! pair-elem := type | 'pair'
//! base      := 'int' | 'bool' | 'char' | 'string'
//! ```
//!
//! If the token after the word is `(`, the word names a function.

use std::collections::HashMap;

use wacc_diag_types::{DiagnosticKind, DiagnosticRecord, IdentifierKind, Severity};

use crate::diagnostics::DiagnosticBuilder;
use crate::lexer::{is_keyword, Token, TokenStream};

/// One declared name and where it was declared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifierEntry {
    pub name: String,
    pub kind: IdentifierKind,
    /// Offsets of every declaration, in text order. The first is the anchor.
    pub offsets: Vec<usize>,
}

impl IdentifierEntry {
    pub fn occurrences(&self) -> usize {
        self.offsets.len()
    }

    pub fn declaration(&self) -> usize {
        self.offsets.first().copied().unwrap_or(0)
    }
}

/// Entries of one namespace, in order of first declaration.
#[derive(Debug, Clone, Default)]
pub struct Namespace {
    entries: Vec<IdentifierEntry>,
    index: HashMap<String, usize>,
}

impl Namespace {
    fn record(&mut self, name: &str, kind: IdentifierKind, offset: usize) {
        match self.index.get(name) {
            Some(&i) => self.entries[i].offsets.push(offset),
            None => {
                self.index.insert(name.to_string(), self.entries.len());
                self.entries.push(IdentifierEntry {
                    name: name.to_string(),
                    kind,
                    offsets: vec![offset],
                });
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&IdentifierEntry> {
        self.index.get(name).map(|&i| &self.entries[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &IdentifierEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Declared identifiers of one document, split by namespace.
///
/// Built fresh per validation pass and dropped with it.
#[derive(Debug, Clone, Default)]
pub struct IdentifierTable {
    variables: Namespace,
    functions: Namespace,
}

impl IdentifierTable {
    /// Collect every declaration in a token stream of masked text.
    pub fn scan(tokens: &TokenStream<'_>) -> Self {
        let mut table = Self::default();
        for i in 0..tokens.len() {
            let Some(after_type) = parse_type(tokens, i, false) else {
                continue;
            };
            let Some(token) = tokens.token(after_type) else {
                continue;
            };
            if !token.is_word() {
                continue;
            }
            let kind = IdentifierKind::from_is_function(tokens.followed_by_paren(after_type));
            let name = tokens.text(after_type);
            let offset = tokens.offset(after_type);
            table.namespace_mut(kind).record(name, kind, offset);
        }
        table
    }

    pub fn variables(&self) -> &Namespace {
        &self.variables
    }

    pub fn functions(&self) -> &Namespace {
        &self.functions
    }

    pub fn namespace(&self, kind: IdentifierKind) -> &Namespace {
        match kind {
            IdentifierKind::Variable => &self.variables,
            IdentifierKind::Function => &self.functions,
        }
    }

    fn namespace_mut(&mut self, kind: IdentifierKind) -> &mut Namespace {
        match kind {
            IdentifierKind::Variable => &mut self.variables,
            IdentifierKind::Function => &mut self.functions,
        }
    }

    /// Declared in either namespace.
    pub fn is_declared(&self, name: &str) -> bool {
        self.variables.contains(name) || self.functions.contains(name)
    }
}

/// Parse a type starting at token `i`; returns the index just past it.
fn parse_type(tokens: &TokenStream<'_>, i: usize, bare_pair: bool) -> Option<usize> {
    let mut next = match tokens.token(i)? {
        Token::Int | Token::Bool | Token::Char | Token::StringType => i + 1,
        Token::Pair if tokens.token(i + 1) == Some(Token::LParen) => {
            let first = parse_type(tokens, i + 2, true)?;
            if tokens.token(first) != Some(Token::Comma) {
                return None;
            }
            let second = parse_type(tokens, first + 1, true)?;
            if tokens.token(second) != Some(Token::RParen) {
                return None;
            }
            second + 1
        }
        Token::Pair if bare_pair => i + 1,
        _ => return None,
    };
    while tokens.token(next) == Some(Token::LBracket)
        && tokens.token(next + 1) == Some(Token::RBracket)
    {
        next += 2;
    }
    Some(next)
}

/// Whether a name is a legal identifier spelling.
pub fn is_valid_identifier(name: &str) -> bool {
    name.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_')
}

/// Turns an [`IdentifierTable`] into diagnostics.
pub struct IdentifierValidator<'a> {
    table: &'a IdentifierTable,
    tokens: &'a TokenStream<'a>,
}

impl<'a> IdentifierValidator<'a> {
    pub fn new(table: &'a IdentifierTable, tokens: &'a TokenStream<'a>) -> Self {
        Self { table, tokens }
    }

    /// Run every check. Functions are reported before variables, entries in
    /// declaration order, and undefined references last in text order.
    pub fn validate(&self, db: &mut DiagnosticBuilder) -> Vec<DiagnosticRecord> {
        let mut diagnostics = Vec::new();
        for namespace in [self.table.functions(), self.table.variables()] {
            for entry in namespace.iter() {
                self.check_entry(entry, db, &mut diagnostics);
            }
        }
        diagnostics.extend(self.undefined(db));
        diagnostics
    }

    fn check_entry(
        &self,
        entry: &IdentifierEntry,
        db: &mut DiagnosticBuilder,
        out: &mut Vec<DiagnosticRecord>,
    ) {
        if entry.name.is_empty() {
            return;
        }
        db.ident(entry.name.as_str())
            .identifier_kind(entry.kind)
            .start(entry.declaration())
            .severity(Severity::Error);

        if is_keyword(&entry.name) {
            out.push(db.build(DiagnosticKind::KeywordClash));
        }

        if !is_valid_identifier(&entry.name) {
            out.push(db.build(DiagnosticKind::InvalidIdentifier));
        }

        if entry.occurrences() > 1 {
            for &offset in &entry.offsets {
                out.push(db.start(offset).build(DiagnosticKind::MultipleDefinition));
            }
        }

        if self.count_uses(&entry.name, entry.kind) == 1 {
            out.push(
                db.start(entry.declaration())
                    .severity(Severity::Warning)
                    .build(DiagnosticKind::UnusedIdentifier),
            );
        }
    }

    /// Standalone occurrences of `name` used as `kind`: functions are the
    /// occurrences followed by `(`, variables the ones that are not.
    pub fn count_uses(&self, name: &str, kind: IdentifierKind) -> usize {
        (0..self.tokens.len())
            .filter(|&i| {
                self.tokens.token(i).is_some_and(Token::is_word)
                    && self.tokens.text(i) == name
                    && self.tokens.followed_by_paren(i) == kind.is_function()
            })
            .count()
    }

    /// Words that are neither keywords, types, numbers nor declared names.
    ///
    /// `end` never reaches this check: it lexes as a keyword.
    pub fn undefined(&self, db: &mut DiagnosticBuilder) -> Vec<DiagnosticRecord> {
        let mut out = Vec::new();
        for (i, spanned) in self.tokens.iter().enumerate() {
            if spanned.token != Token::Word {
                continue;
            }
            let word = self.tokens.text(i);
            if self.table.is_declared(word) || is_keyword(word) || word.parse::<i64>().is_ok() {
                continue;
            }
            out.push(
                db.ident(word)
                    .is_function(self.tokens.followed_by_paren(i))
                    .start(spanned.span.start)
                    .severity(Severity::Error)
                    .build(DiagnosticKind::UndefinedIdentifier),
            );
        }
        out
    }
}
