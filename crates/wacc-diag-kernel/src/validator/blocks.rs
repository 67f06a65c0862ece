//! Block-structure checking.
//!
//! Every opener keyword obliges a fixed sequence of closer keywords:
//!
//! | Construct | Opener  | Closers               |
//! |-----------|---------|-----------------------|
//! | Function  | `is`    | `end`                 |
//! | While     | `while` | `do`, `done`          |
//! | Block     | `begin` | `end`                 |
//! | If        | `if`    | `then`, `else`, `fi`  |
//!
//! The validator runs a stack automaton over the token stream. Each open
//! construct remembers which closers it still needs; a closer is only
//! accepted when it is the next one required by the innermost construct.
//! `end` is shared by functions and blocks, which is why the decision is made
//! against the top of the stack rather than the keyword alone.

use serde::Deserialize;
use wacc_diag_types::{DiagnosticKind, DiagnosticRecord, Severity};

use crate::diagnostics::DiagnosticBuilder;
use crate::lexer::{Token, TokenStream};

/// A nested region opened by a keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockConstruct {
    Function,
    While,
    Block,
    If,
}

impl BlockConstruct {
    /// The construct opened by `token`, if it is an opener.
    pub fn opened_by(token: Token) -> Option<Self> {
        match token {
            Token::Is => Some(BlockConstruct::Function),
            Token::While => Some(BlockConstruct::While),
            Token::Begin => Some(BlockConstruct::Block),
            Token::If => Some(BlockConstruct::If),
            _ => None,
        }
    }

    pub fn opener(self) -> Token {
        match self {
            BlockConstruct::Function => Token::Is,
            BlockConstruct::While => Token::While,
            BlockConstruct::Block => Token::Begin,
            BlockConstruct::If => Token::If,
        }
    }

    /// Closers in the order they must appear; the last one ends the construct.
    pub fn closers(self) -> &'static [Token] {
        match self {
            BlockConstruct::Function => &[Token::End],
            BlockConstruct::While => &[Token::Do, Token::Done],
            BlockConstruct::Block => &[Token::End],
            BlockConstruct::If => &[Token::Then, Token::Else, Token::Fi],
        }
    }

    /// The construct a stray closer is reported against. `end` resolves to
    /// a function, which is checked before blocks.
    fn owning(token: Token) -> Option<Self> {
        match token {
            Token::End => Some(BlockConstruct::Function),
            Token::Do | Token::Done => Some(BlockConstruct::While),
            Token::Then | Token::Else | Token::Fi => Some(BlockConstruct::If),
            _ => None,
        }
    }
}

/// Spelling of a structural keyword.
pub fn keyword_text(token: Token) -> &'static str {
    match token {
        Token::Is => "is",
        Token::End => "end",
        Token::While => "while",
        Token::Do => "do",
        Token::Done => "done",
        Token::Begin => "begin",
        Token::If => "if",
        Token::Then => "then",
        Token::Else => "else",
        Token::Fi => "fi",
        _ => "",
    }
}

/// How many block diagnostics a pass may report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockReportMode {
    /// Report every violation. Offending keywords are skipped.
    #[default]
    All,
    /// Stop at the first violation.
    First,
}

/// One construct on the scope stack.
#[derive(Debug, Clone)]
struct OpenConstruct {
    construct: BlockConstruct,
    opener_offset: usize,
    remaining: &'static [Token],
}

/// Checks nesting and ordering of block constructs.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockScopeValidator {
    mode: BlockReportMode,
}

impl BlockScopeValidator {
    pub fn new(mode: BlockReportMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> BlockReportMode {
        self.mode
    }

    /// Validate a token stream of masked text.
    pub fn validate(
        &self,
        tokens: &TokenStream<'_>,
        db: &mut DiagnosticBuilder,
    ) -> Vec<DiagnosticRecord> {
        let mut diagnostics = Vec::new();
        let mut stack: Vec<OpenConstruct> = Vec::new();

        for spanned in tokens.iter() {
            let token = spanned.token;

            if let Some(construct) = BlockConstruct::opened_by(token) {
                stack.push(OpenConstruct {
                    construct,
                    opener_offset: spanned.span.start,
                    remaining: construct.closers(),
                });
                continue;
            }

            let Some(owner) = BlockConstruct::owning(token) else {
                continue;
            };

            let accepted = match stack.last_mut() {
                Some(top) if top.remaining.first() == Some(&token) => {
                    if top.remaining.len() == 1 {
                        stack.pop();
                    } else {
                        top.remaining = &top.remaining[1..];
                    }
                    true
                }
                _ => false,
            };

            if !accepted {
                diagnostics.push(unmatched(
                    db,
                    keyword_text(token),
                    spanned.span.start,
                    keyword_text(owner.opener()),
                ));
                if self.mode == BlockReportMode::First {
                    return diagnostics;
                }
            }
        }

        for open in &stack {
            let missing = open.remaining.first().copied().map(keyword_text).unwrap_or("");
            diagnostics.push(unmatched(
                db,
                keyword_text(open.construct.opener()),
                open.opener_offset,
                missing,
            ));
            if self.mode == BlockReportMode::First {
                break;
            }
        }

        diagnostics
    }
}

fn unmatched(
    db: &mut DiagnosticBuilder,
    keyword: &str,
    offset: usize,
    counterpart: &str,
) -> DiagnosticRecord {
    db.ident(keyword)
        .start(offset)
        .additional_info(counterpart)
        .severity(Severity::Error)
        .build(DiagnosticKind::UnmatchedBlock)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::mask;
    use proptest::prelude::*;
    use rstest::rstest;
    use wacc_diag_types::TextRange;

    fn check(text: &str, mode: BlockReportMode) -> Vec<DiagnosticRecord> {
        let masked = mask(text);
        let tokens = TokenStream::new(&masked);
        let mut db = DiagnosticBuilder::new("test.wacc", false);
        BlockScopeValidator::new(mode).validate(&tokens, &mut db)
    }

    fn messages(text: &str) -> Vec<String> {
        check(text, BlockReportMode::All)
            .into_iter()
            .map(|d| d.message)
            .collect()
    }

    #[rstest]
    #[case::block("begin skip end")]
    #[case::while_loop("begin while true do skip done end")]
    #[case::if_else("begin if x then skip else skip fi end")]
    #[case::function("begin int f() is return 1 end skip end")]
    #[case::nested("begin if a then while b do begin skip end done else skip fi end")]
    #[case::keyword_in_comment("begin skip # fi done end\nend")]
    #[case::keyword_in_string("begin print \"end\" end")]
    fn balanced_programs_are_clean(#[case] text: &str) {
        assert!(messages(text).is_empty(), "{text}: {:?}", messages(text));
    }

    #[test]
    fn unclosed_begin() {
        let diagnostics = check("begin skip", BlockReportMode::All);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].message, "'begin' without 'end'");
        assert_eq!(diagnostics[0].range, TextRange::new(0, 5));
        assert_eq!(diagnostics[0].kind, DiagnosticKind::UnmatchedBlock);
    }

    #[test]
    fn stray_closers_name_their_opener() {
        assert_eq!(messages("done"), vec!["'done' without 'while'"]);
        assert_eq!(messages("fi"), vec!["'fi' without 'if'"]);
        assert_eq!(messages("end"), vec!["'end' without 'is'"]);
        assert_eq!(messages("then"), vec!["'then' without 'if'"]);
    }

    #[test]
    fn stray_closer_anchors_at_its_own_occurrence() {
        let text = "begin skip end\ndone";
        let diagnostics = check(text, BlockReportMode::All);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].range.slice(text), Some("done"));
        assert_eq!(diagnostics[0].range.start, 15);
    }

    #[test]
    fn misordered_closer() {
        // `done` before `do`; the while stays open and swallows the `end` too
        let text = "begin while x done end";
        assert_eq!(
            messages(text),
            vec![
                "'done' without 'while'",
                "'end' without 'is'",
                "'begin' without 'end'",
                "'while' without 'do'",
            ]
        );
    }

    #[test]
    fn if_without_else_is_reported() {
        assert_eq!(
            messages("begin if x then skip fi end"),
            vec![
                "'fi' without 'if'",
                "'end' without 'is'",
                "'begin' without 'end'",
                "'if' without 'else'",
            ]
        );
    }

    #[test]
    fn all_unclosed_constructs_reported_outermost_first() {
        let text = "begin while x do if y then";
        let diagnostics = check(text, BlockReportMode::All);
        let slices: Vec<_> = diagnostics
            .iter()
            .map(|d| d.range.slice(text).unwrap_or(""))
            .collect();
        assert_eq!(slices, vec!["begin", "while", "if"]);
        assert_eq!(diagnostics[2].message, "'if' without 'else'");
        assert_eq!(diagnostics[1].message, "'while' without 'done'");
    }

    #[test]
    fn first_error_mode_stops_early() {
        let diagnostics = check("fi done end", BlockReportMode::First);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].message, "'fi' without 'if'");

        let diagnostics = check("begin while x do", BlockReportMode::First);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].message, "'begin' without 'end'");
    }

    #[test]
    fn repeated_keyword_anchors_at_the_offending_one() {
        let text = "begin skip end\nbegin skip end\nend";
        let diagnostics = check(text, BlockReportMode::All);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].range.start, text.len() - 3);
    }

    /// Random well-formed nestings of the four constructs.
    fn balanced() -> impl Strategy<Value = String> {
        let leaf = Just("skip".to_string());
        leaf.prop_recursive(4, 32, 3, |inner| {
            prop_oneof![
                inner.clone().prop_map(|b| format!("begin {b} end")),
                inner.clone().prop_map(|b| format!("while c do {b} done")),
                (inner.clone(), inner.clone())
                    .prop_map(|(a, b)| format!("if c then {a} else {b} fi")),
                inner.clone().prop_map(|b| format!("int f() is {b} end")),
                (inner.clone(), inner).prop_map(|(a, b)| format!("{a} ;\n{b}")),
            ]
        })
    }

    proptest! {
        #[test]
        fn balanced_nesting_has_no_block_diagnostics(body in balanced()) {
            let text = format!("begin {body} end");
            prop_assert!(check(&text, BlockReportMode::All).is_empty());
        }
    }
}
