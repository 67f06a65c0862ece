//! Tokenizer for masked WACC source.
//!
//! Produces a flat, offset-carrying token stream that the block validator and
//! the identifier scanners both consume. It is deliberately shallow: words,
//! the handful of punctuation marks the scanners care about, and a catch-all
//! for everything else. Comments and literals are expected to be masked
//! already, so they arrive here as runs of `*` punctuation.

use std::ops::Range;

use logos::Logos;

/// Reserved words of the language, block keywords included.
pub const RESERVED_WORDS: &[&str] = &[
    "skip", "read", "free", "return", "exit", "print", "println", "if", "then", "else", "fi",
    "while", "is", "do", "done", "begin", "end", "len", "chr", "ord", "call", "newpair", "fst",
    "snd", "null", "true", "false",
];

/// Primitive type names.
pub const PRIMITIVE_TYPES: &[&str] = &["int", "bool", "char", "string", "pair"];

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[logos(skip r"[ \t\r\n\f]+")]
pub enum Token {
    // Block structure
    #[token("is")]
    Is,
    #[token("end")]
    End,
    #[token("while")]
    While,
    #[token("do")]
    Do,
    #[token("done")]
    Done,
    #[token("begin")]
    Begin,
    #[token("if")]
    If,
    #[token("then")]
    Then,
    #[token("else")]
    Else,
    #[token("fi")]
    Fi,

    // Statements and expressions
    #[token("skip")]
    Skip,
    #[token("read")]
    Read,
    #[token("free")]
    Free,
    #[token("return")]
    Return,
    #[token("exit")]
    Exit,
    #[token("print")]
    Print,
    #[token("println")]
    Println,
    #[token("len")]
    Len,
    #[token("chr")]
    Chr,
    #[token("ord")]
    Ord,
    #[token("call")]
    Call,
    #[token("newpair")]
    Newpair,
    #[token("fst")]
    Fst,
    #[token("snd")]
    Snd,
    #[token("null")]
    Null,
    #[token("true")]
    True,
    #[token("false")]
    False,

    // Types
    #[token("int")]
    Int,
    #[token("bool")]
    Bool,
    #[token("char")]
    Char,
    #[token("string")]
    StringType,
    #[token("pair")]
    Pair,

    #[regex(r"[0-9]+", priority = 3)]
    Number,
    /// Any other word. May start with a digit (`1abc`); declaring such a
    /// word is reported as an invalid identifier.
    #[regex(r"[A-Za-z0-9_]+")]
    Word,

    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token(",")]
    Comma,
    /// Any other single non-whitespace character.
    #[regex(r"[^A-Za-z0-9_ \t\r\n\f()\[\],]")]
    Punct,
}

impl Token {
    /// Reserved word (block keywords included), not a type.
    pub fn is_reserved(self) -> bool {
        matches!(
            self,
            Token::Is
                | Token::End
                | Token::While
                | Token::Do
                | Token::Done
                | Token::Begin
                | Token::If
                | Token::Then
                | Token::Else
                | Token::Fi
                | Token::Skip
                | Token::Read
                | Token::Free
                | Token::Return
                | Token::Exit
                | Token::Print
                | Token::Println
                | Token::Len
                | Token::Chr
                | Token::Ord
                | Token::Call
                | Token::Newpair
                | Token::Fst
                | Token::Snd
                | Token::Null
                | Token::True
                | Token::False
        )
    }

    pub fn is_type(self) -> bool {
        matches!(
            self,
            Token::Int | Token::Bool | Token::Char | Token::StringType | Token::Pair
        )
    }

    /// A word-shaped token: keyword, type, number or plain word.
    pub fn is_word(self) -> bool {
        self.is_reserved() || self.is_type() || matches!(self, Token::Number | Token::Word)
    }
}

/// Whether `word` is a reserved word or primitive type.
pub fn is_keyword(word: &str) -> bool {
    RESERVED_WORDS.contains(&word) || PRIMITIVE_TYPES.contains(&word)
}

/// A token and its byte span in the scanned text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spanned {
    pub token: Token,
    pub span: Range<usize>,
}

/// Tokenize text. Never fails: unrecognized input becomes [`Token::Punct`].
pub fn tokenize(text: &str) -> Vec<Spanned> {
    let mut lexer = Token::lexer(text);
    let mut tokens = Vec::new();
    while let Some(result) = lexer.next() {
        let token = result.unwrap_or(Token::Punct);
        tokens.push(Spanned {
            token,
            span: lexer.span(),
        });
    }
    tokens
}

/// A tokenized text with helpers for looking at neighbours.
pub struct TokenStream<'a> {
    text: &'a str,
    tokens: Vec<Spanned>,
}

impl<'a> TokenStream<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            text,
            tokens: tokenize(text),
        }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Spanned> {
        self.tokens.get(index)
    }

    pub fn token(&self, index: usize) -> Option<Token> {
        self.tokens.get(index).map(|t| t.token)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Spanned> {
        self.tokens.iter()
    }

    /// Source text of the token at `index`.
    pub fn text(&self, index: usize) -> &'a str {
        self.tokens
            .get(index)
            .and_then(|t| self.text.get(t.span.clone()))
            .unwrap_or("")
    }

    pub fn offset(&self, index: usize) -> usize {
        self.tokens.get(index).map(|t| t.span.start).unwrap_or(0)
    }

    /// Whether the token after `index` is an opening parenthesis.
    pub fn followed_by_paren(&self, index: usize) -> bool {
        self.token(index + 1) == Some(Token::LParen)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(text: &str) -> Vec<Token> {
        tokenize(text).into_iter().map(|t| t.token).collect()
    }

    #[test]
    fn keywords_and_words() {
        assert_eq!(
            kinds("begin island is end"),
            vec![Token::Begin, Token::Word, Token::Is, Token::End]
        );
    }

    #[test]
    fn numbers_and_digit_led_words() {
        assert_eq!(kinds("42 1abc x1"), vec![Token::Number, Token::Word, Token::Word]);
    }

    #[test]
    fn punctuation() {
        assert_eq!(
            kinds("f(a, b[0]);"),
            vec![
                Token::Word,
                Token::LParen,
                Token::Word,
                Token::Comma,
                Token::Word,
                Token::LBracket,
                Token::Number,
                Token::RBracket,
                Token::RParen,
                Token::Punct,
            ]
        );
    }

    #[test]
    fn masked_literal_is_punctuation_only() {
        assert!(kinds("****").iter().all(|t| *t == Token::Punct));
    }

    #[test]
    fn spans_are_byte_offsets() {
        let tokens = tokenize("int x\n  = 1");
        let spans: Vec<_> = tokens.iter().map(|t| t.span.clone()).collect();
        assert_eq!(spans, vec![0..3, 4..5, 8..9, 10..11]);
    }

    #[test]
    fn stream_helpers() {
        let stream = TokenStream::new("int f(int a) is");
        assert_eq!(stream.len(), 7);
        assert_eq!(stream.text(1), "f");
        assert!(stream.followed_by_paren(1));
        assert!(!stream.followed_by_paren(4));
        assert_eq!(stream.offset(6), 13);
        assert_eq!(stream.text(99), "");
    }

    #[test]
    fn keyword_tables_agree_with_tokens() {
        for word in RESERVED_WORDS {
            assert!(kinds(word)[0].is_reserved(), "{word} should lex as reserved");
        }
        for word in PRIMITIVE_TYPES {
            assert!(kinds(word)[0].is_type(), "{word} should lex as a type");
        }
        assert!(is_keyword("fi"));
        assert!(is_keyword("string"));
        assert!(!is_keyword("main"));
    }
}
