//! Logos-based lexer for Java source text.
//!
//! Fast tokenization using the logos crate. This is not a full Java lexer;
//! it covers exactly what the pruner, prefilter, and cursor classifier
//! need: trivia, literals (including unterminated forms, which matter for
//! safe terminator insertion), identifiers, the handful of keywords the
//! scanners care about, and punctuation.

use logos::Logos;
use text_size::{TextRange, TextSize};

/// A token with its kind and byte range in the original text.
///
/// Tokens carry no text of their own so a token list can be cached
/// independently of the string it was produced from; slice the source
/// with [`Token::range`] to recover the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub range: TextRange,
}

impl Token {
    /// Slice `text` to this token's lexeme.
    pub fn text<'a>(&self, text: &'a str) -> &'a str {
        &text[self.range]
    }
}

/// Tokenize an entire string into a Vec
pub fn tokenize(input: &str) -> Vec<Token> {
    let mut lexer = TokenKind::lexer(input);
    let mut tokens = Vec::new();
    while let Some(result) = lexer.next() {
        let span = lexer.span();
        let kind = result.unwrap_or(TokenKind::Error);
        tokens.push(Token {
            kind,
            range: TextRange::new(
                TextSize::new(span.start as u32),
                TextSize::new(span.end as u32),
            ),
        });
    }
    tokens
}

/// Logos token enum for Java
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // =========================================================================
    // TRIVIA
    // =========================================================================
    #[regex(r"[ \t\r\n]+")]
    Whitespace,

    #[regex(r"//[^\n]*")]
    LineComment,

    // The interior may contain star runs as long as they are not
    // followed by `/`; the closer is any star run plus `/`.
    #[regex(r"/\*([^*]|\*+[^*/])*\*+/")]
    BlockComment,

    // A block comment that runs to end of input
    #[regex(r"/\*([^*]|\*+[^*/])*\**", priority = 1)]
    UnterminatedComment,

    // =========================================================================
    // LITERALS
    // =========================================================================
    #[regex(r#""([^"\\\n]|\\.)*""#)]
    String,

    // A string literal with no closing quote before end of line
    #[regex(r#""([^"\\\n]|\\.)*"#, priority = 1)]
    UnterminatedString,

    #[regex(r"'([^'\\\n]|\\.)'")]
    CharLit,

    #[regex(r"'([^'\\\n]|\\.)?", priority = 1)]
    UnterminatedChar,

    #[regex(r"[0-9][0-9_]*[lLfFdD]?")]
    Integer,

    #[regex(r"[0-9][0-9_]*\.[0-9]+([eE][+-]?[0-9]+)?[fFdD]?")]
    Decimal,

    // =========================================================================
    // KEYWORDS (only the ones the scanners distinguish)
    // =========================================================================
    #[token("package")]
    PackageKw,
    #[token("import")]
    ImportKw,
    #[token("static")]
    StaticKw,
    #[token("class")]
    ClassKw,
    #[token("interface")]
    InterfaceKw,
    #[token("enum")]
    EnumKw,
    #[token("record")]
    RecordKw,
    #[token("new")]
    NewKw,
    #[token("throws")]
    ThrowsKw,
    #[token("void")]
    VoidKw,
    #[token("case")]
    CaseKw,

    #[regex(r"[a-zA-Z_$][a-zA-Z0-9_$]*")]
    Ident,

    // =========================================================================
    // MULTI-CHARACTER PUNCTUATION (must come before single-char)
    // =========================================================================
    #[token("::")]
    ColonColon,

    #[token("->")]
    Arrow,

    #[token("...")]
    Ellipsis,

    // =========================================================================
    // SINGLE-CHARACTER PUNCTUATION
    // =========================================================================
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token(";")]
    Semicolon,
    #[token(":")]
    Colon,
    #[token(".")]
    Dot,
    #[token(",")]
    Comma,
    #[token("@")]
    At,
    #[token("=")]
    Eq,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("!")]
    Bang,
    #[token("&")]
    Amp,
    #[token("|")]
    Pipe,
    #[token("^")]
    Caret,
    #[token("~")]
    Tilde,
    #[token("?")]
    Question,

    // Anything the patterns above do not cover (stray `#`, non-ASCII
    // punctuation). Newlines are already claimed by Whitespace.
    #[regex(r".", priority = 0)]
    Error,
}

impl TokenKind {
    /// Whitespace or comments — skipped by every structural scan.
    pub fn is_trivia(self) -> bool {
        matches!(
            self,
            TokenKind::Whitespace
                | TokenKind::LineComment
                | TokenKind::BlockComment
                | TokenKind::UnterminatedComment
        )
    }

    /// A token whose lexical structure is still open at its end.
    ///
    /// Inserting text immediately after one of these would land inside
    /// the literal/comment, so the pruner inserts before them instead.
    pub fn is_unterminated(self) -> bool {
        matches!(
            self,
            TokenKind::UnterminatedString
                | TokenKind::UnterminatedChar
                | TokenKind::UnterminatedComment
        )
    }

    /// A keyword that introduces a type declaration.
    pub fn is_type_keyword(self) -> bool {
        matches!(
            self,
            TokenKind::ClassKw | TokenKind::InterfaceKw | TokenKind::EnumKw | TokenKind::RecordKw
        )
    }
}
