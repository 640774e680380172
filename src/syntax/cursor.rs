//! Lexical classification of the cursor position.
//!
//! Completion behaves differently after `expr.`, after `Type::`, inside an
//! `import` statement, and so on. Each variant gets resolved once per
//! request from the token stream — handlers dispatch on the closed enum,
//! never on runtime inspection of analyzer internals.

use text_size::TextSize;

use super::lexer::{Token, TokenKind};

/// What kind of syntactic position the cursor sits in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorContext {
    /// After a `.`: completing a member of the receiver (`this.f|`).
    MemberSelect,
    /// After a `::`: completing a method reference (`List::o|`).
    MemberReference,
    /// Inside `new ...`: completing a constructable type name.
    NewInstance,
    /// Inside an `import` statement.
    Import,
    /// After `@`: completing an annotation type name.
    Annotation,
    /// After `case`: completing an enum constant or constant expression.
    CaseLabel,
    /// A bare identifier with no qualifying context.
    Identifier,
    /// Anything else (whitespace between statements, literals, ...).
    Other,
}

impl CursorContext {
    /// Classify the position `offset` against a token stream.
    pub fn at(tokens: &[Token], offset: TextSize) -> CursorContext {
        let significant: Vec<&Token> = tokens.iter().filter(|t| !t.kind.is_trivia()).collect();

        // The token the cursor is in, or the one it trails.
        let Some(cur) = significant
            .iter()
            .rposition(|t| t.range.start() < offset && t.range.end() >= offset)
        else {
            return CursorContext::Other;
        };

        // Statement-level contexts win over expression-level ones.
        match statement_head(&significant, cur) {
            Some(TokenKind::ImportKw) => return CursorContext::Import,
            Some(TokenKind::CaseKw) => return CursorContext::CaseLabel,
            _ => {}
        }

        match significant[cur].kind {
            TokenKind::Dot => CursorContext::MemberSelect,
            TokenKind::ColonColon => CursorContext::MemberReference,
            TokenKind::At => CursorContext::Annotation,
            TokenKind::NewKw => CursorContext::NewInstance,
            TokenKind::Ident => match previous_of_chain(&significant, cur) {
                Some(TokenKind::Dot) => CursorContext::MemberSelect,
                Some(TokenKind::ColonColon) => CursorContext::MemberReference,
                Some(TokenKind::At) => CursorContext::Annotation,
                Some(TokenKind::NewKw) => CursorContext::NewInstance,
                _ => CursorContext::Identifier,
            },
            _ => CursorContext::Other,
        }
    }
}

/// First significant token of the statement containing `cur`.
fn statement_head(significant: &[&Token], cur: usize) -> Option<TokenKind> {
    let mut head = significant[cur].kind;
    for tok in significant[..cur].iter().rev() {
        match tok.kind {
            TokenKind::Semicolon | TokenKind::LBrace | TokenKind::RBrace => break,
            kind => head = kind,
        }
    }
    Some(head)
}

/// The token immediately before the dotted name chain ending at `cur`.
///
/// For `new a.b.C|` this walks back over `a.b.C` and returns `new`;
/// for `this.f|` it returns the `.`.
fn previous_of_chain(significant: &[&Token], cur: usize) -> Option<TokenKind> {
    debug_assert_eq!(significant[cur].kind, TokenKind::Ident);
    let prev = cur.checked_sub(1)?;
    match significant[prev].kind {
        TokenKind::Dot => {
            // Continue walking only if the chain is `Ident.Ident...`;
            // `this.f` and `expr().f` stay MemberSelect.
            let before_dot = prev.checked_sub(1)?;
            if significant[before_dot].kind == TokenKind::Ident {
                match previous_of_chain(significant, before_dot) {
                    Some(k @ (TokenKind::NewKw | TokenKind::At)) => Some(k),
                    _ => Some(TokenKind::Dot),
                }
            } else {
                Some(TokenKind::Dot)
            }
        }
        kind => Some(kind),
    }
}
