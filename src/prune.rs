//! Source pruning: shrink a buffer to what one query needs.
//!
//! Analysis cost is dominated by method bodies, and most queries need
//! almost none of them. The two transforms here blank out content the
//! query cannot observe while keeping every declaration, import, and
//! signature intact:
//!
//! - [`prune_around_cursor`] for completion: terminate the statement at
//!   the cursor, drop the statements after it, and erase bodies of
//!   methods the cursor is not in.
//! - [`erase_unrelated_bodies`] for reference confirmation: erase bodies
//!   that cannot mention the target identifier.
//!
//! Erased regions are filled with spaces (newlines kept), so the byte
//! offsets and line/column positions of everything retained are unchanged
//! and spans from the analyzer map straight back onto the original text.
//! All edits respect token boundaries; a terminator is never inserted
//! inside a string literal or comment.

use crate::base::Position;
use crate::prefilter::contains_word;
use crate::syntax::{LineIndex, Token, TokenKind, tokenize};

/// What a `{ ... }` pair is, judged from its declaration header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BraceKind {
    /// Body of a class, interface, enum, or record.
    TypeBody,
    /// Body of a method or constructor (header ends in a parameter list,
    /// possibly followed by a throws clause).
    MethodBody,
    /// Static or instance initializer directly inside a type body.
    InitializerBody,
    /// Any other block: statement blocks, array initializers, lambdas,
    /// anonymous classes. Never erased.
    Block,
}

/// A brace pair with byte offsets of its `{` and `}`.
#[derive(Debug, Clone, Copy)]
struct Region {
    kind: BraceKind,
    open: usize,
    /// None when the buffer ends before the brace closes.
    close: Option<usize>,
}

impl Region {
    fn contains(&self, offset: usize) -> bool {
        self.open < offset && self.close.is_none_or(|close| offset <= close)
    }

    fn erasable(&self) -> bool {
        matches!(self.kind, BraceKind::MethodBody | BraceKind::InitializerBody)
    }
}

/// Classify every brace pair in the token stream.
fn classify_regions(tokens: &[Token]) -> Vec<Region> {
    let mut regions: Vec<Region> = Vec::new();
    // (region index, kind) of each currently open brace
    let mut stack: Vec<(usize, BraceKind)> = Vec::new();
    // Significant tokens since the last statement boundary at this level
    let mut header: Vec<TokenKind> = Vec::new();

    for tok in tokens.iter().filter(|t| !t.kind.is_trivia()) {
        match tok.kind {
            TokenKind::LBrace => {
                let parent = stack.last().map(|&(_, kind)| kind);
                let kind = classify_open(&header, parent);
                regions.push(Region {
                    kind,
                    open: usize::from(tok.range.start()),
                    close: None,
                });
                stack.push((regions.len() - 1, kind));
                header.clear();
            }
            TokenKind::RBrace => {
                if let Some((index, _)) = stack.pop() {
                    regions[index].close = Some(usize::from(tok.range.start()));
                }
                header.clear();
            }
            TokenKind::Semicolon => header.clear(),
            kind => header.push(kind),
        }
    }
    regions
}

fn classify_open(header: &[TokenKind], parent: Option<BraceKind>) -> BraceKind {
    if header.iter().any(|k| k.is_type_keyword()) {
        return BraceKind::TypeBody;
    }
    if parent == Some(BraceKind::TypeBody) {
        if header.contains(&TokenKind::LParen) && header.contains(&TokenKind::RParen) {
            return BraceKind::MethodBody;
        }
        if header.is_empty() || header == [TokenKind::StaticKw] {
            return BraceKind::InitializerBody;
        }
    }
    BraceKind::Block
}

/// Blank a byte range, keeping newlines so positions stay valid.
fn blank(buf: &mut [u8], from: usize, to: usize) {
    for b in &mut buf[from..to] {
        if *b != b'\n' {
            *b = b' ';
        }
    }
}

/// Cursor-completion pruning.
///
/// Returns the original text unchanged if the position does not exist.
/// Everything before the cursor keeps its exact byte offsets; the only
/// length change is a single `;` spliced in after the cursor's token when
/// the statement there is unterminated.
pub fn prune_around_cursor(text: &str, position: Position) -> String {
    let Some(offset) = LineIndex::new(text).offset(position) else {
        return text.to_string();
    };
    let offset = usize::from(offset);
    let tokens = tokenize(text);
    let regions = classify_regions(&tokens);
    let mut buf = text.as_bytes().to_vec();

    // Bodies the cursor is not inside contribute nothing to resolution at
    // the cursor beyond their signatures.
    for region in &regions {
        if region.erasable() && !region.contains(offset) {
            if let Some(close) = region.close {
                blank(&mut buf, region.open + 1, close);
            }
        }
    }

    let insert_at = terminator_insertion_point(text, &tokens, offset);

    // Drop the statements after the cursor, walking out from the
    // innermost enclosing block to the enclosing method body. Each step
    // erases only up to its own closing brace, so every brace that was
    // opened before the cursor keeps its partner.
    let mut erase_from = insert_at;
    for region in enclosing_chain(&regions, offset) {
        if let Some(close) = region.close {
            if erase_from < close {
                blank(&mut buf, erase_from, close);
            }
            erase_from = close + 1;
        }
        if region.erasable() {
            break;
        }
    }

    let mut result = String::from_utf8(buf).unwrap_or_else(|_| text.to_string());
    if let Some(at) = needs_terminator(&tokens, insert_at).then_some(insert_at) {
        result.insert(at, ';');
    }
    result
}

/// Reference-confirmation pruning.
///
/// Erase every method/initializer body with no whole-word occurrence of
/// `ident`. Signatures, fields, imports, and type structure are left
/// untouched, so resolution of the retained code cannot change.
pub fn erase_unrelated_bodies(text: &str, ident: &str) -> String {
    let tokens = tokenize(text);
    let regions = classify_regions(&tokens);
    let mut buf = text.as_bytes().to_vec();
    for region in &regions {
        if !region.erasable() {
            continue;
        }
        let Some(close) = region.close else { continue };
        let interior = &text[region.open + 1..close];
        if !contains_word(interior, ident) {
            blank(&mut buf, region.open + 1, close);
        }
    }
    String::from_utf8(buf).unwrap_or_else(|_| text.to_string())
}

/// Dependency pruning.
///
/// Erase every method/initializer body outright. What remains is exactly
/// the declaration surface other files resolve against, which is all a
/// dependency contributes to an analysis of someone else's file.
pub fn erase_method_bodies(text: &str) -> String {
    let tokens = tokenize(text);
    let regions = classify_regions(&tokens);
    let mut buf = text.as_bytes().to_vec();
    for region in &regions {
        if !region.erasable() {
            continue;
        }
        let Some(close) = region.close else { continue };
        blank(&mut buf, region.open + 1, close);
    }
    String::from_utf8(buf).unwrap_or_else(|_| text.to_string())
}

/// Regions containing `offset`, innermost first, up to and including the
/// innermost method/initializer body. Type bodies are never entered.
fn enclosing_chain(regions: &[Region], offset: usize) -> impl Iterator<Item = &Region> {
    let mut chain: Vec<&Region> = regions
        .iter()
        .filter(|r| r.contains(offset) && r.kind != BraceKind::TypeBody)
        .collect();
    // Innermost = latest open
    chain.sort_by_key(|r| std::cmp::Reverse(r.open));
    let stop = chain.iter().position(|r| r.erasable());
    chain.truncate(match stop {
        Some(i) => i + 1,
        None => 0,
    });
    chain.into_iter()
}

/// Where a terminator may be spliced in for a cursor at `offset`.
///
/// Right after the token the cursor touches — unless that token is an
/// unterminated string, char, or comment, in which case splicing after it
/// would land inside the literal; the safe point is just before it.
fn terminator_insertion_point(text: &str, tokens: &[Token], offset: usize) -> usize {
    let cursor_tok = tokens
        .iter()
        .filter(|t| t.kind != TokenKind::Whitespace)
        .rfind(|t| usize::from(t.range.start()) < offset);
    match cursor_tok {
        Some(tok) if tok.kind.is_unterminated() => usize::from(tok.range.start()),
        Some(tok) => usize::from(tok.range.end()).max(offset.min(text.len())),
        None => offset.min(text.len()),
    }
}

/// A terminator is needed unless the statement is already terminated or
/// the insertion point sits at a block boundary.
fn needs_terminator(tokens: &[Token], insert_at: usize) -> bool {
    let next = tokens
        .iter()
        .filter(|t| !t.kind.is_trivia())
        .find(|t| usize::from(t.range.start()) >= insert_at);
    !matches!(
        next.map(|t| t.kind),
        Some(TokenKind::Semicolon | TokenKind::LBrace)
    )
}
