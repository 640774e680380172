//! A deterministic token-level Java analyzer for integration tests.
//!
//! Real deployments plug a full compiler frontend in behind the
//! [`Analyzer`] trait. These tests need reproducible declarations,
//! references and diagnostics without one, so this analyzer resolves a
//! small Java subset directly from the token stream:
//!
//! - type declarations (`class`/`interface`/`enum`/`record` + name)
//! - member methods, constructors and fields at type-body depth
//! - calls resolved by simple name and argument count
//! - field and type uses resolved by simple name
//! - lexical errors (unterminated literals/comments) as diagnostics
//!
//! Resolution is name-based and first-match, which is exactly as much
//! semantics as the orchestrator tests rely on.

use std::sync::Arc;

use smol_str::SmolStr;

use javelin::analyzer::{
    AnalysisInput, AnalysisOutput, Analyzer, Declaration, Diagnostic, Reference, Severity,
};
use javelin::base::{FileId, Span};
use javelin::syntax::{LineIndex, Token, TokenKind, tokenize};
use javelin::{DeclKind, Result};

pub struct TokenAnalyzer;

impl Analyzer for TokenAnalyzer {
    fn analyze(&self, input: &AnalysisInput) -> Result<AnalysisOutput> {
        let mut output = AnalysisOutput::default();
        let mut parsed = Vec::new();
        for (file, text) in &input.sources {
            let parse = FileParse::new(*file, text.clone());
            output.declarations.extend(parse.declarations.clone());
            output.diagnostics.extend(parse.lexical_errors());
            if input.options.lint {
                output.diagnostics.extend(parse.lints());
            }
            parsed.push(parse);
        }
        for parse in &parsed {
            parse.resolve_references(&output.declarations, &mut output.references);
        }
        Ok(output)
    }
}

struct FileParse {
    file: FileId,
    text: Arc<str>,
    tokens: Vec<Token>,
    lines: LineIndex,
    declarations: Vec<Declaration>,
    /// Token indices that name a declaration, excluded from the
    /// reference pass.
    decl_sites: Vec<usize>,
    /// Token index ranges covered by `package`/`import` statements.
    header_ranges: Vec<(usize, usize)>,
}

impl FileParse {
    fn new(file: FileId, text: Arc<str>) -> Self {
        let tokens = tokenize(&text);
        let lines = LineIndex::new(&text);
        let mut parse = FileParse {
            file,
            text,
            tokens,
            lines,
            declarations: Vec::new(),
            decl_sites: Vec::new(),
            header_ranges: Vec::new(),
        };
        parse.collect_declarations();
        parse
    }

    fn token_text(&self, i: usize) -> &str {
        self.tokens[i].text(&self.text)
    }

    fn span(&self, i: usize) -> Span {
        let range = self.tokens[i].range;
        Span::new(
            self.lines.position(range.start()),
            self.lines.position(range.end()),
        )
    }

    fn next_significant(&self, from: usize) -> Option<usize> {
        (from + 1..self.tokens.len()).find(|&i| !self.tokens[i].kind.is_trivia())
    }

    fn prev_significant(&self, from: usize) -> Option<usize> {
        (0..from).rev().find(|&i| !self.tokens[i].kind.is_trivia())
    }

    /// Argument or parameter count of the paren group opening at
    /// `lparen`: zero when empty, otherwise top-level commas plus one.
    fn paren_arity(&self, lparen: usize) -> u8 {
        let mut depth = 0usize;
        let mut commas = 0u8;
        let mut any = false;
        for i in lparen..self.tokens.len() {
            match self.tokens[i].kind {
                TokenKind::LParen => depth += 1,
                TokenKind::RParen => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                }
                kind if kind.is_trivia() => {}
                TokenKind::Comma if depth == 1 => {
                    commas += 1;
                    any = true;
                }
                _ if depth >= 1 => any = true,
                _ => {}
            }
        }
        if any { commas + 1 } else { 0 }
    }

    fn collect_declarations(&mut self) {
        let mut package = SmolStr::default();
        // Innermost enclosing type and the brace depth of its body.
        let mut type_stack: Vec<(SmolStr, usize)> = Vec::new();
        let mut pending_type: Option<SmolStr> = None;
        let mut depth = 0usize;

        let mut i = 0;
        while i < self.tokens.len() {
            let kind = self.tokens[i].kind;
            if kind.is_trivia() {
                i += 1;
                continue;
            }
            match kind {
                TokenKind::PackageKw => {
                    let (name, end) = self.dotted_name(i + 1);
                    package = name;
                    self.header_ranges.push((i, end));
                    i = end + 1;
                    continue;
                }
                TokenKind::ImportKw => {
                    let (_, end) = self.dotted_name(i + 1);
                    self.header_ranges.push((i, end));
                    i = end + 1;
                    continue;
                }
                TokenKind::LBrace => {
                    depth += 1;
                    if let Some(name) = pending_type.take() {
                        type_stack.push((name, depth));
                    }
                }
                TokenKind::RBrace => {
                    if type_stack.last().is_some_and(|(_, d)| *d == depth) {
                        type_stack.pop();
                    }
                    depth = depth.saturating_sub(1);
                }
                k if k.is_type_keyword() => {
                    if let Some(name_ix) = self.next_significant(i) {
                        if self.tokens[name_ix].kind == TokenKind::Ident {
                            let name = SmolStr::new(self.token_text(name_ix));
                            self.declarations.push(Declaration {
                                file: self.file,
                                span: self.span(name_ix),
                                name: name.clone(),
                                container: package.clone(),
                                kind: type_kind(k),
                                arity: 0,
                                synthetic: false,
                            });
                            self.decl_sites.push(name_ix);
                            pending_type = Some(name);
                            i = name_ix + 1;
                            continue;
                        }
                    }
                }
                TokenKind::Ident => {
                    // Members only at the innermost type-body depth;
                    // anything deeper is statement territory.
                    let at_member_depth =
                        type_stack.last().is_some_and(|(_, d)| *d == depth);
                    if at_member_depth {
                        let (type_name, _) = type_stack.last().cloned().unwrap();
                        let container = qualify(&package, &type_name);
                        if let Some(decl) =
                            self.member_at(i, &type_name, &container)
                        {
                            self.declarations.push(decl);
                            self.decl_sites.push(i);
                        }
                    }
                }
                _ => {}
            }
            i += 1;
        }
    }

    /// A member declaration headed by the identifier at `i`, if the
    /// surrounding tokens form one.
    fn member_at(&self, i: usize, type_name: &str, container: &SmolStr) -> Option<Declaration> {
        let name = SmolStr::new(self.token_text(i));
        let prev = self.prev_significant(i).map(|p| self.tokens[p].kind);
        let next = self.next_significant(i)?;
        let preceded_by_type = matches!(
            prev,
            Some(TokenKind::Ident | TokenKind::VoidKw | TokenKind::Gt | TokenKind::RBracket)
        );
        match self.tokens[next].kind {
            TokenKind::LParen if preceded_by_type => {
                let kind = if name == type_name {
                    DeclKind::Constructor
                } else {
                    DeclKind::Method
                };
                Some(Declaration {
                    file: self.file,
                    span: self.span(i),
                    name,
                    container: container.clone(),
                    kind,
                    arity: self.paren_arity(next),
                    synthetic: false,
                })
            }
            TokenKind::Semicolon | TokenKind::Eq if preceded_by_type => Some(Declaration {
                file: self.file,
                span: self.span(i),
                name,
                container: container.clone(),
                kind: DeclKind::Field,
                arity: 0,
                synthetic: false,
            }),
            _ => None,
        }
    }

    /// Reads a dotted identifier chain starting at or after `from`;
    /// returns the joined name and the index of the closing token
    /// (semicolon when present).
    fn dotted_name(&self, from: usize) -> (SmolStr, usize) {
        let mut parts = String::new();
        let mut last = from;
        for i in from..self.tokens.len() {
            match self.tokens[i].kind {
                kind if kind.is_trivia() => {}
                TokenKind::Ident => parts.push_str(self.token_text(i)),
                TokenKind::Dot => parts.push('.'),
                TokenKind::StaticKw => {}
                TokenKind::Star => parts.push('*'),
                _ => {
                    last = i;
                    break;
                }
            }
            last = i;
        }
        let trimmed = parts.trim_end_matches(".*").trim_end_matches('.');
        (SmolStr::new(trimmed), last)
    }

    fn in_header(&self, i: usize) -> bool {
        self.header_ranges
            .iter()
            .any(|&(start, end)| i >= start && i <= end)
    }

    fn resolve_references(&self, declarations: &[Declaration], out: &mut Vec<Reference>) {
        for i in 0..self.tokens.len() {
            if self.tokens[i].kind != TokenKind::Ident
                || self.decl_sites.contains(&i)
                || self.in_header(i)
            {
                continue;
            }
            let name = self.token_text(i);
            let next = self.next_significant(i).map(|n| self.tokens[n].kind);
            let target = if next == Some(TokenKind::LParen) {
                let lparen = self.next_significant(i).unwrap();
                let arity = self.paren_arity(lparen);
                declarations.iter().find(|d| {
                    d.kind.is_callable() && d.name == name && d.arity == arity
                })
            } else {
                declarations
                    .iter()
                    .find(|d| d.kind == DeclKind::Field && d.name == name)
                    .or_else(|| {
                        declarations
                            .iter()
                            .find(|d| d.kind.is_type() && d.name == name)
                    })
            };
            if let Some(target) = target {
                out.push(Reference {
                    file: self.file,
                    span: self.span(i),
                    target: target.clone(),
                });
            }
        }
    }

    fn lexical_errors(&self) -> Vec<Diagnostic> {
        self.tokens
            .iter()
            .enumerate()
            .filter(|(_, t)| t.kind.is_unterminated())
            .map(|(i, _)| Diagnostic {
                file: self.file,
                span: self.span(i),
                severity: Severity::Error,
                message: "unterminated literal or comment".to_string(),
            })
            .collect()
    }

    /// Lint pass: flag wildcard imports.
    fn lints(&self) -> Vec<Diagnostic> {
        let mut lints = Vec::new();
        for &(start, end) in &self.header_ranges {
            if self.tokens[start].kind != TokenKind::ImportKw {
                continue;
            }
            let (name, _) = self.dotted_name(start + 1);
            let raw: String = (start..=end)
                .map(|i| self.token_text(i))
                .collect();
            if raw.contains('*') {
                lints.push(Diagnostic {
                    file: self.file,
                    span: self.span(start),
                    severity: Severity::Warning,
                    message: format!("wildcard import of `{name}`"),
                });
            }
        }
        lints
    }
}

fn type_kind(kind: TokenKind) -> DeclKind {
    match kind {
        TokenKind::ClassKw => DeclKind::Class,
        TokenKind::InterfaceKw => DeclKind::Interface,
        TokenKind::EnumKw => DeclKind::Enum,
        _ => DeclKind::Record,
    }
}

fn qualify(package: &str, type_name: &str) -> SmolStr {
    if package.is_empty() {
        SmolStr::new(type_name)
    } else {
        SmolStr::new(format!("{package}.{type_name}"))
    }
}
