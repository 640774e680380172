//! Textual pre-filter narrowing the file set for a semantic query.
//!
//! Before paying for analysis, a query like "who references `foo`" runs
//! two cheap textual passes over the workspace: does the file import (or
//! share a package with) the target's type, and does it contain the
//! target's identifier at all. Both passes are memoized per file content
//! version, so edits invalidate entries without any bookkeeping.
//!
//! The result is a guaranteed superset of the files that could define or
//! reference the target. False positives are corrected by real analysis
//! later; false negatives would be bugs.

use std::sync::Arc;

use rayon::prelude::*;
use rustc_hash::FxHashMap;
use smol_str::SmolStr;
use tracing::info;

use crate::base::{ContentVersion, FileId};
use crate::files::FileStore;
use crate::ptr::DeclPtr;
use crate::syntax::{Token, TokenKind};

/// The files that might define or reference a target.
///
/// `saturated` is set when the set was cut off at the configured limit;
/// callers must then degrade to an approximate answer instead of walking
/// an unbounded set.
#[derive(Debug, Clone, Default)]
pub struct CandidateSet {
    pub files: Vec<FileId>,
    pub saturated: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ImportKey {
    file: FileId,
    version: ContentVersion,
    container: SmolStr,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct WordKey {
    file: FileId,
    version: ContentVersion,
    word: SmolStr,
}

/// Memoizing candidate filter. One per orchestrator; not an ambient
/// singleton.
#[derive(Debug, Default)]
pub struct CandidateFilter {
    imports: FxHashMap<ImportKey, bool>,
    words: FxHashMap<WordKey, bool>,
}

impl CandidateFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Files that could possibly reference or define `ptr`.
    ///
    /// Two passes: import/package visibility, then literal occurrence of
    /// the identifier. Stops growing at `max_candidates`.
    pub fn candidate_files(
        &mut self,
        store: &FileStore,
        ptr: &DeclPtr,
        max_candidates: usize,
    ) -> CandidateSet {
        let container = ptr.container.clone();
        let word = ptr.simple_name();

        let all: Vec<FileId> = store.files().collect();
        info!("check {} files on the source path", all.len());

        let has_import: Vec<FileId> = self.filter_memoized(
            store,
            &all,
            |file, version| ImportKey {
                file,
                version,
                container: container.clone(),
            },
            |text| imports_target(text, &container),
            |filter| &mut filter.imports,
        );
        info!("...{} files can see `{}`", has_import.len(), container);

        let has_word: Vec<FileId> = self.filter_memoized(
            store,
            &has_import,
            |file, version| WordKey {
                file,
                version,
                word: word.clone(),
            },
            |text| contains_word(text, &word),
            |filter| &mut filter.words,
        );
        info!("...{} files contain the word `{}`", has_word.len(), word);

        let saturated = has_word.len() > max_candidates;
        let mut files = has_word;
        if saturated {
            info!(
                "...candidate set exceeds {} files, truncating",
                max_candidates
            );
            files.truncate(max_candidates);
        }
        CandidateSet { files, saturated }
    }

    /// Run a memoized predicate over `files`, computing misses in
    /// parallel, and keep the files where it holds.
    fn filter_memoized<K>(
        &mut self,
        store: &FileStore,
        files: &[FileId],
        make_key: impl Fn(FileId, ContentVersion) -> K,
        predicate: impl Fn(&str) -> bool + Sync,
        cache_of: impl Fn(&mut Self) -> &mut FxHashMap<K, bool>,
    ) -> Vec<FileId>
    where
        K: std::hash::Hash + Eq + Clone + Send,
    {
        let mut keyed: Vec<(FileId, K)> = Vec::with_capacity(files.len());
        let mut misses: Vec<(K, Arc<str>)> = Vec::new();
        for &file in files {
            let Some(version) = store.version(file) else {
                continue;
            };
            let key = make_key(file, version);
            if !cache_of(self).contains_key(&key) {
                if let Some(text) = store.text(file) {
                    misses.push((key.clone(), text));
                }
            }
            keyed.push((file, key));
        }

        let computed: Vec<(K, bool)> = misses
            .into_par_iter()
            .map(|(key, text)| {
                let hit = predicate(&text);
                (key, hit)
            })
            .collect();
        cache_of(self).extend(computed);

        keyed
            .into_iter()
            .filter(|(_, key)| cache_of(self).get(key).copied().unwrap_or(false))
            .map(|(file, _)| file)
            .collect()
    }
}

/// Could `text` see a member of `container` (a qualified container name
/// like `p.Outer` or `p.Outer.Inner`) by package visibility or import?
///
/// The scan cannot know where the package ends and nested type names
/// begin inside `container`, so it accepts any dotted-prefix relation:
/// a `package` line naming a prefix of `container`, or an `import` line
/// (plain, wildcard, or static) sharing a dotted prefix with it in
/// either direction. Over-approximation is fine; a miss here would be a
/// false negative, which is not.
///
/// Line-oriented: scanning stops at the first type-declaration line,
/// since nothing after it can be a package or import statement. An
/// unqualified container is visible everywhere.
pub fn imports_target(text: &str, container: &str) -> bool {
    if !container.contains('.') {
        return true;
    }
    for line in text.lines() {
        let line = line.trim_start();
        if is_type_declaration_line(line) {
            return false;
        }
        if let Some(rest) = strip_keyword(line, "package") {
            if dotted_prefix(rest.trim_end_matches(';').trim(), container) {
                return true;
            }
            continue;
        }
        let Some(rest) = strip_keyword(line, "import") else {
            continue;
        };
        let rest = rest.trim_start();
        let rest = strip_keyword(rest, "static")
            .map(str::trim_start)
            .unwrap_or(rest);
        let target = rest.trim_end().trim_end_matches(';');
        if let Some(scope) = target.strip_suffix(".*") {
            if dotted_prefix(scope, container) {
                return true;
            }
            continue;
        }
        if dotted_prefix(target, container) || dotted_prefix(container, target) {
            return true;
        }
    }
    false
}

/// Is `prefix` equal to `path` or a whole leading dotted segment of it?
fn dotted_prefix(prefix: &str, path: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some("") => true,
        Some(rest) => rest.starts_with('.'),
        None => false,
    }
}

/// Does `text` contain `word` as a whole identifier?
pub fn contains_word(text: &str, word: &str) -> bool {
    if word.is_empty() {
        return false;
    }
    let bytes = text.as_bytes();
    for (start, _) in text.match_indices(word) {
        let end = start + word.len();
        let before_ok = start == 0 || !is_ident_byte(bytes[start - 1]);
        let after_ok = end == bytes.len() || !is_ident_byte(bytes[end]);
        if before_ok && after_ok {
            return true;
        }
    }
    false
}

/// Token-level probe: does this file declare a method named `name`?
///
/// A declaration site looks like `ReturnType name(` — the identifier is
/// followed by `(` and preceded by a type-ish token, never by `.`, `::`,
/// or `new`. Like the filter itself this over-approximates; real analysis
/// confirms.
pub fn declares_method(text: &str, tokens: &[Token], name: &str) -> bool {
    let significant: Vec<&Token> = tokens.iter().filter(|t| !t.kind.is_trivia()).collect();
    for (i, tok) in significant.iter().enumerate() {
        if tok.kind != TokenKind::Ident || tok.text(text) != name {
            continue;
        }
        let follows_paren = significant
            .get(i + 1)
            .is_some_and(|t| t.kind == TokenKind::LParen);
        if !follows_paren {
            continue;
        }
        let prev = i.checked_sub(1).map(|p| significant[p].kind);
        match prev {
            Some(
                TokenKind::Ident | TokenKind::VoidKw | TokenKind::Gt | TokenKind::RBracket,
            ) => return true,
            _ => continue,
        }
    }
    false
}

/// Token-level probe: does this file declare a type named `name`?
pub fn declares_type(text: &str, tokens: &[Token], name: &str) -> bool {
    let significant: Vec<&Token> = tokens.iter().filter(|t| !t.kind.is_trivia()).collect();
    significant.windows(2).any(|pair| {
        pair[0].kind.is_type_keyword()
            && pair[1].kind == TokenKind::Ident
            && pair[1].text(text) == name
    })
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$'
}

/// `public final class Foo ...` — modifiers then a type keyword.
fn is_type_declaration_line(line: &str) -> bool {
    const MODIFIERS: &[&str] = &[
        "public", "private", "protected", "final", "abstract", "static", "sealed", "strictfp",
    ];
    for word in line.split_whitespace() {
        if MODIFIERS.contains(&word) {
            continue;
        }
        return matches!(word, "class" | "interface" | "enum" | "record");
    }
    false
}

fn strip_keyword<'a>(line: &'a str, keyword: &str) -> Option<&'a str> {
    let rest = line.strip_prefix(keyword)?;
    // Reject `packageFoo` and friends
    if rest.starts_with(|c: char| c.is_alphanumeric() || c == '_' || c == '$') {
        return None;
    }
    Some(rest)
}
