//! Contract with the external semantic analyzer.
//!
//! The analyzer itself lives outside this crate: it parses the sources it
//! is handed and resolves symbols and types. This module pins down the
//! only three capabilities the core relies on:
//!
//! 1. map a source position to the innermost resolved node containing it,
//! 2. map a resolved declaration back to its declaring file and span,
//! 3. enumerate all declarations in a file.
//!
//! Everything the analyzer reports arrives as plain data in
//! [`AnalysisOutput`]; the core never holds analyzer-internal handles past
//! the end of a pass (see [`crate::ptr`]).

use std::sync::Arc;

use smol_str::SmolStr;

use crate::base::{FileId, Position, Span};
use crate::error::Result;

/// What kind of declaration an analyzer observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeclKind {
    Class,
    Interface,
    Enum,
    Record,
    Method,
    Constructor,
    Field,
}

impl DeclKind {
    pub fn is_type(self) -> bool {
        matches!(
            self,
            DeclKind::Class | DeclKind::Interface | DeclKind::Enum | DeclKind::Record
        )
    }

    pub fn is_callable(self) -> bool {
        matches!(self, DeclKind::Method | DeclKind::Constructor)
    }
}

/// A declaration observed during one analysis pass.
///
/// `container` is the qualified name of the enclosing container: the
/// package for top-level types, the package-qualified type for members.
/// `synthetic` marks analyzer-generated members (error recovery, lambdas)
/// that have no stable identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub file: FileId,
    pub span: Span,
    pub name: SmolStr,
    pub container: SmolStr,
    pub kind: DeclKind,
    pub arity: u8,
    pub synthetic: bool,
}

/// A resolved reference observed during one analysis pass.
///
/// The target is carried as a [`Declaration`] payload rather than an
/// analyzer handle so the output stays comparable across runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub file: FileId,
    pub span: Span,
    pub target: Declaration,
}

/// Severity of an analyzer diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Note,
    Warning,
    Error,
}

/// A diagnostic reported by the analyzer.
///
/// Diagnostics are data, not faults: they are surfaced to the caller
/// verbatim and never propagate as errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub file: FileId,
    pub span: Span,
    pub severity: Severity,
    pub message: String,
}

impl Diagnostic {
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// Options for one analysis pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnalyzeOptions {
    /// Run the analyzer's lint passes (diagnostics tier only).
    pub lint: bool,
}

/// The sources handed to the analyzer for one pass.
///
/// Texts are shared, never copied: pruned buffers are built per request
/// and dropped with it.
#[derive(Debug, Clone)]
pub struct AnalysisInput {
    pub sources: Vec<(FileId, Arc<str>)>,
    pub options: AnalyzeOptions,
}

impl AnalysisInput {
    pub fn new(sources: Vec<(FileId, Arc<str>)>) -> Self {
        Self {
            sources,
            options: AnalyzeOptions::default(),
        }
    }

    pub fn with_lint(mut self) -> Self {
        self.options.lint = true;
        self
    }
}

/// Everything one analysis pass produced, as plain data.
#[derive(Debug, Clone, Default)]
pub struct AnalysisOutput {
    pub declarations: Vec<Declaration>,
    pub references: Vec<Reference>,
    pub diagnostics: Vec<Diagnostic>,
}

impl AnalysisOutput {
    /// All declarations physically present in `file` (capability 3).
    pub fn declarations_in(&self, file: FileId) -> impl Iterator<Item = &Declaration> {
        self.declarations.iter().filter(move |d| d.file == file)
    }

    /// The innermost reference whose span contains `position`
    /// (capability 1). Innermost = smallest containing span.
    pub fn reference_at(&self, file: FileId, position: Position) -> Option<&Reference> {
        self.references
            .iter()
            .filter(|r| r.file == file && r.span.contains(position))
            .min_by_key(|r| span_lines(&r.span))
    }

    /// The innermost declaration whose span contains `position`.
    pub fn declaration_at(&self, file: FileId, position: Position) -> Option<&Declaration> {
        self.declarations
            .iter()
            .filter(|d| d.file == file && d.span.contains(position))
            .min_by_key(|d| span_lines(&d.span))
    }

    /// The declaring site of a pointer, if this pass saw it (capability 2).
    pub fn declaration_site(&self, ptr: &crate::ptr::DeclPtr) -> Option<&Declaration> {
        self.declarations
            .iter()
            .filter(|d| !d.synthetic)
            .find(|d| crate::ptr::DeclPtr::from_decl(d).as_ref() == Ok(ptr))
    }

    /// Whether the pass reported any error-severity diagnostic in `file`.
    pub fn has_errors_in(&self, file: FileId) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.file == file && d.is_error())
    }
}

fn span_lines(span: &Span) -> (usize, usize) {
    (
        span.end.line - span.start.line,
        span.end.column.saturating_sub(span.start.column),
    )
}

/// The external semantic analyzer.
///
/// `analyze` is the only entry point; a pass reads the input sources and
/// reports declarations, resolved references, and diagnostics. An `Err`
/// here means the analyzer itself failed — diagnostics in the output are
/// the expected way to report problems in the analyzed code.
pub trait Analyzer: Send + Sync {
    fn analyze(&self, input: &AnalysisInput) -> Result<AnalysisOutput>;
}

/// Resolves the extra inputs a file needs to compile on its own.
///
/// Opaque to the core beyond "a set of files to hand the analyzer";
/// classpath scanning and build-system integration live behind this.
pub trait ClasspathProvider: Send + Sync {
    fn dependency_closure(&self, file: FileId) -> Vec<FileId>;
}

/// A fixed dependency map, for embedders with precomputed closures and
/// for tests.
#[derive(Debug, Default)]
pub struct FixedClasspath {
    deps: rustc_hash::FxHashMap<FileId, Vec<FileId>>,
}

impl FixedClasspath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, file: FileId, deps: Vec<FileId>) {
        self.deps.insert(file, deps);
    }
}

impl ClasspathProvider for FixedClasspath {
    fn dependency_closure(&self, file: FileId) -> Vec<FileId> {
        self.deps.get(&file).cloned().unwrap_or_default()
    }
}
