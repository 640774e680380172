//! # javelin
//!
//! Incremental-analysis core for Java language tooling: stable
//! declaration identity, candidate prefiltering, source pruning, cached
//! per-file reference indexes, and a tiered compile orchestrator.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! compile   → Tiered orchestrator (diagnostics, whole-file, focused)
//!   ↓
//! index     → Per-file reference index with signature invalidation
//!   ↓
//! prefilter → Textual candidate filter over the file set
//!   ↓
//! prune     → Erasure transforms (cursor focus, body erasure)
//!   ↓
//! files     → FileStore: path interning, content versions, token cache
//!   ↓
//! analyzer  → Analyzer/ClasspathProvider traits, analysis data model
//!   ↓
//! ptr       → DeclPtr: compile-independent declaration identity
//!   ↓
//! syntax    → Logos lexer, line index, cursor context
//!   ↓
//! base      → Primitives (FileId, ContentVersion, Position, Span)
//! ```
//!
//! The crate never parses Java itself: semantic analysis stays behind
//! the [`analyzer::Analyzer`] trait, and everything above it works from
//! token streams and the analyzer's declaration/reference output.

// ============================================================================
// MODULES (dependency order: base → syntax → ptr → analyzer → files →
// prune → prefilter → index → compile)
// ============================================================================

/// Foundation types: FileId, ContentVersion, Position, Span
pub mod base;

/// Lexical layer: Logos token stream, line index, cursor context
pub mod syntax;

/// Stable declaration identity: DeclPtr, MemberKey
pub mod ptr;

/// Analysis seam: Analyzer/ClasspathProvider traits and data model
pub mod analyzer;

/// Error type shared across the crate
pub mod error;

/// File store: path interning, content versions, memoized tokens
pub mod files;

/// Erasure transforms: cursor-focused pruning, unrelated-body erasure
pub mod prune;

/// Candidate prefilter: import and word scans with per-version memos
pub mod prefilter;

/// Reference index: per-file counts with signature invalidation
pub mod index;

/// Orchestrator: tiered compilation, reference counting and lookup
pub mod compile;

// Re-export foundation types
pub use base::{ContentVersion, FileId, Position, Span, TextRange, TextSize};

// Re-export the request surface
pub use analyzer::{
    AnalysisInput, AnalysisOutput, AnalyzeOptions, Analyzer, ClasspathProvider, DeclKind,
    Declaration, Diagnostic, FixedClasspath, Reference, Severity,
};
pub use compile::{
    CompileBatch, CompileConfig, CompilerService, RefCount, ReferenceResult, Tier,
};
pub use error::{Error, Result};
pub use ptr::{DeclPtr, IdentityError, MemberKey};
