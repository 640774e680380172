//! Tiered compilation orchestrator.
//!
//! Every request is served at the cheapest sufficient analysis
//! granularity:
//!
//! - **Diagnostics tier** — full explicit file set, no pruning, lints on.
//!   Used for error/warning display after an edit or save.
//! - **Whole-file tier** — one file plus its dependency closure, no
//!   pruning of the subject file. Used for go-to-definition and
//!   reference-target confirmation, where the whole file must resolve.
//! - **Focused tier** — one file pruned around the cursor. Used for
//!   completion, where only resolution at one position matters and
//!   latency matters most.
//!
//! The orchestrator composes the candidate filter, the pruner and the
//! reference index on top of those tiers; the analyzer and classpath
//! resolution stay behind their traits. All caches are owned here and
//! passed by reference — nothing in this crate is an ambient singleton.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::{Mutex, RwLock};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, info};

use crate::analyzer::{
    AnalysisInput, AnalysisOutput, Analyzer, ClasspathProvider, Declaration, Diagnostic,
};
use crate::base::{ContentVersion, FileId, Position, Span};
use crate::error::{Error, Result};
use crate::files::FileStore;
use crate::index::{IndexStore, Signature, build_index};
use crate::prefilter::{CandidateFilter, CandidateSet, declares_method, declares_type};
use crate::prune::{erase_method_bodies, erase_unrelated_bodies, prune_around_cursor};
use crate::ptr::{DeclPtr, MemberKey};
use crate::syntax::CursorContext;

/// Analysis granularity of one batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Diagnostics,
    WholeFile,
    Focused,
}

/// Orchestrator tuning knobs.
#[derive(Debug, Clone, Copy)]
pub struct CompileConfig {
    /// Candidate sets larger than this are truncated and reported as
    /// approximate instead of analyzed exhaustively.
    pub max_candidates: usize,
    /// Erase method bodies in dependency files before analysis. Only the
    /// subject file's bodies can affect resolution within it, so this is
    /// safe for the whole-file and focused tiers and cuts analysis cost
    /// on large closures.
    pub erase_bodies_in_deps: bool,
}

impl Default for CompileConfig {
    fn default() -> Self {
        Self {
            max_candidates: 1_000,
            erase_bodies_in_deps: true,
        }
    }
}

/// A reference count that may be approximate.
///
/// `AtLeast` is reported when the candidate set saturated the configured
/// limit — "too many to count precisely" instead of unbounded work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefCount {
    Exact(usize),
    AtLeast(usize),
}

/// Locations of confirmed references, with a saturation marker.
#[derive(Debug, Clone, Default)]
pub struct ReferenceResult {
    pub locations: Vec<(FileId, Span)>,
    pub saturated: bool,
}

/// The incremental-analysis service.
///
/// Owns the file store, the candidate filter, and the index cache; talks
/// to the analyzer and classpath resolver through their traits. One
/// logical request thread drives each call to completion; the only
/// concurrent writers are background rebuilds, which are fenced per file
/// by the [`IndexStore`].
pub struct CompilerService {
    files: RwLock<FileStore>,
    filter: Mutex<CandidateFilter>,
    indexes: IndexStore,
    analyzer: Arc<dyn Analyzer>,
    classpath: Arc<dyn ClasspathProvider>,
    config: CompileConfig,
    live_batches: AtomicUsize,
}

impl CompilerService {
    pub fn new(analyzer: Arc<dyn Analyzer>, classpath: Arc<dyn ClasspathProvider>) -> Self {
        Self::with_config(analyzer, classpath, CompileConfig::default())
    }

    pub fn with_config(
        analyzer: Arc<dyn Analyzer>,
        classpath: Arc<dyn ClasspathProvider>,
        config: CompileConfig,
    ) -> Self {
        Self {
            files: RwLock::new(FileStore::new()),
            filter: Mutex::new(CandidateFilter::new()),
            indexes: IndexStore::new(),
            analyzer,
            classpath,
            config,
            live_batches: AtomicUsize::new(0),
        }
    }

    // ==================== File management ====================

    /// Set the open text of a file, interning its path on first sight.
    pub fn open(&self, path: &str, text: impl Into<Arc<str>>) -> FileId {
        self.files.write().set_text(path, text)
    }

    pub fn close(&self, path: &str) {
        self.files.write().remove(path);
    }

    pub fn file_id(&self, path: &str) -> Option<FileId> {
        self.files.read().file_id(path)
    }

    /// Batches currently alive (diagnostic aid; must be 0 between
    /// requests).
    pub fn live_batches(&self) -> usize {
        self.live_batches.load(Ordering::Relaxed)
    }

    // ==================== Tiers ====================

    /// Diagnostics tier: analyze `files` with lints, no pruning.
    ///
    /// Diagnostics are data, returned verbatim — an `Err` here means the
    /// request itself failed, not that the analyzed code has errors.
    pub fn report_errors(&self, files: &[FileId]) -> Result<Vec<Diagnostic>> {
        info!("report errors in {} files...", files.len());
        let sources = self.sources(files)?;
        let output = self
            .analyzer
            .analyze(&AnalysisInput::new(sources).with_lint())?;
        info!("...found {} diagnostics", output.diagnostics.len());
        Ok(output.diagnostics)
    }

    /// Whole-file tier: `file` plus its dependency closure, unpruned.
    pub fn compile_file(&self, file: FileId) -> Result<CompileBatch<'_>> {
        let mut deps = self.classpath.dependency_closure(file);
        deps.retain(|&dep| dep != file);
        let mut sources = self.sources(&[file])?;
        sources.extend(self.dep_sources(&deps)?);
        let output = self.analyzer.analyze(&AnalysisInput::new(sources))?;
        Ok(self.batch(Tier::WholeFile, output, None))
    }

    /// Focused tier: `file` pruned around `position`, for completion.
    ///
    /// The returned batch carries the lexical [`CursorContext`] so the
    /// caller can dispatch on the completion variant once.
    pub fn compile_focus(&self, file: FileId, position: Position) -> Result<CompileBatch<'_>> {
        let (text, context) = {
            let mut files = self.files.write();
            let Some(text) = files.text(file) else {
                return Err(Self::not_found(&files, file));
            };
            let Some(tokens) = files.tokens(file) else {
                return Err(Self::not_found(&files, file));
            };
            let Some(index) = files.line_index(file) else {
                return Err(Self::not_found(&files, file));
            };
            let context = index
                .offset(position)
                .map(|offset| CursorContext::at(&tokens, offset))
                .unwrap_or(CursorContext::Other);
            (text, context)
        };
        let pruned: Arc<str> = Arc::from(prune_around_cursor(&text, position));
        debug!(?file, ?context, "focused compile");

        let mut deps = self.classpath.dependency_closure(file);
        deps.retain(|&dep| dep != file);
        let mut sources = vec![(file, pruned)];
        sources.extend(self.dep_sources(&deps)?);
        let output = self.analyzer.analyze(&AnalysisInput::new(sources))?;
        Ok(self.batch(Tier::Focused, output, Some(context)))
    }

    // ==================== Queries ====================

    /// Files that might reference `ptr`. Superset, possibly saturated.
    pub fn potential_references(&self, ptr: &DeclPtr) -> CandidateSet {
        let files = self.files.read();
        self.filter
            .lock()
            .candidate_files(&files, ptr, self.config.max_candidates)
    }

    /// Files that might define `ptr`.
    ///
    /// Candidates from the filter, then a token-level declaration probe —
    /// lexing is much cheaper than analysis, so disqualifying files that
    /// merely mention the name pays for itself.
    pub fn potential_definitions(&self, ptr: &DeclPtr) -> CandidateSet {
        let mut candidates = self.potential_references(ptr);
        let name = ptr.simple_name();
        let mut files = self.files.write();
        candidates.files.retain(|&file| {
            let (Some(text), Some(tokens)) = (files.text(file), files.tokens(file)) else {
                return false;
            };
            match ptr.member {
                MemberKey::Type => declares_type(&text, &tokens, &name),
                MemberKey::Field(_) => true,
                MemberKey::Method { .. } => declares_method(&text, &tokens, &name),
            }
        });
        info!(
            "...{} files might declare `{}`",
            candidates.files.len(),
            name
        );
        candidates
    }

    /// Count references to `ptr`, declared in `declaring_file`, across
    /// the workspace.
    ///
    /// Each candidate's cached index is reused when its content version
    /// matches and the declaring file's signature is unchanged since the
    /// index was built; otherwise the candidate is reanalyzed with
    /// unrelated method bodies erased.
    pub fn count_references(&self, declaring_file: FileId, ptr: &DeclPtr) -> Result<RefCount> {
        let declaring_sig = {
            let batch = self.compile_file(declaring_file)?;
            Signature::of_output(batch.output(), declaring_file)
        };
        let mut current_deps = FxHashMap::default();
        current_deps.insert(declaring_file, declaring_sig);

        let candidates = self.potential_references(ptr);
        let mut total = 0usize;
        let mut approximate = candidates.saturated;
        for &file in &candidates.files {
            match self.count_in_file(file, declaring_file, ptr, &current_deps)? {
                Some(count) => total += count,
                None => approximate = true,
            }
        }
        info!("counted {} references to `{}`", total, ptr);
        Ok(if approximate {
            RefCount::AtLeast(total)
        } else {
            RefCount::Exact(total)
        })
    }

    /// Locations of references to the symbol at `position` in `file`.
    ///
    /// Returns an empty result when nothing under the cursor resolves to
    /// a declaration with a stable identity.
    pub fn find_references(&self, file: FileId, position: Position) -> Result<ReferenceResult> {
        let (ptr, declaring_file) = {
            let batch = self.compile_file(file)?;
            let Some(ptr) = batch.target_at(file, position) else {
                return Ok(ReferenceResult::default());
            };
            let declaring = batch
                .output()
                .declaration_site(&ptr)
                .map(|d| d.file)
                .unwrap_or(file);
            (ptr, declaring)
        };

        let candidates = self.potential_references(&ptr);
        let mut result = ReferenceResult {
            saturated: candidates.saturated,
            ..Default::default()
        };
        for &candidate in &candidates.files {
            let output = self.analyze_pruned(candidate, declaring_file, &ptr)?;
            for reference in output.references.iter().filter(|r| r.file == candidate) {
                if DeclPtr::from_decl(&reference.target).ok().as_ref() == Some(&ptr) {
                    result.locations.push((candidate, reference.span));
                }
            }
        }
        info!(
            "found {} references to `{}` in {} candidate files",
            result.locations.len(),
            ptr,
            candidates.files.len()
        );
        Ok(result)
    }

    /// The declaring site of the symbol under the cursor, if any.
    pub fn find_definition(
        &self,
        file: FileId,
        position: Position,
    ) -> Result<Option<(FileId, Span)>> {
        let batch = self.compile_file(file)?;
        Ok(batch
            .output()
            .reference_at(file, position)
            .map(|r| (r.target.file, r.target.span)))
    }

    // ==================== Internals ====================

    /// Count references to `ptr` within one candidate file, via the
    /// cached index when it is still valid.
    ///
    /// `Ok(None)` means a concurrent rebuild holds the file and no
    /// previous value exists — the caller degrades to an approximate
    /// total.
    fn count_in_file(
        &self,
        file: FileId,
        declaring_file: FileId,
        ptr: &DeclPtr,
        current_deps: &FxHashMap<FileId, Signature>,
    ) -> Result<Option<usize>> {
        let version = self.version_of(file)?;

        if let Some(cached) = self.indexes.get(file) {
            if cached.version == version && !cached.needs_rebuild(current_deps) {
                debug!(?file, "reference index cache hit");
                return Ok(Some(cached.count(ptr)));
            }
        }

        let Some(_guard) = self.indexes.try_begin_rebuild(file) else {
            // Rebuild in flight elsewhere: use the previous valid value
            // rather than blocking an interactive request.
            return Ok(self.indexes.get(file).map(|cached| cached.count(ptr)));
        };

        let output = self.analyze_pruned(file, declaring_file, ptr)?;
        let targets: FxHashSet<DeclPtr> = std::iter::once(ptr.clone()).collect();
        let index = build_index(&output, file, version, &targets);
        let count = index.count(ptr);

        let current = self.version_of(file)?;
        if !self.indexes.insert(index, current) {
            // An edit landed mid-build; the count still answers this
            // request, the next one rebuilds against the new content.
            debug!(?file, "index discarded, newer content arrived");
        }
        Ok(Some(count))
    }

    /// Analyze `file` with bodies that cannot mention `ptr` erased,
    /// together with the unpruned declaring file.
    fn analyze_pruned(
        &self,
        file: FileId,
        declaring_file: FileId,
        ptr: &DeclPtr,
    ) -> Result<AnalysisOutput> {
        let text = self.text_of(file)?;
        let pruned: Arc<str> = Arc::from(erase_unrelated_bodies(&text, &ptr.simple_name()));
        let mut sources = vec![(file, pruned)];
        if declaring_file != file {
            sources.push((declaring_file, self.text_of(declaring_file)?));
        }
        self.analyzer.analyze(&AnalysisInput::new(sources))
    }

    /// Dependency sources, body-erased when the config allows it.
    fn dep_sources(&self, deps: &[FileId]) -> Result<Vec<(FileId, Arc<str>)>> {
        let mut sources = self.sources(deps)?;
        if self.config.erase_bodies_in_deps {
            for (_, text) in &mut sources {
                *text = Arc::from(erase_method_bodies(text));
            }
        }
        Ok(sources)
    }

    fn sources(&self, files: &[FileId]) -> Result<Vec<(FileId, Arc<str>)>> {
        let store = self.files.read();
        files
            .iter()
            .map(|&file| {
                store
                    .text(file)
                    .map(|text| (file, text))
                    .ok_or_else(|| Self::not_found(&store, file))
            })
            .collect()
    }

    fn text_of(&self, file: FileId) -> Result<Arc<str>> {
        let store = self.files.read();
        store.text(file).ok_or_else(|| Self::not_found(&store, file))
    }

    fn version_of(&self, file: FileId) -> Result<ContentVersion> {
        let store = self.files.read();
        store
            .version(file)
            .ok_or_else(|| Self::not_found(&store, file))
    }

    fn batch(
        &self,
        tier: Tier,
        output: AnalysisOutput,
        context: Option<CursorContext>,
    ) -> CompileBatch<'_> {
        self.live_batches.fetch_add(1, Ordering::Relaxed);
        CompileBatch {
            service: self,
            tier,
            output,
            context,
        }
    }

    /// Built from an already-held store borrow; taking the lock again
    /// here could park behind a queued writer while the caller's guard
    /// is still live.
    fn not_found(store: &FileStore, file: FileId) -> Error {
        let path = store
            .path(file)
            .map(str::to_string)
            .unwrap_or_else(|| format!("{file:?}"));
        Error::FileNotFound(path)
    }
}

/// One analysis run, wrapped as a scoped resource.
///
/// The analyzer may hold caches or handles for the duration of a run;
/// dropping the batch releases them on every exit path — success, early
/// return, or panic unwind.
pub struct CompileBatch<'a> {
    service: &'a CompilerService,
    tier: Tier,
    output: AnalysisOutput,
    context: Option<CursorContext>,
}

impl std::fmt::Debug for CompileBatch<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompileBatch")
            .field("tier", &self.tier)
            .field("output", &self.output)
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

impl CompileBatch<'_> {
    pub fn tier(&self) -> Tier {
        self.tier
    }

    pub fn output(&self) -> &AnalysisOutput {
        &self.output
    }

    /// Completion context, present on focused batches only.
    pub fn cursor_context(&self) -> Option<CursorContext> {
        self.context
    }

    /// The pointer for whatever sits under `position`: a resolved
    /// reference's target, or the declaration enclosing the position.
    pub fn target_at(&self, file: FileId, position: Position) -> Option<DeclPtr> {
        let from_ref = self
            .output
            .reference_at(file, position)
            .and_then(|r| DeclPtr::from_decl(&r.target).ok());
        from_ref.or_else(|| {
            self.output
                .declaration_at(file, position)
                .and_then(|d| DeclPtr::from_decl(d).ok())
        })
    }

    /// Declarations the analyzer saw in `file` during this run.
    pub fn declarations_in(&self, file: FileId) -> Vec<&Declaration> {
        self.output.declarations_in(file).collect()
    }
}

impl Drop for CompileBatch<'_> {
    fn drop(&mut self) {
        self.service.live_batches.fetch_sub(1, Ordering::Relaxed);
    }
}
