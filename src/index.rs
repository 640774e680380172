//! Per-file reference index with signature-based invalidation.
//!
//! One analysis pass over a file yields a [`FileIndex`]: the ordered
//! pointer observations in that file, plus the [`Signature`] of every
//! file the pass was run against. A cached index stays valid until any
//! of those signatures changes — any declaration added, removed, or
//! re-kinded in a dependency invalidates every consumer that was built
//! against it. Coarse on purpose: the candidate filter has already
//! bounded the blast radius to files that textually could reference the
//! change, and within that set a rebuild is cheap.
//!
//! Indexes are replaced wholesale on rebuild, never patched in place.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use parking_lot::RwLock;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, warn};

use crate::analyzer::AnalysisOutput;
use crate::base::{ContentVersion, FileId};
use crate::ptr::DeclPtr;

/// Was an observation the declaration itself or a use of it?
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefKind {
    Declaration,
    Reference,
}

/// The set of pointers for all declarations physically present in one
/// file, as of one analysis pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Signature {
    ptrs: FxHashSet<DeclPtr>,
}

impl Signature {
    /// Signature of `file` as observed by `output`. Declarations with no
    /// stable identity are skipped with a log line.
    pub fn of_output(output: &AnalysisOutput, file: FileId) -> Signature {
        let mut ptrs = FxHashSet::default();
        for decl in output.declarations_in(file) {
            match DeclPtr::from_decl(decl) {
                Ok(ptr) => {
                    ptrs.insert(ptr);
                }
                Err(err) => warn!(%err, "skipping declaration with ambiguous identity"),
            }
        }
        Signature { ptrs }
    }

    pub fn contains(&self, ptr: &DeclPtr) -> bool {
        self.ptrs.contains(ptr)
    }

    pub fn len(&self) -> usize {
        self.ptrs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ptrs.is_empty()
    }

    /// Any difference counts: additions, removals, and kind changes all
    /// produce pointer-set inequality.
    pub fn changed_since(&self, older: &Signature) -> bool {
        self.ptrs != older.ptrs
    }
}

impl FromIterator<DeclPtr> for Signature {
    fn from_iter<I: IntoIterator<Item = DeclPtr>>(iter: I) -> Self {
        Signature {
            ptrs: iter.into_iter().collect(),
        }
    }
}

/// Reference observations from one analysis pass over one file.
#[derive(Debug, Clone)]
pub struct FileIndex {
    pub file: FileId,
    /// Pointer observations in the order the pass reported them.
    pub refs: Vec<(DeclPtr, RefKind)>,
    /// The pass reported at least one error diagnostic in this file;
    /// counts from a broken file are unreliable and force a rebuild.
    pub has_errors: bool,
    /// Signatures of every other file in the pass, keyed by file.
    pub built_against: FxHashMap<FileId, Signature>,
    /// Content version of `file` the index was built from.
    pub version: ContentVersion,
    pub created: Instant,
}

impl FileIndex {
    /// Number of *references* to `ptr` (declarations don't count).
    pub fn count(&self, ptr: &DeclPtr) -> usize {
        self.refs
            .iter()
            .filter(|(p, kind)| *kind == RefKind::Reference && p == ptr)
            .count()
    }

    /// Total reference observations in the file.
    pub fn total(&self) -> usize {
        self.refs
            .iter()
            .filter(|(_, kind)| *kind == RefKind::Reference)
            .count()
    }

    /// Does this index need rebuilding against current dependency
    /// signatures?
    ///
    /// True if the pass saw errors, or if any dependency's signature
    /// differs from (or was missing in) what the index was built against.
    pub fn needs_rebuild(&self, current: &FxHashMap<FileId, Signature>) -> bool {
        if self.has_errors {
            return true;
        }
        current.iter().any(|(file, signature)| {
            match self.built_against.get(file) {
                Some(recorded) => signature.changed_since(recorded),
                None => true,
            }
        })
    }
}

/// Fold one analysis pass into a [`FileIndex`] for `file`.
///
/// Records a reference observation for every resolved reference in `file`
/// whose target pointer is in `targets`, and a declaration observation
/// for every target declared in `file`. Dependency signatures are taken
/// from every other file in the same pass.
pub fn build_index(
    output: &AnalysisOutput,
    file: FileId,
    version: ContentVersion,
    targets: &FxHashSet<DeclPtr>,
) -> FileIndex {
    let mut refs: Vec<(DeclPtr, RefKind)> = Vec::new();

    for decl in output.declarations_in(file) {
        match DeclPtr::from_decl(decl) {
            Ok(ptr) => {
                if targets.contains(&ptr) {
                    refs.push((ptr, RefKind::Declaration));
                }
            }
            Err(err) => warn!(%err, "skipping declaration with ambiguous identity"),
        }
    }

    for reference in output.references.iter().filter(|r| r.file == file) {
        match DeclPtr::from_decl(&reference.target) {
            Ok(ptr) => {
                if targets.contains(&ptr) {
                    refs.push((ptr, RefKind::Reference));
                }
            }
            Err(err) => warn!(%err, "skipping reference with ambiguous target identity"),
        }
    }

    let mut built_against = FxHashMap::default();
    let dep_files: FxHashSet<FileId> = output
        .declarations
        .iter()
        .map(|d| d.file)
        .filter(|&f| f != file)
        .collect();
    for dep in dep_files {
        built_against.insert(dep, Signature::of_output(output, dep));
    }

    let has_errors = output.has_errors_in(file);
    debug!(
        ?file,
        observations = refs.len(),
        has_errors,
        "built reference index"
    );

    FileIndex {
        file,
        refs,
        has_errors,
        built_against,
        version,
        created: Instant::now(),
    }
}

#[derive(Default)]
struct Slot {
    current: RwLock<Option<Arc<FileIndex>>>,
    /// Set while one rebuild of this file's index is in flight.
    rebuilding: AtomicBool,
}

/// Process-lifetime cache of one [`FileIndex`] per file.
///
/// Each entry is guarded individually: a background rebuild claims the
/// entry's rebuild flag, and a concurrent reader that finds the flag set
/// simply uses the previous valid value instead of blocking. A store
/// keyed to a content version that is no longer current is discarded,
/// not merged — editor edits are observed strictly in version order.
#[derive(Default)]
pub struct IndexStore {
    slots: RwLock<FxHashMap<FileId, Arc<Slot>>>,
}

impl IndexStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached index for `file`, if any.
    pub fn get(&self, file: FileId) -> Option<Arc<FileIndex>> {
        let slots = self.slots.read();
        let slot = slots.get(&file)?;
        slot.current.read().clone()
    }

    /// Store a freshly built index, unless it is already stale.
    ///
    /// `current_version` is the file's version at store time; an index
    /// built against an older version is dropped.
    pub fn insert(&self, index: FileIndex, current_version: ContentVersion) -> bool {
        if index.version != current_version {
            debug!(
                file = ?index.file,
                built = ?index.version,
                current = ?current_version,
                "discarding stale index"
            );
            return false;
        }
        let slot = self.slot(index.file);
        *slot.current.write() = Some(Arc::new(index));
        true
    }

    /// Exclusive rebuild permission for `file`.
    ///
    /// Returns `None` when another rebuild of the same file is underway;
    /// the caller should fall back to the previous valid value.
    pub fn try_begin_rebuild(&self, file: FileId) -> Option<RebuildGuard> {
        let slot = self.slot(file);
        if slot
            .rebuilding
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            return None;
        }
        Some(RebuildGuard { slot })
    }

    /// Drop every cached index (e.g. after a workspace-level change).
    pub fn clear(&self) {
        self.slots.write().clear();
    }

    fn slot(&self, file: FileId) -> Arc<Slot> {
        let mut slots = self.slots.write();
        Arc::clone(slots.entry(file).or_default())
    }
}

/// Held while a rebuild of one file's index is in flight; releases the
/// entry on every exit path.
pub struct RebuildGuard {
    slot: Arc<Slot>,
}

impl Drop for RebuildGuard {
    fn drop(&mut self) {
        self.slot.rebuilding.store(false, Ordering::Release);
    }
}
