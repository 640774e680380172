//! File identity and content versioning.

use std::fmt;

/// Interned identifier for a source file.
///
/// Allocated by the [`FileStore`](crate::files::FileStore); stable for the
/// lifetime of the store, cheap to copy and hash. A `FileId` names a file,
/// not a particular revision of its content — pair it with a
/// [`ContentVersion`] wherever staleness matters.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FileId(u32);

impl FileId {
    pub fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FileId({})", self.0)
    }
}

/// Monotonically increasing content counter for one file.
///
/// Bumped every time the file's text is replaced. Every cache in the crate
/// keys on `(FileId, ContentVersion)` so an edit produces cache misses
/// without any explicit invalidation bookkeeping. Wall-clock time is never
/// used as a staleness signal.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ContentVersion(u64);

impl ContentVersion {
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for ContentVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}
