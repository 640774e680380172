//! In-memory file store with content versioning and a shared token cache.
//!
//! The store owns the open text of every file the core knows about. There
//! is no persistence and no filesystem watching here — the embedder feeds
//! edits in, and each edit bumps the file's [`ContentVersion`]. Every
//! cache in the crate keys on that version, so stale entries fall out on
//! their own.
//!
//! The token cache is the shared "file-manager" resource reused across
//! tiers: re-lexing an unchanged dependency on every request would dwarf
//! the cost of the requests themselves.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::base::{ContentVersion, FileId};
use crate::syntax::{LineIndex, Token, tokenize};

#[derive(Debug)]
struct FileEntry {
    path: String,
    text: Arc<str>,
    version: ContentVersion,
}

/// Owns all source text, keyed by interned [`FileId`].
#[derive(Debug, Default)]
pub struct FileStore {
    entries: Vec<Option<FileEntry>>,
    by_path: FxHashMap<String, FileId>,
    /// Tokens for the version they were lexed from; evicted on access
    /// when the version no longer matches.
    tokens: FxHashMap<FileId, (ContentVersion, Arc<Vec<Token>>)>,
}

impl FileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the content of a file, interning its path on first sight.
    ///
    /// Bumps the file's content version; every cache keyed on the old
    /// version misses from here on.
    pub fn set_text(&mut self, path: &str, text: impl Into<Arc<str>>) -> FileId {
        match self.by_path.get(path) {
            Some(&id) => {
                let entry = self.entries[id.raw() as usize]
                    .as_mut()
                    .unwrap_or_else(|| unreachable!("interned path has live entry"));
                entry.text = text.into();
                entry.version = entry.version.next();
                debug!(file = ?id, version = ?entry.version, "file content replaced");
                id
            }
            None => {
                let id = FileId::new(self.entries.len() as u32);
                self.entries.push(Some(FileEntry {
                    path: path.to_string(),
                    text: text.into(),
                    version: ContentVersion::default().next(),
                }));
                self.by_path.insert(path.to_string(), id);
                debug!(file = ?id, path, "file opened");
                id
            }
        }
    }

    /// Remove a file. Its `FileId` is never reused.
    pub fn remove(&mut self, path: &str) {
        if let Some(id) = self.by_path.remove(path) {
            self.entries[id.raw() as usize] = None;
            self.tokens.remove(&id);
        }
    }

    pub fn file_id(&self, path: &str) -> Option<FileId> {
        self.by_path.get(path).copied()
    }

    pub fn path(&self, file: FileId) -> Option<&str> {
        self.entry(file).map(|e| e.path.as_str())
    }

    pub fn text(&self, file: FileId) -> Option<Arc<str>> {
        self.entry(file).map(|e| Arc::clone(&e.text))
    }

    pub fn version(&self, file: FileId) -> Option<ContentVersion> {
        self.entry(file).map(|e| e.version)
    }

    /// All live files.
    pub fn files(&self) -> impl Iterator<Item = FileId> + '_ {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.is_some())
            .map(|(i, _)| FileId::new(i as u32))
    }

    pub fn len(&self) -> usize {
        self.by_path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_path.is_empty()
    }

    /// Tokens for the current content of `file`, memoized per version.
    pub fn tokens(&mut self, file: FileId) -> Option<Arc<Vec<Token>>> {
        let entry = self.entries.get(file.raw() as usize)?.as_ref()?;
        let version = entry.version;
        if let Some((cached_version, tokens)) = self.tokens.get(&file) {
            if *cached_version == version {
                return Some(Arc::clone(tokens));
            }
        }
        let tokens = Arc::new(tokenize(&entry.text));
        self.tokens.insert(file, (version, Arc::clone(&tokens)));
        Some(tokens)
    }

    /// Line index for the current content of `file`. Rebuilt per call;
    /// cheap relative to anything that needs one.
    pub fn line_index(&self, file: FileId) -> Option<LineIndex> {
        self.text(file).map(|text| LineIndex::new(&text))
    }

    fn entry(&self, file: FileId) -> Option<&FileEntry> {
        self.entries.get(file.raw() as usize)?.as_ref()
    }
}
