//! Error types for the analysis core.
//!
//! Analyzer diagnostics are NOT errors — they travel in
//! [`AnalysisOutput`](crate::analyzer::AnalysisOutput) as data. An `Error`
//! here is fatal to the single request that hit it and must never poison
//! caches shared with other requests.

use thiserror::Error;

use crate::base::{ContentVersion, FileId};
use crate::ptr::IdentityError;

/// Errors that can occur while serving one request.
#[derive(Debug, Error)]
pub enum Error {
    /// The request named a file the store does not know.
    #[error("file not found: {0}")]
    FileNotFound(String),

    /// A pointer was demanded for a declaration with no stable identity.
    /// During indexing such declarations are skipped instead.
    #[error(transparent)]
    Identity(#[from] IdentityError),

    /// The analyzer itself failed (crash, not diagnostics).
    #[error("analyzer failure: {0}")]
    Analyzer(String),

    /// A build keyed to a content version that has since been replaced.
    /// Recoverable: the caller rebuilds against the current version.
    #[error("stale build for {file:?}: built against {built:?}, current is {current:?}")]
    StaleVersion {
        file: FileId,
        built: ContentVersion,
        current: ContentVersion,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
