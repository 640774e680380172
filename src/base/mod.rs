//! Foundation types for the javelin core.
//!
//! This module provides fundamental types used throughout the crate:
//! - [`FileId`] - Interned file identifiers
//! - [`ContentVersion`] - Monotonic per-file content counter
//! - [`Position`], [`Span`] - Line/column positions
//!
//! This module has NO dependencies on other javelin modules.

mod file_id;
mod position;

pub use file_id::{ContentVersion, FileId};
pub use position::{Position, Span};

// Re-export text-size types for convenience
pub use text_size::{TextRange, TextSize};
