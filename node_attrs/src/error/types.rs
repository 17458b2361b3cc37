//! Primary error enum for attribute reads, writes and document loading.

use thiserror::Error;

use crate::key::KeyPath;
use crate::value::ValueKind;

/// Errors that can occur while reading or writing node attributes.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AttributeError {
    /// A mutating call was made against an immutable (merged) view.
    #[error("cannot {operation} '{path}': merged attributes are read-only; write to a precedence layer instead")]
    ImmutableModification {
        /// Path of the view the write was attempted through.
        path: KeyPath,
        /// Name of the rejected operation.
        operation: &'static str,
    },

    /// The value at `path` does not have the shape the operation requires.
    #[error("type mismatch at '{path}': expected {expected}, found {found}")]
    TypeMismatch {
        /// Path of the offending value.
        path: KeyPath,
        /// Shape the operation needed.
        expected: ValueKind,
        /// Shape that was actually stored.
        found: ValueKind,
    },

    /// A precedence layer name outside the fixed ordered set.
    #[error("unknown precedence layer '{name}'")]
    UnknownPrecedenceLayer {
        /// Name that failed to resolve.
        name: String,
    },

    /// A sequence index beyond the end of the sequence.
    #[error("index {index} out of range at '{path}' (length {len})")]
    OutOfRange {
        /// Path of the sequence.
        path: KeyPath,
        /// Requested index.
        index: usize,
        /// Length of the sequence.
        len: usize,
    },

    /// Strict lookup of an attribute that is not present.
    #[error("no such attribute '{path}'")]
    NoSuchAttribute {
        /// Path that was looked up.
        path: KeyPath,
    },

    /// A textual key path could not be parsed.
    #[error("invalid attribute path '{input}': {reason}")]
    InvalidPath {
        /// Raw path text.
        input: String,
        /// Why the text was rejected.
        reason: &'static str,
    },

    /// A run list entry that is neither `recipe[...]`, `role[...]` nor a bare
    /// recipe name.
    #[error("invalid run list item '{item}'")]
    InvalidRunListItem {
        /// Entry as written.
        item: String,
    },

    /// Both `run_list` and `recipes` were supplied in the same document.
    #[error("set the run list using the 'run_list' attribute only, not both 'run_list' and 'recipes'")]
    AmbiguousRunList,

    /// A node or attribute file could not be read or decoded.
    #[error("cannot load '{path}': {source}")]
    File {
        /// Path that triggered the failure.
        path: std::path::PathBuf,
        /// Underlying error reported by the loader.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// JSON encoding or decoding failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
