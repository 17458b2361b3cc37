//! Constructors for frequently raised `AttributeError` variants.

use std::error::Error;

use crate::key::KeyPath;
use crate::value::{Value, ValueKind};

use super::AttributeError;

impl AttributeError {
    /// Construct an [`AttributeError::ImmutableModification`].
    ///
    /// # Examples
    ///
    /// ```
    /// use node_attrs::{AttributeError, KeyPath};
    /// let e = AttributeError::immutable(KeyPath::root().child("a"), "set");
    /// assert!(matches!(e, AttributeError::ImmutableModification { .. }));
    /// ```
    #[must_use]
    pub const fn immutable(path: KeyPath, operation: &'static str) -> Self {
        Self::ImmutableModification { path, operation }
    }

    /// Construct an [`AttributeError::TypeMismatch`] from the offending value.
    #[must_use]
    pub fn mismatch(path: KeyPath, expected: ValueKind, found: &Value) -> Self {
        Self::TypeMismatch {
            path,
            expected,
            found: found.kind(),
        }
    }

    /// Construct an [`AttributeError::NoSuchAttribute`].
    #[must_use]
    pub const fn missing(path: KeyPath) -> Self {
        Self::NoSuchAttribute { path }
    }

    /// Construct an [`AttributeError::OutOfRange`].
    #[must_use]
    pub const fn out_of_range(path: KeyPath, index: usize, len: usize) -> Self {
        Self::OutOfRange { path, index, len }
    }

    /// Construct an [`AttributeError::File`] for a document path.
    #[must_use]
    pub fn file(
        path: &std::path::Path,
        source: impl Into<Box<dyn Error + Send + Sync>>,
    ) -> Self {
        Self::File {
            path: path.to_path_buf(),
            source: source.into(),
        }
    }
}
