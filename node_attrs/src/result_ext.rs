//! Extensions for mapping errors into `AttrResult` concisely.
//!
//! - Use [`AttrResultExt::into_attr`] for error types that implement
//!   `Into<AttributeError>` (e.g., `serde_json::Error`).
//! - Use [`FileResultExt::in_file`] to attach the path of the document being
//!   read to a loader or parser failure.
//!
//! # Examples
//!
//! ```
//! use node_attrs::{AttrResult, AttrResultExt};
//!
//! fn encode() -> AttrResult<serde_json::Value> {
//!     serde_json::to_value(42).into_attr()
//! }
//! # assert_eq!(encode().expect("encodes"), serde_json::json!(42));
//! ```

use std::error::Error;
use std::path::Path;

use crate::{AttrResult, AttributeError};

/// Generic extension for mapping any `Result<T, E>` with
/// `E: Into<AttributeError>` into an `AttrResult<T>`.
pub trait AttrResultExt<T, E> {
    /// Convert `Result<T, E>` into `AttrResult<T>` using `Into<AttributeError>`.
    ///
    /// # Errors
    ///
    /// Propagates the original error after conversion.
    fn into_attr(self) -> AttrResult<T>;
}

impl<T, E> AttrResultExt<T, E> for Result<T, E>
where
    E: Into<AttributeError>,
{
    fn into_attr(self) -> AttrResult<T> {
        self.map_err(Into::into)
    }
}

/// Extension for reporting failures against a document path.
pub trait FileResultExt<T> {
    /// Wrap the error in [`AttributeError::File`] for `path`.
    ///
    /// # Errors
    ///
    /// Returns [`AttributeError::File`] when the input is `Err`.
    fn in_file(self, path: &Path) -> AttrResult<T>;
}

impl<T, E> FileResultExt<T> for Result<T, E>
where
    E: Into<Box<dyn Error + Send + Sync>>,
{
    fn in_file(self, path: &Path) -> AttrResult<T> {
        self.map_err(|err| AttributeError::file(path, err))
    }
}
