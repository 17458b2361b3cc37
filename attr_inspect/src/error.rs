//! Error types for `attr-inspect`.

use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors surfaced by `attr-inspect` commands.
#[derive(Debug, Error)]
pub enum InspectError {
    /// The attribute engine rejected a load, read or write.
    #[error(transparent)]
    Attributes(#[from] node_attrs::AttributeError),

    /// Settings could not be merged from file, environment and flags.
    #[error("failed to load settings: {0}")]
    Settings(#[from] Box<figment::Error>),

    /// The node document does not exist.
    #[error("node file not found: {0}")]
    NodeNotFound(Utf8PathBuf),

    /// `--path` or `<PATH>` names nothing in the merged attributes.
    #[error("no attribute at '{0}'")]
    NoValue(String),

    /// Writing output failed.
    #[error("failed to write output: {0}")]
    Output(#[from] std::io::Error),

    /// Encoding output failed.
    #[error("failed to encode output: {0}")]
    Encode(#[from] serde_json::Error),
}

impl From<figment::Error> for InspectError {
    fn from(err: figment::Error) -> Self {
        Self::Settings(Box::new(err))
    }
}

/// Result alias for `attr-inspect` operations.
pub type Result<T> = std::result::Result<T, InspectError>;
