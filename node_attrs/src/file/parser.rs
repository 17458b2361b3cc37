//! Format-specific parsing for stored documents.

use std::path::Path;

use serde::de::DeserializeOwned;

use crate::result_ext::FileResultExt;
use crate::AttrResult;

/// Parse `data` according to the extension of `path`.
///
/// Unknown extensions are parsed as JSON.
///
/// # Errors
///
/// Returns [`crate::AttributeError::File`] if the contents fail to parse or the
/// format's feature is disabled.
pub(super) fn parse_by_format<T: DeserializeOwned>(path: &Path, data: &str) -> AttrResult<T> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("toml") => parse_toml(path, data),
        Some("yaml" | "yml") => parse_yaml(path, data),
        _ => serde_json::from_str(data).in_file(path),
    }
}

#[cfg(feature = "toml")]
fn parse_toml<T: DeserializeOwned>(path: &Path, data: &str) -> AttrResult<T> {
    toml::from_str(data).in_file(path)
}

#[cfg(not(feature = "toml"))]
fn parse_toml<T>(path: &Path, _data: &str) -> AttrResult<T> {
    Err(disabled(path, "toml"))
}

#[cfg(feature = "yaml")]
fn parse_yaml<T: DeserializeOwned>(path: &Path, data: &str) -> AttrResult<T> {
    use serde_saphyr::Options;

    serde_saphyr::from_str_with_options(
        data,
        Options {
            strict_booleans: true,
            ..Options::default()
        },
    )
    .in_file(path)
}

#[cfg(not(feature = "yaml"))]
fn parse_yaml<T>(path: &Path, _data: &str) -> AttrResult<T> {
    Err(disabled(path, "yaml"))
}

#[cfg(any(not(feature = "toml"), not(feature = "yaml")))]
fn disabled(path: &Path, feature: &str) -> crate::AttributeError {
    crate::AttributeError::file(
        path,
        std::io::Error::other(format!(
            "{feature} feature disabled: enable the '{feature}' feature to support this file format"
        )),
    )
}
