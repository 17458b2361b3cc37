//! Loading node documents and attribute files from disk.
//!
//! The parser is chosen by file extension: `.json` is always available,
//! `.toml` needs the `toml` feature and `.yaml`/`.yml` need the `yaml`
//! feature. Missing files are not an error; loaders return `Ok(None)`.

mod parser;

use std::path::Path;

use camino::Utf8PathBuf;
use tracing::debug;

use crate::node::{Node, NodeDocument};
use crate::key::KeyPath;
use crate::result_ext::FileResultExt;
use crate::value::{Value, ValueKind};
use crate::{AttrResult, AttributeError};

use parser::parse_by_format;

/// Attribute data read from one file.
#[derive(Clone, Debug, PartialEq)]
pub struct AttributeFile {
    /// The file's contents; always a map.
    pub value: Value,
    /// Where the data was read from.
    pub source: Utf8PathBuf,
}

/// Convert a path to UTF-8, falling back to lossy conversion.
fn to_utf8_path(path: &Path) -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(path.to_path_buf())
        .unwrap_or_else(|p| Utf8PathBuf::from(p.to_string_lossy().into_owned()))
}

fn read_if_present(path: &Path) -> AttrResult<Option<String>> {
    if !path.is_file() {
        debug!(path = %path.display(), "no file to load");
        return Ok(None);
    }
    std::fs::read_to_string(path).map(Some).in_file(path)
}

/// Load a stored node.
///
/// Returns `Ok(None)` if the file does not exist.
///
/// # Examples
///
/// ```rust,no_run
/// use std::path::Path;
/// use node_attrs::file::load_node_file;
///
/// # fn run() -> node_attrs::AttrResult<()> {
/// if let Some(node) = load_node_file(Path::new("nodes/web01.json"))? {
///     println!("{} is in {}", node.name(), node.chef_environment());
/// }
/// # Ok(())
/// # }
/// ```
///
/// # Errors
///
/// Returns [`AttributeError::File`] if reading or parsing fails, and the
/// errors of [`Node::from_document`] for a malformed document.
pub fn load_node_file(path: &Path) -> AttrResult<Option<Node>> {
    let Some(data) = read_if_present(path)? else {
        return Ok(None);
    };
    let document: NodeDocument = parse_by_format(path, &data)?;
    let node = Node::from_document(document)?;
    debug!(path = %path.display(), node = node.name(), "loaded node file");
    Ok(Some(node))
}

/// Load a file of plain attributes, such as a role's defaults.
///
/// Returns `Ok(None)` if the file does not exist. An empty document loads as
/// an empty map.
///
/// # Errors
///
/// Returns [`AttributeError::File`] if reading or parsing fails or the
/// document is not a map.
pub fn load_attribute_file(path: &Path) -> AttrResult<Option<AttributeFile>> {
    let Some(data) = read_if_present(path)? else {
        return Ok(None);
    };
    let value = match parse_by_format::<Value>(path, &data)? {
        Value::Null => Value::empty_map(),
        map @ Value::Map(_) => map,
        other => {
            return Err(AttributeError::file(
                path,
                AttributeError::mismatch(KeyPath::root(), ValueKind::Map, &other),
            ));
        }
    };
    debug!(path = %path.display(), keys = value.len(), "loaded attribute file");
    Ok(Some(AttributeFile {
        value,
        source: to_utf8_path(path),
    }))
}
