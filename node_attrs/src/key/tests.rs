//! Unit tests for segment normalisation and dotted path parsing.

use anyhow::{Result, ensure};
use rstest::rstest;

use super::{KeyPath, PathSegment};
use crate::AttributeError;

#[rstest]
#[case::key("eth0", "eth0")]
#[case::numeric_key("0", "0")]
fn canonical_key_of_string_segments(#[case] raw: &str, #[case] expected: &str) {
    assert_eq!(PathSegment::from(raw).canonical_key(), expected);
}

#[test]
fn index_segments_normalise_to_decimal_keys() {
    assert_eq!(PathSegment::from(12_usize).canonical_key(), "12");
}

#[rstest]
#[case::index(PathSegment::Index(4), Some(4))]
#[case::numeric_key(PathSegment::from("4"), Some(4))]
#[case::word(PathSegment::from("four"), None)]
#[case::negative(PathSegment::from("-1"), None)]
fn segments_resolve_to_indexes(#[case] segment: PathSegment, #[case] expected: Option<usize>) {
    assert_eq!(segment.as_index(), expected);
}

#[test]
fn dotted_paths_split_into_keys() -> Result<()> {
    let path = KeyPath::dotted("network.interfaces.eth0")?;
    ensure!(
        path == KeyPath::from(["network", "interfaces", "eth0"]),
        "unexpected path {path}"
    );
    ensure!(KeyPath::dotted("")?.is_root(), "empty input is the root path");
    Ok(())
}

#[rstest]
#[case::double_dot("a..b")]
#[case::leading(".a")]
#[case::trailing("a.")]
fn dotted_paths_reject_empty_segments(#[case] input: &str) {
    let err = KeyPath::dotted(input).err();
    assert!(
        matches!(err, Some(AttributeError::InvalidPath { .. })),
        "expected InvalidPath for {input:?}, got {err:?}"
    );
}

#[test]
fn prefix_comparison_uses_canonical_keys() {
    let list = KeyPath::new([PathSegment::from("list"), PathSegment::Index(0)]);
    let textual = KeyPath::from(["list", "0", "name"]);
    assert!(list.is_prefix_of(&textual));
    assert!(!textual.is_prefix_of(&list));
    assert!(KeyPath::root().is_prefix_of(&list));
}

#[test]
fn display_joins_segments_with_dots() {
    let path = KeyPath::from(["a", "b"]).child(3_usize);
    assert_eq!(path.to_string(), "a.b.3");
    assert_eq!(KeyPath::root().to_string(), "<root>");
}

#[test]
fn split_last_separates_parent_and_leaf() {
    let path = KeyPath::from(["a", "b", "c"]);
    let (parent, last) = path.split_last().expect("non-root path splits");
    assert_eq!(parent, KeyPath::from(["a", "b"]));
    assert_eq!(last, &PathSegment::from("c"));
    assert_eq!(path.parent(), Some(KeyPath::from(["a", "b"])));
    assert!(KeyPath::root().split_last().is_none());
}
