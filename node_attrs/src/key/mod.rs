//! Key normalisation and key paths.
//!
//! Every key used to address an attribute is normalised to a
//! [`PathSegment`] before it is compared or stored. Map keys are always
//! strings: an index segment applied to a map uses its decimal form, and a
//! string segment applied to a sequence is accepted when it parses as an
//! index. A [`KeyPath`] is the ordered list of segments from a layer root to
//! a nested value.

use std::borrow::Cow;
use std::fmt;

use crate::{AttrResult, AttributeError};

/// One step of a [`KeyPath`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// A textual map key.
    Key(String),
    /// A sequence position.
    Index(usize),
}

impl PathSegment {
    /// Returns the canonical map key for this segment.
    ///
    /// ```
    /// use node_attrs::PathSegment;
    /// assert_eq!(PathSegment::from(3_usize).canonical_key(), "3");
    /// assert_eq!(PathSegment::from("net").canonical_key(), "net");
    /// ```
    #[must_use]
    pub fn canonical_key(&self) -> Cow<'_, str> {
        match self {
            Self::Key(key) => Cow::Borrowed(key),
            Self::Index(index) => Cow::Owned(index.to_string()),
        }
    }

    /// Returns the sequence index addressed by this segment, if any.
    #[must_use]
    pub fn as_index(&self) -> Option<usize> {
        match self {
            Self::Index(index) => Some(*index),
            Self::Key(key) => key.parse().ok(),
        }
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(key) => f.write_str(key),
            Self::Index(index) => write!(f, "{index}"),
        }
    }
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        Self::Key(key.to_owned())
    }
}

impl From<String> for PathSegment {
    fn from(key: String) -> Self {
        Self::Key(key)
    }
}

impl From<&String> for PathSegment {
    fn from(key: &String) -> Self {
        Self::Key(key.clone())
    }
}

impl From<Cow<'_, str>> for PathSegment {
    fn from(key: Cow<'_, str>) -> Self {
        Self::Key(key.into_owned())
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

impl From<&PathSegment> for PathSegment {
    fn from(segment: &PathSegment) -> Self {
        segment.clone()
    }
}

/// Ordered list of segments from a layer root to a nested value.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct KeyPath(Vec<PathSegment>);

impl KeyPath {
    /// The empty path addressing a layer root.
    #[must_use]
    pub const fn root() -> Self {
        Self(Vec::new())
    }

    /// Build a path from any sequence of segment-like values.
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<PathSegment>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    /// Parse dotted attribute syntax such as `network.interfaces.eth0`.
    ///
    /// The empty string is the root path. Every segment becomes a string key;
    /// numeric segments still address sequences because string keys that
    /// parse as integers are accepted as indexes.
    ///
    /// # Errors
    ///
    /// Returns [`AttributeError::InvalidPath`] when a segment is empty.
    ///
    /// ```
    /// use node_attrs::KeyPath;
    /// let path = KeyPath::dotted("network.interfaces.eth0")?;
    /// assert_eq!(path.len(), 3);
    /// assert!(KeyPath::dotted("network..eth0").is_err());
    /// # Ok::<_, node_attrs::AttributeError>(())
    /// ```
    pub fn dotted(input: &str) -> AttrResult<Self> {
        if input.is_empty() {
            return Ok(Self::root());
        }
        let mut segments = Vec::new();
        for part in input.split('.') {
            if part.is_empty() {
                return Err(AttributeError::InvalidPath {
                    input: input.to_owned(),
                    reason: "empty segment",
                });
            }
            segments.push(PathSegment::from(part));
        }
        Ok(Self(segments))
    }

    /// Returns a new path extended by `segment`.
    #[must_use]
    pub fn child(&self, segment: impl Into<PathSegment>) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment.into());
        Self(segments)
    }

    /// Append `segment` in place.
    pub fn push(&mut self, segment: impl Into<PathSegment>) {
        self.0.push(segment.into());
    }

    /// Returns the path without its last segment, or `None` at the root.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        self.0
            .split_last()
            .map(|(_, parent)| Self(parent.to_vec()))
    }

    /// Returns the final segment, or `None` at the root.
    #[must_use]
    pub fn last(&self) -> Option<&PathSegment> {
        self.0.last()
    }

    /// Splits the path into its parent path and final segment.
    #[must_use]
    pub fn split_last(&self) -> Option<(Self, &PathSegment)> {
        self.0
            .split_last()
            .map(|(last, parent)| (Self(parent.to_vec()), last))
    }

    /// The segments of this path.
    #[must_use]
    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    /// Number of segments.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` for the root path.
    #[must_use]
    pub const fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns `true` when `self` is `other` or one of its ancestors.
    ///
    /// Segments compare by canonical key, so `0` and `"0"` are the same step.
    #[must_use]
    pub fn is_prefix_of(&self, other: &Self) -> bool {
        self.len() <= other.len()
            && self
                .0
                .iter()
                .zip(&other.0)
                .all(|(a, b)| a.canonical_key() == b.canonical_key())
    }

    /// Iterate over the segments.
    pub fn iter(&self) -> std::slice::Iter<'_, PathSegment> {
        self.0.iter()
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("<root>");
        }
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

impl<S: Into<PathSegment>, const N: usize> From<[S; N]> for KeyPath {
    fn from(segments: [S; N]) -> Self {
        Self::new(segments)
    }
}

impl<S: Into<PathSegment>> From<Vec<S>> for KeyPath {
    fn from(segments: Vec<S>) -> Self {
        Self::new(segments)
    }
}

impl From<&KeyPath> for KeyPath {
    fn from(path: &KeyPath) -> Self {
        path.clone()
    }
}

impl From<PathSegment> for KeyPath {
    fn from(segment: PathSegment) -> Self {
        Self(vec![segment])
    }
}

impl<'a> IntoIterator for &'a KeyPath {
    type Item = &'a PathSegment;
    type IntoIter = std::slice::Iter<'a, PathSegment>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl<S: Into<PathSegment>> FromIterator<S> for KeyPath {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter)
    }
}

#[cfg(test)]
mod tests;
