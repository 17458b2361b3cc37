//! Canonical attribute values.
//!
//! [`Value`] is the single representation every layer stores. Containers are
//! reference counted and shared structurally, so cloning a value is cheap and
//! two layers may point at the same map until one of them writes. Writers go
//! through [`Value::map_mut`] and [`Value::seq_mut`], which duplicate a shared
//! container before handing out mutable access.
//!
//! Inbound data is normalised on construction: JSON documents, Rust scalars,
//! vectors and maps all convert into the same canonical shapes, and
//! non-finite floats collapse to [`Value::Null`].

mod convert;
mod serde_impl;

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::key::{KeyPath, PathSegment};
use crate::{AttrResult, AttributeError};

/// Ordered map of attribute keys to values.
pub type AttrMap = IndexMap<String, Value>;

/// A normalised attribute value.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    /// Explicit null.
    #[default]
    Null,
    /// Boolean scalar.
    Bool(bool),
    /// Numeric scalar.
    Number(serde_json::Number),
    /// String scalar.
    String(String),
    /// Sequence, shared until written.
    Seq(Arc<Vec<Value>>),
    /// Map, shared until written.
    Map(Arc<AttrMap>),
}

/// Shape of a [`Value`], used in type-mismatch diagnostics.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ValueKind {
    /// [`Value::Null`].
    Null,
    /// [`Value::Bool`].
    Bool,
    /// [`Value::Number`].
    Number,
    /// [`Value::String`].
    String,
    /// [`Value::Seq`].
    Seq,
    /// [`Value::Map`].
    Map,
}

impl ValueKind {
    /// Human-readable name of the shape.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool => "boolean",
            Self::Number => "number",
            Self::String => "string",
            Self::Seq => "sequence",
            Self::Map => "map",
        }
    }

    /// Returns `true` for maps and sequences.
    #[must_use]
    pub const fn is_container(self) -> bool {
        matches!(self, Self::Seq | Self::Map)
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Value {
    /// A fresh empty map.
    #[must_use]
    pub fn empty_map() -> Self {
        Self::Map(Arc::new(AttrMap::new()))
    }

    /// A fresh empty sequence.
    #[must_use]
    pub fn empty_seq() -> Self {
        Self::Seq(Arc::new(Vec::new()))
    }

    /// The shape of this value.
    #[must_use]
    pub const fn kind(&self) -> ValueKind {
        match self {
            Self::Null => ValueKind::Null,
            Self::Bool(_) => ValueKind::Bool,
            Self::Number(_) => ValueKind::Number,
            Self::String(_) => ValueKind::String,
            Self::Seq(_) => ValueKind::Seq,
            Self::Map(_) => ValueKind::Map,
        }
    }

    /// Returns `true` for [`Value::Null`].
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns `true` for maps.
    #[must_use]
    pub const fn is_map(&self) -> bool {
        matches!(self, Self::Map(_))
    }

    /// Returns `true` for sequences.
    #[must_use]
    pub const fn is_seq(&self) -> bool {
        matches!(self, Self::Seq(_))
    }

    /// Returns `true` for maps and sequences.
    #[must_use]
    pub const fn is_container(&self) -> bool {
        self.kind().is_container()
    }

    /// Borrow the string payload.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// The boolean payload.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// The numeric payload as a signed integer, if it fits.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    /// The numeric payload as an unsigned integer, if it fits.
    #[must_use]
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::Number(n) => n.as_u64(),
            _ => None,
        }
    }

    /// The numeric payload as a float.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    /// Borrow the map payload.
    #[must_use]
    pub fn as_map(&self) -> Option<&AttrMap> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Borrow the sequence payload.
    #[must_use]
    pub fn as_seq(&self) -> Option<&[Value]> {
        match self {
            Self::Seq(seq) => Some(seq),
            _ => None,
        }
    }

    /// Lenient single-step lookup: `None` for missing keys, out-of-range
    /// indexes and scalars.
    #[must_use]
    pub fn get(&self, segment: &PathSegment) -> Option<&Self> {
        match self {
            Self::Map(map) => map.get(segment.canonical_key().as_ref()),
            Self::Seq(seq) => segment.as_index().and_then(|index| seq.get(index)),
            _ => None,
        }
    }

    /// Lenient lookup of a nested path.
    ///
    /// Walks off the end of the structure quietly, returning `None` instead
    /// of reporting type or range errors.
    #[must_use]
    pub fn pointer(&self, path: &KeyPath) -> Option<&Self> {
        path.iter()
            .try_fold(self, |current, segment| current.get(segment))
    }

    /// Checked single-step lookup used by views.
    ///
    /// A missing map key is `Ok(None)`. Indexing a sequence with a
    /// non-numeric key or indexing a scalar is a type mismatch; an index past
    /// the end is out of range. `at` is the path of `self`, used for
    /// diagnostics.
    pub(crate) fn step(&self, segment: &PathSegment, at: &KeyPath) -> AttrResult<Option<&Self>> {
        match self {
            Self::Map(map) => Ok(map.get(segment.canonical_key().as_ref())),
            Self::Seq(seq) => {
                let index = segment
                    .as_index()
                    .ok_or_else(|| AttributeError::mismatch(at.clone(), ValueKind::Map, self))?;
                seq.get(index)
                    .map(Some)
                    .ok_or_else(|| AttributeError::out_of_range(at.clone(), index, seq.len()))
            }
            other => Err(AttributeError::mismatch(at.clone(), ValueKind::Map, other)),
        }
    }

    /// Strict lookup of a nested path relative to `self`, whose own path is
    /// `at`.
    pub(crate) fn resolve(&self, path: &KeyPath, at: &KeyPath) -> AttrResult<&Self> {
        let mut current = self;
        let mut walked = at.clone();
        for segment in path {
            let next = current
                .step(segment, &walked)?
                .ok_or_else(|| AttributeError::missing(walked.child(segment)))?;
            walked.push(segment);
            current = next;
        }
        Ok(current)
    }

    /// Mutable access to the map payload, duplicating it first if shared.
    pub fn map_mut(&mut self) -> Option<&mut AttrMap> {
        match self {
            Self::Map(map) => Some(Arc::make_mut(map)),
            _ => None,
        }
    }

    /// Mutable access to the sequence payload, duplicating it first if shared.
    pub fn seq_mut(&mut self) -> Option<&mut Vec<Value>> {
        match self {
            Self::Seq(seq) => Some(Arc::make_mut(seq)),
            _ => None,
        }
    }

    /// Number of entries in a container; scalars report zero.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Map(map) => map.len(),
            Self::Seq(seq) => seq.len(),
            _ => 0,
        }
    }

    /// Returns `true` for empty containers and for scalars.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` when this container's storage is referenced elsewhere.
    ///
    /// Scalars are never shared.
    #[must_use]
    pub fn is_shared(&self) -> bool {
        match self {
            Self::Map(map) => Arc::strong_count(map) > 1,
            Self::Seq(seq) => Arc::strong_count(seq) > 1,
            _ => false,
        }
    }

    /// Returns `true` when both values are containers backed by the same
    /// storage.
    #[must_use]
    pub fn shares_storage_with(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Map(a), Self::Map(b)) => Arc::ptr_eq(a, b),
            (Self::Seq(a), Self::Seq(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Convert into a fully detached plain JSON value.
    #[must_use]
    pub fn to_plain(&self) -> serde_json::Value {
        match self {
            Self::Null => serde_json::Value::Null,
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Number(n) => serde_json::Value::Number(n.clone()),
            Self::String(s) => serde_json::Value::String(s.clone()),
            Self::Seq(seq) => serde_json::Value::Array(seq.iter().map(Self::to_plain).collect()),
            Self::Map(map) => serde_json::Value::Object(
                map.iter()
                    .map(|(key, value)| (key.clone(), value.to_plain()))
                    .collect(),
            ),
        }
    }

    /// Deep-merge `other` into `self`.
    ///
    /// Maps merge key by key; every other shape in `other` replaces the value
    /// in `self` wholesale. Used for folding plain inbound documents into a
    /// layer, not for precedence resolution.
    ///
    /// ```
    /// use node_attrs::Value;
    /// use serde_json::json;
    ///
    /// let mut acc = Value::from(json!({"a": 1, "b": {"x": 1}}));
    /// acc.deep_merge(Value::from(json!({"b": {"y": 2}, "c": [3]})));
    /// assert_eq!(acc, json!({"a": 1, "b": {"x": 1, "y": 2}, "c": [3]}));
    /// ```
    pub fn deep_merge(&mut self, other: Self) {
        match other {
            Self::Map(shared) => {
                if !self.is_map() {
                    *self = Self::empty_map();
                }
                let Some(target) = self.map_mut() else {
                    return;
                };
                for (key, value) in Arc::unwrap_or_clone(shared) {
                    match target.get_mut(&key) {
                        Some(existing) => existing.deep_merge(value),
                        None => {
                            target.insert(key, value);
                        }
                    }
                }
            }
            replacement => *self = replacement,
        }
    }
}

impl PartialEq<serde_json::Value> for Value {
    fn eq(&self, other: &serde_json::Value) -> bool {
        match (self, other) {
            (Self::Null, serde_json::Value::Null) => true,
            (Self::Bool(a), serde_json::Value::Bool(b)) => a == b,
            (Self::Number(a), serde_json::Value::Number(b)) => a == b,
            (Self::String(a), serde_json::Value::String(b)) => a == b,
            (Self::Seq(a), serde_json::Value::Array(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x == y)
            }
            (Self::Map(a), serde_json::Value::Object(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .all(|(key, value)| b.get(key).is_some_and(|other| value == other))
            }
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_plain())
    }
}
