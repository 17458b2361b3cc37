//! Read-only snapshots of merged attributes.
//!
//! An [`ImmutableView`] owns the merged value it was created from. Because
//! layer writes copy shared storage before mutating it, a view handed out
//! earlier keeps showing the data as it was at the time of the read.

use crate::key::{KeyPath, PathSegment};
use crate::precedence::Precedence;
use crate::value::{Value, ValueKind};
use crate::view::{ContainerView, ContainerWrite};
use crate::{AttrResult, AttributeError};

/// A frozen view of merged attribute data.
///
/// ```
/// use node_attrs::{Attributes, ContainerView, ContainerWrite, Precedence};
///
/// let mut attrs = Attributes::new();
/// attrs.write(Precedence::Default, &["port"].into(), 80)?;
/// let mut merged = attrs.merged();
/// assert!(merged.set("port", 81).is_err());
/// assert_eq!(merged.attr("port")?.value().as_u64(), Some(80));
/// # Ok::<_, node_attrs::AttributeError>(())
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct ImmutableView {
    path: KeyPath,
    value: Value,
}

impl ImmutableView {
    /// Wrap `value`, found at `path`.
    #[must_use]
    pub const fn new(path: KeyPath, value: Value) -> Self {
        Self { path, value }
    }

    /// The snapshot value.
    #[must_use]
    pub const fn value(&self) -> &Value {
        &self.value
    }

    /// Consume the view, returning the snapshot value.
    #[must_use]
    pub fn into_value(self) -> Value {
        self.value
    }

    /// Deep copy of a map snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`AttributeError::TypeMismatch`] unless the view holds a map.
    pub fn to_map(&self) -> AttrResult<serde_json::Map<String, serde_json::Value>> {
        match self.value.to_plain() {
            serde_json::Value::Object(map) => Ok(map),
            _ => Err(AttributeError::mismatch(
                self.path.clone(),
                ValueKind::Map,
                &self.value,
            )),
        }
    }

    /// Deep copy of a sequence snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`AttributeError::TypeMismatch`] unless the view holds a
    /// sequence.
    pub fn to_sequence(&self) -> AttrResult<Vec<serde_json::Value>> {
        match self.value.to_plain() {
            serde_json::Value::Array(items) => Ok(items),
            _ => Err(AttributeError::mismatch(
                self.path.clone(),
                ValueKind::Seq,
                &self.value,
            )),
        }
    }

    /// `(key, view)` pairs of a map in insertion order; empty otherwise.
    pub fn entries(&self) -> impl Iterator<Item = (&str, Self)> + '_ {
        self.value.as_map().into_iter().flat_map(move |map| {
            map.iter().map(move |(key, value)| {
                (
                    key.as_str(),
                    Self::new(self.path.child(key), value.clone()),
                )
            })
        })
    }

    /// Views of sequence elements in order; empty otherwise.
    pub fn elements(&self) -> impl Iterator<Item = Self> + '_ {
        self.value.as_seq().into_iter().flat_map(move |items| {
            items
                .iter()
                .enumerate()
                .map(move |(index, value)| Self::new(self.path.child(index), value.clone()))
        })
    }

    fn refuse<T>(&self, operation: &'static str) -> AttrResult<T> {
        Err(AttributeError::immutable(self.path.clone(), operation))
    }
}

impl ContainerView for ImmutableView {
    type Child<'v> = Self;

    fn path(&self) -> &KeyPath {
        &self.path
    }

    fn precedence(&self) -> Option<Precedence> {
        None
    }

    fn current(&self) -> Option<&Value> {
        Some(&self.value)
    }

    fn get(&self, segment: impl Into<PathSegment>) -> AttrResult<Option<Self>> {
        let step = segment.into();
        let child = self.value.step(&step, &self.path)?;
        Ok(child.map(|value| Self::new(self.path.child(step), value.clone())))
    }
}

impl ContainerWrite for ImmutableView {
    fn set(&mut self, _segment: impl Into<PathSegment>, _value: impl Into<Value>) -> AttrResult<()> {
        self.refuse("set")
    }

    fn remove(&mut self, _segment: impl Into<PathSegment>) -> AttrResult<Option<Value>> {
        self.refuse("remove")
    }

    fn push(&mut self, _value: impl Into<Value>) -> AttrResult<usize> {
        self.refuse("push")
    }

    fn clear(&mut self) -> AttrResult<()> {
        self.refuse("clear")
    }
}

impl PartialEq<serde_json::Value> for ImmutableView {
    fn eq(&self, other: &serde_json::Value) -> bool {
        self.value == *other
    }
}
