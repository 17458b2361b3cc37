//! Read-only view into one layer.

use crate::key::{KeyPath, PathSegment};
use crate::layer::Layer;
use crate::precedence::Precedence;
use crate::value::Value;
use crate::AttrResult;

use super::{ContainerView, step_into};

/// Borrowed, read-only view of a value stored in a single layer.
#[derive(Clone, Debug)]
pub struct LayerView<'a> {
    precedence: Precedence,
    path: KeyPath,
    value: &'a Value,
}

impl<'a> LayerView<'a> {
    /// View of the layer root.
    #[must_use]
    pub fn root(layer: &'a Layer) -> Self {
        Self {
            precedence: layer.precedence(),
            path: KeyPath::root(),
            value: layer.root(),
        }
    }

    pub(crate) const fn new(precedence: Precedence, path: KeyPath, value: &'a Value) -> Self {
        Self {
            precedence,
            path,
            value,
        }
    }

    /// The borrowed value.
    #[must_use]
    pub const fn value(&self) -> &'a Value {
        self.value
    }

    /// `(key, view)` pairs of a map in insertion order; empty otherwise.
    pub fn entries(&self) -> impl Iterator<Item = (&'a str, Self)> + '_ {
        self.value.as_map().into_iter().flat_map(move |map| {
            map.iter().map(move |(key, value)| {
                (
                    key.as_str(),
                    Self::new(self.precedence, self.path.child(key), value),
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
                .map(move |(index, value)| Self::new(self.precedence, self.path.child(index), value))
        })
    }
}

impl<'a> ContainerView for LayerView<'a> {
    type Child<'v>
        = LayerView<'a>
    where
        Self: 'v;

    fn path(&self) -> &KeyPath {
        &self.path
    }

    fn precedence(&self) -> Option<Precedence> {
        Some(self.precedence)
    }

    fn current(&self) -> Option<&Value> {
        Some(self.value)
    }

    fn get(&self, segment: impl Into<PathSegment>) -> AttrResult<Option<Self::Child<'_>>> {
        let step = segment.into();
        let child = step_into(Some(self.value), &step, &self.path)?;
        Ok(child.map(|value| Self::new(self.precedence, self.path.child(step), value)))
    }
}
