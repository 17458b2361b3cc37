//! Mutable, autovivifying view into one layer.

use crate::attributes::Attributes;
use crate::key::{KeyPath, PathSegment};
use crate::precedence::Precedence;
use crate::value::{Value, ValueKind};
use crate::{AttrResult, AttributeError};

use super::{ContainerView, ContainerWrite, LayerView, step_into};

/// Writable view of one layer of an [`Attributes`] set.
///
/// Navigating with [`VividView::at`] or [`VividView::child`] creates an empty
/// map at a missing key, so nested paths can be written without declaring
/// their parents first:
///
/// ```
/// use node_attrs::{Attributes, ContainerWrite};
///
/// let mut attrs = Attributes::new();
/// attrs.default_mut().at("a")?.at("b")?.set("c", 1)?;
/// assert_eq!(attrs.to_plain(), serde_json::json!({"a": {"b": {"c": 1}}}));
/// # Ok::<_, node_attrs::AttributeError>(())
/// ```
///
/// Every write, including the map created by navigation, goes through the
/// attribute set: the layer is detached from shared storage, the merge cache
/// is invalidated and the observer hears about it.
#[derive(Debug)]
pub struct VividView<'a> {
    attrs: &'a mut Attributes,
    precedence: Precedence,
    path: KeyPath,
}

impl<'a> VividView<'a> {
    pub(crate) const fn new(attrs: &'a mut Attributes, precedence: Precedence, path: KeyPath) -> Self {
        Self {
            attrs,
            precedence,
            path,
        }
    }

    /// Move the view to `key`, creating an empty map there if it is missing.
    ///
    /// # Errors
    ///
    /// Returns [`AttributeError::TypeMismatch`] when this view holds a
    /// scalar, and [`AttributeError::OutOfRange`] for a missing sequence
    /// index.
    pub fn at(self, key: impl Into<PathSegment>) -> AttrResult<Self> {
        let path = self.attrs.vivify(self.precedence, &self.path, key.into())?;
        Ok(Self {
            attrs: self.attrs,
            precedence: self.precedence,
            path,
        })
    }

    /// Like [`VividView::at`], but reborrows so this view stays usable.
    ///
    /// # Errors
    ///
    /// As for [`VividView::at`].
    pub fn child(&mut self, key: impl Into<PathSegment>) -> AttrResult<VividView<'_>> {
        let path = self.attrs.vivify(self.precedence, &self.path, key.into())?;
        Ok(VividView::new(self.attrs, self.precedence, path))
    }

    /// Layer this view writes into.
    #[must_use]
    pub const fn layer(&self) -> Precedence {
        self.precedence
    }

    /// Read-only view of the same value.
    #[must_use]
    pub fn as_layer_view(&self) -> Option<LayerView<'_>> {
        self.current()
            .map(|value| LayerView::new(self.precedence, self.path.clone(), value))
    }
}

impl ContainerView for VividView<'_> {
    type Child<'v>
        = LayerView<'v>
    where
        Self: 'v;

    fn path(&self) -> &KeyPath {
        &self.path
    }

    fn precedence(&self) -> Option<Precedence> {
        Some(self.precedence)
    }

    fn current(&self) -> Option<&Value> {
        self.attrs.layer_data(self.precedence).lookup(&self.path)
    }

    fn get(&self, segment: impl Into<PathSegment>) -> AttrResult<Option<Self::Child<'_>>> {
        let step = segment.into();
        let child = step_into(self.current(), &step, &self.path)?;
        Ok(child.map(|value| LayerView::new(self.precedence, self.path.child(step), value)))
    }
}

impl ContainerWrite for VividView<'_> {
    fn set(&mut self, segment: impl Into<PathSegment>, value: impl Into<Value>) -> AttrResult<()> {
        let path = self.path.child(segment);
        self.attrs.write(self.precedence, &path, value)
    }

    fn remove(&mut self, segment: impl Into<PathSegment>) -> AttrResult<Option<Value>> {
        if let Some(current) = self.current().filter(|value| !value.is_container()) {
            return Err(AttributeError::mismatch(
                self.path.clone(),
                ValueKind::Map,
                current,
            ));
        }
        let path = self.path.child(segment);
        Ok(self.attrs.unlink(self.precedence, &path))
    }

    fn push(&mut self, value: impl Into<Value>) -> AttrResult<usize> {
        self.attrs.push(self.precedence, &self.path, value)
    }

    fn clear(&mut self) -> AttrResult<()> {
        self.attrs.clear_at(self.precedence, &self.path)
    }
}
