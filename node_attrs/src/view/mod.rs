//! Views onto attribute containers.
//!
//! A view addresses one value by its [`KeyPath`] from a layer root and
//! remembers which layer it came from. Three flavours share the read
//! interface in [`ContainerView`]:
//!
//! - [`LayerView`] borrows a single layer read-only;
//! - [`VividView`] borrows the attribute set mutably, writes into one layer
//!   and creates missing maps on navigation;
//! - [`crate::ImmutableView`] owns a snapshot of merged data and refuses
//!   every write.
//!
//! Write access goes through [`ContainerWrite`].

mod layer_view;
mod vivid;

pub use layer_view::LayerView;
pub use vivid::VividView;

use crate::key::{KeyPath, PathSegment};
use crate::precedence::Precedence;
use crate::value::{Value, ValueKind};
use crate::{AttrResult, AttributeError};

/// Read access shared by every view.
pub trait ContainerView {
    /// View type returned when navigating to a child.
    type Child<'v>: ContainerView
    where
        Self: 'v;

    /// Path of the viewed value from its layer root.
    fn path(&self) -> &KeyPath;

    /// Layer the view belongs to; `None` for merged data.
    fn precedence(&self) -> Option<Precedence>;

    /// The viewed value, or `None` when nothing is stored at the path.
    fn current(&self) -> Option<&Value>;

    /// Navigate one step.
    ///
    /// Returns `Ok(None)` for a missing map key. A container child is viewed
    /// in place without copying; a scalar child is viewed as that scalar.
    ///
    /// # Errors
    ///
    /// Returns [`AttributeError::TypeMismatch`] when this view holds a
    /// scalar or a sequence is keyed by a non-numeric segment, and
    /// [`AttributeError::OutOfRange`] for an index past the end.
    fn get(&self, segment: impl Into<PathSegment>) -> AttrResult<Option<Self::Child<'_>>>;

    /// Dotted-attribute access: `view.attr("network")` is a strict `get`.
    ///
    /// # Errors
    ///
    /// Returns [`AttributeError::NoSuchAttribute`] when `name` is missing,
    /// and the errors of [`ContainerView::get`] otherwise.
    fn attr(&self, name: &str) -> AttrResult<Self::Child<'_>> {
        self.get(name)?
            .ok_or_else(|| AttributeError::missing(self.path().child(name)))
    }

    /// Shape of the viewed value.
    fn kind(&self) -> Option<ValueKind> {
        self.current().map(Value::kind)
    }

    /// Returns `true` when `key` addresses an existing child.
    fn contains(&self, key: impl Into<PathSegment>) -> bool {
        let segment = key.into();
        self.current()
            .and_then(|value| value.get(&segment))
            .is_some()
    }

    /// Number of children; zero for scalars.
    fn len(&self) -> usize {
        self.current().map_or(0, Value::len)
    }

    /// Returns `true` when there are no children.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Map keys in insertion order; empty for anything but a map.
    fn keys(&self) -> Vec<String> {
        self.current()
            .and_then(Value::as_map)
            .map(|map| map.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Detached plain copy of the viewed value.
    fn to_plain(&self) -> serde_json::Value {
        self.current()
            .map_or(serde_json::Value::Null, Value::to_plain)
    }
}

/// Write access through a view.
pub trait ContainerWrite {
    /// Store `value` under `segment` of the viewed container.
    ///
    /// # Errors
    ///
    /// Fails when the view is read-only, holds a scalar, or `segment` is not a
    /// valid slot of the container.
    fn set(&mut self, segment: impl Into<PathSegment>, value: impl Into<Value>) -> AttrResult<()>;

    /// Remove and return the child at `segment`.
    ///
    /// # Errors
    ///
    /// Fails when the view is read-only or holds a scalar.
    fn remove(&mut self, segment: impl Into<PathSegment>) -> AttrResult<Option<Value>>;

    /// Append to the viewed sequence, returning the new index.
    ///
    /// # Errors
    ///
    /// Fails when the view is read-only or does not hold a sequence.
    fn push(&mut self, value: impl Into<Value>) -> AttrResult<usize>;

    /// Empty the viewed container.
    ///
    /// # Errors
    ///
    /// Fails when the view is read-only or holds a scalar.
    fn clear(&mut self) -> AttrResult<()>;
}

/// Checked navigation shared by the view implementations.
fn step_into<'v>(
    value: Option<&'v Value>,
    segment: &PathSegment,
    at: &KeyPath,
) -> AttrResult<Option<&'v Value>> {
    match value {
        Some(current) => current.step(segment, at),
        None => Ok(None),
    }
}
