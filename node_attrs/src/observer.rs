//! Change notification for attribute writes.

use crate::key::KeyPath;
use crate::precedence::Precedence;
use crate::value::Value;

/// A successful mutation of one layer.
#[derive(Clone, Debug, PartialEq)]
pub struct ChangeEvent {
    /// Layer that was written.
    pub precedence: Precedence,
    /// Path that changed, relative to the layer root.
    pub path: KeyPath,
    /// New value at `path`; `None` when the value was removed.
    pub value: Option<Value>,
}

impl ChangeEvent {
    /// Event for a value stored at `path`.
    #[must_use]
    pub const fn set(precedence: Precedence, path: KeyPath, value: Value) -> Self {
        Self {
            precedence,
            path,
            value: Some(value),
        }
    }

    /// Event for a value removed from `path`.
    #[must_use]
    pub const fn removed(precedence: Precedence, path: KeyPath) -> Self {
        Self {
            precedence,
            path,
            value: None,
        }
    }
}

/// Receives a [`ChangeEvent`] synchronously after every successful write.
///
/// Closures taking `&ChangeEvent` implement the trait directly:
///
/// ```
/// use node_attrs::{Attributes, ChangeEvent, KeyPath, Precedence};
///
/// let mut attrs = Attributes::new();
/// attrs.set_observer(|event: &ChangeEvent| {
///     assert_eq!(event.precedence, Precedence::Normal);
/// });
/// attrs.write(Precedence::Normal, &KeyPath::from(["a"]), 1)?;
/// # Ok::<_, node_attrs::AttributeError>(())
/// ```
pub trait AttributeObserver {
    /// Called once per successful mutation.
    fn attribute_changed(&self, event: &ChangeEvent);
}

impl<F> AttributeObserver for F
where
    F: Fn(&ChangeEvent),
{
    fn attribute_changed(&self, event: &ChangeEvent) {
        self(event);
    }
}
