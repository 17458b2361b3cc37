//! A single precedence layer with copy-on-write ownership tracking.
//!
//! A [`Layer`] wraps one root map. The map may be shared with other layers,
//! with node documents, or with snapshots handed out to readers; the layer
//! tracks whether it may write in place. Every mutating method duplicates
//! shared storage along the written path before touching it, so writes never
//! reach data visible through another handle.

use std::sync::Arc;

use tracing::trace;

use crate::key::{KeyPath, PathSegment};
use crate::precedence::Precedence;
use crate::value::{Value, ValueKind};
use crate::{AttrResult, AttributeError};

/// Whether a layer's root container is referenced elsewhere.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Ownership {
    /// The root is still referenced by another handle; the next write
    /// duplicates it first.
    Shared,
    /// The layer holds the only reference and writes in place.
    Owned,
}

/// One precedence level's attribute data.
#[derive(Clone, Debug)]
pub struct Layer {
    precedence: Precedence,
    root: Value,
}

impl Layer {
    /// An empty, owned layer.
    #[must_use]
    pub fn new(precedence: Precedence) -> Self {
        Self {
            precedence,
            root: Value::empty_map(),
        }
    }

    /// A layer backed by `root` without copying it.
    ///
    /// `Null` is accepted as an empty map.
    ///
    /// # Errors
    ///
    /// Returns [`AttributeError::TypeMismatch`] when `root` is neither a map
    /// nor null.
    pub fn with_root(precedence: Precedence, root: Value) -> AttrResult<Self> {
        match root {
            Value::Null => Ok(Self::new(precedence)),
            map @ Value::Map(_) => Ok(Self {
                precedence,
                root: map,
            }),
            other => Err(AttributeError::mismatch(
                KeyPath::root(),
                ValueKind::Map,
                &other,
            )),
        }
    }

    /// A layer at `precedence` sharing the data of `source`.
    pub(crate) fn seeded(precedence: Precedence, source: &Self) -> Self {
        Self {
            precedence,
            root: source.root.clone(),
        }
    }

    /// The precedence level this layer occupies.
    #[must_use]
    pub const fn precedence(&self) -> Precedence {
        self.precedence
    }

    /// The root map. Cloning it is cheap and shares storage.
    #[must_use]
    pub const fn root(&self) -> &Value {
        &self.root
    }

    /// Current ownership of the root container.
    #[must_use]
    pub fn ownership(&self) -> Ownership {
        if self.root.is_shared() {
            Ownership::Shared
        } else {
            Ownership::Owned
        }
    }

    /// Detach the root from any other holder.
    ///
    /// One top-level duplication when shared; a no-op when already owned.
    /// Nested containers stay shared until a write walks through them.
    pub fn ensure_owned(&mut self) {
        if self.ownership() == Ownership::Shared {
            trace!(layer = %self.precedence, "duplicating shared layer root");
        }
        if let Value::Map(map) = &mut self.root {
            Arc::make_mut(map);
        }
    }

    /// Lenient lookup: absent for missing keys, scalars and out-of-range
    /// indexes.
    #[must_use]
    pub fn lookup(&self, path: &KeyPath) -> Option<&Value> {
        self.root.pointer(path)
    }

    /// Strict lookup.
    ///
    /// # Errors
    ///
    /// Returns [`AttributeError::NoSuchAttribute`] for a missing key,
    /// [`AttributeError::TypeMismatch`] when the path runs through a scalar
    /// and [`AttributeError::OutOfRange`] for an index past the end of a
    /// sequence.
    pub fn resolve(&self, path: &KeyPath) -> AttrResult<&Value> {
        self.root.resolve(path, &KeyPath::root())
    }

    /// Check that [`Layer::write`] would succeed without touching anything.
    ///
    /// Missing map keys along the way are fine; they will be vivified. A
    /// final index may be equal to the sequence length, which appends.
    ///
    /// # Errors
    ///
    /// Returns [`AttributeError::TypeMismatch`] when the path runs through a
    /// scalar or tries to key a sequence with a non-numeric segment, and
    /// [`AttributeError::OutOfRange`] for an index past the end.
    pub fn check_write(&self, path: &KeyPath) -> AttrResult<()> {
        let Some((parent, last)) = path.split_last() else {
            return Ok(());
        };
        let mut current = &self.root;
        let mut walked = KeyPath::root();
        for segment in &parent {
            match current.step(segment, &walked)? {
                Some(next) => current = next,
                // Everything below is created fresh.
                None => return Ok(()),
            }
            walked.push(segment);
        }
        check_slot(current, last, &walked)
    }

    /// Store `value` at `path`, vivifying missing intermediate maps.
    ///
    /// Writing at the root replaces the whole layer and requires a map.
    ///
    /// # Errors
    ///
    /// Fails as [`Layer::check_write`] does; nothing is modified on error.
    pub fn write(&mut self, path: &KeyPath, value: Value) -> AttrResult<()> {
        self.check_write(path)?;
        self.apply_write(path, value)
    }

    /// Store `value` at a path already accepted by [`Layer::check_write`].
    pub(crate) fn apply_write(&mut self, path: &KeyPath, value: Value) -> AttrResult<()> {
        let Some((parent, last)) = path.split_last() else {
            *self = Self::with_root(self.precedence, value)?;
            return Ok(());
        };
        self.ensure_owned();
        let container = descend_mut(&mut self.root, parent.segments(), KeyPath::root(), true)?;
        match container {
            Value::Map(map) => {
                Arc::make_mut(map).insert(last.canonical_key().into_owned(), value);
                Ok(())
            }
            Value::Seq(shared) => {
                let items = Arc::make_mut(shared);
                let len = items.len();
                match last.as_index() {
                    Some(index) if index < len => {
                        if let Some(slot) = items.get_mut(index) {
                            *slot = value;
                        }
                        Ok(())
                    }
                    Some(index) if index == len => {
                        items.push(value);
                        Ok(())
                    }
                    Some(index) => Err(AttributeError::out_of_range(parent, index, len)),
                    None => Err(AttributeError::TypeMismatch {
                        path: parent,
                        expected: ValueKind::Map,
                        found: ValueKind::Seq,
                    }),
                }
            }
            other => Err(AttributeError::mismatch(parent, ValueKind::Map, other)),
        }
    }

    /// Append `value` to the sequence at `path`, returning the new index.
    ///
    /// # Errors
    ///
    /// Fails as [`Layer::resolve`] when `path` is missing, and returns
    /// [`AttributeError::TypeMismatch`] when the value there is not a
    /// sequence.
    pub fn push(&mut self, path: &KeyPath, value: Value) -> AttrResult<usize> {
        let current = self.resolve(path)?;
        if !current.is_seq() {
            return Err(AttributeError::mismatch(path.clone(), ValueKind::Seq, current));
        }
        self.ensure_owned();
        let slot = descend_mut(&mut self.root, path.segments(), KeyPath::root(), false)?;
        let items = slot
            .seq_mut()
            .ok_or_else(|| AttributeError::mismatch(path.clone(), ValueKind::Seq, &Value::Null))?;
        let index = items.len();
        items.push(value);
        Ok(index)
    }

    /// Remove and return the value at `path`.
    ///
    /// Never vivifies: a missing key, an out-of-range index or a path through
    /// a scalar yields `None` with the layer untouched.
    pub fn unlink(&mut self, path: &KeyPath) -> Option<Value> {
        let (parent, last) = path.split_last()?;
        self.lookup(path)?;
        self.ensure_owned();
        let container = descend_mut(&mut self.root, parent.segments(), KeyPath::root(), false).ok()?;
        match container {
            Value::Map(map) => Arc::make_mut(map).shift_remove(last.canonical_key().as_ref()),
            Value::Seq(shared) => {
                let index = last.as_index()?;
                let items = Arc::make_mut(shared);
                (index < items.len()).then(|| items.remove(index))
            }
            _ => None,
        }
    }

    /// Strict variant of [`Layer::unlink`].
    ///
    /// # Errors
    ///
    /// Fails as [`Layer::resolve`] does when nothing is stored at `path`.
    /// Unlinking the root is reported as [`AttributeError::NoSuchAttribute`].
    pub fn unlink_strict(&mut self, path: &KeyPath) -> AttrResult<Value> {
        if path.is_root() {
            return Err(AttributeError::missing(path.clone()));
        }
        self.resolve(path)?;
        self.unlink(path)
            .ok_or_else(|| AttributeError::missing(path.clone()))
    }

    /// Replace the container at `path` with an empty one of the same shape.
    ///
    /// # Errors
    ///
    /// Fails as [`Layer::resolve`] when `path` is missing, and returns
    /// [`AttributeError::TypeMismatch`] when the value there is a scalar.
    pub fn clear(&mut self, path: &KeyPath) -> AttrResult<()> {
        let current = self.resolve(path)?;
        let empty = match current.kind() {
            ValueKind::Map => Value::empty_map(),
            ValueKind::Seq => Value::empty_seq(),
            _ => return Err(AttributeError::mismatch(path.clone(), ValueKind::Map, current)),
        };
        self.apply_write(path, empty)
    }

    /// Replace the whole layer with an empty map.
    pub(crate) fn reset(&mut self) {
        self.root = Value::empty_map();
    }
}

impl PartialEq for Layer {
    fn eq(&self, other: &Self) -> bool {
        self.precedence == other.precedence && self.root == other.root
    }
}

/// Check that `container`, found at `at`, can accept a write at `segment`.
fn check_slot(container: &Value, segment: &PathSegment, at: &KeyPath) -> AttrResult<()> {
    match container {
        Value::Map(_) => Ok(()),
        Value::Seq(seq) => {
            let index = segment
                .as_index()
                .ok_or_else(|| AttributeError::mismatch(at.clone(), ValueKind::Map, container))?;
            if index <= seq.len() {
                Ok(())
            } else {
                Err(AttributeError::out_of_range(at.clone(), index, seq.len()))
            }
        }
        other => Err(AttributeError::mismatch(at.clone(), ValueKind::Map, other)),
    }
}

/// Walk `segments` below `value`, duplicating shared containers on the way.
///
/// With `vivify`, missing map keys are filled with empty maps; otherwise they
/// are reported as missing.
fn descend_mut<'v>(
    value: &'v mut Value,
    segments: &[PathSegment],
    walked: KeyPath,
    vivify: bool,
) -> AttrResult<&'v mut Value> {
    let Some((segment, rest)) = segments.split_first() else {
        return Ok(value);
    };
    let here = walked.child(segment);
    let next = match value {
        Value::Map(shared) => {
            let entries = Arc::make_mut(shared);
            let key = segment.canonical_key().into_owned();
            if vivify {
                entries.entry(key).or_insert_with(Value::empty_map)
            } else {
                entries
                    .get_mut(&key)
                    .ok_or_else(|| AttributeError::missing(here.clone()))?
            }
        }
        Value::Seq(shared) => {
            let items = Arc::make_mut(shared);
            let len = items.len();
            let index = segment.as_index().ok_or(AttributeError::TypeMismatch {
                path: walked,
                expected: ValueKind::Map,
                found: ValueKind::Seq,
            })?;
            items
                .get_mut(index)
                .ok_or_else(|| AttributeError::out_of_range(here.clone(), index, len))?
        }
        other => return Err(AttributeError::mismatch(walked, ValueKind::Map, other)),
    };
    descend_mut(next, rest, here, vivify)
}
