//! The layered attribute set.
//!
//! [`Attributes`] owns one [`Layer`] per [`Precedence`] level, a merge cache
//! and an optional observer. Recipes write into a named layer and read the
//! merged composite, which is computed on demand and memoized per path.
//!
//! Every mutating operation runs the same pipeline: validate against the
//! current data, invalidate the affected cache paths, detach the layer
//! from shared storage, apply the change and notify the observer. A failing
//! call stops at validation, so nothing is observed to change.

use std::cell::RefCell;
use std::fmt;

use tracing::debug;

use crate::immutable::ImmutableView;
use crate::key::{KeyPath, PathSegment};
use crate::layer::{Layer, Ownership};
use crate::merge::{MergeCache, MergeCacheStats, merge_layers};
use crate::observer::{AttributeObserver, ChangeEvent};
use crate::precedence::Precedence;
use crate::value::{Value, ValueKind};
use crate::view::{LayerView, VividView};
use crate::{AttrResult, AttributeError};

/// One layer per precedence level.
#[derive(Clone, Debug, PartialEq)]
struct LayerSet {
    default: Layer,
    env_default: Layer,
    role_default: Layer,
    force_default: Layer,
    normal: Layer,
    r#override: Layer,
    role_override: Layer,
    env_override: Layer,
    force_override: Layer,
    automatic: Layer,
}

impl LayerSet {
    fn new() -> Self {
        Self {
            default: Layer::new(Precedence::Default),
            env_default: Layer::new(Precedence::EnvDefault),
            role_default: Layer::new(Precedence::RoleDefault),
            force_default: Layer::new(Precedence::ForceDefault),
            normal: Layer::new(Precedence::Normal),
            r#override: Layer::new(Precedence::Override),
            role_override: Layer::new(Precedence::RoleOverride),
            env_override: Layer::new(Precedence::EnvOverride),
            force_override: Layer::new(Precedence::ForceOverride),
            automatic: Layer::new(Precedence::Automatic),
        }
    }

    const fn get(&self, precedence: Precedence) -> &Layer {
        match precedence {
            Precedence::Default => &self.default,
            Precedence::EnvDefault => &self.env_default,
            Precedence::RoleDefault => &self.role_default,
            Precedence::ForceDefault => &self.force_default,
            Precedence::Normal => &self.normal,
            Precedence::Override => &self.r#override,
            Precedence::RoleOverride => &self.role_override,
            Precedence::EnvOverride => &self.env_override,
            Precedence::ForceOverride => &self.force_override,
            Precedence::Automatic => &self.automatic,
        }
    }

    const fn get_mut(&mut self, precedence: Precedence) -> &mut Layer {
        match precedence {
            Precedence::Default => &mut self.default,
            Precedence::EnvDefault => &mut self.env_default,
            Precedence::RoleDefault => &mut self.role_default,
            Precedence::ForceDefault => &mut self.force_default,
            Precedence::Normal => &mut self.normal,
            Precedence::Override => &mut self.r#override,
            Precedence::RoleOverride => &mut self.role_override,
            Precedence::EnvOverride => &mut self.env_override,
            Precedence::ForceOverride => &mut self.force_override,
            Precedence::Automatic => &mut self.automatic,
        }
    }

    fn select<'s>(&'s self, levels: &'s [Precedence]) -> impl Iterator<Item = &'s Layer> {
        levels.iter().map(|level| self.get(*level))
    }
}

/// A node's attribute layers and their merged view.
pub struct Attributes {
    layers: LayerSet,
    cache: RefCell<MergeCache>,
    observer: Option<Box<dyn AttributeObserver>>,
}

impl Attributes {
    /// An attribute set with every layer empty.
    #[must_use]
    pub fn new() -> Self {
        Self {
            layers: LayerSet::new(),
            cache: RefCell::new(MergeCache::new()),
            observer: None,
        }
    }

    pub(crate) const fn layer_data(&self, precedence: Precedence) -> &Layer {
        self.layers.get(precedence)
    }

    /// Read-only view of one layer's root.
    #[must_use]
    pub fn layer(&self, precedence: Precedence) -> LayerView<'_> {
        LayerView::root(self.layers.get(precedence))
    }

    /// Writable view of one layer's root.
    pub fn layer_mut(&mut self, precedence: Precedence) -> VividView<'_> {
        VividView::new(self, precedence, KeyPath::root())
    }

    /// [`Attributes::layer`] addressed by name.
    ///
    /// # Errors
    ///
    /// Returns [`AttributeError::UnknownPrecedenceLayer`] for a name outside
    /// the fixed set.
    pub fn layer_named(&self, name: &str) -> AttrResult<LayerView<'_>> {
        Ok(self.layer(name.parse()?))
    }

    /// [`Attributes::layer_mut`] addressed by name.
    ///
    /// # Errors
    ///
    /// Returns [`AttributeError::UnknownPrecedenceLayer`] for a name outside
    /// the fixed set.
    pub fn layer_named_mut(&mut self, name: &str) -> AttrResult<VividView<'_>> {
        Ok(self.layer_mut(name.parse()?))
    }

    /// Writable view of the `default` layer.
    pub fn default_mut(&mut self) -> VividView<'_> {
        self.layer_mut(Precedence::Default)
    }

    /// Writable view of the `normal` layer.
    pub fn normal_mut(&mut self) -> VividView<'_> {
        self.layer_mut(Precedence::Normal)
    }

    /// Writable view of the `override` layer.
    pub fn override_mut(&mut self) -> VividView<'_> {
        self.layer_mut(Precedence::Override)
    }

    /// Writable view of the `automatic` layer.
    pub fn automatic_mut(&mut self) -> VividView<'_> {
        self.layer_mut(Precedence::Automatic)
    }

    /// Whether a layer still shares its root with another holder.
    #[must_use]
    pub fn ownership(&self, precedence: Precedence) -> Ownership {
        self.layers.get(precedence).ownership()
    }

    /// Replace a layer wholesale with `value`, sharing its storage.
    ///
    /// The layer starts out [`Ownership::Shared`] while `value` is referenced
    /// elsewhere and detaches on its first write. `Null` clears the layer.
    ///
    /// # Errors
    ///
    /// Returns [`AttributeError::TypeMismatch`] unless `value` is a map or
    /// null.
    pub fn set_layer(&mut self, precedence: Precedence, value: impl Into<Value>) -> AttrResult<()> {
        let layer = Layer::with_root(precedence, value.into())?;
        self.cache.get_mut().clear();
        let root = layer.root().clone();
        *self.layers.get_mut(precedence) = layer;
        debug!(layer = %precedence, keys = root.len(), "layer replaced");
        self.notify(ChangeEvent::set(precedence, KeyPath::root(), root));
        Ok(())
    }

    /// Make `target` share the contents of `source`, as in `B = A`.
    pub fn seed_layer(&mut self, target: Precedence, source: Precedence) {
        let seeded = Layer::seeded(target, self.layers.get(source));
        let root = seeded.root().clone();
        self.cache.get_mut().clear();
        *self.layers.get_mut(target) = seeded;
        debug!(%target, %source, "layer seeded");
        self.notify(ChangeEvent::set(target, KeyPath::root(), root));
    }

    /// Empty one layer.
    pub fn reset_layer(&mut self, precedence: Precedence) {
        self.cache.get_mut().clear();
        self.layers.get_mut(precedence).reset();
        self.notify(ChangeEvent::set(precedence, KeyPath::root(), Value::empty_map()));
    }

    fn merged_at(&self, path: &KeyPath) -> Option<Value> {
        self.cache
            .borrow_mut()
            .get_or_compute(path, || merge_layers(self.layers.select(&Precedence::ORDER), path))
    }

    /// The whole merged composite.
    #[must_use]
    pub fn merged(&self) -> ImmutableView {
        let root = self.merged_at(&KeyPath::root()).unwrap_or_else(Value::empty_map);
        ImmutableView::new(KeyPath::root(), root)
    }

    /// Merged value at `path`; `None` when no layer defines it.
    #[must_use]
    pub fn read(&self, path: &KeyPath) -> Option<ImmutableView> {
        self.merged_at(path)
            .map(|value| ImmutableView::new(path.clone(), value))
    }

    /// Strict variant of [`Attributes::read`].
    ///
    /// # Errors
    ///
    /// Returns [`AttributeError::NoSuchAttribute`] when no layer defines
    /// `path`.
    pub fn read_strict(&self, path: &KeyPath) -> AttrResult<ImmutableView> {
        self.read(path)
            .ok_or_else(|| AttributeError::missing(path.clone()))
    }

    /// Merged value of one top-level key.
    #[must_use]
    pub fn get(&self, key: impl Into<PathSegment>) -> Option<ImmutableView> {
        self.read(&KeyPath::from(key.into()))
    }

    /// Returns `true` when some layer defines `path`.
    #[must_use]
    pub fn exists(&self, path: &KeyPath) -> bool {
        self.merged_at(path).is_some()
    }

    /// Returns `true` when any layer has `key` at its root.
    #[must_use]
    pub fn has_key(&self, key: impl Into<PathSegment>) -> bool {
        let segment = key.into();
        Precedence::ORDER
            .iter()
            .any(|level| self.layers.get(*level).root().get(&segment).is_some())
    }

    /// Merge of the default group alone at `path`.
    #[must_use]
    pub fn combined_default(&self, path: &KeyPath) -> Option<ImmutableView> {
        merge_layers(self.layers.select(&Precedence::DEFAULTS), path)
            .map(|value| ImmutableView::new(path.clone(), value))
    }

    /// Merge of the override group alone at `path`.
    #[must_use]
    pub fn combined_override(&self, path: &KeyPath) -> Option<ImmutableView> {
        merge_layers(self.layers.select(&Precedence::OVERRIDES), path)
            .map(|value| ImmutableView::new(path.clone(), value))
    }

    /// Per-layer values at `path`, lowest precedence first.
    #[must_use]
    pub fn debug_value(&self, path: &KeyPath) -> Vec<(Precedence, Option<Value>)> {
        Precedence::ORDER
            .iter()
            .map(|level| (*level, self.layers.get(*level).lookup(path).cloned()))
            .collect()
    }

    /// Detached plain copy of the merged composite.
    #[must_use]
    pub fn to_plain(&self) -> serde_json::Value {
        self.merged().value().to_plain()
    }

    /// Counters of the merge cache.
    #[must_use]
    pub fn cache_stats(&self) -> MergeCacheStats {
        self.cache.borrow().stats()
    }

    /// Store `value` at `path` in one layer, creating missing parent maps.
    ///
    /// # Errors
    ///
    /// Returns [`AttributeError::TypeMismatch`] when the path runs through a
    /// scalar and [`AttributeError::OutOfRange`] for an index past the end of
    /// a sequence. Nothing changes on error.
    pub fn write(
        &mut self,
        precedence: Precedence,
        path: &KeyPath,
        value: impl Into<Value>,
    ) -> AttrResult<()> {
        let stored = value.into();
        self.layers.get(precedence).check_write(path)?;
        self.cache.get_mut().invalidate(path);
        self.layers
            .get_mut(precedence)
            .apply_write(path, stored.clone())?;
        self.notify(ChangeEvent::set(precedence, path.clone(), stored));
        Ok(())
    }

    /// Like [`Attributes::write`] but never creates parent containers.
    ///
    /// # Errors
    ///
    /// Returns [`AttributeError::NoSuchAttribute`] when the parent of `path`
    /// is missing, and the errors of [`Attributes::write`] otherwise.
    pub fn write_strict(
        &mut self,
        precedence: Precedence,
        path: &KeyPath,
        value: impl Into<Value>,
    ) -> AttrResult<()> {
        if let Some(parent) = path.parent() {
            self.layers.get(precedence).resolve(&parent)?;
        }
        self.write(precedence, path, value)
    }

    /// Remove and return the value at `path` in one layer.
    ///
    /// Never creates anything; missing interior keys yield `None`.
    pub fn unlink(&mut self, precedence: Precedence, path: &KeyPath) -> Option<Value> {
        self.layers.get(precedence).lookup(path)?;
        self.cache.get_mut().invalidate(path);
        let removed = self.layers.get_mut(precedence).unlink(path)?;
        self.notify(ChangeEvent::removed(precedence, path.clone()));
        Some(removed)
    }

    /// Strict variant of [`Attributes::unlink`].
    ///
    /// # Errors
    ///
    /// Returns [`AttributeError::NoSuchAttribute`] when nothing is stored at
    /// `path`, or the lookup error explaining why the path does not resolve.
    pub fn unlink_strict(&mut self, precedence: Precedence, path: &KeyPath) -> AttrResult<Value> {
        if path.is_root() {
            return Err(AttributeError::missing(path.clone()));
        }
        self.layers.get(precedence).resolve(path)?;
        self.unlink(precedence, path)
            .ok_or_else(|| AttributeError::missing(path.clone()))
    }

    /// Append `value` to the sequence at `path`, returning its index.
    ///
    /// # Errors
    ///
    /// Fails when `path` does not resolve to a sequence.
    pub fn push(
        &mut self,
        precedence: Precedence,
        path: &KeyPath,
        value: impl Into<Value>,
    ) -> AttrResult<usize> {
        let stored = value.into();
        let layer = self.layers.get(precedence);
        let current = layer.resolve(path)?;
        if !current.is_seq() {
            return Err(AttributeError::mismatch(
                path.clone(),
                ValueKind::Seq,
                current,
            ));
        }
        self.cache.get_mut().invalidate(path);
        let index = self
            .layers
            .get_mut(precedence)
            .push(path, stored.clone())?;
        self.notify(ChangeEvent::set(precedence, path.child(index), stored));
        Ok(index)
    }

    /// Empty the container at `path` in one layer.
    ///
    /// # Errors
    ///
    /// Fails when `path` does not resolve to a container.
    pub fn clear_at(&mut self, precedence: Precedence, path: &KeyPath) -> AttrResult<()> {
        let current = self.layers.get(precedence).resolve(path)?;
        if !current.is_container() {
            return Err(AttributeError::mismatch(
                path.clone(),
                ValueKind::Map,
                current,
            ));
        }
        let empty = if current.is_seq() {
            Value::empty_seq()
        } else {
            Value::empty_map()
        };
        self.cache.get_mut().invalidate(path);
        self.layers.get_mut(precedence).clear(path)?;
        self.notify(ChangeEvent::set(precedence, path.clone(), empty));
        Ok(())
    }

    /// Create an empty map at `parent.segment` unless something is there.
    ///
    /// Returns the child path.
    pub(crate) fn vivify(
        &mut self,
        precedence: Precedence,
        parent: &KeyPath,
        segment: PathSegment,
    ) -> AttrResult<KeyPath> {
        let container = self.layers.get(precedence).resolve(parent)?;
        let exists = container.step(&segment, parent)?.is_some();
        let path = parent.child(segment);
        if !exists {
            self.write(precedence, &path, Value::empty_map())?;
        }
        Ok(path)
    }

    fn remove_from(&mut self, levels: &[Precedence], path: &KeyPath) {
        for level in levels {
            self.unlink(*level, path);
        }
    }

    /// Remove `path` from every layer, returning the merged value it had.
    pub fn rm(&mut self, path: &KeyPath) -> Option<Value> {
        let before = self.merged_at(path);
        self.remove_from(&Precedence::ORDER, path);
        before
    }

    /// Remove `path` from every default layer, returning the prior merge of
    /// the default group.
    pub fn rm_default(&mut self, path: &KeyPath) -> Option<Value> {
        let before = self.combined_default(path).map(ImmutableView::into_value);
        self.remove_from(&Precedence::DEFAULTS, path);
        before
    }

    /// Remove `path` from the normal layer, returning what was there.
    pub fn rm_normal(&mut self, path: &KeyPath) -> Option<Value> {
        self.unlink(Precedence::Normal, path)
    }

    /// Remove `path` from every override layer, returning the prior merge of
    /// the override group.
    pub fn rm_override(&mut self, path: &KeyPath) -> Option<Value> {
        let before = self.combined_override(path).map(ImmutableView::into_value);
        self.remove_from(&Precedence::OVERRIDES, path);
        before
    }

    /// Clear `path` from the default group, then write it to `force_default`.
    ///
    /// # Errors
    ///
    /// Fails as [`Attributes::write`] does; the group is left untouched when
    /// the write would fail.
    pub fn force_default(&mut self, path: &KeyPath, value: impl Into<Value>) -> AttrResult<()> {
        self.force(Precedence::DEFAULTS, Precedence::ForceDefault, path, value.into())
    }

    /// Clear `path` from the override group, then write it to
    /// `force_override`.
    ///
    /// # Errors
    ///
    /// Fails as [`Attributes::write`] does; the group is left untouched when
    /// the write would fail.
    pub fn force_override(&mut self, path: &KeyPath, value: impl Into<Value>) -> AttrResult<()> {
        self.force(Precedence::OVERRIDES, Precedence::ForceOverride, path, value.into())
    }

    fn force(
        &mut self,
        group: [Precedence; 4],
        target: Precedence,
        path: &KeyPath,
        value: Value,
    ) -> AttrResult<()> {
        // Clearing the target first may remove a scalar that blocks the path.
        let mut probe = self.layers.get(target).clone();
        probe.unlink(path);
        probe.check_write(path)?;
        self.remove_from(&group, path);
        self.write(target, path, value)
    }

    /// Write `value` to `default` unless that layer already defines `path`.
    ///
    /// Returns whether a write happened.
    ///
    /// # Errors
    ///
    /// Fails as [`Attributes::write`] does.
    pub fn default_unless(&mut self, path: &KeyPath, value: impl Into<Value>) -> AttrResult<bool> {
        self.write_unless(Precedence::Default, path, value.into())
    }

    /// Write `value` to `normal` unless that layer already defines `path`.
    ///
    /// # Errors
    ///
    /// Fails as [`Attributes::write`] does.
    pub fn normal_unless(&mut self, path: &KeyPath, value: impl Into<Value>) -> AttrResult<bool> {
        self.write_unless(Precedence::Normal, path, value.into())
    }

    /// Write `value` to `override` unless that layer already defines `path`.
    ///
    /// # Errors
    ///
    /// Fails as [`Attributes::write`] does.
    pub fn override_unless(&mut self, path: &KeyPath, value: impl Into<Value>) -> AttrResult<bool> {
        self.write_unless(Precedence::Override, path, value.into())
    }

    fn write_unless(&mut self, precedence: Precedence, path: &KeyPath, value: Value) -> AttrResult<bool> {
        if self.layers.get(precedence).lookup(path).is_some() {
            return Ok(false);
        }
        self.write(precedence, path, value)?;
        Ok(true)
    }

    /// Register the observer told about every successful write.
    pub fn set_observer(&mut self, observer: impl AttributeObserver + 'static) {
        self.observer = Some(Box::new(observer));
    }

    /// Remove the registered observer.
    pub fn clear_observer(&mut self) {
        self.observer = None;
    }

    fn notify(&self, event: ChangeEvent) {
        if let Some(observer) = &self.observer {
            observer.attribute_changed(&event);
        }
    }
}

impl Default for Attributes {
    fn default() -> Self {
        Self::new()
    }
}

/// Clones share layer storage; the copy starts with an empty cache and no
/// observer.
impl Clone for Attributes {
    fn clone(&self) -> Self {
        Self {
            layers: self.layers.clone(),
            cache: RefCell::new(MergeCache::new()),
            observer: None,
        }
    }
}

/// Equal when every layer holds structurally equal data.
impl PartialEq for Attributes {
    fn eq(&self, other: &Self) -> bool {
        self.layers == other.layers
    }
}

impl fmt::Debug for Attributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attributes")
            .field("layers", &self.layers)
            .field("cache", &self.cache_stats())
            .field("observer", &self.observer.is_some())
            .finish()
    }
}
