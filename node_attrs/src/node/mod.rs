//! Nodes: an identity, a run list and one attribute set.
//!
//! A [`Node`] owns its [`Attributes`] exclusively. Data enters a node in
//! three ways: loading a stored [`NodeDocument`], consuming JSON attributes
//! supplied at the start of a run, and applying the attribute layers of the
//! node's environment and roles. Layers assigned from outside share their
//! storage with the source until the node writes to them.

mod document;
mod run_list;

pub use document::{DEFAULT_ENVIRONMENT, Expansion, NodeDocument};
pub use run_list::{RunList, RunListItem, RunListKind};

use tracing::{debug, info};

use crate::attributes::Attributes;
use crate::key::KeyPath;
use crate::precedence::Precedence;
use crate::result_ext::AttrResultExt;
use crate::value::{AttrMap, Value, ValueKind};
use crate::{AttrResult, AttributeError};

const RUN_LIST_KEY: &str = "run_list";
const RECIPES_KEY: &str = "recipes";
const ENVIRONMENT_KEY: &str = "chef_environment";
const TAGS_KEY: &str = "tags";

/// A managed host and its attributes.
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    name: String,
    chef_environment: String,
    run_list: RunList,
    attributes: Attributes,
}

impl Node {
    /// A node in the default environment with no attributes.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            chef_environment: DEFAULT_ENVIRONMENT.to_owned(),
            run_list: RunList::new(),
            attributes: Attributes::new(),
        }
    }

    /// Node name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Environment the node belongs to.
    #[must_use]
    pub fn chef_environment(&self) -> &str {
        &self.chef_environment
    }

    /// Move the node to another environment.
    pub fn set_chef_environment(&mut self, environment: impl Into<String>) {
        self.chef_environment = environment.into();
    }

    /// The run list.
    #[must_use]
    pub const fn run_list(&self) -> &RunList {
        &self.run_list
    }

    /// Mutable access to the run list.
    pub const fn run_list_mut(&mut self) -> &mut RunList {
        &mut self.run_list
    }

    /// The attribute set.
    #[must_use]
    pub const fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Mutable access to the attribute set.
    pub const fn attributes_mut(&mut self) -> &mut Attributes {
        &mut self.attributes
    }

    /// Build a node from its stored form.
    ///
    /// Layers are taken by reference. Legacy `attributes` fill `normal` when
    /// `normal` is empty, and legacy `recipes` fill the run list when
    /// `run_list` is empty.
    ///
    /// # Errors
    ///
    /// Returns [`AttributeError::TypeMismatch`] when a layer is not a map.
    pub fn from_document(document: NodeDocument) -> AttrResult<Self> {
        let NodeDocument {
            name,
            chef_environment,
            automatic,
            normal,
            default,
            r#override,
            run_list,
            attributes,
            recipes,
            ..
        } = document;
        let mut node = Self::new(name);
        node.chef_environment = chef_environment;
        let persistent = match attributes {
            Some(legacy) if normal.is_empty() => legacy,
            _ => normal,
        };
        let layers = [
            (Precedence::Automatic, automatic),
            (Precedence::Normal, persistent),
            (Precedence::Default, default),
            (Precedence::Override, r#override),
        ];
        for (precedence, value) in layers {
            node.attributes.set_layer(precedence, value)?;
        }
        node.run_list = match recipes {
            Some(legacy) if run_list.is_empty() => legacy,
            _ => run_list,
        };
        debug!(node = %node.name, run_list = %node.run_list, "node loaded");
        Ok(node)
    }

    /// The stored form of this node, sharing layer storage.
    #[must_use]
    pub fn to_document(&self) -> NodeDocument {
        let layer = |precedence| self.attributes.layer(precedence).value().clone();
        NodeDocument {
            name: self.name.clone(),
            chef_environment: self.chef_environment.clone(),
            automatic: layer(Precedence::Automatic),
            normal: layer(Precedence::Normal),
            default: layer(Precedence::Default),
            r#override: layer(Precedence::Override),
            run_list: self.run_list.clone(),
            ..NodeDocument::default()
        }
    }

    /// Parse a node from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`AttributeError::Json`] for malformed JSON and the errors of
    /// [`Node::from_document`] otherwise.
    pub fn from_json_str(text: &str) -> AttrResult<Self> {
        Self::from_document(serde_json::from_str(text)?)
    }

    /// The stored form of this node as plain JSON.
    ///
    /// # Errors
    ///
    /// Returns [`AttributeError::Json`] if serialisation fails.
    pub fn to_json_value(&self) -> AttrResult<serde_json::Value> {
        serde_json::to_value(self.to_document()).into_attr()
    }

    /// Apply JSON attributes supplied for a run.
    ///
    /// `run_list` (or the legacy `recipes`) replaces the run list and
    /// `chef_environment` moves the node; everything else is deep-merged
    /// into the `normal` layer.
    ///
    /// # Errors
    ///
    /// Returns [`AttributeError::AmbiguousRunList`] when both `run_list`
    /// and `recipes` are present, [`AttributeError::TypeMismatch`] when
    /// `attrs` is not a map, and [`AttributeError::InvalidRunListItem`] for a
    /// malformed entry. Nothing changes on error.
    pub fn consume_attributes(&mut self, attrs: impl Into<Value>) -> AttrResult<()> {
        let incoming = attrs.into();
        let mut remainder: AttrMap = match &incoming {
            Value::Null => AttrMap::new(),
            Value::Map(map) => map.as_ref().clone(),
            other => {
                return Err(AttributeError::mismatch(KeyPath::root(), ValueKind::Map, other));
            }
        };
        if remainder.contains_key(RUN_LIST_KEY) && remainder.contains_key(RECIPES_KEY) {
            return Err(AttributeError::AmbiguousRunList);
        }
        let run_list = remainder
            .shift_remove(RUN_LIST_KEY)
            .or_else(|| remainder.shift_remove(RECIPES_KEY))
            .map(|entries| parse_run_list(&entries))
            .transpose()?;
        let environment = remainder.shift_remove(ENVIRONMENT_KEY);

        if let Some(list) = run_list {
            info!(node = %self.name, run_list = %list, "setting run list from attributes");
            self.run_list = list;
        }
        if let Some(env) = environment.as_ref().and_then(Value::as_str) {
            self.chef_environment = env.to_owned();
        }
        debug!(node = %self.name, keys = remainder.len(), "applying attributes");
        let mut normal = self.attributes.layer(Precedence::Normal).value().clone();
        normal.deep_merge(Value::from(remainder));
        self.attributes.set_layer(Precedence::Normal, normal)?;
        self.tags()?;
        Ok(())
    }

    /// Apply run attributes, then install discovered system facts.
    ///
    /// The automatic layer takes `system` by reference.
    ///
    /// # Errors
    ///
    /// Fails as [`Node::consume_attributes`] does, or with
    /// [`AttributeError::TypeMismatch`] when `system` is not a map. On error
    /// nothing has changed.
    pub fn consume_external_attrs(
        &mut self,
        system: impl Into<Value>,
        json: impl Into<Value>,
    ) -> AttrResult<()> {
        let facts = system.into();
        if !(facts.is_map() || facts.is_null()) {
            return Err(AttributeError::mismatch(KeyPath::root(), ValueKind::Map, &facts));
        }
        self.consume_attributes(json)?;
        self.attributes.set_layer(Precedence::Automatic, facts)?;
        debug!(node = %self.name, "automatic attributes replaced");
        Ok(())
    }

    /// Seed the environment and role layers from an expansion.
    ///
    /// # Errors
    ///
    /// Returns [`AttributeError::TypeMismatch`] when a layer is not a map;
    /// layers are validated before any is replaced.
    pub fn apply_expansion(&mut self, expansion: &Expansion) -> AttrResult<()> {
        let layers = [
            (Precedence::EnvDefault, &expansion.env_default),
            (Precedence::EnvOverride, &expansion.env_override),
            (Precedence::RoleDefault, &expansion.role_default),
            (Precedence::RoleOverride, &expansion.role_override),
        ];
        if let Some((_, bad)) = layers
            .iter()
            .find(|(_, value)| !(value.is_map() || value.is_null()))
        {
            return Err(AttributeError::mismatch(KeyPath::root(), ValueKind::Map, bad));
        }
        for (precedence, value) in layers {
            self.attributes.set_layer(precedence, value.clone())?;
        }
        debug!(node = %self.name, "expansion attributes applied");
        Ok(())
    }

    /// Empty the `default` and `override` layers before recipes recompute
    /// them.
    pub fn reset_defaults_and_overrides(&mut self) {
        self.attributes.reset_layer(Precedence::Default);
        self.attributes.reset_layer(Precedence::Override);
    }

    /// The node's tags, creating an empty `normal.tags` list if needed.
    ///
    /// A scalar stored at `tags` is wrapped into a one-element list.
    ///
    /// # Errors
    ///
    /// Fails only if the normal layer cannot hold `tags`.
    pub fn tags(&mut self) -> AttrResult<Vec<String>> {
        let path = KeyPath::from([TAGS_KEY]);
        let current = self
            .attributes
            .layer(Precedence::Normal)
            .value()
            .pointer(&path)
            .cloned();
        let tags = match current {
            Some(list @ Value::Seq(_)) => list,
            None | Some(Value::Null) => {
                let empty = Value::empty_seq();
                self.attributes.write(Precedence::Normal, &path, empty.clone())?;
                empty
            }
            Some(scalar) => {
                let wrapped = Value::from(vec![scalar]);
                self.attributes.write(Precedence::Normal, &path, wrapped.clone())?;
                wrapped
            }
        };
        Ok(tags
            .as_seq()
            .unwrap_or_default()
            .iter()
            .filter_map(|tag| tag.as_str().map(str::to_owned))
            .collect())
    }

    /// Add `tag` to the node unless it is already present. Returns whether
    /// it was added.
    ///
    /// # Errors
    ///
    /// Fails as [`Node::tags`] does.
    pub fn tag(&mut self, tag: &str) -> AttrResult<bool> {
        if self.tags()?.iter().any(|existing| existing == tag) {
            return Ok(false);
        }
        self.attributes
            .push(Precedence::Normal, &KeyPath::from([TAGS_KEY]), tag)?;
        Ok(true)
    }
}

fn parse_run_list(entries: &Value) -> AttrResult<RunList> {
    match entries {
        Value::Seq(items) => {
            let mut list = RunList::new();
            for item in items.iter() {
                let text = item.as_str().ok_or_else(|| AttributeError::InvalidRunListItem {
                    item: item.to_string(),
                })?;
                list.push(text.parse()?);
            }
            Ok(list)
        }
        Value::String(single) => RunList::parse([single]),
        other => Err(AttributeError::mismatch(
            KeyPath::from([RUN_LIST_KEY]),
            ValueKind::Seq,
            other,
        )),
    }
}

#[cfg(test)]
mod tests;
