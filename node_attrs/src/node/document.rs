//! Serialised form of a node and of role/environment expansions.

use serde::{Deserialize, Serialize};

use crate::value::Value;

use super::RunList;

/// Environment assigned to nodes that do not name one.
pub const DEFAULT_ENVIRONMENT: &str = "_default";

fn default_environment() -> String {
    DEFAULT_ENVIRONMENT.to_owned()
}

fn default_json_class() -> String {
    "Chef::Node".to_owned()
}

fn default_chef_type() -> String {
    "node".to_owned()
}

/// A node as stored on disk or sent over the wire.
///
/// Layers that are absent deserialise as `null` and load as empty maps.
/// `attributes` is the legacy spelling of `normal`; `recipes` is the legacy
/// spelling of `run_list`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeDocument {
    /// Node name.
    #[serde(default)]
    pub name: String,
    /// Environment the node belongs to.
    #[serde(default = "default_environment")]
    pub chef_environment: String,
    /// Type tag written for compatibility with existing stores.
    #[serde(default = "default_json_class")]
    pub json_class: String,
    /// Object kind written for compatibility with existing stores.
    #[serde(default = "default_chef_type")]
    pub chef_type: String,
    /// Discovered system facts.
    #[serde(default)]
    pub automatic: Value,
    /// Persistent node-level attributes.
    #[serde(default)]
    pub normal: Value,
    /// Cookbook defaults.
    #[serde(default)]
    pub default: Value,
    /// Cookbook overrides.
    #[serde(default, rename = "override")]
    pub r#override: Value,
    /// Recipes and roles to apply.
    #[serde(default)]
    pub run_list: RunList,
    /// Legacy name for `normal`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Value>,
    /// Legacy name for `run_list`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipes: Option<RunList>,
}

impl Default for NodeDocument {
    fn default() -> Self {
        Self {
            name: String::new(),
            chef_environment: default_environment(),
            json_class: default_json_class(),
            chef_type: default_chef_type(),
            automatic: Value::empty_map(),
            normal: Value::empty_map(),
            default: Value::empty_map(),
            r#override: Value::empty_map(),
            run_list: RunList::new(),
            attributes: None,
            recipes: None,
        }
    }
}

/// Attributes contributed by the node's environment and expanded roles.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Expansion {
    /// Environment default attributes.
    pub env_default: Value,
    /// Environment override attributes.
    pub env_override: Value,
    /// Merged default attributes of every expanded role.
    pub role_default: Value,
    /// Merged override attributes of every expanded role.
    pub role_override: Value,
}
