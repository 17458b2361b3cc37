//! Builders for fixtures shared by integration tests.

use anyhow::Result;
use node_attrs::{Attributes, Precedence};
use serde_json::json;

/// Attribute set with nested data spread over four layers.
///
/// The merged result is:
///
/// ```json
/// {"nginx": {"port": 8080, "workers": 4, "modules": ["ssl"]},
///  "ntp": {"servers": ["b.pool"]}, "hostname": "web01"}
/// ```
///
/// # Errors
///
/// Fails only if a fixture layer is rejected.
pub fn nested_fixture() -> Result<Attributes> {
    let mut attrs = Attributes::new();
    attrs.set_layer(
        Precedence::Default,
        json!({
            "nginx": {"port": 80, "workers": 2, "modules": ["gzip", "ssl"]},
            "ntp": {"servers": ["a.pool"]}
        }),
    )?;
    attrs.set_layer(
        Precedence::RoleDefault,
        json!({"nginx": {"workers": 4, "modules": ["ssl"]}}),
    )?;
    attrs.set_layer(
        Precedence::Override,
        json!({"nginx": {"port": 8080}, "ntp": {"servers": ["b.pool"]}}),
    )?;
    attrs.set_layer(Precedence::Automatic, json!({"hostname": "web01"}))?;
    Ok(attrs)
}

/// Stored form of a web node with every layer populated.
#[must_use]
pub fn web_node_json() -> serde_json::Value {
    json!({
        "name": "web01",
        "chef_environment": "production",
        "json_class": "Chef::Node",
        "chef_type": "node",
        "automatic": {"hostname": "web01", "platform": "debian"},
        "normal": {"tags": ["frontend"], "app": {"user": "www"}},
        "default": {"app": {"port": 80, "workers": 2}},
        "override": {"app": {"port": 8080}},
        "run_list": ["role[web]", "recipe[app@1.4.0]"]
    })
}
