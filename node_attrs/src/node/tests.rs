//! Unit tests for nodes and their stored form.

use anyhow::{Result, ensure};
use rstest::rstest;
use serde_json::json;

use super::{DEFAULT_ENVIRONMENT, Expansion, Node, NodeDocument, RunListItem};
use crate::AttributeError;
use crate::key::KeyPath;
use crate::layer::Ownership;
use crate::precedence::Precedence;
use crate::value::Value;

fn path(raw: &str) -> KeyPath {
    KeyPath::dotted(raw).expect("valid dotted path")
}

#[test]
fn new_nodes_start_in_the_default_environment() {
    let node = Node::new("web01");
    assert_eq!(node.name(), "web01");
    assert_eq!(node.chef_environment(), DEFAULT_ENVIRONMENT);
    assert!(node.run_list().is_empty());
    assert_eq!(node.attributes().to_plain(), json!({}));
}

#[test]
fn documents_load_layers_and_run_list() -> Result<()> {
    let node = Node::from_json_str(
        r#"{
            "name": "db01",
            "chef_environment": "production",
            "automatic": {"platform": "debian"},
            "normal": {"tags": ["db"]},
            "default": {"port": 5432},
            "override": {"port": 6432},
            "run_list": ["recipe[postgres@1.0]", "role[base]"]
        }"#,
    )?;
    ensure!(node.chef_environment() == "production", "environment");
    ensure!(node.run_list().len() == 2, "run list length");
    ensure!(
        node.attributes().to_plain()
            == json!({"platform": "debian", "tags": ["db"], "port": 6432}),
        "merged: {}",
        node.attributes().to_plain()
    );
    Ok(())
}

#[test]
fn legacy_fields_fill_empty_slots() -> Result<()> {
    let node = Node::from_json_str(
        r#"{"name": "old", "attributes": {"a": 1}, "recipes": ["ntp"]}"#,
    )?;
    ensure!(node.attributes().layer(Precedence::Normal).value() == &json!({"a": 1}), "normal");
    ensure!(node.run_list().contains("recipe[ntp]"), "recipes");
    Ok(())
}

#[test]
fn legacy_fields_do_not_replace_modern_ones() -> Result<()> {
    let node = Node::from_json_str(
        r#"{"normal": {"b": 2}, "attributes": {"a": 1},
            "run_list": ["role[r]"], "recipes": ["ntp"]}"#,
    )?;
    ensure!(node.attributes().layer(Precedence::Normal).value() == &json!({"b": 2}), "normal");
    ensure!(node.run_list().roles().eq(["r"]), "run list");
    ensure!(node.run_list().recipes().next().is_none(), "legacy recipes ignored");
    Ok(())
}

#[test]
fn scalar_layers_are_rejected() {
    let err = Node::from_json_str(r#"{"default": 3}"#).expect_err("scalar layer");
    assert!(matches!(err, AttributeError::TypeMismatch { .. }));
}

#[test]
fn malformed_json_is_reported() {
    let err = Node::from_json_str("{").expect_err("truncated json");
    assert!(matches!(err, AttributeError::Json(_)));
}

#[test]
fn stored_form_round_trips() -> Result<()> {
    let mut node = Node::new("app");
    node.set_chef_environment("staging");
    node.run_list_mut().push(RunListItem::role("app"));
    node.attributes_mut()
        .write(Precedence::Default, &path("app.port"), 8080)?;
    let stored = node.to_json_value()?;
    ensure!(stored["json_class"] == json!("Chef::Node"), "json_class");
    ensure!(stored["chef_type"] == json!("node"), "chef_type");
    ensure!(stored["run_list"] == json!(["role[app]"]), "run_list");
    ensure!(stored.get("attributes").is_none(), "legacy fields are omitted");
    let reloaded = Node::from_json_str(&stored.to_string())?;
    ensure!(reloaded == node, "reloaded node differs");
    Ok(())
}

#[test]
fn stored_form_shares_layer_storage() {
    let mut node = Node::new("n");
    node.attributes_mut()
        .set_layer(Precedence::Normal, json!({"a": {"b": 1}}))
        .expect("normal layer");
    let document = node.to_document();
    assert!(
        document
            .normal
            .shares_storage_with(node.attributes().layer(Precedence::Normal).value())
    );
    assert_eq!(node.attributes().ownership(Precedence::Normal), Ownership::Shared);
}

#[test]
fn consumed_attributes_merge_into_normal() -> Result<()> {
    let mut node = Node::new("n");
    node.attributes_mut()
        .set_layer(Precedence::Normal, json!({"app": {"user": "www", "ports": [80]}}))?;
    node.consume_attributes(json!({
        "app": {"ports": [443], "debug": true},
        "run_list": ["recipe[app]"],
        "chef_environment": "qa"
    }))?;
    ensure!(node.chef_environment() == "qa", "environment");
    ensure!(node.run_list().recipes().eq(["app"]), "run list");
    ensure!(
        node.attributes().layer(Precedence::Normal).value()
            == &json!({"app": {"user": "www", "ports": [443], "debug": true}, "tags": []}),
        "normal: {}",
        node.attributes().layer(Precedence::Normal).value()
    );
    Ok(())
}

#[test]
fn run_list_and_recipes_together_are_ambiguous() {
    let mut node = Node::new("n");
    let err = node
        .consume_attributes(json!({"run_list": ["a"], "recipes": ["b"], "x": 1}))
        .expect_err("ambiguous");
    assert!(matches!(err, AttributeError::AmbiguousRunList));
    assert_eq!(node.attributes().to_plain(), json!({}));
}

#[rstest]
#[case(json!({"run_list": ["widget[x]"]}))]
#[case(json!({"recipes": [1]}))]
#[case(json!({"run_list": {"a": 1}}))]
fn bad_run_lists_leave_the_node_unchanged(#[case] attrs: serde_json::Value) {
    let mut node = Node::new("n");
    assert!(node.consume_attributes(attrs).is_err());
    assert!(node.run_list().is_empty());
    assert_eq!(node.attributes().to_plain(), json!({}));
}

#[test]
fn a_single_recipe_string_is_accepted() -> Result<()> {
    let mut node = Node::new("n");
    node.consume_attributes(json!({"recipes": "ntp"}))?;
    ensure!(node.run_list().recipes().eq(["ntp"]), "run list");
    Ok(())
}

#[test]
fn external_attributes_set_automatic_by_reference() -> Result<()> {
    let facts = Value::from(json!({"os": "linux", "cpu": {"total": 4}}));
    let mut node = Node::new("n");
    node.consume_external_attrs(facts.clone(), json!({"role": "web"}))?;
    let automatic = node.attributes().layer(Precedence::Automatic);
    ensure!(automatic.value().shares_storage_with(&facts), "automatic copied");
    ensure!(node.attributes().read(&path("role")).is_some(), "normal applied");
    ensure!(node.attributes().read(&path("cpu.total")).expect("cpu") == json!(4), "facts");
    Ok(())
}

#[test]
fn external_scalar_facts_are_rejected() {
    let mut node = Node::new("n");
    let err = node
        .consume_external_attrs(json!("linux"), json!({"a": 1}))
        .expect_err("scalar facts");
    assert!(matches!(err, AttributeError::TypeMismatch { .. }));
    assert_eq!(node.attributes().to_plain(), json!({}));
}

#[test]
fn expansion_layers_are_shared_until_written() -> Result<()> {
    let expansion = Expansion {
        role_default: json!({"nginx": {"workers": 4}}).into(),
        env_override: json!({"nginx": {"workers": 8}}).into(),
        ..Expansion::default()
    };
    let mut first = Node::new("a");
    let mut second = Node::new("b");
    first.apply_expansion(&expansion)?;
    second.apply_expansion(&expansion)?;
    ensure!(
        first.attributes().ownership(Precedence::RoleDefault) == Ownership::Shared,
        "role defaults shared"
    );
    first
        .attributes_mut()
        .write(Precedence::RoleDefault, &path("nginx.workers"), 2)?;
    ensure!(
        second
            .attributes()
            .layer(Precedence::RoleDefault)
            .value()
            .pointer(&path("nginx.workers"))
            == Some(&Value::from(4)),
        "write leaked into the other node"
    );
    ensure!(expansion.role_default == json!({"nginx": {"workers": 4}}), "source mutated");
    ensure!(first.attributes().read(&path("nginx.workers")).expect("workers") == json!(8), "env override wins");
    Ok(())
}

#[test]
fn invalid_expansions_change_nothing() {
    let expansion = Expansion {
        env_default: json!({"a": 1}).into(),
        role_override: json!([1]).into(),
        ..Expansion::default()
    };
    let mut node = Node::new("n");
    assert!(node.apply_expansion(&expansion).is_err());
    assert_eq!(node.attributes().to_plain(), json!({}));
}

#[test]
fn reset_clears_only_cookbook_layers() -> Result<()> {
    let mut node = Node::new("n");
    let key = path("k");
    for level in [Precedence::Default, Precedence::Override, Precedence::RoleDefault, Precedence::Normal] {
        node.attributes_mut().write(level, &key, level.as_str())?;
    }
    node.reset_defaults_and_overrides();
    ensure!(node.attributes().layer(Precedence::Default).value().is_empty(), "default");
    ensure!(node.attributes().layer(Precedence::Override).value().is_empty(), "override");
    ensure!(!node.attributes().layer(Precedence::RoleDefault).value().is_empty(), "role default");
    ensure!(node.attributes().read(&key).expect("k") == json!("normal"), "normal");
    Ok(())
}

#[rstest]
#[case(json!({}), &[])]
#[case(json!({"tags": ["a", "b"]}), &["a", "b"])]
#[case(json!({"tags": "solo"}), &["solo"])]
#[case(json!({"tags": null}), &[])]
fn tags_are_normalised_to_a_list(
    #[case] normal: serde_json::Value,
    #[case] expected: &[&str],
) -> Result<()> {
    let mut node = Node::new("n");
    node.attributes_mut().set_layer(Precedence::Normal, normal)?;
    ensure!(node.tags()? == expected, "tags");
    ensure!(
        node.attributes()
            .layer(Precedence::Normal)
            .value()
            .pointer(&path("tags"))
            .is_some_and(Value::is_seq),
        "tags stored as a list"
    );
    Ok(())
}

#[test]
fn tagging_is_idempotent() -> Result<()> {
    let mut node = Node::new("n");
    ensure!(node.tag("web")?, "first tag added");
    ensure!(!node.tag("web")?, "duplicate tag ignored");
    ensure!(node.tags()? == ["web"], "tags");
    Ok(())
}

#[test]
fn documents_default_missing_fields() -> Result<()> {
    let document: NodeDocument = serde_json::from_str("{}")?;
    ensure!(document.chef_environment == DEFAULT_ENVIRONMENT, "environment");
    ensure!(document.normal.is_null(), "absent layers are null");
    let node = Node::from_document(document)?;
    ensure!(node.attributes().layer(Precedence::Normal).value() == &json!({}), "empty layer");
    Ok(())
}
