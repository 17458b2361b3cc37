//! Copy-on-write sharing, snapshot immutability and cache freshness.

use anyhow::{Context, Result, ensure};
use node_attrs::{
    AttributeError, Attributes, ContainerView, ContainerWrite, Expansion, KeyPath, Node,
    Ownership, Precedence, Value,
};
use serde_json::json;
use test_helpers::nested_fixture;

fn path(raw: &str) -> KeyPath {
    KeyPath::dotted(raw).expect("valid dotted path")
}

#[test]
fn writes_never_reach_the_assigned_source() -> Result<()> {
    let source = Value::from(json!({"app": {"ports": [80, 443], "tls": {"on": true}}}));
    let mut attrs = Attributes::new();
    attrs.set_layer(Precedence::RoleDefault, source.clone())?;
    ensure!(attrs.ownership(Precedence::RoleDefault) == Ownership::Shared, "not shared");

    attrs.write(Precedence::RoleDefault, &path("app.tls.on"), false)?;
    attrs.push(Precedence::RoleDefault, &path("app.ports"), 8443)?;

    ensure!(attrs.ownership(Precedence::RoleDefault) == Ownership::Owned, "not detached");
    ensure!(
        source == json!({"app": {"ports": [80, 443], "tls": {"on": true}}}),
        "source changed: {source}"
    );
    ensure!(
        attrs.read(&path("app.ports")).context("ports")? == json!([80, 443, 8443]),
        "write lost"
    );
    Ok(())
}

#[test]
fn seeded_layers_detach_from_each_other() -> Result<()> {
    let mut attrs = nested_fixture()?;
    attrs.seed_layer(Precedence::ForceDefault, Precedence::Default);
    attrs.write(Precedence::ForceDefault, &path("nginx.port"), 1)?;
    let original = attrs.layer(Precedence::Default);
    ensure!(
        original.attr("nginx")?.attr("port")?.value() == &json!(80),
        "seed source was modified"
    );
    Ok(())
}

#[test]
fn role_defaults_shared_between_nodes_stay_independent() -> Result<()> {
    let expansion = Expansion {
        role_default: json!({"nginx": {"workers": 4, "modules": ["ssl"]}}).into(),
        ..Expansion::default()
    };
    let mut web = Node::new("web01");
    let mut api = Node::new("api01");
    web.apply_expansion(&expansion)?;
    api.apply_expansion(&expansion)?;

    web.attributes_mut()
        .layer_mut(Precedence::RoleDefault)
        .at("nginx")?
        .set("workers", 16)?;
    api.attributes_mut()
        .write(Precedence::RoleDefault, &path("nginx.modules.0"), "gzip")?;

    ensure!(
        web.attributes().to_plain() == json!({"nginx": {"workers": 16, "modules": ["ssl"]}}),
        "web: {}",
        web.attributes().to_plain()
    );
    ensure!(
        api.attributes().to_plain() == json!({"nginx": {"workers": 4, "modules": ["gzip"]}}),
        "api: {}",
        api.attributes().to_plain()
    );
    ensure!(
        expansion.role_default == json!({"nginx": {"workers": 4, "modules": ["ssl"]}}),
        "expansion changed"
    );
    Ok(())
}

#[test]
fn snapshots_do_not_change_after_writes() -> Result<()> {
    let mut attrs = nested_fixture()?;
    let before = attrs.read(&path("nginx")).context("nginx")?;
    attrs.write(Precedence::Automatic, &path("nginx.port"), 1)?;
    attrs.rm(&path("nginx.workers"));
    ensure!(before.attr("port")? == json!(8080), "snapshot port changed");
    ensure!(before.attr("workers")? == json!(4), "snapshot workers changed");
    let after = attrs.read(&path("nginx")).context("nginx")?;
    ensure!(after.attr("port")? == json!(1), "fresh read is stale");
    ensure!(!after.contains("workers"), "removed key still merged");
    Ok(())
}

#[test]
fn merged_views_refuse_writes() -> Result<()> {
    let attrs = nested_fixture()?;
    let mut merged = attrs.merged();
    let err = merged.set("x", 1).expect_err("merged view is read-only");
    ensure!(
        matches!(err, AttributeError::ImmutableModification { operation: "set", .. }),
        "got {err}"
    );
    let mut nginx = merged.attr("nginx")?;
    ensure!(nginx.clear().is_err(), "clear accepted");
    ensure!(nginx.remove("port").is_err(), "remove accepted");
    ensure!(attrs.to_plain()["nginx"]["port"] == json!(8080), "attributes changed");
    Ok(())
}

#[test]
fn cached_reads_see_every_write() -> Result<()> {
    let mut attrs = nested_fixture()?;
    let modules = path("nginx.modules");
    for round in 0..3_i64 {
        let _warm = attrs.merged();
        attrs.write(Precedence::ForceOverride, &modules, vec![round])?;
        ensure!(
            attrs.read(&modules).context("modules")? == json!([round]),
            "round {round} read stale data"
        );
        ensure!(
            attrs.merged().attr("nginx")?.attr("modules")? == json!([round]),
            "round {round} composite stale"
        );
    }
    ensure!(attrs.cache_stats().hits > 0, "cache never hit");
    Ok(())
}

#[test]
fn replacing_a_layer_invalidates_everything() -> Result<()> {
    let mut attrs = nested_fixture()?;
    let _warm = attrs.read(&path("ntp.servers"));
    attrs.set_layer(Precedence::Override, json!({}))?;
    ensure!(
        attrs.read(&path("ntp.servers")).context("servers")? == json!(["a.pool"]),
        "stale after layer replacement"
    );
    Ok(())
}
