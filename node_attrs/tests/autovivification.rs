//! Autovivifying writes and the change events they emit.

use anyhow::{Context, Result, ensure};
use node_attrs::{
    AttributeError, Attributes, ChangeEvent, ContainerView, ContainerWrite, KeyPath, Precedence,
    Value,
};
use serde_json::json;
use test_helpers::RecordingObserver;

fn observed() -> (Attributes, RecordingObserver) {
    let recorder = RecordingObserver::default();
    let mut attrs = Attributes::new();
    attrs.set_observer(recorder.clone());
    (attrs, recorder)
}

#[test]
fn chained_navigation_creates_each_missing_map() -> Result<()> {
    let (mut attrs, recorder) = observed();
    attrs
        .default_mut()
        .at("php")?
        .at("fpm")?
        .set("max_children", 10)?;
    ensure!(
        attrs.to_plain() == json!({"php": {"fpm": {"max_children": 10}}}),
        "merged: {}",
        attrs.to_plain()
    );
    ensure!(
        recorder.paths() == ["php", "php.fpm", "php.fpm.max_children"],
        "paths {:?}",
        recorder.paths()
    );
    ensure!(
        recorder.layers().iter().all(|layer| *layer == Precedence::Default),
        "events on the wrong layer"
    );
    Ok(())
}

#[test]
fn navigating_existing_maps_is_silent() -> Result<()> {
    let (mut attrs, recorder) = observed();
    attrs.write(Precedence::Normal, &KeyPath::from(["a", "b"]), 1)?;
    recorder.take();
    let view = attrs.normal_mut().at("a")?;
    ensure!(view.contains("b"), "existing data lost");
    ensure!(recorder.is_empty(), "navigation emitted {:?}", recorder.events());
    Ok(())
}

#[test]
fn events_carry_the_stored_value() -> Result<()> {
    let (mut attrs, recorder) = observed();
    let key = KeyPath::from(["ntp", "servers"]);
    attrs.write(Precedence::Override, &key, json!(["a"]))?;
    attrs.push(Precedence::Override, &key, "b")?;
    attrs.unlink(Precedence::Override, &key).context("servers present")?;
    let events = recorder.events();
    ensure!(
        events
            == [
                ChangeEvent::set(Precedence::Override, key.clone(), Value::from(json!(["a"]))),
                ChangeEvent::set(Precedence::Override, key.child(1_usize), Value::from("b")),
                ChangeEvent::removed(Precedence::Override, key.clone()),
            ],
        "events {events:?}"
    );
    Ok(())
}

#[test]
fn failed_writes_change_nothing_and_stay_silent() -> Result<()> {
    let (mut attrs, recorder) = observed();
    attrs.write(Precedence::Normal, &KeyPath::from(["name"]), "web")?;
    recorder.take();

    let err = attrs
        .write(Precedence::Normal, &KeyPath::from(["name", "first"]), "x")
        .expect_err("write through a scalar");
    ensure!(matches!(err, AttributeError::TypeMismatch { .. }), "got {err}");

    let err = attrs
        .normal_mut()
        .at("name")?
        .at("first")
        .expect_err("navigate through a scalar");
    ensure!(matches!(err, AttributeError::TypeMismatch { .. }), "got {err}");

    ensure!(attrs.to_plain() == json!({"name": "web"}), "layer changed");
    ensure!(recorder.is_empty(), "failed writes emitted {:?}", recorder.events());
    Ok(())
}

#[test]
fn sequence_slots_are_never_vivified() -> Result<()> {
    let (mut attrs, recorder) = observed();
    attrs.write(Precedence::Normal, &KeyPath::from(["list"]), json!([]))?;
    recorder.take();
    let err = attrs
        .write(Precedence::Normal, &KeyPath::from(["list"]).child(3_usize), 1)
        .expect_err("index past the end");
    ensure!(matches!(err, AttributeError::OutOfRange { index: 3, len: 0, .. }), "got {err}");
    ensure!(recorder.is_empty(), "events {:?}", recorder.events());
    Ok(())
}

#[test]
fn observers_can_be_removed() -> Result<()> {
    let (mut attrs, recorder) = observed();
    attrs.clear_observer();
    attrs.write(Precedence::Normal, &KeyPath::from(["a"]), 1)?;
    ensure!(recorder.is_empty(), "observer still installed");
    Ok(())
}
