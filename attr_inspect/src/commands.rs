//! Command implementations.

use std::io::Write;

use camino::Utf8Path;
use node_attrs::file::load_node_file;
use node_attrs::{KeyPath, Node, Value};
use tracing::debug;

use crate::cli::{Command, SetArgs, ShowArgs, TraceArgs};
use crate::config::Settings;
use crate::error::{InspectError, Result};

/// Run `command`, writing its output to `out`.
///
/// # Errors
///
/// Returns an [`InspectError`] when the node cannot be loaded, a path does
/// not resolve, the write is rejected, or output fails.
pub fn run(command: &Command, settings: &Settings, out: &mut impl Write) -> Result<()> {
    match command {
        Command::Show(args) => show(args, settings, out),
        Command::Trace(args) => trace(args, settings, out),
        Command::Set(args) => set(args, settings, out),
    }
}

fn load(path: &Utf8Path) -> Result<Node> {
    load_node_file(path.as_std_path())?.ok_or_else(|| InspectError::NodeNotFound(path.to_owned()))
}

fn parse_path(raw: Option<&str>) -> Result<KeyPath> {
    Ok(KeyPath::dotted(raw.unwrap_or_default())?)
}

fn emit(out: &mut impl Write, settings: &Settings, value: &serde_json::Value) -> Result<()> {
    if settings.pretty {
        serde_json::to_writer_pretty(&mut *out, value)?;
    } else {
        serde_json::to_writer(&mut *out, value)?;
    }
    writeln!(out)?;
    Ok(())
}

fn show(args: &ShowArgs, settings: &Settings, out: &mut impl Write) -> Result<()> {
    let node = load(&args.node)?;
    let path = parse_path(args.path.as_deref())?;
    let value = match args.layer {
        Some(precedence) => node
            .attributes()
            .layer(precedence)
            .value()
            .pointer(&path)
            .map(Value::to_plain),
        None => node.attributes().read(&path).map(|view| view.value().to_plain()),
    };
    let found = value.ok_or_else(|| InspectError::NoValue(path.to_string()))?;
    emit(out, settings, &found)
}

fn trace(args: &TraceArgs, settings: &Settings, out: &mut impl Write) -> Result<()> {
    let node = load(&args.node)?;
    let path = parse_path(Some(&args.path))?;
    let mut report = serde_json::Map::new();
    for (precedence, value) in node.attributes().debug_value(&path) {
        if let Some(defined) = value {
            report.insert(precedence.as_str().to_owned(), defined.to_plain());
        }
    }
    let merged = node
        .attributes()
        .read(&path)
        .map_or(serde_json::Value::Null, |view| view.value().to_plain());
    report.insert("merged".to_owned(), merged);
    emit(out, settings, &serde_json::Value::Object(report))
}

fn set(args: &SetArgs, settings: &Settings, out: &mut impl Write) -> Result<()> {
    let mut node = load(&args.node)?;
    let path = parse_path(Some(&args.path))?;
    let layer = args.layer.unwrap_or(settings.default_layer);
    let value = parse_value(&args.value);
    debug!(%path, %layer, "writing attribute");
    node.attributes_mut().write(layer, &path, value)?;
    let document = node.to_json_value()?;
    match &args.output {
        Some(target) => {
            let mut file = std::fs::File::create(target)?;
            emit(&mut file, settings, &document)
        }
        None => emit(out, settings, &document),
    }
}

/// JSON when `raw` parses as JSON, otherwise the literal string.
fn parse_value(raw: &str) -> Value {
    serde_json::from_str::<serde_json::Value>(raw).map_or_else(|_| Value::from(raw), Value::from)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use anyhow::{Context, Result, ensure};
    use camino::Utf8PathBuf;
    use rstest::rstest;
    use serde_json::json;
    use tempfile::TempDir;

    use super::{parse_value, run};
    use crate::cli::{Command, SetArgs, ShowArgs, TraceArgs};
    use crate::config::Settings;
    use crate::error::InspectError;

    fn compact() -> Settings {
        Settings {
            pretty: false,
            ..Settings::default()
        }
    }

    fn node_file(dir: &TempDir) -> Result<Utf8PathBuf> {
        let path = Utf8PathBuf::from_path_buf(dir.path().join("web.json"))
            .map_err(|p| anyhow::anyhow!("non-UTF-8 path {}", p.display()))?;
        fs::write(
            &path,
            json!({
                "name": "web",
                "default": {"app": {"port": 80, "workers": 2}},
                "override": {"app": {"port": 8080}}
            })
            .to_string(),
        )?;
        Ok(path)
    }

    fn output(command: &Command, settings: &Settings) -> Result<serde_json::Value> {
        let mut buffer = Vec::new();
        run(command, settings, &mut buffer)?;
        serde_json::from_slice(&buffer).context("output is JSON")
    }

    #[rstest]
    #[case("1", json!(1))]
    #[case("[1, 2]", json!([1, 2]))]
    #[case("plain text", json!("plain text"))]
    #[case("\"quoted\"", json!("quoted"))]
    fn values_parse_as_json_or_text(#[case] raw: &str, #[case] expected: serde_json::Value) {
        assert_eq!(parse_value(raw), expected);
    }

    #[test]
    fn show_prints_merged_or_layer_data() -> Result<()> {
        let dir = TempDir::new()?;
        let node = node_file(&dir)?;
        let merged = output(
            &Command::Show(ShowArgs {
                node: node.clone(),
                path: Some("app".to_owned()),
                layer: None,
            }),
            &compact(),
        )?;
        ensure!(merged == json!({"port": 8080, "workers": 2}), "merged {merged}");
        let layer = output(
            &Command::Show(ShowArgs {
                node,
                path: Some("app.port".to_owned()),
                layer: Some(node_attrs::Precedence::Default),
            }),
            &compact(),
        )?;
        ensure!(layer == json!(80), "layer {layer}");
        Ok(())
    }

    #[test]
    fn trace_lists_defining_layers() -> Result<()> {
        let dir = TempDir::new()?;
        let report = output(
            &Command::Trace(TraceArgs {
                node: node_file(&dir)?,
                path: "app.port".to_owned(),
            }),
            &compact(),
        )?;
        ensure!(
            report == json!({"default": 80, "override": 8080, "merged": 8080}),
            "report {report}"
        );
        Ok(())
    }

    #[test]
    fn set_writes_the_configured_layer() -> Result<()> {
        let dir = TempDir::new()?;
        let document = output(
            &Command::Set(SetArgs {
                node: node_file(&dir)?,
                layer: None,
                path: "app.user".to_owned(),
                value: "www".to_owned(),
                output: None,
            }),
            &compact(),
        )?;
        ensure!(document["normal"] == json!({"app": {"user": "www"}}), "doc {document}");
        Ok(())
    }

    #[test]
    fn missing_nodes_and_paths_are_reported() -> Result<()> {
        let dir = TempDir::new()?;
        let mut sink = Vec::new();
        let absent = Command::Show(ShowArgs {
            node: Utf8PathBuf::from("/nonexistent/node.json"),
            path: None,
            layer: None,
        });
        let err = run(&absent, &compact(), &mut sink).expect_err("missing node");
        ensure!(matches!(err, InspectError::NodeNotFound(_)), "got {err}");

        let unknown = Command::Show(ShowArgs {
            node: node_file(&dir)?,
            path: Some("nope".to_owned()),
            layer: None,
        });
        let err = run(&unknown, &compact(), &mut sink).expect_err("missing path");
        ensure!(matches!(err, InspectError::NoValue(_)), "got {err}");
        Ok(())
    }
}
