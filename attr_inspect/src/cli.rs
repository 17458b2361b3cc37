//! Command-line interface definitions for `attr-inspect`.

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use node_attrs::Precedence;

/// Parsed CLI arguments for `attr-inspect`.
#[derive(Debug, Parser)]
#[command(name = "attr-inspect")]
#[command(about = "Inspect merged node attributes and per-layer traces")]
#[command(version)]
pub struct Cli {
    /// Settings file to use instead of `attr-inspect.toml`.
    #[arg(long, short = 'c', value_name = "PATH", global = true)]
    pub config: Option<Utf8PathBuf>,
    /// Log engine activity to stderr at debug level.
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
    /// Print compact JSON instead of pretty-printed JSON.
    #[arg(long, global = true)]
    pub compact: bool,
    /// Selected operation.
    #[command(subcommand)]
    pub command: Command,
}

/// Operations on a stored node.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the merged attributes, or one layer.
    Show(ShowArgs),
    /// Print the value each layer holds at a path, and the merged result.
    Trace(TraceArgs),
    /// Write a value into one layer and print the updated node document.
    Set(SetArgs),
}

/// Arguments for `show`.
#[derive(Debug, Args)]
pub struct ShowArgs {
    /// Node document (`.json`, `.toml`, `.yaml`).
    pub node: Utf8PathBuf,
    /// Dotted attribute path to print.
    #[arg(long, value_name = "PATH")]
    pub path: Option<String>,
    /// Print this layer instead of the merged attributes.
    #[arg(long, value_name = "LAYER", value_parser = parse_layer)]
    pub layer: Option<Precedence>,
}

/// Arguments for `trace`.
#[derive(Debug, Args)]
pub struct TraceArgs {
    /// Node document (`.json`, `.toml`, `.yaml`).
    pub node: Utf8PathBuf,
    /// Dotted attribute path to trace.
    pub path: String,
}

/// Arguments for `set`.
#[derive(Debug, Args)]
pub struct SetArgs {
    /// Node document (`.json`, `.toml`, `.yaml`).
    pub node: Utf8PathBuf,
    /// Layer to write; defaults to the configured `default_layer`.
    #[arg(long, value_name = "LAYER", value_parser = parse_layer)]
    pub layer: Option<Precedence>,
    /// Dotted attribute path to write.
    #[arg(long, value_name = "PATH")]
    pub path: String,
    /// Value to store; parsed as JSON, otherwise taken as a string.
    #[arg(long, value_name = "VALUE")]
    pub value: String,
    /// Write the updated document here instead of stdout.
    #[arg(long, value_name = "PATH")]
    pub output: Option<Utf8PathBuf>,
}

fn parse_layer(raw: &str) -> Result<Precedence, String> {
    raw.parse().map_err(|err: node_attrs::AttributeError| err.to_string())
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use node_attrs::Precedence;
    use rstest::rstest;

    use super::{Cli, Command};

    #[rstest]
    #[case("role_default", Precedence::RoleDefault)]
    #[case("environment_override", Precedence::EnvOverride)]
    fn layers_parse_by_name(#[case] raw: &str, #[case] expected: Precedence) {
        let cli = Cli::try_parse_from(["attr-inspect", "show", "n.json", "--layer", raw])
            .expect("valid arguments");
        let Command::Show(args) = cli.command else {
            panic!("expected show");
        };
        assert_eq!(args.layer, Some(expected));
    }

    #[test]
    fn unknown_layers_are_rejected() {
        let err = Cli::try_parse_from(["attr-inspect", "show", "n.json", "--layer", "middle"])
            .expect_err("unknown layer");
        assert!(err.to_string().contains("unknown precedence layer 'middle'"));
    }

    #[test]
    fn set_requires_a_path_and_value() {
        assert!(Cli::try_parse_from(["attr-inspect", "set", "n.json", "--path", "a"]).is_err());
    }
}
