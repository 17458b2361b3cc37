//! Settings for `attr-inspect`, layered with Figment.
//!
//! Precedence, lowest first: built-in defaults, `attr-inspect.toml` in the
//! working directory (or the file named by `--config`), `ATTR_INSPECT_*`
//! environment variables, then command-line flags.

use camino::Utf8Path;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use node_attrs::Precedence;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Settings file read when `--config` is not given.
pub const DEFAULT_SETTINGS_FILE: &str = "attr-inspect.toml";

/// Environment variable prefix for settings.
pub const ENV_PREFIX: &str = "ATTR_INSPECT_";

/// Resolved settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Pretty-print JSON output.
    pub pretty: bool,
    /// Layer `set` writes to when `--layer` is omitted.
    pub default_layer: Precedence,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            pretty: true,
            default_layer: Precedence::Normal,
        }
    }
}

/// Flag values that override every other settings source.
#[derive(Debug, Default, Serialize)]
pub struct SettingsOverrides {
    /// Set from `--compact`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pretty: Option<bool>,
}

/// Merge defaults, the settings file, the environment and flag overrides.
///
/// A missing settings file is skipped.
///
/// # Errors
///
/// Returns [`crate::error::InspectError::Settings`] when a source fails to
/// parse or a value has the wrong type.
pub fn load_settings(file: Option<&Utf8Path>, overrides: &SettingsOverrides) -> Result<Settings> {
    let path = file.unwrap_or_else(|| Utf8Path::new(DEFAULT_SETTINGS_FILE));
    let figment = Figment::from(Serialized::defaults(Settings::default()))
        .merge(Toml::file(path.as_std_path()))
        .merge(Env::prefixed(ENV_PREFIX))
        .merge(Serialized::defaults(overrides));
    let settings: Settings = figment.extract()?;
    tracing::debug!(?settings, "settings loaded");
    Ok(settings)
}
