//! The fixed precedence ordering of attribute layers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::AttributeError;

/// One precedence level, ordered lowest to highest.
///
/// The derived [`Ord`] follows [`Precedence::ORDER`], so comparisons agree with
/// merge priority.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Precedence {
    /// Cookbook defaults.
    Default,
    /// Environment defaults.
    EnvDefault,
    /// Role defaults.
    RoleDefault,
    /// Forced defaults, winning over every other default level.
    ForceDefault,
    /// Persistent node-level values.
    Normal,
    /// Cookbook overrides.
    Override,
    /// Role overrides.
    RoleOverride,
    /// Environment overrides.
    EnvOverride,
    /// Forced overrides, winning over every other override level.
    ForceOverride,
    /// Facts discovered about the system; always wins.
    Automatic,
}

impl Precedence {
    /// Every level, lowest precedence first.
    pub const ORDER: [Self; 10] = [
        Self::Default,
        Self::EnvDefault,
        Self::RoleDefault,
        Self::ForceDefault,
        Self::Normal,
        Self::Override,
        Self::RoleOverride,
        Self::EnvOverride,
        Self::ForceOverride,
        Self::Automatic,
    ];

    /// Default levels, lowest first.
    pub const DEFAULTS: [Self; 4] = [
        Self::Default,
        Self::EnvDefault,
        Self::RoleDefault,
        Self::ForceDefault,
    ];

    /// Override levels, lowest first.
    pub const OVERRIDES: [Self; 4] = [
        Self::Override,
        Self::RoleOverride,
        Self::EnvOverride,
        Self::ForceOverride,
    ];

    /// Canonical name used in documents and diagnostics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::EnvDefault => "env_default",
            Self::RoleDefault => "role_default",
            Self::ForceDefault => "force_default",
            Self::Normal => "normal",
            Self::Override => "override",
            Self::RoleOverride => "role_override",
            Self::EnvOverride => "env_override",
            Self::ForceOverride => "force_override",
            Self::Automatic => "automatic",
        }
    }

    /// Returns `true` for the default group.
    #[must_use]
    pub const fn is_default(self) -> bool {
        matches!(
            self,
            Self::Default | Self::EnvDefault | Self::RoleDefault | Self::ForceDefault
        )
    }

    /// Returns `true` for the override group.
    #[must_use]
    pub const fn is_override(self) -> bool {
        matches!(
            self,
            Self::Override | Self::RoleOverride | Self::EnvOverride | Self::ForceOverride
        )
    }
}

impl fmt::Display for Precedence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Precedence {
    type Err = AttributeError;

    /// Parse a layer name. `environment_default` and `environment_override`
    /// are accepted as aliases.
    fn from_str(name: &str) -> Result<Self, Self::Err> {
        let level = match name {
            "default" => Self::Default,
            "env_default" | "environment_default" => Self::EnvDefault,
            "role_default" => Self::RoleDefault,
            "force_default" => Self::ForceDefault,
            "normal" => Self::Normal,
            "override" => Self::Override,
            "role_override" => Self::RoleOverride,
            "env_override" | "environment_override" => Self::EnvOverride,
            "force_override" => Self::ForceOverride,
            "automatic" => Self::Automatic,
            _ => {
                return Err(AttributeError::UnknownPrecedenceLayer {
                    name: name.to_owned(),
                });
            }
        };
        Ok(level)
    }
}
