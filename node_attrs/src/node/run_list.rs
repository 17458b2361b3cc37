//! Ordered run lists of recipes and roles.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::AttributeError;

/// Whether a run list entry names a recipe or a role.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum RunListKind {
    /// `recipe[...]`, or a bare name.
    Recipe,
    /// `role[...]`.
    Role,
}

/// One entry of a [`RunList`], such as `recipe[nginx@1.2.0]` or `role[web]`.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct RunListItem {
    kind: RunListKind,
    name: String,
    version: Option<String>,
}

impl RunListItem {
    /// A recipe entry.
    #[must_use]
    pub fn recipe(name: impl Into<String>) -> Self {
        Self {
            kind: RunListKind::Recipe,
            name: name.into(),
            version: None,
        }
    }

    /// A role entry.
    #[must_use]
    pub fn role(name: impl Into<String>) -> Self {
        Self {
            kind: RunListKind::Role,
            name: name.into(),
            version: None,
        }
    }

    /// Recipe or role.
    #[must_use]
    pub const fn kind(&self) -> RunListKind {
        self.kind
    }

    /// Name without the type wrapper or version.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Pinned version, recipes only.
    #[must_use]
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }
}

impl FromStr for RunListItem {
    type Err = AttributeError;

    /// Accepts `recipe[name]`, `recipe[name@version]`, `role[name]` and a
    /// bare recipe name.
    fn from_str(item: &str) -> Result<Self, Self::Err> {
        let invalid = || AttributeError::InvalidRunListItem {
            item: item.to_owned(),
        };
        let (kind, body) = if let Some(inner) = item.strip_prefix("recipe[") {
            (RunListKind::Recipe, inner.strip_suffix(']').ok_or_else(invalid)?)
        } else if let Some(inner) = item.strip_prefix("role[") {
            (RunListKind::Role, inner.strip_suffix(']').ok_or_else(invalid)?)
        } else if item.contains(['[', ']']) {
            return Err(invalid());
        } else {
            (RunListKind::Recipe, item)
        };
        let (name, version) = match (kind, body.split_once('@')) {
            (RunListKind::Recipe, Some((name, version))) => (name, Some(version.to_owned())),
            (_, None) => (body, None),
            (RunListKind::Role, Some(_)) => return Err(invalid()),
        };
        if name.is_empty() || version.as_deref().is_some_and(str::is_empty) {
            return Err(invalid());
        }
        Ok(Self {
            kind,
            name: name.to_owned(),
            version,
        })
    }
}

impl fmt::Display for RunListItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            RunListKind::Recipe => "recipe",
            RunListKind::Role => "role",
        };
        match &self.version {
            Some(version) => write!(f, "{kind}[{}@{version}]", self.name),
            None => write!(f, "{kind}[{}]", self.name),
        }
    }
}

impl Serialize for RunListItem {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RunListItem {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Ordered, duplicate-free list of recipes and roles to apply.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunList(Vec<RunListItem>);

impl RunList {
    /// An empty run list.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Parse every entry of `items`.
    ///
    /// # Errors
    ///
    /// Returns [`AttributeError::InvalidRunListItem`] for the first entry
    /// that does not parse.
    pub fn parse<I, S>(items: I) -> Result<Self, AttributeError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut list = Self::new();
        for item in items {
            list.push(item.as_ref().parse()?);
        }
        Ok(list)
    }

    /// Append `item` unless it is already present. Returns whether it was
    /// added.
    pub fn push(&mut self, item: RunListItem) -> bool {
        if self.0.contains(&item) {
            return false;
        }
        self.0.push(item);
        true
    }

    /// Recipe names in order.
    pub fn recipes(&self) -> impl Iterator<Item = &str> {
        self.names(RunListKind::Recipe)
    }

    /// Role names in order.
    pub fn roles(&self) -> impl Iterator<Item = &str> {
        self.names(RunListKind::Role)
    }

    fn names(&self, kind: RunListKind) -> impl Iterator<Item = &str> {
        self.0
            .iter()
            .filter(move |item| item.kind == kind)
            .map(RunListItem::name)
    }

    /// Entries in order.
    pub fn iter(&self) -> std::slice::Iter<'_, RunListItem> {
        self.0.iter()
    }

    /// Number of entries.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` when the list has no entries.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns `true` when `item` parses and is present.
    #[must_use]
    pub fn contains(&self, item: &str) -> bool {
        item.parse::<RunListItem>()
            .is_ok_and(|parsed| self.0.contains(&parsed))
    }
}

impl<'a> IntoIterator for &'a RunList {
    type Item = &'a RunListItem;
    type IntoIter = std::slice::Iter<'a, RunListItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for RunList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, item) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{item}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{RunList, RunListItem, RunListKind};

    #[rstest]
    #[case("recipe[nginx]", RunListKind::Recipe, "nginx", None)]
    #[case("nginx", RunListKind::Recipe, "nginx", None)]
    #[case("recipe[nginx@1.2.0]", RunListKind::Recipe, "nginx", Some("1.2.0"))]
    #[case("role[web]", RunListKind::Role, "web", None)]
    fn items_parse(
        #[case] raw: &str,
        #[case] kind: RunListKind,
        #[case] name: &str,
        #[case] version: Option<&str>,
    ) {
        let item: RunListItem = raw.parse().expect("valid item");
        assert_eq!((item.kind(), item.name(), item.version()), (kind, name, version));
    }

    #[rstest]
    #[case("recipe[]")]
    #[case("recipe[unterminated")]
    #[case("widget[x]")]
    #[case("role[web@1.0]")]
    #[case("recipe[x@]")]
    fn malformed_items_are_rejected(#[case] raw: &str) {
        assert!(raw.parse::<RunListItem>().is_err());
    }

    #[test]
    fn bare_names_display_as_recipes() {
        let item: RunListItem = "ntp".parse().expect("valid item");
        assert_eq!(item.to_string(), "recipe[ntp]");
    }

    #[test]
    fn duplicates_are_ignored() {
        let list = RunList::parse(["recipe[a]", "a", "role[r]", "recipe[a@1.0]"]).expect("valid list");
        assert_eq!(list.len(), 3);
        assert_eq!(list.recipes().collect::<Vec<_>>(), ["a", "a"]);
        assert_eq!(list.roles().collect::<Vec<_>>(), ["r"]);
        assert!(list.contains("a"));
        assert!(!list.contains("role[a]"));
    }
}
