//! Domain types shared across the docsync workspace.
//!
//! Identifiers are newtypes over `String` so a `Locale` can never be passed
//! where a `ReferenceId` is expected. All types serialize as their inner value.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Stable identifier of a remote entry, shared by every locale variant of one slug.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ReferenceId(pub String);

impl ReferenceId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReferenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for ReferenceId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ReferenceId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Canonical language/region tag, e.g. `en-US`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Locale(pub String);

impl Locale {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for Locale {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for Locale {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Identifier of a tag in the content store.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TagId(pub String);

impl TagId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TagId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for TagId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for TagId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Front matter
// ---------------------------------------------------------------------------

/// Key/value metadata parsed from the leading block of a document.
///
/// Keys are case-sensitive as written; iteration order is by key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrontMatter(pub BTreeMap<String, String>);

impl FrontMatter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a key, replacing any earlier value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Value for `key` when present and not blank.
    pub fn non_empty(&self, key: &str) -> Option<&str> {
        self.get(key).filter(|value| !value.trim().is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FrontMatter {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut fm = FrontMatter::new();
        for (k, v) in iter {
            fm.insert(k, v);
        }
        fm
    }
}

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

/// One markdown file at a point in time.
///
/// `content` is `None` when the file was deleted or could not be read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub path: String,
    pub content: Option<String>,
}

impl Document {
    pub fn new(path: impl Into<String>, content: Option<String>) -> Self {
        Self {
            path: path.into(),
            content,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newtype_display() {
        assert_eq!(ReferenceId::from("org_repo_intro").to_string(), "org_repo_intro");
        assert_eq!(Locale::from("en-US").to_string(), "en-US");
        assert_eq!(TagId::from("repo").to_string(), "repo");
    }

    #[test]
    fn newtype_equality() {
        let a = Locale::from("ja-JP");
        let b = Locale::from(String::from("ja-JP"));
        assert_eq!(a, b);
    }

    #[test]
    fn front_matter_non_empty_ignores_blank_values() {
        let fm: FrontMatter = [("slug", "  "), ("title", "Hello")].into_iter().collect();
        assert_eq!(fm.non_empty("slug"), None);
        assert_eq!(fm.non_empty("title"), Some("Hello"));
        assert_eq!(fm.non_empty("lang"), None);
        assert_eq!(fm.len(), 2);
    }

    #[test]
    fn front_matter_keys_are_case_sensitive() {
        let fm: FrontMatter = [("Title", "A")].into_iter().collect();
        assert_eq!(fm.get("title"), None);
        assert_eq!(fm.get("Title"), Some("A"));
    }
}
