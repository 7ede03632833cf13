//! Locale equivalence table.
//!
//! Each [`LocaleSet`] maps a family of raw `lang` values onto one canonical
//! [`Locale`]. Adding a locale is a data change: append a set in the config.

use serde::{Deserialize, Serialize};

use crate::types::Locale;

/// One equivalence class of raw language tags.
///
/// The canonical tag is always a member of its own set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocaleSet {
    pub canonical: Locale,
    #[serde(default)]
    pub aliases: Vec<String>,
}

impl LocaleSet {
    pub fn new(canonical: &str, aliases: &[&str]) -> Self {
        Self {
            canonical: Locale::from(canonical),
            aliases: aliases.iter().map(|a| (*a).to_string()).collect(),
        }
    }

    fn matches(&self, raw: &str) -> bool {
        self.canonical.as_str() == raw || self.aliases.iter().any(|alias| alias == raw)
    }
}

/// Ordered list of locale sets; the first matching set wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocaleTable {
    sets: Vec<LocaleSet>,
}

impl LocaleTable {
    pub fn new(sets: Vec<LocaleSet>) -> Self {
        Self { sets }
    }

    /// Canonical locale for `raw`, matched exactly against each set in order.
    pub fn resolve(&self, raw: &str) -> Option<&Locale> {
        self.sets
            .iter()
            .find(|set| set.matches(raw))
            .map(|set| &set.canonical)
    }

    pub fn sets(&self) -> &[LocaleSet] {
        &self.sets
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }
}

impl Default for LocaleTable {
    fn default() -> Self {
        Self::new(vec![
            LocaleSet::new("en-US", &["en"]),
            LocaleSet::new("ja-JP", &["jp", "ja", "ja-jp"]),
        ])
    }
}
