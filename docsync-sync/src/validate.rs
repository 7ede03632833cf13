//! Required front-matter checks.

use docsync_core::{FrontMatter, Locale, LocaleTable};

use crate::identity::resolve_locale;

/// Required keys, in the order they are reported.
pub const REQUIRED_KEYS: [&str; 3] = ["slug", "lang", "title"];

/// Front matter that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidDocument {
    pub slug: String,
    pub locale: Locale,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    Valid(ValidDocument),
    /// Required keys that are absent, blank, or (for `lang`) unresolvable.
    Invalid { missing: Vec<&'static str> },
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid(_))
    }
}

/// Check `front_matter` for `slug`, `lang`, and `title`.
pub fn validate(front_matter: &FrontMatter, table: &LocaleTable) -> ValidationResult {
    let slug = front_matter.non_empty("slug");
    let locale = resolve_locale(front_matter.non_empty("lang"), table);
    let title = front_matter.non_empty("title");

    match (slug, locale, title) {
        (Some(slug), Some(locale), Some(title)) => ValidationResult::Valid(ValidDocument {
            slug: slug.trim().to_string(),
            locale,
            title: title.trim().to_string(),
        }),
        (slug, locale, title) => {
            let present = [slug.is_some(), locale.is_some(), title.is_some()];
            let missing = REQUIRED_KEYS
                .iter()
                .zip(present)
                .filter(|(_, present)| !present)
                .map(|(key, _)| *key)
                .collect();
            ValidationResult::Invalid { missing }
        }
    }
}
