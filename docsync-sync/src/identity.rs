//! Identity resolution: locale, reference id, source tag, and source URL.
//!
//! Everything here is a pure function of its inputs. The locale table is
//! passed in by the caller; there is no process-wide lookup state.

use docsync_core::{Locale, LocaleTable, ReferenceId, TagId};

/// Canonical locale for a raw `lang` value, if the table knows it.
pub fn resolve_locale(raw: Option<&str>, table: &LocaleTable) -> Option<Locale> {
    table.resolve(raw?).cloned()
}

/// Stable entry id shared by every locale variant of `slug`.
///
/// `format_reference_id("org/repo", "guides/intro")` is `org_repo_guides_intro`.
pub fn format_reference_id(repository: &str, slug: &str) -> ReferenceId {
    ReferenceId::from(sanitize(&format!("{repository}/{slug}")))
}

/// Tag derived from the repository short name, with its display name.
pub fn source_tag(repository: &str) -> (TagId, String) {
    let short = repository
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(repository)
        .trim();
    (TagId::from(sanitize(short)), short.to_string())
}

/// Browse URL of `path` at `branch` in `repository`.
pub fn source_url(base: &str, repository: &str, branch: &str, path: &str) -> String {
    format!(
        "{}/{}/blob/{}/{}",
        base.trim_end_matches('/'),
        repository.trim_matches('/'),
        branch.trim_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Map path separators and any character the store rejects to `_`.
fn sanitize(raw: &str) -> String {
    raw.chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '_' | '-' | '.' => c,
            _ => '_',
        })
        .collect()
}
