//! Sync configuration.
//!
//! # Resolution order
//!
//! 1. Built-in defaults ([`SyncConfig::default`]).
//! 2. `docsync.yaml` (or the file passed with `--config`), every key optional.
//! 3. Environment variables, as supplied by the triggering workflow.
//!
//! # API pattern
//!
//! File access always goes through `*_at(path, …)`; the environment overlay
//! takes a lookup closure so tests never touch the process environment.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{io_err, ConfigError};
use crate::locale::LocaleTable;

/// Default config file name, resolved relative to the documentation root.
pub const DEFAULT_CONFIG_FILE: &str = "docsync.yaml";

pub const DEFAULT_API_BASE: &str = "https://api.contentful.com";

// ---------------------------------------------------------------------------
// 1. Types
// ---------------------------------------------------------------------------

/// What to do when a changed path no longer has readable content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingContentStrategy {
    /// Log and leave the remote entry untouched.
    #[default]
    Noop,
    /// Remove the locale; archive the entry once no locale remains.
    Archive,
    /// Remove the locale; delete the entry once no locale remains.
    Delete,
}

impl fmt::Display for MissingContentStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MissingContentStrategy::Noop => write!(f, "noop"),
            MissingContentStrategy::Archive => write!(f, "archive"),
            MissingContentStrategy::Delete => write!(f, "delete"),
        }
    }
}

impl FromStr for MissingContentStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "noop" | "no-op" | "none" => Ok(Self::Noop),
            "archive" => Ok(Self::Archive),
            "delete" => Ok(Self::Delete),
            other => Err(format!(
                "unknown strategy '{other}'; expected: noop, archive, delete"
            )),
        }
    }
}

/// Front-matter parsing knobs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrontMatterConfig {
    /// Largest token offset from the opening rule searched for the closing rule.
    pub max_closing_offset: usize,
}

impl Default for FrontMatterConfig {
    fn default() -> Self {
        Self {
            max_closing_offset: 3,
        }
    }
}

/// Connection settings for the content store.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub api_base: String,
    pub space_id: Option<String>,
    pub environment: String,
    pub timeout_ms: u64,
    /// Only ever sourced from the environment.
    #[serde(skip)]
    pub access_token: Option<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            space_id: None,
            environment: "master".to_string(),
            timeout_ms: 30_000,
            access_token: None,
        }
    }
}

// Custom Debug to keep the token out of logs.
impl fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreConfig")
            .field("api_base", &self.api_base)
            .field("space_id", &self.space_id)
            .field("environment", &self.environment)
            .field("timeout_ms", &self.timeout_ms)
            .field("has_access_token", &self.access_token.is_some())
            .finish()
    }
}

/// Complete configuration for one sync run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Source repository in `org/repo` form.
    pub repository: Option<String>,
    /// Identity recorded in each entry's `author` field.
    pub author: Option<String>,
    /// Documentation subtree, relative to the root.
    pub docs_dir: String,
    pub branch: String,
    pub source_url_base: String,
    /// Content type id used when creating entries.
    pub content_type: String,
    pub publish_on_create: bool,
    pub skip_unchanged: bool,
    pub concurrency: usize,
    pub on_missing_content: MissingContentStrategy,
    pub front_matter: FrontMatterConfig,
    pub locales: LocaleTable,
    pub store: StoreConfig,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            repository: None,
            author: None,
            docs_dir: "docs".to_string(),
            branch: "main".to_string(),
            source_url_base: "https://github.com".to_string(),
            content_type: "doc".to_string(),
            publish_on_create: true,
            skip_unchanged: false,
            concurrency: 4,
            on_missing_content: MissingContentStrategy::Noop,
            front_matter: FrontMatterConfig::default(),
            locales: LocaleTable::default(),
            store: StoreConfig::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// 2. Load
// ---------------------------------------------------------------------------

/// Load configuration from `path`.
///
/// A missing or blank file yields [`SyncConfig::default`]; malformed YAML
/// returns `ConfigError::Parse` with the path and serde_yaml's line context.
pub fn load_at(path: &Path) -> Result<SyncConfig, ConfigError> {
    if !path.exists() {
        return Ok(SyncConfig::default());
    }
    let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    if contents.trim().is_empty() {
        return Ok(SyncConfig::default());
    }
    serde_yaml::from_str(&contents).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        source: e,
    })
}

// ---------------------------------------------------------------------------
// 3. Environment overlay + validation
// ---------------------------------------------------------------------------

impl SyncConfig {
    /// Overlay values from the process environment.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_env_with(|key| std::env::var(key).ok())
    }

    /// Overlay values from `lookup`. Blank values are ignored.
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |keys: &[&str]| {
            keys.iter()
                .filter_map(|key| lookup(key))
                .map(|value| value.trim().to_string())
                .find(|value| !value.is_empty())
        };

        if let Some(value) = get(&["REPOSITORY", "GITHUB_REPOSITORY"]) {
            self.repository = Some(value);
        }
        if let Some(value) = get(&["ACTOR", "GITHUB_ACTOR"]) {
            self.author = Some(value);
        }
        if let Some(value) = get(&["DOCS_DIR"]) {
            self.docs_dir = value;
        }
        if let Some(value) = get(&["BRANCH"]) {
            self.branch = value;
        }
        if let Some(value) = get(&["CONTENT_TYPE"]) {
            self.content_type = value;
        }
        if let Some(value) = get(&["SYNC_CONCURRENCY"]) {
            self.concurrency = parse_number("SYNC_CONCURRENCY", &value)?;
        }
        if let Some(value) = get(&["ON_MISSING_CONTENT"]) {
            self.on_missing_content = value.parse().map_err(|reason| ConfigError::InvalidValue {
                key: "ON_MISSING_CONTENT".to_string(),
                value: value.clone(),
                reason,
            })?;
        }
        if let Some(value) = get(&["CONTENTFUL_API_BASE"]) {
            self.store.api_base = value;
        }
        if let Some(value) = get(&["CONTENTFUL_SPACE_ID"]) {
            self.store.space_id = Some(value);
        }
        if let Some(value) = get(&["CONTENTFUL_ENVIRONMENT"]) {
            self.store.environment = value;
        }
        if let Some(value) = get(&["CONTENTFUL_API_KEY"]) {
            self.store.access_token = Some(value);
        }
        if let Some(value) = get(&["CONTENTFUL_TIMEOUT_MS"]) {
            self.store.timeout_ms = parse_number("CONTENTFUL_TIMEOUT_MS", &value)?;
        }
        Ok(())
    }

    /// Check that every setting a run depends on is present.
    ///
    /// Store credentials are only required when `needs_store` is set.
    pub fn validate(&self, needs_store: bool) -> Result<(), ConfigError> {
        let mut missing = Vec::new();
        if is_blank(self.repository.as_deref()) {
            missing.push("repository");
        }
        if is_blank(self.author.as_deref()) {
            missing.push("author");
        }
        if needs_store {
            if is_blank(self.store.space_id.as_deref()) {
                missing.push("store.space_id");
            }
            if is_blank(self.store.access_token.as_deref()) {
                missing.push("store.access_token");
            }
        }
        if !missing.is_empty() {
            return Err(ConfigError::Missing { keys: missing });
        }

        if self.concurrency == 0 {
            return Err(ConfigError::InvalidValue {
                key: "concurrency".to_string(),
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if self.front_matter.max_closing_offset == 0 {
            return Err(ConfigError::InvalidValue {
                key: "front_matter.max_closing_offset".to_string(),
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if self.locales.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "locales".to_string(),
                value: "[]".to_string(),
                reason: "at least one locale set is required".to_string(),
            });
        }
        Ok(())
    }
}

fn parse_number<T: FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        reason: "expected a non-negative integer".to_string(),
    })
}

fn is_blank(value: Option<&str>) -> bool {
    value.map_or(true, |v| v.trim().is_empty())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use tempfile::TempDir;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_workflow_conventions() {
        let config = SyncConfig::default();
        assert_eq!(config.docs_dir, "docs");
        assert_eq!(config.branch, "main");
        assert_eq!(config.concurrency, 4);
        assert!(config.publish_on_create);
        assert!(!config.skip_unchanged);
        assert_eq!(config.on_missing_content, MissingContentStrategy::Noop);
        assert_eq!(config.front_matter.max_closing_offset, 3);
        assert_eq!(config.store.api_base, DEFAULT_API_BASE);
    }

    #[test]
    fn env_overlay_sets_identity_and_credentials() {
        let mut config = SyncConfig::default();
        config
            .apply_env_with(env(&[
                ("REPOSITORY", "acme/handbook"),
                ("ACTOR", "octocat"),
                ("CONTENTFUL_API_KEY", "secret"),
                ("CONTENTFUL_SPACE_ID", "space1"),
                ("ON_MISSING_CONTENT", "archive"),
            ]))
            .expect("overlay");
        assert_eq!(config.repository.as_deref(), Some("acme/handbook"));
        assert_eq!(config.author.as_deref(), Some("octocat"));
        assert_eq!(config.store.access_token.as_deref(), Some("secret"));
        assert_eq!(config.store.space_id.as_deref(), Some("space1"));
        assert_eq!(config.on_missing_content, MissingContentStrategy::Archive);
        config.validate(true).expect("valid");
    }

    #[test]
    fn first_non_blank_env_key_wins() {
        let mut config = SyncConfig::default();
        config
            .apply_env_with(env(&[
                ("REPOSITORY", "  "),
                ("GITHUB_REPOSITORY", "acme/fallback"),
            ]))
            .expect("overlay");
        assert_eq!(config.repository.as_deref(), Some("acme/fallback"));
    }

    #[test]
    fn bad_concurrency_is_rejected() {
        let mut config = SyncConfig::default();
        let err = config
            .apply_env_with(env(&[("SYNC_CONCURRENCY", "many")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }), "got: {err}");
        assert!(err.to_string().contains("SYNC_CONCURRENCY"));
    }

    #[test]
    fn validate_lists_every_missing_key() {
        let err = SyncConfig::default().validate(true).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("repository"), "got: {msg}");
        assert!(msg.contains("author"), "got: {msg}");
        assert!(msg.contains("store.space_id"), "got: {msg}");
        assert!(msg.contains("store.access_token"), "got: {msg}");
    }

    #[test]
    fn validate_without_store_skips_credentials() {
        let config = SyncConfig {
            repository: Some("acme/handbook".to_string()),
            author: Some("octocat".to_string()),
            ..SyncConfig::default()
        };
        config.validate(false).expect("offline config is valid");
        assert!(config.validate(true).is_err());
    }

    #[test]
    fn load_ignores_token_in_file() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp.path().join(DEFAULT_CONFIG_FILE);
        std::fs::write(&path, "repository: acme/handbook\nstore:\n  access_token: secret\n")
            .expect("write");

        let loaded = load_at(&path).expect("load");
        assert_eq!(loaded.repository.as_deref(), Some("acme/handbook"));
        assert!(loaded.store.access_token.is_none());
    }

    #[test]
    fn debug_output_hides_token() {
        let mut store = StoreConfig::default();
        store.access_token = Some("secret".to_string());
        let rendered = format!("{store:?}");
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("has_access_token: true"));
    }

    #[test]
    fn strategy_parses_case_insensitively() {
        assert_eq!("Delete".parse(), Ok(MissingContentStrategy::Delete));
        assert_eq!("no-op".parse(), Ok(MissingContentStrategy::Noop));
        assert!("purge".parse::<MissingContentStrategy>().is_err());
    }
}
