//! Remote model: entries, tags, and the link objects that join them.
//!
//! Shapes follow the Contentful Management API JSON so the HTTP client can
//! (de)serialize them directly.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Links
// ---------------------------------------------------------------------------

/// Reference to another store object (`{"sys": {"type": "Link", ...}}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub sys: LinkSys,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkSys {
    #[serde(rename = "type")]
    pub kind: String,
    pub link_type: String,
    pub id: String,
}

impl Link {
    pub fn new(link_type: &str, id: impl Into<String>) -> Self {
        Self {
            sys: LinkSys {
                kind: "Link".to_string(),
                link_type: link_type.to_string(),
                id: id.into(),
            },
        }
    }

    pub fn tag(id: impl Into<String>) -> Self {
        Self::new("Tag", id)
    }

    pub fn id(&self) -> &str {
        &self.sys.id
    }
}

// ---------------------------------------------------------------------------
// Fields
// ---------------------------------------------------------------------------

/// `field → locale → value`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fields(pub BTreeMap<String, BTreeMap<String, Value>>);

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field: &str, locale: &str) -> Option<&Value> {
        self.0.get(field).and_then(|by_locale| by_locale.get(locale))
    }

    pub fn get_str(&self, field: &str, locale: &str) -> Option<&str> {
        self.get(field, locale).and_then(Value::as_str)
    }

    /// Set one locale's value, leaving every other locale untouched.
    pub fn set(&mut self, field: &str, locale: &str, value: Value) {
        self.0
            .entry(field.to_string())
            .or_default()
            .insert(locale.to_string(), value);
    }

    /// Drop `locale` from every field; fields left empty are removed.
    /// Returns whether anything was removed.
    pub fn remove_locale(&mut self, locale: &str) -> bool {
        let mut removed = false;
        for by_locale in self.0.values_mut() {
            removed |= by_locale.remove(locale).is_some();
        }
        self.0.retain(|_, by_locale| !by_locale.is_empty());
        removed
    }

    /// Locales holding a value for `field`.
    pub fn locales(&self, field: &str) -> Vec<&str> {
        self.0
            .get(field)
            .map(|by_locale| by_locale.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(default)]
    pub tags: Vec<Link>,
}

impl Metadata {
    pub fn has_tag(&self, id: &str) -> bool {
        self.tags.iter().any(|link| link.id() == id)
    }
}

// ---------------------------------------------------------------------------
// Entries
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntrySys {
    pub id: String,
    #[serde(default)]
    pub version: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_version: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archived_version: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<Link>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<Link>,
}

impl EntrySys {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            version: 0,
            published_version: None,
            archived_version: None,
            content_type: None,
            created_at: None,
            updated_at: None,
            updated_by: None,
        }
    }
}

/// A remote entry snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub sys: EntrySys,
    #[serde(default)]
    pub fields: Fields,
    #[serde(default)]
    pub metadata: Metadata,
}

impl Entry {
    pub fn id(&self) -> &str {
        &self.sys.id
    }

    pub fn version(&self) -> u64 {
        self.sys.version
    }

    pub fn is_published(&self) -> bool {
        self.sys.published_version.is_some()
    }

    pub fn is_archived(&self) -> bool {
        self.sys.archived_version.is_some()
    }

    /// Id of the user who last changed the entry, when the store reports it.
    pub fn updated_by(&self) -> Option<&str> {
        self.sys.updated_by.as_ref().map(Link::id)
    }

    /// The writable part of the snapshot, as sent on update.
    pub fn payload(&self) -> EntryPayload {
        EntryPayload {
            fields: self.fields.clone(),
            metadata: self.metadata.clone(),
        }
    }
}

/// Body of a create or update request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntryPayload {
    pub fields: Fields,
    pub metadata: Metadata,
}

// ---------------------------------------------------------------------------
// Tags
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagSys {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub sys: TagSys,
    pub name: String,
}

impl Tag {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            sys: TagSys {
                id: id.into(),
                version: None,
                visibility: Some("private".to_string()),
            },
            name: name.into(),
        }
    }

    pub fn id(&self) -> &str {
        &self.sys.id
    }
}

/// Paged list response (`{"items": [...]}`).
#[derive(Debug, Clone, Deserialize)]
pub struct Collection<T> {
    pub items: Vec<T>,
    #[serde(default)]
    pub total: Option<u64>,
}
