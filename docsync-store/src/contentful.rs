//! Contentful Management API client.
//!
//! Blocking, one request per call, no retries. Every request carries the
//! bearer token; writes carry the entry version in `X-Contentful-Version`.

use std::fmt;
use std::time::Duration;

use docsync_core::{ReferenceId, StoreConfig, TagId};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};

use crate::error::StoreError;
use crate::model::{Collection, Entry, EntryPayload, Tag};
use crate::ContentStore;

const CONTENT_TYPE: &str = "application/vnd.contentful.management.v1+json";
const TAG_PAGE_SIZE: u64 = 1000;

pub struct ContentfulStore {
    agent: ureq::Agent,
    /// `{api_base}/spaces/{space}/environments/{env}`
    environment_url: String,
    token: String,
}

// Custom Debug to keep the token out of logs.
impl fmt::Debug for ContentfulStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentfulStore")
            .field("environment_url", &self.environment_url)
            .field("has_token", &!self.token.is_empty())
            .finish()
    }
}

impl ContentfulStore {
    /// Build a client from store settings. Space id and token are required.
    pub fn from_config(config: &StoreConfig) -> Result<Self, StoreError> {
        let space = config
            .space_id
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| StoreError::Config("store.space_id is not set".to_string()))?;
        let token = config
            .access_token
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| StoreError::Config("access token is not set".to_string()))?;

        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build();

        Ok(Self {
            agent,
            environment_url: environment_url(&config.api_base, space, &config.environment),
            token: token.to_string(),
        })
    }

    fn entry_url(&self, id: &str) -> String {
        format!("{}/entries/{id}", self.environment_url)
    }

    fn request(&self, method: &str, url: &str) -> ureq::Request {
        tracing::debug!("{method} {url}");
        self.agent
            .request(method, url)
            .set("Authorization", &format!("Bearer {}", self.token))
            .set("Content-Type", CONTENT_TYPE)
    }

    fn versioned(&self, method: &str, url: &str, version: u64) -> ureq::Request {
        self.request(method, url)
            .set("X-Contentful-Version", &version.to_string())
    }
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

fn environment_url(api_base: &str, space: &str, environment: &str) -> String {
    format!(
        "{}/spaces/{space}/environments/{environment}",
        api_base.trim_end_matches('/')
    )
}

fn send<T: DeserializeOwned>(
    request: ureq::Request,
    body: Option<&impl Serialize>,
) -> Result<T, StoreError> {
    let result = match body {
        Some(body) => {
            let text =
                serde_json::to_string(body).map_err(|e| StoreError::Decode(e.to_string()))?;
            request.send_string(&text)
        }
        None => request.call(),
    };
    let text = read_response(result)?;
    serde_json::from_str(&text).map_err(|e| StoreError::Decode(e.to_string()))
}

fn send_empty(request: ureq::Request) -> Result<(), StoreError> {
    read_response(request.call()).map(|_| ())
}

fn read_response(result: Result<ureq::Response, ureq::Error>) -> Result<String, StoreError> {
    match result {
        Ok(response) => response
            .into_string()
            .map_err(|e| StoreError::Decode(e.to_string())),
        Err(ureq::Error::Status(status, response)) => {
            let body = response.into_string().unwrap_or_default();
            Err(status_error(status, &body))
        }
        Err(ureq::Error::Transport(transport)) => Err(StoreError::Network(transport.to_string())),
    }
}

/// Map a non-success status and its body onto a [`StoreError`].
pub fn status_error(status: u16, body: &str) -> StoreError {
    let message = error_message(body);
    match status {
        404 => StoreError::NotFound(message),
        409 => StoreError::VersionConflict(message),
        401 | 403 => StoreError::Auth(message),
        _ => StoreError::Api { status, message },
    }
}

/// Human-readable message from an error body: `message`, else `sys.id`,
/// else the raw body.
fn error_message(body: &str) -> String {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let from_json = parsed.as_ref().and_then(|value| {
        value
            .get("message")
            .and_then(Value::as_str)
            .or_else(|| value.pointer("/sys/id").and_then(Value::as_str))
            .map(str::to_string)
    });
    match from_json {
        Some(message) => message,
        None if body.trim().is_empty() => "empty response body".to_string(),
        None => body.trim().to_string(),
    }
}

// ---------------------------------------------------------------------------
// ContentStore impl
// ---------------------------------------------------------------------------

impl ContentStore for ContentfulStore {
    fn name(&self) -> &'static str {
        "contentful"
    }

    fn get_entry(&self, id: &ReferenceId) -> Result<Entry, StoreError> {
        let url = self.entry_url(id.as_str());
        send(self.request("GET", &url), None::<&Value>)
    }

    fn create_entry_with_id(
        &self,
        content_type: &str,
        id: &ReferenceId,
        payload: &EntryPayload,
    ) -> Result<Entry, StoreError> {
        let url = self.entry_url(id.as_str());
        let request = self
            .request("PUT", &url)
            .set("X-Contentful-Content-Type", content_type);
        send(request, Some(payload))
    }

    fn update_entry(&self, entry: &Entry) -> Result<Entry, StoreError> {
        let url = self.entry_url(entry.id());
        send(
            self.versioned("PUT", &url, entry.version()),
            Some(&entry.payload()),
        )
    }

    fn publish_entry(&self, entry: &Entry) -> Result<Entry, StoreError> {
        let url = format!("{}/published", self.entry_url(entry.id()));
        send(self.versioned("PUT", &url, entry.version()), None::<&Value>)
    }

    fn unpublish_entry(&self, entry: &Entry) -> Result<Entry, StoreError> {
        let url = format!("{}/published", self.entry_url(entry.id()));
        send(self.versioned("DELETE", &url, entry.version()), None::<&Value>)
    }

    fn archive_entry(&self, entry: &Entry) -> Result<Entry, StoreError> {
        let url = format!("{}/archived", self.entry_url(entry.id()));
        send(self.versioned("PUT", &url, entry.version()), None::<&Value>)
    }

    fn delete_entry(&self, entry: &Entry) -> Result<(), StoreError> {
        let url = self.entry_url(entry.id());
        send_empty(self.versioned("DELETE", &url, entry.version()))
    }

    fn list_tags(&self) -> Result<Vec<Tag>, StoreError> {
        let url = format!("{}/tags", self.environment_url);
        let request = self
            .request("GET", &url)
            .query("limit", &TAG_PAGE_SIZE.to_string());
        let page: Collection<Tag> = send(request, None::<&Value>)?;
        Ok(page.items)
    }

    fn create_tag(&self, id: &TagId, name: &str) -> Result<Tag, StoreError> {
        let url = format!("{}/tags/{id}", self.environment_url);
        let body = json!({
            "name": name,
            "sys": {"id": id.as_str(), "type": "Tag", "visibility": "private"}
        });
        send(self.request("PUT", &url), Some(&body))
    }
}
