//! Requests the Contentful client puts on the wire, against a local mock server.

use docsync_core::{ReferenceId, StoreConfig, TagId};
use docsync_store::{
    ContentStore, ContentfulStore, Entry, EntryPayload, EntrySys, Metadata, StoreError,
};
use serde_json::{json, Value};
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ENTRY_PATH: &str = "/spaces/space1/environments/master/entries/acme_handbook_intro";

fn store(server: &MockServer) -> ContentfulStore {
    ContentfulStore::from_config(&StoreConfig {
        api_base: server.uri(),
        space_id: Some("space1".to_string()),
        access_token: Some("secret".to_string()),
        ..StoreConfig::default()
    })
    .expect("client")
}

fn snapshot(version: u64) -> Entry {
    let mut entry = Entry {
        sys: EntrySys {
            version,
            ..EntrySys::new("acme_handbook_intro")
        },
        fields: Default::default(),
        metadata: Metadata::default(),
    };
    entry.fields.set("title", "en-US", json!("Intro"));
    entry
}

fn entry_body(version: u64) -> Value {
    json!({"sys": {"id": "acme_handbook_intro", "type": "Entry", "version": version}})
}

/// The client is blocking; keep it off the runtime driving the mock server.
async fn blocking<T: Send + 'static>(f: impl FnOnce() -> T + Send + 'static) -> T {
    tokio::task::spawn_blocking(f).await.expect("join")
}

#[tokio::test(flavor = "multi_thread")]
async fn create_sends_content_type_header_and_payload() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path(ENTRY_PATH))
        .and(header("Authorization", "Bearer secret"))
        .and(header("Content-Type", "application/vnd.contentful.management.v1+json"))
        .and(header("X-Contentful-Content-Type", "doc"))
        .and(body_partial_json(json!({"fields": {"title": {"en-US": "Intro"}}})))
        .respond_with(ResponseTemplate::new(201).set_body_json(entry_body(1)))
        .expect(1)
        .mount(&server)
        .await;

    let client = store(&server);
    let created = blocking(move || {
        let mut payload = EntryPayload::default();
        payload.fields.set("title", "en-US", json!("Intro"));
        client.create_entry_with_id("doc", &ReferenceId::from("acme_handbook_intro"), &payload)
    })
    .await
    .expect("create");
    assert_eq!(created.version(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn update_sends_version_and_writable_fields_only() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path(ENTRY_PATH))
        .and(header("X-Contentful-Version", "3"))
        .and(body_partial_json(json!({
            "fields": {"title": {"en-US": "Intro"}},
            "metadata": {"tags": []}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(entry_body(4)))
        .expect(1)
        .mount(&server)
        .await;

    let client = store(&server);
    let updated = blocking(move || client.update_entry(&snapshot(3)))
        .await
        .expect("update");
    assert_eq!(updated.version(), 4);

    let requests = server.received_requests().await.expect("recording enabled");
    let body: Value = requests[0].body_json().expect("json body");
    assert!(body.get("sys").is_none(), "sys leaked into update body: {body}");
}

#[tokio::test(flavor = "multi_thread")]
async fn lifecycle_calls_carry_the_snapshot_version() {
    let server = MockServer::start().await;
    let published = format!("{ENTRY_PATH}/published");
    let archived = format!("{ENTRY_PATH}/archived");
    Mock::given(method("PUT"))
        .and(path(published.as_str()))
        .and(header("X-Contentful-Version", "4"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "sys": {"id": "acme_handbook_intro", "version": 5, "publishedVersion": 4}
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(published.as_str()))
        .and(header("X-Contentful-Version", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(entry_body(6)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(archived.as_str()))
        .and(header("X-Contentful-Version", "6"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "sys": {"id": "acme_handbook_intro", "version": 7, "archivedVersion": 6}
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(ENTRY_PATH))
        .and(header("X-Contentful-Version", "7"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let client = store(&server);
    blocking(move || {
        let published = client.publish_entry(&snapshot(4)).expect("publish");
        assert!(published.is_published());
        let unpublished = client.unpublish_entry(&published).expect("unpublish");
        assert!(!unpublished.is_published());
        let archived = client.archive_entry(&unpublished).expect("archive");
        assert!(archived.is_archived());
        client.delete_entry(&archived).expect("delete");
    })
    .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn stale_version_maps_to_conflict() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path(ENTRY_PATH))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "sys": {"type": "Error", "id": "VersionMismatch"}
        })))
        .mount(&server)
        .await;

    let client = store(&server);
    let err = blocking(move || client.update_entry(&snapshot(2)))
        .await
        .unwrap_err();
    assert_eq!(err, StoreError::VersionConflict("VersionMismatch".to_string()));
}

#[tokio::test(flavor = "multi_thread")]
async fn missing_entry_maps_to_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(ENTRY_PATH))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "message": "The resource could not be found."
        })))
        .mount(&server)
        .await;

    let client = store(&server);
    let err = blocking(move || client.get_entry(&ReferenceId::from("acme_handbook_intro")))
        .await
        .unwrap_err();
    assert!(err.is_not_found(), "got: {err}");
}

#[tokio::test(flavor = "multi_thread")]
async fn tags_are_listed_in_one_page_and_created_private() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/spaces/space1/environments/master/tags"))
        .and(query_param("limit", "1000"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{"sys": {"id": "other_repo"}, "name": "other/repo"}],
            "total": 1
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/spaces/space1/environments/master/tags/acme_handbook"))
        .and(body_partial_json(json!({
            "name": "acme/handbook",
            "sys": {"id": "acme_handbook", "visibility": "private"}
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "sys": {"id": "acme_handbook", "visibility": "private"},
            "name": "acme/handbook"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = store(&server);
    let (listed, created) = blocking(move || {
        let listed = client.list_tags().expect("list");
        let created = client
            .create_tag(&TagId::from("acme_handbook"), "acme/handbook")
            .expect("create tag");
        (listed, created)
    })
    .await;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id(), "other_repo");
    assert_eq!(created.id(), "acme_handbook");
}
