use std::sync::Arc;

use rstest::rstest;

use docsync_core::{LocaleTable, MissingContentStrategy};
use docsync_frontmatter::ParseOptions;
use docsync_store::{ContentStore, FailOn, MemoryStore, StoreError, StoreOperation};
use docsync_sync::{Outcome, Prepared, ReconcileOptions, Reconciler, Removal, Step};

const ID: &str = "acme_handbook_intro";

fn options() -> ReconcileOptions {
    ReconcileOptions {
        repository: "acme/handbook".to_string(),
        author: "octocat".to_string(),
        branch: "main".to_string(),
        source_url_base: "https://github.com".to_string(),
        content_type: "document".to_string(),
        publish_on_create: true,
        skip_unchanged: false,
        dry_run: false,
        on_missing_content: MissingContentStrategy::Noop,
        parse: ParseOptions::default(),
    }
}

fn reconciler(store: &MemoryStore, options: ReconcileOptions) -> Reconciler {
    let store: Arc<dyn ContentStore> = Arc::new(store.clone());
    Reconciler::new(store, Arc::new(LocaleTable::default()), options)
}

fn doc(lang: &str, body: &str) -> String {
    format!("---\nslug: intro\nlang: {lang}\ntitle: Intro ({lang})\n---\n{body}")
}

// ---------------------------------------------------------------------------
// Create / update
// ---------------------------------------------------------------------------

#[test]
fn first_run_creates_and_publishes() {
    let store = MemoryStore::new();
    let outcome =
        reconciler(&store, options()).reconcile("docs/intro.md", Some(&doc("en", "Hello\n")), None);

    assert_eq!(
        outcome,
        Outcome::Created {
            version: 1,
            published: true
        }
    );
    assert_eq!(
        store.operations(),
        vec![
            StoreOperation::GetEntry { id: ID.to_string() },
            StoreOperation::CreateEntry {
                content_type: "document".to_string(),
                id: ID.to_string()
            },
            StoreOperation::PublishEntry { id: ID.to_string() },
        ]
    );

    let entry = store.entry(ID).expect("entry");
    assert!(entry.is_published());
    assert!(entry.metadata.has_tag("handbook"));
    assert_eq!(entry.fields.get_str("markdown", "en-US"), Some("Hello\n"));
    assert_eq!(entry.fields.get_str("slug", "en-US"), Some("intro"));
    assert_eq!(
        entry.fields.get_str("source", "en-US"),
        Some("https://github.com/acme/handbook/blob/main/docs/intro.md")
    );
    assert_eq!(
        entry.fields.get("author", "en-US"),
        Some(&serde_json::json!(["octocat"]))
    );
}

#[test]
fn rerun_updates_instead_of_creating() {
    let store = MemoryStore::new();
    let reconciler = reconciler(&store, options());
    let content = doc("en", "Hello\n");
    reconciler.reconcile("docs/intro.md", Some(&content), None);
    store.clear_operations();

    let outcome = reconciler.reconcile("docs/intro.md", Some(&content), None);

    let Outcome::Updated { version, actor, .. } = outcome else {
        panic!("expected update, got {outcome:?}");
    };
    assert_eq!(version, 3);
    assert_eq!(actor.as_deref(), Some("memory-store"));
    assert_eq!(
        store.operations(),
        vec![
            StoreOperation::GetEntry { id: ID.to_string() },
            StoreOperation::UpdateEntry {
                id: ID.to_string(),
                version: 2
            },
        ]
    );
    assert_eq!(store.entry_count(), 1);
}

#[test]
fn skip_unchanged_avoids_redundant_writes() {
    let store = MemoryStore::new();
    let reconciler = reconciler(
        &store,
        ReconcileOptions {
            skip_unchanged: true,
            ..options()
        },
    );
    let content = doc("en", "Hello\n");
    reconciler.reconcile("docs/intro.md", Some(&content), None);
    store.clear_operations();

    let outcome = reconciler.reconcile("docs/intro.md", Some(&content), None);
    assert_eq!(outcome, Outcome::Unchanged);
    assert!(store.operations().iter().all(|op| !op.is_mutation()));

    let outcome = reconciler.reconcile("docs/intro.md", Some(&doc("en", "Changed\n")), None);
    assert!(matches!(outcome, Outcome::Updated { .. }), "got {outcome:?}");
}

#[test]
fn locales_share_one_entry_and_stay_isolated() {
    let store = MemoryStore::new();
    let reconciler = reconciler(&store, options());
    reconciler.reconcile("docs/intro.md", Some(&doc("en", "Hello\n")), None);
    let ja = doc("ja", "こんにちは\n");
    let outcome = reconciler.reconcile("docs/intro.ja.md", Some(&ja), None);

    assert!(matches!(outcome, Outcome::Updated { .. }), "got {outcome:?}");
    assert_eq!(store.entry_count(), 1);
    let entry = store.entry(ID).expect("entry");
    assert_eq!(entry.fields.get_str("markdown", "en-US"), Some("Hello\n"));
    assert_eq!(entry.fields.get_str("markdown", "ja-JP"), Some("こんにちは\n"));
    assert_eq!(entry.fields.get_str("title", "en-US"), Some("Intro (en)"));
    assert_eq!(entry.fields.get_str("title", "ja-JP"), Some("Intro (ja)"));
    assert_eq!(entry.fields.get_str("slug", "ja-JP"), None);
}

#[rstest]
#[case("ja")]
#[case("jp")]
#[case("ja-jp")]
#[case("ja-JP")]
fn equivalent_lang_values_resolve_to_one_locale(#[case] lang: &str) {
    let store = MemoryStore::new();
    let prepared =
        reconciler(&store, options()).prepare("docs/intro.md", Some(&doc(lang, "x")), None);
    let Prepared::Ready(ready) = prepared else {
        panic!("expected ready, got {prepared:?}");
    };
    assert_eq!(ready.locale.as_str(), "ja-JP");
    assert_eq!(ready.reference_id.as_str(), ID);
}

// ---------------------------------------------------------------------------
// No store calls
// ---------------------------------------------------------------------------

#[test]
fn invalid_front_matter_touches_nothing() {
    let store = MemoryStore::new();
    let outcome = reconciler(&store, options()).reconcile(
        "docs/intro.md",
        Some("---\nslug: intro\nlang: en\n---\nbody"),
        None,
    );
    assert_eq!(
        outcome,
        Outcome::Invalid {
            missing: vec!["title"]
        }
    );
    assert_eq!(outcome.to_string(), "missing required front matter: title");
    assert!(store.operations().is_empty());
}

#[test]
fn unknown_lang_is_reported_as_missing() {
    let store = MemoryStore::new();
    let outcome =
        reconciler(&store, options()).reconcile("docs/intro.md", Some(&doc("fr", "x")), None);
    assert_eq!(outcome, Outcome::Invalid { missing: vec!["lang"] });
    assert!(store.operations().is_empty());
}

#[test]
fn missing_content_is_a_no_op() {
    let store = MemoryStore::new();
    let outcome =
        reconciler(&store, options()).reconcile("docs/gone.md", None, Some(&doc("en", "x")));
    assert_eq!(outcome, Outcome::no_action("no content"));
    assert!(store.operations().is_empty());
}

// ---------------------------------------------------------------------------
// Failures
// ---------------------------------------------------------------------------

#[test]
fn fetch_failure_never_creates() {
    let failure = StoreError::Network("connection reset".into());
    let store = MemoryStore::new().fail_on(FailOn::GetEntry(failure));
    let outcome =
        reconciler(&store, options()).reconcile("docs/intro.md", Some(&doc("en", "x")), None);

    assert_eq!(outcome, Outcome::failed(Step::Fetch, "network error: connection reset"));
    assert_eq!(store.operations(), vec![StoreOperation::GetEntry { id: ID.to_string() }]);
    assert_eq!(store.entry_count(), 0);
}

#[test]
fn version_conflict_is_reported_verbatim() {
    let store = MemoryStore::new();
    let reconciler = reconciler(&store, options());
    reconciler.reconcile("docs/intro.md", Some(&doc("en", "x")), None);

    let store = store.fail_on(FailOn::UpdateEntry(StoreError::VersionConflict(
        "VersionMismatch".into(),
    )));
    let outcome = reconciler.reconcile("docs/intro.md", Some(&doc("en", "y")), None);

    assert_eq!(outcome.to_string(), "update failed: version conflict: VersionMismatch");
    assert_eq!(
        store.entry(ID).and_then(|e| e.fields.get_str("markdown", "en-US").map(str::to_string)),
        Some("x".to_string())
    );
}

#[test]
fn publish_failure_keeps_the_created_entry() {
    let store = MemoryStore::new().fail_on(FailOn::PublishEntry(StoreError::Api {
        status: 422,
        message: "Validation error".into(),
    }));
    let outcome =
        reconciler(&store, options()).reconcile("docs/intro.md", Some(&doc("en", "x")), None);

    assert_eq!(
        outcome,
        Outcome::Created {
            version: 1,
            published: false
        }
    );
    assert!(!store.entry(ID).expect("entry").is_published());
}

#[test]
fn create_failure_is_reported() {
    let failure = StoreError::Auth("no access".into());
    let store = MemoryStore::new().fail_on(FailOn::CreateEntry(failure));
    let outcome =
        reconciler(&store, options()).reconcile("docs/intro.md", Some(&doc("en", "x")), None);
    assert!(matches!(outcome, Outcome::Failed { step: Step::Create, .. }), "got {outcome:?}");
    assert!(outcome.is_failure());
}

// ---------------------------------------------------------------------------
// Dry run
// ---------------------------------------------------------------------------

#[test]
fn dry_run_reports_diff_without_mutations() {
    let store = MemoryStore::new();
    reconciler(&store, options()).reconcile("docs/intro.md", Some(&doc("en", "old line\n")), None);
    store.clear_operations();

    let dry = reconciler(
        &store,
        ReconcileOptions {
            dry_run: true,
            ..options()
        },
    );
    let outcome = dry.reconcile("docs/intro.md", Some(&doc("en", "new line\n")), None);

    let Outcome::WouldUpdate { diff } = outcome else {
        panic!("expected would-update, got {outcome:?}");
    };
    assert!(diff.contains("--- a/docs/intro.md"), "got: {diff}");
    assert!(diff.contains("-old line"));
    assert!(diff.contains("+new line"));

    let created = dry.reconcile(
        "docs/other.md",
        Some("---\nslug: other\nlang: en\ntitle: O\n---\nx"),
        None,
    );
    assert_eq!(created, Outcome::WouldCreate);
    assert!(store.operations().iter().all(|op| !op.is_mutation()));
}

// ---------------------------------------------------------------------------
// Missing content strategies
// ---------------------------------------------------------------------------

fn removal_options(strategy: MissingContentStrategy) -> ReconcileOptions {
    ReconcileOptions {
        on_missing_content: strategy,
        ..options()
    }
}

#[test]
fn archive_strategy_archives_the_last_locale() {
    let store = MemoryStore::new();
    let reconciler = reconciler(&store, removal_options(MissingContentStrategy::Archive));
    let previous = doc("en", "x");
    reconciler.reconcile("docs/intro.md", Some(&previous), None);
    store.clear_operations();

    let outcome = reconciler.reconcile("docs/intro.md", None, Some(&previous));

    assert_eq!(
        outcome,
        Outcome::Removed {
            removal: Removal::Archived
        }
    );
    let entry = store.entry(ID).expect("entry");
    assert!(entry.is_archived());
    assert!(!entry.is_published());
    assert_eq!(
        store.operations(),
        vec![
            StoreOperation::GetEntry { id: ID.to_string() },
            StoreOperation::UnpublishEntry { id: ID.to_string() },
            StoreOperation::ArchiveEntry { id: ID.to_string() },
        ]
    );

    let again = reconciler.reconcile("docs/intro.md", None, Some(&previous));
    assert!(matches!(again, Outcome::NoAction { .. }), "got {again:?}");
}

#[test]
fn delete_strategy_deletes_the_last_locale() {
    let store = MemoryStore::new();
    let reconciler = reconciler(&store, removal_options(MissingContentStrategy::Delete));
    let previous = doc("en", "x");
    reconciler.reconcile("docs/intro.md", Some(&previous), None);

    let outcome = reconciler.reconcile("docs/intro.md", None, Some(&previous));
    assert_eq!(
        outcome,
        Outcome::Removed {
            removal: Removal::Deleted
        }
    );
    assert_eq!(store.entry_count(), 0);
}

#[test]
fn removing_one_locale_keeps_the_others() {
    let store = MemoryStore::new();
    let reconciler = reconciler(&store, removal_options(MissingContentStrategy::Archive));
    reconciler.reconcile("docs/intro.md", Some(&doc("en", "Hello\n")), None);
    let japanese = doc("ja", "こんにちは\n");
    reconciler.reconcile("docs/intro.ja.md", Some(&japanese), None);

    let outcome = reconciler.reconcile("docs/intro.ja.md", None, Some(&japanese));

    assert_eq!(
        outcome,
        Outcome::Removed {
            removal: Removal::LocaleRemoved
        }
    );
    let entry = store.entry(ID).expect("entry");
    assert!(!entry.is_archived());
    assert_eq!(entry.fields.get_str("markdown", "en-US"), Some("Hello\n"));
    assert_eq!(entry.fields.get_str("markdown", "ja-JP"), None);
}

#[test]
fn removal_of_unknown_entry_is_a_no_op() {
    let store = MemoryStore::new();
    let outcome = reconciler(&store, removal_options(MissingContentStrategy::Delete)).reconcile(
        "docs/intro.md",
        None,
        Some(&doc("en", "x")),
    );
    assert!(matches!(outcome, Outcome::NoAction { .. }), "got {outcome:?}");
    assert!(store.operations().iter().all(|op| !op.is_mutation()));
}

#[test]
fn dry_run_removal_touches_nothing() {
    let store = MemoryStore::new();
    let previous = doc("en", "x");
    reconciler(&store, options()).reconcile("docs/intro.md", Some(&previous), None);
    store.clear_operations();

    let outcome = reconciler(
        &store,
        ReconcileOptions {
            dry_run: true,
            ..removal_options(MissingContentStrategy::Delete)
        },
    )
    .reconcile("docs/intro.md", None, Some(&previous));

    assert_eq!(
        outcome,
        Outcome::WouldRemove {
            removal: Removal::Deleted
        }
    );
    assert_eq!(store.entry_count(), 1);
    assert!(store.operations().iter().all(|op| !op.is_mutation()));
}
