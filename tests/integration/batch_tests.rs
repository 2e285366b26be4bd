//! Batch runs backed by a SQLite store

use crate::test_engine;
use page_insight::crawler::TargetRegistry;
use page_insight::storage::{SqliteStorage, Storage, StoreRegistry};
use page_insight::{BatchError, CrawlStatus, FailureReason};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const DB_FILE: &str = "insight.db";

/// Opens a registry over a fresh database in a temporary directory
fn create_registry() -> (TempDir, Arc<StoreRegistry<SqliteStorage>>) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let storage = SqliteStorage::new(&dir.path().join(DB_FILE)).expect("Failed to open database");
    (dir, Arc::new(StoreRegistry::new(storage)))
}

fn add_target(registry: &StoreRegistry<SqliteStorage>, url: &str) -> i64 {
    registry.lock().unwrap().insert_target(url).unwrap()
}

async fn mount_page(server: &MockServer, route: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_batch_updates_store() {
    let site = MockServer::start().await;
    mount_page(
        &site,
        "/home",
        "<!doctype html><title>Home</title><h1>Hi</h1><a href=\"/docs\">Docs</a>",
    )
    .await;
    Mock::given(method("HEAD"))
        .and(path("/docs"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&site)
        .await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&site)
        .await;

    let (_dir, registry) = create_registry();
    let home = add_target(&registry, &format!("{}/home", site.uri()));
    let gone = add_target(&registry, &format!("{}/gone", site.uri()));

    let engine = test_engine(2);
    let mut dispatch = engine
        .run_batch(vec![home, gone], Arc::clone(&registry))
        .unwrap();

    assert_eq!(dispatch.dispatched, 2);
    assert!(dispatch.unresolvable.is_empty());

    let report = dispatch.handle.wait().await;
    assert_eq!(report.done, 1);
    assert_eq!(report.fetch_errors, 1);

    let storage = registry.lock().unwrap();

    let record = storage.get_target(home).unwrap();
    assert_eq!(record.status, CrawlStatus::Done);
    let result = record.result.expect("done record carries a result");
    assert_eq!(result.title, "Home");
    assert_eq!(result.headings.h1, 1);
    assert_eq!(result.internal_link_count, 1);
    assert_eq!(result.broken_link_count, 0);

    let record = storage.get_target(gone).unwrap();
    assert_eq!(record.status, CrawlStatus::Error);
    assert_eq!(record.failure_reason, Some(FailureReason::FetchError));
    assert!(record.result.is_none());
    assert!(record.error_message.unwrap().contains("404"));
}

#[tokio::test]
async fn test_batch_reports_unresolvable_ids() {
    let site = MockServer::start().await;
    mount_page(&site, "/", "<title>Only</title>").await;

    let (_dir, registry) = create_registry();
    let id = add_target(&registry, &format!("{}/", site.uri()));

    let mut dispatch = test_engine(1)
        .run_batch(vec![id + 100, id, id + 200], Arc::clone(&registry))
        .unwrap();

    assert_eq!(dispatch.dispatched, 1);
    assert_eq!(dispatch.unresolvable, vec![id + 100, id + 200]);

    dispatch.handle.wait().await;
    assert_eq!(
        registry.lock().unwrap().get_target(id).unwrap().status,
        CrawlStatus::Done
    );
}

#[tokio::test]
async fn test_targets_running_before_tasks_finish() {
    let site = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<title>Slow</title>")
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&site)
        .await;

    let (_dir, registry) = create_registry();
    let id = add_target(&registry, &format!("{}/slow", site.uri()));

    let mut dispatch = test_engine(1)
        .run_batch(vec![id], Arc::clone(&registry))
        .unwrap();

    assert_eq!(
        registry.lock().unwrap().get_target(id).unwrap().status,
        CrawlStatus::Running
    );

    dispatch.handle.wait().await;
    assert_eq!(
        registry.lock().unwrap().get_target(id).unwrap().status,
        CrawlStatus::Done
    );
}

#[tokio::test]
async fn test_empty_batch_rejected() {
    let (_dir, registry) = create_registry();
    add_target(&registry, "https://example.com/");

    let result = test_engine(1).run_batch(Vec::new(), Arc::clone(&registry));
    assert!(matches!(result, Err(BatchError::EmptyBatch)));

    let storage = registry.lock().unwrap();
    assert_eq!(storage.count_by_status(CrawlStatus::Queued).unwrap(), 1);
}

#[tokio::test]
async fn test_failed_target_can_be_rerun() {
    let site = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&site)
        .await;
    mount_page(&site, "/flaky", "<title>Back</title>").await;

    let (_dir, registry) = create_registry();
    let id = add_target(&registry, &format!("{}/flaky", site.uri()));
    let engine = test_engine(1);

    let mut first = engine.run_batch(vec![id], Arc::clone(&registry)).unwrap();
    first.handle.wait().await;
    assert_eq!(
        registry.lock().unwrap().get_target(id).unwrap().status,
        CrawlStatus::Error
    );

    let mut second = engine.run_batch(vec![id], Arc::clone(&registry)).unwrap();
    second.handle.wait().await;

    let record = registry.lock().unwrap().get_target(id).unwrap();
    assert_eq!(record.status, CrawlStatus::Done);
    assert!(record.failure_reason.is_none());
    assert_eq!(record.result.unwrap().title, "Back");
}

#[tokio::test]
async fn test_cancel_leaves_nothing_running() {
    let site = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<title>Never</title>")
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&site)
        .await;

    let (_dir, registry) = create_registry();
    let ids: Vec<i64> = (0..3)
        .map(|i| add_target(&registry, &format!("{}/page{}", site.uri(), i)))
        .collect();

    let mut dispatch = test_engine(1)
        .run_batch(ids.clone(), Arc::clone(&registry))
        .unwrap();

    tokio::time::sleep(Duration::from_millis(50)).await;
    dispatch.handle.cancel();
    let report = dispatch.handle.wait().await;
    assert_eq!(report.cancelled, 3);

    let storage = registry.lock().unwrap();
    assert_eq!(storage.count_by_status(CrawlStatus::Running).unwrap(), 0);
    for id in ids {
        let record = storage.get_target(id).unwrap();
        assert_eq!(record.status, CrawlStatus::Error);
        assert_eq!(record.failure_reason, Some(FailureReason::Cancelled));
    }
}

#[tokio::test]
async fn test_registry_resolves_stored_url() {
    let (_dir, registry) = create_registry();
    let id = add_target(&registry, "https://example.com/page");

    assert_eq!(registry.resolve(&id).unwrap(), "https://example.com/page");
    assert!(registry.resolve(&(id + 1)).is_err());
}

#[tokio::test]
async fn test_target_that_cannot_be_marked_running_is_not_dispatched() {
    let site = MockServer::start().await;
    mount_page(&site, "/", "<title>Page</title>").await;

    let (dir, registry) = create_registry();
    let id = add_target(&registry, &format!("{}/", site.uri()));

    // Another writer rejects every update, as a locked database would
    let other = rusqlite::Connection::open(dir.path().join(DB_FILE)).unwrap();
    other
        .execute_batch(
            "CREATE TRIGGER reject_updates BEFORE UPDATE ON targets
             BEGIN SELECT RAISE(ABORT, 'database is locked'); END;",
        )
        .unwrap();

    let mut dispatch = test_engine(1)
        .run_batch(vec![id], Arc::clone(&registry))
        .unwrap();

    assert_eq!(dispatch.dispatched, 0);
    assert_eq!(dispatch.unresolvable, vec![id]);
    assert_eq!(dispatch.handle.wait().await.total(), 0);

    let record = registry.lock().unwrap().get_target(id).unwrap();
    assert_eq!(record.status, CrawlStatus::Queued);
}
