//! Integration tests for hot-reload of the agreement config.
//!
//! Validates:
//! - The config is loaded once when the watcher starts
//! - Creating, editing, and deleting the file are picked up by polling
//! - A broken edit leaves the last good configuration in place

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use terms_of_service::store::watcher::AgreementWatcher;
use terms_of_service::store::AgreementStore;

const POLL: Duration = Duration::from_millis(50);

fn config_xml(link: &str) -> String {
    format!(
        r#"<terms-of-service>
            <agreement id="tos"><parameters>
                <param name="agreement-link" value="{link}"/>
            </parameters></agreement>
        </terms-of-service>"#
    )
}

fn config_file(store_dir: &Path) -> std::path::PathBuf {
    store_dir.join("terms-of-service-config.xml")
}

/// Poll `check` until it holds or five seconds pass.
async fn eventually(check: impl Fn() -> bool) -> bool {
    for _ in 0..200 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    check()
}

fn current_link(store: &AgreementStore) -> Option<String> {
    store
        .agreement("tos")
        .and_then(|a| a.link().map(str::to_owned))
}

#[tokio::test]
async fn start_loads_existing_config() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(config_file(dir.path()), config_xml("http://one")).expect("write");

    let watcher = AgreementWatcher::start(Arc::new(AgreementStore::new(dir.path())), POLL)
        .expect("watcher starts");

    assert_eq!(current_link(watcher.store()).as_deref(), Some("http://one"));
}

#[tokio::test]
async fn start_creates_missing_store_dir() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store_dir = dir.path().join("termsOfService");

    let watcher = AgreementWatcher::start(Arc::new(AgreementStore::new(&store_dir)), POLL)
        .expect("watcher starts");

    assert!(store_dir.is_dir());
    assert!(watcher.store().agreements().is_empty());
}

#[tokio::test]
async fn created_file_is_picked_up() {
    let dir = tempfile::tempdir().expect("tempdir");
    let watcher = AgreementWatcher::start(Arc::new(AgreementStore::new(dir.path())), POLL)
        .expect("watcher starts");
    let store = Arc::clone(watcher.store());

    fs::write(config_file(dir.path()), config_xml("http://one")).expect("write");

    assert!(eventually(|| current_link(&store).is_some()).await);
}

#[tokio::test]
async fn edited_file_is_picked_up() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(config_file(dir.path()), config_xml("http://one")).expect("write");
    let watcher = AgreementWatcher::start(Arc::new(AgreementStore::new(dir.path())), POLL)
        .expect("watcher starts");
    let store = Arc::clone(watcher.store());

    // Poll change detection compares modification times at second resolution.
    tokio::time::sleep(Duration::from_millis(1100)).await;
    fs::write(config_file(dir.path()), config_xml("http://two")).expect("rewrite");

    assert!(eventually(|| current_link(&store).as_deref() == Some("http://two")).await);
}

#[tokio::test]
async fn deleted_file_clears_agreements() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(config_file(dir.path()), config_xml("http://one")).expect("write");
    let watcher = AgreementWatcher::start(Arc::new(AgreementStore::new(dir.path())), POLL)
        .expect("watcher starts");
    let store = Arc::clone(watcher.store());

    fs::remove_file(config_file(dir.path())).expect("remove");

    assert!(eventually(|| store.agreements().is_empty()).await);
}

#[tokio::test]
async fn broken_edit_keeps_last_good_config() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(config_file(dir.path()), config_xml("http://one")).expect("write");
    let watcher = AgreementWatcher::start(Arc::new(AgreementStore::new(dir.path())), POLL)
        .expect("watcher starts");
    let store = Arc::clone(watcher.store());
    let loaded = store.snapshot().generation;

    tokio::time::sleep(Duration::from_millis(1100)).await;
    fs::write(config_file(dir.path()), "<terms-of-service><agreement").expect("break");
    tokio::time::sleep(Duration::from_millis(500)).await;

    assert_eq!(store.snapshot().generation, loaded);
    assert_eq!(current_link(&store).as_deref(), Some("http://one"));
}

#[tokio::test]
async fn unrelated_files_do_not_trigger_reload() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(config_file(dir.path()), config_xml("http://one")).expect("write");
    let watcher = AgreementWatcher::start(Arc::new(AgreementStore::new(dir.path())), POLL)
        .expect("watcher starts");
    let store = Arc::clone(watcher.store());
    let loaded = store.snapshot().generation;

    fs::write(dir.path().join("tos.html"), "<p>text</p>").expect("write text");
    tokio::time::sleep(Duration::from_millis(500)).await;

    assert_eq!(store.snapshot().generation, loaded);
}
