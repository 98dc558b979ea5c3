#![allow(missing_docs)]

use std::path::Path;
use std::sync::Arc;

use tariff_catalog::load_catalog;
use tariff_cli::session::{Key, SessionReport, replay};
use tariff_navigator::{
    KeyValueStore, MemoryStore, Navigator, NavigatorConfig, RECENT_KEY, WidgetMode,
};

fn navigator(storage: Arc<MemoryStore>) -> Navigator {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../tariff-catalog/tests/data/catalog.json");
    let catalog = Arc::new(load_catalog(&path).expect("load fixture catalog"));
    Navigator::new(&NavigatorConfig::default(), catalog.clone(), catalog, storage)
}

fn keys(raw: &[&str]) -> Vec<Key> {
    raw.iter().map(|k| k.parse().unwrap()).collect()
}

fn codes(nav: &Navigator) -> Vec<String> {
    nav.view()
        .items
        .iter()
        .map(|item| item.code().to_string())
        .collect()
}

#[tokio::test]
async fn test_typing_issues_one_search_after_debounce() {
    let mut nav = navigator(Arc::new(MemoryStore::new()));
    let report = replay(&mut nav, &keys(&["type:mob"])).await;

    assert_eq!(
        report,
        SessionReport {
            committed: Vec::new(),
            searches_applied: 1,
            searches_stale: 0,
        }
    );
    assert_eq!(nav.mode(), WidgetMode::Searching);
    assert_eq!(codes(&nav), ["8517.12.00"]);
}

#[tokio::test]
async fn test_search_and_commit_persists_recent() {
    let storage = Arc::new(MemoryStore::new());
    let mut nav = navigator(storage.clone());
    let report = replay(&mut nav, &keys(&["type:mob", "wait:400", "down", "enter"])).await;

    assert_eq!(report.committed, ["8517.12.00"]);
    assert_eq!(nav.mode(), WidgetMode::Closed);
    assert_eq!(
        storage.get(RECENT_KEY).unwrap().as_deref(),
        Some(r#"["8517.12.00"]"#)
    );
}

#[tokio::test]
async fn test_keyboard_browse_to_heading() {
    let mut nav = navigator(Arc::new(MemoryStore::new()));
    let report = replay(
        &mut nav,
        &keys(&["down", "right", "down", "right", "down", "enter"]),
    )
    .await;

    assert_eq!(report.committed, ["0101"]);
    assert_eq!(nav.view().recent, ["0101"]);
}

#[tokio::test]
async fn test_pause_between_words_searches_twice() {
    let mut nav = navigator(Arc::new(MemoryStore::new()));
    let report = replay(&mut nav, &keys(&["type:mo", "wait:400", "type:b"])).await;

    assert_eq!(report.searches_applied, 2);
    assert_eq!(codes(&nav), ["8517.12.00"]);
}

#[tokio::test]
async fn test_backspace_below_threshold_cancels_search() {
    let mut nav = navigator(Arc::new(MemoryStore::new()));
    let report = replay(&mut nav, &keys(&["type:mo", "back"])).await;

    assert_eq!(report.searches_applied, 0);
    assert_eq!(nav.mode(), WidgetMode::Browsing);
    assert_eq!(codes(&nav), ["I", "XVI", "XVII"]);
}
