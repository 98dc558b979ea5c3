#![allow(missing_docs)]

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tariff_catalog::{Catalog, load_catalog};
use tariff_model::{FetchError, Level};
use tariff_navigator::{
    ClassificationSource, MemoryStore, Navigator, NavigatorConfig, NavigatorEvent, SearchService,
};

fn fixture_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/data/catalog.json")
}

fn catalog() -> Catalog {
    load_catalog(&fixture_path()).expect("load fixture catalog")
}

fn ranked(catalog: &Catalog, query: &str) -> Vec<String> {
    catalog
        .search(query, 20)
        .into_iter()
        .map(|hit| format!("{} {}", hit.code, hit.level))
        .collect()
}

#[test]
fn test_fixture_loads() {
    let catalog = catalog();
    assert_eq!(catalog.len(), 21);
    assert_eq!(catalog.root_codes(), ["I", "XVI", "XVII"]);
    assert_eq!(catalog.get("8517.12.00").unwrap().level, Level::Subheading);
}

#[test]
fn test_search_ranking_snapshots() {
    let catalog = catalog();
    insta::assert_json_snapshot!("code_prefix_ranking", ranked(&catalog, "85"));
    insta::assert_json_snapshot!("description_ranking", ranked(&catalog, "motor"));
}

#[test]
fn test_search_by_word_and_limit() {
    let catalog = catalog();
    assert_eq!(ranked(&catalog, "mob"), ["8517.12.00 Subheading"]);
    assert_eq!(catalog.search("live", 20).len(), 4);
    assert_eq!(catalog.search("live", 2).len(), 2);
    assert!(catalog.search("zzz", 20).is_empty());

    let hit = &catalog.search("85171200", 1)[0];
    assert_eq!(hit.code, "8517.12.00");
    assert_eq!(hit.parent_code.as_deref(), Some("8517"));
    assert_eq!(hit.score, Some(1.0));
}

#[tokio::test]
async fn test_serves_tree_fetches_in_file_order() {
    let catalog = catalog();
    let roots = catalog.fetch_root_nodes().await.unwrap();
    let codes: Vec<_> = roots.iter().map(|n| n.code.as_str()).collect();
    assert_eq!(codes, ["I", "XVI", "XVII"]);

    let children = catalog.fetch_children("0101").await.unwrap();
    let codes: Vec<_> = children.iter().map(|n| n.code.as_str()).collect();
    assert_eq!(codes, ["0101.21.00", "0101.30.00"]);
    assert!(children.iter().all(|n| n.parent_code.as_deref() == Some("0101")));

    assert!(catalog.fetch_children("0102").await.unwrap().is_empty());
    assert_eq!(
        catalog.fetch_children("9999").await.unwrap_err(),
        FetchError::UnknownNode {
            code: "9999".into()
        }
    );

    let hits = catalog.search_classifications("mobile", 5).await.unwrap();
    assert_eq!(hits[0].code, "8517.12.00");
}

#[tokio::test]
async fn test_navigator_over_catalog() {
    let catalog = Arc::new(catalog());
    let storage = Arc::new(MemoryStore::new());
    let mut nav = Navigator::new(
        &NavigatorConfig::default(),
        catalog.clone(),
        catalog,
        storage,
    );
    let t0 = Instant::now();

    nav.handle(NavigatorEvent::Focus, t0).await;
    nav.expand("XVI").await.unwrap();
    nav.expand("85").await.unwrap();
    let codes: Vec<_> = nav
        .view()
        .items
        .iter()
        .map(|item| item.code().to_string())
        .collect();
    assert_eq!(codes, ["I", "XVI", "84", "85", "8517", "XVII"]);

    nav.handle(NavigatorEvent::Input("engine".into()), t0).await;
    nav.tick(t0 + Duration::from_millis(300)).await;
    let codes: Vec<_> = nav
        .view()
        .items
        .iter()
        .map(|item| item.code().to_string())
        .collect();
    assert_eq!(codes, ["8711.10.00", "8407", "8711"]);
}

#[test]
fn test_invalid_file_reports_path() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"[{{"code":"01","description":"Live animals","level":"chapter","parentCode":"I"}}]"#
    )
    .unwrap();

    let error = format!("{:#}", load_catalog(file.path()).unwrap_err());
    assert!(error.contains(&file.path().display().to_string()));
    assert!(error.contains("missing parent I"));
}
