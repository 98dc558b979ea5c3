#![allow(missing_docs)]

use tariff_model::{ClassificationNode, Level, SearchError, SearchHit};

#[test]
fn test_node_deserializes_service_payload() {
    let json = r#"[
        {"code":"01","description":"Live animals","level":"chapter","parentCode":"I","hasChildren":true},
        {"code":"I","description":"Live animals; animal products","level":"section"}
    ]"#;
    let nodes: Vec<ClassificationNode> = serde_json::from_str(json).unwrap();

    assert_eq!(nodes[0].parent_code.as_deref(), Some("I"));
    assert!(nodes[0].has_children);
    assert!(nodes[0].children.is_none());

    // Missing optional fields default
    assert!(nodes[1].is_root());
    assert!(!nodes[1].has_children);
}

#[test]
fn test_unknown_level_is_rejected() {
    let json = r#"{"code":"01","description":"x","level":"division"}"#;
    assert!(serde_json::from_str::<ClassificationNode>(json).is_err());
}

#[test]
fn test_search_hit_from_node() {
    let node = ClassificationNode::child(
        "8517.12.00",
        "Telephones for cellular networks",
        Level::Subheading,
        "8517",
        false,
    );
    let hit = SearchHit::from(&node).with_score(3.0);
    assert_eq!(hit.code, "8517.12.00");
    assert_eq!(hit.parent_code.as_deref(), Some("8517"));
    assert_eq!(hit.score, Some(3.0));
}

#[test]
fn test_search_error_display() {
    let error = SearchError::transport("mob", "connection reset");
    assert_eq!(
        error.to_string(),
        "search request for \"mob\" failed: connection reset"
    );
    assert_eq!(error.user_message(), "Search failed. Try again.");
}
