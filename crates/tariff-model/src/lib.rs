//! Data model for the tariff classification navigator.

pub mod error;
pub mod node;
pub mod search;

pub use error::{FetchError, FetchResult, PersistenceError, SearchError};
pub use node::{ClassificationNode, Level, NodeList, empty_node_list};
pub use search::SearchHit;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_serializes_camel_case_without_children() {
        let node = ClassificationNode::child("8517", "Telephone sets", Level::Heading, "85", true)
            .with_children(empty_node_list());
        let json = serde_json::to_value(&node).expect("serialize node");
        assert_eq!(json["parentCode"], "85");
        assert_eq!(json["hasChildren"], true);
        assert_eq!(json["level"], "heading");
        assert!(json.get("children").is_none());
    }

    #[test]
    fn fetch_error_user_message() {
        let error = FetchError::UnknownNode {
            code: "9999".to_string(),
        };
        assert_eq!(error.user_message(), "Classification 9999 is not available.");
    }
}
