//! Search result types.

use serde::{Deserialize, Serialize};

use crate::node::{ClassificationNode, Level};

/// One ranked match returned by the search service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
    pub code: String,
    pub description: String,
    pub level: Level,

    /// Parent code, when the service reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_code: Option<String>,

    /// Relevance score, higher is better. Services are free to omit it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
}

impl SearchHit {
    pub fn new(code: impl Into<String>, description: impl Into<String>, level: Level) -> Self {
        Self {
            code: code.into(),
            description: description.into(),
            level,
            parent_code: None,
            score: None,
        }
    }

    #[must_use]
    pub fn with_score(mut self, score: f32) -> Self {
        self.score = Some(score);
        self
    }
}

impl From<&ClassificationNode> for SearchHit {
    fn from(node: &ClassificationNode) -> Self {
        Self {
            code: node.code.clone(),
            description: node.description.clone(),
            level: node.level,
            parent_code: node.parent_code.clone(),
            score: None,
        }
    }
}
