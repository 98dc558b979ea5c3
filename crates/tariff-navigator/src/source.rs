//! Collaborators consumed by the navigator.
//!
//! The tariff service owns the classification tree and the search index. The
//! navigator only talks to it through these traits, so a remote HTTP client, a
//! local catalog file and a test fake are interchangeable.

use async_trait::async_trait;
use tariff_model::{ClassificationNode, FetchError, SearchError, SearchHit};

/// Lazily fetched classification tree.
#[async_trait]
pub trait ClassificationSource: Send + Sync + 'static {
    /// Fetch the top-level (section) nodes, in display order.
    async fn fetch_root_nodes(&self) -> Result<Vec<ClassificationNode>, FetchError>;

    /// Fetch the direct children of `code`, in display order.
    ///
    /// Every returned node must carry `parent_code == Some(code)`.
    async fn fetch_children(&self, code: &str) -> Result<Vec<ClassificationNode>, FetchError>;
}

/// Full-text search over the classification hierarchy.
#[async_trait]
pub trait SearchService: Send + Sync + 'static {
    /// Return at most `limit` hits for `query`, best match first.
    async fn search_classifications(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<SearchHit>, SearchError>;
}
