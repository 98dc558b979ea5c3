use std::collections::HashMap;

use async_trait::async_trait;
use tariff_model::{ClassificationNode, FetchError, SearchError, SearchHit};
use tariff_navigator::{ClassificationSource, SearchService};
use tracing::debug;

use crate::rank::{Query, rank};

/// Validated, in-memory classification catalog.
///
/// Serves the same calls as the remote tariff service, so the navigator can
/// run against a local file.
#[derive(Debug, Clone)]
pub struct Catalog {
    nodes: HashMap<String, ClassificationNode>,
    roots: Vec<String>,
    children: HashMap<String, Vec<String>>,
}

impl Catalog {
    /// Built by [`crate::build_catalog`] once validation has passed.
    pub(crate) fn new(
        nodes: HashMap<String, ClassificationNode>,
        roots: Vec<String>,
        children: HashMap<String, Vec<String>>,
    ) -> Self {
        Self {
            nodes,
            roots,
            children,
        }
    }

    pub fn get(&self, code: &str) -> Option<&ClassificationNode> {
        self.nodes.get(code)
    }

    /// Root codes in file order.
    pub fn root_codes(&self) -> &[String] {
        &self.roots
    }

    /// Direct children of `code` in file order, or `None` for unknown codes.
    pub fn children_of(&self, code: &str) -> Option<Vec<ClassificationNode>> {
        let node = self.nodes.get(code)?;
        if !node.has_children {
            return Some(Vec::new());
        }
        Some(self.resolve(self.children.get(code).map(Vec::as_slice).unwrap_or_default()))
    }

    /// Ranked matches for `query`.
    pub fn search(&self, query: &str, limit: usize) -> Vec<SearchHit> {
        let hits = rank(&Query::parse(query), self.nodes.values(), limit);
        debug!(query, hits = hits.len(), "catalog search");
        hits
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn resolve(&self, codes: &[String]) -> Vec<ClassificationNode> {
        codes
            .iter()
            .filter_map(|code| self.nodes.get(code))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl ClassificationSource for Catalog {
    async fn fetch_root_nodes(&self) -> Result<Vec<ClassificationNode>, FetchError> {
        Ok(self.resolve(&self.roots))
    }

    async fn fetch_children(&self, code: &str) -> Result<Vec<ClassificationNode>, FetchError> {
        self.children_of(code)
            .ok_or_else(|| FetchError::UnknownNode {
                code: code.to_string(),
            })
    }
}

#[async_trait]
impl SearchService for Catalog {
    async fn search_classifications(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<SearchHit>, SearchError> {
        Ok(self.search(query, limit))
    }
}
