//! Classification node store.
//!
//! An in-memory, partially loaded copy of the classification tree. Roots are
//! fetched once; children are fetched on first expansion and merged into the
//! tree under their parent.
//!
//! ## Merge
//!
//! The tree is persistent: nodes are `Arc`s and a merge path-copies only the
//! spine from the root down to the expanded node. Every other subtree keeps
//! its `Arc`, so a renderer can skip unchanged branches by pointer comparison.
//! The target is located through a `code -> parent` index rather than by
//! scanning descendants.
//!
//! ## In-flight fetches
//!
//! At most one fetch runs per code (and one for the root set). Callers that
//! arrive while a fetch is pending await the same shared future and receive
//! the same merged list. The merge runs inside that future, exactly once.
//! A failed fetch leaves the tree untouched, so retrying is always safe.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use tariff_model::{ClassificationNode, FetchError, FetchResult, NodeList, empty_node_list};
use tracing::{debug, info, warn};

use crate::source::ClassificationSource;

type SharedFetch = Shared<BoxFuture<'static, FetchResult<NodeList>>>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum FetchKey {
    Roots,
    Children(String),
}

impl FetchKey {
    fn target(&self) -> &str {
        match self {
            Self::Roots => "root nodes",
            Self::Children(code) => code,
        }
    }
}

/// Session-scoped cache of the classification tree.
///
/// Cheap to clone; clones share the same cache.
#[derive(Clone)]
pub struct NodeStore {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    source: Arc<dyn ClassificationSource>,
    fetch_timeout: Option<Duration>,
    tree: Mutex<TreeState>,
    inflight: Mutex<HashMap<FetchKey, SharedFetch>>,
}

impl NodeStore {
    pub fn new(source: Arc<dyn ClassificationSource>) -> Self {
        Self::with_timeout(source, None)
    }

    /// Store whose fetches fail with [`FetchError::Timeout`] after `timeout`.
    pub fn with_timeout(source: Arc<dyn ClassificationSource>, timeout: Option<Duration>) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                source,
                fetch_timeout: timeout,
                tree: Mutex::new(TreeState::default()),
                inflight: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Root nodes, fetched on first call and cached afterwards.
    pub async fn roots(&self) -> FetchResult<NodeList> {
        if let Some(roots) = self.cached_roots() {
            return Ok(roots);
        }
        self.shared_fetch(FetchKey::Roots).await
    }

    /// Children of `code`, fetched and merged on first call.
    ///
    /// Leaves resolve to an empty list without touching the network.
    pub async fn expand(&self, code: &str) -> FetchResult<NodeList> {
        {
            let tree = self.inner.lock_tree();
            let node = tree.find(code).ok_or_else(|| FetchError::UnknownNode {
                code: code.to_string(),
            })?;
            if let Some(children) = &node.children {
                debug!(code, "children cache hit");
                return Ok(Arc::clone(children));
            }
            if !node.has_children {
                return Ok(empty_node_list());
            }
        }
        self.shared_fetch(FetchKey::Children(code.to_string()))
            .await
    }

    /// Re-fetch the children of `code` even if they are cached.
    ///
    /// Children whose server fields did not change keep their loaded subtrees.
    pub async fn reload(&self, code: &str) -> FetchResult<NodeList> {
        {
            let tree = self.inner.lock_tree();
            let node = tree.find(code).ok_or_else(|| FetchError::UnknownNode {
                code: code.to_string(),
            })?;
            if !node.has_children {
                return Ok(empty_node_list());
            }
        }
        self.shared_fetch(FetchKey::Children(code.to_string()))
            .await
    }

    /// Cached root set, if loaded.
    pub fn cached_roots(&self) -> Option<NodeList> {
        self.inner.lock_tree().roots.clone()
    }

    /// Cached node for `code`.
    pub fn get(&self, code: &str) -> Option<Arc<ClassificationNode>> {
        self.inner.lock_tree().find(code)
    }

    /// Chain of cached nodes from the root down to `code` (inclusive).
    pub fn path_to(&self, code: &str) -> Vec<Arc<ClassificationNode>> {
        self.inner.lock_tree().path_nodes(code).unwrap_or_default()
    }

    /// Number of cached nodes.
    pub fn len(&self) -> usize {
        self.inner.lock_tree().parents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn shared_fetch(&self, key: FetchKey) -> SharedFetch {
        let mut inflight = self.inner.lock_inflight();
        if let Some(pending) = inflight.get(&key) {
            debug!(target = key.target(), "joining in-flight fetch");
            return pending.clone();
        }

        let inner = Arc::clone(&self.inner);
        let task_key = key.clone();
        let fetch = async move {
            let result = inner.run_fetch(&task_key).await;
            inner.lock_inflight().remove(&task_key);
            result
        }
        .boxed()
        .shared();
        inflight.insert(key, fetch.clone());
        fetch
    }
}

impl StoreInner {
    fn lock_tree(&self) -> MutexGuard<'_, TreeState> {
        self.tree.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_inflight(&self) -> MutexGuard<'_, HashMap<FetchKey, SharedFetch>> {
        self.inflight.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn run_fetch(&self, key: &FetchKey) -> FetchResult<NodeList> {
        match key {
            FetchKey::Roots => {
                debug!("fetching root nodes");
                let nodes = self
                    .bounded(key, self.source.fetch_root_nodes())
                    .await
                    .inspect_err(|e| warn!("root fetch failed: {e}"))?;
                self.lock_tree().install_roots(nodes)
            }
            FetchKey::Children(code) => {
                debug!(code = code.as_str(), "fetching children");
                let nodes = self
                    .bounded(key, self.source.fetch_children(code))
                    .await
                    .inspect_err(|e| warn!("children fetch failed: {e}"))?;
                self.lock_tree().merge_children(code, nodes)
            }
        }
    }

    async fn bounded<F>(&self, key: &FetchKey, fetch: F) -> FetchResult<Vec<ClassificationNode>>
    where
        F: Future<Output = FetchResult<Vec<ClassificationNode>>>,
    {
        match self.fetch_timeout {
            Some(limit) => tokio::time::timeout(limit, fetch)
                .await
                .map_err(|_| FetchError::Timeout {
                    target: key.target().to_string(),
                    timeout_ms: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
                })?,
            None => fetch.await,
        }
    }
}

/// Tree snapshot plus the parent index.
#[derive(Debug, Clone, Default)]
struct TreeState {
    roots: Option<NodeList>,
    /// code -> parent code (`None` for roots). One entry per cached node.
    parents: HashMap<String, Option<String>>,
}

impl TreeState {
    fn install_roots(&mut self, nodes: Vec<ClassificationNode>) -> FetchResult<NodeList> {
        if let Some(roots) = &self.roots {
            return Ok(Arc::clone(roots));
        }

        let mut seen = HashSet::new();
        let mut roots = Vec::with_capacity(nodes.len());
        for node in nodes {
            if let Some(parent) = &node.parent_code {
                return Err(FetchError::decode(
                    "root nodes",
                    format!("root {} names parent {}", node.code, parent),
                ));
            }
            if !seen.insert(node.code.clone()) {
                warn!(code = node.code.as_str(), "duplicate root ignored");
                continue;
            }
            roots.push(Arc::new(node.detached()));
        }

        for node in &roots {
            self.parents.insert(node.code.clone(), None);
        }
        let roots: NodeList = Arc::from(roots);
        info!(count = roots.len(), "loaded root nodes");
        self.roots = Some(Arc::clone(&roots));
        Ok(roots)
    }

    /// Codes from the root down to `code`, or `None` if `code` is not cached.
    fn chain(&self, code: &str) -> Option<Vec<String>> {
        let mut chain = vec![code.to_string()];
        let mut current = self.parents.get(code)?;
        while let Some(parent) = current {
            if chain.len() > self.parents.len() {
                // Corrupt index (cycle)
                return None;
            }
            chain.push(parent.clone());
            current = self.parents.get(parent.as_str())?;
        }
        chain.reverse();
        Some(chain)
    }

    fn path_nodes(&self, code: &str) -> Option<Vec<Arc<ClassificationNode>>> {
        let chain = self.chain(code)?;
        let mut list = Arc::clone(self.roots.as_ref()?);
        let mut path = Vec::with_capacity(chain.len());
        for (depth, step) in chain.iter().enumerate() {
            let node = Arc::clone(list.iter().find(|n| &n.code == step)?);
            if depth + 1 < chain.len() {
                list = Arc::clone(node.children.as_ref()?);
            }
            path.push(node);
        }
        Some(path)
    }

    fn find(&self, code: &str) -> Option<Arc<ClassificationNode>> {
        self.path_nodes(code)?.pop()
    }

    fn merge_children(
        &mut self,
        parent_code: &str,
        fetched: Vec<ClassificationNode>,
    ) -> FetchResult<NodeList> {
        let unknown = || FetchError::UnknownNode {
            code: parent_code.to_string(),
        };
        let chain = self.chain(parent_code).ok_or_else(unknown)?;
        let roots = self.roots.clone().ok_or_else(unknown)?;

        // Validate before touching anything
        let mut seen = HashSet::new();
        let mut incoming = Vec::with_capacity(fetched.len());
        for node in fetched {
            if node.parent_code.as_deref() != Some(parent_code) {
                return Err(FetchError::ParentMismatch {
                    parent: parent_code.to_string(),
                    child: node.code,
                    found: node.parent_code,
                });
            }
            if matches!(self.parents.get(&node.code), Some(None)) {
                warn!(code = node.code.as_str(), "child reuses a root code, ignored");
                continue;
            }
            if !seen.insert(node.code.clone()) {
                warn!(code = node.code.as_str(), "duplicate child ignored");
                continue;
            }
            incoming.push(node);
        }

        let mut new_roots = roots;
        let mut unindexed: Vec<String> = Vec::new();

        // A code cached under another parent moves here (one node per code)
        for node in &incoming {
            if unindexed.contains(&node.code) {
                // Already detached with an ancestor moved above
                continue;
            }
            if let Some(Some(old_parent)) = self.parents.get(&node.code)
                && old_parent != parent_code
            {
                debug!(
                    code = node.code.as_str(),
                    from = old_parent.as_str(),
                    to = parent_code,
                    "re-parenting node"
                );
                let old_chain = self.chain(old_parent).ok_or_else(|| FetchError::UnknownNode {
                    code: old_parent.clone(),
                })?;
                let moved = node.code.clone();
                let mut detached = None;
                new_roots = rewrite(&new_roots, &old_chain, |old| {
                    let kept: Vec<_> = old
                        .children
                        .iter()
                        .flat_map(|children| children.iter())
                        .filter(|child| {
                            if child.code == moved {
                                detached = Some(Arc::clone(child));
                                false
                            } else {
                                true
                            }
                        })
                        .cloned()
                        .collect();
                    old.with_children(Arc::from(kept))
                })
                .ok_or_else(|| FetchError::UnknownNode {
                    code: old_parent.clone(),
                })?;
                if let Some(detached) = detached {
                    collect_descendants(&detached, &mut unindexed);
                }
            }
        }

        // Children as they stand after re-parenting, so a reused subtree never
        // still holds a node that moved here
        let current = find_in(&new_roots, &chain).ok_or_else(unknown)?;
        let previous: HashMap<&str, &Arc<ClassificationNode>> = current
            .children
            .iter()
            .flat_map(|children| children.iter())
            .map(|child| (child.code.as_str(), child))
            .collect();

        // Reuse unchanged children so their loaded subtrees survive a reload
        let mut reused = HashSet::new();
        let children: Vec<Arc<ClassificationNode>> = incoming
            .into_iter()
            .map(|node| match previous.get(node.code.as_str()) {
                Some(old) if old.same_server_fields(&node) => {
                    reused.insert(node.code.clone());
                    Arc::clone(old)
                }
                _ => Arc::new(node.detached()),
            })
            .collect();

        for (code, old) in &previous {
            if reused.contains(*code) {
                continue;
            }
            collect_descendants(old, &mut unindexed);
            if !children.iter().any(|c| c.code == *code) {
                unindexed.push((*code).to_string());
            }
        }

        let children: NodeList = Arc::from(children);
        let merged = Arc::clone(&children);
        new_roots = rewrite(&new_roots, &chain, move |node| node.with_children(merged))
            .ok_or_else(unknown)?;

        // Commit
        for code in unindexed {
            self.parents.remove(&code);
        }
        for child in children.iter() {
            self.parents
                .insert(child.code.clone(), Some(parent_code.to_string()));
        }
        self.roots = Some(new_roots);
        info!(parent = parent_code, count = children.len(), "merged children");
        Ok(children)
    }
}

/// Path-copy `list` along `chain`, replacing the last node with `f(node)`.
///
/// Nodes off the chain are carried over by reference.
fn rewrite<F>(list: &NodeList, chain: &[String], f: F) -> Option<NodeList>
where
    F: FnOnce(&ClassificationNode) -> ClassificationNode,
{
    let (head, rest) = chain.split_first()?;
    let index = list.iter().position(|node| &node.code == head)?;
    let current = &list[index];
    let replacement = if rest.is_empty() {
        f(current)
    } else {
        let children = current.children.as_ref()?;
        current.with_children(rewrite(children, rest, f)?)
    };
    let mut copy = list.to_vec();
    copy[index] = Arc::new(replacement);
    Some(Arc::from(copy))
}

/// Node at the end of `chain`, walking down from `list`.
fn find_in(list: &NodeList, chain: &[String]) -> Option<Arc<ClassificationNode>> {
    let (head, rest) = chain.split_first()?;
    let node = list.iter().find(|node| &node.code == head)?;
    if rest.is_empty() {
        return Some(Arc::clone(node));
    }
    find_in(node.children.as_ref()?, rest)
}

/// Push the codes of every loaded descendant of `node` (not `node` itself).
fn collect_descendants(node: &ClassificationNode, out: &mut Vec<String>) {
    for child in node.children.iter().flat_map(|children| children.iter()) {
        out.push(child.code.clone());
        collect_descendants(child, out);
    }
}
