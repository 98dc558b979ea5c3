//! Classification tree nodes.
//!
//! A tariff schedule is a four-level hierarchy:
//!
//! ```text
//! Section     XVI          Machinery and mechanical appliances; electrical equipment
//! Chapter     85           Electrical machinery and equipment
//! Heading     8517         Telephone sets, including smartphones
//! Subheading  8517.12.00   Telephones for cellular networks
//! ```
//!
//! Nodes arrive from the remote service without children. Children are
//! attached by the node store once they have been fetched, so a node can be
//! `has_children == true` while `children` is still `None`.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Ordered list of shared nodes.
///
/// Cloning a `NodeList` only bumps a reference count, so unchanged branches of
/// the tree are shared between successive snapshots.
pub type NodeList = Arc<[Arc<ClassificationNode>]>;

/// Returns an empty node list.
pub fn empty_node_list() -> NodeList {
    Arc::from(Vec::new())
}

/// Depth of a node in the tariff hierarchy, coarser to finer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Section,
    Chapter,
    Heading,
    Subheading,
}

impl Level {
    /// Display label.
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Section => "Section",
            Self::Chapter => "Chapter",
            Self::Heading => "Heading",
            Self::Subheading => "Subheading",
        }
    }

    /// Zero-based depth (sections are 0).
    pub const fn depth(&self) -> usize {
        match self {
            Self::Section => 0,
            Self::Chapter => 1,
            Self::Heading => 2,
            Self::Subheading => 3,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single node of the classification tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationNode {
    /// Canonical classification code (e.g., "8517.12.00"). Unique per tree.
    pub code: String,

    /// Official description of the code.
    pub description: String,

    /// Hierarchy level.
    pub level: Level,

    /// Code of the parent node. `None` only for sections.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_code: Option<String>,

    /// Whether the service reports children for this node, loaded or not.
    #[serde(default)]
    pub has_children: bool,

    /// Children, present once they have been fetched at least once.
    #[serde(skip)]
    pub children: Option<NodeList>,
}

impl ClassificationNode {
    /// Create a top-level (section) node.
    pub fn root(code: impl Into<String>, description: impl Into<String>, has_children: bool) -> Self {
        Self {
            code: code.into(),
            description: description.into(),
            level: Level::Section,
            parent_code: None,
            has_children,
            children: None,
        }
    }

    /// Create a node under `parent_code`.
    pub fn child(
        code: impl Into<String>,
        description: impl Into<String>,
        level: Level,
        parent_code: impl Into<String>,
        has_children: bool,
    ) -> Self {
        Self {
            code: code.into(),
            description: description.into(),
            level,
            parent_code: Some(parent_code.into()),
            has_children,
            children: None,
        }
    }

    /// True for section nodes.
    pub fn is_root(&self) -> bool {
        self.parent_code.is_none()
    }

    /// True if the server-reported fields match, ignoring load state.
    ///
    /// Used to decide whether a re-fetched node may keep its cached subtree.
    pub fn same_server_fields(&self, other: &ClassificationNode) -> bool {
        self.code == other.code
            && self.description == other.description
            && self.level == other.level
            && self.parent_code == other.parent_code
            && self.has_children == other.has_children
    }

    /// Copy of this node without its children.
    pub fn detached(&self) -> Self {
        Self {
            children: None,
            ..self.clone()
        }
    }

    /// Copy of this node with `children` replaced.
    ///
    /// Leaf nodes never acquire a child list; the call returns the node
    /// unchanged in that case.
    pub fn with_children(&self, children: NodeList) -> Self {
        if !self.has_children {
            return self.clone();
        }
        Self {
            children: Some(children),
            ..self.clone()
        }
    }
}

impl PartialEq for ClassificationNode {
    fn eq(&self, other: &Self) -> bool {
        self.same_server_fields(other) && self.children == other.children
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_order_is_coarse_to_fine() {
        assert!(Level::Section < Level::Chapter);
        assert!(Level::Chapter < Level::Heading);
        assert!(Level::Heading < Level::Subheading);
        assert_eq!(Level::Subheading.depth(), 3);
    }

    #[test]
    fn leaf_never_acquires_children() {
        let leaf = ClassificationNode::child("0101", "Live horses", Level::Heading, "01", false);
        let result = leaf.with_children(Arc::from(vec![Arc::new(ClassificationNode::child(
            "0101.21",
            "Pure-bred",
            Level::Subheading,
            "0101",
            false,
        ))]));
        assert!(result.children.is_none());
    }

    #[test]
    fn same_server_fields_ignores_children() {
        let node = ClassificationNode::root("I", "Live animals", true);
        let loaded = node.with_children(empty_node_list());
        assert!(node.same_server_fields(&loaded));
        assert_ne!(node, loaded);
    }
}
