//! Tree presentation: expansion bookkeeping and the flattened row list.

use std::collections::HashSet;
use std::sync::Arc;

use tariff_model::{ClassificationNode, NodeList};

/// Codes whose children are currently shown.
///
/// Collapsing only removes the code from this set; cached children stay in
/// the node store, so re-expanding is instant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpansionSet {
    codes: HashSet<String>,
}

impl ExpansionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn expand(&mut self, code: impl Into<String>) -> bool {
        self.codes.insert(code.into())
    }

    pub fn collapse(&mut self, code: &str) -> bool {
        self.codes.remove(code)
    }

    pub fn contains(&self, code: &str) -> bool {
        self.codes.contains(code)
    }

    pub fn clear(&mut self) {
        self.codes.clear();
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

/// One visible row of the browse tree.
#[derive(Debug, Clone)]
pub struct TreeRow {
    pub node: Arc<ClassificationNode>,
    /// Indentation depth (roots are 0).
    pub depth: usize,
    /// Whether the row is expanded and its children are shown below it.
    pub expanded: bool,
}

impl TreeRow {
    pub fn code(&self) -> &str {
        &self.node.code
    }
}

/// Pre-order projection of the loaded tree.
///
/// Descends only into nodes that are both expanded and loaded.
pub fn flatten(roots: &NodeList, expansion: &ExpansionSet) -> Vec<TreeRow> {
    let mut rows = Vec::new();
    push_rows(roots, expansion, 0, &mut rows);
    rows
}

fn push_rows(list: &NodeList, expansion: &ExpansionSet, depth: usize, rows: &mut Vec<TreeRow>) {
    for node in list.iter() {
        let children = node
            .children
            .as_ref()
            .filter(|_| expansion.contains(&node.code));
        rows.push(TreeRow {
            node: Arc::clone(node),
            depth,
            expanded: children.is_some(),
        });
        if let Some(children) = children {
            push_rows(children, expansion, depth + 1, rows);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tariff_model::Level;

    fn tree() -> NodeList {
        let heading = Arc::new(ClassificationNode::child(
            "0101",
            "Live horses",
            Level::Heading,
            "01",
            false,
        ));
        let chapter = ClassificationNode::child("01", "Live animals", Level::Chapter, "I", true)
            .with_children(Arc::from(vec![heading]));
        let section = ClassificationNode::root("I", "Live animals; animal products", true)
            .with_children(Arc::from(vec![Arc::new(chapter)]));
        let unloaded = ClassificationNode::root("II", "Vegetable products", true);
        Arc::from(vec![Arc::new(section), Arc::new(unloaded)])
    }

    #[test]
    fn test_collapsed_tree_shows_roots_only() {
        let rows = flatten(&tree(), &ExpansionSet::new());
        let codes: Vec<_> = rows.iter().map(TreeRow::code).collect();
        assert_eq!(codes, vec!["I", "II"]);
        assert!(rows.iter().all(|r| !r.expanded));
    }

    #[test]
    fn test_expanded_rows_are_indented_in_preorder() {
        let mut expansion = ExpansionSet::new();
        expansion.expand("I");
        expansion.expand("01");
        // Expanded but not loaded: no rows below it
        expansion.expand("II");

        let rows = flatten(&tree(), &expansion);
        let shape: Vec<_> = rows.iter().map(|r| (r.code(), r.depth)).collect();
        assert_eq!(shape, vec![("I", 0), ("01", 1), ("0101", 2), ("II", 0)]);
        assert!(!rows[3].expanded);
    }

    #[test]
    fn test_collapse_hides_descendants() {
        let mut expansion = ExpansionSet::new();
        expansion.expand("I");
        expansion.expand("01");
        expansion.collapse("I");

        let rows = flatten(&tree(), &expansion);
        assert_eq!(rows.len(), 2);
        // Nested expansion state survives the collapse
        assert!(expansion.contains("01"));
    }
}
