//! Catalog file loading and validation.
//!
//! A catalog file is JSON: either a flat array of nodes or an object with a
//! `nodes` array. Nodes use the same camelCase shape the tariff service
//! returns. Parents may appear after their children; display order among
//! siblings is file order.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail, ensure};
use serde::Deserialize;
use tariff_model::ClassificationNode;
use tracing::{debug, info};

use crate::catalog::Catalog;

#[derive(Deserialize)]
#[serde(untagged)]
enum CatalogFile {
    Flat(Vec<ClassificationNode>),
    Wrapped { nodes: Vec<ClassificationNode> },
}

impl CatalogFile {
    fn into_nodes(self) -> Vec<ClassificationNode> {
        match self {
            Self::Flat(nodes) | Self::Wrapped { nodes } => nodes,
        }
    }
}

/// Load and validate a catalog file.
pub fn load_catalog(path: &Path) -> Result<Catalog> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("read catalog: {}", path.display()))?;
    let catalog =
        parse_catalog(&raw).with_context(|| format!("load catalog: {}", path.display()))?;
    info!(
        path = %path.display(),
        nodes = catalog.len(),
        roots = catalog.root_codes().len(),
        "catalog loaded"
    );
    Ok(catalog)
}

/// Parse and validate catalog JSON.
pub fn parse_catalog(raw: &str) -> Result<Catalog> {
    let file: CatalogFile = serde_json::from_str(raw).context("parse catalog JSON")?;
    build_catalog(file.into_nodes())
}

/// Validate `nodes` and index them by parent.
///
/// Rules: codes are unique and non-empty, every `parentCode` names a node in
/// the catalog at a coarser level, and a node declaring `hasChildren` really
/// has some. A node with children but no flag gets the flag set.
pub fn build_catalog(nodes: Vec<ClassificationNode>) -> Result<Catalog> {
    let mut seen = HashSet::with_capacity(nodes.len());
    for node in &nodes {
        ensure!(!node.code.trim().is_empty(), "node with empty code");
        if !seen.insert(node.code.as_str()) {
            bail!("duplicate code {}", node.code);
        }
    }

    let levels: HashMap<&str, _> = nodes.iter().map(|n| (n.code.as_str(), n.level)).collect();
    let mut roots = Vec::new();
    let mut children: HashMap<String, Vec<String>> = HashMap::new();
    for node in &nodes {
        match &node.parent_code {
            None => roots.push(node.code.clone()),
            Some(parent) => {
                let Some(parent_level) = levels.get(parent.as_str()) else {
                    bail!("{} references missing parent {}", node.code, parent);
                };
                ensure!(
                    *parent_level < node.level,
                    "{} ({}) cannot sit under {} ({})",
                    node.code,
                    node.level,
                    parent,
                    parent_level
                );
                children
                    .entry(parent.clone())
                    .or_default()
                    .push(node.code.clone());
            }
        }
    }
    ensure!(!roots.is_empty(), "catalog has no root nodes");

    let mut by_code = HashMap::with_capacity(nodes.len());
    for mut node in nodes {
        let has_loaded = children.contains_key(&node.code);
        if node.has_children && !has_loaded {
            bail!("{} declares children but none are listed", node.code);
        }
        if has_loaded && !node.has_children {
            debug!(code = node.code.as_str(), "inferring hasChildren");
            node.has_children = true;
        }
        by_code.insert(node.code.clone(), node);
    }

    Ok(Catalog::new(by_code, roots, children))
}
