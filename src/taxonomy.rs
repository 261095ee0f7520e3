//! Theme Taxonomy
//!
//! The static topic hierarchy records are classified under. On disk it is
//! JSON: a leaf is a string, a group is a single-key object mapping the
//! group label to its children, and the root is an object of top-level
//! groups (or an array of nodes).
//!
//! ```json
//! { "Docking": ["FixedTarget", { "MovingTarget": ["GroundVehicle"] }] }
//! ```
//!
//! Document order is kept everywhere; it only matters for output determinism.

use include_dir::{include_dir, Dir};
use serde::de::{self, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::Path;

use crate::config::TaxonomyConfig;
use crate::error::{Error, Result};
use crate::graph::{GraphConnection, ThemeSet};

/// Taxonomies compiled into the binary, addressed by file stem
static EMBEDDED: Dir<'static> = include_dir!("$CARGO_MANIFEST_DIR/taxonomies");

/// Name of the embedded taxonomy used when nothing else is configured
pub const DEFAULT_TAXONOMY: &str = "docking";

/// A theme, either a leaf or a group of child themes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaxonomyNode {
    Leaf(String),
    Group {
        label: String,
        children: Vec<TaxonomyNode>,
    },
}

impl TaxonomyNode {
    pub fn leaf(label: impl Into<String>) -> Self {
        TaxonomyNode::Leaf(label.into())
    }

    pub fn group(label: impl Into<String>, children: Vec<TaxonomyNode>) -> Self {
        TaxonomyNode::Group {
            label: label.into(),
            children,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            TaxonomyNode::Leaf(label) => label,
            TaxonomyNode::Group { label, .. } => label,
        }
    }

    /// Pre-order: own label, then each child subtree.
    fn collect_labels(&self, out: &mut Vec<String>) {
        out.push(self.label().to_string());
        if let TaxonomyNode::Group { children, .. } = self {
            for child in children {
                child.collect_labels(out);
            }
        }
    }

    /// One edge per direct child; a child group's own edges follow its edge.
    fn collect_edges(&self, out: &mut Vec<GraphConnection>) {
        let TaxonomyNode::Group { label, children } = self else {
            return;
        };
        for child in children {
            out.push(GraphConnection::in_theme(label.as_str(), child.label()));
            child.collect_edges(out);
        }
    }

    fn render(&self, depth: usize, out: &mut String) {
        out.push_str(&"  ".repeat(depth));
        out.push_str(self.label());
        out.push('\n');
        if let TaxonomyNode::Group { children, .. } = self {
            for child in children {
                child.render(depth + 1, out);
            }
        }
    }
}

impl<'de> Deserialize<'de> for TaxonomyNode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_any(NodeVisitor)
    }
}

struct NodeVisitor;

impl<'de> Visitor<'de> for NodeVisitor {
    type Value = TaxonomyNode;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a theme label or a single-key object of child themes")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<Self::Value, E> {
        Ok(TaxonomyNode::Leaf(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> std::result::Result<Self::Value, E> {
        Ok(TaxonomyNode::Leaf(v))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<Self::Value, A::Error> {
        let Some((label, children)) = map.next_entry::<String, Vec<TaxonomyNode>>()? else {
            return Err(de::Error::custom("theme group has no label"));
        };
        if let Some(extra) = map.next_key::<String>()? {
            return Err(de::Error::custom(format!(
                "theme group `{}` has a second key `{}`",
                label, extra
            )));
        }
        Ok(TaxonomyNode::Group { label, children })
    }
}

/// The whole hierarchy: an ordered list of top-level nodes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Taxonomy {
    roots: Vec<TaxonomyNode>,
}

impl Taxonomy {
    pub fn new(roots: Vec<TaxonomyNode>) -> Self {
        Self { roots }
    }

    pub fn roots(&self) -> &[TaxonomyNode] {
        &self.roots
    }

    /// Parse a taxonomy from JSON text
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| Error::InvalidTaxonomy(e.to_string()))
    }

    /// Load a taxonomy from a JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Load one of the taxonomies compiled into the binary
    pub fn embedded(name: &str) -> Result<Self> {
        let file = EMBEDDED
            .get_file(format!("{}.json", name))
            .ok_or_else(|| Error::UnknownTaxonomy(name.to_string()))?;
        let text = file
            .contents_utf8()
            .ok_or_else(|| Error::InvalidTaxonomy(format!("{} is not UTF-8", name)))?;
        Self::from_json(text)
    }

    /// Names of the embedded taxonomies, sorted
    pub fn embedded_names() -> Vec<String> {
        let mut names: Vec<String> = EMBEDDED
            .files()
            .filter_map(|f| f.path().file_stem())
            .filter_map(|s| s.to_str())
            .map(|s| s.to_string())
            .collect();
        names.sort();
        names
    }

    /// Resolve the configured taxonomy: a file path wins over an embedded name
    pub fn load(config: &TaxonomyConfig) -> Result<Self> {
        match &config.path {
            Some(path) => Self::from_file(path),
            None => Self::embedded(&config.name),
        }
    }

    /// Every label in pre-order, duplicates kept
    pub fn flatten_labels(&self) -> Vec<String> {
        let mut labels = Vec::new();
        for root in &self.roots {
            root.collect_labels(&mut labels);
        }
        labels
    }

    /// One `InTheme` edge per parent/child pair, parent label first
    pub fn flatten_edges(&self) -> Vec<GraphConnection> {
        let mut edges = Vec::new();
        for root in &self.roots {
            root.collect_edges(&mut edges);
        }
        edges
    }

    /// Label set used to link record tags to themes
    pub fn theme_set(&self) -> ThemeSet {
        ThemeSet::from_labels(self.flatten_labels())
    }

    /// Indented outline, one label per line
    pub fn render_tree(&self) -> String {
        let mut out = String::new();
        for root in &self.roots {
            root.render(0, &mut out);
        }
        out
    }
}

impl<'de> Deserialize<'de> for Taxonomy {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_any(RootVisitor)
    }
}

struct RootVisitor;

impl<'de> Visitor<'de> for RootVisitor {
    type Value = Taxonomy;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an object of top-level theme groups or an array of themes")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<Self::Value, A::Error> {
        let mut roots = Vec::new();
        while let Some((label, children)) = map.next_entry::<String, Vec<TaxonomyNode>>()? {
            roots.push(TaxonomyNode::Group { label, children });
        }
        Ok(Taxonomy { roots })
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> std::result::Result<Self::Value, A::Error> {
        let mut roots = Vec::new();
        while let Some(node) = seq.next_element::<TaxonomyNode>()? {
            roots.push(node);
        }
        Ok(Taxonomy { roots })
    }
}
