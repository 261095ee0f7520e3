//! Kumu Graph Document
//!
//! Elements and connections in the shape the Kumu JSON importer expects.
//! Elements are referenced by label; each element also carries an
//! [`ElementId`] that the assembler uses when duplicates are merged.
//!
//! - `linker`: matches record tags against taxonomy themes
//! - `assembler`: appends everything in stage order and collects failures
//! - `writer`: serializes the finished document

pub mod assembler;
pub mod linker;
pub mod writer;

pub use assembler::{build_graph, BuildOutput, BuildStats, GraphAssembler, GraphBuilder};
pub use linker::{link_to_themes, ThemeSet};
pub use writer::{save_document, to_json_string, write_document, OutputFormat};

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::identity::{ElementClass, ElementId};

/// Attributes of a bibliographic Item element
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemAttributes {
    /// Zotero item type, written as the element `type`
    pub item_type: String,
    pub zotero_link: String,
    pub original_link: String,
    pub description: String,
    pub publication: String,
    pub date: String,
    /// Relevant tags in record order, duplicates kept; `None` is written as `null`
    pub tags: Vec<Option<String>>,
}

/// What an element represents
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementKind {
    Theme,
    Person,
    Item(ItemAttributes),
}

impl ElementKind {
    /// Value of the serialized `type` key
    pub fn type_name(&self) -> &str {
        match self {
            ElementKind::Theme => "Theme",
            ElementKind::Person => "Person",
            ElementKind::Item(attrs) => &attrs.item_type,
        }
    }

    pub fn class(&self) -> ElementClass {
        match self {
            ElementKind::Theme => ElementClass::Theme,
            ElementKind::Person => ElementClass::Person,
            ElementKind::Item(_) => ElementClass::Item,
        }
    }
}

/// A node in the output graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphElement {
    pub id: ElementId,
    pub label: String,
    pub kind: ElementKind,
}

impl GraphElement {
    pub fn new(label: impl Into<String>, kind: ElementKind) -> Self {
        let label = label.into();
        Self {
            id: ElementId::new(kind.class(), &label),
            label,
            kind,
        }
    }

    pub fn theme(label: impl Into<String>) -> Self {
        Self::new(label, ElementKind::Theme)
    }

    pub fn person(label: impl Into<String>) -> Self {
        Self::new(label, ElementKind::Person)
    }

    pub fn item(label: impl Into<String>, attrs: ItemAttributes) -> Self {
        Self::new(label, ElementKind::Item(attrs))
    }
}

// Key order is part of the import format: label, type, then item attributes.
impl Serialize for GraphElement {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = match self.kind {
            ElementKind::Item(_) => 8,
            _ => 2,
        };
        let mut map = serializer.serialize_map(Some(len))?;
        map.serialize_entry("label", &self.label)?;
        map.serialize_entry("type", self.kind.type_name())?;
        if let ElementKind::Item(attrs) = &self.kind {
            map.serialize_entry("Zotero Link", &attrs.zotero_link)?;
            map.serialize_entry("Original Link", &attrs.original_link)?;
            map.serialize_entry("Description", &attrs.description)?;
            map.serialize_entry("Publication", &attrs.publication)?;
            map.serialize_entry("Date", &attrs.date)?;
            map.serialize_entry("Tag", &attrs.tags)?;
        }
        map.end()
    }
}

/// Types of edges in the output graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConnectionKind {
    /// Taxonomy containment, or a record classified under a theme
    InTheme,
    /// Person → Item
    Authorship,
}

/// An edge in the output graph, addressed by element labels
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GraphConnection {
    pub from: String,
    pub to: String,
    #[serde(rename = "type")]
    pub kind: ConnectionKind,
}

impl GraphConnection {
    pub fn in_theme(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            kind: ConnectionKind::InTheme,
        }
    }

    pub fn authorship(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            kind: ConnectionKind::Authorship,
        }
    }
}

/// The complete import document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GraphDocument {
    pub elements: Vec<GraphElement>,
    pub connections: Vec<GraphConnection>,
}

impl GraphDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Elements with the given label, in document order
    pub fn elements_labelled<'a>(&'a self, label: &'a str) -> impl Iterator<Item = &'a GraphElement> {
        self.elements.iter().filter(move |e| e.label == label)
    }
}

/// What to do when an element with an already-emitted id shows up again
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// Emit every occurrence; the importer merges by label
    #[default]
    Keep,
    /// Emit each element id once and each distinct connection once
    Merge,
}
