//! Graph Assembly
//!
//! Stage order is fixed:
//! 1. one Theme element per taxonomy label
//! 2. taxonomy containment edges
//! 3. per record, in input order: the Item element, its Person elements and
//!    Authorship edges, then its theme links
//!
//! Nothing appended is ever removed. A record that fails to map becomes a
//! [`RecordFailure`] in the output instead of a fragment.
//!
//! Under [`DuplicatePolicy::Merge`] the first label emitted for an element id
//! is canonical, and connections are rewritten to it before they are
//! deduplicated, so every endpoint names an emitted element.

use serde_json::Value;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

use super::{link_to_themes, DuplicatePolicy, GraphConnection, GraphDocument, GraphElement, ThemeSet};
use crate::identity::ElementId;
use crate::record::{map_record, RecordFailure, RecordFragment};
use crate::taxonomy::Taxonomy;

/// Counters reported at the end of a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildStats {
    pub themes: usize,
    pub records_mapped: usize,
    pub records_skipped: usize,
    /// Elements dropped under [`DuplicatePolicy::Merge`]
    pub elements_merged: usize,
    /// Connections dropped under [`DuplicatePolicy::Merge`]
    pub connections_merged: usize,
}

/// Result of a full run
#[derive(Debug)]
pub struct BuildOutput {
    pub document: GraphDocument,
    /// Skipped records, in input order
    pub failures: Vec<RecordFailure>,
    pub stats: BuildStats,
}

impl BuildOutput {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Append-only sink for elements, connections and failures
#[derive(Debug)]
pub struct GraphAssembler {
    document: GraphDocument,
    policy: DuplicatePolicy,
    canonical: HashMap<ElementId, String>,
    /// Theme label spellings that were merged into another
    theme_aliases: HashMap<String, String>,
    seen_connections: HashSet<GraphConnection>,
    failures: Vec<RecordFailure>,
    stats: BuildStats,
}

impl GraphAssembler {
    pub fn new(policy: DuplicatePolicy) -> Self {
        Self {
            document: GraphDocument::new(),
            policy,
            canonical: HashMap::new(),
            theme_aliases: HashMap::new(),
            seen_connections: HashSet::new(),
            failures: Vec::new(),
            stats: BuildStats::default(),
        }
    }

    /// Append an element and return the label connections should use for it
    pub fn push_element(&mut self, element: GraphElement) -> String {
        if self.policy == DuplicatePolicy::Merge {
            if let Some(label) = self.canonical.get(&element.id) {
                debug!(label = %element.label, canonical = %label, id = %element.id, "Merging duplicate element");
                self.stats.elements_merged += 1;
                return label.clone();
            }
            self.canonical.insert(element.id.clone(), element.label.clone());
        }
        let label = element.label.clone();
        self.document.elements.push(element);
        label
    }

    pub fn push_connection(&mut self, connection: GraphConnection) {
        if self.policy == DuplicatePolicy::Merge && !self.seen_connections.insert(connection.clone()) {
            self.stats.connections_merged += 1;
            return;
        }
        self.document.connections.push(connection);
    }

    /// Stages 1 and 2: theme elements, then containment edges
    pub fn add_taxonomy(&mut self, taxonomy: &Taxonomy) {
        let labels = taxonomy.flatten_labels();
        self.stats.themes += labels.len();
        for label in labels {
            let canonical = self.push_element(GraphElement::theme(label.as_str()));
            if canonical != label {
                self.theme_aliases.insert(label, canonical);
            }
        }
        for mut edge in taxonomy.flatten_edges() {
            edge.from = rename(&self.theme_aliases, edge.from);
            edge.to = rename(&self.theme_aliases, edge.to);
            self.push_connection(edge);
        }
    }

    /// Stage 3 for one mapped record
    pub fn add_fragment(&mut self, fragment: RecordFragment, theme_links: Vec<GraphConnection>) {
        let item_label = self.push_element(fragment.item);
        let mut author_aliases = HashMap::new();
        for author in fragment.authors {
            let label = author.label.clone();
            let canonical = self.push_element(author);
            if canonical != label {
                author_aliases.insert(label, canonical);
            }
        }
        for mut edge in fragment.authorship {
            edge.from = rename(&author_aliases, edge.from);
            edge.to = item_label.clone();
            self.push_connection(edge);
        }
        for mut link in theme_links {
            link.from = rename(&self.theme_aliases, link.from);
            link.to = item_label.clone();
            self.push_connection(link);
        }
        self.stats.records_mapped += 1;
    }

    pub fn add_failure(&mut self, failure: RecordFailure) {
        self.stats.records_skipped += 1;
        self.failures.push(failure);
    }

    pub fn document(&self) -> &GraphDocument {
        &self.document
    }

    pub fn finish(self) -> BuildOutput {
        BuildOutput {
            document: self.document,
            failures: self.failures,
            stats: self.stats,
        }
    }
}

fn rename(aliases: &HashMap<String, String>, label: String) -> String {
    match aliases.get(&label) {
        Some(canonical) => canonical.clone(),
        None => label,
    }
}

/// Runs the mapper and linker over records and feeds the assembler
#[derive(Debug)]
pub struct GraphBuilder {
    assembler: GraphAssembler,
    themes: ThemeSet,
    position: usize,
}

impl GraphBuilder {
    /// Flatten the taxonomy once and emit stages 1 and 2
    pub fn new(taxonomy: &Taxonomy, policy: DuplicatePolicy) -> Self {
        let mut assembler = GraphAssembler::new(policy);
        assembler.add_taxonomy(taxonomy);
        Self {
            assembler,
            themes: taxonomy.theme_set(),
            position: 0,
        }
    }

    /// Map and append one raw record.
    ///
    /// Returns the record label when it was mapped, `None` when it was
    /// skipped; skipped records are logged and kept in the build output.
    pub fn push_record(&mut self, raw: &Value) -> Option<String> {
        let position = self.position;
        self.position += 1;

        match map_record(position, raw) {
            Ok(fragment) => {
                let label = fragment.label().to_string();
                let links = link_to_themes(&fragment.relevant_tags, &self.themes, &label);
                self.assembler.add_fragment(fragment, links);
                Some(label)
            }
            Err(failure) => {
                warn!(
                    position = failure.position,
                    error = %failure.error,
                    record = %failure.raw,
                    "Skipping malformed record"
                );
                self.assembler.add_failure(failure);
                None
            }
        }
    }

    pub fn document(&self) -> &GraphDocument {
        self.assembler.document()
    }

    pub fn finish(self) -> BuildOutput {
        self.assembler.finish()
    }
}

/// One full batch: taxonomy stages, then every record in order
pub fn build_graph(taxonomy: &Taxonomy, records: &[Value], policy: DuplicatePolicy) -> BuildOutput {
    let mut builder = GraphBuilder::new(taxonomy, policy);
    let total = records.len();
    let mut mapped = 0;

    for raw in records {
        if let Some(label) = builder.push_record(raw) {
            mapped += 1;
            info!("{}/{} - {}", mapped, total, label);
        }
    }

    builder.finish()
}
