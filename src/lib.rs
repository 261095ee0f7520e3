//! Zotero → Kumu
//!
//! Builds a Kumu JSON import from a Zotero library and a static topic
//! taxonomy.
//!
//! ## Features
//!
//! - **Theme Graph**: the nested taxonomy becomes Theme elements chained by
//!   single-level `InTheme` connections
//! - **Items and Authors**: every Zotero item becomes an Item element, every
//!   creator a Person element with an `Authorship` connection
//! - **Tag Linking**: manual tags that name a theme connect the item to it
//! - **Failure Reporting**: malformed items are skipped and returned with
//!   their raw JSON, never aborting the run
//! - **Deterministic Output**: same inputs, byte-identical file
//!
//! ## Pipeline
//!
//! ```text
//! Taxonomy ──flatten──► Theme elements + containment edges ─┐
//!    │                                                      │
//!    └─► ThemeSet ─┐                                        ▼
//! RecordSource ──► map_record ──► link_to_themes ──► GraphAssembler ──► GraphDocument
//! ```

pub mod config;
pub mod error;
pub mod graph;
pub mod identity;
pub mod record;
pub mod source;
pub mod taxonomy;

pub use config::AppConfig;
pub use error::{Error, Result};
pub use graph::{
    build_graph, BuildOutput, DuplicatePolicy, GraphConnection, GraphDocument, GraphElement,
    OutputFormat,
};
pub use identity::ElementId;
pub use record::{map_record, RecordFailure, RecordFragment, RecordOutcome};
pub use source::{JsonFileSource, RecordSource, ZoteroClient};
pub use taxonomy::{Taxonomy, TaxonomyNode};
