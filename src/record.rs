//! Bibliographic Records
//!
//! Zotero items as returned by the web API, and their mapping to graph
//! fragments. Only the fields below are read; everything else in an item is
//! ignored.

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use thiserror::Error;

use crate::graph::{GraphConnection, GraphElement, ItemAttributes};

/// Placeholder for a missing first or last name
pub const MISSING_NAME: &str = "---";

/// Why a single record was skipped
#[derive(Error, Debug)]
pub enum RecordError {
    #[error("malformed record: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("tag #{position} has no `tag` text")]
    UntitledTag { position: usize },
}

/// A Zotero item
#[derive(Debug, Clone, Deserialize)]
pub struct BibliographicRecord {
    pub data: RecordData,
    pub links: RecordLinks,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordData {
    pub title: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub url: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub abstract_note: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub item_type: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub date: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub publication_title: String,
    #[serde(default)]
    pub tags: Vec<Tag>,
    /// `None` when the item has no creators key at all
    #[serde(default)]
    pub creators: Option<Vec<Creator>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecordLinks {
    #[serde(rename = "self")]
    pub self_link: SelfLink,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SelfLink {
    #[serde(default, deserialize_with = "lenient_text")]
    pub alternate: String,
}

/// A Zotero tag. Automatic tags carry a `type`; manual ones do not.
#[derive(Debug, Clone, Deserialize)]
pub struct Tag {
    /// `None` when the key is missing, `Some(None)` when it is `null`
    #[serde(default, deserialize_with = "present_text")]
    pub tag: Option<Option<String>>,
    #[serde(default, rename = "type", deserialize_with = "present")]
    pub kind: Option<Value>,
}

impl Tag {
    /// Manual tags (no `type` key, even a null one) take part in linking
    pub fn is_relevant(&self) -> bool {
        self.kind.is_none()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Creator {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

impl Creator {
    pub fn display_name(&self) -> String {
        format!(
            "{} {}",
            self.first_name.as_deref().unwrap_or(MISSING_NAME),
            self.last_name.as_deref().unwrap_or(MISSING_NAME)
        )
    }
}

/// Render any JSON scalar as text; `null` becomes empty
fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

/// Optional text whose key presence is kept apart from a `null` value
fn present_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Option<String>>, D::Error> {
    Option::<String>::deserialize(deserializer).map(Some)
}

/// Keep a key's presence even when its value is `null`
fn present<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(deserializer).map(Some)
}

impl BibliographicRecord {
    pub fn from_value(raw: &Value) -> Result<Self, RecordError> {
        Ok(Self::deserialize(raw)?)
    }

    pub fn label(&self) -> &str {
        &self.data.title
    }

    /// Text of every manual tag, in order, duplicates kept.
    /// A `null` text is kept as `None`; a missing one fails the record.
    pub fn relevant_tags(&self) -> Result<Vec<Option<String>>, RecordError> {
        self.data
            .tags
            .iter()
            .enumerate()
            .filter(|(_, t)| t.is_relevant())
            .map(|(position, t)| {
                t.tag
                    .clone()
                    .ok_or(RecordError::UntitledTag { position })
            })
            .collect()
    }
}

/// Everything one record contributes before theme linking
#[derive(Debug, Clone)]
pub struct RecordFragment {
    pub item: GraphElement,
    pub authors: Vec<GraphElement>,
    pub authorship: Vec<GraphConnection>,
    /// Manual tag texts to match against themes
    pub relevant_tags: Vec<String>,
}

impl RecordFragment {
    pub fn label(&self) -> &str {
        &self.item.label
    }
}

/// A skipped record, kept for operator inspection
#[derive(Debug)]
pub struct RecordFailure {
    /// Zero-based position in the input
    pub position: usize,
    pub error: RecordError,
    pub raw: Value,
}

pub type RecordOutcome = Result<RecordFragment, RecordFailure>;

/// Map one raw item into its graph fragment, or a failure carrying the raw item
pub fn map_record(position: usize, raw: &Value) -> RecordOutcome {
    build_fragment(raw).map_err(|error| RecordFailure {
        position,
        error,
        raw: raw.clone(),
    })
}

fn build_fragment(raw: &Value) -> Result<RecordFragment, RecordError> {
    let record = BibliographicRecord::from_value(raw)?;
    let tags = record.relevant_tags()?;
    let relevant_tags: Vec<String> = tags.iter().flatten().cloned().collect();
    let label = record.label().to_string();
    let data = &record.data;

    let item = GraphElement::item(
        label.as_str(),
        ItemAttributes {
            item_type: data.item_type.clone(),
            zotero_link: record.links.self_link.alternate.clone(),
            original_link: data.url.clone(),
            description: data.abstract_note.clone(),
            publication: data.publication_title.clone(),
            date: data.date.clone(),
            tags,
        },
    );

    let mut authors = Vec::new();
    let mut authorship = Vec::new();
    for creator in data.creators.iter().flatten() {
        let name = creator.display_name();
        authorship.push(GraphConnection::authorship(name.as_str(), label.as_str()));
        authors.push(GraphElement::person(name));
    }

    Ok(RecordFragment {
        item,
        authors,
        authorship,
        relevant_tags,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{ConnectionKind, ElementKind};
    use serde_json::json;

    fn paper_a() -> Value {
        json!({
            "key": "ABCD1234",
            "data": {
                "title": "Paper A",
                "itemType": "journalArticle",
                "url": "https://example.org/a",
                "abstractNote": "About docking.",
                "date": "2021",
                "publicationTitle": "Journal of Docking",
                "tags": [{"tag": "FixedTarget"}, {"tag": "auto", "type": 1}],
                "creators": [{"creatorType": "author", "firstName": "Ann", "lastName": "Lee"}]
            },
            "links": {"self": {"alternate": "https://www.zotero.org/items/ABCD1234"}}
        })
    }

    #[test]
    fn test_maps_item_attributes() {
        let fragment = map_record(0, &paper_a()).unwrap();
        assert_eq!(fragment.label(), "Paper A");

        let ElementKind::Item(attrs) = &fragment.item.kind else {
            panic!("expected an item element");
        };
        assert_eq!(attrs.item_type, "journalArticle");
        assert_eq!(attrs.zotero_link, "https://www.zotero.org/items/ABCD1234");
        assert_eq!(attrs.original_link, "https://example.org/a");
        assert_eq!(attrs.description, "About docking.");
        assert_eq!(attrs.publication, "Journal of Docking");
        assert_eq!(attrs.date, "2021");
        assert_eq!(attrs.tags, vec![Some("FixedTarget".to_string())]);
    }

    #[test]
    fn test_maps_authors() {
        let fragment = map_record(0, &paper_a()).unwrap();
        assert_eq!(fragment.authors.len(), 1);
        assert_eq!(fragment.authors[0].label, "Ann Lee");
        assert_eq!(fragment.authors[0].kind, ElementKind::Person);
        assert_eq!(
            fragment.authorship,
            vec![GraphConnection::authorship("Ann Lee", "Paper A")]
        );
        assert_eq!(fragment.authorship[0].kind, ConnectionKind::Authorship);
    }

    #[test]
    fn test_missing_fields_default_to_empty() {
        let raw = json!({"data": {"title": "Bare"}, "links": {"self": {}}});
        let fragment = map_record(0, &raw).unwrap();
        assert_eq!(fragment.item.kind, ElementKind::Item(ItemAttributes::default()));
        assert!(fragment.authors.is_empty());
        assert!(fragment.authorship.is_empty());
        assert!(fragment.relevant_tags.is_empty());
    }

    #[test]
    fn test_missing_names_use_placeholder() {
        let raw = json!({
            "data": {"title": "T", "creators": [{"lastName": "Solo"}, {"name": "Org"}]},
            "links": {"self": {}}
        });
        let fragment = map_record(0, &raw).unwrap();
        let names: Vec<&str> = fragment.authors.iter().map(|a| a.label.as_str()).collect();
        assert_eq!(names, vec!["--- Solo", "--- ---"]);
    }

    #[test]
    fn test_duplicate_tags_kept_in_order() {
        let raw = json!({
            "data": {"title": "T", "tags": [{"tag": "b"}, {"tag": "a"}, {"tag": "b"}]},
            "links": {"self": {}}
        });
        let fragment = map_record(0, &raw).unwrap();
        assert_eq!(fragment.relevant_tags, vec!["b", "a", "b"]);
    }

    #[test]
    fn test_null_type_still_marks_tag_automatic() {
        let raw = json!({
            "data": {"title": "T", "tags": [{"tag": "x", "type": null}]},
            "links": {"self": {}}
        });
        assert!(map_record(0, &raw).unwrap().relevant_tags.is_empty());
    }

    #[test]
    fn test_scalar_fields_rendered_as_text() {
        let raw = json!({"data": {"title": "T", "date": 1999, "url": null}, "links": {"self": {}}});
        let fragment = map_record(0, &raw).unwrap();
        let ElementKind::Item(attrs) = fragment.item.kind else {
            panic!("expected an item element");
        };
        assert_eq!(attrs.date, "1999");
        assert!(attrs.original_link.is_empty());
    }

    #[test]
    fn test_missing_title_fails() {
        let raw = json!({"data": {"url": "x"}, "links": {"self": {}}});
        let failure = map_record(7, &raw).unwrap_err();
        assert_eq!(failure.position, 7);
        assert!(matches!(failure.error, RecordError::Malformed(_)));
        assert_eq!(failure.raw, raw);
    }

    #[test]
    fn test_missing_links_fails() {
        let raw = json!({"data": {"title": "T"}});
        assert!(map_record(0, &raw).is_err());
        let raw = json!({"data": {"title": "T"}, "links": {}});
        assert!(map_record(0, &raw).is_err());
    }

    #[test]
    fn test_manual_tag_without_text_fails() {
        let raw = json!({"data": {"title": "T", "tags": [{"type": 1}, {"colour": "red"}]}, "links": {"self": {}}});
        let failure = map_record(0, &raw).unwrap_err();
        assert!(matches!(failure.error, RecordError::UntitledTag { position: 1 }));
    }

    #[test]
    fn test_null_tag_text_is_kept_but_never_linked() {
        let raw = json!({
            "data": {"title": "T", "tags": [{"tag": null}, {"tag": "FixedTarget"}]},
            "links": {"self": {}}
        });
        let fragment = map_record(0, &raw).unwrap();
        assert_eq!(fragment.relevant_tags, vec!["FixedTarget"]);

        let ElementKind::Item(attrs) = &fragment.item.kind else {
            panic!("expected an item element");
        };
        assert_eq!(attrs.tags, vec![None, Some("FixedTarget".to_string())]);
        let value = serde_json::to_value(&fragment.item).unwrap();
        assert_eq!(value["Tag"], json!([null, "FixedTarget"]));
    }

    #[test]
    fn test_typed_theme_tag_is_not_relevant() {
        let raw = json!({
            "data": {"title": "T", "tags": [{"tag": "FixedTarget", "type": 1}]},
            "links": {"self": {}}
        });
        let fragment = map_record(0, &raw).unwrap();
        assert!(fragment.relevant_tags.is_empty());
    }
}
