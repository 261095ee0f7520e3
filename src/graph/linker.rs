//! Theme linking: a record is `InTheme` of every theme it is tagged with.

use std::collections::HashSet;

use super::GraphConnection;

/// All taxonomy labels, for exact case-sensitive membership tests
#[derive(Debug, Clone, Default)]
pub struct ThemeSet {
    labels: HashSet<String>,
}

impl ThemeSet {
    pub fn from_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            labels: labels.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, label: &str) -> bool {
        self.labels.contains(label)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// One `tag -> record` edge per tag that names a theme, in tag order
pub fn link_to_themes(
    relevant_tags: &[String],
    themes: &ThemeSet,
    record_label: &str,
) -> Vec<GraphConnection> {
    relevant_tags
        .iter()
        .filter(|tag| themes.contains(tag.as_str()))
        .map(|tag| GraphConnection::in_theme(tag.as_str(), record_label))
        .collect()
}
