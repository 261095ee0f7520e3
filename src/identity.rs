//! Stable element identifiers, independent of display labels

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Class of graph element an identifier belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementClass {
    Theme,
    Person,
    Item,
}

impl ElementClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            ElementClass::Theme => "theme",
            ElementClass::Person => "person",
            ElementClass::Item => "item",
        }
    }
}

/// SHA256 digest of an element's class and normalized label
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementId(String);

impl ElementId {
    /// Compute the identifier for an element
    pub fn new(class: ElementClass, label: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(class.as_str().as_bytes());
        hasher.update(b":");
        hasher.update(normalize_label(label).as_bytes());
        Self(format!("{:x}", hasher.finalize()))
    }

    /// Get the hex string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Trim a label and collapse inner runs of whitespace to a single space.
///
/// Case is preserved: theme linking is case-sensitive, so identity is too.
pub fn normalize_label(label: &str) -> String {
    label.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_consistency() {
        let a = ElementId::new(ElementClass::Person, "Ann Lee");
        let b = ElementId::new(ElementClass::Person, "Ann Lee");
        assert_eq!(a, b);
        assert_eq!(a.as_str().len(), 64);
    }

    #[test]
    fn test_whitespace_is_normalized() {
        let a = ElementId::new(ElementClass::Person, "Ann Lee");
        let b = ElementId::new(ElementClass::Person, "  Ann   Lee ");
        assert_eq!(a, b);
    }

    #[test]
    fn test_class_and_case_distinguish() {
        let theme = ElementId::new(ElementClass::Theme, "Docking");
        let item = ElementId::new(ElementClass::Item, "Docking");
        let lower = ElementId::new(ElementClass::Theme, "docking");
        assert_ne!(theme, item);
        assert_ne!(theme, lower);
    }
}
