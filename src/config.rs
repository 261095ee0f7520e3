//! Configuration management
//!
//! Supports loading configuration from:
//! - Legacy environment variables (`LIBRARY_ID`, `LIBRARY_TYPE`, `ZOTERO_API_KEY`)
//! - Config file (zotero-kumu.toml)
//! - Environment variables (ZOTERO_KUMU__*)
//!
//! ## Example config file (zotero-kumu.toml):
//! ```toml
//! [zotero]
//! library_id = "1234567"
//! library_type = "user"
//! api_key = "..."
//!
//! [taxonomy]
//! name = "docking"
//!
//! [output]
//! path = "zotero.json"
//! format = "pretty"
//! ascii_only = true
//!
//! [graph]
//! duplicates = "keep"
//! ```

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::graph::{DuplicatePolicy, OutputFormat};
use crate::taxonomy::DEFAULT_TAXONOMY;

/// Largest page the Zotero web API will return
pub const ZOTERO_MAX_PAGE: usize = 100;

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Zotero library access
    #[serde(default)]
    pub zotero: ZoteroConfig,

    /// Which taxonomy to classify against
    #[serde(default)]
    pub taxonomy: TaxonomyConfig,

    /// Output settings
    #[serde(default)]
    pub output: OutputConfig,

    /// Graph construction settings
    #[serde(default)]
    pub graph: GraphConfig,
}

/// Kind of Zotero library
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LibraryType {
    User,
    Group,
}

impl LibraryType {
    /// Path segment used by the web API
    pub fn api_segment(&self) -> &'static str {
        match self {
            LibraryType::User => "users",
            LibraryType::Group => "groups",
        }
    }
}

/// Zotero configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoteroConfig {
    /// Numeric user or group id
    #[serde(default)]
    pub library_id: Option<String>,

    #[serde(default)]
    pub library_type: Option<LibraryType>,

    /// Not needed for public libraries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Items per request, clamped to the API maximum
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Cap on items fetched per run
    #[serde(default = "default_max_items")]
    pub max_items: usize,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Library coordinates once required settings are confirmed present
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryAccess {
    pub library_id: String,
    pub library_type: LibraryType,
    pub api_key: Option<String>,
}

impl ZoteroConfig {
    /// Fails when the library id or type is missing
    pub fn access(&self) -> Result<LibraryAccess> {
        let library_id = self
            .library_id
            .clone()
            .filter(|id| !id.trim().is_empty())
            .ok_or(Error::MissingSetting("zotero.library_id"))?;
        let library_type = self
            .library_type
            .ok_or(Error::MissingSetting("zotero.library_type"))?;
        Ok(LibraryAccess {
            library_id,
            library_type,
            api_key: self.api_key.clone().filter(|k| !k.is_empty()),
        })
    }

    pub fn effective_page_size(&self) -> usize {
        self.page_size.clamp(1, ZOTERO_MAX_PAGE)
    }
}

/// Taxonomy configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxonomyConfig {
    /// Embedded taxonomy name
    #[serde(default = "default_taxonomy_name")]
    pub name: String,

    /// JSON file to use instead of the embedded taxonomy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_path")]
    pub path: PathBuf,

    #[serde(default)]
    pub format: OutputFormat,

    /// Escape non-ASCII characters
    #[serde(default = "default_true")]
    pub ascii_only: bool,
}

/// Graph configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphConfig {
    #[serde(default)]
    pub duplicates: DuplicatePolicy,
}

// Default value functions
fn default_base_url() -> String {
    "https://api.zotero.org".to_string()
}

fn default_page_size() -> usize {
    ZOTERO_MAX_PAGE
}

fn default_max_items() -> usize {
    5000
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_taxonomy_name() -> String {
    DEFAULT_TAXONOMY.to_string()
}

fn default_output_path() -> PathBuf {
    PathBuf::from("zotero.json")
}

fn default_true() -> bool {
    true
}

impl Default for ZoteroConfig {
    fn default() -> Self {
        Self {
            library_id: None,
            library_type: None,
            api_key: None,
            base_url: default_base_url(),
            page_size: default_page_size(),
            max_items: default_max_items(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for TaxonomyConfig {
    fn default() -> Self {
        Self {
            name: default_taxonomy_name(),
            path: None,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: default_output_path(),
            format: OutputFormat::Pretty,
            ascii_only: true,
        }
    }
}

/// Legacy variables, mapped to their config keys
const LEGACY_ENV: [(&str, &str); 3] = [
    ("LIBRARY_ID", "zotero.library_id"),
    ("LIBRARY_TYPE", "zotero.library_type"),
    ("ZOTERO_API_KEY", "zotero.api_key"),
];

impl AppConfig {
    /// Load configuration from default locations
    pub fn load() -> std::result::Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration, adding a specific file on top of the defaults
    pub fn load_from(config_path: Option<&str>) -> std::result::Result<Self, ConfigError> {
        let mut builder = Config::builder();

        // Lowest priority: the bare variables the original script read
        for (var, key) in LEGACY_ENV {
            if let Ok(value) = std::env::var(var) {
                builder = builder.set_default(key, value)?;
            }
        }

        let config_locations = [
            "zotero-kumu.toml",
            ".zotero-kumu.toml",
            "config/zotero-kumu.toml",
        ];

        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        if let Some(config_dir) = directories::ProjectDirs::from("org", "zotero-kumu", "zotero-kumu") {
            let xdg_config = config_dir.config_dir().join("zotero-kumu.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // ZOTERO_KUMU__ZOTERO__LIBRARY_ID and friends
        builder = builder.add_source(
            Environment::with_prefix("ZOTERO_KUMU")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Save configuration to a file
    pub fn save(&self, path: &str) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.taxonomy.name, "docking");
        assert_eq!(config.output.path, PathBuf::from("zotero.json"));
        assert!(config.output.ascii_only);
        assert_eq!(config.graph.duplicates, DuplicatePolicy::Keep);
        assert_eq!(config.zotero.max_items, 5000);
    }

    #[test]
    fn test_serialize_config() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[zotero]"));
        assert!(toml_str.contains("[output]"));
        assert!(toml_str.contains("[graph]"));
    }

    #[test]
    fn test_access_requires_id_and_type() {
        let mut zotero = ZoteroConfig::default();
        assert!(matches!(
            zotero.access(),
            Err(Error::MissingSetting("zotero.library_id"))
        ));

        zotero.library_id = Some("42".to_string());
        assert!(matches!(
            zotero.access(),
            Err(Error::MissingSetting("zotero.library_type"))
        ));

        zotero.library_type = Some(LibraryType::Group);
        zotero.api_key = Some(String::new());
        let access = zotero.access().unwrap();
        assert_eq!(access.library_type.api_segment(), "groups");
        assert_eq!(access.api_key, None);
    }

    #[test]
    fn test_page_size_clamped() {
        let mut zotero = ZoteroConfig::default();
        zotero.page_size = 500;
        assert_eq!(zotero.effective_page_size(), 100);
        zotero.page_size = 0;
        assert_eq!(zotero.effective_page_size(), 1);
    }

    #[test]
    fn test_load_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(
            &path,
            r#"
[zotero]
library_id = "99"
library_type = "group"

[taxonomy]
path = "themes.json"

[output]
format = "compact"

[graph]
duplicates = "merge"
"#,
        )
        .unwrap();

        let config = AppConfig::load_from(path.to_str()).unwrap();
        assert_eq!(config.zotero.library_id.as_deref(), Some("99"));
        assert_eq!(config.zotero.library_type, Some(LibraryType::Group));
        assert_eq!(config.taxonomy.path, Some(PathBuf::from("themes.json")));
        assert_eq!(config.taxonomy.name, "docking");
        assert_eq!(config.output.format, OutputFormat::Compact);
        assert_eq!(config.graph.duplicates, DuplicatePolicy::Merge);
    }

    #[test]
    fn test_save_round_trips_through_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("saved.toml");
        let mut config = AppConfig::default();
        config.zotero.library_id = Some("7".to_string());
        config.save(path.to_str().unwrap()).unwrap();

        let loaded = AppConfig::load_from(path.to_str()).unwrap();
        assert_eq!(loaded.zotero.library_id.as_deref(), Some("7"));
    }
}
