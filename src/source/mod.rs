//! Record Sources
//!
//! Where raw Zotero items come from. Sources return items untouched, as
//! `serde_json::Value`, so a malformed item can still be reported verbatim
//! when it is skipped later.

pub mod file;
pub mod zotero;

pub use file::JsonFileSource;
pub use zotero::ZoteroClient;

use serde_json::Value;

use crate::error::Result;

/// Anything that can produce the full, ordered list of items for one run
pub trait RecordSource {
    /// Short description for log lines
    fn describe(&self) -> String;

    /// Fetch every item. Errors here are setup failures and abort the run.
    fn fetch(&self) -> Result<Vec<Value>>;
}
