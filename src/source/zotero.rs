//! Zotero Web API client
//!
//! Fetches the top-level items of a user or group library, one page at a
//! time, until the library is exhausted or `max_items` is reached.

use reqwest::blocking::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

use super::RecordSource;
use crate::config::{LibraryAccess, ZoteroConfig};
use crate::error::{Error, Result};

const API_VERSION: &str = "3";

/// One response page
#[derive(Debug, Clone, Default)]
pub struct Page {
    pub items: Vec<Value>,
    /// `Total-Results` header, when the server sent one
    pub total: Option<usize>,
}

/// Blocking client for one library
pub struct ZoteroClient {
    http: Client,
    base_url: String,
    access: LibraryAccess,
    page_size: usize,
    max_items: usize,
}

impl ZoteroClient {
    /// Fails when the library id or type is not configured
    pub fn new(config: &ZoteroConfig) -> Result<Self> {
        let access = config.access()?;
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("zotero-kumu/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            access,
            page_size: config.effective_page_size(),
            max_items: config.max_items,
        })
    }

    /// `{base}/{users|groups}/{id}/items/top`
    pub fn items_url(&self) -> String {
        format!(
            "{}/{}/{}/items/top",
            self.base_url,
            self.access.library_type.api_segment(),
            self.access.library_id
        )
    }

    fn fetch_page(&self, start: usize, limit: usize) -> Result<Page> {
        let url = self.items_url();
        debug!(%url, start, limit, "Requesting page");

        let mut request = self
            .http
            .get(&url)
            .query(&[
                ("format", "json".to_string()),
                ("start", start.to_string()),
                ("limit", limit.to_string()),
            ])
            .header("Zotero-API-Version", API_VERSION);
        if let Some(key) = &self.access.api_key {
            request = request.header("Zotero-API-Key", key);
        }

        let response = request.send()?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(Error::ZoteroStatus {
                status: status.as_u16(),
                body,
            });
        }

        let total = response
            .headers()
            .get("Total-Results")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse().ok());
        let items: Vec<Value> = response.json()?;

        Ok(Page { items, total })
    }
}

impl RecordSource for ZoteroClient {
    fn describe(&self) -> String {
        format!(
            "Zotero {} library {}",
            self.access.library_type.api_segment(),
            self.access.library_id
        )
    }

    fn fetch(&self) -> Result<Vec<Value>> {
        let items = collect_pages(self.page_size, self.max_items, |start, limit| {
            self.fetch_page(start, limit)
        })?;
        info!(count = items.len(), library = %self.access.library_id, "Fetched items");
        Ok(items)
    }
}

/// Drive a page fetcher until the total is reached, a page comes back
/// empty, or `max_items` items have been collected.
pub fn collect_pages<F>(page_size: usize, max_items: usize, mut fetch_page: F) -> Result<Vec<Value>>
where
    F: FnMut(usize, usize) -> Result<Page>,
{
    let page_size = page_size.max(1);
    let mut items = Vec::new();

    while items.len() < max_items {
        let limit = page_size.min(max_items - items.len());
        let page = fetch_page(items.len(), limit)?;
        if page.items.is_empty() {
            break;
        }

        let remaining = max_items - items.len();
        items.extend(page.items.into_iter().take(remaining));

        if let Some(total) = page.total {
            if items.len() >= total {
                break;
            }
        }
    }

    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LibraryType;
    use serde_json::json;

    fn library(total: usize) -> Vec<Value> {
        (0..total).map(|n| json!({ "n": n })).collect()
    }

    fn pager(all: Vec<Value>, send_total: bool) -> impl FnMut(usize, usize) -> Result<Page> {
        move |start, limit| {
            let items = all.iter().skip(start).take(limit).cloned().collect();
            Ok(Page {
                items,
                total: send_total.then_some(all.len()),
            })
        }
    }

    #[test]
    fn test_pages_until_total() {
        let mut requests = Vec::new();
        let mut inner = pager(library(250), true);
        let items = collect_pages(100, 5000, |start, limit| {
            requests.push((start, limit));
            inner(start, limit)
        })
        .unwrap();

        assert_eq!(items.len(), 250);
        assert_eq!(items[249]["n"], 249);
        assert_eq!(requests, vec![(0, 100), (100, 100), (200, 100)]);
    }

    #[test]
    fn test_stops_on_empty_page_without_total() {
        let mut calls = 0;
        let mut inner = pager(library(100), false);
        let items = collect_pages(50, 5000, |start, limit| {
            calls += 1;
            inner(start, limit)
        })
        .unwrap();
        assert_eq!(items.len(), 100);
        assert_eq!(calls, 3);
    }

    #[test]
    fn test_respects_max_items() {
        let items = collect_pages(100, 130, pager(library(500), true)).unwrap();
        assert_eq!(items.len(), 130);
    }

    #[test]
    fn test_error_aborts() {
        let result = collect_pages(100, 5000, |_, _| {
            Err(Error::ZoteroStatus {
                status: 403,
                body: "Forbidden".to_string(),
            })
        });
        assert!(matches!(result, Err(Error::ZoteroStatus { status: 403, .. })));
    }

    #[test]
    fn test_items_url() {
        let config = ZoteroConfig {
            library_id: Some("12345".to_string()),
            library_type: Some(LibraryType::User),
            base_url: "https://api.zotero.org/".to_string(),
            ..Default::default()
        };
        let client = ZoteroClient::new(&config).unwrap();
        assert_eq!(client.items_url(), "https://api.zotero.org/users/12345/items/top");
        assert_eq!(client.describe(), "Zotero users library 12345");
    }

    #[test]
    fn test_new_requires_library() {
        assert!(matches!(
            ZoteroClient::new(&ZoteroConfig::default()),
            Err(Error::MissingSetting(_))
        ));
    }
}
