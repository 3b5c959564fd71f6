//! Paginated record sources.
//!
//! A source hands back one page of raw records per call together with an
//! optional continuation key. [`fetch_all`] follows the keys until the store
//! reports no more pages.

use std::collections::HashSet;
use std::future::Future;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use super::types::RawRecord;

/// Record source errors. All of them are fatal for the scan in progress.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Store error ({status}) {kind}: {message}")]
    Api {
        status: u16,
        kind: String,
        message: String,
    },

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    #[error("Start key does not match any page: {0}")]
    UnknownStartKey(String),

    #[error("Pagination stalled after {pages} pages: store returned a start key it already served")]
    StalledPagination { pages: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Opaque continuation key returned by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScanKey(pub serde_json::Value);

impl std::fmt::Display for ScanKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One page of a scan.
#[derive(Debug, Clone, Default)]
pub struct ScanPage {
    pub items: Vec<RawRecord>,
    /// Present when more pages follow.
    pub last_evaluated_key: Option<ScanKey>,
}

/// Progress reported after each page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageProgress {
    pub pages: usize,
    pub page_items: usize,
    pub total_items: usize,
}

/// A store that can be scanned one page at a time.
pub trait RecordSource {
    /// Fetch the page that starts after `start_key`, or the first page.
    fn scan_page(
        &mut self,
        start_key: Option<&ScanKey>,
    ) -> impl Future<Output = Result<ScanPage, SourceError>> + Send;
}

/// Scan every page and concatenate the items in page order.
pub async fn fetch_all<S: RecordSource>(source: &mut S) -> Result<Vec<RawRecord>, SourceError> {
    fetch_all_with(source, |_| {}).await
}

/// Like [`fetch_all`], calling `on_page` after every page.
pub async fn fetch_all_with<S, F>(
    source: &mut S,
    mut on_page: F,
) -> Result<Vec<RawRecord>, SourceError>
where
    S: RecordSource,
    F: FnMut(&PageProgress),
{
    let mut records = Vec::new();
    let mut start_key: Option<ScanKey> = None;
    let mut seen_keys: HashSet<String> = HashSet::new();
    let mut pages = 0;

    loop {
        let page = source.scan_page(start_key.as_ref()).await?;
        pages += 1;

        let page_items = page.items.len();
        records.extend(page.items);
        debug!(page = pages, items = page_items, total = records.len(), "Scanned page");

        on_page(&PageProgress {
            pages,
            page_items,
            total_items: records.len(),
        });

        match page.last_evaluated_key {
            Some(next) => {
                if !seen_keys.insert(next.to_string()) {
                    return Err(SourceError::StalledPagination { pages });
                }
                start_key = Some(next);
            }
            None => break,
        }
    }

    info!("Scan complete: {} records in {} pages", records.len(), pages);
    Ok(records)
}
