//! Freshness cache over a previous snapshot
//!
//! Before fetching a product page the crawler consults the last promoted
//! snapshot; a product that was parsed recently enough is carried over
//! verbatim, original timestamp included. This keeps repeat runs cheap
//! on a catalog where most pages change rarely.

use crate::catalog::{CatalogSnapshot, Product};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use url::Url;

/// Normalized URL path used as the identity key for product pages.
///
/// The same lookup key backs listing deduplication and cache hits: the
/// percent-decoded path with any trailing slash removed, so encoding
/// drift and query-string variants collapse onto one entry.
pub fn path_key(url: &Url) -> String {
    let path = url.path();
    let decoded = match urlencoding::decode(path) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => path.to_string(),
    };
    let trimmed = decoded.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Products from the previous run, indexed by normalized path.
pub struct CacheIndex {
    entries: HashMap<String, Product>,
    window: Duration,
}

impl CacheIndex {
    /// Builds the index from a previous snapshot.
    pub fn from_snapshot(snapshot: &CatalogSnapshot, freshness_window_days: u32) -> Self {
        let mut entries = HashMap::new();
        for category in &snapshot.categories {
            for sub in &category.subcategories {
                for product in &sub.products {
                    if let Ok(url) = Url::parse(&product.link) {
                        entries.insert(path_key(&url), product.clone());
                    }
                }
            }
        }
        Self {
            entries,
            window: Duration::days(i64::from(freshness_window_days)),
        }
    }

    /// An index with no entries; every lookup misses.
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
            window: Duration::zero(),
        }
    }

    /// Returns the cached record for `url` if it is still reusable:
    /// it carries an update timestamp no older than the freshness window
    /// (boundary inclusive) and a non-empty description. Products whose
    /// source page genuinely has no descriptive text are therefore
    /// re-fetched every run.
    pub fn lookup_fresh(&self, url: &Url, now: DateTime<Utc>) -> Option<&Product> {
        let product = self.entries.get(&path_key(url))?;
        let updated_at = product.updated_at?;
        if now - updated_at > self.window {
            return None;
        }
        let described = product
            .description
            .as_deref()
            .map(|d| !d.trim().is_empty())
            .unwrap_or(false);
        if !described {
            return None;
        }
        Some(product)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
