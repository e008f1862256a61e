//! Crawl orchestration
//!
//! Walks the site top-down: explore page, categories, subcategories,
//! product listings. All crawl policy lives here: discovery
//! normalization, cache consultation, the retry-once fetch policy,
//! order-preserving merges and per-subcategory checkpointing.

use crate::browser::Navigator;
use crate::catalog::{
    path_key, CacheIndex, CatalogSnapshot, Product, SnapshotStore, Subcategory,
};
use crate::config::Config;
use crate::crawler::{
    build_http_client, enumerate_listing, fetch_product_page, map_limit, CATEGORY_PREFIX,
    EXPLORE_PATH,
};
use crate::extract::{assemble_product, extract_product};
use crate::{CrawlError, Result};
use chrono::{DateTime, Utc};
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use std::sync::Arc;
use url::Url;

/// A category discovered on the explore page.
#[derive(Debug, Clone)]
struct CategoryLink {
    name: String,
    url: Url,
}

/// A subcategory discovered on a category page.
#[derive(Debug, Clone)]
struct SubcategoryLink {
    name: String,
    url: Url,
}

/// Per-run activity totals for the closing log line.
#[derive(Debug, Default)]
struct RunCounters {
    subcategories: usize,
    reused: usize,
    fetched: usize,
    dropped: usize,
}

/// Drives one crawl run end to end.
pub struct Orchestrator {
    config: Config,
    navigator: Arc<dyn Navigator>,
    client: Client,
    store: SnapshotStore,
    base: Url,
}

impl Orchestrator {
    pub fn new(config: Config, navigator: Arc<dyn Navigator>) -> Result<Self> {
        let base = Url::parse(&config.site.base_url)?;
        let client = build_http_client(config.crawler.fetch_timeout_secs)?;
        let store = SnapshotStore::new(config.output.catalog_path.clone());
        Ok(Self {
            config,
            navigator,
            client,
            store,
            base,
        })
    }

    /// Runs the crawl to completion and promotes the final artifact.
    ///
    /// With `fresh` set, any checkpoint and cached snapshot are ignored.
    /// Otherwise an existing checkpoint is resumed: its completed
    /// categories are skipped outright and its last category only
    /// re-crawls subcategories the checkpoint does not already hold.
    pub async fn run(&self, fresh: bool) -> Result<()> {
        let cache = self.build_cache(fresh)?;
        let mut snapshot = self.load_starting_snapshot(fresh)?;
        let resume = ResumePlan::from_snapshot(&snapshot);

        if !resume.is_empty() {
            tracing::info!(
                "Resuming from checkpoint: {} completed categories",
                resume.completed_count()
            );
        }

        let categories = self.discover_categories().await?;
        tracing::info!("Found {} categories", categories.len());

        let mut counters = RunCounters::default();
        for category in &categories {
            if resume.is_complete(&category.name) {
                tracing::debug!("Skipping completed category: {}", category.name);
                continue;
            }

            tracing::info!("Category: {}", category.name);
            let subcategories = match self.discover_subcategories(category).await {
                Ok(subcategories) => subcategories,
                Err(e) => {
                    tracing::warn!(
                        "Subcategory discovery failed for {}: {}",
                        category.name,
                        e
                    );
                    continue;
                }
            };
            tracing::info!("  {} subcategories", subcategories.len());

            if subcategories.is_empty() {
                snapshot.ensure_category(&category.name, category.url.as_str());
                self.store.save_checkpoint(&snapshot)?;
                continue;
            }

            for subcategory in subcategories {
                if resume.is_done_subcategory(&category.name, &subcategory.name) {
                    tracing::debug!(
                        "  Skipping checkpointed subcategory: {}",
                        subcategory.name
                    );
                    continue;
                }

                match self.crawl_subcategory(&subcategory, &cache, &mut counters).await {
                    Ok(products) => {
                        snapshot.upsert_subcategory(
                            &category.name,
                            category.url.as_str(),
                            Subcategory {
                                name: subcategory.name.clone(),
                                url: subcategory.url.to_string(),
                                products,
                            },
                        );
                        self.store.save_checkpoint(&snapshot)?;
                        counters.subcategories += 1;
                    }
                    Err(e) => {
                        tracing::warn!("  Subcategory {} failed: {}", subcategory.name, e);
                    }
                }
            }
        }

        snapshot.scraped_at = Utc::now();
        self.store.save_checkpoint(&snapshot)?;
        self.store.promote()?;

        tracing::info!(
            "Crawl finished: {} categories, {} products total ({} subcategories crawled, {} reused, {} fetched, {} dropped)",
            snapshot.categories.len(),
            snapshot.product_count(),
            counters.subcategories,
            counters.reused,
            counters.fetched,
            counters.dropped
        );
        Ok(())
    }

    /// The freshness index comes from the last promoted snapshot; fresh
    /// runs skip it entirely.
    fn build_cache(&self, fresh: bool) -> Result<CacheIndex> {
        if fresh {
            return Ok(CacheIndex::empty());
        }
        match self.store.load_snapshot() {
            Ok(Some(snapshot)) => {
                let cache = CacheIndex::from_snapshot(
                    &snapshot,
                    self.config.crawler.freshness_window_days,
                );
                tracing::info!("Loaded {} products from previous snapshot", cache.len());
                Ok(cache)
            }
            Ok(None) => Ok(CacheIndex::empty()),
            Err(e) => {
                tracing::warn!("Ignoring unreadable previous snapshot: {}", e);
                Ok(CacheIndex::empty())
            }
        }
    }

    fn load_starting_snapshot(&self, fresh: bool) -> Result<CatalogSnapshot> {
        if fresh {
            self.store.clear_checkpoint()?;
            return Ok(CatalogSnapshot::new());
        }
        match self.store.load_checkpoint() {
            Ok(Some(checkpoint)) => {
                tracing::info!(
                    "Found checkpoint with {} categories",
                    checkpoint.categories.len()
                );
                Ok(checkpoint)
            }
            Ok(None) => Ok(CatalogSnapshot::new()),
            Err(e) => {
                tracing::warn!("Ignoring unreadable checkpoint: {}", e);
                Ok(CatalogSnapshot::new())
            }
        }
    }

    /// Opens the explore page and reads the category rail. Failure here
    /// is run-fatal: without an entry point no progress is possible.
    async fn discover_categories(&self) -> Result<Vec<CategoryLink>> {
        let explore = self.base.join(EXPLORE_PATH)?;
        tracing::info!("Opening explore page: {}", explore);
        let html = self.fetch_page_html(explore.as_str()).await?;
        let categories = parse_category_links(&html, &self.base);
        if categories.is_empty() {
            return Err(CrawlError::CategoryDiscovery {
                url: explore.to_string(),
            });
        }
        Ok(categories)
    }

    async fn discover_subcategories(
        &self,
        category: &CategoryLink,
    ) -> Result<Vec<SubcategoryLink>> {
        let html = self.fetch_page_html(category.url.as_str()).await?;
        Ok(parse_subcategory_links(&html, &category.url))
    }

    /// Opens a page in the browser, reads its DOM and closes it.
    async fn fetch_page_html(&self, url: &str) -> Result<String> {
        let session = self.navigator.visit(url).await?;
        let html = session.content().await;
        let closed = session.close().await;
        let html = html?;
        closed?;
        Ok(html)
    }

    /// Enumerates one listing and resolves every product link, from the
    /// cache where possible and over HTTP otherwise. Listing order is
    /// preserved; failed products are dropped without leaving holes.
    async fn crawl_subcategory(
        &self,
        subcategory: &SubcategoryLink,
        cache: &CacheIndex,
        counters: &mut RunCounters,
    ) -> Result<Vec<Product>> {
        tracing::info!("  Subcategory: {}", subcategory.name);

        let session = self.navigator.visit(subcategory.url.as_str()).await?;
        let enumerated = enumerate_listing(
            session.as_ref(),
            &subcategory.url,
            &self.config.listing,
            self.config.crawler.max_products_per_subcategory,
        )
        .await;
        let closed = session.close().await;
        let product_urls = enumerated?;
        closed?;

        let now = Utc::now();
        let mut slots: Vec<Option<Product>> = Vec::with_capacity(product_urls.len());
        slots.resize_with(product_urls.len(), || None);

        let mut reused = 0usize;
        let mut miss_indices = Vec::new();
        let mut miss_urls = Vec::new();
        for (index, link) in product_urls.iter().enumerate() {
            match Url::parse(link) {
                Ok(url) => match cache.lookup_fresh(&url, now) {
                    Some(cached) => {
                        // Carried over verbatim, original timestamp included.
                        slots[index] = Some(cached.clone());
                        reused += 1;
                    }
                    None => {
                        miss_indices.push(index);
                        miss_urls.push(url);
                    }
                },
                Err(e) => {
                    tracing::warn!("    Skipping unparsable product link {}: {}", link, e);
                }
            }
        }

        tracing::info!(
            "    {} product links ({} cached, {} to fetch)",
            product_urls.len(),
            reused,
            miss_urls.len()
        );

        let limit = self.config.crawler.fetch_concurrency as usize;
        let fetched = map_limit(miss_urls, limit, |url| self.fetch_product(url, now)).await;

        let mut fetched_count = 0usize;
        let mut dropped = 0usize;
        for (slot_index, product) in miss_indices.into_iter().zip(fetched) {
            match product {
                Some(product) => {
                    slots[slot_index] = Some(product);
                    fetched_count += 1;
                }
                None => dropped += 1,
            }
        }

        counters.reused += reused;
        counters.fetched += fetched_count;
        counters.dropped += dropped;

        let products: Vec<Product> = slots.into_iter().flatten().collect();
        tracing::info!("    {} products ({} dropped)", products.len(), dropped);
        Ok(products)
    }

    /// Fetch and extract with one immediate re-attempt. A second failure
    /// surfaces to the runner, which records the product as dropped.
    async fn fetch_product(&self, url: Url, seen_at: DateTime<Utc>) -> Result<Product> {
        match self.try_fetch_product(&url, seen_at).await {
            Ok(product) => Ok(product),
            Err(first) => {
                tracing::debug!("Retrying product {}: {}", url, first);
                self.try_fetch_product(&url, seen_at).await
            }
        }
    }

    async fn try_fetch_product(&self, url: &Url, seen_at: DateTime<Utc>) -> Result<Product> {
        let html = fetch_product_page(&self.client, url.as_str()).await?;
        let extracted = extract_product(&html).ok_or_else(|| CrawlError::Extraction {
            url: url.to_string(),
        })?;
        Ok(assemble_product(url, extracted, seen_at))
    }
}

/// Which parts of a checkpoint count as finished work.
///
/// Checkpoints are saved after every subcategory, so every checkpointed
/// category except the last is complete. The last one may have been cut
/// off mid-walk; only its present subcategories are skipped on resume.
struct ResumePlan {
    completed: HashSet<String>,
    partial: Option<(String, HashSet<String>)>,
}

impl ResumePlan {
    fn from_snapshot(snapshot: &CatalogSnapshot) -> Self {
        let mut completed: HashSet<String> = snapshot
            .categories
            .iter()
            .map(|c| c.name.clone())
            .collect();
        let partial = snapshot.categories.last().map(|last| {
            completed.remove(&last.name);
            (
                last.name.clone(),
                last.subcategories
                    .iter()
                    .map(|s| s.name.clone())
                    .collect::<HashSet<String>>(),
            )
        });
        Self { completed, partial }
    }

    fn is_empty(&self) -> bool {
        self.completed.is_empty() && self.partial.is_none()
    }

    fn completed_count(&self) -> usize {
        self.completed.len()
    }

    fn is_complete(&self, category: &str) -> bool {
        self.completed.contains(category)
    }

    fn is_done_subcategory(&self, category: &str, subcategory: &str) -> bool {
        match &self.partial {
            Some((partial_category, done)) if partial_category == category => {
                done.contains(subcategory)
            }
            _ => false,
        }
    }
}

/// Reads the category rail off the explore page.
///
/// Categories are keyed by the first path segment after the category
/// prefix, compared percent-decoded, trimmed and lowercased, so case
/// and encoding drift in the markup cannot produce near-duplicates.
/// The canonical URL is rebuilt with the segment re-encoded.
fn parse_category_links(html: &str, base: &Url) -> Vec<CategoryLink> {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    let mut categories = Vec::new();
    for element in document.select(&selector) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let Ok(resolved) = base.join(href.trim()) else {
            continue;
        };
        let Some(tail) = resolved.path().strip_prefix(CATEGORY_PREFIX) else {
            continue;
        };
        let raw_segment = tail.split('/').next().unwrap_or_default();
        if raw_segment.is_empty() {
            continue;
        }

        let segment = decode_component(raw_segment);
        let key = segment.trim().to_lowercase();
        if key.is_empty() || !seen.insert(key) {
            continue;
        }

        let canonical = format!("{}{}", CATEGORY_PREFIX, urlencoding::encode(segment.trim()));
        let Ok(url) = base.join(&canonical) else {
            continue;
        };
        let name = anchor_text(element).unwrap_or_else(|| segment.trim().to_string());
        categories.push(CategoryLink { name, url });
    }
    categories
}

/// Reads subcategory links off a category page.
///
/// A link qualifies when it lives on the same host and its decoded path
/// extends the category's decoded path by exactly one non-empty
/// segment. Deduplication runs on both the normalized URL and the
/// lowercased display name.
fn parse_subcategory_links(html: &str, category_url: &Url) -> Vec<SubcategoryLink> {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    let parent_path = decoded_path(category_url);
    let mut seen_urls = HashSet::new();
    let mut seen_names = HashSet::new();
    let mut subcategories = Vec::new();

    for element in document.select(&selector) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let Ok(resolved) = category_url.join(href.trim()) else {
            continue;
        };
        if resolved.host_str() != category_url.host_str() {
            continue;
        }

        let path = decoded_path(&resolved);
        let Some(rest) = path.strip_prefix(&parent_path) else {
            continue;
        };
        let Some(segment) = rest.strip_prefix('/') else {
            continue;
        };
        if segment.is_empty() || segment.contains('/') {
            continue;
        }

        if !seen_urls.insert(path_key(&resolved)) {
            continue;
        }
        let name = anchor_text(element).unwrap_or_else(|| segment.to_string());
        if !seen_names.insert(name.to_lowercase()) {
            continue;
        }

        subcategories.push(SubcategoryLink {
            name,
            url: resolved,
        });
    }
    subcategories
}

fn anchor_text(element: ElementRef<'_>) -> Option<String> {
    let text = element.text().collect::<String>();
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn decode_component(raw: &str) -> String {
    match urlencoding::decode(raw) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => raw.to_string(),
    }
}

/// Percent-decoded path with any trailing slash removed.
fn decoded_path(url: &Url) -> String {
    decode_component(url.path()).trim_end_matches('/').to_string()
}
