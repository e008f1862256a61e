//! Listing enumeration
//!
//! Subcategory listings load products lazily. Most respond to scrolling;
//! a few only expose numbered pagination. Enumeration drives the page
//! until the link set stops growing, then falls back to clicking through
//! pages when the harvest looks implausibly small.

use crate::browser::PageSession;
use crate::catalog::path_key;
use crate::config::ListingConfig;
use crate::crawler::PRODUCT_PATH_MARKER;
use crate::Result;
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::time::Duration;
use url::Url;

/// Totals below this are taken to mean the listing paginates instead of
/// scrolling.
const PAGINATION_FLOOR: usize = 12;

/// Insertion-ordered set of product links, deduplicated by normalized
/// path so query-string and encoding variants collapse onto the
/// first-seen URL.
#[derive(Debug, Default)]
struct LinkSet {
    seen: HashSet<String>,
    ordered: Vec<String>,
}

impl LinkSet {
    fn insert(&mut self, url: Url) -> bool {
        if self.seen.insert(path_key(&url)) {
            self.ordered.push(url.into());
            true
        } else {
            false
        }
    }

    fn len(&self) -> usize {
        self.ordered.len()
    }
}

/// Collects every product link a listing page exposes, in first-seen
/// order.
///
/// The page is scrolled until the link total holds still for the
/// configured number of steps (or the step cap is hit). If the total
/// still looks too small to be a scrolled listing, numbered pagination
/// controls are tried. A `max_products` of 0 means unlimited.
pub async fn enumerate_listing(
    session: &dyn PageSession,
    listing_url: &Url,
    listing: &ListingConfig,
    max_products: u32,
) -> Result<Vec<String>> {
    let pause = Duration::from_millis(listing.scroll_pause_millis);
    let mut links = LinkSet::default();

    harvest_into(session, listing_url, &mut links).await?;

    let mut stable_steps = 0u32;
    let mut step = 0u32;
    while step < listing.scroll_max_steps && stable_steps < listing.scroll_stable_steps {
        session.scroll_by_viewport().await?;
        session.nudge_wheel().await?;
        tokio::time::sleep(pause).await;
        step += 1;

        let added = harvest_into(session, listing_url, &mut links).await?;
        if added == 0 {
            stable_steps += 1;
        } else {
            stable_steps = 0;
        }
    }

    if links.len() < PAGINATION_FLOOR {
        paginate_into(session, listing_url, pause, &mut links).await?;
    }

    let mut product_urls = links.ordered;
    if max_products > 0 && product_urls.len() > max_products as usize {
        tracing::debug!(
            "Capping {} product links at {}",
            product_urls.len(),
            max_products
        );
        product_urls.truncate(max_products as usize);
    }

    Ok(product_urls)
}

/// Reads the current DOM and folds its product links into `links`.
/// Returns how many were new.
async fn harvest_into(
    session: &dyn PageSession,
    base: &Url,
    links: &mut LinkSet,
) -> Result<usize> {
    let html = session.content().await?;
    let mut added = 0;
    for url in collect_product_links(&html, base) {
        if links.insert(url) {
            added += 1;
        }
    }
    Ok(added)
}

/// Walks numbered pagination: page 2, 3, ... by label, falling back to
/// a "next" control. Stops when no control matches or a page adds
/// nothing new.
async fn paginate_into(
    session: &dyn PageSession,
    base: &Url,
    pause: Duration,
    links: &mut LinkSet,
) -> Result<()> {
    let mut page_number = 2u32;
    loop {
        let clicked = session.activate_control(&page_number.to_string()).await?
            || session.activate_control("next").await?;
        if !clicked {
            break;
        }

        tokio::time::sleep(pause).await;
        let added = harvest_into(session, base, links).await?;
        tracing::debug!("Pagination page {}: {} new links", page_number, added);
        if added == 0 {
            break;
        }
        page_number += 1;
    }
    Ok(())
}

/// Pulls product detail links out of a serialized DOM. Relative hrefs
/// resolve against the listing URL.
fn collect_product_links(html: &str, base: &Url) -> Vec<Url> {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    let mut found = Vec::new();
    for element in document.select(&selector) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        if !href.contains(PRODUCT_PATH_MARKER) {
            continue;
        }
        if let Ok(resolved) = base.join(href.trim()) {
            found.push(resolved);
        }
    }
    found
}
